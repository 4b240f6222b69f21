// Url composition helpers

fn has_scheme(url: &str, scheme: &str) -> bool {
    url.trim_start()
        .get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

/// True for urls starting with `http:` or `https:`
pub fn is_absolute(url: &str) -> bool {
    has_scheme(url, "http:") || has_scheme(url, "https:")
}

/// True for plain `http:` urls
pub fn is_insecure(url: &str) -> bool {
    has_scheme(url, "http:")
}

/// Prefix `url` with `base_url` unless it is already absolute or no base is set
pub fn compose_url(base_url: &str, url: &str) -> String {
    let base = base_url.trim();
    if base.is_empty() || is_absolute(url) {
        return url.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

/// Syntactically valid absolute http(s) url with a host
pub fn is_valid_url(url: &str) -> bool {
    url::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// Append `key=value` to the query of `url`, keeping any fragment last
pub fn with_query_param(url: &str, key: &str, value: &str) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    let mut out = format!("{}{}{}={}", base, separator, key, value);
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
