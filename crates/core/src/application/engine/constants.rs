// Engine constants (no magic values)

/// Probed in order by `is_internet_available`
pub const DEFAULT_INTERNET_CHECK_LOCATIONS: [&str; 3] = [
    "https://ajax.googleapis.com/ajax/libs/jquery/3.2.1/jquery.min.js",
    "https://ajax.aspnetcdn.com/ajax/modernizr/modernizr-2.8.3.js",
    "https://code.jquery.com/jquery-3.2.1.slim.min.js",
];

/// Reported when a JSON-format request answers with a non JSON body
pub const JSON_PARSE_ERROR: &str = "Could not parse request result as a json string";

/// Query parameter added to internet probes so caches are bypassed
pub const CACHE_BUSTER_PARAM: &str = "r";

/// Random alphanumerics in the cache-busting value
pub const CACHE_BUSTER_LENGTH: usize = 15;

pub(crate) fn non_secure_message(url: &str) -> String {
    format!(
        "Non secure http requests are forbidden. Set is_only_https=false to allow {}",
        url
    )
}

pub(crate) fn queue_busy_message(queue: &str) -> String {
    format!("Queue {} is already running", queue)
}
