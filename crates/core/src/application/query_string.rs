// Query Encoder
//
// Builds `key=value&key=value` strings with the same escaping a browser's
// `encodeURIComponent` applies. Lists and nested mappings are sent as their
// JSON text.

use serde_json::Value;
use std::borrow::Borrow;

use crate::error::{ManagerError, Result};

/// Characters `encodeURIComponent` leaves alone but `urlencoding` escapes
const SUB_DELIMS_KEPT: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%2A", "*"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
];

/// Generate a url query string (without the leading `?`) from ordered pairs.
///
/// Accepts anything that iterates `(key, value)` pairs: an `IndexMap`
/// (insertion order), a `BTreeMap` (key order) or a plain pair list.
/// Duplicate keys are kept, in order.
///
/// # Errors
/// `ManagerError::EmptyInput` if there are no pairs.
///
/// # Example
/// ```
/// use courier_core::generate_url_query_string;
/// use serde_json::json;
///
/// let pairs = vec![("a", json!(1)), ("b", json!([1, 2, 3]))];
/// assert_eq!(generate_url_query_string(pairs).unwrap(), "a=1&b=%5B1%2C2%2C3%5D");
/// ```
pub fn generate_url_query_string<I, K, V>(pairs: I) -> Result<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Borrow<Value>,
{
    let mut parts = Vec::new();

    for (key, value) in pairs {
        let text = value_text(value.borrow())?;
        parts.push(format!(
            "{}={}",
            encode_uri_component(key.as_ref()),
            encode_uri_component(&text)
        ));
    }

    if parts.is_empty() {
        return Err(ManagerError::EmptyInput);
    }

    Ok(parts.join("&"))
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
pub fn encode_uri_component(s: &str) -> String {
    let mut encoded = urlencoding::encode(s).into_owned();
    for (escaped, plain) in SUB_DELIMS_KEPT {
        if encoded.contains(escaped) {
            encoded = encoded.replace(escaped, plain);
        }
    }
    encoded
}

fn value_text(value: &Value) -> Result<String> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value)?,
        other => other.to_string(),
    })
}
