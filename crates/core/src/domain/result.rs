// Request Result Domain Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Response payload: raw text, or the decoded value for JSON requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Text(String),
    Json(serde_json::Value),
}

impl ResponseBody {
    pub fn empty() -> Self {
        ResponseBody::Text(String::new())
    }

    /// Raw text, if the body was not decoded
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(s) => Some(s),
            ResponseBody::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseBody::Text(s) if s.is_empty())
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Text(s) => f.write_str(s),
            ResponseBody::Json(v) => write!(f, "{}", v),
        }
    }
}

/// Outcome of one submitted request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestResult {
    pub url: String,
    pub response: ResponseBody,
    pub is_error: bool,
    /// Empty iff `is_error` is false
    pub error_msg: String,
    /// HTTP status, or 0 for transport-level failures
    pub code: u16,
}

impl RequestResult {
    pub fn success(url: impl Into<String>, response: ResponseBody, code: u16) -> Self {
        Self {
            url: url.into(),
            response,
            is_error: false,
            error_msg: String::new(),
            code,
        }
    }

    pub fn error(
        url: impl Into<String>,
        response: ResponseBody,
        error_msg: impl Into<String>,
        code: u16,
    ) -> Self {
        Self {
            url: url.into(),
            response,
            is_error: true,
            error_msg: error_msg.into(),
            code,
        }
    }

    /// Failure before or during the network exchange (code 0, empty body)
    pub fn transport_error(url: impl Into<String>, error_msg: impl Into<String>) -> Self {
        Self::error(url, ResponseBody::empty(), error_msg, 0)
    }
}

/// Aggregate of a finished batch, results in submission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub batch_id: String,
    pub results: Vec<RequestResult>,
    pub any_error: bool,
}

impl BatchOutcome {
    pub fn new(batch_id: impl Into<String>, results: Vec<RequestResult>) -> Self {
        let any_error = results.iter().any(|r| r.is_error);
        Self {
            batch_id: batch_id.into(),
            results,
            any_error,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
