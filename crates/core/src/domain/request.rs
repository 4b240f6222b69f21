// Request Domain Model

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::result::ResponseBody;
use crate::domain::queue::QueueName;

/// HTTP verb of a request (implied by the constructor used)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestMethod {
    Get,
    Post,
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMethod::Get => write!(f, "GET"),
            RequestMethod::Post => write!(f, "POST"),
        }
    }
}

/// How the raw response body is decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultFormat {
    #[default]
    String,
    Json,
}

/// Called with the decoded response of a successful request
pub type SuccessCallback = Arc<dyn Fn(&ResponseBody) + Send + Sync>;

/// Called with (error message, code, raw response) of a failed request
pub type ErrorCallback = Arc<dyn Fn(&str, u16, &ResponseBody) + Send + Sync>;

/// Called once a request finishes, whatever the outcome
pub type FinallyCallback = Arc<dyn Fn() + Send + Sync>;

/// Per-request callbacks, shared so a descriptor can be cloned cheaply
#[derive(Clone, Default)]
pub struct RequestCallbacks {
    pub on_success: Option<SuccessCallback>,
    pub on_error: Option<ErrorCallback>,
    pub on_finally: Option<FinallyCallback>,
}

impl fmt::Debug for RequestCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_finally", &self.on_finally.is_some())
            .finish()
    }
}

/// One HTTP call as submitted to the manager.
///
/// The engine takes an owned snapshot at submission and never writes back to
/// it, so the same descriptor (and its callbacks) can be submitted again.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: RequestMethod,
    pub queue_name: Option<QueueName>,
    pub result_format: ResultFormat,
    /// Sent form-encoded in the body of POST requests
    pub post_params: IndexMap<String, serde_json::Value>,
    /// Per-request timeout in milliseconds (0 = use the manager timeout)
    pub timeout_ms: u64,
    pub ignore_global_post_params: bool,
    pub callbacks: RequestCallbacks,
}

impl RequestDescriptor {
    fn new(url: impl Into<String>, method: RequestMethod) -> Self {
        Self {
            url: url.into(),
            method,
            queue_name: None,
            result_format: ResultFormat::String,
            post_params: IndexMap::new(),
            timeout_ms: 0,
            ignore_global_post_params: false,
            callbacks: RequestCallbacks::default(),
        }
    }

    /// GET request descriptor
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, RequestMethod::Get)
    }

    /// POST request descriptor
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url, RequestMethod::Post)
    }

    pub fn with_queue(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = Some(queue_name.into());
        self
    }

    pub fn with_result_format(mut self, format: ResultFormat) -> Self {
        self.result_format = format;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Add a POST parameter. Non-string values are JSON-encoded when sent.
    pub fn with_post_param(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.post_params.insert(name.into(), value.into());
        self
    }

    pub fn ignoring_global_post_params(mut self) -> Self {
        self.ignore_global_post_params = true;
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResponseBody) + Send + Sync + 'static,
    {
        self.callbacks.on_success = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u16, &ResponseBody) + Send + Sync + 'static,
    {
        self.callbacks.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_finally<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.on_finally = Some(Arc::new(f));
        self
    }
}

/// One element of a batch list
#[derive(Debug, Clone)]
pub enum RequestItem {
    Url(String),
    Descriptor(RequestDescriptor),
}

impl From<&str> for RequestItem {
    fn from(url: &str) -> Self {
        RequestItem::Url(url.to_string())
    }
}

impl From<String> for RequestItem {
    fn from(url: String) -> Self {
        RequestItem::Url(url)
    }
}

impl From<RequestDescriptor> for RequestItem {
    fn from(descriptor: RequestDescriptor) -> Self {
        RequestItem::Descriptor(descriptor)
    }
}

/// Everything `RequestManager::execute` accepts
#[derive(Debug, Clone)]
pub enum RequestInput {
    SingleUrl(String),
    SingleDescriptor(RequestDescriptor),
    BatchList(Vec<RequestItem>),
}

impl RequestInput {
    /// Normalize into an ordered list of descriptors.
    ///
    /// Plain URLs become GET descriptors. Validation mirrors the positional
    /// errors callers rely on: an empty list, an empty single URL and any
    /// element with an empty url are rejected before anything runs.
    pub fn into_descriptors(self) -> crate::error::Result<Vec<RequestDescriptor>> {
        use crate::error::ManagerError;

        match self {
            RequestInput::SingleUrl(url) => {
                if url.trim().is_empty() {
                    return Err(ManagerError::InvalidRequests);
                }
                Ok(vec![RequestDescriptor::get(url)])
            }
            RequestInput::SingleDescriptor(descriptor) => {
                if descriptor.url.trim().is_empty() {
                    return Err(ManagerError::InvalidRequestUrl { index: 0 });
                }
                Ok(vec![descriptor])
            }
            RequestInput::BatchList(items) => {
                if items.is_empty() {
                    return Err(ManagerError::NoRequests);
                }
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let descriptor = match item {
                            RequestItem::Url(url) => RequestDescriptor::get(url),
                            RequestItem::Descriptor(d) => d,
                        };
                        if descriptor.url.trim().is_empty() {
                            Err(ManagerError::InvalidRequestUrl { index })
                        } else {
                            Ok(descriptor)
                        }
                    })
                    .collect()
            }
        }
    }
}

impl From<&str> for RequestInput {
    fn from(url: &str) -> Self {
        RequestInput::SingleUrl(url.to_string())
    }
}

impl From<String> for RequestInput {
    fn from(url: String) -> Self {
        RequestInput::SingleUrl(url)
    }
}

impl From<RequestDescriptor> for RequestInput {
    fn from(descriptor: RequestDescriptor) -> Self {
        RequestInput::SingleDescriptor(descriptor)
    }
}

impl<T: Into<RequestItem>> From<Vec<T>> for RequestInput {
    fn from(items: Vec<T>) -> Self {
        RequestInput::BatchList(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ManagerError;

    #[test]
    fn test_single_url_becomes_get() {
        let list = RequestInput::from("https://example.com/a").into_descriptors().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].method, RequestMethod::Get);
        assert_eq!(list[0].result_format, ResultFormat::String);
        assert!(list[0].queue_name.is_none());
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let empty: Vec<String> = vec![];
        assert_eq!(
            RequestInput::from(empty).into_descriptors().unwrap_err(),
            ManagerError::NoRequests
        );
        assert_eq!(
            RequestInput::from("   ").into_descriptors().unwrap_err(),
            ManagerError::InvalidRequests
        );
    }

    #[test]
    fn test_positional_errors() {
        let err = RequestInput::from(vec!["", "b"]).into_descriptors().unwrap_err();
        assert_eq!(err, ManagerError::InvalidRequestUrl { index: 0 });

        let items: Vec<RequestItem> = vec!["1".into(), RequestDescriptor::get("").into()];
        let err = RequestInput::from(items).into_descriptors().unwrap_err();
        assert_eq!(err.to_string(), "url 1 must be a non-empty string");
    }

    #[test]
    fn test_mixed_list_keeps_order() {
        let items: Vec<RequestItem> = vec![
            "https://a.test/1".into(),
            RequestDescriptor::post("https://a.test/2")
                .with_queue("q")
                .with_post_param("n", 1)
                .into(),
            "https://a.test/3".into(),
        ];
        let list = RequestInput::from(items).into_descriptors().unwrap();
        let urls: Vec<&str> = list.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(urls, ["https://a.test/1", "https://a.test/2", "https://a.test/3"]);
        assert_eq!(list[1].method, RequestMethod::Post);
        assert_eq!(list[1].queue_name.as_deref(), Some("q"));
    }

    #[test]
    fn test_debug_hides_callbacks() {
        let d = RequestDescriptor::get("https://a.test").on_finally(|| {});
        let text = format!("{:?}", d);
        assert!(text.contains("on_finally: true"));
        assert!(text.contains("on_success: false"));
    }
}
