// HTTP Transport Port
// Abstraction over the concrete HTTP client (reqwest in production)

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::RequestMethod;

/// A fully composed request, ready for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: RequestMethod,
    pub url: String,
    /// `application/x-www-form-urlencoded` body (POST only)
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: RequestMethod::Get,
            url: url.into(),
            body: None,
            timeout: None,
        }
    }
}

/// Raw response as read from the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Canonical reason phrase ("Not Found"), may be empty
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    /// Header lines as `name: value`
    pub fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect()
    }
}

/// Failures before or during the network exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Could not connect with url: {0}")]
    Connect(String),

    #[error("{0} ms Timeout reached")]
    Timeout(u64),

    #[error("Transport error: {0}")]
    Io(String),
}

/// HTTP Transport trait
///
/// Implementations:
/// - ReqwestTransport (courier-infra-http): real network I/O
/// - mocks::MockTransport: scripted responses for tests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one request
    ///
    /// Non-2xx/3xx statuses are NOT errors here; they come back as a
    /// `TransportResponse` and the engine decides what they mean.
    ///
    /// # Errors
    /// - TransportError::InvalidUrl if the url cannot be parsed
    /// - TransportError::Connect if the host is unreachable
    /// - TransportError::Timeout if `request.timeout` expires
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted behavior for one url
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Respond with status and body after an optional delay
        Respond {
            status: u16,
            body: String,
            delay_ms: u64,
        },
        /// Fail with a transport error
        Fail(TransportError),
        /// Panic with message (for isolation testing)
        Panic(String),
    }

    impl MockBehavior {
        pub fn ok(body: impl Into<String>) -> Self {
            MockBehavior::Respond {
                status: 200,
                body: body.into(),
                delay_ms: 0,
            }
        }

        pub fn status(status: u16, body: impl Into<String>) -> Self {
            MockBehavior::Respond {
                status,
                body: body.into(),
                delay_ms: 0,
            }
        }

        pub fn slow(body: impl Into<String>, delay_ms: u64) -> Self {
            MockBehavior::Respond {
                status: 200,
                body: body.into(),
                delay_ms,
            }
        }
    }

    /// Start/end marks in the order the transport observed them
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MockEvent {
        Start(String),
        End(String),
    }

    /// Mock HTTP transport for testing
    ///
    /// Urls are matched exactly with the query string stripped. Unknown urls
    /// answer 404 when they parse as absolute urls and `InvalidUrl` otherwise.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        routes: Arc<Mutex<HashMap<String, MockBehavior>>>,
        calls: Arc<Mutex<Vec<TransportRequest>>>,
        events: Arc<Mutex<Vec<MockEvent>>>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(self, url: impl Into<String>, behavior: MockBehavior) -> Self {
            self.routes.lock().unwrap().insert(url.into(), behavior);
            self
        }

        pub fn calls(&self) -> Vec<TransportRequest> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn events(&self) -> Vec<MockEvent> {
            self.events.lock().unwrap().clone()
        }

        /// Highest number of requests observed in flight at the same time
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        fn lookup(&self, url: &str) -> Option<MockBehavior> {
            let key = url.split('?').next().unwrap_or(url);
            self.routes.lock().unwrap().get(key).cloned()
        }
    }

    fn reason(status: u16) -> &'static str {
        match status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            500 => "Internal Server Error",
            _ => "",
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(
            &self,
            request: &TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.calls.lock().unwrap().push(request.clone());

            let behavior = match self.lookup(&request.url) {
                Some(b) => b,
                None if url::Url::parse(&request.url).is_err() => {
                    return Err(TransportError::InvalidUrl(request.url.clone()));
                }
                None => MockBehavior::status(404, "Not Found"),
            };

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.events
                .lock()
                .unwrap()
                .push(MockEvent::Start(request.url.clone()));

            let result = match behavior {
                MockBehavior::Respond {
                    status,
                    body,
                    delay_ms,
                } => {
                    if delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                    Ok(TransportResponse {
                        status,
                        status_text: reason(status).to_string(),
                        headers: vec![("content-type".to_string(), "text/plain".to_string())],
                        body,
                    })
                }
                MockBehavior::Fail(err) => Err(err),
                MockBehavior::Panic(msg) => {
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    panic!("{}", msg); // Actually panic for isolation testing
                }
            };

            self.events
                .lock()
                .unwrap()
                .push(MockEvent::End(request.url.clone()));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}
