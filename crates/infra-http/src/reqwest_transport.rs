// reqwest-backed HttpTransport
// reason: async-trait + reqwest for non-blocking HTTP(S) (ADR-001)
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use std::time::Instant;
use tracing::{debug, warn};

use courier_core::domain::RequestMethod;
use courier_core::port::{HttpTransport, TransportError, TransportRequest, TransportResponse};

/// Content type of every POST body the manager produces
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP transport over a shared reqwest client.
///
/// Redirects are never followed: a 3xx answer is handed back as is and
/// counts as success upstream.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with redirects disabled
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(Self { client })
    }

    /// Use a preconfigured client (proxies, custom TLS roots, ...)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn classify(request: &TransportRequest, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        let ms = request
            .timeout
            .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        TransportError::Timeout(ms)
    } else if err.is_builder() {
        TransportError::InvalidUrl(request.url.clone())
    } else if err.is_connect() {
        TransportError::Connect(request.url.clone())
    } else {
        TransportError::Io(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = Url::parse(&request.url)
            .map_err(|_| TransportError::InvalidUrl(request.url.clone()))?;

        let mut builder = match request.method {
            RequestMethod::Get => self.client.get(url),
            RequestMethod::Post => self.client.post(url),
        };
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            let err = classify(request, e);
            warn!(url = %request.url, method = %request.method, error = %err, "HTTP exchange failed");
            err
        })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await.map_err(|e| classify(request, e))?;

        debug!(
            url = %request.url,
            method = %request.method,
            code = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "HTTP exchange complete"
        );

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
