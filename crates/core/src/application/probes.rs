// Connectivity probes: url existence, internet availability, response headers

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::application::engine::constants::{CACHE_BUSTER_LENGTH, CACHE_BUSTER_PARAM};
use crate::application::engine::url::{compose_url, is_valid_url, with_query_param};
use crate::application::engine::{
    execute_guarded, interpret, panic_message, send_with_timeout, Admission, AdmittedRequest,
    BatchContext, BatchHandle, RequestManager,
};
use crate::domain::{BatchOutcome, RequestDescriptor, RequestResult, ResultFormat};
use crate::error::{ManagerError, Result};
use crate::port::{TransportError, TransportRequest};

/// Single GET outside any queue; returns the result and the response header lines
async fn probe(ctx: &BatchContext, url: String) -> (RequestResult, Vec<String>) {
    let transport = Arc::clone(&ctx.transport);
    let timeout_ms = ctx.timeout_ms;
    let request = TransportRequest {
        timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        ..TransportRequest::get(url.clone())
    };

    let sent = tokio::spawn(async move {
        send_with_timeout(transport.as_ref(), &request, timeout_ms).await
    })
    .await;

    match sent {
        Ok(Ok(response)) => {
            let headers = response.header_lines();
            (interpret(url, ResultFormat::String, response), headers)
        }
        Ok(Err(err)) => (RequestResult::transport_error(url, err.to_string()), Vec::new()),
        Err(err) => {
            let reason = if err.is_panic() {
                panic_message(err.into_panic().as_ref())
            } else {
                "task cancelled".to_string()
            };
            (
                RequestResult::transport_error(url, format!("Request aborted: {}", reason)),
                Vec::new(),
            )
        }
    }
}

fn cache_buster() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CACHE_BUSTER_LENGTH)
        .map(char::from)
        .collect()
}

impl RequestManager {
    /// Check whether `url` answers with a success status.
    ///
    /// A url that cannot be valid runs `on_not_exists` right away, before
    /// this returns. Otherwise the check is an ordinary request.
    pub fn url_exists<Y, N>(&self, url: &str, on_exists: Y, on_not_exists: N) -> Result<BatchHandle>
    where
        Y: Fn() + Send + Sync + 'static,
        N: Fn() + Send + Sync + 'static,
    {
        let composed = compose_url(&self.base_url(), url);
        if !is_valid_url(&composed) {
            debug!(url = %composed, "Url is not valid, reporting it as missing");
            execute_guarded("on_not_exists", || on_not_exists());
            let result = RequestResult::transport_error(
                &composed,
                TransportError::InvalidUrl(composed.clone()).to_string(),
            );
            return Ok(BatchHandle::Completed(BatchOutcome::new(
                self.next_batch_id(),
                vec![result],
            )));
        }

        let descriptor = RequestDescriptor::get(composed)
            .on_success(move |_| on_exists())
            .on_error(move |_, _, _| on_not_exists());
        self.execute(descriptor, None, None)
    }

    /// Probe the internet check locations in order until one answers.
    ///
    /// # Errors
    /// `InvalidArgument` if there are no locations or one of them is not a valid url
    pub fn is_internet_available<Y, N>(&self, on_yes: Y, on_no: N) -> Result<BatchHandle>
    where
        Y: Fn() + Send + Sync + 'static,
        N: Fn() + Send + Sync + 'static,
    {
        let locations = self.internet_check_locations();
        if locations.is_empty() {
            return Err(ManagerError::InvalidArgument(
                "no check locations specified".into(),
            ));
        }
        if let Some(bad) = locations.iter().find(|l| !is_valid_url(l)) {
            return Err(ManagerError::InvalidArgument(format!(
                "invalid check url : {}",
                bad
            )));
        }

        let ctx = self.batch_context();
        let batch_id = ctx.batch_id.clone();
        let future = async move {
            let mut results = Vec::with_capacity(locations.len());
            for location in &locations {
                let url = with_query_param(location, CACHE_BUSTER_PARAM, &cache_buster());
                let request = AdmittedRequest::new(&ctx, RequestDescriptor::get(url));
                let (result, _) = match request.admission {
                    Admission::Settled(result) => (result, Vec::new()),
                    _ => probe(&ctx, request.url).await,
                };
                let reachable = !result.is_error;
                results.push(result);

                if reachable {
                    info!(batch_id = %ctx.batch_id, location = %location, "Internet available");
                    execute_guarded("on_yes", || on_yes());
                    return BatchOutcome::new(ctx.batch_id.clone(), results);
                }
                debug!(batch_id = %ctx.batch_id, location = %location, "Check location unreachable");
            }

            warn!(batch_id = %ctx.batch_id, checked = locations.len(), "Internet not available");
            execute_guarded("on_no", || on_no());
            BatchOutcome::new(ctx.batch_id.clone(), results)
        };

        self.run_detached(batch_id, future)
    }

    /// GET `url` and hand its response headers (`name: value` lines) to `on_success`
    pub fn get_url_headers<S, E>(&self, url: &str, on_success: S, on_error: E) -> Result<BatchHandle>
    where
        S: Fn(&[String]) + Send + Sync + 'static,
        E: Fn(&str, u16) + Send + Sync + 'static,
    {
        if url.trim().is_empty() {
            return Err(ManagerError::InvalidArgument(
                "url must be a non empty string".into(),
            ));
        }

        let ctx = self.batch_context();
        let batch_id = ctx.batch_id.clone();
        let request = AdmittedRequest::new(&ctx, RequestDescriptor::get(url));
        let future = async move {
            let (result, headers) = match request.admission {
                Admission::Settled(result) => (result, Vec::new()),
                _ => probe(&ctx, request.url).await,
            };

            if result.is_error {
                execute_guarded("on_error", || on_error(&result.error_msg, result.code));
            } else {
                execute_guarded("on_success", || on_success(&headers));
            }
            BatchOutcome::new(ctx.batch_id.clone(), vec![result])
        };

        self.run_detached(batch_id, future)
    }
}
