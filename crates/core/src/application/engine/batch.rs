// Batch Execution
//
// A batch is admitted synchronously (urls composed, queue tickets issued in
// submission order) and then driven either concurrently, one task per
// request in a JoinSet, or sequentially. Every callback runs on the driver,
// one at a time, behind a panic guard.

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::constants::{non_secure_message, JSON_PARSE_ERROR};
use super::panic_guard::{execute_guarded, panic_message};
use super::url::{compose_url, is_insecure};
use crate::application::query_string::generate_url_query_string;
use crate::application::queue_registry::QueueTicket;
use crate::domain::{
    BatchOutcome, RequestCallbacks, RequestDescriptor, RequestMethod, RequestResult, ResponseBody,
    ResultFormat,
};
use crate::error::{ManagerError, Result};
use crate::port::{HttpTransport, TimeProvider, TransportError, TransportRequest, TransportResponse};

/// Called once per batch with all results (submission order) and whether any failed
pub type FinishedCallback = Arc<dyn Fn(&[RequestResult], bool) + Send + Sync>;

/// Called once per completed request with its url and the batch size
pub type ProgressCallback = Arc<dyn Fn(&str, usize) + Send + Sync>;

/// Wrap a closure as a finishing callback for `RequestManager::execute`
pub fn on_finished<F>(f: F) -> Option<FinishedCallback>
where
    F: Fn(&[RequestResult], bool) + Send + Sync + 'static,
{
    Some(Arc::new(f))
}

/// Wrap a closure as a progress callback for `RequestManager::execute`
pub fn on_progress<F>(f: F) -> Option<ProgressCallback>
where
    F: Fn(&str, usize) + Send + Sync + 'static,
{
    Some(Arc::new(f))
}

/// Settings and globals as they were when the batch was admitted
pub(crate) struct BatchContext {
    pub batch_id: String,
    pub transport: Arc<dyn HttpTransport>,
    pub time_provider: Arc<dyn TimeProvider>,
    pub timeout_ms: u64,
    pub is_only_https: bool,
    pub base_url: String,
    pub global_post_params: IndexMap<String, String>,
}

pub(crate) enum Admission {
    /// No queue, runs as soon as its task is polled
    Direct,
    /// Waits for its queue turn; the ticket is released when the request ends
    Queued(QueueTicket),
    /// Outcome known at admission, no I/O will happen
    Settled(RequestResult),
}

pub(crate) struct AdmittedRequest {
    pub url: String,
    pub descriptor: RequestDescriptor,
    pub admission: Admission,
}

impl AdmittedRequest {
    /// Compose the url against the batch base url and apply the https rule
    pub fn new(ctx: &BatchContext, descriptor: RequestDescriptor) -> Self {
        let url = compose_url(&ctx.base_url, &descriptor.url);
        let admission = if ctx.is_only_https && is_insecure(&url) {
            Admission::Settled(RequestResult::transport_error(&url, non_secure_message(&url)))
        } else {
            Admission::Direct
        };
        Self {
            url,
            descriptor,
            admission,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.admission, Admission::Settled(_))
    }
}

/// Request timeout if set, else the manager timeout (0 = none)
pub(crate) fn effective_timeout(request_ms: u64, manager_ms: u64) -> u64 {
    if request_ms > 0 {
        request_ms
    } else {
        manager_ms
    }
}

/// Send through the transport, bounded by `timeout_ms` when non zero
pub(crate) async fn send_with_timeout(
    transport: &dyn HttpTransport,
    request: &TransportRequest,
    timeout_ms: u64,
) -> std::result::Result<TransportResponse, TransportError> {
    if timeout_ms == 0 {
        return transport.send(request).await;
    }
    match tokio::time::timeout(Duration::from_millis(timeout_ms), transport.send(request)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(TransportError::Timeout(timeout_ms)),
    }
}

/// Form body of a POST: request params first, then the global snapshot
fn post_body(ctx: &BatchContext, descriptor: &RequestDescriptor) -> Result<Option<String>> {
    if descriptor.method != RequestMethod::Post {
        return Ok(None);
    }

    let mut pairs: Vec<(&str, Value)> = descriptor
        .post_params
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();
    if !descriptor.ignore_global_post_params {
        pairs.extend(
            ctx.global_post_params
                .iter()
                .map(|(k, v)| (k.as_str(), Value::String(v.clone()))),
        );
    }

    if pairs.is_empty() {
        return Ok(None);
    }
    generate_url_query_string(pairs).map(Some)
}

/// Turn a wire response into a result: status first, then body decoding
pub(crate) fn interpret(url: String, format: ResultFormat, response: TransportResponse) -> RequestResult {
    if !response.is_success() {
        let msg = if response.status_text.is_empty() {
            format!("HTTP error {}", response.status)
        } else {
            response.status_text
        };
        return RequestResult::error(url, ResponseBody::Text(response.body), msg, response.status);
    }

    match format {
        ResultFormat::String => {
            RequestResult::success(url, ResponseBody::Text(response.body), response.status)
        }
        ResultFormat::Json => match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => RequestResult::success(url, ResponseBody::Json(value), response.status),
            Err(_) => RequestResult::error(
                url,
                ResponseBody::Text(response.body),
                JSON_PARSE_ERROR,
                response.status,
            ),
        },
    }
}

async fn perform(ctx: &BatchContext, url: String, descriptor: &RequestDescriptor) -> RequestResult {
    let body = match post_body(ctx, descriptor) {
        Ok(body) => body,
        Err(e) => return RequestResult::transport_error(url, e.to_string()),
    };

    let timeout_ms = effective_timeout(descriptor.timeout_ms, ctx.timeout_ms);
    let request = TransportRequest {
        method: descriptor.method,
        url: url.clone(),
        body,
        timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
    };

    let started = ctx.time_provider.now_millis();
    let outcome = send_with_timeout(ctx.transport.as_ref(), &request, timeout_ms).await;
    let elapsed_ms = ctx.time_provider.elapsed_millis(started);

    match outcome {
        Ok(response) => {
            debug!(
                batch_id = %ctx.batch_id,
                url = %url,
                code = response.status,
                elapsed_ms,
                "Response received"
            );
            interpret(url, descriptor.result_format, response)
        }
        Err(err) => {
            warn!(batch_id = %ctx.batch_id, url = %url, elapsed_ms, error = %err, "Request failed");
            RequestResult::transport_error(url, err.to_string())
        }
    }
}

async fn run_request(ctx: Arc<BatchContext>, request: AdmittedRequest) -> RequestResult {
    let AdmittedRequest {
        url,
        descriptor,
        admission,
    } = request;

    match admission {
        Admission::Settled(result) => result,
        Admission::Direct => perform(&ctx, url, &descriptor).await,
        Admission::Queued(ticket) => {
            ticket.wait_turn().await;
            debug!(batch_id = %ctx.batch_id, queue = %ticket.queue_name(), url = %url, "Queue turn acquired");
            let result = perform(&ctx, url, &descriptor).await;
            drop(ticket);
            result
        }
    }
}

fn notify_request(callbacks: &RequestCallbacks, result: &RequestResult) {
    if result.is_error {
        if let Some(on_error) = &callbacks.on_error {
            execute_guarded("on_error", || {
                on_error(&result.error_msg, result.code, &result.response)
            });
        }
    } else if let Some(on_success) = &callbacks.on_success {
        execute_guarded("on_success", || on_success(&result.response));
    }

    if let Some(on_finally) = &callbacks.on_finally {
        execute_guarded("on_finally", || on_finally());
    }
}

/// Collects results by submission index and fires per-request callbacks
struct Tracker {
    urls: Vec<String>,
    callbacks: Vec<RequestCallbacks>,
    slots: Vec<Option<RequestResult>>,
    progress: Option<ProgressCallback>,
}

impl Tracker {
    fn new(requests: &[AdmittedRequest], progress: Option<ProgressCallback>) -> Self {
        Self {
            urls: requests.iter().map(|r| r.url.clone()).collect(),
            callbacks: requests
                .iter()
                .map(|r| r.descriptor.callbacks.clone())
                .collect(),
            slots: vec![None; requests.len()],
            progress,
        }
    }

    fn aborted(&self, index: usize, err: JoinError) -> RequestResult {
        let url = self.urls[index].clone();
        let reason = if err.is_panic() {
            panic_message(err.into_panic().as_ref())
        } else {
            "task cancelled".to_string()
        };
        error!(url = %url, reason = %reason, "Request task aborted");
        RequestResult::transport_error(url, format!("Request aborted: {}", reason))
    }

    fn complete(&mut self, index: usize, result: RequestResult) {
        notify_request(&self.callbacks[index], &result);
        if let Some(progress) = &self.progress {
            let total = self.slots.len();
            execute_guarded("progress", || progress(&result.url, total));
        }
        self.slots[index] = Some(result);
    }

    fn finish(self, batch_id: &str, finished: Option<FinishedCallback>) -> BatchOutcome {
        let results: Vec<RequestResult> = self
            .slots
            .into_iter()
            .zip(self.urls)
            .map(|(slot, url)| {
                slot.unwrap_or_else(|| RequestResult::transport_error(url, "Request did not complete"))
            })
            .collect();

        let outcome = BatchOutcome::new(batch_id, results);
        info!(
            batch_id = %batch_id,
            total = outcome.len(),
            any_error = outcome.any_error,
            "Batch finished"
        );

        if let Some(finished) = finished {
            execute_guarded("finished", || finished(&outcome.results, outcome.any_error));
        }
        outcome
    }
}

/// An admitted batch, ready to be driven
pub(crate) struct Batch {
    pub ctx: Arc<BatchContext>,
    pub requests: Vec<AdmittedRequest>,
    pub finished: Option<FinishedCallback>,
    pub progress: Option<ProgressCallback>,
}

impl Batch {
    /// All requests in flight at once (queues permitting); completions are
    /// handled in the order they happen.
    pub async fn run_concurrent(self) -> BatchOutcome {
        let Batch {
            ctx,
            requests,
            finished,
            progress,
        } = self;
        let mut tracker = Tracker::new(&requests, progress);

        let mut tasks = JoinSet::new();
        let mut index_of = HashMap::with_capacity(requests.len());
        for (index, request) in requests.into_iter().enumerate() {
            let task = tasks.spawn(run_request(Arc::clone(&ctx), request));
            index_of.insert(task.id(), index);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    if let Some(&index) = index_of.get(&id) {
                        tracker.complete(index, result);
                    }
                }
                Err(err) => {
                    if let Some(&index) = index_of.get(&err.id()) {
                        let result = tracker.aborted(index, err);
                        tracker.complete(index, result);
                    }
                }
            }
        }

        tracker.finish(&ctx.batch_id, finished)
    }

    /// One request at a time, in submission order
    pub async fn run_sequential(self) -> BatchOutcome {
        let Batch {
            ctx,
            requests,
            finished,
            progress,
        } = self;
        let mut tracker = Tracker::new(&requests, progress);

        for (index, request) in requests.into_iter().enumerate() {
            // Spawned so a panicking transport only fails this request
            let result = match tokio::spawn(run_request(Arc::clone(&ctx), request)).await {
                Ok(result) => result,
                Err(err) => tracker.aborted(index, err),
            };
            tracker.complete(index, result);
        }

        tracker.finish(&ctx.batch_id, finished)
    }
}

/// What `execute` returns.
///
/// Synchronous managers hand back a completed batch; asynchronous ones a
/// pending handle that can be awaited (the callbacks fire either way).
#[derive(Debug)]
pub enum BatchHandle {
    Completed(BatchOutcome),
    Pending {
        batch_id: String,
        handle: JoinHandle<BatchOutcome>,
    },
}

impl BatchHandle {
    pub fn batch_id(&self) -> &str {
        match self {
            BatchHandle::Completed(outcome) => &outcome.batch_id,
            BatchHandle::Pending { batch_id, .. } => batch_id,
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            BatchHandle::Completed(_) => true,
            BatchHandle::Pending { handle, .. } => handle.is_finished(),
        }
    }

    /// Wait for the batch and return its results
    pub async fn wait(self) -> Result<BatchOutcome> {
        match self {
            BatchHandle::Completed(outcome) => Ok(outcome),
            BatchHandle::Pending { batch_id, handle } => handle.await.map_err(|e| {
                ManagerError::Internal(format!("batch {} driver failed: {}", batch_id, e))
            }),
        }
    }
}
