// Request Manager - batch admission and dispatch

mod batch;
pub mod constants;
mod panic_guard;
pub mod url;

pub use batch::{on_finished, on_progress, BatchHandle, FinishedCallback, ProgressCallback};
pub use panic_guard::{execute_guarded, panic_message, PanicGuardResult};

pub(crate) use batch::{
    interpret, send_with_timeout, Admission, AdmittedRequest, Batch, BatchContext,
};

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tracing::{debug, info};

use crate::application::global_params::GlobalPostParams;
use crate::application::query_string;
use crate::application::queue_registry::QueueRegistry;
use crate::config::ManagerConfig;
use crate::domain::{
    AdmissionPolicy, BatchOutcome, QueueStatus, RequestDescriptor, RequestInput, RequestResult,
};
use crate::error::{ManagerError, Result};
use crate::port::id_provider::UuidProvider;
use crate::port::time_provider::SystemTimeProvider;
use crate::port::{HttpTransport, IdProvider, TimeProvider};
use constants::queue_busy_message;

/// Where a batch future gets driven
enum Dispatch {
    Spawn(Handle),
    BlockInPlace(Handle),
    Private(Runtime),
}

/// HTTP request manager
///
/// Owns the global POST parameters, the queue registry and the mutable
/// settings. Asynchronous managers return from `execute` immediately;
/// synchronous ones block until the batch is done.
pub struct RequestManager {
    asynchronous: bool,
    settings: RwLock<ManagerConfig>,
    global_post_params: GlobalPostParams,
    queues: QueueRegistry,
    transport: Arc<dyn HttpTransport>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
}

impl RequestManager {
    /// Manager with default settings
    pub fn new(asynchronous: bool, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_config(ManagerConfig::new(asynchronous), transport)
    }

    pub fn with_config(config: ManagerConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_providers(
            config,
            transport,
            Arc::new(SystemTimeProvider),
            Arc::new(UuidProvider),
        )
    }

    /// Full constructor with injectable clock and batch id source
    pub fn with_providers(
        config: ManagerConfig,
        transport: Arc<dyn HttpTransport>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        info!(
            asynchronous = config.asynchronous,
            admission = %config.admission_policy,
            "Request manager created"
        );
        Self {
            asynchronous: config.asynchronous,
            settings: RwLock::new(config),
            global_post_params: GlobalPostParams::new(),
            queues: QueueRegistry::new(),
            transport,
            time_provider,
            id_provider,
        }
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn is_asynchronous(&self) -> bool {
        self.asynchronous
    }

    /// Current settings (the `asynchronous` flag is fixed at construction)
    pub fn config(&self) -> ManagerConfig {
        let mut config = self.settings().clone();
        config.asynchronous = self.asynchronous;
        config
    }

    pub fn timeout_ms(&self) -> u64 {
        self.settings().timeout_ms
    }

    /// Manager-wide timeout in milliseconds, 0 disables it
    pub fn set_timeout_ms(&self, timeout_ms: u64) {
        self.update(|s| s.timeout_ms = timeout_ms);
    }

    pub fn is_only_https(&self) -> bool {
        self.settings().is_only_https
    }

    pub fn set_only_https(&self, only_https: bool) {
        self.update(|s| s.is_only_https = only_https);
    }

    pub fn base_url(&self) -> String {
        self.settings().base_url.clone()
    }

    pub fn set_base_url(&self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        self.update(|s| s.base_url = base_url.trim().to_string());
    }

    pub fn internet_check_locations(&self) -> Vec<String> {
        self.settings().internet_check_locations.clone()
    }

    pub fn set_internet_check_locations(&self, locations: Vec<String>) {
        self.update(|s| s.internet_check_locations = locations);
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        self.settings().admission_policy
    }

    pub fn set_admission_policy(&self, policy: AdmissionPolicy) {
        self.update(|s| s.admission_policy = policy);
    }

    fn settings(&self) -> RwLockReadGuard<'_, ManagerConfig> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut ManagerConfig)) {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *settings);
    }

    // ------------------------------------------------------------------
    // Global POST parameters
    // ------------------------------------------------------------------

    pub fn set_global_post_param(&self, name: &str, value: &str) -> Result<()> {
        self.global_post_params.set(name, value)
    }

    pub fn get_global_post_param(&self, name: &str) -> Result<String> {
        self.global_post_params.get(name)
    }

    pub fn is_global_post_param(&self, name: &str) -> Result<bool> {
        self.global_post_params.has(name)
    }

    pub fn delete_global_post_param(&self, name: &str) -> Result<()> {
        self.global_post_params.delete(name)
    }

    // ------------------------------------------------------------------
    // Queues
    // ------------------------------------------------------------------

    pub fn create_queue(&self, name: &str) -> Result<()> {
        self.queues.create(name)
    }

    pub fn count_queues(&self) -> usize {
        self.queues.count()
    }

    pub fn is_queue_running(&self, name: &str) -> Result<bool> {
        self.queues.is_running(name)
    }

    pub fn delete_queue(&self, name: &str) -> Result<()> {
        self.queues.delete(name)
    }

    pub fn queue_statuses(&self) -> Vec<QueueStatus> {
        self.queues.statuses()
    }

    /// See [`query_string::generate_url_query_string`]
    pub fn generate_url_query_string(&self, pairs: &IndexMap<String, Value>) -> Result<String> {
        query_string::generate_url_query_string(pairs)
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Execute one request or a batch.
    ///
    /// Validation and queue admission happen before this returns, so a queue
    /// reports running as soon as `execute` is back. Per-request failures
    /// never surface here; they land in the results and callbacks.
    ///
    /// # Errors
    /// - `NoRequests` / `InvalidRequests` / `InvalidRequestUrl` for malformed input
    /// - `NotFound` if a request names an unregistered queue
    /// - `InvalidState` if no suitable tokio runtime is available
    pub fn execute(
        &self,
        input: impl Into<RequestInput>,
        finished: Option<FinishedCallback>,
        progress: Option<ProgressCallback>,
    ) -> Result<BatchHandle> {
        let descriptors = input.into().into_descriptors()?;
        let dispatch = self.dispatch_target()?;
        let ctx = self.batch_context();
        let requests = self.admit(&ctx, descriptors)?;

        info!(
            batch_id = %ctx.batch_id,
            total = requests.len(),
            asynchronous = self.asynchronous,
            "Batch admitted"
        );

        let batch = Batch {
            ctx: Arc::new(ctx),
            requests,
            finished,
            progress,
        };
        let batch_id = batch.ctx.batch_id.clone();
        if self.asynchronous {
            Self::dispatch(dispatch, batch_id, batch.run_concurrent())
        } else {
            Self::dispatch(dispatch, batch_id, batch.run_sequential())
        }
    }

    /// Execute one request or a batch with every request bound to `queue_name`.
    ///
    /// Any queue already set on a descriptor is overridden. Admission is the
    /// same as `execute`, so the queue reports running once this returns.
    ///
    /// # Errors
    /// Same as `execute`, plus `InvalidArgument` for an empty queue name
    pub fn queue(
        &self,
        input: impl Into<RequestInput>,
        queue_name: &str,
        finished: Option<FinishedCallback>,
        progress: Option<ProgressCallback>,
    ) -> Result<BatchHandle> {
        let descriptors: Vec<RequestDescriptor> = input
            .into()
            .into_descriptors()?
            .into_iter()
            .map(|descriptor| descriptor.with_queue(queue_name))
            .collect();
        self.execute(descriptors, finished, progress)
    }

    /// Snapshot of settings and globals for one batch
    pub(crate) fn batch_context(&self) -> BatchContext {
        let settings = self.settings();
        BatchContext {
            batch_id: self.id_provider.generate_id(),
            transport: Arc::clone(&self.transport),
            time_provider: Arc::clone(&self.time_provider),
            timeout_ms: settings.timeout_ms,
            is_only_https: settings.is_only_https,
            base_url: settings.base_url.clone(),
            global_post_params: self.global_post_params.snapshot(),
        }
    }

    /// Compose urls and issue queue tickets in submission order.
    ///
    /// Every queue name is resolved before any ticket is issued, so an
    /// unknown queue leaves no trace.
    fn admit(
        &self,
        ctx: &BatchContext,
        descriptors: Vec<RequestDescriptor>,
    ) -> Result<Vec<AdmittedRequest>> {
        let mut gates = HashMap::new();
        for descriptor in &descriptors {
            if let Some(name) = &descriptor.queue_name {
                if !gates.contains_key(name) {
                    let gate = self.queues.gate(name)?;
                    gates.insert(name.clone(), gate);
                }
            }
        }

        let policy = self.admission_policy();
        // Busy state of each queue before this batch touched it
        let busy: HashMap<String, bool> = gates
            .iter()
            .map(|(name, gate)| (name.clone(), gate.is_running()))
            .collect();

        let mut admitted = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let mut request = AdmittedRequest::new(ctx, descriptor);
            let queue = match &request.descriptor.queue_name {
                Some(name) if !request.is_settled() => name.clone(),
                _ => {
                    admitted.push(request);
                    continue;
                }
            };

            if let Some(gate) = gates.get(&queue) {
                let busy_before = busy.get(&queue).copied().unwrap_or(false);
                request.admission = match policy {
                    AdmissionPolicy::Wait => Admission::Queued(gate.reserve(true)),
                    AdmissionPolicy::Concurrent => Admission::Queued(gate.reserve(false)),
                    AdmissionPolicy::Reject if busy_before => {
                        debug!(batch_id = %ctx.batch_id, queue = %queue, "Queue busy, request rejected");
                        Admission::Settled(RequestResult::transport_error(
                            &request.url,
                            queue_busy_message(&queue),
                        ))
                    }
                    AdmissionPolicy::Reject => Admission::Queued(gate.reserve(true)),
                };
            }
            admitted.push(request);
        }
        Ok(admitted)
    }

    /// Pick how batch futures get driven, given the mode and the ambient runtime
    fn dispatch_target(&self) -> Result<Dispatch> {
        match (self.asynchronous, Handle::try_current()) {
            (true, Ok(handle)) => Ok(Dispatch::Spawn(handle)),
            (true, Err(_)) => Err(ManagerError::InvalidState(
                "asynchronous requests need a running tokio runtime".into(),
            )),
            (false, Ok(handle)) => match handle.runtime_flavor() {
                RuntimeFlavor::CurrentThread => Err(ManagerError::InvalidState(
                    "synchronous requests cannot block a current-thread runtime".into(),
                )),
                _ => Ok(Dispatch::BlockInPlace(handle)),
            },
            (false, Err(_)) => tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map(Dispatch::Private)
                .map_err(|e| ManagerError::Internal(format!("could not start a runtime: {}", e))),
        }
    }

    fn dispatch<F>(dispatch: Dispatch, batch_id: String, future: F) -> Result<BatchHandle>
    where
        F: Future<Output = BatchOutcome> + Send + 'static,
    {
        match dispatch {
            Dispatch::Spawn(handle) => Ok(BatchHandle::Pending {
                batch_id,
                handle: handle.spawn(future),
            }),
            Dispatch::BlockInPlace(handle) => Ok(BatchHandle::Completed(
                tokio::task::block_in_place(|| handle.block_on(future)),
            )),
            Dispatch::Private(runtime) => Ok(BatchHandle::Completed(runtime.block_on(future))),
        }
    }

    /// Run an arbitrary batch future the same way `execute` would
    pub(crate) fn run_detached<F>(&self, batch_id: String, future: F) -> Result<BatchHandle>
    where
        F: Future<Output = BatchOutcome> + Send + 'static,
    {
        let dispatch = self.dispatch_target()?;
        Self::dispatch(dispatch, batch_id, future)
    }

    pub(crate) fn next_batch_id(&self) -> String {
        self.id_provider.generate_id()
    }
}

#[cfg(test)]
mod manager_test;
