// Resource list loading
//
// A list file names one resource per line; every resource is fetched from
// a base url as a single batch and handed back in list order.

use std::sync::Arc;
use tracing::{info, warn};

use crate::application::engine::url::compose_url;
use crate::application::engine::{
    execute_guarded, AdmittedRequest, Batch, BatchHandle, ProgressCallback, RequestManager,
};
use crate::domain::{BatchOutcome, RequestDescriptor, RequestResult};
use crate::error::{ManagerError, Result};

/// Trimmed, non empty lines of a list file
pub fn resource_names(list: &str) -> Vec<String> {
    list.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

impl RequestManager {
    /// Load every resource named in the file at `list_url` from `base_url`.
    ///
    /// `on_loaded(names, bodies)` receives both lists in list order. If the
    /// list or any resource fails, `on_error(url, msg, code)` is called once
    /// for the first failure (in list order) instead.
    ///
    /// # Errors
    /// `InvalidArgument` if `list_url` or `base_url` is empty
    pub fn load_resources_from_list<L, E>(
        &self,
        list_url: &str,
        base_url: &str,
        on_loaded: L,
        on_error: E,
        on_progress: Option<ProgressCallback>,
    ) -> Result<BatchHandle>
    where
        L: Fn(&[String], &[String]) + Send + Sync + 'static,
        E: Fn(&str, &str, u16) + Send + Sync + 'static,
    {
        if list_url.trim().is_empty() {
            return Err(ManagerError::InvalidArgument(
                "list_url must be a non empty string".into(),
            ));
        }
        if base_url.trim().is_empty() {
            return Err(ManagerError::InvalidArgument(
                "base_url must be a non empty string".into(),
            ));
        }

        let ctx = Arc::new(self.batch_context());
        let batch_id = ctx.batch_id.clone();
        let list_request = AdmittedRequest::new(&ctx, RequestDescriptor::get(list_url));
        let base_url = base_url.trim().to_string();
        let asynchronous = self.is_asynchronous();

        let report_error = move |failed: &RequestResult| {
            warn!(url = %failed.url, code = failed.code, error = %failed.error_msg, "Resource load failed");
            execute_guarded("on_error", || on_error(&failed.url, &failed.error_msg, failed.code));
        };

        let future = async move {
            let list = Batch {
                ctx: Arc::clone(&ctx),
                requests: vec![list_request],
                finished: None,
                progress: None,
            }
            .run_sequential()
            .await;

            if let Some(failed) = list.results.iter().find(|r| r.is_error).cloned() {
                report_error(&failed);
                return list;
            }
            let list_text = list
                .results
                .first()
                .map(|r| r.response.to_string())
                .unwrap_or_default();

            let names = resource_names(&list_text);
            if names.is_empty() {
                execute_guarded("on_loaded", || on_loaded(&[], &[]));
                return list;
            }

            let requests = names
                .iter()
                .map(|name| {
                    AdmittedRequest::new(&ctx, RequestDescriptor::get(compose_url(&base_url, name)))
                })
                .collect();
            let batch = Batch {
                ctx: Arc::clone(&ctx),
                requests,
                finished: None,
                progress: on_progress,
            };
            let loaded = if asynchronous {
                batch.run_concurrent().await
            } else {
                batch.run_sequential().await
            };

            match loaded.results.iter().find(|r| r.is_error) {
                Some(failed) => report_error(failed),
                None => {
                    let bodies: Vec<String> =
                        loaded.results.iter().map(|r| r.response.to_string()).collect();
                    info!(batch_id = %ctx.batch_id, resources = names.len(), "Resources loaded");
                    execute_guarded("on_loaded", || on_loaded(&names, &bodies));
                }
            }
            BatchOutcome::new(ctx.batch_id.clone(), loaded.results)
        };

        self.run_detached(batch_id, future)
    }
}
