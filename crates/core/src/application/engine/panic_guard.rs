// Panic isolation for user callbacks and request tasks
//
// A panicking callback must not take the batch driver down with it, and a
// panicking request task must surface as an error result for that request.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    Completed(T),
    Panicked(String),
}

impl<T> PanicGuardResult<T> {
    pub fn is_panicked(&self) -> bool {
        matches!(self, PanicGuardResult::Panicked(_))
    }
}

/// Run a closure, catching any panic it raises.
///
/// `label` names the callback in the log line (e.g. `on_success`).
pub fn execute_guarded<F, T>(label: &str, f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => PanicGuardResult::Completed(value),
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            error!(callback = %label, panic_msg = %panic_msg, "Callback panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

/// Extract the message of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
