// Domain Layer - Pure value types

pub mod queue;
pub mod request;
pub mod result;

// Re-exports
pub use queue::{AdmissionPolicy, QueueName, QueueStatus};
pub use request::{
    ErrorCallback, FinallyCallback, RequestCallbacks, RequestDescriptor, RequestInput,
    RequestItem, RequestMethod, ResultFormat, SuccessCallback,
};
pub use result::{BatchOutcome, RequestResult, ResponseBody};
