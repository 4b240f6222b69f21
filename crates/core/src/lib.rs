// Courier Core - Domain Logic & Ports
// NO infrastructure dependencies (ADR-001: Hexagonal Architecture)

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{
    generate_url_query_string, on_finished, on_progress, BatchHandle, FinishedCallback,
    GlobalPostParams, ProgressCallback, QueueRegistry, RequestManager,
};
pub use config::ManagerConfig;
pub use domain::{
    AdmissionPolicy, BatchOutcome, QueueStatus, RequestDescriptor, RequestInput, RequestItem,
    RequestMethod, RequestResult, ResponseBody, ResultFormat,
};
pub use error::{ManagerError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
