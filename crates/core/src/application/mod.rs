// Application Layer - Use Cases and Business Logic

pub mod engine;
pub mod global_params;
pub mod probes;
pub mod query_string;
pub mod queue_registry;
pub mod resources;

// Re-exports
pub use engine::{
    on_finished, on_progress, BatchHandle, FinishedCallback, ProgressCallback, RequestManager,
};
pub use global_params::GlobalPostParams;
pub use query_string::{encode_uri_component, generate_url_query_string};
pub use queue_registry::QueueRegistry;
pub use resources::resource_names;
