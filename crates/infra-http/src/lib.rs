// Courier Infrastructure - HTTP Adapter
// Implements: HttpTransport (ADR-001)

pub mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;
