pub mod server;
pub mod service;
pub mod tracing;

pub use crate::server::*;
pub use crate::service::*;
pub use crate::tracing::TracingService;
