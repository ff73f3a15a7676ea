//! Middleware applied around the application routes.

pub mod request_logger;

pub use request_logger::{RequestLoggerLayer, RequestLoggerService};
