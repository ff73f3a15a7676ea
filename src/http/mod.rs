//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, ConnectInfo, graceful shutdown)
//!     → middleware/request_logger.rs (start timer, tee request body)
//!     → handlers.rs (application routes)
//!     → middleware/request_logger.rs (tee response body)
//!     → body.rs (stream to client, emit LogEntry at end-of-stream)
//!     → record.rs (LogEntry shape)
//! ```

pub mod body;
pub mod handlers;
pub mod middleware;
pub mod record;
pub mod server;

pub use middleware::{RequestLoggerLayer, RequestLoggerService};
pub use record::{BodyValue, HandlerFailure, LogEntry, Outcome, RequestRecord, ResponseRecord};
pub use server::{build_app, HttpServer};
