//! Middleware layer.
//!
//! Middleware wraps a [`Handler`](crate::Handler) and is itself a handler, so
//! layers nest by construction. This module carries the request-completion
//! hook and the access log built on top of it:
//!
//! - [`Interceptor`]: observes a response sink, recording the status sent and
//!   the body bytes accepted.
//! - [`Finalize`]: runs a [`Finalizer`] once per request after the inner
//!   handler is done, on every exit path.
//! - [`response_headers`] / [`response_size`]: read the completion record
//!   from the finalizer's context.
//! - [`AccessLog`]: a finalizer emitting one structured `tracing` event per
//!   request.
//!
//! ```rust,no_run
//! use epilogue::middleware::{AccessLog, Finalize};
//! use epilogue::{Request, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new().get("/", |_req: Request| async { "hello" });
//!
//!     Server::bind("0.0.0.0:3000")
//!         .serve(Finalize::new(AccessLog::new(), app))
//!         .await
//!         .unwrap();
//! }
//! ```

mod access_log;
mod finalize;
mod intercept;

pub use access_log::{AccessLog, AccessRecord, ACCESS_TARGET};
pub use finalize::{response_headers, response_size, Finalize, Finalizer};
pub use intercept::{Interceptor, DEFAULT_STATUS};
