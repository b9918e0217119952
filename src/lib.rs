//! # epilogue
//!
//! Request-completion hooks for HTTP services, and an access log built on
//! them. Wrap a handler, and a callback of your choosing runs once the
//! response has been written, with the status that went out, the response
//! headers, the body size, and the original request.
//!
//! ## The contract
//!
//! The hook observes; it never buffers or rewrites a byte. Values are final
//! only once the inner handler is done, and the callback runs exactly once
//! per request on every way out of it: normal return, I/O error, panic, or
//! the request future being dropped.
//!
//! What epilogue intentionally leaves to others:
//!
//! - **Metrics and tracing spans**: build them in your own finalizer
//! - **Log formatting and shipping**: the `tracing` subscriber owns that
//! - **Timeouts on the callback**: a finalizer is plain synchronous code
//!
//! ## Pieces
//!
//! - [`ResponseSink`]: what a handler writes status, headers and body to
//! - [`Handler`]: handle one request, write one response; [`Router`] and every
//!   middleware are handlers
//! - [`middleware::Finalize`] + [`middleware::Finalizer`]: the hook
//! - [`middleware::AccessLog`]: one structured `tracing` event per request
//! - [`Server`]: hyper-based host with graceful shutdown
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use epilogue::middleware::{AccessLog, Finalize};
//! use epilogue::{Request, Response, Router, Server};
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     let app = Router::new()
//!         .get("/users/{id}", get_user)
//!         .post("/users",     create_user);
//!
//!     Server::bind("0.0.0.0:3000")
//!         .serve(Finalize::new(AccessLog::new(), app))
//!         .await
//!         .unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder().status(StatusCode::CREATED).json(r#"{"id":"99"}"#)
//! }
//! ```

mod context;
mod endpoint;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod sink;

pub mod middleware;

pub use context::Context;
pub use endpoint::Endpoint;
pub use error::Error;
pub use handler::{handler_fn, BoxFuture, Handler, HandlerFn};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use sink::{ResponseBuffer, ResponseSink};
