//! The `Handler` trait: handle one request, write one response.
//!
//! Everything the server can drive is a [`Handler`]: the [`Router`], the
//! finalizing middleware wrapped around it, or a bare closure adapted with
//! [`handler_fn`]. Because a middleware is itself a handler that holds
//! another handler, layers compose by plain nesting:
//!
//! ```text
//! Server ──▶ Finalize<Router, AccessLog> ──▶ Router ──▶ endpoint
//!               │                              │
//!               └── Interceptor ◀── writes ────┘
//! ```
//!
//! The request is lent, not given: a wrapping layer still holds it when the
//! inner handler returns, which is what lets a finalizer see the original
//! request after the response has been written.
//!
//! [`Router`]: crate::Router

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::sink::ResponseSink;

/// A heap-allocated, type-erased future borrowed from a handler call.
///
/// `Send` lets tokio move the future across worker threads; the lifetime ties
/// it to the request and sink it was called with.
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>>;

/// Handles one request by writing one response to `sink`.
///
/// Errors are the sink's own I/O errors, returned unchanged so the layer
/// that called you sees exactly what it would have seen without you.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, req: &'a Request, sink: &'a mut dyn ResponseSink) -> BoxFuture<'a>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call<'a>(&'a self, req: &'a Request, sink: &'a mut dyn ResponseSink) -> BoxFuture<'a> {
        (**self).call(req, sink)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn call<'a>(&'a self, req: &'a Request, sink: &'a mut dyn ResponseSink) -> BoxFuture<'a> {
        (**self).call(req, sink)
    }
}

// ── Closures ──────────────────────────────────────────────────────────────────

/// Adapts a closure into a [`Handler`].
///
/// The closure returns a boxed future so it may borrow the request and sink:
///
/// ```rust
/// use epilogue::handler_fn;
/// use http::StatusCode;
/// use tokio::io::AsyncWriteExt;
///
/// let teapot = handler_fn(|_req, sink| Box::pin(async move {
///     sink.set_status(StatusCode::IM_A_TEAPOT);
///     sink.write_all(b"short and stout").await
/// }));
/// # let _ = teapot;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a Request, &'a mut dyn ResponseSink) -> BoxFuture<'a> + Send + Sync + 'static,
{
    HandlerFn(f)
}

/// A [`Handler`] backed by a closure. Created by [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F>(F);

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a Request, &'a mut dyn ResponseSink) -> BoxFuture<'a> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, req: &'a Request, sink: &'a mut dyn ResponseSink) -> BoxFuture<'a> {
        (self.0)(req, sink)
    }
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}
