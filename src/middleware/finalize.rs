//! Run a callback once the response has been written.
//!
//! [`Finalize`] wraps a handler. For every request it puts an
//! [`Interceptor`] in front of the sink, runs the inner handler, and then
//! calls the [`Finalizer`] with the status that was sent, the original
//! request, and a context carrying the response headers and byte count
//! (read back with [`response_headers`] and [`response_size`]).
//!
//! The callback runs from a drop guard, so it fires on every way out of the
//! inner handler: a normal return, an `Err`, a panic unwinding through this
//! layer, or the request future being dropped (client gone, a timeout
//! wrapped around the server), even before its first poll. In every case it
//! sees whatever had been written up to that point. A panic keeps unwinding
//! once the callback returns.
//!
//! ```rust
//! use epilogue::middleware::{response_size, Finalize};
//! use epilogue::{Context, Request, Router};
//! use http::StatusCode;
//!
//! let app = Finalize::new(
//!     |cx: &Context, status: StatusCode, req: &Request| {
//!         let size = response_size(cx).unwrap_or_default();
//!         println!("{} {} -> {status} ({size} bytes)", req.method(), req.path());
//!     },
//!     Router::new().get("/", |_req: Request| async { "hello" }),
//! );
//! # let _ = app;
//! ```

use http::{HeaderMap, StatusCode};

use crate::context::Context;
use crate::handler::{BoxFuture, Handler};
use crate::middleware::intercept::Interceptor;
use crate::request::Request;
use crate::sink::ResponseSink;

/// Called once per request after the response has been written.
///
/// Implemented for any `Fn(&Context, StatusCode, &Request)` closure.
/// Finalizers for different requests may run concurrently. A finalizer must
/// not panic: it can run while a handler panic is already unwinding.
pub trait Finalizer: Send + Sync + 'static {
    fn finalize(&self, cx: &Context, status: StatusCode, req: &Request);
}

impl<F> Finalizer for F
where
    F: Fn(&Context, StatusCode, &Request) + Send + Sync + 'static,
{
    fn finalize(&self, cx: &Context, status: StatusCode, req: &Request) {
        self(cx, status, req);
    }
}

/// Middleware that calls a [`Finalizer`] at the end of every request.
#[derive(Debug, Clone)]
pub struct Finalize<H, F> {
    inner: H,
    finalizer: F,
}

impl<H: Handler, F: Finalizer> Finalize<H, F> {
    pub fn new(finalizer: F, inner: H) -> Self {
        Self { inner, finalizer }
    }
}

impl<H: Handler, F: Finalizer> Handler for Finalize<H, F> {
    fn call<'a>(&'a self, req: &'a Request, sink: &'a mut dyn ResponseSink) -> BoxFuture<'a> {
        // Built outside the future so that dropping it unpolled still finalizes.
        let guard = Finalizing {
            writer: Interceptor::new(sink),
            req,
            finalizer: &self.finalizer,
        };
        Box::pin(async move {
            let mut guard = guard;
            self.inner.call(req, &mut guard.writer).await
        })
    }
}

/// Drop guard owning the interceptor for one request.
struct Finalizing<'a> {
    writer: Interceptor<&'a mut dyn ResponseSink>,
    req: &'a Request,
    finalizer: &'a dyn Finalizer,
}

impl Drop for Finalizing<'_> {
    fn drop(&mut self) {
        let cx = self.req.context()
            .with(ResponseHeaders(self.writer.headers().clone()))
            .with(ResponseSize(self.writer.written()));
        self.finalizer.finalize(&cx, self.writer.status(), self.req);
    }
}

// ── Context accessors ─────────────────────────────────────────────────────────

// Private key types: nothing outside this module can name them, so nothing
// else can read or shadow these context slots.

#[derive(Clone)]
struct ResponseHeaders(HeaderMap);

#[derive(Clone, Copy)]
struct ResponseSize(u64);

/// Response headers as they stood when the request finished.
///
/// `None` unless `cx` is the context handed to a [`Finalizer`].
pub fn response_headers(cx: &Context) -> Option<&HeaderMap> {
    cx.get::<ResponseHeaders>().map(|h| &h.0)
}

/// Body bytes written for the request.
///
/// `None` unless `cx` is the context handed to a [`Finalizer`].
pub fn response_size(cx: &Context) -> Option<u64> {
    cx.get::<ResponseSize>().map(|s| s.0)
}
