//! The response sink: what a handler writes its status, headers and body to.
//!
//! [`ResponseSink`] is [`AsyncWrite`] for the body plus access to the status
//! and headers that precede it. Anything that forwards to another sink (the
//! finalizing middleware's interceptor, or a plain `&mut` borrow) is a sink
//! too, which is what lets wrappers stack.
//!
//! The server drives handlers against a [`ResponseBuffer`] and hands the
//! buffered result to hyper once the handler is done.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use tokio::io::AsyncWrite;
use tracing::warn;

/// Something a handler writes one response to.
///
/// Headers must be in place before the status is set or the first body byte
/// is written; sinks are free to ignore header changes after that point.
pub trait ResponseSink: AsyncWrite + Send + Unpin {
    /// Headers that will be (or have been) sent with the response.
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sends the status line. Handlers that never call this get `200 OK`.
    fn set_status(&mut self, status: StatusCode);
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn set_status(&mut self, status: StatusCode) {
        (**self).set_status(status);
    }
}

// ── ResponseBuffer ────────────────────────────────────────────────────────────

/// In-memory sink used by the server.
///
/// The status is committed by the first [`set_status`](ResponseSink::set_status)
/// call or, failing that, by the first body write (implicitly `200 OK`).
/// Later status changes are ignored, as they would be on a real connection
/// where the status line has already gone out.
#[derive(Debug)]
pub struct ResponseBuffer {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    committed: bool,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            committed: false,
        }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Converts the buffered response into the form hyper sends.
    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body.freeze()));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self { Self::new() }
}

impl ResponseSink for ResponseBuffer {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        if self.committed {
            warn!(current = %self.status, ignored = %status, "superfluous set_status call");
            return;
        }
        self.status = status;
        self.committed = true;
    }
}

impl AsyncWrite for ResponseBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        this.committed = true;
        this.body.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
