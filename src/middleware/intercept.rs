//! Observing wrapper around a [`ResponseSink`].

use std::io::{self, IoSlice};
use std::pin::Pin;
use std::task::{Context, Poll};

use http::{HeaderMap, StatusCode};
use tokio::io::AsyncWrite;

use crate::sink::ResponseSink;

/// Status recorded when a handler never sets one.
///
/// A sink that sees body bytes before any status sends `200 OK`, so that is
/// what the interceptor reports too.
pub const DEFAULT_STATUS: StatusCode = StatusCode::OK;

/// Passes everything through to the wrapped sink while recording the status
/// that was set and the number of body bytes the sink accepted.
///
/// Nothing is buffered or altered. Byte counts come from what the inner sink
/// reports for each write, so a partial write adds only the accepted prefix.
#[derive(Debug)]
pub struct Interceptor<S> {
    inner: S,
    status: StatusCode,
    written: u64,
}

impl<S: ResponseSink> Interceptor<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, status: DEFAULT_STATUS, written: 0 }
    }

    /// The last status passed to `set_status`, or [`DEFAULT_STATUS`].
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Total body bytes accepted by the inner sink so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ResponseSink> ResponseSink for Interceptor<S> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
        self.inner.set_status(status);
    }
}

impl<S: ResponseSink> AsyncWrite for Interceptor<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = poll {
            this.written += n as u64;
        }
        poll
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write_vectored(cx, bufs);
        if let Poll::Ready(Ok(n)) = poll {
            this.written += n as u64;
        }
        poll
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::sink::ResponseBuffer;

    /// Accepts at most `limit` bytes per write, then fails once `budget` is spent.
    struct Trickle {
        headers: HeaderMap,
        limit: usize,
        budget: usize,
        statuses: Vec<StatusCode>,
    }

    impl Trickle {
        fn new(limit: usize, budget: usize) -> Self {
            Self { headers: HeaderMap::new(), limit, budget, statuses: Vec::new() }
        }
    }

    impl ResponseSink for Trickle {
        fn headers(&self) -> &HeaderMap { &self.headers }
        fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
        fn set_status(&mut self, status: StatusCode) { self.statuses.push(status); }
    }

    impl AsyncWrite for Trickle {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            if this.budget == 0 && !buf.is_empty() {
                return Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()));
            }
            let n = buf.len().min(this.limit).min(this.budget);
            this.budget -= n;
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn starts_at_default_status_and_zero_bytes() {
        let iw = Interceptor::new(ResponseBuffer::new());
        assert_eq!(iw.status(), StatusCode::OK);
        assert_eq!(DEFAULT_STATUS, StatusCode::OK);
        assert_eq!(iw.written(), 0);
    }

    #[test]
    fn last_status_wins_and_every_call_is_forwarded() {
        let mut iw = Interceptor::new(Trickle::new(8, 64));
        iw.set_status(StatusCode::NOT_FOUND);
        iw.set_status(StatusCode::GONE);

        assert_eq!(iw.status(), StatusCode::GONE);
        assert_eq!(iw.into_inner().statuses, [StatusCode::NOT_FOUND, StatusCode::GONE]);
    }

    #[tokio::test]
    async fn counts_accepted_bytes_of_partial_writes() {
        let mut iw = Interceptor::new(Trickle::new(4, 64));

        let n = iw.write(b"0123456789").await.unwrap();
        assert_eq!(n, 4);
        assert_eq!(iw.written(), 4);

        iw.write_all(b"abcdef").await.unwrap();
        assert_eq!(iw.written(), 10);
    }

    #[tokio::test]
    async fn passes_sink_errors_through_unchanged() {
        let mut iw = Interceptor::new(Trickle::new(16, 5));

        let err = iw.write_all(b"0123456789").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(iw.written(), 5);
    }

    #[tokio::test]
    async fn header_access_reaches_the_inner_sink() {
        let mut iw = Interceptor::new(ResponseBuffer::new());
        iw.headers_mut().insert("x-trace", "abc".parse().unwrap());
        iw.write_all(b"body").await.unwrap();

        assert_eq!(iw.headers()["x-trace"], "abc");
        let buf = iw.into_inner();
        assert_eq!(buf.body(), b"body");
    }
}
