//! Structured access logging on top of [`Finalize`](super::Finalize).
//!
//! [`AccessLog`] is a [`Finalizer`]: wrap your app in
//! `Finalize::new(AccessLog::new(), app)` and every request produces one
//! `tracing` event at `INFO` on target [`ACCESS_TARGET`]:
//!
//! | Field           | Value                                                 |
//! |-----------------|-------------------------------------------------------|
//! | `method`        | request method                                        |
//! | `status`        | status code sent                                      |
//! | `proto`         | protocol version, e.g. `HTTP/1.1`                     |
//! | `host`          | client address without the port                       |
//! | `user_agent`    | `User-Agent` header, empty if absent                  |
//! | `referer`       | `Referer` header; omitted when empty                  |
//! | `response_size` | body bytes written; omitted when unknown              |
//!
//! Formatting and destination are the subscriber's business.

use http::{StatusCode, Version};
use tracing::info;

use super::finalize::{response_size, Finalizer};
use crate::context::Context;
use crate::request::Request;

/// `tracing` target of access-log events, for filtering (`RUST_LOG=access=info`).
pub const ACCESS_TARGET: &str = "access";

/// A [`Finalizer`] that logs one [`AccessRecord`] per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl AccessLog {
    pub fn new() -> Self {
        Self
    }
}

impl Finalizer for AccessLog {
    fn finalize(&self, cx: &Context, status: StatusCode, req: &Request) {
        AccessRecord::new(cx, status, req).emit();
    }
}

/// The fields of one access-log line, borrowed from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord<'a> {
    pub method: &'a str,
    pub status: StatusCode,
    pub proto: Version,
    pub host: &'a str,
    pub user_agent: &'a str,
    pub referer: Option<&'a str>,
    pub response_size: Option<u64>,
}

impl<'a> AccessRecord<'a> {
    pub fn new(cx: &Context, status: StatusCode, req: &'a Request) -> Self {
        let referer = req.referer();
        Self {
            method: req.method().as_str(),
            status,
            proto: req.version(),
            host: client_host(req.remote_addr()),
            user_agent: req.user_agent(),
            referer: (!referer.is_empty()).then_some(referer),
            response_size: response_size(cx),
        }
    }

    /// Emits the record. `None` fields are left out of the event entirely.
    pub fn emit(&self) {
        info!(
            target: ACCESS_TARGET,
            method = self.method,
            status = self.status.as_u16(),
            proto = ?self.proto,
            host = self.host,
            user_agent = self.user_agent,
            referer = self.referer,
            response_size = self.response_size,
            "request completed"
        );
    }
}

/// Strips the port from a `host:port` or `[v6]:port` address. Anything that
/// does not split that way is returned as is.
fn client_host(addr: &str) -> &str {
    split_host(addr).unwrap_or(addr)
}

fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        tail.strip_prefix(':')?;
        return Some(host);
    }
    let (host, _port) = addr.rsplit_once(':')?;
    // more than one colon without brackets: a bare IPv6 address, not host:port
    (!host.contains(':')).then_some(host)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use http::header::{REFERER, USER_AGENT};
    use http::Method;
    use tokio::io::AsyncWriteExt;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
    use tracing_subscriber::Layer;

    use super::*;
    use crate::handler::{handler_fn, Handler};
    use crate::middleware::Finalize;
    use crate::sink::ResponseBuffer;

    type Captured = Arc<Mutex<Vec<(String, BTreeMap<String, String>)>>>;

    /// Records the target and fields of every event it sees.
    struct Capture(Captured);

    #[derive(Default)]
    struct Fields(BTreeMap<String, String>);

    impl Visit for Fields {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_owned(), value.to_owned());
        }

        fn record_u64(&mut self, field: &Field, value: u64) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() != "message" {
                self.0.insert(field.name().to_owned(), format!("{value:?}"));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
            let mut fields = Fields::default();
            event.record(&mut fields);
            self.0.lock().unwrap().push((event.metadata().target().to_owned(), fields.0));
        }
    }

    fn capture() -> (Captured, impl Subscriber + Send + Sync) {
        let events = Captured::default();
        let subscriber = tracing_subscriber::registry().with(Capture(Arc::clone(&events)));
        (events, subscriber)
    }

    fn request(remote_addr: &str, referer: Option<&str>) -> Request {
        let mut req = http::Request::builder()
            .method(Method::GET)
            .uri("/things")
            .version(Version::HTTP_11)
            .header(USER_AGENT, "test-agent");
        if let Some(referer) = referer {
            req = req.header(REFERER, referer);
        }
        Request::from_http(req.body(Bytes::new()).unwrap(), remote_addr)
    }

    fn expected(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[tokio::test]
    async fn logs_completed_request_through_finalize() {
        let (events, subscriber) = capture();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = Finalize::new(AccessLog::new(), handler_fn(|_req, sink| Box::pin(async move {
            sink.write_all(&[b'x'; 123]).await
        })));
        app.call(&request("10.0.0.5:443", None), &mut ResponseBuffer::new()).await.unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, ACCESS_TARGET);
        assert_eq!(events[0].1, expected(&[
            ("method", "GET"),
            ("status", "200"),
            ("proto", "HTTP/1.1"),
            ("host", "10.0.0.5"),
            ("user_agent", "test-agent"),
            ("response_size", "123"),
        ]));
    }

    #[test]
    fn includes_referer_and_omits_unknown_size() {
        let (events, subscriber) = capture();
        let req = request("[::1]:8080", Some("https://example.com/"));

        tracing::subscriber::with_default(subscriber, || {
            AccessLog::new().finalize(req.context(), StatusCode::NOT_FOUND, &req);
        });

        let events = events.lock().unwrap();
        assert_eq!(events[0].1, expected(&[
            ("method", "GET"),
            ("status", "404"),
            ("proto", "HTTP/1.1"),
            ("host", "::1"),
            ("user_agent", "test-agent"),
            ("referer", "https://example.com/"),
        ]));
    }

    #[test]
    fn record_borrows_request_fields() {
        let req = request("192.168.1.20:51000", None);
        let record = AccessRecord::new(req.context(), StatusCode::OK, &req);

        assert_eq!(record, AccessRecord {
            method: "GET",
            status: StatusCode::OK,
            proto: Version::HTTP_11,
            host: "192.168.1.20",
            user_agent: "test-agent",
            referer: None,
            response_size: None,
        });
    }

    #[test]
    fn client_host_strips_port_or_falls_back() {
        assert_eq!(client_host("10.0.0.5:443"), "10.0.0.5");
        assert_eq!(client_host("[2001:db8::1]:80"), "2001:db8::1");
        assert_eq!(client_host("localhost:"), "localhost");
        assert_eq!(client_host("10.0.0.5"), "10.0.0.5");
        assert_eq!(client_host("2001:db8::1"), "2001:db8::1");
        assert_eq!(client_host("[2001:db8::1]"), "[2001:db8::1]");
        assert_eq!(client_host("/run/app.sock"), "/run/app.sock");
    }
}
