//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A path leads either to an
//! endpoint (`async fn(Request) -> impl IntoResponse`) or to a sink-level
//! [`Handler`]. The router is itself a handler, so middleware wraps it like
//! any other.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::endpoint::{BoxedEndpoint, Endpoint};
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response::Response;
use crate::sink::ResponseSink;

/// The application router.
///
/// Build it once at startup; pass it (optionally wrapped in middleware) to
/// [`Server::serve`](crate::Server::serve). Each registration returns `self`
/// so calls chain naturally.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Route>>,
}

#[derive(Clone)]
enum Route {
    Endpoint(BoxedEndpoint),
    Handler(Arc<dyn Handler>),
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust
    /// # use epilogue::{Request, Response, Router};
    /// # use http::Method;
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup.
    pub fn on(self, method: Method, path: &str, endpoint: impl Endpoint) -> Self {
        self.add(method, path, Route::Endpoint(endpoint.into_boxed_endpoint()))
    }

    /// Register a sink-level [`Handler`] for a method + path pair.
    ///
    /// The handler sees a request carrying the matched path parameters and
    /// writes to the sink directly, e.g. to send a body in pieces.
    ///
    /// # Panics
    ///
    /// Same as [`on`](Router::on).
    pub fn handle(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(method, path, Route::Handler(Arc::new(handler)))
    }

    fn add(mut self, method: Method, path: &str, route: Route) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, endpoint: impl Endpoint) -> Self {
        self.on(Method::GET, path, endpoint)
    }

    pub fn post(self, path: &str, endpoint: impl Endpoint) -> Self {
        self.on(Method::POST, path, endpoint)
    }

    pub fn put(self, path: &str, endpoint: impl Endpoint) -> Self {
        self.on(Method::PUT, path, endpoint)
    }

    pub fn delete(self, path: &str, endpoint: impl Endpoint) -> Self {
        self.on(Method::DELETE, path, endpoint)
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Result<(Route, HashMap<String, String>), StatusCode> {
        let matched = self.routes.get(method).and_then(|tree| tree.at(path).ok());
        let Some(matched) = matched else {
            let elsewhere = self.routes.values().any(|tree| tree.at(path).is_ok());
            return Err(if elsewhere { StatusCode::METHOD_NOT_ALLOWED } else { StatusCode::NOT_FOUND });
        };
        let route = matched.value.clone();
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Ok((route, params))
    }
}

impl Handler for Router {
    fn call<'a>(&'a self, req: &'a Request, sink: &'a mut dyn ResponseSink) -> BoxFuture<'a> {
        Box::pin(async move {
            let (route, params) = match self.lookup(req.method(), req.path()) {
                Ok(found) => found,
                Err(status) => return Response::status(status).write_to(sink).await,
            };
            let routed = req.clone().with_params(params);
            match route {
                Route::Endpoint(endpoint) => endpoint.call(routed).await.write_to(sink).await,
                Route::Handler(handler) => handler.call(&routed, sink).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::handler::handler_fn;
    use crate::sink::ResponseBuffer;

    async fn get_user(req: Request) -> String {
        format!("user {}", req.param("id").unwrap_or("?"))
    }

    async fn dispatch(router: &Router, method: Method, uri: &str) -> ResponseBuffer {
        let req = http::Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap();
        let req = Request::from_http(req, "127.0.0.1:1");
        let mut buf = ResponseBuffer::new();
        router.call(&req, &mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn routes_with_params() {
        let router = Router::new().get("/users/{id}", get_user);
        let buf = dispatch(&router, Method::GET, "/users/42").await;

        assert_eq!(buf.status(), StatusCode::OK);
        assert_eq!(buf.body(), b"user 42");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let router = Router::new().get("/users/{id}", get_user);
        let buf = dispatch(&router, Method::GET, "/nope").await;
        assert_eq!(buf.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_405() {
        let router = Router::new().get("/users/{id}", get_user);
        let buf = dispatch(&router, Method::DELETE, "/users/42").await;
        assert_eq!(buf.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn mounts_sink_level_handlers() {
        let router = Router::new().handle(Method::GET, "/echo/{word}", handler_fn(|req, sink| {
            Box::pin(async move {
                let word = req.param("word").unwrap_or_default().to_owned();
                sink.set_status(StatusCode::ACCEPTED);
                sink.write_all(word.as_bytes()).await?;
                sink.write_all(b"!").await
            })
        }));
        let buf = dispatch(&router, Method::GET, "/echo/hi").await;

        assert_eq!(buf.status(), StatusCode::ACCEPTED);
        assert_eq!(buf.body(), b"hi!");
    }
}
