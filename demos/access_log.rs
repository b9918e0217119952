//! Access-logged service: a router wrapped in the finalizing middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example access_log
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -H 'referer: https://example.com/' -H 'x-chunks: 5' http://localhost:3000/stream
//!
//! Every request prints one line on the `access` target, e.g.
//!   INFO access: request completed method="GET" status=200 proto=HTTP/1.1 host="127.0.0.1" user_agent="curl/8.5.0" response_size=28

use epilogue::middleware::{AccessLog, Finalize};
use epilogue::{handler_fn, Request, Response, ResponseSink, Router, Server};
use http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use http::{Method, StatusCode};
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .get("/users/{id}",    get_user)
        .post("/users",        create_user)
        .delete("/users/{id}", delete_user)
        .handle(Method::GET, "/stream", handler_fn(|req, sink| Box::pin(stream(req, sink))));

    Server::bind("0.0.0.0:3000")
        .serve(Finalize::new(AccessLog::new(), app))
        .await
        .expect("server error");
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

// POST /users
async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header(LOCATION, HeaderValue::from_static("/users/99"))
        .json(r#"{"id":"99","name":"new_user"}"#)
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}

// GET /stream: a sink-level handler writing the body in several calls. The
// server buffers the whole response; the access log reports the total across
// every write.
async fn stream(req: &Request, sink: &mut dyn ResponseSink) -> std::io::Result<()> {
    let count: usize = req.header("x-chunks").and_then(|v| v.parse().ok()).unwrap_or(3);
    sink.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    for n in 1..=count {
        sink.write_all(format!("chunk {n}\n").as_bytes()).await?;
    }
    Ok(())
}
