use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use epilogue::middleware::{response_size, Finalize};
use epilogue::{handler_fn, Context, Request, Server};
use http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

type Log = Arc<Mutex<Vec<(StatusCode, Option<u64>)>>>;

/// Reserves a free local port for the server under test.
fn free_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

async fn connect(addr: &str) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(addr).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server at {addr} never came up");
}

async fn raw_get(addr: &str, path: &str) -> String {
    let mut stream = connect(addr).await;
    let request = format!("GET {path} HTTP/1.1\r\nhost: {addr}\r\nconnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test]
async fn handler_error_sends_the_status_the_finalizer_saw() {
    let log = Log::default();
    let finalizer = {
        let log = Arc::clone(&log);
        move |cx: &Context, status: StatusCode, _req: &Request| {
            log.lock().unwrap().push((status, response_size(cx)));
        }
    };
    let app = Finalize::new(finalizer, handler_fn(|_req, sink| Box::pin(async move {
        sink.set_status(StatusCode::CREATED);
        sink.write_all(b"hello").await?;
        Err::<(), _>(io::Error::other("backend went away"))
    })));

    let addr = free_addr();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::bind(addr.clone()).serve_with_shutdown(app, async {
        let _ = stopped.await;
    }));

    let response = raw_get(&addr, "/things").await;

    assert!(response.starts_with("HTTP/1.1 201 Created\r\n"), "got: {response}");
    assert!(response.ends_with("\r\n\r\nhello"), "got: {response}");
    assert_eq!(*log.lock().unwrap(), [(StatusCode::CREATED, Some(5))]);

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn bind_failure_is_reported() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    let err = Server::bind(addr.clone())
        .serve_with_shutdown(handler_fn(|_req, _sink| Box::pin(async { Ok::<(), io::Error>(()) })), async {})
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with(&format!("bind {addr}: ")), "got: {err}");
}
