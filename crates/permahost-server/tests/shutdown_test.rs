//! Graceful shutdown of the HTTP server.

use std::time::{Duration, Instant};

use axum::{Router, routing::get};
use permahost_server::serve_with_shutdown;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn stuck() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3600)).await;
    "done"
}

#[tokio::test]
async fn drain_gives_up_on_stuck_requests() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/stuck", get(stuck));
    let grace = Duration::from_millis(200);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_with_shutdown(
        listener,
        app,
        async move {
            let _ = stop_rx.await;
        },
        grace,
    ));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /stuck HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let signalled = Instant::now();
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop within the grace period")
        .unwrap();

    assert!(result.is_ok());
    assert!(signalled.elapsed() >= grace);
}

#[tokio::test]
async fn idle_server_stops_on_signal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let app = Router::new().route("/stuck", get(stuck));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_with_shutdown(
        listener,
        app,
        async move {
            let _ = stop_rx.await;
        },
        Duration::from_secs(60),
    ));

    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("idle server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
