//! Serving over a real socket.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use request_watch::config::WatchConfig;
use request_watch::lifecycle::Shutdown;

mod common;

#[tokio::test]
async fn test_serves_and_shuts_down() {
    let app = common::TestApp::new(WatchConfig {
        use_request_context: true,
        ..WatchConfig::default()
    });
    let logger = app.logger.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { app.server.run(listener, server_shutdown).await });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /api/ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("pong"));

    let texts = logger.texts();
    assert!(texts.iter().any(|t| t.ends_with("hostIp=127.0.0.1")));
    assert!(texts.iter().any(|t| t.ends_with("remoteIp=127.0.0.1")));
    assert!(texts.last().unwrap().contains("[GET] /api/ping elapsed: "));

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
