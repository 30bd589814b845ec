//! End-to-end tests: real sockets between client, proxy and origin.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use forward_proxy::config::schema::DEFAULT_USER_AGENT;
use forward_proxy::config::ProxyConfig;

mod common;

fn fast_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.timeouts.client_read_secs = 2;
    config.timeouts.connect_secs = 2;
    config.timeouts.idle_secs = 1;
    config.timeouts.shutdown_grace_secs = 2;
    config
}

#[tokio::test]
async fn absolute_form_request_is_normalized_and_relayed() {
    let (origin, mut heads) = common::start_mock_origin("hello from origin").await;
    let proxy = common::start_proxy(fast_config()).await;

    let request = format!("GET http://127.0.0.1:{}/index.html HTTP/1.1\r\n\r\n", origin.port());
    let response = common::exchange(proxy.addr, request.as_bytes()).await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "response: {response}");
    assert!(response.ends_with("hello from origin"));

    let head = heads.recv().await.unwrap();
    let expected = format!(
        "GET http://127.0.0.1:{port}/index.html HTTP/1.0\r\n\
         Host: 127.0.0.1:{port}\r\n\
         User-Agent: {ua}\r\n\
         Connection: close\r\n\
         Proxy-Connection: close\r\n\
         \r\n",
        port = origin.port(),
        ua = DEFAULT_USER_AGENT
    );
    assert_eq!(head, expected);

    proxy.shutdown.trigger();
    proxy.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn origin_form_uses_host_header_and_keeps_client_headers() {
    let (origin, mut heads) = common::start_mock_origin("ok").await;
    let proxy = common::start_proxy(fast_config()).await;

    let request = format!(
        "GET /a HTTP/1.1\r\n\
         Host: 127.0.0.1:{}\r\n\
         User-Agent: curl/8.0\r\n\
         Accept: */*\r\n\
         Connection: keep-alive\r\n\
         \r\n",
        origin.port()
    );
    let response = common::exchange(proxy.addr, request.as_bytes()).await;
    assert!(response.ends_with("ok"), "response: {response}");

    let head = heads.recv().await.unwrap();
    let expected = format!(
        "GET /a HTTP/1.0\r\n\
         Host: 127.0.0.1:{}\r\n\
         User-Agent: curl/8.0\r\n\
         Accept: */*\r\n\
         Connection: close\r\n\
         Proxy-Connection: close\r\n\
         \r\n",
        origin.port()
    );
    assert_eq!(head, expected);

    proxy.shutdown.trigger();
    proxy.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_request_gets_400() {
    let proxy = common::start_proxy(fast_config()).await;

    let response = common::exchange(proxy.addr, b"GARBAGE\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.0 400 Bad Request\r\n"), "response: {response}");
    assert!(response.contains("Connection: close\r\n"));

    proxy.shutdown.trigger();
    proxy.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn request_without_host_gets_400() {
    let proxy = common::start_proxy(fast_config()).await;

    let response = common::exchange(proxy.addr, b"GET /only-a-path HTTP/1.1\r\nAccept: */*\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.0 400 Bad Request\r\n"), "response: {response}");

    proxy.shutdown.trigger();
    proxy.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn unreachable_origin_gets_502() {
    let closed = common::closed_port().await;
    let proxy = common::start_proxy(fast_config()).await;

    let request = format!("GET http://127.0.0.1:{}/ HTTP/1.1\r\n\r\n", closed.port());
    let response = common::exchange(proxy.addr, request.as_bytes()).await;
    assert!(response.starts_with("HTTP/1.0 502 Bad Gateway\r\n"), "response: {response}");

    proxy.shutdown.trigger();
    proxy.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn silent_origin_gets_504() {
    let origin = common::start_silent_origin().await;
    let proxy = common::start_proxy(fast_config()).await;

    let request = format!("GET http://127.0.0.1:{}/ HTTP/1.1\r\n\r\n", origin.port());
    let response = common::exchange(proxy.addr, request.as_bytes()).await;
    assert!(response.starts_with("HTTP/1.0 504 Gateway Timeout\r\n"), "response: {response}");

    proxy.shutdown.trigger();
    proxy.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn incomplete_head_gets_408() {
    let proxy = common::start_proxy(fast_config()).await;

    let response = common::exchange(proxy.addr, b"GET http://127.0.0.1/ HTTP/1.1\r\nAccept: */*\r\n").await;
    assert!(response.starts_with("HTTP/1.0 408 Request Timeout\r\n"), "response: {response}");

    proxy.shutdown.trigger();
    proxy.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn concurrent_clients_are_served_independently() {
    let (origin, mut heads) = common::start_mock_origin("parallel").await;
    let proxy = common::start_proxy(fast_config()).await;

    let mut clients = Vec::new();
    for i in 0..8 {
        let addr = proxy.addr;
        let request = format!("GET http://127.0.0.1:{}/item/{} HTTP/1.1\r\n\r\n", origin.port(), i);
        clients.push(tokio::spawn(async move {
            common::exchange(addr, request.as_bytes()).await
        }));
    }
    for client in clients {
        assert!(client.await.unwrap().ends_with("parallel"));
    }

    let mut paths = Vec::new();
    for _ in 0..8 {
        let head = heads.recv().await.unwrap();
        let line = head.lines().next().unwrap().to_string();
        paths.push(line);
    }
    assert_eq!(paths.len(), 8);
    assert!(paths.iter().all(|line| line.ends_with(" HTTP/1.0")));

    proxy.shutdown.trigger();
    proxy.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_waits_for_open_connection() {
    let mut config = fast_config();
    config.timeouts.client_read_secs = 5;
    let proxy = common::start_proxy(config).await;

    // Held open without a complete head.
    let mut idle_client = TcpStream::connect(proxy.addr).await.unwrap();
    idle_client.write_all(b"GET ").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    proxy.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!proxy.handle.is_finished());

    drop(idle_client);
    let stopped = tokio::time::timeout(Duration::from_secs(3), proxy.handle).await;
    assert!(matches!(stopped, Ok(Ok(Ok(())))));
}
