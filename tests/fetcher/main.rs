//! Integration tests for the streaming HTTP fetcher
//!
//! These run real requests against a local mock server and check the bytes
//! returned, the status handling, and the progress indicators produced.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use media_archiver::app::{ClientConfig, Fetch, Item, ProgressAggregator, ResourceFetcher};
use media_archiver::errors::FetchError;
use wiremock::matchers::{method, path};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_with(progress: Arc<ProgressAggregator>) -> ResourceFetcher {
    ResourceFetcher::new(&ClientConfig::default(), progress).unwrap()
}

async fn serve(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Serve one chunked response with no Content-Length header
async fn serve_chunked_once(chunks: Vec<Vec<u8>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let mut response =
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
        for chunk in chunks {
            response.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
            response.extend_from_slice(&chunk);
            response.extend_from_slice(b"\r\n");
        }
        response.extend_from_slice(b"0\r\n\r\n");

        socket.write_all(&response).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    addr
}

#[tokio::test]
async fn fetch_returns_exact_body_and_tracks_progress() {
    let server = MockServer::start().await;
    let body: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    serve(&server, "/clip", body.clone()).await;

    let progress = Arc::new(ProgressAggregator::hidden());
    let fetcher = fetcher_with(progress.clone());
    let item = Item::new("clip", format!("{}/clip", server.uri()));

    let bytes = fetcher.fetch(&item).await.unwrap();
    assert_eq!(bytes, body);

    let indicators = progress.snapshot();
    assert_eq!(indicators.len(), 1);
    assert_eq!(indicators[0].label, "clip");
    assert_eq!(indicators[0].capacity, body.len() as u64);
    assert_eq!(indicators[0].position, body.len() as u64);
}

#[tokio::test]
async fn each_item_gets_its_own_indicator() {
    let server = MockServer::start().await;
    serve(&server, "/a", vec![1u8; 10]).await;
    serve(&server, "/b", vec![2u8; 20]).await;

    let progress = Arc::new(ProgressAggregator::hidden());
    let fetcher = fetcher_with(progress.clone());

    fetcher
        .fetch(&Item::new("a", format!("{}/a", server.uri())))
        .await
        .unwrap();
    fetcher
        .fetch(&Item::new("b", format!("{}/b", server.uri())))
        .await
        .unwrap();

    let positions: Vec<(String, u64)> = progress
        .snapshot()
        .into_iter()
        .map(|s| (s.label, s.position))
        .collect();
    assert_eq!(
        positions,
        vec![("a".to_string(), 10), ("b".to_string(), 20)]
    );
}

#[tokio::test]
async fn disabled_progress_creates_no_indicators() {
    let server = MockServer::start().await;
    serve(&server, "/quiet", b"quiet".to_vec()).await;

    let progress = Arc::new(ProgressAggregator::disabled());
    let fetcher = fetcher_with(progress.clone());

    let bytes = fetcher
        .fetch(&Item::new("quiet", format!("{}/quiet", server.uri())))
        .await
        .unwrap();
    assert_eq!(bytes, b"quiet");
    assert_eq!(progress.indicator_count(), 0);
}

#[tokio::test]
async fn empty_body_is_an_empty_buffer() {
    let server = MockServer::start().await;
    serve(&server, "/empty", Vec::new()).await;

    let fetcher = fetcher_with(Arc::new(ProgressAggregator::hidden()));
    let bytes = fetcher
        .fetch(&Item::new("empty", format!("{}/empty", server.uri())))
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn error_status_fails_the_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let progress = Arc::new(ProgressAggregator::hidden());
    let fetcher = fetcher_with(progress.clone());
    let item = Item::new("missing", format!("{}/missing", server.uri()));

    match fetcher.fetch(&item).await {
        Err(FetchError::Status { id, status, .. }) => {
            assert_eq!(id, "missing");
            assert_eq!(status, 404);
        }
        other => panic!("Expected status error, got {:?}", other.map(|b| b.len())),
    }
    assert_eq!(progress.indicator_count(), 0);
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = fetcher_with(Arc::new(ProgressAggregator::hidden()));
    let item = Item::new("gone", format!("http://{}/gone", addr));

    let error = fetcher.fetch(&item).await.unwrap_err();
    assert!(matches!(error, FetchError::Transport { .. }));
    assert_eq!(error.item_id(), "gone");
    assert!(error.to_string().contains("try without it"));
}

#[tokio::test]
async fn chunked_body_without_length_is_fetched_without_indicator() {
    let addr = serve_chunked_once(vec![b"hello".to_vec(), b" world".to_vec()]).await;

    let progress = Arc::new(ProgressAggregator::hidden());
    let fetcher = fetcher_with(progress.clone());
    let item = Item::new("stream", format!("http://{}/stream", addr));

    let bytes = fetcher.fetch(&item).await.unwrap();
    assert_eq!(bytes, b"hello world");
    assert_eq!(progress.indicator_count(), 0);
}

#[tokio::test]
async fn slow_response_is_only_cut_off_when_a_timeout_is_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"late".to_vec())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let item = Item::new("slow", format!("{}/slow", server.uri()));

    let uncapped = fetcher_with(Arc::new(ProgressAggregator::hidden()));
    assert_eq!(uncapped.fetch(&item).await.unwrap(), b"late");

    let config = ClientConfig {
        request_timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    };
    let capped = ResourceFetcher::new(&config, Arc::new(ProgressAggregator::hidden())).unwrap();
    let error = capped.fetch(&item).await.unwrap_err();
    assert!(matches!(error, FetchError::Transport { .. }));
}
