use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ern_validate::{AsyncHttpClient, HttpClientConfig, ValidationError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves one canned response to every connection and counts the requests it saw.
async fn serve(status: &'static str, body: &'static [u8]) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}/avs.xsd", addr), hits)
}

fn quick_config(retry_attempts: u32) -> HttpClientConfig {
    HttpClientConfig {
        timeout_seconds: 5,
        retry_attempts,
        retry_delay_ms: 10,
        max_retry_delay_ms: 50,
        user_agent: "ern-validate-test".to_string(),
    }
}

#[tokio::test]
async fn test_fetch_reports_progress() {
    let body: &'static [u8] = b"<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\"/>";
    let (url, hits) = serve("200 OK", body).await;
    let client = AsyncHttpClient::new(quick_config(2)).unwrap();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&calls);
    let data = client
        .fetch(&url, move |downloaded, total| seen.lock().unwrap().push((downloaded, total)))
        .await
        .unwrap();

    assert_eq!(data, body);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let calls = calls.lock().unwrap();
    assert_eq!(calls[0], (0, Some(body.len() as u64)));
    assert_eq!(calls.last().unwrap().0, body.len() as u64);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let (url, hits) = serve("404 Not Found", b"").await;
    let client = AsyncHttpClient::new(quick_config(3)).unwrap();

    let err = client.fetch(&url, |_, _| {}).await.unwrap_err();

    assert!(
        matches!(err, ValidationError::HttpStatus { status: 404, .. }),
        "got {:?}",
        err
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_server_error_is_retried_until_exhausted() {
    let (url, hits) = serve("503 Service Unavailable", b"").await;
    let client = AsyncHttpClient::new(quick_config(2)).unwrap();

    let err = client.fetch(&url, |_, _| {}).await.unwrap_err();

    assert!(
        matches!(err, ValidationError::HttpStatus { status: 503, .. }),
        "got {:?}",
        err
    );
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_unreachable_host_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = AsyncHttpClient::new(quick_config(1)).unwrap();

    let result = client
        .fetch(&format!("http://{}/avs.xsd", addr), |_, _| {})
        .await;

    assert!(result.is_err());
}

#[test]
fn test_default_config() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout_seconds, 30);
    assert_eq!(config.retry_attempts, 3);
    assert!(config.user_agent.starts_with("ern-validate/"));

    let client = AsyncHttpClient::new(quick_config(0)).unwrap();
    assert_eq!(client.config().user_agent, "ern-validate-test");
}
