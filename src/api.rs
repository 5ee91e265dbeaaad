//! News API Lite access.
//!
//! The widget talks to the network through one seam:
//! - [`NewsSource`]: async trait fetching a response body for a request URL
//! - [`WebzClient`]: the `reqwest`-backed implementation used by the program
//!
//! Tests substitute their own [`NewsSource`] so the render pipeline runs
//! without a network. There is no retry: a failed fetch ends the render.

use crate::error::FetchError;
use reqwest::Client;
use reqwest::header::CACHE_CONTROL;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use url::Url;

/// Endpoint queried when no override is given.
pub const DEFAULT_BASE_URL: &str = "https://api.webz.io/newsApiLite";

/// Sent with every request. Best effort only; the real 24h cache lives
/// server-side.
const CACHE_HINT: &str = "max-stale=86400";

/// Something that can fetch a News API response body.
#[allow(async_fn_in_trait)]
pub trait NewsSource {
    /// GET `url` and return the body of a successful response.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Status`] for a non-success status
    /// - [`FetchError::Transport`] when no response arrived
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Build `base?token=<token>&q=<query>`.
///
/// The query is percent-encoded; the token is inserted verbatim.
pub fn build_request_url(base_url: &str, token: &str, query: &str) -> String {
    format!(
        "{}?token={}&q={}",
        base_url,
        token,
        urlencoding::encode(query)
    )
}

/// Check that `base_url` is an absolute http(s) URL without a query string.
pub fn validate_base_url(base_url: &str) -> Result<String, String> {
    let parsed = Url::parse(base_url).map_err(|e| format!("invalid base URL: {}", e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme: {}", parsed.scheme()));
    }
    if parsed.query().is_some() {
        return Err("base URL must not carry a query string".to_string());
    }
    Ok(base_url.trim_end_matches('?').to_string())
}

/// [`NewsSource`] over HTTP.
#[derive(Debug, Clone)]
pub struct WebzClient {
    client: Client,
}

impl WebzClient {
    /// Create a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Fails when the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("webz_news_widget/", env!("CARGO_PKG_VERSION")))
            .build()
            .inspect_err(|e| warn!(error = %e, "Could not build HTTP client"))?;
        Ok(Self { client })
    }

    /// Wrap an already configured `reqwest` client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl NewsSource for WebzClient {
    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, CACHE_HINT)
            .send()
            .await
            .inspect_err(|e| {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "News request failed")
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "News API returned a non-success status"
            );
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        info!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched news response"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn local_client() -> WebzClient {
        WebzClient::with_client(
            Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
        )
    }

    /// Serve one canned HTTP response on a random local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/newsApiLite", addr)
    }

    #[test]
    fn test_build_request_url() {
        let url = build_request_url(DEFAULT_BASE_URL, "abc-123", "rust & tokio");
        assert_eq!(
            url,
            "https://api.webz.io/newsApiLite?token=abc-123&q=rust%20%26%20tokio"
        );
    }

    #[test]
    fn test_build_request_url_keeps_token_verbatim() {
        let url = build_request_url("http://localhost/x", "a b", "q");
        assert_eq!(url, "http://localhost/x?token=a b&q=q");
    }

    #[test]
    fn test_validate_base_url() {
        assert_eq!(
            validate_base_url(DEFAULT_BASE_URL).unwrap(),
            DEFAULT_BASE_URL
        );
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("ftp://example.com/x").is_err());
        assert!(validate_base_url("https://example.com/x?token=1").is_err());
    }

    #[test]
    fn test_new_client_builds() {
        assert!(WebzClient::new(Duration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let base = serve_once("200 OK", r#"{"posts":[]}"#).await;
        let client = local_client();
        let body = client
            .fetch(&build_request_url(&base, "t", "q"))
            .await
            .unwrap();
        assert_eq!(body, r#"{"posts":[]}"#);
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_status_error() {
        let base = serve_once("404 Not Found", "").await;
        let client = local_client();
        let err = client
            .fetch(&build_request_url(&base, "t", "q"))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(404));
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = local_client();
        let err = client
            .fetch(&format!("http://{}/newsApiLite?token=t&q=q", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
