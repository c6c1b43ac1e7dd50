//! HTTP client for TorBox upload requests.
//!
//! One logical operation per input kind, all sharing the same contract:
//! POST to the right endpoint with a bearer token, encode the payload
//! (in-memory form for magnet links, streamed multipart for files), and
//! interpret the `{success, detail}` JSON response.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};
use url::Url;

use super::constants::{
    API_VERSION, CONNECT_TIMEOUT_SECS, IDLE_CONNECTION_TIMEOUT_SECS,
    MAX_IDLE_CONNECTIONS_PER_HOST, NZB_PASSWORD, REQUEST_TIMEOUT_SECS,
};
use super::error::UploadError;

/// JSON body returned by both TorBox creation endpoints.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    success: bool,
    #[serde(default)]
    detail: String,
}

/// Upload client shared across all workers.
///
/// Created once and cloned freely; the underlying `reqwest::Client` holds a
/// bounded idle-connection pool reused by every concurrent upload.
#[derive(Clone)]
pub struct UploadClient {
    client: Client,
    api_base: Url,
    api_key: String,
}

impl fmt::Debug for UploadClient {
    // The API key stays out of Debug output (and therefore out of logs).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadClient")
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

impl UploadClient {
    /// Creates a client with default timeouts (30s connect, 5min total).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new(api_base: Url, api_key: impl Into<String>) -> Self {
        Self::with_timeouts(api_base, api_key, CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(
        api_base: Url,
        api_key: impl Into<String>,
        connect_timeout_secs: u64,
        request_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(request_timeout_secs))
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(IDLE_CONNECTION_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            api_base,
            api_key: api_key.into(),
        }
    }

    /// Submits a magnet link as an in-memory multipart form.
    ///
    /// The link is trimmed of surrounding whitespace and sent with the fixed
    /// fields `seed=1` and `allow_zip=true`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError`] for transport failures, non-2xx statuses,
    /// API-reported failures, and undecodable response bodies.
    #[instrument(skip(self, magnet_link))]
    pub async fn create_magnet(&self, magnet_link: &str) -> Result<(), UploadError> {
        let form = Form::new()
            .text("magnet", magnet_link.trim().to_string())
            .text("seed", "1")
            .text("allow_zip", "true");
        self.send_multipart(self.torrents_endpoint(), form).await
    }

    /// Uploads a `.torrent` file as a streamed multipart body.
    ///
    /// The file's bytes are piped into the request without buffering the
    /// whole file; memory use is bounded by the stream's chunk size.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Io`] if the file cannot be opened, or the same
    /// errors as [`create_magnet`](Self::create_magnet) for the request itself.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn create_torrent(&self, path: &Path) -> Result<(), UploadError> {
        let form = Form::new()
            .part("file", file_part(path).await?)
            .text("seed", "1")
            .text("allow_zip", "true");
        self.send_multipart(self.torrents_endpoint(), form).await
    }

    /// Uploads a `.nzb` file as a streamed multipart body.
    ///
    /// The `name` field is the filename stem (`example.nzb` → `example`);
    /// the `password` field is fixed.
    ///
    /// # Errors
    ///
    /// Same as [`create_torrent`](Self::create_torrent).
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn create_usenet(&self, path: &Path) -> Result<(), UploadError> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let form = Form::new()
            .part("file", file_part(path).await?)
            .text("name", name)
            .text("password", NZB_PASSWORD);
        self.send_multipart(self.usenet_endpoint(), form).await
    }

    fn torrents_endpoint(&self) -> String {
        format!(
            "{}/{}/api/torrents/createtorrent",
            self.api_base.as_str().trim_end_matches('/'),
            API_VERSION
        )
    }

    fn usenet_endpoint(&self) -> String {
        format!(
            "{}/{}/api/usenet/createusenetdownload",
            self.api_base.as_str().trim_end_matches('/'),
            API_VERSION
        )
    }

    /// Sends a multipart POST and interprets the response contract.
    async fn send_multipart(&self, url: String, form: Form) -> Result<(), UploadError> {
        debug!(url = %url, "sending upload request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UploadError::timeout(&url)
                } else {
                    UploadError::network(&url, e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(std::string::ToString::to_string);
            return Err(UploadError::http_status_with_retry_after(
                &url,
                status.as_u16(),
                retry_after,
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UploadError::network(&url, e))?;
        // A 2xx body that doesn't decode is a failure, not an implicit success.
        let api: ApiResponse =
            serde_json::from_str(&body).map_err(|e| UploadError::invalid_response(&url, e))?;

        if api.success {
            Ok(())
        } else {
            Err(UploadError::api(api.detail))
        }
    }
}

/// Builds a streamed multipart part from a file on disk.
async fn file_part(path: &Path) -> Result<Part, UploadError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| UploadError::io(path, e))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let body = Body::wrap_stream(ReaderStream::new(file));
    Ok(Part::stream(body).file_name(file_name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> UploadClient {
        UploadClient::new(Url::parse(&server.uri()).unwrap(), "test-key")
    }

    fn success_body() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(r#"{"success": true, "detail": ""}"#)
    }

    #[tokio::test]
    async fn test_create_magnet_sends_trimmed_link_and_fixed_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .and(body_string_contains("magnet:?xt=urn:btih:abc123"))
            .and(body_string_contains("seed"))
            .and(body_string_contains("allow_zip"))
            .respond_with(success_body())
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.create_magnet("  magnet:?xt=urn:btih:abc123\n").await;
        assert!(result.is_ok(), "Expected Ok, got: {result:?}");
    }

    #[tokio::test]
    async fn test_create_magnet_body_does_not_contain_surrounding_whitespace() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .respond_with(success_body())
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.create_magnet("\t magnet:?xt=urn:btih:xyz \n").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body).into_owned();
        assert!(body.contains("magnet:?xt=urn:btih:xyz"));
        assert!(
            !body.contains("magnet:?xt=urn:btih:xyz \n"),
            "magnet value must be trimmed, body: {body}"
        );
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(success_body())
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.create_magnet("magnet:?xt=urn:btih:abc").await.unwrap();
    }

    #[tokio::test]
    async fn test_create_torrent_streams_file_contents() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let torrent_path = temp_dir.path().join("linux.torrent");
        std::fs::write(&torrent_path, b"d8:announce0:e").unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .and(body_string_contains("d8:announce0:e"))
            .and(body_string_contains("linux.torrent"))
            .respond_with(success_body())
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.create_torrent(&torrent_path).await;
        assert!(result.is_ok(), "Expected Ok, got: {result:?}");
    }

    #[tokio::test]
    async fn test_create_usenet_derives_name_from_stem() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let nzb_path = temp_dir.path().join("example.nzb");
        std::fs::write(&nzb_path, b"<nzb/>").unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/api/usenet/createusenetdownload"))
            .and(body_string_contains("name=\"name\"\r\n\r\nexample"))
            .and(body_string_contains("password"))
            .respond_with(success_body())
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.create_usenet(&nzb_path).await;
        assert!(result.is_ok(), "Expected Ok, got: {result:?}");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        // The file is opened before any request is built, so no server and
        // no multi-threaded runtime are needed.
        let client = UploadClient::new(Url::parse("https://api.torbox.app").unwrap(), "test-key");
        let result = tokio_test::block_on(
            client.create_torrent(Path::new("/nonexistent/gone.torrent")),
        );
        assert!(matches!(result, Err(UploadError::Io { .. })));
    }

    #[tokio::test]
    async fn test_non_200_status_is_failure_with_code() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.create_magnet("magnet:?xt=urn:btih:abc").await;

        match result {
            Err(UploadError::HttpStatus { status, .. }) => assert_eq!(status, 503),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_429_captures_retry_after_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "120"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.create_magnet("magnet:?xt=urn:btih:abc").await;

        match result {
            Err(UploadError::HttpStatus {
                status,
                retry_after,
                ..
            }) => {
                assert_eq!(status, 429);
                assert_eq!(retry_after.as_deref(), Some("120"));
            }
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_false_surfaces_detail() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"success": false, "detail": "quota exceeded"}"#),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.create_magnet("magnet:?xt=urn:btih:abc").await;

        match result {
            Err(UploadError::Api { detail }) => assert_eq!(detail, "quota exceeded"),
            other => panic!("Expected Api error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_200_body_is_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.create_magnet("magnet:?xt=urn:btih:abc").await;
        assert!(matches!(result, Err(UploadError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn test_missing_detail_field_defaults_to_empty() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.create_magnet("magnet:?xt=urn:btih:abc").await;
        assert!(result.is_ok(), "Expected Ok, got: {result:?}");
    }

    #[tokio::test]
    async fn test_endpoint_join_tolerates_trailing_slash() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .respond_with(success_body())
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        let client = UploadClient::new(base, "test-key");
        client.create_magnet("magnet:?xt=urn:btih:abc").await.unwrap();
    }

    #[test]
    fn test_debug_output_redacts_api_key() {
        let client = UploadClient::new(
            Url::parse("https://api.torbox.app").unwrap(),
            "super-secret",
        );
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("api.torbox.app"));
    }

    #[tokio::test]
    async fn test_large_file_upload_streams() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let torrent_path = temp_dir.path().join("big.torrent");
        std::fs::write(&torrent_path, vec![b'x'; 1024 * 1024]).unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .respond_with(success_body())
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.create_torrent(&torrent_path).await;
        assert!(result.is_ok(), "Expected Ok, got: {result:?}");

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].body.len() >= 1024 * 1024);
    }
}
