//! HTTP transport for metadata server requests.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::MetadataError;

/// Default timeout for metadata requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for the presence check. Kept short so callers off GCE fail fast.
pub const DETECTION_TIMEOUT: Duration = Duration::from_secs(1);

/// Documented metadata server address.
pub const DEFAULT_HOST: &str = "169.254.169.254";

/// Environment variable overriding the metadata server host.
pub const HOST_ENV: &str = "GCE_METADATA_HOST";

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("gce-metadata/", env!("CARGO_PKG_VERSION"));

/// Required header for GCE metadata requests.
pub(crate) const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";

/// Required header value for GCE metadata requests.
pub(crate) const METADATA_FLAVOR_VALUE: &str = "Google";

/// Metadata API root below the host.
const METADATA_PATH: &str = "computeMetadata/v1";

/// Pick the metadata host from an optional environment value.
///
/// Empty or whitespace-only values fall back to [`DEFAULT_HOST`].
pub fn resolve_host(env_value: Option<String>) -> String {
    env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string())
}

/// Read [`HOST_ENV`] once and resolve the host.
pub fn host_from_env() -> String {
    resolve_host(std::env::var(HOST_ENV).ok())
}

/// Owned HTTP transport bound to one metadata host.
///
/// The reqwest client lives behind a mutex so it can be released with
/// [`Transport::close`] while requests holding a clone finish on their own.
#[derive(Debug)]
pub(crate) struct Transport {
    inner: Mutex<Option<Client>>,
    host: String,
    root_url: String,
    base_url: String,
}

impl Transport {
    /// Build a transport for `host` with a fresh reqwest client.
    pub fn new(host: &str) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(host, Client::builder().build()?))
    }

    /// Build a transport for `host` around a caller-supplied reqwest client.
    ///
    /// Timeouts and the `User-Agent` are set on each request, so the client's
    /// own defaults only matter for what those do not override.
    pub fn with_client(host: &str, client: Client) -> Self {
        let host = host.trim_end_matches('/').to_string();
        Self {
            inner: Mutex::new(Some(client)),
            root_url: format!("http://{}/", host),
            base_url: format!("http://{}/{}/", host, METADATA_PATH),
            host,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// URL used for the presence check, `http://{host}/`.
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// URL for a metadata path such as `instance/id`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Handle to the reqwest client, or `Closed` once released.
    pub fn client(&self) -> Result<Client, MetadataError> {
        self.lock().clone().ok_or(MetadataError::Closed)
    }

    /// Release the reqwest client. Returns `false` if it was already released.
    pub fn close(&self) -> bool {
        self.lock().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Client>> {
        // The guarded value is a plain Option; a poisoned lock still holds a valid one.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Read response body with an optional size limit.
///
/// If `max_size` is `Some`, this will:
/// 1. Check the `Content-Length` header and fail early if it exceeds the limit
/// 2. Read the body chunk by chunk, aborting as soon as the limit is crossed
pub async fn read_body_limited(
    response: Response,
    max_size: Option<usize>,
) -> Result<Vec<u8>, MetadataError> {
    let Some(max_size) = max_size else {
        return Ok(response
            .bytes()
            .await
            .map_err(MetadataError::from_request)?
            .to_vec());
    };

    if let Some(content_length) = response.content_length() {
        if content_length as usize > max_size {
            return Err(MetadataError::TooLarge(content_length as usize, max_size));
        }
    }

    let capacity = response
        .content_length()
        .map(|cl| (cl as usize).min(max_size))
        .unwrap_or(max_size.min(8192));
    let mut body = Vec::with_capacity(capacity);

    let mut stream = response;
    while let Some(chunk) = stream.chunk().await.map_err(MetadataError::from_request)? {
        let total = body.len().saturating_add(chunk.len());
        if total > max_size {
            return Err(MetadataError::TooLarge(total, max_size));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
