//! MetadataClient struct and core implementation.

use std::time::Duration;

use reqwest::header::USER_AGENT as USER_AGENT_HEADER;
use reqwest::{Client, StatusCode};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::cache::PathCache;
use crate::client::{
    host_from_env, read_body_limited, Transport, DEFAULT_TIMEOUT, METADATA_FLAVOR_HEADER,
    METADATA_FLAVOR_VALUE, USER_AGENT,
};
use crate::error::MetadataError;
use crate::{parse, paths, presence};

/// Client for the GCE metadata server.
///
/// Presence on GCE is checked at most once per client, and every metadata
/// path is fetched at most once; later calls are served from memory. All
/// methods take `&self` and may be called concurrently, e.g. through an
/// `Arc<MetadataClient>`.
///
/// When the process is not on GCE, accessors return `Ok(None)` unless the
/// client is strict, in which case they fail with
/// [`MetadataError::NotOnGce`]. A 404 is always [`MetadataError::PathNotFound`].
///
/// # Example
///
/// ```ignore
/// use gce_metadata::{MetadataClient, MetadataError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), MetadataError> {
///     let metadata = MetadataClient::new()?;
///     if let Some(project) = metadata.project_id().await? {
///         println!("running in {project}");
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MetadataClient {
    transport: Transport,
    timeout: Duration,
    throw_if_not_on_gce: bool,
    max_size: Option<usize>,
    on_gce: OnceCell<bool>,
    cache: PathCache,
}

impl MetadataClient {
    /// Permissive client for the host named by `GCE_METADATA_HOST`, or
    /// `169.254.169.254` when unset. The variable is read once, here.
    pub fn new() -> Result<Self, MetadataError> {
        Self::with_host(&host_from_env())
    }

    /// Like [`MetadataClient::new`], but failing with `NotOnGce` off GCE.
    pub fn strict() -> Result<Self, MetadataError> {
        Ok(Self::new()?.throw_if_not_on_gce(true))
    }

    /// Permissive client for an explicit host (`host[:port]`, no scheme).
    pub fn with_host(host: &str) -> Result<Self, MetadataError> {
        Self::with_host_and_timeout(host, DEFAULT_TIMEOUT)
    }

    /// Client for an explicit host with a custom request timeout.
    ///
    /// The presence check keeps its own one-second timeout.
    pub fn with_host_and_timeout(host: &str, timeout: Duration) -> Result<Self, MetadataError> {
        Ok(Self::from_transport(Transport::new(host)?).with_timeout(timeout))
    }

    /// Permissive client for `host` that sends requests through a
    /// caller-configured reqwest client (proxy, pool or TLS settings).
    ///
    /// The client is owned from here on and released by [`MetadataClient::close`]
    /// or drop. Request timeouts are applied per request and override the
    /// client's own: one second for the presence check, [`DEFAULT_TIMEOUT`]
    /// (or [`MetadataClient::with_timeout`]) for metadata fetches.
    pub fn with_client(client: Client, host: &str) -> Self {
        Self::from_transport(Transport::with_client(host, client))
    }

    fn from_transport(transport: Transport) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
            throw_if_not_on_gce: false,
            max_size: None,
            on_gce: OnceCell::new(),
            cache: PathCache::new(),
        }
    }

    /// Choose between returning `None` (default) and failing with
    /// `NotOnGce` when the process is not on GCE.
    pub fn throw_if_not_on_gce(mut self, strict: bool) -> Self {
        self.throw_if_not_on_gce = strict;
        self
    }

    /// Set the timeout for metadata fetches. The presence check keeps its own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum size limit for fetched bodies.
    ///
    /// If a body exceeds this limit, `MetadataError::TooLarge` is returned.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Metadata host this client talks to.
    pub fn host(&self) -> &str {
        self.transport.host()
    }

    pub fn is_strict(&self) -> bool {
        self.throw_if_not_on_gce
    }

    /// Timeout applied to each metadata fetch.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of metadata paths with a cached body.
    pub fn cached_path_count(&self) -> usize {
        self.cache.len()
    }

    /// Release the HTTP transport. Subsequent accessors fail with
    /// `MetadataError::Closed`. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        let released = self.transport.close();
        if released {
            debug!(host = self.host(), "metadata client closed");
        }
        released
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    /// Report whether this process is running on Google Compute Engine.
    ///
    /// The first call queries the server root; the answer is kept for the
    /// lifetime of the client and concurrent first callers share one request.
    /// Never fails: unreachable servers and timeouts mean `false`. A closed
    /// client that never checked answers `false` without I/O.
    pub async fn is_on_gce(&self) -> bool {
        if let Some(&on_gce) = self.on_gce.get() {
            return on_gce;
        }
        let Ok(client) = self.transport.client() else {
            return false;
        };

        *self
            .on_gce
            .get_or_init(|| async {
                let on_gce = presence::check(&client, self.transport.root_url()).await;
                debug!(host = self.host(), on_gce, "resolved GCE presence");
                on_gce
            })
            .await
    }

    /// Fetch the raw body for a metadata `path` such as `instance/id`.
    ///
    /// Returns the cached body when present. Otherwise checks presence and
    /// fetches once; concurrent callers for the same path share the request.
    /// Failed fetches are not cached.
    ///
    /// # Errors
    ///
    /// - `NotOnGce` when off GCE and the client is strict
    /// - `PathNotFound` on a 404, regardless of strictness
    /// - `Http`, `Timeout`, `Request`, `Utf8`, `TooLarge` for transport failures
    /// - `Closed` after [`MetadataClient::close`]
    pub async fn get_cached_string(&self, path: &str) -> Result<Option<String>, MetadataError> {
        if self.transport.is_closed() {
            return Err(MetadataError::Closed);
        }
        if let Some(body) = self.cache.get(path) {
            debug!(path, "metadata cache hit");
            return Ok(Some(body));
        }

        if !self.is_on_gce().await {
            if self.throw_if_not_on_gce {
                return Err(MetadataError::NotOnGce);
            }
            return Ok(None);
        }

        self.cache
            .get_or_fetch(path, || self.fetch(path))
            .await
            .map(Some)
    }

    async fn fetch(&self, path: &str) -> Result<String, MetadataError> {
        let client = self.transport.client()?;
        let url = self.transport.url_for(path);
        debug!(%url, "fetching metadata");

        let response = client
            .get(&url)
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)
            .header(USER_AGENT_HEADER, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(MetadataError::from_request)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MetadataError::PathNotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(MetadataError::Http(status.as_u16()));
        }

        let body = read_body_limited(response, self.max_size).await?;
        String::from_utf8(body).map_err(|_| MetadataError::Utf8)
    }

    async fn get_trimmed(&self, path: &str) -> Result<Option<String>, MetadataError> {
        Ok(self.get_cached_string(path).await?.map(|s| parse::trimmed(&s)))
    }

    async fn get_lines(&self, path: &str) -> Result<Option<Vec<String>>, MetadataError> {
        Ok(self.get_cached_string(path).await?.map(|s| parse::lines(&s)))
    }

    /// The project ID string.
    pub async fn project_id(&self) -> Result<Option<String>, MetadataError> {
        self.get_cached_string(paths::PROJECT_ID).await
    }

    /// The numeric project ID.
    pub async fn numeric_project_id(&self) -> Result<Option<String>, MetadataError> {
        self.get_cached_string(paths::NUMERIC_PROJECT_ID).await
    }

    /// The VM's numeric instance ID.
    pub async fn instance_id(&self) -> Result<Option<String>, MetadataError> {
        self.get_cached_string(paths::INSTANCE_ID).await
    }

    /// Primary internal IP address.
    pub async fn internal_ip(&self) -> Result<Option<String>, MetadataError> {
        self.get_trimmed(paths::INTERNAL_IP).await
    }

    /// Primary external (public) IP address.
    pub async fn external_ip(&self) -> Result<Option<String>, MetadataError> {
        self.get_trimmed(paths::EXTERNAL_IP).await
    }

    /// Hostname, of the form `{instance}.c.{project}.internal`.
    pub async fn hostname(&self) -> Result<Option<String>, MetadataError> {
        self.get_trimmed(paths::HOSTNAME).await
    }

    pub async fn instance_name(&self) -> Result<Option<String>, MetadataError> {
        self.get_trimmed(paths::INSTANCE_NAME).await
    }

    /// Zone name such as `us-central1-b`.
    pub async fn zone(&self) -> Result<Option<String>, MetadataError> {
        Ok(self
            .get_cached_string(paths::ZONE)
            .await?
            .map(|s| parse::zone_name(&s)))
    }

    /// User-defined instance tags.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::Json` if the body is not a JSON string array.
    pub async fn instance_tags(&self) -> Result<Option<Vec<String>>, MetadataError> {
        self.get_cached_string(paths::INSTANCE_TAGS)
            .await?
            .map(|s| parse::json_strings(&s))
            .transpose()
    }

    /// Names of the instance's user-defined attributes.
    pub async fn instance_attributes(&self) -> Result<Option<Vec<String>>, MetadataError> {
        self.get_lines(paths::INSTANCE_ATTRIBUTES).await
    }

    /// Names of the project-wide user-defined attributes.
    pub async fn project_attributes(&self) -> Result<Option<Vec<String>>, MetadataError> {
        self.get_lines(paths::PROJECT_ATTRIBUTES).await
    }

    /// Value of the instance attribute `key`.
    pub async fn instance_attribute_value(
        &self,
        key: &str,
    ) -> Result<Option<String>, MetadataError> {
        self.get_trimmed(&paths::instance_attribute(key)).await
    }

    /// Value of the project attribute `key`.
    pub async fn project_attribute_value(
        &self,
        key: &str,
    ) -> Result<Option<String>, MetadataError> {
        self.get_trimmed(&paths::project_attribute(key)).await
    }

    /// Email of a service account. `None` or a blank name selects `default`.
    pub async fn email(&self, account: Option<&str>) -> Result<Option<String>, MetadataError> {
        self.get_trimmed(&paths::service_account(account, "email"))
            .await
    }

    /// OAuth scopes of a service account. `None` or a blank name selects `default`.
    pub async fn scopes(
        &self,
        account: Option<&str>,
    ) -> Result<Option<Vec<String>>, MetadataError> {
        self.get_lines(&paths::service_account(account, "scopes"))
            .await
    }
}
