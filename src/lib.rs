//! Client for the Google Compute Engine metadata server.
//!
//! A VM on GCE can ask the metadata server at `169.254.169.254` about itself:
//! project, instance identity, network addresses, service accounts,
//! attributes and tags. This crate wraps that API with:
//!
//! - A one-time presence check (`Metadata-Flavor: Google`, one-second timeout)
//! - Per-path caching; each path is fetched at most once per client, even
//!   under concurrent callers
//! - Trimming, line splitting and JSON parsing of the plain-text responses
//! - Permissive (`None` off GCE) or strict (`NotOnGce` off GCE) behaviour
//!
//! # Example
//!
//! ```ignore
//! use gce_metadata::{MetadataClient, MetadataError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MetadataError> {
//!     let metadata = MetadataClient::new()?;
//!
//!     if metadata.is_on_gce().await {
//!         let zone = metadata.zone().await?;
//!         let scopes = metadata.scopes(None).await?;
//!         println!("{zone:?} {scopes:?}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! | Setting | Source | Default |
//! |---------|--------|---------|
//! | Host | `GCE_METADATA_HOST`, read at construction | `169.254.169.254` |
//! | Strict mode | [`MetadataClient::throw_if_not_on_gce`] | off |
//! | Request timeout | [`MetadataClient::with_host_and_timeout`] | 5 s |
//! | Body size limit | [`MetadataClient::with_max_size`] | none |

mod cache;
mod client;
mod error;
mod metadata;
mod parse;
mod paths;
mod presence;
mod snapshot;

pub use client::{
    resolve_host, DEFAULT_HOST, DEFAULT_TIMEOUT, DETECTION_TIMEOUT, HOST_ENV, USER_AGENT,
};
pub use error::MetadataError;
pub use metadata::MetadataClient;
pub use paths::DEFAULT_SERVICE_ACCOUNT;
pub use snapshot::InstanceSnapshot;
