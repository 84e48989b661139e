//! Best-effort aggregate of the instance's metadata.

use serde::Serialize;
use tracing::warn;

use crate::error::MetadataError;
use crate::metadata::MetadataClient;

/// Everything the accessors expose, with failures flattened to empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceSnapshot {
    pub on_gce: bool,
    pub project_id: String,
    pub numeric_project_id: String,
    pub instance_id: String,
    pub internal_ip: String,
    pub default_sa_email: String,
    pub external_ip: String,
    pub hostname: String,
    pub instance_tags: Vec<String>,
    pub instance_name: String,
    pub zone: String,
    pub instance_attributes: Vec<String>,
    pub project_attributes: Vec<String>,
    pub default_sa_scopes: Vec<String>,
}

impl MetadataClient {
    /// Check presence, then query every field concurrently.
    ///
    /// A field whose accessor fails or returns `None` is left empty; the
    /// failure is logged and does not affect the other fields.
    pub async fn snapshot(&self) -> InstanceSnapshot {
        let on_gce = self.is_on_gce().await;

        let (
            project_id,
            numeric_project_id,
            instance_id,
            internal_ip,
            default_sa_email,
            external_ip,
            hostname,
            instance_tags,
            instance_name,
            zone,
            instance_attributes,
            project_attributes,
            default_sa_scopes,
        ) = tokio::join!(
            self.project_id(),
            self.numeric_project_id(),
            self.instance_id(),
            self.internal_ip(),
            self.email(None),
            self.external_ip(),
            self.hostname(),
            self.instance_tags(),
            self.instance_name(),
            self.zone(),
            self.instance_attributes(),
            self.project_attributes(),
            self.scopes(None),
        );

        InstanceSnapshot {
            on_gce,
            project_id: or_empty("project_id", project_id),
            numeric_project_id: or_empty("numeric_project_id", numeric_project_id),
            instance_id: or_empty("instance_id", instance_id),
            internal_ip: or_empty("internal_ip", internal_ip),
            default_sa_email: or_empty("default_sa_email", default_sa_email),
            external_ip: or_empty("external_ip", external_ip),
            hostname: or_empty("hostname", hostname),
            instance_tags: or_empty("instance_tags", instance_tags),
            instance_name: or_empty("instance_name", instance_name),
            zone: or_empty("zone", zone),
            instance_attributes: or_empty("instance_attributes", instance_attributes),
            project_attributes: or_empty("project_attributes", project_attributes),
            default_sa_scopes: or_empty("default_sa_scopes", default_sa_scopes),
        }
    }
}

fn or_empty<T: Default>(field: &str, result: Result<Option<T>, MetadataError>) -> T {
    match result {
        Ok(value) => value.unwrap_or_default(),
        Err(err) => {
            warn!(field, error = %err, "metadata field unavailable");
            T::default()
        }
    }
}
