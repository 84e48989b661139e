//! Metadata paths, relative to `/computeMetadata/v1/`.

pub(crate) const PROJECT_ID: &str = "project/project-id";
pub(crate) const NUMERIC_PROJECT_ID: &str = "project/numeric-project-id";
pub(crate) const INSTANCE_ID: &str = "instance/id";
pub(crate) const INTERNAL_IP: &str = "instance/network-interfaces/0/ip";
pub(crate) const EXTERNAL_IP: &str = "instance/network-interfaces/0/access-configs/0/external-ip";
pub(crate) const HOSTNAME: &str = "instance/hostname";
pub(crate) const INSTANCE_NAME: &str = "instance/name";
pub(crate) const ZONE: &str = "instance/zone";
pub(crate) const INSTANCE_TAGS: &str = "instance/tags";
pub(crate) const INSTANCE_ATTRIBUTES: &str = "instance/attributes/";
pub(crate) const PROJECT_ATTRIBUTES: &str = "project/attributes/";

/// Alias for the instance's main service account.
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

pub(crate) fn instance_attribute(key: &str) -> String {
    format!("{}{}", INSTANCE_ATTRIBUTES, key)
}

pub(crate) fn project_attribute(key: &str) -> String {
    format!("{}{}", PROJECT_ATTRIBUTES, key)
}

/// `None`, empty or whitespace-only names select the default account.
pub(crate) fn service_account(account: Option<&str>, leaf: &str) -> String {
    let account = account
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_SERVICE_ACCOUNT);
    format!("instance/service-accounts/{}/{}", account, leaf)
}
