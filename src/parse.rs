//! Post-processing of raw metadata bodies.

use crate::error::MetadataError;

/// Strip leading and trailing whitespace.
pub(crate) fn trimmed(body: &str) -> String {
    body.trim().to_string()
}

/// Split a newline-separated listing into trimmed, non-empty lines.
pub(crate) fn lines(body: &str) -> Vec<String> {
    body.trim()
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a JSON array of strings.
pub(crate) fn json_strings(body: &str) -> Result<Vec<String>, MetadataError> {
    serde_json::from_str(body).map_err(MetadataError::from)
}

/// Last segment of a `projects/<num>/zones/<zone>` resource name.
pub(crate) fn zone_name(body: &str) -> String {
    let zone = body.trim();
    zone.rsplit('/').next().unwrap_or(zone).to_string()
}
