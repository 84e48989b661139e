//! GCE presence check.

use reqwest::header::{HeaderMap, USER_AGENT as USER_AGENT_HEADER};
use reqwest::Client;
use tracing::{debug, warn};

use crate::client::{DETECTION_TIMEOUT, METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE, USER_AGENT};

/// Query the metadata server root once.
///
/// Any transport error, timeout or response without `Metadata-Flavor: Google`
/// counts as "not on GCE". Never fails. The one-second timeout is set on the
/// request, overriding whatever the client was built with.
pub(crate) async fn check(client: &Client, url: &str) -> bool {
    let response = client
        .get(url)
        .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)
        .header(USER_AGENT_HEADER, USER_AGENT)
        .timeout(DETECTION_TIMEOUT)
        .send()
        .await;

    match response {
        Ok(response) => {
            let on_gce = has_google_flavor(response.headers());
            debug!(url, status = response.status().as_u16(), on_gce, "presence check answered");
            on_gce
        }
        Err(err) => {
            warn!(url, error = %err, "presence check failed, assuming not on GCE");
            false
        }
    }
}

fn has_google_flavor(headers: &HeaderMap) -> bool {
    headers
        .get_all(METADATA_FLAVOR_HEADER)
        .iter()
        .any(|v| v.as_bytes() == METADATA_FLAVOR_VALUE.as_bytes())
}
