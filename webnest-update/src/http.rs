//! HTTP client helper with native-tls support.

use std::time::Duration;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

/// Global timeout for all HTTP operations (30 seconds).
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum response body size for the release manifest (1 MB).
pub const MAX_MANIFEST_SIZE: u64 = 1024 * 1024;

/// Maximum response body size for artifact downloads (200 MB).
pub const MAX_DOWNLOAD_SIZE: u64 = 200 * 1024 * 1024;

const USER_AGENT: &str = concat!("webnest/", env!("CARGO_PKG_VERSION"));

/// Validate that a URL is safe to use for update operations.
///
/// Only HTTPS is accepted; plain HTTP can be intercepted and downgraded.
pub fn validate_update_url(url: &str) -> Result<(), String> {
    let parsed = url::Url::parse(url).map_err(|e| format!("Invalid URL '{}': {}", url, e))?;

    match parsed.scheme() {
        "https" => {}
        scheme => {
            return Err(format!(
                "Insecure URL scheme '{}' rejected; only HTTPS is allowed. URL: {}",
                scheme, url
            ));
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(format!("URL '{}' has no host", url));
    }

    Ok(())
}

/// Create a new HTTP agent configured with native-tls and a global timeout.
pub fn agent() -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(Some(HTTP_TIMEOUT))
        .build()
        .into()
}

/// Fetch a small text document (the release manifest).
pub fn fetch_text(url: &str) -> Result<String, String> {
    validate_update_url(url)?;

    agent()
        .get(url)
        .header("User-Agent", USER_AGENT)
        .header("Accept", "application/json")
        .call()
        .map_err(|e| format!("Failed to fetch '{}': {}", url, e))?
        .into_body()
        .with_config()
        .limit(MAX_MANIFEST_SIZE)
        .read_to_string()
        .map_err(|e| format!("Failed to read response body from '{}': {}", url, e))
}

/// Download a file from a URL and return its bytes.
///
/// The body is limited to [`MAX_DOWNLOAD_SIZE`].
pub fn download_file(url: &str) -> Result<Vec<u8>, String> {
    validate_update_url(url)?;

    agent()
        .get(url)
        .header("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| format!("Failed to download '{}': {}", url, e))?
        .into_body()
        .with_config()
        .limit(MAX_DOWNLOAD_SIZE)
        .read_to_vec()
        .map_err(|e| {
            format!(
                "Failed to read downloaded content from '{}': {}. \
                 The response may have been truncated or the connection dropped.",
                url, e
            )
        })
}
