//! Update check gating and release version comparison.
//!
//! Decides whether a check is due given the configured frequency (daily,
//! weekly, monthly, or never) and compares the offered release against the
//! running version.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::Deserialize;
use webnest_config::UpdateCheckFrequency;

/// Information about an available release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateInfo {
    /// The release version (may carry a leading `v`)
    pub version: String,
    /// Download URL of the release artifact
    pub url: String,
    /// Release notes
    #[serde(default)]
    pub notes: Option<String>,
    /// When the release was published
    #[serde(default)]
    pub published_at: Option<String>,
}

impl UpdateInfo {
    /// Version without a leading `v`.
    pub fn display_version(&self) -> &str {
        self.version.strip_prefix('v').unwrap_or(&self.version)
    }
}

/// Parse a release manifest document.
pub fn parse_manifest(body: &str) -> Result<UpdateInfo, String> {
    serde_json::from_str(body).map_err(|e| format!("Failed to parse release manifest: {}", e))
}

/// Whether `offered` is a newer release than `current`.
pub fn is_newer(current: &str, offered: &str) -> Result<bool, String> {
    let current = parse_version(current)?;
    let offered = parse_version(offered)?;
    Ok(offered > current)
}

fn parse_version(version: &str) -> Result<Version, String> {
    let trimmed = version.strip_prefix('v').unwrap_or(version);
    Version::parse(trimmed).map_err(|e| format!("Failed to parse version '{}': {}", version, e))
}

/// Check if it's time to perform an update check.
///
/// A missing or unparsable last-check timestamp means a check is due.
pub fn should_check(frequency: UpdateCheckFrequency, last_check: Option<&str>) -> bool {
    let Some(check_interval_secs) = frequency.as_seconds() else {
        return false;
    };

    let Some(last_check_str) = last_check else {
        return true;
    };

    let Ok(last_check) = DateTime::parse_from_rfc3339(last_check_str) else {
        return true;
    };

    let elapsed = Utc::now().signed_duration_since(last_check.with_timezone(&Utc));
    elapsed.num_seconds() >= check_interval_secs as i64
}

/// Get the current timestamp in RFC 3339 format
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_comparison() {
        assert_eq!(is_newer("0.5.0", "0.6.0"), Ok(true));
        assert_eq!(is_newer("0.6.0", "v0.6.0"), Ok(false));
        assert_eq!(is_newer("1.0.0", "0.9.9"), Ok(false));
        assert!(is_newer("0.5.0", "latest").is_err());
    }

    #[test]
    fn test_parse_manifest() {
        let info = parse_manifest(
            r#"{"version":"v0.5.0","url":"https://releases.example.com/webnest","notes":"Fixes"}"#,
        )
        .unwrap();
        assert_eq!(info.display_version(), "0.5.0");
        assert_eq!(info.notes.as_deref(), Some("Fixes"));
        assert_eq!(info.published_at, None);
        assert!(parse_manifest(r#"{"url":"x"}"#).is_err());
    }

    #[test]
    fn test_should_check_never() {
        assert!(!should_check(UpdateCheckFrequency::Never, None));
    }

    #[test]
    fn test_should_check_no_previous() {
        assert!(should_check(UpdateCheckFrequency::Weekly, None));
        assert!(should_check(UpdateCheckFrequency::Weekly, Some("garbage")));
    }

    #[test]
    fn test_should_check_time_elapsed() {
        let two_days_ago = (Utc::now() - chrono::Duration::days(2)).to_rfc3339();
        assert!(should_check(UpdateCheckFrequency::Daily, Some(&two_days_ago)));

        let one_hour_ago = (Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
        assert!(!should_check(UpdateCheckFrequency::Daily, Some(&one_hour_ago)));
    }

    #[test]
    fn test_current_timestamp_format() {
        let ts = current_timestamp();
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
        assert_eq!(format_timestamp("not a date"), "not a date");
    }
}
