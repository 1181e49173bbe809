//! Profile identity records.
//!
//! A profile is a named identity with its own isolated browser storage
//! partition. The session layer persists records at `profiles.<id>`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-chosen unique key for a profile.
///
/// No format is imposed; the registry treats any non-empty string as valid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProfileId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Display color of a profile, `#RRGGBB` with uppercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileColor(String);

impl ProfileColor {
    /// A fresh color: six independent uniform draws from `0-9A-F`.
    ///
    /// Not guaranteed to differ from any other profile's color.
    pub fn random() -> Self {
        let mut rng = rand::rng();
        let mut color = String::with_capacity(7);
        color.push('#');
        for _ in 0..6 {
            color.push(HEX_DIGITS[rng.random_range(0..HEX_DIGITS.len())] as char);
        }
        Self(color)
    }

    /// Whether `color` matches `^#[0-9A-F]{6}$`.
    pub fn is_valid(color: &str) -> bool {
        color.len() == 7
            && color.starts_with('#')
            && color[1..].bytes().all(|b| HEX_DIGITS.contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A profile record as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique key; never changes once created
    pub id: ProfileId,

    /// Display name
    pub name: String,

    /// Display color, assigned at creation
    #[serde(default = "ProfileColor::random")]
    pub color: ProfileColor,
}

impl Profile {
    /// Create a record with a freshly generated color.
    pub fn new(id: impl Into<ProfileId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: ProfileColor::random(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_color_format() {
        for _ in 0..200 {
            let color = ProfileColor::random();
            assert!(ProfileColor::is_valid(color.as_str()), "bad color {color}");
        }
    }

    #[test]
    fn test_is_valid_rejects_lowercase_and_length() {
        assert!(ProfileColor::is_valid("#00FFAA"));
        assert!(!ProfileColor::is_valid("#00ffaa"));
        assert!(!ProfileColor::is_valid("00FFAA"));
        assert!(!ProfileColor::is_valid("#00FFA"));
        assert!(!ProfileColor::is_valid("#00FFAAB"));
    }

    #[test]
    fn test_profile_json_shape() {
        let profile = Profile {
            id: ProfileId::new("work"),
            name: "Work".to_string(),
            color: ProfileColor("#12AB9F".to_string()),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "work", "name": "Work", "color": "#12AB9F"})
        );
    }

    #[test]
    fn test_missing_color_is_assigned_on_read() {
        let profile: Profile =
            serde_json::from_value(serde_json::json!({"id": "a", "name": "A"})).unwrap();
        assert!(ProfileColor::is_valid(profile.color.as_str()));
    }
}
