//! Unix mode bits.

use serde::{Deserialize, Serialize};

use super::{VisibilityConverter, is_known};
use crate::types::{PRIVATE, PUBLIC};

/// Unix-style converter.
///
/// Defaults: public dir 0755, private dir 0700, public file 0644,
/// private file 0600, default visibility "public" for both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixVisibility {
    dir_public: u32,
    dir_private: u32,
    file_public: u32,
    file_private: u32,
    dir_default: String,
    file_default: String,
}

/// Serialized form of [`UnixVisibility`]. Absent or zero fields keep the defaults.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnixVisibilityConfig {
    pub dir_public: Option<u32>,
    pub dir_private: Option<u32>,
    pub file_public: Option<u32>,
    pub file_private: Option<u32>,
    pub dir_default_visibility: Option<String>,
    pub file_default_visibility: Option<String>,
}

impl Default for UnixVisibility {
    fn default() -> Self {
        Self::new()
    }
}

impl UnixVisibility {
    pub fn new() -> Self {
        Self {
            dir_public: 0o755,
            dir_private: 0o700,
            file_public: 0o644,
            file_private: 0o600,
            dir_default: PUBLIC.to_string(),
            file_default: PUBLIC.to_string(),
        }
    }

    pub fn from_config(config: &UnixVisibilityConfig) -> Self {
        let mut v = Self::new();
        let nonzero = |m: Option<u32>| m.filter(|m| *m != 0);
        if let Some(m) = nonzero(config.dir_public) {
            v.set_dir_public(m);
        }
        if let Some(m) = nonzero(config.dir_private) {
            v.set_dir_private(m);
        }
        if let Some(m) = nonzero(config.file_public) {
            v.set_file_public(m);
        }
        if let Some(m) = nonzero(config.file_private) {
            v.set_file_private(m);
        }
        if let Some(label) = &config.dir_default_visibility {
            v.set_dir_default_visibility(label);
        }
        if let Some(label) = &config.file_default_visibility {
            v.set_file_default_visibility(label);
        }
        v
    }

    pub fn set_dir_public(&mut self, mode: u32) {
        self.dir_public = mode;
    }

    pub fn set_dir_private(&mut self, mode: u32) {
        self.dir_private = mode;
    }

    pub fn set_file_public(&mut self, mode: u32) {
        self.file_public = mode;
    }

    pub fn set_file_private(&mut self, mode: u32) {
        self.file_private = mode;
    }

    /// Only "public" and "private" are accepted; anything else is ignored.
    pub fn set_dir_default_visibility(&mut self, visibility: &str) {
        if is_known(visibility) {
            self.dir_default = visibility.to_string();
        }
    }

    /// Only "public" and "private" are accepted; anything else is ignored.
    pub fn set_file_default_visibility(&mut self, visibility: &str) {
        if is_known(visibility) {
            self.file_default = visibility.to_string();
        }
    }

    pub fn dir_default_visibility(&self) -> &str {
        &self.dir_default
    }

    pub fn file_default_visibility(&self) -> &str {
        &self.file_default
    }
}

impl VisibilityConverter for UnixVisibility {
    type Permission = u32;

    fn for_file(&self, visibility: &str) -> u32 {
        let visibility = if is_known(visibility) {
            visibility
        } else {
            self.file_default.as_str()
        };
        if visibility == PUBLIC {
            self.file_public
        } else {
            self.file_private
        }
    }

    fn for_dir(&self, visibility: &str) -> u32 {
        let visibility = if is_known(visibility) {
            visibility
        } else {
            self.dir_default.as_str()
        };
        if visibility == PUBLIC {
            self.dir_public
        } else {
            self.dir_private
        }
    }

    fn inverse_for_file(&self, mode: &u32) -> String {
        if *mode == self.file_public {
            PUBLIC.to_string()
        } else if *mode == self.file_private {
            PRIVATE.to_string()
        } else {
            self.file_default.clone()
        }
    }

    fn inverse_for_dir(&self, mode: &u32) -> String {
        if *mode == self.dir_public {
            PUBLIC.to_string()
        } else if *mode == self.dir_private {
            PRIVATE.to_string()
        } else {
            self.dir_default.clone()
        }
    }

    fn default_for_file(&self) -> u32 {
        self.for_file(&self.file_default)
    }

    fn default_for_dir(&self) -> u32 {
        self.for_dir(&self.dir_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_to_modes() {
        let v = UnixVisibility::new();
        assert_eq!(v.for_file(PUBLIC), 0o644);
        assert_eq!(v.for_file(PRIVATE), 0o600);
        assert_eq!(v.for_dir(PUBLIC), 0o755);
        assert_eq!(v.for_dir(PRIVATE), 0o700);
        assert_eq!(v.for_file("bogus"), 0o644);
    }

    #[test]
    fn inverse_is_exact_match() {
        let v = UnixVisibility::new();
        assert_eq!(v.inverse_for_file(&0o600), PRIVATE);
        assert_eq!(v.inverse_for_dir(&0o755), PUBLIC);
        // 0o640 is close to neither; no nearest-match guessing
        assert_eq!(v.inverse_for_file(&0o640), PUBLIC);
    }

    #[test]
    fn defaults_follow_default_labels() {
        let mut v = UnixVisibility::new();
        v.set_file_default_visibility(PRIVATE);
        v.set_dir_default_visibility("nonsense");
        assert_eq!(v.default_for_file(), 0o600);
        assert_eq!(v.default_for_dir(), 0o755);
        assert_eq!(v.for_file("bogus"), 0o600);
        assert_eq!(v.inverse_for_file(&0o777), PRIVATE);
    }

    #[test]
    fn from_config_keeps_defaults_for_zero() {
        let config: UnixVisibilityConfig = serde_json::from_value(serde_json::json!({
            "file_private": 0o640,
            "dir_public": 0,
            "dir_default_visibility": "private",
        }))
        .unwrap();
        let v = UnixVisibility::from_config(&config);
        assert_eq!(v.for_file(PRIVATE), 0o640);
        assert_eq!(v.for_dir(PUBLIC), 0o755);
        assert_eq!(v.default_for_dir(), 0o700);
    }
}
