//! Session configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for a [`SketchSession`](crate::SketchSession)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Clear accumulated profiles after a feature consumes them
    pub consume_profiles: bool,
    /// Reset automatically when the engine reports another active document
    ///
    /// When disabled, a document change is reported as an invalid state until
    /// the caller resets the session.
    pub follow_document: bool,
    /// B-spline order used for drawn splines
    pub spline_order: u32,
    /// Minimum number of sections for loft-like features (never below 2)
    pub min_loft_profiles: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            consume_profiles: true,
            follow_document: true,
            spline_order: 3,
            min_loft_profiles: 2,
        }
    }
}

impl SessionConfig {
    /// Minimum section count, clamped to at least two
    pub fn min_sections(&self) -> usize {
        self.min_loft_profiles.max(2)
    }

    /// Save to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = self.to_ron()?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    /// Serialize to a RON string
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Parse from a RON string
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.ron");

        let config = SessionConfig {
            consume_profiles: false,
            spline_order: 4,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = SessionConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = SessionConfig::from_ron("(follow_document: false)").unwrap();
        assert!(!config.follow_document);
        assert!(config.consume_profiles);
        assert_eq!(config.spline_order, 3);
    }

    #[test]
    fn test_min_sections_clamped() {
        let config = SessionConfig {
            min_loft_profiles: 0,
            ..Default::default()
        };
        assert_eq!(config.min_sections(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = SessionConfig::load(dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
