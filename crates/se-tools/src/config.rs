//! Tool runner configuration

use std::path::Path;

use clap::ValueEnum;
use se_cad::kernel::{CadEngine, MockEngine, NullEngine};
use se_cad::{ConfigError, SessionConfig};
use serde::{Deserialize, Serialize};

/// Engine backing a tool session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-process recording engine (dry run)
    #[default]
    Mock,
    /// No engine; every engine call fails
    Null,
}

impl EngineKind {
    /// Create an engine of this kind
    pub fn create(&self) -> Box<dyn CadEngine> {
        match self {
            EngineKind::Mock => Box::new(MockEngine::new()),
            EngineKind::Null => Box::new(NullEngine),
        }
    }
}

/// Configuration for a tool session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub engine: EngineKind,
    pub session: SessionConfig,
}

impl ToolConfig {
    /// Save to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        ron::from_str(&content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools.ron");

        let mut config = ToolConfig {
            engine: EngineKind::Null,
            ..Default::default()
        };
        config.session.min_loft_profiles = 3;
        config.save(&path).unwrap();

        assert_eq!(ToolConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools.ron");
        std::fs::write(&path, "(session: (consume_profiles: false))").unwrap();

        let config = ToolConfig::load(&path).unwrap();
        assert_eq!(config.engine, EngineKind::Mock);
        assert!(!config.session.consume_profiles);
        assert!(config.session.follow_document);
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools.ron");
        std::fs::write(&path, "(engine: remote)").unwrap();

        assert!(matches!(
            ToolConfig::load(&path),
            Err(ConfigError::Deserialize(_))
        ));
    }

    #[test]
    fn test_engine_kinds() {
        assert!(EngineKind::Mock.create().is_available());
        assert_eq!(EngineKind::Null.create().name(), "null");
    }
}
