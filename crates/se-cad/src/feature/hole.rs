//! Holes
//!
//! A hole builds its own circular profile on the requested plane from `x`,
//! `y` and `diameter`, so it does not consume session profiles.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::method::feature_methods;
use super::params::{Direction, Echo, FeatureParams, ensure_plane_index};
use super::ProfileUse;
use crate::error::{SessionResult, ensure_finite, ensure_positive};

feature_methods! {
    /// Hole variants
    HoleMethod for Hole {
        Finite => "finite",
        ThroughAll => "through_all",
        FromTo => "from_to",
        ThroughNext => "through_next",
        Sync => "sync",
        FiniteEx => "finite_ex",
        FromToEx => "from_to_ex",
        ThroughNextEx => "through_next_ex",
        ThroughAllEx => "through_all_ex",
        SyncEx => "sync_ex",
        MultiBody => "multi_body",
        SyncMultiBody => "sync_multi_body",
    }
}

impl HoleMethod {
    /// Check if the variant cuts to a fixed depth
    pub fn has_depth(&self) -> bool {
        matches!(
            self,
            HoleMethod::Finite
                | HoleMethod::FiniteEx
                | HoleMethod::Sync
                | HoleMethod::SyncEx
                | HoleMethod::MultiBody
                | HoleMethod::SyncMultiBody
        )
    }

    /// Check if the variant is bounded by two reference planes
    pub fn is_from_to(&self) -> bool {
        matches!(self, HoleMethod::FromTo | HoleMethod::FromToEx)
    }
}

/// Parameters for a hole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoleParams {
    /// Centre on the placement plane, in metres
    pub x: f64,
    pub y: f64,
    pub diameter: f64,
    pub depth: f64,
    pub direction: Direction,
    /// 1-based plane the hole profile is drawn on
    pub plane_index: u32,
    pub from_plane_index: u32,
    pub to_plane_index: u32,
}

impl Default for HoleParams {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            diameter: 0.0,
            depth: 0.0,
            direction: Direction::Normal,
            plane_index: 1,
            from_plane_index: 0,
            to_plane_index: 0,
        }
    }
}

impl FeatureParams<HoleMethod> for HoleParams {
    fn check(&self, method: HoleMethod) -> SessionResult<()> {
        ensure_finite("x", self.x)?;
        ensure_finite("y", self.y)?;
        ensure_finite("diameter", self.diameter)?;
        ensure_finite("depth", self.depth)?;

        ensure_positive("diameter", self.diameter)?;
        ensure_plane_index("plane_index", self.plane_index)?;
        if method.has_depth() {
            ensure_positive("depth", self.depth)?;
        }
        if method.is_from_to() {
            ensure_plane_index("from_plane_index", self.from_plane_index)?;
            ensure_plane_index("to_plane_index", self.to_plane_index)?;
        }
        Ok(())
    }

    fn profile_use(&self, _method: HoleMethod) -> ProfileUse {
        ProfileUse::None
    }

    fn echo(&self, method: HoleMethod) -> Map<String, Value> {
        let mut echo = Echo::new()
            .with("x", self.x)
            .with("y", self.y)
            .with("diameter", self.diameter)
            .with("plane_index", self.plane_index)
            .with("direction", self.direction.as_str());
        if method.has_depth() {
            echo = echo.with("depth", self.depth);
        }
        if method.is_from_to() {
            echo = echo
                .with("from_plane_index", self.from_plane_index)
                .with("to_plane_index", self.to_plane_index);
        }
        echo.into_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_nan_diameter_rejected() {
        let params = HoleParams {
            diameter: f64::NAN,
            depth: 0.01,
            ..Default::default()
        };
        let err = params.check(HoleMethod::Finite).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(err.to_string().contains("diameter"));
    }

    #[test]
    fn test_through_all_needs_no_depth() {
        let params = HoleParams {
            diameter: 0.005,
            ..Default::default()
        };
        assert!(params.check(HoleMethod::ThroughAll).is_ok());
        assert!(params.check(HoleMethod::Finite).is_err());
        assert!(!params.echo(HoleMethod::ThroughAll).contains_key("depth"));
    }
}
