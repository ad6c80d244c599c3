//! Extruded protrusions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::method::feature_methods;
use super::params::{Direction, Echo, FeatureParams, ensure_plane_index};
use super::ProfileUse;
use crate::error::{SessionResult, ensure_finite, ensure_positive};

feature_methods! {
    /// Extrusion variants
    ExtrudeMethod for Extrude {
        /// A fixed distance from the profile plane
        Finite => "finite",
        /// Unbounded in the chosen direction
        Infinite => "infinite",
        /// Up to the next face met
        ThroughNext => "through_next",
        /// Between two reference planes
        FromTo => "from_to",
        /// A hollow extrusion with a wall thickness
        ThinWall => "thin_wall",
        /// A fixed distance split across both sides
        Symmetric => "symmetric",
        ThroughNextV2 => "through_next_v2",
        FromToV2 => "from_to_v2",
        /// Up to a keypoint of existing geometry
        ByKeypoint => "by_keypoint",
        FromToSingle => "from_to_single",
        ThroughNextSingle => "through_next_single",
    }
}

/// Parameters for an extruded protrusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrudeParams {
    /// Extrusion distance in metres
    pub distance: f64,
    pub direction: Direction,
    /// Wall thickness in metres (thin-wall only)
    pub wall_thickness: f64,
    pub from_plane_index: u32,
    pub to_plane_index: u32,
}

impl Default for ExtrudeParams {
    fn default() -> Self {
        Self {
            distance: 0.0,
            direction: Direction::Normal,
            wall_thickness: 0.0,
            from_plane_index: 0,
            to_plane_index: 0,
        }
    }
}

impl ExtrudeParams {
    /// Create parameters for a finite extrusion
    pub fn finite(distance: f64) -> Self {
        Self {
            distance,
            ..Default::default()
        }
    }
}

impl FeatureParams<ExtrudeMethod> for ExtrudeParams {
    fn check(&self, method: ExtrudeMethod) -> SessionResult<()> {
        ensure_finite("distance", self.distance)?;
        ensure_finite("wall_thickness", self.wall_thickness)?;

        match method {
            ExtrudeMethod::Finite | ExtrudeMethod::Symmetric => {
                ensure_positive("distance", self.distance)?;
            }
            ExtrudeMethod::ThinWall => {
                ensure_positive("distance", self.distance)?;
                ensure_positive("wall_thickness", self.wall_thickness)?;
            }
            ExtrudeMethod::FromTo | ExtrudeMethod::FromToV2 | ExtrudeMethod::FromToSingle => {
                ensure_plane_index("from_plane_index", self.from_plane_index)?;
                ensure_plane_index("to_plane_index", self.to_plane_index)?;
            }
            ExtrudeMethod::Infinite
            | ExtrudeMethod::ThroughNext
            | ExtrudeMethod::ThroughNextV2
            | ExtrudeMethod::ThroughNextSingle
            | ExtrudeMethod::ByKeypoint => {}
        }
        Ok(())
    }

    fn profile_use(&self, _method: ExtrudeMethod) -> ProfileUse {
        ProfileUse::Active { axis: false }
    }

    fn echo(&self, method: ExtrudeMethod) -> Map<String, Value> {
        let echo = Echo::new();
        match method {
            ExtrudeMethod::Finite => echo
                .with("distance", self.distance)
                .with("direction", self.direction.as_str()),
            ExtrudeMethod::Symmetric => echo.with("distance", self.distance),
            ExtrudeMethod::ThinWall => echo
                .with("distance", self.distance)
                .with("direction", self.direction.as_str())
                .with("wall_thickness", self.wall_thickness),
            ExtrudeMethod::FromTo | ExtrudeMethod::FromToV2 | ExtrudeMethod::FromToSingle => echo
                .with("from_plane_index", self.from_plane_index)
                .with("to_plane_index", self.to_plane_index),
            ExtrudeMethod::Infinite
            | ExtrudeMethod::ThroughNext
            | ExtrudeMethod::ThroughNextV2
            | ExtrudeMethod::ThroughNextSingle
            | ExtrudeMethod::ByKeypoint => echo.with("direction", self.direction.as_str()),
        }
        .into_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_finite_requires_positive_distance() {
        let params = ExtrudeParams::finite(0.0);
        let err = params.check(ExtrudeMethod::Finite).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        // Unused by through_next, so only finiteness applies
        assert!(params.check(ExtrudeMethod::ThroughNext).is_ok());
    }

    #[test]
    fn test_nan_rejected_for_every_variant() {
        let params = ExtrudeParams {
            wall_thickness: f64::NAN,
            ..ExtrudeParams::finite(0.05)
        };
        for method in ExtrudeMethod::ALL {
            assert!(params.check(*method).is_err(), "{method} accepted NaN");
        }
    }

    #[test]
    fn test_from_to_needs_planes() {
        let mut params = ExtrudeParams::default();
        assert!(params.check(ExtrudeMethod::FromTo).is_err());
        params.from_plane_index = 1;
        params.to_plane_index = 4;
        assert!(params.check(ExtrudeMethod::FromTo).is_ok());
    }

    #[test]
    fn test_echo_only_used_members() {
        let params = ExtrudeParams {
            wall_thickness: 0.002,
            ..ExtrudeParams::finite(0.05)
        };
        let echo = params.echo(ExtrudeMethod::Finite);
        assert_eq!(echo["distance"], Value::from(0.05));
        assert!(!echo.contains_key("wall_thickness"));

        let echo = params.echo(ExtrudeMethod::ThinWall);
        assert_eq!(echo["wall_thickness"], Value::from(0.002));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let params: ExtrudeParams =
            serde_json::from_value(serde_json::json!({"method": "finite", "distance": 0.05}))
                .unwrap();
        assert_eq!(params.distance, 0.05);
        assert_eq!(params.direction, Direction::Normal);
    }
}
