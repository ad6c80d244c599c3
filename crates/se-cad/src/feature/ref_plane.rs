//! Reference planes
//!
//! Construction planes created in the model tree. A new plane takes the next
//! 1-based plane index after the three base planes and earlier user planes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::method::feature_methods;
use super::params::{Direction, Echo, FeatureParams, ensure_plane_index, ensure_ratio};
use super::ProfileUse;
use crate::error::{SessionError, SessionResult, ensure_finite};

feature_methods! {
    /// Reference plane variants
    RefPlaneMethod for RefPlane {
        /// Parallel to a parent plane at a distance
        Offset => "offset",
        /// Rotated from a parent plane
        Angle => "angle",
        /// Through three points
        ThreePoints => "three_points",
        /// Midway between two planes
        Midplane => "midplane",
    }
}

/// Parameters for a reference plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefPlaneParams {
    pub parent_plane_index: u32,
    pub distance: f64,
    pub normal_side: Direction,
    /// Rotation in degrees
    pub angle: f64,
    pub x1: f64,
    pub y1: f64,
    pub z1: f64,
    pub x2: f64,
    pub y2: f64,
    pub z2: f64,
    pub x3: f64,
    pub y3: f64,
    pub z3: f64,
    pub plane1_index: u32,
    pub plane2_index: u32,
}

impl Default for RefPlaneParams {
    fn default() -> Self {
        Self {
            parent_plane_index: 1,
            distance: 0.0,
            normal_side: Direction::Normal,
            angle: 0.0,
            x1: 0.0,
            y1: 0.0,
            z1: 0.0,
            x2: 0.0,
            y2: 0.0,
            z2: 0.0,
            x3: 0.0,
            y3: 0.0,
            z3: 0.0,
            plane1_index: 0,
            plane2_index: 0,
        }
    }
}

impl RefPlaneParams {
    /// Create parameters for a plane offset from a parent plane
    pub fn offset(parent_plane_index: u32, distance: f64) -> Self {
        Self {
            parent_plane_index,
            distance,
            ..Default::default()
        }
    }
}

impl FeatureParams<RefPlaneMethod> for RefPlaneParams {
    fn check(&self, method: RefPlaneMethod) -> SessionResult<()> {
        for (name, value) in [
            ("distance", self.distance),
            ("angle", self.angle),
            ("x1", self.x1),
            ("y1", self.y1),
            ("z1", self.z1),
            ("x2", self.x2),
            ("y2", self.y2),
            ("z2", self.z2),
            ("x3", self.x3),
            ("y3", self.y3),
            ("z3", self.z3),
        ] {
            ensure_finite(name, value)?;
        }

        match method {
            RefPlaneMethod::Offset | RefPlaneMethod::Angle => {
                ensure_plane_index("parent_plane_index", self.parent_plane_index)
            }
            RefPlaneMethod::ThreePoints => Ok(()),
            RefPlaneMethod::Midplane => {
                ensure_plane_index("plane1_index", self.plane1_index)?;
                ensure_plane_index("plane2_index", self.plane2_index)?;
                if self.plane1_index == self.plane2_index {
                    return Err(SessionError::invalid_parameter(
                        "plane2_index",
                        "midplane needs two distinct planes",
                    ));
                }
                Ok(())
            }
        }
    }

    fn profile_use(&self, _method: RefPlaneMethod) -> ProfileUse {
        ProfileUse::None
    }

    fn echo(&self, method: RefPlaneMethod) -> Map<String, Value> {
        let echo = Echo::new();
        match method {
            RefPlaneMethod::Offset => echo
                .with("parent_plane_index", self.parent_plane_index)
                .with("distance", self.distance)
                .with("normal_side", self.normal_side.as_str()),
            RefPlaneMethod::Angle => echo
                .with("parent_plane_index", self.parent_plane_index)
                .with("angle", self.angle)
                .with("normal_side", self.normal_side.as_str()),
            RefPlaneMethod::ThreePoints => echo
                .with_point("point1", self.x1, self.y1, self.z1)
                .with_point("point2", self.x2, self.y2, self.z2)
                .with_point("point3", self.x3, self.y3, self.z3),
            RefPlaneMethod::Midplane => echo
                .with("plane1_index", self.plane1_index)
                .with("plane2_index", self.plane2_index),
        }
        .into_map()
    }
}

feature_methods! {
    /// Variants of a reference plane normal to a curve
    ///
    /// Plain variants take the curve from the active profile. The `_v2`
    /// variants take a body edge instead.
    RefPlaneOnCurveMethod for RefPlaneOnCurve {
        NormalToCurve => "normal_to_curve",
        NormalAtDistance => "normal_at_distance",
        NormalAtArcRatio => "normal_at_arc_ratio",
        NormalAtDistanceAlong => "normal_at_distance_along",
        NormalAtKeypoint => "normal_at_keypoint",
        NormalAtDistanceV2 => "normal_at_distance_v2",
        NormalAtArcRatioV2 => "normal_at_arc_ratio_v2",
        NormalAtDistanceAlongV2 => "normal_at_distance_along_v2",
    }
}

impl RefPlaneOnCurveMethod {
    /// Check if the curve comes from a body edge rather than the active profile
    pub fn uses_edge(&self) -> bool {
        matches!(
            self,
            RefPlaneOnCurveMethod::NormalAtDistanceV2
                | RefPlaneOnCurveMethod::NormalAtArcRatioV2
                | RefPlaneOnCurveMethod::NormalAtDistanceAlongV2
        )
    }
}

/// Parameters for a reference plane normal to a curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefPlaneOnCurveParams {
    pub curve_end: String,
    pub pivot_plane_index: u32,
    pub distance: f64,
    /// Position along the curve as a fraction of its length
    pub ratio: f64,
    pub distance_along: f64,
    pub keypoint_type: String,
    pub curve_edge_index: u32,
    pub orientation_plane_index: u32,
}

impl Default for RefPlaneOnCurveParams {
    fn default() -> Self {
        Self {
            curve_end: "End".into(),
            pivot_plane_index: 2,
            distance: 0.0,
            ratio: 0.0,
            distance_along: 0.0,
            keypoint_type: "End".into(),
            curve_edge_index: 0,
            orientation_plane_index: 0,
        }
    }
}

impl FeatureParams<RefPlaneOnCurveMethod> for RefPlaneOnCurveParams {
    fn check(&self, method: RefPlaneOnCurveMethod) -> SessionResult<()> {
        ensure_finite("distance", self.distance)?;
        ensure_finite("ratio", self.ratio)?;
        ensure_finite("distance_along", self.distance_along)?;

        if method.uses_edge() {
            ensure_plane_index("orientation_plane_index", self.orientation_plane_index)?;
        } else {
            ensure_plane_index("pivot_plane_index", self.pivot_plane_index)?;
        }
        match method {
            RefPlaneOnCurveMethod::NormalAtArcRatio | RefPlaneOnCurveMethod::NormalAtArcRatioV2 => {
                ensure_ratio("ratio", self.ratio)
            }
            _ => Ok(()),
        }
    }

    fn profile_use(&self, method: RefPlaneOnCurveMethod) -> ProfileUse {
        if method.uses_edge() {
            ProfileUse::None
        } else {
            ProfileUse::Active { axis: false }
        }
    }

    fn echo(&self, method: RefPlaneOnCurveMethod) -> Map<String, Value> {
        let echo = if method.uses_edge() {
            Echo::new()
                .with("curve_edge_index", self.curve_edge_index)
                .with("orientation_plane_index", self.orientation_plane_index)
        } else {
            Echo::new().with("pivot_plane_index", self.pivot_plane_index)
        };
        match method {
            RefPlaneOnCurveMethod::NormalToCurve => echo.with("curve_end", self.curve_end.as_str()),
            RefPlaneOnCurveMethod::NormalAtDistance | RefPlaneOnCurveMethod::NormalAtDistanceV2 => {
                echo.with("distance", self.distance)
            }
            RefPlaneOnCurveMethod::NormalAtArcRatio | RefPlaneOnCurveMethod::NormalAtArcRatioV2 => {
                echo.with("ratio", self.ratio)
            }
            RefPlaneOnCurveMethod::NormalAtDistanceAlong
            | RefPlaneOnCurveMethod::NormalAtDistanceAlongV2 => {
                echo.with("distance_along", self.distance_along)
            }
            RefPlaneOnCurveMethod::NormalAtKeypoint => {
                echo.with("keypoint_type", self.keypoint_type.as_str())
            }
        }
        .into_map()
    }
}
