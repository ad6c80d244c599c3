//! Rounds and chamfers
//!
//! Edge treatments applied to the existing body. Edges and faces are
//! addressed by index into the engine's topology.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::method::feature_methods;
use super::params::{Echo, FeatureParams};
use super::ProfileUse;
use crate::error::{SessionError, SessionResult, ensure_finite, ensure_positive};

feature_methods! {
    /// Round variants
    RoundMethod for Round {
        /// Every edge of the body
        AllEdges => "all_edges",
        /// Every edge of one face
        OnFace => "on_face",
        /// A radius per edge
        Variable => "variable",
        /// A blend between two faces
        Blend => "blend",
        SurfaceBlend => "surface_blend",
    }
}

/// Parameters for a round
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundParams {
    pub radius: f64,
    pub face_index: Option<u32>,
    /// Per-edge radii (variable only)
    pub radii: Option<Vec<f64>>,
    pub face_index1: u32,
    pub face_index2: u32,
}

impl FeatureParams<RoundMethod> for RoundParams {
    fn check(&self, method: RoundMethod) -> SessionResult<()> {
        ensure_finite("radius", self.radius)?;
        if let Some(radii) = &self.radii {
            for radius in radii {
                ensure_finite("radii", *radius)?;
            }
        }

        match method {
            RoundMethod::AllEdges | RoundMethod::Blend | RoundMethod::SurfaceBlend => {
                ensure_positive("radius", self.radius)
            }
            RoundMethod::OnFace => {
                ensure_positive("radius", self.radius)?;
                if self.face_index.is_none() {
                    return Err(SessionError::invalid_parameter(
                        "face_index",
                        "on_face needs a face index",
                    ));
                }
                Ok(())
            }
            RoundMethod::Variable => match &self.radii {
                Some(radii) if !radii.is_empty() => {
                    radii.iter().try_for_each(|r| ensure_positive("radii", *r))
                }
                _ => Err(SessionError::invalid_parameter(
                    "radii",
                    "variable needs at least one radius",
                )),
            },
        }
    }

    fn profile_use(&self, _method: RoundMethod) -> ProfileUse {
        ProfileUse::None
    }

    fn echo(&self, method: RoundMethod) -> Map<String, Value> {
        let echo = Echo::new();
        match method {
            RoundMethod::AllEdges => echo.with("radius", self.radius),
            RoundMethod::OnFace => echo
                .with("radius", self.radius)
                .with_opt("face_index", self.face_index),
            RoundMethod::Variable => echo.with_opt("radii", self.radii.clone()),
            RoundMethod::Blend | RoundMethod::SurfaceBlend => echo
                .with("radius", self.radius)
                .with("face_index1", self.face_index1)
                .with("face_index2", self.face_index2),
        }
        .into_map()
    }
}

feature_methods! {
    /// Chamfer variants
    ChamferMethod for Chamfer {
        /// Equal setback on every edge of the body
        Equal => "equal",
        OnFace => "on_face",
        /// Two setbacks
        Unequal => "unequal",
        UnequalOnFace => "unequal_on_face",
        /// A setback and an angle
        Angle => "angle",
    }
}

/// Parameters for a chamfer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChamferParams {
    pub distance: f64,
    pub face_index: u32,
    pub distance1: f64,
    pub distance2: f64,
    /// Chamfer angle in degrees
    pub angle: f64,
}

impl FeatureParams<ChamferMethod> for ChamferParams {
    fn check(&self, method: ChamferMethod) -> SessionResult<()> {
        ensure_finite("distance", self.distance)?;
        ensure_finite("distance1", self.distance1)?;
        ensure_finite("distance2", self.distance2)?;
        ensure_finite("angle", self.angle)?;

        match method {
            ChamferMethod::Equal | ChamferMethod::OnFace => {
                ensure_positive("distance", self.distance)
            }
            ChamferMethod::Unequal | ChamferMethod::UnequalOnFace => {
                ensure_positive("distance1", self.distance1)?;
                ensure_positive("distance2", self.distance2)
            }
            ChamferMethod::Angle => {
                ensure_positive("distance", self.distance)?;
                if self.angle > 0.0 && self.angle < 90.0 {
                    Ok(())
                } else {
                    Err(SessionError::invalid_parameter(
                        "angle",
                        format!("must be between 0 and 90 degrees, got {}", self.angle),
                    ))
                }
            }
        }
    }

    fn profile_use(&self, _method: ChamferMethod) -> ProfileUse {
        ProfileUse::None
    }

    fn echo(&self, method: ChamferMethod) -> Map<String, Value> {
        let echo = Echo::new();
        match method {
            ChamferMethod::Equal => echo.with("distance", self.distance),
            ChamferMethod::OnFace => echo
                .with("distance", self.distance)
                .with("face_index", self.face_index),
            ChamferMethod::Unequal => echo
                .with("distance1", self.distance1)
                .with("distance2", self.distance2),
            ChamferMethod::UnequalOnFace => echo
                .with("distance1", self.distance1)
                .with("distance2", self.distance2)
                .with("face_index", self.face_index),
            ChamferMethod::Angle => echo
                .with("distance", self.distance)
                .with("angle", self.angle),
        }
        .into_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_round_radii() {
        let mut params = RoundParams::default();
        assert!(params.check(RoundMethod::Variable).is_err());

        params.radii = Some(vec![0.001, 0.002]);
        assert!(params.check(RoundMethod::Variable).is_ok());

        params.radii = Some(vec![0.001, f64::INFINITY]);
        assert!(params.check(RoundMethod::AllEdges).is_err());
    }

    #[test]
    fn test_on_face_round_needs_face() {
        let mut params = RoundParams {
            radius: 0.002,
            ..Default::default()
        };
        assert!(params.check(RoundMethod::OnFace).is_err());
        params.face_index = Some(3);
        assert!(params.check(RoundMethod::OnFace).is_ok());
    }

    #[test]
    fn test_angle_chamfer_range() {
        let params = ChamferParams {
            distance: 0.001,
            angle: 45.0,
            ..Default::default()
        };
        assert!(params.check(ChamferMethod::Angle).is_ok());

        let params = ChamferParams {
            distance: 0.001,
            angle: 90.0,
            ..Default::default()
        };
        assert!(params.check(ChamferMethod::Angle).is_err());
    }
}
