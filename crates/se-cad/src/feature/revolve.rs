//! Revolved protrusions and helices
//!
//! Both families sweep the active profile around its axis of revolution, so
//! the profile must have been closed with the axis-required flags.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::method::feature_methods;
use super::params::{Echo, FeatureParams, Hand, ensure_plane_index, ensure_sweep_angle};
use super::ProfileUse;
use crate::error::{SessionError, SessionResult, ensure_finite, ensure_positive};

feature_methods! {
    /// Revolve variants
    RevolveMethod for Revolve {
        /// A complete revolution
        Full => "full",
        /// A partial revolution by angle
        Finite => "finite",
        Sync => "sync",
        FiniteSync => "finite_sync",
        ThinWall => "thin_wall",
        ByKeypoint => "by_keypoint",
        Full360 => "full_360",
        ByKeypointSync => "by_keypoint_sync",
    }
}

/// Source of the revolution axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisType {
    /// The construction line marked as axis of revolution
    #[default]
    CenterLine,
    /// An ordinary profile line
    Line,
}

impl AxisType {
    /// Get the wire name of this axis type
    pub fn as_str(&self) -> &'static str {
        match self {
            AxisType::CenterLine => "CenterLine",
            AxisType::Line => "Line",
        }
    }
}

/// End treatment of a full revolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TreatmentType {
    #[default]
    None,
    Draft,
    Crown,
    CrownAndDraft,
}

impl TreatmentType {
    /// Get the wire name of this treatment
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentType::None => "None",
            TreatmentType::Draft => "Draft",
            TreatmentType::Crown => "Crown",
            TreatmentType::CrownAndDraft => "CrownAndDraft",
        }
    }
}

/// Parameters for a revolved protrusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevolveParams {
    /// Revolution angle in degrees
    pub angle: f64,
    /// Finite only
    pub axis_type: AxisType,
    /// Wall thickness in metres (thin-wall only)
    pub wall_thickness: f64,
    /// Full 360 only
    pub treatment_type: TreatmentType,
}

impl Default for RevolveParams {
    fn default() -> Self {
        Self {
            angle: 360.0,
            axis_type: AxisType::default(),
            wall_thickness: 0.0,
            treatment_type: TreatmentType::default(),
        }
    }
}

impl FeatureParams<RevolveMethod> for RevolveParams {
    fn check(&self, method: RevolveMethod) -> SessionResult<()> {
        ensure_finite("angle", self.angle)?;
        ensure_finite("wall_thickness", self.wall_thickness)?;

        match method {
            RevolveMethod::Finite | RevolveMethod::FiniteSync => {
                ensure_sweep_angle("angle", self.angle)?;
            }
            RevolveMethod::ThinWall => {
                ensure_sweep_angle("angle", self.angle)?;
                ensure_positive("wall_thickness", self.wall_thickness)?;
            }
            RevolveMethod::Full
            | RevolveMethod::Full360
            | RevolveMethod::Sync
            | RevolveMethod::ByKeypoint
            | RevolveMethod::ByKeypointSync => {}
        }
        Ok(())
    }

    fn profile_use(&self, _method: RevolveMethod) -> ProfileUse {
        ProfileUse::Active { axis: true }
    }

    fn echo(&self, method: RevolveMethod) -> Map<String, Value> {
        let echo = Echo::new();
        match method {
            RevolveMethod::Full | RevolveMethod::Sync => echo.with("angle", 360.0),
            RevolveMethod::Full360 => echo
                .with("angle", 360.0)
                .with("treatment_type", self.treatment_type.as_str()),
            RevolveMethod::Finite => echo
                .with("angle", self.angle)
                .with("axis_type", self.axis_type.as_str()),
            RevolveMethod::FiniteSync => echo.with("angle", self.angle),
            RevolveMethod::ThinWall => echo
                .with("angle", self.angle)
                .with("wall_thickness", self.wall_thickness),
            RevolveMethod::ByKeypoint | RevolveMethod::ByKeypointSync => echo,
        }
        .into_map()
    }
}

feature_methods! {
    /// Helix variants
    HelixMethod for Helix {
        Finite => "finite",
        Sync => "sync",
        ThinWall => "thin_wall",
        SyncThinWall => "sync_thin_wall",
        FromTo => "from_to",
        FromToThinWall => "from_to_thin_wall",
        FromToSync => "from_to_sync",
        FromToSyncThinWall => "from_to_sync_thin_wall",
    }
}

impl HelixMethod {
    /// Check if the variant is bounded by two reference planes
    pub fn is_from_to(&self) -> bool {
        matches!(
            self,
            HelixMethod::FromTo
                | HelixMethod::FromToThinWall
                | HelixMethod::FromToSync
                | HelixMethod::FromToSyncThinWall
        )
    }

    /// Check if the variant produces a hollow helix
    pub fn is_thin_wall(&self) -> bool {
        matches!(
            self,
            HelixMethod::ThinWall
                | HelixMethod::SyncThinWall
                | HelixMethod::FromToThinWall
                | HelixMethod::FromToSyncThinWall
        )
    }
}

/// Parameters for a helical protrusion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HelixParams {
    /// Axial distance per turn in metres
    pub pitch: f64,
    /// Total axial height in metres
    pub height: f64,
    /// Number of turns; derived from height and pitch when absent
    pub revolutions: Option<f64>,
    pub direction: Hand,
    pub wall_thickness: f64,
    pub from_plane_index: u32,
    pub to_plane_index: u32,
}

impl HelixParams {
    /// Get the number of turns, deriving it from height and pitch if needed
    pub fn turns(&self) -> f64 {
        self.revolutions.unwrap_or(self.height / self.pitch)
    }
}

impl FeatureParams<HelixMethod> for HelixParams {
    fn check(&self, method: HelixMethod) -> SessionResult<()> {
        ensure_finite("pitch", self.pitch)?;
        ensure_finite("height", self.height)?;
        ensure_finite("wall_thickness", self.wall_thickness)?;
        if let Some(revolutions) = self.revolutions {
            ensure_positive("revolutions", revolutions)?;
        }

        ensure_positive("pitch", self.pitch)?;
        if method.is_from_to() {
            ensure_plane_index("from_plane_index", self.from_plane_index)?;
            ensure_plane_index("to_plane_index", self.to_plane_index)?;
        } else {
            ensure_positive("height", self.height)?;
        }
        if method.is_thin_wall() {
            ensure_positive("wall_thickness", self.wall_thickness)?;
        }
        if !self.turns().is_finite() {
            return Err(SessionError::invalid_parameter(
                "revolutions",
                "cannot be derived from height and pitch",
            ));
        }
        Ok(())
    }

    fn profile_use(&self, _method: HelixMethod) -> ProfileUse {
        ProfileUse::Active { axis: true }
    }

    fn echo(&self, method: HelixMethod) -> Map<String, Value> {
        let mut echo = Echo::new()
            .with("pitch", self.pitch)
            .with("direction", self.direction.as_str());
        if method.is_from_to() {
            echo = echo
                .with("from_plane_index", self.from_plane_index)
                .with("to_plane_index", self.to_plane_index);
        } else {
            echo = echo
                .with("height", self.height)
                .with("revolutions", self.turns());
        }
        if method.is_thin_wall() {
            echo = echo.with("wall_thickness", self.wall_thickness);
        }
        echo.into_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_revolve_defaults_to_full_turn() {
        let params = RevolveParams::default();
        assert!(params.check(RevolveMethod::Full).is_ok());
        assert!(params.check(RevolveMethod::Finite).is_ok());
        assert_eq!(params.echo(RevolveMethod::Full)["angle"], Value::from(360.0));
    }

    #[test]
    fn test_revolve_angle_range() {
        let params = RevolveParams {
            angle: 400.0,
            ..Default::default()
        };
        assert!(params.check(RevolveMethod::Finite).is_err());
        assert!(params.check(RevolveMethod::Full).is_ok());
    }

    #[test]
    fn test_revolve_rejects_unknown_treatment() {
        let params: RevolveParams = serde_json::from_value(serde_json::json!({
            "treatment_type": "CrownAndDraft",
            "axis_type": "Line",
        }))
        .unwrap();
        assert_eq!(params.treatment_type, TreatmentType::CrownAndDraft);
        assert_eq!(
            params.echo(RevolveMethod::Full360)["treatment_type"],
            Value::from("CrownAndDraft")
        );
        assert_eq!(params.echo(RevolveMethod::Finite)["axis_type"], Value::from("Line"));

        let unknown = serde_json::from_value::<RevolveParams>(serde_json::json!({
            "treatment_type": "Knurled",
        }));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_revolve_needs_axis() {
        let params = RevolveParams::default();
        for method in RevolveMethod::ALL {
            assert_eq!(params.profile_use(*method), ProfileUse::Active { axis: true });
        }
    }

    #[test]
    fn test_helix_turns_derived() {
        let params = HelixParams {
            pitch: 0.005,
            height: 0.05,
            ..Default::default()
        };
        assert!(params.check(HelixMethod::Finite).is_ok());
        assert_relative_eq!(params.turns(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_helix_rejects_zero_pitch() {
        let params = HelixParams {
            pitch: 0.0,
            height: 0.05,
            ..Default::default()
        };
        assert!(params.check(HelixMethod::Finite).is_err());
    }

    #[test]
    fn test_helix_thin_wall_needs_thickness() {
        let mut params = HelixParams {
            pitch: 0.005,
            height: 0.05,
            ..Default::default()
        };
        assert!(params.check(HelixMethod::ThinWall).is_err());
        params.wall_thickness = 0.001;
        assert!(params.check(HelixMethod::ThinWall).is_ok());
    }
}
