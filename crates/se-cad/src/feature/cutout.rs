//! Cutouts
//!
//! Material-removing counterparts of the protrusion families. Extruded,
//! revolved and normal cutouts consume the active profile. Lofted and swept
//! cutouts consume accumulated profiles.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::method::feature_methods;
use super::params::{Direction, Echo, FeatureParams, ensure_plane_index, ensure_sweep_angle};
use super::ProfileUse;
use crate::error::{SessionResult, ensure_finite, ensure_positive};

// ============== Extruded and Normal Cutouts ==============

feature_methods! {
    /// Extruded cutout variants
    ExtrudedCutoutMethod for ExtrudedCutout {
        Finite => "finite",
        ThroughAll => "through_all",
        ThroughNext => "through_next",
        FromTo => "from_to",
        FromToV2 => "from_to_v2",
        ByKeypoint => "by_keypoint",
        ThroughNextSingle => "through_next_single",
        MultiBody => "multi_body",
        FromToMultiBody => "from_to_multi_body",
        ThroughAllMultiBody => "through_all_multi_body",
    }
}

feature_methods! {
    /// Normal cutout variants
    NormalCutoutMethod for NormalCutout {
        Finite => "finite",
        ThroughAll => "through_all",
        FromTo => "from_to",
        ThroughNext => "through_next",
        ByKeypoint => "by_keypoint",
    }
}

/// Extent of a straight cutout, shared by extruded and normal cutouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extent {
    Distance,
    Planes,
    Open,
}

impl From<ExtrudedCutoutMethod> for Extent {
    fn from(method: ExtrudedCutoutMethod) -> Self {
        match method {
            ExtrudedCutoutMethod::Finite | ExtrudedCutoutMethod::MultiBody => Extent::Distance,
            ExtrudedCutoutMethod::FromTo
            | ExtrudedCutoutMethod::FromToV2
            | ExtrudedCutoutMethod::FromToMultiBody => Extent::Planes,
            ExtrudedCutoutMethod::ThroughAll
            | ExtrudedCutoutMethod::ThroughNext
            | ExtrudedCutoutMethod::ByKeypoint
            | ExtrudedCutoutMethod::ThroughNextSingle
            | ExtrudedCutoutMethod::ThroughAllMultiBody => Extent::Open,
        }
    }
}

impl From<NormalCutoutMethod> for Extent {
    fn from(method: NormalCutoutMethod) -> Self {
        match method {
            NormalCutoutMethod::Finite => Extent::Distance,
            NormalCutoutMethod::FromTo => Extent::Planes,
            NormalCutoutMethod::ThroughAll
            | NormalCutoutMethod::ThroughNext
            | NormalCutoutMethod::ByKeypoint => Extent::Open,
        }
    }
}

/// Parameters for extruded and normal cutouts
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CutoutParams {
    /// Cut depth in metres
    pub distance: f64,
    pub direction: Direction,
    pub from_plane_index: u32,
    pub to_plane_index: u32,
}

impl CutoutParams {
    fn check_extent(&self, extent: Extent) -> SessionResult<()> {
        ensure_finite("distance", self.distance)?;
        match extent {
            Extent::Distance => ensure_positive("distance", self.distance),
            Extent::Planes => {
                ensure_plane_index("from_plane_index", self.from_plane_index)?;
                ensure_plane_index("to_plane_index", self.to_plane_index)
            }
            Extent::Open => Ok(()),
        }
    }

    fn echo_extent(&self, extent: Extent) -> Map<String, Value> {
        let echo = Echo::new().with("direction", self.direction.as_str());
        match extent {
            Extent::Distance => echo.with("distance", self.distance),
            Extent::Planes => echo
                .with("from_plane_index", self.from_plane_index)
                .with("to_plane_index", self.to_plane_index),
            Extent::Open => echo,
        }
        .into_map()
    }
}

impl FeatureParams<ExtrudedCutoutMethod> for CutoutParams {
    fn check(&self, method: ExtrudedCutoutMethod) -> SessionResult<()> {
        self.check_extent(method.into())
    }

    fn profile_use(&self, _method: ExtrudedCutoutMethod) -> ProfileUse {
        ProfileUse::Active { axis: false }
    }

    fn echo(&self, method: ExtrudedCutoutMethod) -> Map<String, Value> {
        self.echo_extent(method.into())
    }
}

impl FeatureParams<NormalCutoutMethod> for CutoutParams {
    fn check(&self, method: NormalCutoutMethod) -> SessionResult<()> {
        self.check_extent(method.into())
    }

    fn profile_use(&self, _method: NormalCutoutMethod) -> ProfileUse {
        ProfileUse::Active { axis: false }
    }

    fn echo(&self, method: NormalCutoutMethod) -> Map<String, Value> {
        self.echo_extent(method.into())
    }
}

// ============== Revolved Cutouts ==============

feature_methods! {
    /// Revolved cutout variants
    RevolvedCutoutMethod for RevolvedCutout {
        Finite => "finite",
        Sync => "sync",
        ByKeypoint => "by_keypoint",
        MultiBody => "multi_body",
        Full => "full",
        FullSync => "full_sync",
    }
}

/// Parameters for a revolved cutout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevolvedCutoutParams {
    /// Revolution angle in degrees
    pub angle: f64,
}

impl Default for RevolvedCutoutParams {
    fn default() -> Self {
        Self { angle: 360.0 }
    }
}

impl FeatureParams<RevolvedCutoutMethod> for RevolvedCutoutParams {
    fn check(&self, method: RevolvedCutoutMethod) -> SessionResult<()> {
        ensure_finite("angle", self.angle)?;
        match method {
            RevolvedCutoutMethod::Finite
            | RevolvedCutoutMethod::Sync
            | RevolvedCutoutMethod::MultiBody => ensure_sweep_angle("angle", self.angle),
            RevolvedCutoutMethod::ByKeypoint
            | RevolvedCutoutMethod::Full
            | RevolvedCutoutMethod::FullSync => Ok(()),
        }
    }

    fn profile_use(&self, _method: RevolvedCutoutMethod) -> ProfileUse {
        ProfileUse::Active { axis: true }
    }

    fn echo(&self, method: RevolvedCutoutMethod) -> Map<String, Value> {
        match method {
            RevolvedCutoutMethod::Full | RevolvedCutoutMethod::FullSync => {
                Echo::new().with("angle", 360.0)
            }
            RevolvedCutoutMethod::ByKeypoint => Echo::new(),
            RevolvedCutoutMethod::Finite
            | RevolvedCutoutMethod::Sync
            | RevolvedCutoutMethod::MultiBody => Echo::new().with("angle", self.angle),
        }
        .into_map()
    }
}

// ============== Lofted and Swept Cutouts ==============

feature_methods! {
    /// Lofted cutout variants
    LoftedCutoutMethod for LoftedCutout {
        Basic => "basic",
        Full => "full",
    }
}

/// Parameters for a lofted cutout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoftedCutoutParams {
    /// Accumulated profile indices to loft through, in order (all when absent)
    pub profile_indices: Option<Vec<usize>>,
}

impl FeatureParams<LoftedCutoutMethod> for LoftedCutoutParams {
    fn check(&self, _method: LoftedCutoutMethod) -> SessionResult<()> {
        Ok(())
    }

    fn profile_use(&self, _method: LoftedCutoutMethod) -> ProfileUse {
        ProfileUse::Sections {
            indices: self.profile_indices.clone(),
            guides: None,
        }
    }

    fn echo(&self, _method: LoftedCutoutMethod) -> Map<String, Value> {
        Echo::new()
            .with_opt("profile_indices", self.profile_indices.clone())
            .into_map()
    }
}

feature_methods! {
    /// Swept cutout variants
    SweptCutoutMethod for SweptCutout {
        Basic => "basic",
        MultiBody => "multi_body",
    }
}

/// Parameters for a swept cutout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SweptCutoutParams {
    /// Accumulated profile used as the sweep path (first when absent)
    pub path_profile_index: Option<usize>,
}

impl FeatureParams<SweptCutoutMethod> for SweptCutoutParams {
    fn check(&self, _method: SweptCutoutMethod) -> SessionResult<()> {
        Ok(())
    }

    fn profile_use(&self, _method: SweptCutoutMethod) -> ProfileUse {
        ProfileUse::PathAndSections {
            path_index: self.path_profile_index.unwrap_or(0),
        }
    }

    fn echo(&self, _method: SweptCutoutMethod) -> Map<String, Value> {
        Echo::new()
            .with("path_profile_index", self.path_profile_index.unwrap_or(0))
            .into_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_through_all_ignores_distance() {
        let params = CutoutParams::default();
        assert!(params.check(ExtrudedCutoutMethod::ThroughAll).is_ok());
        assert!(params.check(ExtrudedCutoutMethod::Finite).is_err());
        assert!(params.check(NormalCutoutMethod::Finite).is_err());
    }

    #[test]
    fn test_cutout_echo() {
        let params = CutoutParams {
            distance: 0.01,
            direction: Direction::Reverse,
            ..Default::default()
        };
        let echo = FeatureParams::<ExtrudedCutoutMethod>::echo(&params, ExtrudedCutoutMethod::Finite);
        assert_eq!(echo["distance"], Value::from(0.01));
        assert_eq!(echo["direction"], Value::from("Reverse"));
    }

    #[test]
    fn test_revolved_cutout_needs_axis() {
        let params = RevolvedCutoutParams::default();
        assert_eq!(
            params.profile_use(RevolvedCutoutMethod::Finite),
            ProfileUse::Active { axis: true }
        );
    }

    #[test]
    fn test_swept_cutout_path_defaults_to_first() {
        let params = SweptCutoutParams::default();
        assert_eq!(
            params.profile_use(SweptCutoutMethod::Basic),
            ProfileUse::PathAndSections { path_index: 0 }
        );
    }
}
