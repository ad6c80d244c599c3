//! Lofts and sweeps
//!
//! Multi-section families. Both draw their profiles from the accumulated
//! list by position instead of the active profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::method::feature_methods;
use super::params::{Echo, FeatureParams};
use super::ProfileUse;
use crate::error::{SessionError, SessionResult, ensure_finite, ensure_positive};

feature_methods! {
    /// Loft variants
    LoftMethod for Loft {
        Solid => "solid",
        ThinWall => "thin_wall",
        /// Loft constrained by guide curves
        WithGuides => "with_guides",
    }
}

/// Parameters for a loft
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoftParams {
    /// Accumulated profile indices to loft through, in order (all when absent)
    pub profile_indices: Option<Vec<usize>>,
    /// Accumulated profile indices used as guide curves
    pub guide_profile_indices: Option<Vec<usize>>,
    pub wall_thickness: f64,
}

impl LoftParams {
    /// Create loft parameters over explicit profile indices
    pub fn with_indices(indices: impl Into<Vec<usize>>) -> Self {
        Self {
            profile_indices: Some(indices.into()),
            ..Default::default()
        }
    }
}

impl FeatureParams<LoftMethod> for LoftParams {
    fn check(&self, method: LoftMethod) -> SessionResult<()> {
        ensure_finite("wall_thickness", self.wall_thickness)?;
        match method {
            LoftMethod::Solid => Ok(()),
            LoftMethod::ThinWall => ensure_positive("wall_thickness", self.wall_thickness),
            LoftMethod::WithGuides => match &self.guide_profile_indices {
                Some(guides) if !guides.is_empty() => Ok(()),
                _ => Err(SessionError::invalid_parameter(
                    "guide_profile_indices",
                    "with_guides needs at least one guide profile",
                )),
            },
        }
    }

    fn profile_use(&self, method: LoftMethod) -> ProfileUse {
        let guides = match method {
            LoftMethod::WithGuides => self.guide_profile_indices.clone(),
            LoftMethod::Solid | LoftMethod::ThinWall => None,
        };
        ProfileUse::Sections {
            indices: self.profile_indices.clone(),
            guides,
        }
    }

    fn echo(&self, method: LoftMethod) -> Map<String, Value> {
        let echo = Echo::new().with_opt("profile_indices", self.profile_indices.clone());
        match method {
            LoftMethod::Solid => echo,
            LoftMethod::ThinWall => echo.with("wall_thickness", self.wall_thickness),
            LoftMethod::WithGuides => {
                echo.with_opt("guide_profile_indices", self.guide_profile_indices.clone())
            }
        }
        .into_map()
    }
}

feature_methods! {
    /// Sweep variants
    SweepMethod for Sweep {
        Solid => "solid",
        ThinWall => "thin_wall",
    }
}

/// Parameters for a sweep
///
/// One accumulated profile is the path; every other accumulated profile is a
/// cross section, in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    /// Accumulated profile used as the sweep path (first when absent)
    pub path_profile_index: Option<usize>,
    pub wall_thickness: f64,
}

impl FeatureParams<SweepMethod> for SweepParams {
    fn check(&self, method: SweepMethod) -> SessionResult<()> {
        ensure_finite("wall_thickness", self.wall_thickness)?;
        match method {
            SweepMethod::Solid => Ok(()),
            SweepMethod::ThinWall => ensure_positive("wall_thickness", self.wall_thickness),
        }
    }

    fn profile_use(&self, _method: SweepMethod) -> ProfileUse {
        ProfileUse::PathAndSections {
            path_index: self.path_profile_index.unwrap_or(0),
        }
    }

    fn echo(&self, method: SweepMethod) -> Map<String, Value> {
        let echo = Echo::new().with("path_profile_index", self.path_profile_index.unwrap_or(0));
        match method {
            SweepMethod::Solid => echo,
            SweepMethod::ThinWall => echo.with("wall_thickness", self.wall_thickness),
        }
        .into_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loft_guides_only_for_with_guides() {
        let params = LoftParams {
            guide_profile_indices: Some(vec![2]),
            ..LoftParams::with_indices([0, 1])
        };
        assert_eq!(
            params.profile_use(LoftMethod::Solid),
            ProfileUse::Sections {
                indices: Some(vec![0, 1]),
                guides: None
            }
        );
        assert_eq!(
            params.profile_use(LoftMethod::WithGuides),
            ProfileUse::Sections {
                indices: Some(vec![0, 1]),
                guides: Some(vec![2])
            }
        );
    }

    #[test]
    fn test_with_guides_requires_guides() {
        let params = LoftParams::default();
        assert!(params.check(LoftMethod::WithGuides).is_err());
        assert!(params.check(LoftMethod::Solid).is_ok());
    }

    #[test]
    fn test_sweep_thin_wall() {
        let params = SweepParams {
            wall_thickness: f64::NAN,
            ..Default::default()
        };
        assert!(params.check(SweepMethod::Solid).is_err());

        let params = SweepParams {
            wall_thickness: 0.001,
            ..Default::default()
        };
        assert!(params.check(SweepMethod::ThinWall).is_ok());
        assert_eq!(
            params.echo(SweepMethod::ThinWall)["wall_thickness"],
            Value::from(0.001)
        );
    }
}
