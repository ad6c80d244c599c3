//! Sheet metal features

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::method::feature_methods;
use super::params::{Direction, Echo, FeatureParams};
use super::ProfileUse;
use crate::error::{SessionResult, ensure_finite, ensure_positive};

// ============== Flange ==============

feature_methods! {
    /// Flange variants
    FlangeMethod for Flange {
        Basic => "basic",
        ByMatchFace => "by_match_face",
        Sync => "sync",
        ByFace => "by_face",
        WithBendCalc => "with_bend_calc",
        SyncWithBendCalc => "sync_with_bend_calc",
        MatchFaceWithBend => "match_face_with_bend",
        ByFaceWithBend => "by_face_with_bend",
    }
}

impl FlangeMethod {
    /// Check if the variant takes a bend deduction
    pub fn has_bend_calc(&self) -> bool {
        matches!(
            self,
            FlangeMethod::WithBendCalc
                | FlangeMethod::SyncWithBendCalc
                | FlangeMethod::MatchFaceWithBend
                | FlangeMethod::ByFaceWithBend
        )
    }

    /// Check if the variant is placed against a reference face
    pub fn uses_ref_face(&self) -> bool {
        matches!(
            self,
            FlangeMethod::ByMatchFace
                | FlangeMethod::ByFace
                | FlangeMethod::MatchFaceWithBend
                | FlangeMethod::ByFaceWithBend
        )
    }
}

/// Parameters for a flange on an existing sheet metal edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlangeParams {
    pub face_index: u32,
    pub edge_index: u32,
    pub flange_length: f64,
    pub side: String,
    pub inside_radius: Option<f64>,
    /// Bend angle in degrees
    pub bend_angle: Option<f64>,
    pub bend_deduction: f64,
    pub ref_face_index: u32,
    pub bend_radius: f64,
}

impl Default for FlangeParams {
    fn default() -> Self {
        Self {
            face_index: 0,
            edge_index: 0,
            flange_length: 0.0,
            side: "Right".into(),
            inside_radius: None,
            bend_angle: None,
            bend_deduction: 0.0,
            ref_face_index: 0,
            bend_radius: 0.001,
        }
    }
}

impl FeatureParams<FlangeMethod> for FlangeParams {
    fn check(&self, method: FlangeMethod) -> SessionResult<()> {
        ensure_finite("flange_length", self.flange_length)?;
        ensure_finite("bend_deduction", self.bend_deduction)?;
        ensure_finite("bend_radius", self.bend_radius)?;
        if let Some(radius) = self.inside_radius {
            ensure_positive("inside_radius", radius)?;
        }
        if let Some(angle) = self.bend_angle {
            ensure_finite("bend_angle", angle)?;
        }

        ensure_positive("flange_length", self.flange_length)?;
        if method.has_bend_calc() {
            ensure_positive("bend_radius", self.bend_radius)?;
        }
        Ok(())
    }

    fn profile_use(&self, _method: FlangeMethod) -> ProfileUse {
        ProfileUse::None
    }

    fn echo(&self, method: FlangeMethod) -> Map<String, Value> {
        let mut echo = Echo::new()
            .with("face_index", self.face_index)
            .with("edge_index", self.edge_index)
            .with("flange_length", self.flange_length)
            .with("side", self.side.as_str())
            .with_opt("inside_radius", self.inside_radius)
            .with_opt("bend_angle", self.bend_angle);
        if method.uses_ref_face() {
            echo = echo.with("ref_face_index", self.ref_face_index);
        }
        if method.has_bend_calc() {
            echo = echo
                .with("bend_radius", self.bend_radius)
                .with("bend_deduction", self.bend_deduction);
        }
        echo.into_map()
    }
}

// ============== Contour Flange ==============

feature_methods! {
    /// Contour flange variants
    ContourFlangeMethod for ContourFlange {
        Ex => "ex",
        Sync => "sync",
        SyncWithBend => "sync_with_bend",
        V3 => "v3",
        SyncEx => "sync_ex",
    }
}

/// Parameters for a contour flange built from the active profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourFlangeParams {
    pub thickness: f64,
    pub bend_radius: f64,
    pub direction: Direction,
    pub face_index: u32,
    pub edge_index: u32,
    pub bend_deduction: f64,
}

impl Default for ContourFlangeParams {
    fn default() -> Self {
        Self {
            thickness: 0.0,
            bend_radius: 0.001,
            direction: Direction::Normal,
            face_index: 0,
            edge_index: 0,
            bend_deduction: 0.0,
        }
    }
}

impl FeatureParams<ContourFlangeMethod> for ContourFlangeParams {
    fn check(&self, _method: ContourFlangeMethod) -> SessionResult<()> {
        ensure_finite("bend_deduction", self.bend_deduction)?;
        ensure_positive("thickness", self.thickness)?;
        ensure_positive("bend_radius", self.bend_radius)
    }

    fn profile_use(&self, _method: ContourFlangeMethod) -> ProfileUse {
        ProfileUse::Active { axis: false }
    }

    fn echo(&self, method: ContourFlangeMethod) -> Map<String, Value> {
        let echo = Echo::new()
            .with("thickness", self.thickness)
            .with("bend_radius", self.bend_radius)
            .with("direction", self.direction.as_str());
        match method {
            ContourFlangeMethod::Ex | ContourFlangeMethod::V3 => echo
                .with("face_index", self.face_index)
                .with("edge_index", self.edge_index),
            ContourFlangeMethod::SyncWithBend => echo.with("bend_deduction", self.bend_deduction),
            ContourFlangeMethod::Sync | ContourFlangeMethod::SyncEx => echo,
        }
        .into_map()
    }
}

// ============== Base Features ==============

feature_methods! {
    /// Sheet metal base feature types
    SheetMetalBaseType for SheetMetalBase {
        Flange => "flange",
        Tab => "tab",
        ContourAdvanced => "contour_advanced",
        TabMultiProfile => "tab_multi_profile",
    }
}

/// Parameters for the first sheet metal body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetMetalBaseParams {
    pub thickness: f64,
    pub width: Option<f64>,
    pub bend_radius: Option<f64>,
    pub relief_type: String,
}

impl Default for SheetMetalBaseParams {
    fn default() -> Self {
        Self {
            thickness: 0.0,
            width: None,
            bend_radius: None,
            relief_type: "Default".into(),
        }
    }
}

impl FeatureParams<SheetMetalBaseType> for SheetMetalBaseParams {
    fn check(&self, _kind: SheetMetalBaseType) -> SessionResult<()> {
        ensure_positive("thickness", self.thickness)?;
        if let Some(width) = self.width {
            ensure_positive("width", width)?;
        }
        if let Some(radius) = self.bend_radius {
            ensure_positive("bend_radius", radius)?;
        }
        Ok(())
    }

    fn profile_use(&self, _kind: SheetMetalBaseType) -> ProfileUse {
        ProfileUse::Active { axis: false }
    }

    fn echo(&self, kind: SheetMetalBaseType) -> Map<String, Value> {
        let echo = Echo::new().with("thickness", self.thickness);
        match kind {
            SheetMetalBaseType::Flange => echo
                .with_opt("width", self.width)
                .with_opt("bend_radius", self.bend_radius),
            SheetMetalBaseType::ContourAdvanced => echo
                .with_opt("bend_radius", self.bend_radius)
                .with("relief_type", self.relief_type.as_str()),
            SheetMetalBaseType::Tab | SheetMetalBaseType::TabMultiProfile => echo,
        }
        .into_map()
    }
}

// ============== Lofted Flange ==============

feature_methods! {
    /// Lofted flange variants
    LoftedFlangeMethod for LoftedFlange {
        Basic => "basic",
        /// Bend deduction or allowance from the bend radius
        Advanced => "advanced",
        Ex => "ex",
    }
}

/// Parameters for a flange lofted between accumulated profiles
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoftedFlangeParams {
    pub thickness: f64,
    pub bend_radius: f64,
}

impl FeatureParams<LoftedFlangeMethod> for LoftedFlangeParams {
    fn check(&self, method: LoftedFlangeMethod) -> SessionResult<()> {
        ensure_finite("bend_radius", self.bend_radius)?;
        ensure_positive("thickness", self.thickness)?;
        match method {
            LoftedFlangeMethod::Advanced => ensure_positive("bend_radius", self.bend_radius),
            LoftedFlangeMethod::Basic | LoftedFlangeMethod::Ex => Ok(()),
        }
    }

    fn profile_use(&self, _method: LoftedFlangeMethod) -> ProfileUse {
        ProfileUse::Sections {
            indices: None,
            guides: None,
        }
    }

    fn echo(&self, method: LoftedFlangeMethod) -> Map<String, Value> {
        let echo = Echo::new().with("thickness", self.thickness);
        match method {
            LoftedFlangeMethod::Advanced => echo.with("bend_radius", self.bend_radius),
            LoftedFlangeMethod::Basic | LoftedFlangeMethod::Ex => echo,
        }
        .into_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flange_requires_length() {
        let mut params = FlangeParams::default();
        assert!(params.check(FlangeMethod::Basic).is_err());
        params.flange_length = 0.02;
        assert!(params.check(FlangeMethod::Basic).is_ok());

        let echo = params.echo(FlangeMethod::ByFaceWithBend);
        assert!(echo.contains_key("ref_face_index"));
        assert!(echo.contains_key("bend_deduction"));
        assert!(!params.echo(FlangeMethod::Basic).contains_key("bend_deduction"));
    }

    #[test]
    fn test_base_discriminator_is_type() {
        let params: SheetMetalBaseParams = serde_json::from_value(serde_json::json!({
            "type": "tab",
            "thickness": 0.001,
        }))
        .unwrap();
        assert!(params.check(SheetMetalBaseType::Tab).is_ok());
        assert_eq!(
            params.profile_use(SheetMetalBaseType::Tab),
            ProfileUse::Active { axis: false }
        );
    }

    #[test]
    fn test_lofted_flange_uses_sections() {
        let params = LoftedFlangeParams {
            thickness: 0.001,
            bend_radius: 0.0,
        };
        assert!(params.check(LoftedFlangeMethod::Basic).is_ok());
        assert!(params.check(LoftedFlangeMethod::Advanced).is_err());
        assert!(matches!(
            params.profile_use(LoftedFlangeMethod::Ex),
            ProfileUse::Sections { .. }
        ));
    }
}
