//! Primitive solids
//!
//! Boxes, cylinders and spheres placed directly by coordinates. They carry
//! their own placement and never consume session profiles.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::method::feature_methods;
use super::params::{Echo, FeatureParams, ensure_plane_index};
use super::ProfileUse;
use crate::error::{SessionError, SessionResult, ensure_finite, ensure_positive};

feature_methods! {
    /// Primitive shapes
    PrimitiveShape for Primitive {
        /// Box spanned by two opposite corners
        BoxTwoPoints => "box_two_points",
        /// Box centred on a point
        BoxCenter => "box_center",
        /// Box from a base edge, a width point and a height
        BoxThreePoints => "box_three_points",
        Cylinder => "cylinder",
        Sphere => "sphere",
    }
}

/// Parameters for a primitive solid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimitiveParams {
    pub x1: f64,
    pub y1: f64,
    pub z1: f64,
    pub x2: f64,
    pub y2: f64,
    pub z2: f64,
    pub x3: f64,
    pub y3: f64,
    pub z3: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
    pub depth: f64,
    /// 1-based plane the primitive is placed on
    pub plane_index: u32,
}

impl Default for PrimitiveParams {
    fn default() -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            z1: 0.0,
            x2: 0.0,
            y2: 0.0,
            z2: 0.0,
            x3: 0.0,
            y3: 0.0,
            z3: 0.0,
            length: 0.0,
            width: 0.0,
            height: 0.0,
            radius: 0.0,
            depth: 0.0,
            plane_index: 1,
        }
    }
}

impl PrimitiveParams {
    fn numbers(&self) -> [(&'static str, f64); 14] {
        [
            ("x1", self.x1),
            ("y1", self.y1),
            ("z1", self.z1),
            ("x2", self.x2),
            ("y2", self.y2),
            ("z2", self.z2),
            ("x3", self.x3),
            ("y3", self.y3),
            ("z3", self.z3),
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
            ("radius", self.radius),
            ("depth", self.depth),
        ]
    }
}

impl FeatureParams<PrimitiveShape> for PrimitiveParams {
    fn check(&self, shape: PrimitiveShape) -> SessionResult<()> {
        for (name, value) in self.numbers() {
            ensure_finite(name, value)?;
        }
        ensure_plane_index("plane_index", self.plane_index)?;

        match shape {
            PrimitiveShape::BoxTwoPoints => {
                if self.x1 == self.x2 || self.y1 == self.y2 || self.z1 == self.z2 {
                    return Err(SessionError::invalid_parameter(
                        "x2",
                        "opposite corners must differ along every axis",
                    ));
                }
            }
            PrimitiveShape::BoxCenter => {
                ensure_positive("length", self.length)?;
                ensure_positive("width", self.width)?;
                ensure_positive("height", self.height)?;
            }
            PrimitiveShape::BoxThreePoints => ensure_positive("height", self.height)?,
            PrimitiveShape::Cylinder => {
                ensure_positive("radius", self.radius)?;
                ensure_positive("height", self.height)?;
            }
            PrimitiveShape::Sphere => ensure_positive("radius", self.radius)?,
        }
        Ok(())
    }

    fn profile_use(&self, _shape: PrimitiveShape) -> ProfileUse {
        ProfileUse::None
    }

    fn echo(&self, shape: PrimitiveShape) -> Map<String, Value> {
        let echo = Echo::new().with("plane_index", self.plane_index);
        match shape {
            PrimitiveShape::BoxTwoPoints => echo
                .with_point("point1", self.x1, self.y1, self.z1)
                .with_point("point2", self.x2, self.y2, self.z2),
            PrimitiveShape::BoxCenter => echo
                .with_point("center", self.x1, self.y1, self.z1)
                .with("length", self.length)
                .with("width", self.width)
                .with("height", self.height),
            PrimitiveShape::BoxThreePoints => echo
                .with_point("point1", self.x1, self.y1, self.z1)
                .with_point("point2", self.x2, self.y2, self.z2)
                .with_point("point3", self.x3, self.y3, self.z3)
                .with("height", self.height),
            PrimitiveShape::Cylinder => echo
                .with_point("center", self.x1, self.y1, self.z1)
                .with("radius", self.radius)
                .with("height", self.height),
            PrimitiveShape::Sphere => echo
                .with_point("center", self.x1, self.y1, self.z1)
                .with("radius", self.radius),
        }
        .into_map()
    }
}

feature_methods! {
    /// Primitive cutout shapes
    PrimitiveCutoutShape for PrimitiveCutout {
        Box => "box",
        Cylinder => "cylinder",
        Sphere => "sphere",
    }
}

/// Parameters for a primitive cutout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimitiveCutoutParams {
    pub x1: f64,
    pub y1: f64,
    pub z1: f64,
    pub x2: f64,
    pub y2: f64,
    pub z2: f64,
    pub radius: f64,
    pub height: f64,
    pub plane_index: u32,
}

impl Default for PrimitiveCutoutParams {
    fn default() -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            z1: 0.0,
            x2: 0.0,
            y2: 0.0,
            z2: 0.0,
            radius: 0.0,
            height: 0.0,
            plane_index: 1,
        }
    }
}

impl FeatureParams<PrimitiveCutoutShape> for PrimitiveCutoutParams {
    fn check(&self, shape: PrimitiveCutoutShape) -> SessionResult<()> {
        for (name, value) in [
            ("x1", self.x1),
            ("y1", self.y1),
            ("z1", self.z1),
            ("x2", self.x2),
            ("y2", self.y2),
            ("z2", self.z2),
            ("radius", self.radius),
            ("height", self.height),
        ] {
            ensure_finite(name, value)?;
        }
        ensure_plane_index("plane_index", self.plane_index)?;

        match shape {
            PrimitiveCutoutShape::Box => Ok(()),
            PrimitiveCutoutShape::Cylinder => {
                ensure_positive("radius", self.radius)?;
                ensure_positive("height", self.height)
            }
            PrimitiveCutoutShape::Sphere => ensure_positive("radius", self.radius),
        }
    }

    fn profile_use(&self, _shape: PrimitiveCutoutShape) -> ProfileUse {
        ProfileUse::None
    }

    fn echo(&self, shape: PrimitiveCutoutShape) -> Map<String, Value> {
        let echo = Echo::new().with("plane_index", self.plane_index);
        match shape {
            PrimitiveCutoutShape::Box => echo
                .with_point("point1", self.x1, self.y1, self.z1)
                .with_point("point2", self.x2, self.y2, self.z2),
            PrimitiveCutoutShape::Cylinder => echo
                .with_point("center", self.x1, self.y1, self.z1)
                .with("radius", self.radius)
                .with("height", self.height),
            PrimitiveCutoutShape::Sphere => echo
                .with_point("center", self.x1, self.y1, self.z1)
                .with("radius", self.radius),
        }
        .into_map()
    }
}
