//! Feature Dispatch
//!
//! Feature families, their typed requests and the dispatcher that turns a
//! request plus session profiles into exactly one engine call.
//!
//! A request is a (family, method, parameters) triple. The method is a
//! family-specific enum parsed once from its discriminator string, so every
//! later decision is an exhaustive match.

mod cutout;
pub mod dispatch;
mod extrude;
mod hole;
mod loft_sweep;
mod method;
mod params;
mod primitive;
mod record;
mod ref_plane;
mod revolve;
mod round_chamfer;
mod sheet_metal;

pub use cutout::{
    CutoutParams, ExtrudedCutoutMethod, LoftedCutoutMethod, LoftedCutoutParams,
    NormalCutoutMethod, RevolvedCutoutMethod, RevolvedCutoutParams, SweptCutoutMethod,
    SweptCutoutParams,
};
pub use dispatch::{dispatch, dispatch_args};
pub use extrude::{ExtrudeMethod, ExtrudeParams};
pub use hole::{HoleMethod, HoleParams};
pub use loft_sweep::{LoftMethod, LoftParams, SweepMethod, SweepParams};
pub use params::{Direction, FeatureParams, Hand};
pub use primitive::{PrimitiveCutoutParams, PrimitiveCutoutShape, PrimitiveParams, PrimitiveShape};
pub use record::{FeatureCreated, error_record};
pub use ref_plane::{RefPlaneMethod, RefPlaneOnCurveMethod, RefPlaneOnCurveParams, RefPlaneParams};
pub use revolve::{
    AxisType, HelixMethod, HelixParams, RevolveMethod, RevolveParams, TreatmentType,
};
pub use round_chamfer::{ChamferMethod, ChamferParams, RoundMethod, RoundParams};
pub use sheet_metal::{
    ContourFlangeMethod, ContourFlangeParams, FlangeMethod, FlangeParams, LoftedFlangeMethod,
    LoftedFlangeParams, SheetMetalBaseParams, SheetMetalBaseType,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SessionError, SessionResult};
use crate::kernel::EngineProfileId;

/// Session profiles a feature variant consumes
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileUse {
    /// Self-placed or built on existing geometry
    None,
    /// The active closed profile
    Active {
        /// The profile must have been closed for revolution
        axis: bool,
    },
    /// Accumulated profiles as ordered sections
    Sections {
        /// Positions to use (all non-guide profiles when absent)
        indices: Option<Vec<usize>>,
        guides: Option<Vec<usize>>,
    },
    /// One accumulated profile as the path, the rest as sections
    PathAndSections { path_index: usize },
}

impl ProfileUse {
    /// Check if the variant reads accumulated profiles
    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            ProfileUse::Sections { .. } | ProfileUse::PathAndSections { .. }
        )
    }
}

/// Engine profiles resolved for one feature call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureInputs {
    /// Section profiles in order
    pub profiles: Vec<EngineProfileId>,
    pub guides: Vec<EngineProfileId>,
    /// Sweep path
    pub path: Option<EngineProfileId>,
}

impl FeatureInputs {
    /// Create inputs for a single-profile feature
    pub fn single(profile: EngineProfileId) -> Self {
        Self {
            profiles: vec![profile],
            ..Default::default()
        }
    }

    /// Iterate over every referenced profile
    pub fn all_profiles(&self) -> impl Iterator<Item = EngineProfileId> + '_ {
        self.path
            .iter()
            .chain(self.profiles.iter())
            .chain(self.guides.iter())
            .copied()
    }

    /// Count every referenced profile
    pub fn count(&self) -> usize {
        self.profiles.len() + self.guides.len() + usize::from(self.path.is_some())
    }
}

/// Declare the feature families and their typed requests
macro_rules! feature_families {
    (
        $(
            $(#[$meta:meta])*
            $family:ident($method:ident, $params:ident) => $name:literal, $display:literal, $key:literal;
        )+
    ) => {
        /// A family of features sharing one tool and one parameter set
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum FeatureFamily {
            $( $(#[$meta])* $family, )+
        }

        impl FeatureFamily {
            /// Every family in tool order
            pub const ALL: &'static [FeatureFamily] = &[$(FeatureFamily::$family),+];

            /// Get the wire name of this family
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(FeatureFamily::$family => $name,)+
                }
            }

            /// Get the name used in messages
            pub fn display_name(&self) -> &'static str {
                match self {
                    $(FeatureFamily::$family => $display,)+
                }
            }

            /// Get the argument key that selects the variant
            pub fn discriminator(&self) -> &'static str {
                match self {
                    $(FeatureFamily::$family => $key,)+
                }
            }

            /// Get the discriminator strings of every variant
            pub fn methods(&self) -> Vec<&'static str> {
                match self {
                    $(FeatureFamily::$family => $method::ALL.iter().map(|m| m.as_str()).collect(),)+
                }
            }

            /// Parse a wire name
            pub fn parse(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(FeatureFamily::$family),)+
                    _ => None,
                }
            }
        }

        /// A typed feature request
        #[derive(Debug, Clone, PartialEq)]
        pub enum FeatureRequest {
            $( $family { method: $method, params: $params }, )+
        }

        impl FeatureRequest {
            /// Get the family of this request
            pub fn family(&self) -> FeatureFamily {
                match self {
                    $(FeatureRequest::$family { .. } => FeatureFamily::$family,)+
                }
            }

            /// Get the discriminator string of the selected variant
            pub fn method_name(&self) -> &'static str {
                match self {
                    $(FeatureRequest::$family { method, .. } => method.as_str(),)+
                }
            }

            /// Check numeric parameters for the selected variant
            pub fn check(&self) -> SessionResult<()> {
                match self {
                    $(FeatureRequest::$family { method, params } => {
                        <$params as FeatureParams<$method>>::check(params, *method)
                    })+
                }
            }

            /// Get the session profiles the selected variant consumes
            pub fn profile_use(&self) -> ProfileUse {
                match self {
                    $(FeatureRequest::$family { method, params } => {
                        <$params as FeatureParams<$method>>::profile_use(params, *method)
                    })+
                }
            }

            /// Get the resolved parameters for the creation record
            pub fn echo(&self) -> Map<String, Value> {
                match self {
                    $(FeatureRequest::$family { method, params } => {
                        <$params as FeatureParams<$method>>::echo(params, *method)
                    })+
                }
            }

            /// Build a request from loosely typed tool arguments
            ///
            /// The discriminator is parsed first, so an unknown method is
            /// reported before any parameter error. A missing discriminator
            /// selects the family default. Unused members are ignored.
            pub fn from_args(family: FeatureFamily, args: &Value) -> SessionResult<Self> {
                let args = match args {
                    Value::Null => Value::Object(Map::new()),
                    Value::Object(_) => args.clone(),
                    other => {
                        return Err(SessionError::invalid_parameter(
                            "args",
                            format!("expected an object, got {other}"),
                        ));
                    }
                };
                let key = family.discriminator();
                let method = match args.get(key) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(method)) => Some(method.as_str()),
                    Some(other) => {
                        return Err(SessionError::invalid_parameter(
                            key,
                            format!("expected a string, got {other}"),
                        ));
                    }
                };

                match family {
                    $(FeatureFamily::$family => {
                        let method = match method {
                            Some(method) => $method::parse(method)?,
                            None => $method::default(),
                        };
                        let params: $params = serde_json::from_value(args.clone())
                            .map_err(|e| SessionError::invalid_parameter("args", e.to_string()))?;
                        Ok(FeatureRequest::$family { method, params })
                    })+
                }
            }
        }
    };
}

feature_families! {
    Extrude(ExtrudeMethod, ExtrudeParams) => "extrude", "Extrude", "method";
    Revolve(RevolveMethod, RevolveParams) => "revolve", "Revolve", "method";
    ExtrudedCutout(ExtrudedCutoutMethod, CutoutParams) => "extruded_cutout", "Extruded cutout", "method";
    RevolvedCutout(RevolvedCutoutMethod, RevolvedCutoutParams) => "revolved_cutout", "Revolved cutout", "method";
    NormalCutout(NormalCutoutMethod, CutoutParams) => "normal_cutout", "Normal cutout", "method";
    LoftedCutout(LoftedCutoutMethod, LoftedCutoutParams) => "lofted_cutout", "Lofted cutout", "method";
    SweptCutout(SweptCutoutMethod, SweptCutoutParams) => "swept_cutout", "Swept cutout", "method";
    Loft(LoftMethod, LoftParams) => "loft", "Loft", "method";
    Sweep(SweepMethod, SweepParams) => "sweep", "Sweep", "method";
    Helix(HelixMethod, HelixParams) => "helix", "Helix", "method";
    /// Self-placed solid primitives
    Primitive(PrimitiveShape, PrimitiveParams) => "primitive", "Primitive", "shape";
    PrimitiveCutout(PrimitiveCutoutShape, PrimitiveCutoutParams) => "primitive_cutout", "Primitive cutout", "shape";
    Hole(HoleMethod, HoleParams) => "hole", "Hole", "method";
    Round(RoundMethod, RoundParams) => "round", "Round", "method";
    Chamfer(ChamferMethod, ChamferParams) => "chamfer", "Chamfer", "method";
    RefPlane(RefPlaneMethod, RefPlaneParams) => "ref_plane", "Reference plane", "method";
    /// Reference planes normal to a curve
    RefPlaneOnCurve(RefPlaneOnCurveMethod, RefPlaneOnCurveParams) => "ref_plane_on_curve", "Reference plane on curve", "method";
    Flange(FlangeMethod, FlangeParams) => "flange", "Flange", "method";
    ContourFlange(ContourFlangeMethod, ContourFlangeParams) => "contour_flange", "Contour flange", "method";
    SheetMetalBase(SheetMetalBaseType, SheetMetalBaseParams) => "sheet_metal_base", "Sheet metal base", "type";
    LoftedFlange(LoftedFlangeMethod, LoftedFlangeParams) => "lofted_flange", "Lofted flange", "method";
}

impl FeatureFamily {
    /// Check if the family revolves its profile about an axis
    pub fn requires_axis(&self) -> bool {
        matches!(
            self,
            FeatureFamily::Revolve | FeatureFamily::RevolvedCutout | FeatureFamily::Helix
        )
    }

    /// Check if the family modifies an existing body
    pub fn requires_body(&self) -> bool {
        matches!(
            self,
            FeatureFamily::ExtrudedCutout
                | FeatureFamily::RevolvedCutout
                | FeatureFamily::NormalCutout
                | FeatureFamily::LoftedCutout
                | FeatureFamily::SweptCutout
                | FeatureFamily::PrimitiveCutout
                | FeatureFamily::Hole
                | FeatureFamily::Round
                | FeatureFamily::Chamfer
                | FeatureFamily::Flange
        )
    }

    /// Check if the family can create a base body
    pub fn creates_body(&self) -> bool {
        matches!(
            self,
            FeatureFamily::Extrude
                | FeatureFamily::Revolve
                | FeatureFamily::Loft
                | FeatureFamily::Sweep
                | FeatureFamily::Helix
                | FeatureFamily::Primitive
                | FeatureFamily::ContourFlange
                | FeatureFamily::SheetMetalBase
                | FeatureFamily::LoftedFlange
        )
    }

    /// Check if a successful feature clears the profiles it read
    ///
    /// Reference planes on a curve only borrow the sketch curve.
    pub fn consumes_profiles(&self) -> bool {
        !matches!(self, FeatureFamily::RefPlaneOnCurve)
    }
}

impl std::fmt::Display for FeatureFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_family_names_round_trip() {
        for family in FeatureFamily::ALL {
            assert_eq!(FeatureFamily::parse(family.as_str()), Some(*family));
        }
        assert_eq!(FeatureFamily::ALL.len(), 21);
        assert_eq!(FeatureFamily::parse("fillet"), None);
    }

    #[test]
    fn test_discriminator_keys() {
        assert_eq!(FeatureFamily::Primitive.discriminator(), "shape");
        assert_eq!(FeatureFamily::SheetMetalBase.discriminator(), "type");
        assert_eq!(FeatureFamily::Loft.discriminator(), "method");
    }

    #[test]
    fn test_from_args_parses_method_and_params() {
        let request = FeatureRequest::from_args(
            FeatureFamily::Extrude,
            &json!({"method": "thin_wall", "distance": 0.05, "wall_thickness": 0.002}),
        )
        .unwrap();
        assert_eq!(request.family(), FeatureFamily::Extrude);
        assert_eq!(request.method_name(), "thin_wall");
        assert!(request.check().is_ok());
    }

    #[test]
    fn test_from_args_missing_method_uses_default() {
        let request =
            FeatureRequest::from_args(FeatureFamily::Primitive, &json!({"radius": 0.01})).unwrap();
        assert_eq!(request.method_name(), "box_two_points");

        let request = FeatureRequest::from_args(FeatureFamily::Loft, &Value::Null).unwrap();
        assert_eq!(request.method_name(), "solid");
    }

    #[test]
    fn test_from_args_unknown_method_wins_over_bad_params() {
        let err = FeatureRequest::from_args(
            FeatureFamily::Hole,
            &json!({"method": "countersunk", "diameter": "wide"}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMethod);
        assert_eq!(err.to_string(), "Unknown method: countersunk");
    }

    #[test]
    fn test_from_args_bad_types() {
        let err = FeatureRequest::from_args(FeatureFamily::Extrude, &json!({"method": 3}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let err = FeatureRequest::from_args(
            FeatureFamily::Extrude,
            &json!({"distance": "far"}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let err = FeatureRequest::from_args(
            FeatureFamily::Extrude,
            &json!({"direction": "Sideways"}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let err = FeatureRequest::from_args(FeatureFamily::Extrude, &json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let err = FeatureRequest::from_args(
            FeatureFamily::Revolve,
            &json!({"method": "full_360", "treatment_type": "Knurled"}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        let err = FeatureRequest::from_args(
            FeatureFamily::Revolve,
            &json!({"method": "finite", "axis_type": "Spiral"}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn test_methods_listed_per_family() {
        assert_eq!(
            FeatureFamily::Sweep.methods(),
            vec!["solid", "thin_wall"]
        );
        assert_eq!(FeatureFamily::Hole.methods().len(), 12);
    }

    #[test]
    fn test_axis_families() {
        let axis: Vec<_> = FeatureFamily::ALL
            .iter()
            .filter(|f| f.requires_axis())
            .collect();
        assert_eq!(
            axis,
            vec![
                &FeatureFamily::Revolve,
                &FeatureFamily::RevolvedCutout,
                &FeatureFamily::Helix
            ]
        );
    }

    #[test]
    fn test_inputs_count() {
        let inputs = FeatureInputs {
            profiles: vec![EngineProfileId(2), EngineProfileId(3)],
            guides: vec![EngineProfileId(4)],
            path: Some(EngineProfileId(1)),
        };
        assert_eq!(inputs.count(), 4);
        assert_eq!(
            inputs.all_profiles().collect::<Vec<_>>(),
            vec![
                EngineProfileId(1),
                EngineProfileId(2),
                EngineProfileId(3),
                EngineProfileId(4)
            ]
        );
    }
}
