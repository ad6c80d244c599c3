//! Feature dispatcher
//!
//! Validates a request, resolves the session profiles its variant needs and
//! makes exactly one engine call. Nothing reaches the engine until the method
//! is known, every number is finite and the profiles are in place.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    ChamferParams, ContourFlangeParams, CutoutParams, ExtrudeParams, FeatureCreated, FeatureFamily,
    FeatureInputs, FeatureRequest, FlangeParams, HelixParams, HoleParams, LoftParams,
    LoftedCutoutParams, LoftedFlangeParams, PrimitiveCutoutParams, PrimitiveParams, ProfileUse,
    RefPlaneOnCurveParams, RefPlaneParams, RevolveParams, RevolvedCutoutParams, RoundParams,
    SheetMetalBaseParams, SweepParams, SweptCutoutParams,
};
use super::{
    ChamferMethod, ContourFlangeMethod, ExtrudeMethod, ExtrudedCutoutMethod, FlangeMethod,
    HelixMethod, HoleMethod, LoftMethod, LoftedCutoutMethod, LoftedFlangeMethod,
    NormalCutoutMethod, PrimitiveCutoutShape, PrimitiveShape, RefPlaneMethod,
    RefPlaneOnCurveMethod, RevolveMethod, RevolvedCutoutMethod, RoundMethod, SheetMetalBaseType,
    SweepMethod, SweptCutoutMethod,
};
use crate::error::{SessionError, SessionResult};
use crate::kernel::{CadEngine, EngineProfileId};
use crate::sketch::{Profile, SketchSession};

/// Create a feature from a typed request
///
/// On success the profiles the feature read are consumed (when the session
/// config allows it). On failure the session is unchanged.
pub fn dispatch(
    session: &mut SketchSession,
    engine: &mut dyn CadEngine,
    request: &FeatureRequest,
) -> SessionResult<FeatureCreated> {
    let family = request.family();
    let method = request.method_name();
    match try_dispatch(session, engine, request) {
        Ok(created) => {
            info!(
                family = family.as_str(),
                method,
                feature = %created.feature_id,
                "Created feature"
            );
            Ok(created)
        }
        Err(e) => {
            warn!(
                family = family.as_str(),
                method,
                kind = %e.kind(),
                error = %e,
                "Feature dispatch failed"
            );
            Err(e)
        }
    }
}

/// Create a feature from loosely typed tool arguments
pub fn dispatch_args(
    session: &mut SketchSession,
    engine: &mut dyn CadEngine,
    family: FeatureFamily,
    args: &Value,
) -> SessionResult<FeatureCreated> {
    let request = FeatureRequest::from_args(family, args)?;
    dispatch(session, engine, &request)
}

fn try_dispatch(
    session: &mut SketchSession,
    engine: &mut dyn CadEngine,
    request: &FeatureRequest,
) -> SessionResult<FeatureCreated> {
    let family = request.family();
    request.check()?;
    session.sync_document(engine)?;

    let usage = request.profile_use();
    let inputs = resolve_inputs(session, family, &usage)?;
    debug!(
        family = family.as_str(),
        profiles = inputs.count(),
        "Resolved feature inputs"
    );

    let feature_id = engine
        .create_feature(request, &inputs)
        .map_err(|e| SessionError::from_engine(format!("Create {}", family.as_str()), e))?;

    let mut params = request.echo();
    if let ProfileUse::PathAndSections { .. } = usage {
        params.insert("num_cross_sections".into(), inputs.profiles.len().into());
    }
    let created = FeatureCreated {
        family,
        method: request.method_name(),
        feature_id,
        num_profiles: usage.is_multi().then(|| inputs.count()),
        params,
    };

    if usage != ProfileUse::None
        && family.consumes_profiles()
        && session.config().consume_profiles
    {
        session.consume_profiles();
    }
    Ok(created)
}

fn ids(profiles: &[&Profile]) -> Vec<EngineProfileId> {
    profiles.iter().map(|profile| profile.engine_id()).collect()
}

/// A sweep needs a path and at least one cross section
const MIN_PATH_AND_SECTIONS: usize = 2;

fn resolve_inputs(
    session: &SketchSession,
    family: FeatureFamily,
    usage: &ProfileUse,
) -> SessionResult<FeatureInputs> {
    let insufficient = |required: usize, available: usize| SessionError::InsufficientProfiles {
        family: family.display_name().to_string(),
        required,
        available,
    };

    match usage {
        ProfileUse::None => Ok(FeatureInputs::default()),
        ProfileUse::Active { axis } => {
            let profile = session.closed_profile()?;
            if *axis && !profile.is_revolvable() {
                return Err(SessionError::validation(format!(
                    "{} needs a profile closed with an axis of revolution. Set the axis before closing the sketch",
                    family.display_name()
                )));
            }
            Ok(FeatureInputs::single(profile.engine_id()))
        }
        ProfileUse::Sections { indices, guides } => {
            let required = session.config().min_sections();
            let accumulated = session.accumulated_profiles();
            if accumulated.len() < required {
                return Err(insufficient(required, accumulated.len()));
            }

            let guide_profiles = match guides {
                Some(guides) => session.select_profiles(Some(guides))?,
                None => Vec::new(),
            };
            let sections = match (indices, guides) {
                (Some(indices), _) => session.select_profiles(Some(indices))?,
                (None, Some(guides)) => accumulated
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| !guides.contains(index))
                    .map(|(_, profile)| profile)
                    .collect(),
                (None, None) => session.select_profiles(None)?,
            };
            if sections.len() < required {
                return Err(insufficient(required, sections.len()));
            }

            Ok(FeatureInputs {
                profiles: ids(&sections),
                guides: ids(&guide_profiles),
                path: None,
            })
        }
        ProfileUse::PathAndSections { path_index } => {
            let accumulated = session.accumulated_profiles();
            if accumulated.len() < MIN_PATH_AND_SECTIONS {
                return Err(insufficient(MIN_PATH_AND_SECTIONS, accumulated.len()));
            }
            let path = accumulated.get(*path_index).ok_or_else(|| {
                SessionError::InvalidReference(format!(
                    "Path profile index {path_index} is out of range, {} profiles accumulated",
                    accumulated.len()
                ))
            })?;
            let sections: Vec<&Profile> = accumulated
                .iter()
                .enumerate()
                .filter(|(index, _)| index != path_index)
                .map(|(_, profile)| profile)
                .collect();

            Ok(FeatureInputs {
                profiles: ids(&sections),
                guides: Vec::new(),
                path: Some(path.engine_id()),
            })
        }
    }
}

// ============== Family Entry Points ==============

/// Declare one typed entry point per feature family
macro_rules! entry_points {
    ($( $(#[$meta:meta])* $name:ident => $family:ident($method:ident, $params:ident); )+) => {
        $(
            $(#[$meta])*
            pub fn $name(
                session: &mut SketchSession,
                engine: &mut dyn CadEngine,
                method: &str,
                params: $params,
            ) -> SessionResult<FeatureCreated> {
                let method = $method::parse(method)?;
                dispatch(session, engine, &FeatureRequest::$family { method, params })
            }
        )+
    };
}

entry_points! {
    /// Extrude the active profile
    extrude => Extrude(ExtrudeMethod, ExtrudeParams);
    /// Revolve the active profile about its axis
    revolve => Revolve(RevolveMethod, RevolveParams);
    extruded_cutout => ExtrudedCutout(ExtrudedCutoutMethod, CutoutParams);
    revolved_cutout => RevolvedCutout(RevolvedCutoutMethod, RevolvedCutoutParams);
    normal_cutout => NormalCutout(NormalCutoutMethod, CutoutParams);
    lofted_cutout => LoftedCutout(LoftedCutoutMethod, LoftedCutoutParams);
    swept_cutout => SweptCutout(SweptCutoutMethod, SweptCutoutParams);
    /// Loft through accumulated profiles
    loft => Loft(LoftMethod, LoftParams);
    /// Sweep accumulated sections along an accumulated path
    sweep => Sweep(SweepMethod, SweepParams);
    helix => Helix(HelixMethod, HelixParams);
    primitive => Primitive(PrimitiveShape, PrimitiveParams);
    primitive_cutout => PrimitiveCutout(PrimitiveCutoutShape, PrimitiveCutoutParams);
    /// Place a hole from its centre and diameter
    hole => Hole(HoleMethod, HoleParams);
    round => Round(RoundMethod, RoundParams);
    chamfer => Chamfer(ChamferMethod, ChamferParams);
    ref_plane => RefPlane(RefPlaneMethod, RefPlaneParams);
    ref_plane_on_curve => RefPlaneOnCurve(RefPlaneOnCurveMethod, RefPlaneOnCurveParams);
    flange => Flange(FlangeMethod, FlangeParams);
    contour_flange => ContourFlange(ContourFlangeMethod, ContourFlangeParams);
    sheet_metal_base => SheetMetalBase(SheetMetalBaseType, SheetMetalBaseParams);
    lofted_flange => LoftedFlange(LoftedFlangeMethod, LoftedFlangeParams);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::error::ErrorKind;
    use crate::kernel::{EngineCall, MockEngine};
    use crate::sketch::{PlaneRef, ReferencePlane, SketchEntity, SketchStatus};
    use glam::DVec2;
    use serde_json::json;

    fn top() -> PlaneRef {
        PlaneRef::Base(ReferencePlane::Top)
    }

    fn close_circle(session: &mut SketchSession, engine: &mut MockEngine, radius: f64) {
        session.open(engine, top()).unwrap();
        session
            .draw(engine, SketchEntity::circle(0.0, 0.0, radius))
            .unwrap();
        session.close(engine).unwrap();
    }

    fn base_block(session: &mut SketchSession, engine: &mut MockEngine) {
        session.open(engine, top()).unwrap();
        session
            .draw_rectangle(engine, DVec2::new(-0.1, -0.15), DVec2::new(0.1, 0.15))
            .unwrap();
        session.close(engine).unwrap();
        extrude(session, engine, "finite", ExtrudeParams::finite(0.05)).unwrap();
    }

    #[test]
    fn test_rectangle_extrude_created() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        session.open(&mut engine, top()).unwrap();
        session
            .draw_rectangle(&mut engine, DVec2::new(-0.1, -0.15), DVec2::new(0.1, 0.15))
            .unwrap();
        session.close(&mut engine).unwrap();

        let created = extrude(
            &mut session,
            &mut engine,
            "finite",
            ExtrudeParams::finite(0.05),
        )
        .unwrap();
        let record = created.to_record();
        assert_eq!(record["status"], "created");
        assert_eq!(record["method"], "finite");
        assert_eq!(record["distance"], 0.05);
        assert!(record.get("num_profiles").is_none());
        assert_eq!(engine.feature_calls(), 1);
    }

    #[test]
    fn test_revolve_without_axis_fails_before_engine() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        close_circle(&mut session, &mut engine, 0.005);

        let err = revolve(&mut session, &mut engine, "full", RevolveParams::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(engine.feature_calls(), 0);
        assert_eq!(session.accumulated_profiles().len(), 1);
    }

    #[test]
    fn test_revolve_with_axis() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        session.open(&mut engine, top()).unwrap();
        session
            .draw_rectangle(&mut engine, DVec2::new(0.01, 0.0), DVec2::new(0.03, 0.05))
            .unwrap();
        session
            .draw_axis_of_revolution(&mut engine, DVec2::ZERO, DVec2::new(0.0, 0.05))
            .unwrap();
        session.close(&mut engine).unwrap();

        let created =
            revolve(&mut session, &mut engine, "full", RevolveParams::default()).unwrap();
        assert_eq!(created.family, FeatureFamily::Revolve);
        assert_eq!(session.status(), SketchStatus::NoSketch);
    }

    #[test]
    fn test_loft_two_profiles() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        close_circle(&mut session, &mut engine, 0.02);
        close_circle(&mut session, &mut engine, 0.01);
        assert_eq!(session.accumulated_profiles().len(), 2);

        let created = loft(
            &mut session,
            &mut engine,
            "solid",
            LoftParams::with_indices([0, 1]),
        )
        .unwrap();
        let record = created.to_record();
        assert_eq!(record["status"], "created");
        assert_eq!(record["num_profiles"], 2);
        assert!(session.accumulated_profiles().is_empty());
    }

    #[test]
    fn test_hole_nan_diameter_never_reaches_engine() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();

        let params = HoleParams {
            diameter: f64::NAN,
            ..Default::default()
        };
        let err = hole(&mut session, &mut engine, "through_all", params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_unknown_method_makes_no_engine_call() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        close_circle(&mut session, &mut engine, 0.01);
        engine.clear_calls();

        let err = extrude(
            &mut session,
            &mut engine,
            "sideways",
            ExtrudeParams::finite(0.05),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMethod);
        assert_eq!(err.to_string(), "Unknown method: sideways");
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_loft_insufficient_profiles() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        close_circle(&mut session, &mut engine, 0.02);

        let err = loft(&mut session, &mut engine, "solid", LoftParams::default()).unwrap_err();
        assert_eq!(
            err,
            SessionError::InsufficientProfiles {
                family: "Loft".into(),
                required: 2,
                available: 1,
            }
        );
        assert_eq!(err.to_string(), "Loft requires at least 2 profiles, got 1");
        assert_eq!(engine.feature_calls(), 0);
    }

    #[test]
    fn test_loft_index_out_of_range() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        close_circle(&mut session, &mut engine, 0.02);
        close_circle(&mut session, &mut engine, 0.01);

        let err = loft(
            &mut session,
            &mut engine,
            "solid",
            LoftParams::with_indices([0, 5]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        assert_eq!(session.accumulated_profiles().len(), 2);
    }

    #[test]
    fn test_loft_with_guides_splits_profiles() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        for radius in [0.03, 0.02, 0.01] {
            close_circle(&mut session, &mut engine, radius);
        }

        let params = LoftParams {
            guide_profile_indices: Some(vec![1]),
            ..Default::default()
        };
        let created = loft(&mut session, &mut engine, "with_guides", params).unwrap();
        assert_eq!(created.num_profiles, Some(3));

        let Some(EngineCall::CreateFeature { inputs, .. }) = engine.calls().last() else {
            panic!("expected a feature call");
        };
        assert_eq!(inputs.profiles.len(), 2);
        assert_eq!(inputs.guides.len(), 1);
    }

    #[test]
    fn test_sweep_path_and_sections() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        close_circle(&mut session, &mut engine, 0.05);
        close_circle(&mut session, &mut engine, 0.005);

        let created = sweep(&mut session, &mut engine, "solid", SweepParams::default()).unwrap();
        assert_eq!(created.params["num_cross_sections"], 1);
        assert_eq!(created.num_profiles, Some(2));
    }

    #[test]
    fn test_sweep_ignores_loft_minimum() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::new(SessionConfig {
            min_loft_profiles: 3,
            ..Default::default()
        });
        close_circle(&mut session, &mut engine, 0.05);

        let err = sweep(&mut session, &mut engine, "solid", SweepParams::default()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InsufficientProfiles {
                required: 2,
                available: 1,
                ..
            }
        ));

        close_circle(&mut session, &mut engine, 0.005);
        let created = sweep(&mut session, &mut engine, "solid", SweepParams::default()).unwrap();
        assert_eq!(created.num_profiles, Some(2));
    }

    #[test]
    fn test_sweep_path_out_of_range() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        close_circle(&mut session, &mut engine, 0.05);
        close_circle(&mut session, &mut engine, 0.005);

        let params = SweepParams {
            path_profile_index: Some(2),
            ..Default::default()
        };
        let err = sweep(&mut session, &mut engine, "solid", params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[test]
    fn test_engine_failure_keeps_profiles() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        close_circle(&mut session, &mut engine, 0.01);

        engine.fail_next_feature("Extrude distance exceeds model size");
        let err = extrude(
            &mut session,
            &mut engine,
            "finite",
            ExtrudeParams::finite(0.05),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalEngineError);
        assert!(
            err.diagnostic()
                .is_some_and(|d| d.contains("exceeds model size"))
        );
        assert_eq!(session.accumulated_profiles().len(), 1);
        assert_eq!(session.status(), SketchStatus::Closed);
    }

    #[test]
    fn test_feature_without_closed_profile() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();

        let err = extrude(
            &mut session,
            &mut engine,
            "finite",
            ExtrudeParams::finite(0.05),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        session.open(&mut engine, top()).unwrap();
        let err = extrude(
            &mut session,
            &mut engine,
            "finite",
            ExtrudeParams::finite(0.05),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(engine.feature_calls(), 0);
    }

    #[test]
    fn test_consumption_can_be_disabled() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::new(SessionConfig {
            consume_profiles: false,
            ..Default::default()
        });
        close_circle(&mut session, &mut engine, 0.01);

        extrude(
            &mut session,
            &mut engine,
            "finite",
            ExtrudeParams::finite(0.05),
        )
        .unwrap();
        assert_eq!(session.accumulated_profiles().len(), 1);
        assert_eq!(session.status(), SketchStatus::Closed);
    }

    #[test]
    fn test_hole_after_base_does_not_consume() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        base_block(&mut session, &mut engine);
        close_circle(&mut session, &mut engine, 0.01);

        let params = HoleParams {
            diameter: 0.005,
            depth: 0.01,
            ..Default::default()
        };
        let created = hole(&mut session, &mut engine, "finite", params).unwrap();
        assert_eq!(created.params["diameter"], 0.005);
        assert_eq!(session.accumulated_profiles().len(), 1);
    }

    #[test]
    fn test_cutout_without_body_is_engine_error() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        close_circle(&mut session, &mut engine, 0.01);

        let err = dispatch_args(
            &mut session,
            &mut engine,
            FeatureFamily::ExtrudedCutout,
            &json!({"method": "through_all"}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalEngineError);
        assert_eq!(session.accumulated_profiles().len(), 1);
    }

    #[test]
    fn test_dispatch_args_unknown_method() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();

        let err = dispatch_args(
            &mut session,
            &mut engine,
            FeatureFamily::Primitive,
            &json!({"shape": "torus"}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMethod);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_ref_plane_adds_sketchable_plane() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();

        dispatch_args(
            &mut session,
            &mut engine,
            FeatureFamily::RefPlane,
            &json!({"method": "offset", "parent_plane_index": 1, "distance": 0.02}),
        )
        .unwrap();
        assert!(session.open(&mut engine, PlaneRef::Index(4)).is_ok());
    }

    #[test]
    fn test_document_switch_before_feature() {
        let mut engine = MockEngine::new();
        let mut session = SketchSession::default();
        close_circle(&mut session, &mut engine, 0.01);

        engine.switch_document();
        let err = extrude(
            &mut session,
            &mut engine,
            "finite",
            ExtrudeParams::finite(0.05),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(session.accumulated_profiles().is_empty());
        assert_eq!(engine.feature_calls(), 0);
    }
}
