//! In-process mock engine
//!
//! A deterministic [`CadEngine`] that records every call. It models the
//! engine behaviour the session depends on: plane resolution, closure
//! validation by flags, revolve checks against closure flags and the base
//! feature requirement of body-modifying families. Closure also rejects
//! degenerate solid geometry such as a zero-length line.

use std::collections::HashMap;

use tracing::debug;

use super::traits::{
    AxisId, CadEngine, ConstraintId, DocumentId, EngineEntityId, EngineError, EngineProfileId, EngineResult,
    FeatureId, PlaneId,
};
use crate::feature::{FeatureFamily, FeatureInputs, FeatureRequest};
use crate::sketch::{ConstraintKind, EntityKind, Keypoint, SketchEntity, ValidationFlags};

/// Number of base reference planes every document starts with
const BASE_PLANES: u32 = 3;

/// A recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    ActiveDocument,
    ResolvePlane(u32),
    CreateProfile(PlaneId),
    AddEntity {
        profile: EngineProfileId,
        kind: EntityKind,
    },
    MarkConstruction {
        profile: EngineProfileId,
        entity: EngineEntityId,
    },
    SetRevolutionAxis {
        profile: EngineProfileId,
        entity: EngineEntityId,
    },
    AddConstraint {
        profile: EngineProfileId,
        kind: ConstraintKind,
        entities: Vec<EngineEntityId>,
    },
    AddKeypointConstraint {
        profile: EngineProfileId,
        first: (EngineEntityId, Keypoint),
        second: (EngineEntityId, Keypoint),
    },
    CloseProfile {
        profile: EngineProfileId,
        flags: ValidationFlags,
    },
    CreateFeature {
        family: FeatureFamily,
        method: &'static str,
        inputs: FeatureInputs,
    },
}

impl EngineCall {
    /// Check if this call is a feature creation
    pub fn is_feature(&self) -> bool {
        matches!(self, EngineCall::CreateFeature { .. })
    }
}

#[derive(Debug)]
struct MockEntity {
    id: EngineEntityId,
    construction: bool,
    degenerate: bool,
}

#[derive(Debug, Default)]
struct MockProfile {
    entities: Vec<MockEntity>,
    axis: Option<EngineEntityId>,
    constraints: Vec<ConstraintId>,
    closed: Option<ValidationFlags>,
}

impl MockProfile {
    fn ensure_open(&self, profile: EngineProfileId) -> EngineResult<()> {
        if self.closed.is_some() {
            return Err(EngineError::OperationFailed(format!(
                "Profile {profile} is already closed"
            )));
        }
        Ok(())
    }
}

/// Deterministic engine double for tests and dry runs
#[derive(Debug)]
pub struct MockEngine {
    document: DocumentId,
    plane_count: u32,
    next_id: u32,
    profiles: HashMap<EngineProfileId, MockProfile>,
    features: Vec<(FeatureId, FeatureFamily)>,
    calls: Vec<EngineCall>,
    fail_entity: Option<(usize, String)>,
    reject_next_close: Option<String>,
    fail_next_feature: Option<String>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a mock engine with one empty document
    pub fn new() -> Self {
        Self {
            document: DocumentId::new(),
            plane_count: BASE_PLANES,
            next_id: 0,
            profiles: HashMap::new(),
            features: Vec::new(),
            calls: Vec::new(),
            fail_entity: None,
            reject_next_close: None,
            fail_next_feature: None,
        }
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Get the active document
    pub fn document(&self) -> DocumentId {
        self.document
    }

    /// Activate a fresh document, as if the user switched windows
    pub fn switch_document(&mut self) -> DocumentId {
        self.document = DocumentId::new();
        self.plane_count = BASE_PLANES;
        self.profiles.clear();
        self.features.clear();
        self.document
    }

    /// Make an entity addition fail after `successes` more succeed
    pub fn fail_entity_after(&mut self, successes: usize, diagnostic: impl Into<String>) {
        self.fail_entity = Some((successes, diagnostic.into()));
    }

    /// Make the next profile closure fail with a diagnostic
    pub fn reject_next_close(&mut self, diagnostic: impl Into<String>) {
        self.reject_next_close = Some(diagnostic.into());
    }

    /// Make the next feature creation fail with a diagnostic
    pub fn fail_next_feature(&mut self, diagnostic: impl Into<String>) {
        self.fail_next_feature = Some(diagnostic.into());
    }

    /// Get every recorded call in order
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Forget recorded calls
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Count feature creation attempts
    pub fn feature_calls(&self) -> usize {
        self.calls.iter().filter(|call| call.is_feature()).count()
    }

    /// Get the features created in the active document
    pub fn features(&self) -> &[(FeatureId, FeatureFamily)] {
        &self.features
    }

    /// Get the number of planes in the active document
    pub fn plane_count(&self) -> u32 {
        self.plane_count
    }

    /// Get the flags a profile was closed with
    pub fn closed_flags(&self, profile: EngineProfileId) -> Option<ValidationFlags> {
        self.profiles.get(&profile).and_then(|p| p.closed)
    }

    /// Count the constraints applied to a profile
    pub fn constraint_count(&self, profile: EngineProfileId) -> usize {
        self.profiles
            .get(&profile)
            .map_or(0, |p| p.constraints.len())
    }

    /// Check if an entity is construction geometry
    pub fn is_construction(&self, profile: EngineProfileId, entity: EngineEntityId) -> bool {
        self.profiles
            .get(&profile)
            .and_then(|p| p.entities.iter().find(|e| e.id == entity))
            .is_some_and(|e| e.construction)
    }

    fn profile_mut(&mut self, profile: EngineProfileId) -> EngineResult<&mut MockProfile> {
        self.profiles
            .get_mut(&profile)
            .ok_or_else(|| EngineError::NotFound(format!("Profile {profile}")))
    }

    fn check_entity(profile: &MockProfile, entity: EngineEntityId) -> EngineResult<()> {
        if profile.entities.iter().any(|e| e.id == entity) {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("Entity {entity}")))
        }
    }
}

impl CadEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn active_document(&mut self) -> EngineResult<DocumentId> {
        self.calls.push(EngineCall::ActiveDocument);
        Ok(self.document)
    }

    fn resolve_plane(&mut self, index: u32) -> EngineResult<PlaneId> {
        self.calls.push(EngineCall::ResolvePlane(index));
        if index == 0 || index > self.plane_count {
            return Err(EngineError::NotFound(format!(
                "Reference plane {index} does not exist ({} planes)",
                self.plane_count
            )));
        }
        Ok(PlaneId(index))
    }

    fn create_profile(&mut self, plane: PlaneId) -> EngineResult<EngineProfileId> {
        self.calls.push(EngineCall::CreateProfile(plane));
        let id = EngineProfileId(self.alloc_id());
        self.profiles.insert(id, MockProfile::default());
        Ok(id)
    }

    fn add_entity(
        &mut self,
        profile: EngineProfileId,
        entity: &SketchEntity,
    ) -> EngineResult<EngineEntityId> {
        self.calls.push(EngineCall::AddEntity {
            profile,
            kind: entity.kind(),
        });
        if let Some((remaining, diagnostic)) = self.fail_entity.take() {
            if remaining == 0 {
                return Err(EngineError::OperationFailed(diagnostic));
            }
            self.fail_entity = Some((remaining - 1, diagnostic));
        }

        let id = EngineEntityId(self.alloc_id());
        let target = self.profile_mut(profile)?;
        target.ensure_open(profile)?;
        target.entities.push(MockEntity {
            id,
            construction: false,
            degenerate: entity.is_degenerate(),
        });
        Ok(id)
    }

    fn mark_construction(
        &mut self,
        profile: EngineProfileId,
        entity: EngineEntityId,
    ) -> EngineResult<()> {
        self.calls
            .push(EngineCall::MarkConstruction { profile, entity });
        let target = self.profile_mut(profile)?;
        Self::check_entity(target, entity)?;
        if let Some(e) = target.entities.iter_mut().find(|e| e.id == entity) {
            e.construction = true;
        }
        Ok(())
    }

    fn set_revolution_axis(
        &mut self,
        profile: EngineProfileId,
        entity: EngineEntityId,
    ) -> EngineResult<AxisId> {
        self.calls
            .push(EngineCall::SetRevolutionAxis { profile, entity });
        let target = self.profile_mut(profile)?;
        Self::check_entity(target, entity)?;
        target.axis = Some(entity);
        Ok(AxisId(entity.0))
    }

    fn add_constraint(
        &mut self,
        profile: EngineProfileId,
        kind: ConstraintKind,
        entities: &[EngineEntityId],
    ) -> EngineResult<ConstraintId> {
        self.calls.push(EngineCall::AddConstraint {
            profile,
            kind,
            entities: entities.to_vec(),
        });
        let id = ConstraintId(self.alloc_id());
        let target = self.profile_mut(profile)?;
        target.ensure_open(profile)?;
        for entity in entities {
            Self::check_entity(target, *entity)?;
        }
        target.constraints.push(id);
        Ok(id)
    }

    fn add_keypoint_constraint(
        &mut self,
        profile: EngineProfileId,
        first: (EngineEntityId, Keypoint),
        second: (EngineEntityId, Keypoint),
    ) -> EngineResult<ConstraintId> {
        self.calls.push(EngineCall::AddKeypointConstraint {
            profile,
            first,
            second,
        });
        let id = ConstraintId(self.alloc_id());
        let target = self.profile_mut(profile)?;
        target.ensure_open(profile)?;
        Self::check_entity(target, first.0)?;
        Self::check_entity(target, second.0)?;
        target.constraints.push(id);
        Ok(id)
    }

    fn close_profile(
        &mut self,
        profile: EngineProfileId,
        flags: ValidationFlags,
    ) -> EngineResult<()> {
        self.calls.push(EngineCall::CloseProfile { profile, flags });
        if let Some(diagnostic) = self.reject_next_close.take() {
            return Err(EngineError::ProfileRejected(diagnostic));
        }

        let target = self.profile_mut(profile)?;
        if !target.entities.iter().any(|e| !e.construction) {
            return Err(EngineError::ProfileRejected(
                "Profile contains no solid geometry".into(),
            ));
        }
        if target
            .entities
            .iter()
            .any(|e| e.degenerate && !e.construction)
        {
            return Err(EngineError::ProfileRejected(
                "Profile contains degenerate geometry".into(),
            ));
        }
        if flags.contains(ValidationFlags::REF_AXIS_REQUIRED) && target.axis.is_none() {
            return Err(EngineError::ProfileRejected(
                "Reference axis required but none is set".into(),
            ));
        }
        target.closed = Some(flags);
        Ok(())
    }

    fn create_feature(
        &mut self,
        request: &FeatureRequest,
        inputs: &FeatureInputs,
    ) -> EngineResult<FeatureId> {
        let family = request.family();
        self.calls.push(EngineCall::CreateFeature {
            family,
            method: request.method_name(),
            inputs: inputs.clone(),
        });
        if let Some(diagnostic) = self.fail_next_feature.take() {
            return Err(EngineError::OperationFailed(diagnostic));
        }

        for id in inputs.all_profiles() {
            let profile = self
                .profiles
                .get(&id)
                .ok_or_else(|| EngineError::NotFound(format!("Profile {id}")))?;
            if profile.closed.is_none() {
                return Err(EngineError::ProfileRejected(format!(
                    "Profile {id} is not closed"
                )));
            }
        }

        if family.requires_axis() {
            let revolvable = inputs
                .profiles
                .first()
                .and_then(|id| self.closed_flags(*id))
                .is_some_and(|flags| flags.contains(ValidationFlags::REF_AXIS_REQUIRED));
            if !revolvable {
                return Err(EngineError::ProfileRejected(
                    "Profile was not validated against a reference axis".into(),
                ));
            }
        }

        if family.requires_body() && !self.features.iter().any(|(_, f)| f.creates_body()) {
            return Err(EngineError::OperationFailed(
                "No base feature exists".into(),
            ));
        }

        if matches!(
            family,
            FeatureFamily::RefPlane | FeatureFamily::RefPlaneOnCurve
        ) {
            self.plane_count += 1;
        }

        let id = FeatureId(self.alloc_id());
        self.features.push((id, family));
        debug!(%id, family = family.as_str(), "Mock feature created");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{ExtrudeMethod, ExtrudeParams, HoleMethod, HoleParams};

    fn closed_profile(engine: &mut MockEngine) -> EngineProfileId {
        let profile = engine.create_profile(PlaneId(1)).unwrap();
        engine
            .add_entity(profile, &SketchEntity::circle(0.0, 0.0, 0.01))
            .unwrap();
        engine
            .close_profile(profile, ValidationFlags::DEFAULT)
            .unwrap();
        profile
    }

    #[test]
    fn test_resolve_plane_bounds() {
        let mut engine = MockEngine::new();
        assert!(engine.resolve_plane(1).is_ok());
        assert!(engine.resolve_plane(3).is_ok());
        assert!(matches!(
            engine.resolve_plane(4),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_construction_tracking() {
        let mut engine = MockEngine::new();
        let profile = engine.create_profile(PlaneId(1)).unwrap();
        let line = engine
            .add_entity(profile, &SketchEntity::line(0.0, 0.0, 0.0, 1.0))
            .unwrap();
        assert!(!engine.is_construction(profile, line));
        engine.mark_construction(profile, line).unwrap();
        assert!(engine.is_construction(profile, line));
    }

    #[test]
    fn test_close_with_only_construction_rejected() {
        let mut engine = MockEngine::new();
        let profile = engine.create_profile(PlaneId(1)).unwrap();
        let line = engine
            .add_entity(profile, &SketchEntity::line(0.0, 0.0, 0.0, 1.0))
            .unwrap();
        engine.mark_construction(profile, line).unwrap();
        engine.set_revolution_axis(profile, line).unwrap();

        let result = engine.close_profile(profile, ValidationFlags::FOR_REVOLVE);
        assert!(matches!(result, Err(EngineError::ProfileRejected(_))));
    }

    #[test]
    fn test_hole_needs_base_feature() {
        let mut engine = MockEngine::new();
        let hole = FeatureRequest::Hole {
            method: HoleMethod::ThroughAll,
            params: HoleParams {
                diameter: 0.005,
                ..Default::default()
            },
        };
        let result = engine.create_feature(&hole, &FeatureInputs::default());
        assert!(matches!(result, Err(EngineError::OperationFailed(_))));

        let profile = closed_profile(&mut engine);
        let extrude = FeatureRequest::Extrude {
            method: ExtrudeMethod::Finite,
            params: ExtrudeParams::finite(0.05),
        };
        engine
            .create_feature(&extrude, &FeatureInputs::single(profile))
            .unwrap();
        assert!(engine.create_feature(&hole, &FeatureInputs::default()).is_ok());
        assert_eq!(engine.features().len(), 2);
        assert_eq!(engine.feature_calls(), 3);
    }

    #[test]
    fn test_degenerate_line_rejected_on_close() {
        let mut engine = MockEngine::new();
        let profile = engine.create_profile(PlaneId(1)).unwrap();
        engine
            .add_entity(profile, &SketchEntity::circle(0.0, 0.0, 0.01))
            .unwrap();
        engine
            .add_entity(profile, &SketchEntity::line(0.0, 0.0, 0.0, 0.0))
            .unwrap();

        let result = engine.close_profile(profile, ValidationFlags::DEFAULT);
        assert!(matches!(result, Err(EngineError::ProfileRejected(_))));
        assert_eq!(engine.closed_flags(profile), None);
    }

    #[test]
    fn test_constraints_need_known_entities_and_open_profile() {
        let mut engine = MockEngine::new();
        let profile = engine.create_profile(PlaneId(1)).unwrap();
        let line = engine
            .add_entity(profile, &SketchEntity::line(0.0, 0.0, 0.1, 0.0))
            .unwrap();
        engine
            .add_constraint(profile, ConstraintKind::Horizontal, &[line])
            .unwrap();
        assert!(matches!(
            engine.add_constraint(profile, ConstraintKind::Fixed, &[EngineEntityId(99)]),
            Err(EngineError::NotFound(_))
        ));
        assert_eq!(engine.constraint_count(profile), 1);

        engine
            .add_entity(profile, &SketchEntity::circle(0.0, 0.0, 0.01))
            .unwrap();
        engine
            .close_profile(profile, ValidationFlags::DEFAULT)
            .unwrap();
        let result = engine.add_keypoint_constraint(
            profile,
            (line, Keypoint::Start),
            (line, Keypoint::End),
        );
        assert!(matches!(result, Err(EngineError::OperationFailed(_))));
    }

    #[test]
    fn test_fail_entity_after() {
        let mut engine = MockEngine::new();
        let profile = engine.create_profile(PlaneId(1)).unwrap();
        engine.fail_entity_after(1, "out of memory");
        assert!(engine.add_entity(profile, &SketchEntity::point(0.0, 0.0)).is_ok());
        assert!(engine.add_entity(profile, &SketchEntity::point(0.1, 0.0)).is_err());
        assert!(engine.add_entity(profile, &SketchEntity::point(0.2, 0.0)).is_ok());
    }

    #[test]
    fn test_switch_document_clears_model() {
        let mut engine = MockEngine::new();
        let first = engine.document();
        closed_profile(&mut engine);

        let second = engine.switch_document();
        assert_ne!(first, second);
        assert_eq!(engine.plane_count(), BASE_PLANES);
        assert!(engine.features().is_empty());
    }
}
