//! Sketch Session
//!
//! Tracks the single in-progress profile, its axis of revolution and the
//! ordered list of closed profiles kept for multi-section features.
//!
//! ```text
//! NoSketch --open--> Open --close--> Closed --open--> Open
//!                    draw, constrain, set axis: Open -> Open
//! any --reset--> NoSketch
//! ```

mod constraint;
mod entity;
mod plane;
mod validation;

pub use constraint::{AppliedConstraint, ConstraintKind, Keypoint};
pub use entity::{EntityKind, SketchEntity};
pub use plane::{PlaneRef, ReferencePlane};
pub use validation::{ProfileValidator, ValidationFlags};

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::kernel::{CadEngine, DocumentId, EngineEntityId, EngineProfileId, PlaneId};

/// Handle to a sketch opened in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SketchHandle {
    document: DocumentId,
    epoch: u64,
    serial: u64,
}

impl SketchHandle {
    /// Get the document the sketch was opened in
    pub fn document(&self) -> DocumentId {
        self.document
    }
}

/// Handle to an entity drawn into an open sketch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle {
    sketch: SketchHandle,
    index: usize,
}

impl EntityHandle {
    /// Get the sketch the entity belongs to
    pub fn sketch(&self) -> SketchHandle {
        self.sketch
    }

    /// Get the position of the entity in its profile
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Handle to a closed profile
///
/// Stays addressable until the profile is consumed, the session is reset or
/// the active document changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileHandle {
    document: DocumentId,
    epoch: u64,
    serial: u64,
}

/// An entity together with its engine-side identity
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnEntity {
    pub entity: SketchEntity,
    pub engine_id: EngineEntityId,
    /// Excluded from the solid boundary
    pub construction: bool,
}

/// A profile bound to one plane
#[derive(Debug, Clone)]
pub struct Profile {
    serial: u64,
    document: DocumentId,
    plane: PlaneRef,
    plane_id: PlaneId,
    engine_id: EngineProfileId,
    entities: Vec<DrawnEntity>,
    constraints: Vec<AppliedConstraint>,
    axis: Option<usize>,
    flags: Option<ValidationFlags>,
}

impl Profile {
    /// Get the plane the profile was opened on
    pub fn plane(&self) -> PlaneRef {
        self.plane
    }

    /// Get the engine plane the profile lies on
    pub fn plane_id(&self) -> PlaneId {
        self.plane_id
    }

    /// Get the engine profile id
    pub fn engine_id(&self) -> EngineProfileId {
        self.engine_id
    }

    /// Get the drawn entities in drawing order
    pub fn entities(&self) -> &[DrawnEntity] {
        &self.entities
    }

    /// Get the applied constraints in order
    pub fn constraints(&self) -> &[AppliedConstraint] {
        &self.constraints
    }

    /// Get the axis of revolution, if set
    pub fn axis(&self) -> Option<&DrawnEntity> {
        self.axis.and_then(|index| self.entities.get(index))
    }

    /// Check if an axis of revolution is set
    pub fn has_axis(&self) -> bool {
        self.axis.is_some()
    }

    /// Get the flags the profile was closed with
    pub fn flags(&self) -> Option<ValidationFlags> {
        self.flags
    }

    /// Check if the profile has been closed
    pub fn is_closed(&self) -> bool {
        self.flags.is_some()
    }

    /// Check if the profile was closed for revolution
    pub fn is_revolvable(&self) -> bool {
        self.flags
            .is_some_and(|flags| flags.contains(ValidationFlags::FOR_REVOLVE))
    }

    /// Count construction entities
    pub fn construction_count(&self) -> usize {
        self.entities.iter().filter(|e| e.construction).count()
    }
}

/// Lifecycle position of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SketchStatus {
    NoSketch,
    Open,
    Closed,
}

#[derive(Debug, Clone)]
enum SketchState {
    NoSketch,
    Open(Profile),
    /// The closed profile lives in the accumulated list
    Closed(ProfileHandle),
}

/// Snapshot of session state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SketchInfo {
    pub state: SketchStatus,
    pub document: Option<DocumentId>,
    pub plane: Option<String>,
    pub plane_index: Option<u32>,
    pub entity_counts: BTreeMap<EntityKind, usize>,
    pub total_entities: usize,
    pub construction_entities: usize,
    pub constraints: usize,
    pub axis_set: bool,
    /// Raw closure flags of a closed profile
    pub flags: Option<u32>,
    pub accumulated_profiles: usize,
}

/// The sketch/profile state machine
///
/// Owned by the caller and passed by `&mut` to every operation. The engine is
/// passed alongside so the session never holds it.
#[derive(Debug, Clone)]
pub struct SketchSession {
    config: SessionConfig,
    document: Option<DocumentId>,
    epoch: u64,
    next_serial: u64,
    state: SketchState,
    accumulated: Vec<Profile>,
}

impl Default for SketchSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

fn no_open_sketch() -> SessionError {
    SessionError::InvalidState("No sketch is open. Call open first".into())
}

impl SketchSession {
    /// Create a new empty session
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            document: None,
            epoch: 0,
            next_serial: 0,
            state: SketchState::NoSketch,
            accumulated: Vec::new(),
        }
    }

    /// Get the session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the document the session is bound to
    pub fn document(&self) -> Option<DocumentId> {
        self.document
    }

    /// Get the current epoch, bumped on every reset
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Get the lifecycle position
    pub fn status(&self) -> SketchStatus {
        match self.state {
            SketchState::NoSketch => SketchStatus::NoSketch,
            SketchState::Open(_) => SketchStatus::Open,
            SketchState::Closed(_) => SketchStatus::Closed,
        }
    }

    // ============== Document Tracking ==============

    /// Bind to the engine's active document
    ///
    /// If the active document differs from the bound one, the session resets
    /// (or refuses, when `follow_document` is off).
    pub fn sync_document(&mut self, engine: &mut dyn CadEngine) -> SessionResult<DocumentId> {
        let current = engine
            .active_document()
            .map_err(|e| SessionError::from_engine("Query active document", e))?;

        if let Some(previous) = self.document
            && previous != current
        {
            if !self.config.follow_document {
                return Err(SessionError::InvalidState(format!(
                    "Active document changed from {previous} to {current}. Reset the session to continue"
                )));
            }
            info!(%previous, %current, "Active document changed, resetting sketch session");
            self.reset();
        }

        self.document = Some(current);
        Ok(current)
    }

    fn check_live(&self, document: DocumentId, epoch: u64) -> SessionResult<()> {
        if self.document != Some(document) || self.epoch != epoch {
            return Err(SessionError::InvalidReference(
                "Handle belongs to a previous session or document".into(),
            ));
        }
        Ok(())
    }

    fn open_handle(&self) -> SessionResult<SketchHandle> {
        match &self.state {
            SketchState::Open(profile) => Ok(SketchHandle {
                document: profile.document,
                epoch: self.epoch,
                serial: profile.serial,
            }),
            _ => Err(no_open_sketch()),
        }
    }

    /// Resolve an entity handle against the open sketch
    fn open_entity(&self, handle: EntityHandle) -> SessionResult<&DrawnEntity> {
        let open = self.open_handle()?;
        self.check_live(handle.sketch.document, handle.sketch.epoch)?;
        if handle.sketch.serial != open.serial {
            return Err(SessionError::InvalidState(
                "Entity belongs to a different profile than the open sketch".into(),
            ));
        }
        self.open_profile()
            .and_then(|profile| profile.entities.get(handle.index))
            .ok_or_else(|| {
                SessionError::InvalidReference(format!("Entity {} does not exist", handle.index))
            })
    }

    // ============== Sketch Lifecycle ==============

    /// Open a sketch on a plane
    pub fn open(
        &mut self,
        engine: &mut dyn CadEngine,
        plane: PlaneRef,
    ) -> SessionResult<SketchHandle> {
        let document = self.sync_document(engine)?;
        if let SketchState::Open(_) = self.state {
            return Err(SessionError::InvalidState(
                "A sketch is already open. Close it before opening another".into(),
            ));
        }

        let index = plane.index();
        if index == 0 {
            return Err(SessionError::InvalidReference(
                "Plane indices are 1-based (1 = Top, 2 = Front, 3 = Right)".into(),
            ));
        }
        let plane_id = engine
            .resolve_plane(index)
            .map_err(|e| SessionError::from_engine("Resolve plane", e))?;
        let engine_id = engine
            .create_profile(plane_id)
            .map_err(|e| SessionError::from_engine("Create profile", e))?;

        self.next_serial += 1;
        let profile = Profile {
            serial: self.next_serial,
            document,
            plane,
            plane_id,
            engine_id,
            entities: Vec::new(),
            constraints: Vec::new(),
            axis: None,
            flags: None,
        };
        let handle = SketchHandle {
            document,
            epoch: self.epoch,
            serial: profile.serial,
        };
        self.state = SketchState::Open(profile);

        info!(%plane, "Opened sketch");
        Ok(handle)
    }

    /// Append an entity to the open sketch
    pub fn draw(
        &mut self,
        engine: &mut dyn CadEngine,
        entity: SketchEntity,
    ) -> SessionResult<EntityHandle> {
        self.sync_document(engine)?;
        let sketch = self.open_handle()?;
        entity.validate()?;

        let SketchState::Open(profile) = &mut self.state else {
            return Err(no_open_sketch());
        };
        let engine_id = engine
            .add_entity(profile.engine_id, &entity)
            .map_err(|e| SessionError::from_engine("Add entity", e))?;

        debug!(kind = entity.kind().name(), "Drew sketch entity");
        profile.entities.push(DrawnEntity {
            entity,
            engine_id,
            construction: false,
        });
        Ok(EntityHandle {
            sketch,
            index: profile.entities.len() - 1,
        })
    }

    /// Draw several entities after validating all of them
    ///
    /// Entities reach the engine one at a time. If the engine fails part way,
    /// the entities it already accepted stay in the profile, so the local
    /// entity list always mirrors what the engine holds.
    fn draw_all(
        &mut self,
        engine: &mut dyn CadEngine,
        entities: Vec<SketchEntity>,
    ) -> SessionResult<Vec<EntityHandle>> {
        self.open_handle()?;
        for entity in &entities {
            entity.validate()?;
        }
        entities
            .into_iter()
            .map(|entity| self.draw(engine, entity))
            .collect()
    }

    /// Draw an axis-aligned rectangle as four lines
    pub fn draw_rectangle(
        &mut self,
        engine: &mut dyn CadEngine,
        corner1: DVec2,
        corner2: DVec2,
    ) -> SessionResult<Vec<EntityHandle>> {
        self.draw_all(engine, SketchEntity::rectangle(corner1, corner2).to_vec())
    }

    /// Draw a regular polygon as `sides` lines
    pub fn draw_polygon(
        &mut self,
        engine: &mut dyn CadEngine,
        center: DVec2,
        radius: f64,
        sides: u32,
    ) -> SessionResult<Vec<EntityHandle>> {
        let lines = SketchEntity::polygon(center, radius, sides)?;
        self.draw_all(engine, lines)
    }

    /// Draw a spline with the configured order
    pub fn draw_spline(
        &mut self,
        engine: &mut dyn CadEngine,
        points: Vec<DVec2>,
    ) -> SessionResult<EntityHandle> {
        let order = self.config.spline_order;
        self.draw(engine, SketchEntity::spline(points, order))
    }

    /// Draw an arc from `start` around `center`, ending on the ray through `end`
    pub fn draw_arc_by_3_points(
        &mut self,
        engine: &mut dyn CadEngine,
        start: DVec2,
        center: DVec2,
        end: DVec2,
    ) -> SessionResult<EntityHandle> {
        let arc = SketchEntity::arc_by_3_points(start, center, end)?;
        self.draw(engine, arc)
    }

    /// Draw a circle from two diametrically opposite points
    pub fn draw_circle_by_2_points(
        &mut self,
        engine: &mut dyn CadEngine,
        p1: DVec2,
        p2: DVec2,
    ) -> SessionResult<EntityHandle> {
        let circle = SketchEntity::circle_by_2_points(p1, p2)?;
        self.draw(engine, circle)
    }

    /// Draw a circle through three points
    pub fn draw_circle_by_3_points(
        &mut self,
        engine: &mut dyn CadEngine,
        p1: DVec2,
        p2: DVec2,
        p3: DVec2,
    ) -> SessionResult<EntityHandle> {
        let circle = SketchEntity::circle_by_3_points(p1, p2, p3)?;
        self.draw(engine, circle)
    }

    /// Mark a line of the open sketch as its axis of revolution
    ///
    /// The line becomes construction geometry. Setting a new axis replaces the
    /// previous one.
    pub fn set_axis_of_revolution(
        &mut self,
        engine: &mut dyn CadEngine,
        line: EntityHandle,
    ) -> SessionResult<()> {
        self.sync_document(engine)?;
        let drawn = self.open_entity(line)?;
        if !drawn.entity.is_line() {
            return Err(SessionError::InvalidReference(format!(
                "Axis of revolution must be a line, got {}",
                drawn.entity.kind().name()
            )));
        }
        let entity_id = drawn.engine_id;

        let SketchState::Open(profile) = &mut self.state else {
            return Err(no_open_sketch());
        };

        engine
            .mark_construction(profile.engine_id, entity_id)
            .map_err(|e| SessionError::from_engine("Mark construction", e))?;
        engine
            .set_revolution_axis(profile.engine_id, entity_id)
            .map_err(|e| SessionError::from_engine("Set axis of revolution", e))?;

        profile.entities[line.index].construction = true;
        if let Some(previous) = profile.axis.replace(line.index)
            && previous != line.index
        {
            debug!(previous, "Replaced axis of revolution");
        }
        info!(entity = line.index, "Set axis of revolution");
        Ok(())
    }

    /// Draw a line and make it the axis of revolution
    pub fn draw_axis_of_revolution(
        &mut self,
        engine: &mut dyn CadEngine,
        start: DVec2,
        end: DVec2,
    ) -> SessionResult<EntityHandle> {
        let line = self.draw(engine, SketchEntity::Line { start, end })?;
        self.set_axis_of_revolution(engine, line)?;
        Ok(line)
    }

    // ============== Constraints ==============

    /// Handle to the entity at `index` of the open sketch
    pub fn entity_handle(&self, index: usize) -> SessionResult<EntityHandle> {
        let handle = EntityHandle {
            sketch: self.open_handle()?,
            index,
        };
        self.open_entity(handle)?;
        Ok(handle)
    }

    /// Apply a geometric relation to entities of the open sketch
    ///
    /// Handles go through the same checks as the axis of revolution. The
    /// number and kinds of entities must suit the relation.
    pub fn add_constraint(
        &mut self,
        engine: &mut dyn CadEngine,
        kind: ConstraintKind,
        entities: &[EntityHandle],
    ) -> SessionResult<AppliedConstraint> {
        self.sync_document(engine)?;
        if entities.len() != kind.arity() {
            return Err(SessionError::invalid_parameter(
                "elements",
                format!(
                    "{kind} takes {} entities, got {}",
                    kind.arity(),
                    entities.len()
                ),
            ));
        }

        let mut engine_ids = Vec::with_capacity(entities.len());
        for (position, handle) in entities.iter().enumerate() {
            if entities[..position].iter().any(|h| h.index == handle.index) {
                return Err(SessionError::invalid_parameter(
                    "elements",
                    format!("entity {} is listed twice", handle.index),
                ));
            }
            let drawn = self.open_entity(*handle)?;
            if !kind.accepts(drawn.entity.kind()) {
                return Err(SessionError::InvalidReference(format!(
                    "A {kind} constraint cannot apply to a {}",
                    drawn.entity.kind().name()
                )));
            }
            engine_ids.push(drawn.engine_id);
        }

        let SketchState::Open(profile) = &mut self.state else {
            return Err(no_open_sketch());
        };
        let engine_id = engine
            .add_constraint(profile.engine_id, kind, &engine_ids)
            .map_err(|e| SessionError::from_engine("Add constraint", e))?;

        let applied = AppliedConstraint::Relation {
            kind,
            entities: entities.iter().map(|h| h.index).collect(),
            engine_id,
        };
        profile.constraints.push(applied.clone());
        debug!(%kind, "Added constraint");
        Ok(applied)
    }

    /// Make a keypoint of one entity coincide with a keypoint of another
    pub fn add_keypoint_constraint(
        &mut self,
        engine: &mut dyn CadEngine,
        first: (EntityHandle, Keypoint),
        second: (EntityHandle, Keypoint),
    ) -> SessionResult<AppliedConstraint> {
        self.sync_document(engine)?;
        if first.0.index == second.0.index {
            return Err(SessionError::invalid_parameter(
                "elements",
                "a keypoint constraint needs two different entities",
            ));
        }

        let resolve = |(handle, keypoint): (EntityHandle, Keypoint)| -> SessionResult<_> {
            let drawn = self.open_entity(handle)?;
            if !keypoint.applies_to(drawn.entity.kind()) {
                return Err(SessionError::InvalidReference(format!(
                    "A {} has no {keypoint:?} keypoint",
                    drawn.entity.kind().name()
                )));
            }
            Ok((drawn.engine_id, keypoint))
        };
        let first_id = resolve(first)?;
        let second_id = resolve(second)?;

        let SketchState::Open(profile) = &mut self.state else {
            return Err(no_open_sketch());
        };
        let engine_id = engine
            .add_keypoint_constraint(profile.engine_id, first_id, second_id)
            .map_err(|e| SessionError::from_engine("Add keypoint constraint", e))?;

        let applied = AppliedConstraint::Keypoint {
            first: (first.0.index, first.1),
            second: (second.0.index, second.1),
            engine_id,
        };
        profile.constraints.push(applied.clone());
        debug!("Added keypoint constraint");
        Ok(applied)
    }

    /// Validate and close the open sketch
    ///
    /// On success the profile is appended to the accumulated list. On failure
    /// the sketch stays open and the accumulated list is unchanged.
    pub fn close(&mut self, engine: &mut dyn CadEngine) -> SessionResult<ProfileHandle> {
        self.sync_document(engine)?;
        let (engine_id, flags) = match &self.state {
            SketchState::Open(profile) => {
                (profile.engine_id, ProfileValidator::flags(profile.has_axis()))
            }
            _ => return Err(no_open_sketch()),
        };

        if let Err(e) = engine.close_profile(engine_id, flags) {
            warn!(%flags, error = %e, "Profile closure failed");
            return Err(SessionError::from_engine("Close profile", e));
        }

        let SketchState::Open(mut profile) =
            std::mem::replace(&mut self.state, SketchState::NoSketch)
        else {
            return Err(no_open_sketch());
        };
        profile.flags = Some(flags);
        let handle = ProfileHandle {
            document: profile.document,
            epoch: self.epoch,
            serial: profile.serial,
        };
        self.accumulated.push(profile);
        self.state = SketchState::Closed(handle);

        info!(
            %flags,
            accumulated = self.accumulated.len(),
            "Closed sketch"
        );
        Ok(handle)
    }

    /// Clear the active profile, axis and accumulated profiles
    pub fn reset(&mut self) {
        self.state = SketchState::NoSketch;
        self.accumulated.clear();
        self.document = None;
        self.epoch += 1;
        info!(epoch = self.epoch, "Sketch session reset");
    }

    /// Clear accumulated profiles after a feature has used them
    ///
    /// A closed sketch returns to `NoSketch`. An open sketch is untouched.
    pub fn consume_profiles(&mut self) {
        let consumed = self.accumulated.len();
        self.accumulated.clear();
        if let SketchState::Closed(_) = self.state {
            self.state = SketchState::NoSketch;
        }
        debug!(consumed, "Consumed accumulated profiles");
    }

    // ============== Queries ==============

    /// Look up a closed profile by handle
    pub fn profile(&self, handle: ProfileHandle) -> SessionResult<&Profile> {
        self.check_live(handle.document, handle.epoch)?;
        self.accumulated
            .iter()
            .find(|profile| profile.serial == handle.serial)
            .ok_or_else(|| {
                SessionError::InvalidReference("Profile has been consumed or cleared".into())
            })
    }

    /// Get the sketch being edited, if any
    pub fn open_profile(&self) -> Option<&Profile> {
        match &self.state {
            SketchState::Open(profile) => Some(profile),
            _ => None,
        }
    }

    /// Get the most recently closed profile, if still active
    pub fn active_profile(&self) -> Option<&Profile> {
        match &self.state {
            SketchState::Closed(handle) => self.profile(*handle).ok(),
            _ => None,
        }
    }

    /// Get the active closed profile a single-profile feature consumes
    pub fn closed_profile(&self) -> SessionResult<&Profile> {
        match &self.state {
            SketchState::Closed(handle) => self.profile(*handle),
            SketchState::Open(_) => Err(SessionError::InvalidState(
                "The sketch is still open. Close it before creating a feature".into(),
            )),
            SketchState::NoSketch => Err(SessionError::InvalidState(
                "No closed profile. Create and close a sketch first".into(),
            )),
        }
    }

    /// Get the accumulated profiles in closing order
    pub fn accumulated_profiles(&self) -> &[Profile] {
        &self.accumulated
    }

    /// Select accumulated profiles by position, or all of them
    pub fn select_profiles(&self, indices: Option<&[usize]>) -> SessionResult<Vec<&Profile>> {
        let Some(indices) = indices else {
            return Ok(self.accumulated.iter().collect());
        };
        indices
            .iter()
            .map(|&index| {
                self.accumulated.get(index).ok_or_else(|| {
                    SessionError::InvalidReference(format!(
                        "Profile index {index} is out of range, {} profiles accumulated",
                        self.accumulated.len()
                    ))
                })
            })
            .collect()
    }

    /// Get a snapshot of the session state
    pub fn info(&self) -> SketchInfo {
        let profile = match &self.state {
            SketchState::NoSketch => None,
            SketchState::Open(profile) => Some(profile),
            SketchState::Closed(handle) => self.profile(*handle).ok(),
        };

        let mut entity_counts = BTreeMap::new();
        if let Some(profile) = profile {
            for drawn in &profile.entities {
                *entity_counts.entry(drawn.entity.kind()).or_insert(0) += 1;
            }
        }

        SketchInfo {
            state: self.status(),
            document: self.document,
            plane: profile.map(|p| p.plane.to_string()),
            plane_index: profile.map(|p| p.plane.index()),
            entity_counts,
            total_entities: profile.map_or(0, |p| p.entities.len()),
            construction_entities: profile.map_or(0, |p| p.construction_count()),
            constraints: profile.map_or(0, |p| p.constraints.len()),
            axis_set: profile.is_some_and(|p| p.has_axis()),
            flags: profile.and_then(|p| p.flags).map(|f| f.bits()),
            accumulated_profiles: self.accumulated.len(),
        }
    }
}
