//! CAD engine trait definitions
//!
//! The session and the feature dispatcher reach the external CAD application
//! only through [`CadEngine`]. Every method is a blocking round trip.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::feature::{FeatureInputs, FeatureRequest};
use crate::sketch::{ConstraintKind, Keypoint, SketchEntity, ValidationFlags};

/// Identifier of a document open in the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Create a new random document ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declare an opaque engine-side identifier
macro_rules! engine_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

engine_id!(
    /// A reference plane resolved by the engine
    PlaneId
);
engine_id!(
    /// A profile object owned by the engine
    EngineProfileId
);
engine_id!(
    /// A 2D entity inside an engine profile
    EngineEntityId
);
engine_id!(
    /// A reference axis created from a profile line
    AxisId
);
engine_id!(
    /// A geometric relation inside an engine profile
    ConstraintId
);
engine_id!(
    /// A feature created in the model tree
    FeatureId
);

/// Error type for engine round trips
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Profile rejected: {0}")]
    ProfileRejected(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Engine not available: {0}")]
    NotAvailable(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Interface to the external CAD application
///
/// Implementations translate each call into the application's automation
/// interface. The session never caches engine state beyond the ids returned here.
pub trait CadEngine {
    /// Get the name of this engine
    fn name(&self) -> &str;

    /// Check if the engine is connected and usable
    fn is_available(&self) -> bool;

    /// Get the document the engine currently has active
    fn active_document(&mut self) -> EngineResult<DocumentId>;

    /// Resolve a 1-based reference plane index
    ///
    /// Indices 1, 2 and 3 are the Top, Front and Right base planes. Higher
    /// indices address user-created reference planes.
    fn resolve_plane(&mut self, index: u32) -> EngineResult<PlaneId>;

    /// Create an empty profile on a plane
    fn create_profile(&mut self, plane: PlaneId) -> EngineResult<EngineProfileId>;

    /// Add a 2D entity to a profile
    fn add_entity(
        &mut self,
        profile: EngineProfileId,
        entity: &SketchEntity,
    ) -> EngineResult<EngineEntityId>;

    /// Mark a profile entity as construction geometry
    fn mark_construction(
        &mut self,
        profile: EngineProfileId,
        entity: EngineEntityId,
    ) -> EngineResult<()>;

    /// Create a reference axis from a profile line
    fn set_revolution_axis(
        &mut self,
        profile: EngineProfileId,
        entity: EngineEntityId,
    ) -> EngineResult<AxisId>;

    /// Apply a geometric relation to profile entities
    ///
    /// # Arguments
    /// * `profile` - The open profile holding the entities
    /// * `kind` - The relation to apply
    /// * `entities` - Entities in the order the relation expects
    fn add_constraint(
        &mut self,
        profile: EngineProfileId,
        kind: ConstraintKind,
        entities: &[EngineEntityId],
    ) -> EngineResult<ConstraintId>;

    /// Make a keypoint of one entity coincide with a keypoint of another
    fn add_keypoint_constraint(
        &mut self,
        profile: EngineProfileId,
        first: (EngineEntityId, Keypoint),
        second: (EngineEntityId, Keypoint),
    ) -> EngineResult<ConstraintId>;

    /// Validate and close a profile
    ///
    /// # Arguments
    /// * `profile` - The profile to close
    /// * `flags` - Validation requirements the closed profile must satisfy
    fn close_profile(&mut self, profile: EngineProfileId, flags: ValidationFlags)
    -> EngineResult<()>;

    /// Create a feature from a typed request
    ///
    /// # Arguments
    /// * `request` - Family, variant and parameters of the feature
    /// * `inputs` - Closed profiles the variant consumes
    fn create_feature(
        &mut self,
        request: &FeatureRequest,
        inputs: &FeatureInputs,
    ) -> EngineResult<FeatureId>;
}

/// A placeholder engine used when no CAD application is connected
pub struct NullEngine;

impl NullEngine {
    fn unavailable<T>() -> EngineResult<T> {
        Err(EngineError::NotAvailable(
            "No CAD application is connected".into(),
        ))
    }
}

impl CadEngine for NullEngine {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn active_document(&mut self) -> EngineResult<DocumentId> {
        Self::unavailable()
    }

    fn resolve_plane(&mut self, _index: u32) -> EngineResult<PlaneId> {
        Self::unavailable()
    }

    fn create_profile(&mut self, _plane: PlaneId) -> EngineResult<EngineProfileId> {
        Self::unavailable()
    }

    fn add_entity(
        &mut self,
        _profile: EngineProfileId,
        _entity: &SketchEntity,
    ) -> EngineResult<EngineEntityId> {
        Self::unavailable()
    }

    fn mark_construction(
        &mut self,
        _profile: EngineProfileId,
        _entity: EngineEntityId,
    ) -> EngineResult<()> {
        Self::unavailable()
    }

    fn set_revolution_axis(
        &mut self,
        _profile: EngineProfileId,
        _entity: EngineEntityId,
    ) -> EngineResult<AxisId> {
        Self::unavailable()
    }

    fn add_constraint(
        &mut self,
        _profile: EngineProfileId,
        _kind: ConstraintKind,
        _entities: &[EngineEntityId],
    ) -> EngineResult<ConstraintId> {
        Self::unavailable()
    }

    fn add_keypoint_constraint(
        &mut self,
        _profile: EngineProfileId,
        _first: (EngineEntityId, Keypoint),
        _second: (EngineEntityId, Keypoint),
    ) -> EngineResult<ConstraintId> {
        Self::unavailable()
    }

    fn close_profile(
        &mut self,
        _profile: EngineProfileId,
        _flags: ValidationFlags,
    ) -> EngineResult<()> {
        Self::unavailable()
    }

    fn create_feature(
        &mut self,
        _request: &FeatureRequest,
        _inputs: &FeatureInputs,
    ) -> EngineResult<FeatureId> {
        Self::unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_engine_is_unavailable() {
        let mut engine = NullEngine;
        assert!(!engine.is_available());
        assert!(matches!(
            engine.active_document(),
            Err(EngineError::NotAvailable(_))
        ));
        assert!(matches!(
            engine.resolve_plane(1),
            Err(EngineError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_engine_id_serializes_transparently() {
        let json = serde_json::to_string(&FeatureId(7)).unwrap();
        assert_eq!(json, "7");
        assert_eq!(PlaneId(3).to_string(), "3");
    }
}
