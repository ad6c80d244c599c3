//! Sketch Session and Feature Dispatch for CAD Automation
//!
//! This crate provides:
//! - A sketch/profile state machine with geometric constraints, an axis of
//!   revolution and accumulated profiles for multi-section features
//! - Closure flag selection for profile validation
//! - Typed feature requests for every supported family with a dispatcher that
//!   validates before it calls the engine
//! - An abstract CAD engine trait with a recording mock

pub mod config;
pub mod error;
pub mod feature;
pub mod kernel;
pub mod sketch;

// Re-exports for convenience
pub use config::{ConfigError, SessionConfig};
pub use error::{ErrorKind, SessionError, SessionResult};
pub use feature::{
    FeatureCreated, FeatureFamily, FeatureInputs, FeatureRequest, ProfileUse, dispatch,
    dispatch_args, error_record,
};
pub use kernel::{CadEngine, DocumentId, EngineError, MockEngine, NullEngine};
pub use sketch::{
    AppliedConstraint, ConstraintKind, EntityHandle, EntityKind, Keypoint, PlaneRef,
    ProfileHandle, ProfileValidator, ReferencePlane, SketchEntity, SketchHandle, SketchInfo,
    SketchSession, SketchStatus, ValidationFlags,
};
