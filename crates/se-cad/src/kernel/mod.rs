//! CAD engine abstraction
//!
//! [`CadEngine`] is the only way the session reaches the CAD application.
//! [`MockEngine`] is an in-process double and [`NullEngine`] stands in when
//! nothing is connected.

mod mock;
mod traits;

pub use mock::{EngineCall, MockEngine};
pub use traits::{
    AxisId, CadEngine, ConstraintId, DocumentId, EngineEntityId, EngineError, EngineProfileId,
    EngineResult, FeatureId, NullEngine, PlaneId,
};
