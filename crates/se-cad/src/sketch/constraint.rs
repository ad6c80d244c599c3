//! Sketch Constraints
//!
//! Geometric relations applied between entities of the open profile.

use serde::{Deserialize, Serialize};

use super::entity::EntityKind;
use crate::error::{SessionError, SessionResult};
use crate::kernel::ConstraintId;

/// A geometric relation between sketch entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    // ============== Single Entity ==============
    /// A line is parallel to the X axis
    Horizontal,
    /// A line is parallel to the Y axis
    Vertical,
    /// An entity cannot move
    Fixed,

    // ============== Entity Pairs ==============
    Parallel,
    Perpendicular,
    Collinear,
    /// Equal length for lines, equal radius for curves
    Equal,
    Tangent,
    Concentric,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 9] = [
        ConstraintKind::Horizontal,
        ConstraintKind::Vertical,
        ConstraintKind::Fixed,
        ConstraintKind::Parallel,
        ConstraintKind::Perpendicular,
        ConstraintKind::Collinear,
        ConstraintKind::Equal,
        ConstraintKind::Tangent,
        ConstraintKind::Concentric,
    ];

    /// Get the wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Horizontal => "horizontal",
            ConstraintKind::Vertical => "vertical",
            ConstraintKind::Fixed => "fixed",
            ConstraintKind::Parallel => "parallel",
            ConstraintKind::Perpendicular => "perpendicular",
            ConstraintKind::Collinear => "collinear",
            ConstraintKind::Equal => "equal",
            ConstraintKind::Tangent => "tangent",
            ConstraintKind::Concentric => "concentric",
        }
    }

    /// Parse a kind name, ignoring case
    pub fn parse(name: &str) -> SessionResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                SessionError::invalid_parameter(
                    "constraint_type",
                    format!(
                        "unknown constraint '{name}', expected one of {}",
                        Self::ALL.map(|k| k.as_str()).join(", ")
                    ),
                )
            })
    }

    /// Number of entities the relation takes
    pub fn arity(&self) -> usize {
        match self {
            ConstraintKind::Horizontal | ConstraintKind::Vertical | ConstraintKind::Fixed => 1,
            _ => 2,
        }
    }

    /// Check if an entity kind can take part in this relation
    pub fn accepts(&self, kind: EntityKind) -> bool {
        use EntityKind::*;
        match self {
            ConstraintKind::Horizontal
            | ConstraintKind::Vertical
            | ConstraintKind::Parallel
            | ConstraintKind::Perpendicular
            | ConstraintKind::Collinear => kind == Line,
            ConstraintKind::Concentric => matches!(kind, Circle | Arc | Ellipse),
            ConstraintKind::Equal | ConstraintKind::Tangent => kind != Point,
            ConstraintKind::Fixed => true,
        }
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A characteristic point of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keypoint {
    Start,
    End,
    Center,
}

impl Keypoint {
    /// Check if an entity kind has this keypoint
    pub fn applies_to(&self, kind: EntityKind) -> bool {
        use EntityKind::*;
        match self {
            Keypoint::Start | Keypoint::End => matches!(kind, Line | Arc | Spline),
            Keypoint::Center => matches!(kind, Circle | Arc | Ellipse | Point),
        }
    }
}

/// A constraint applied to the open profile
///
/// Entities are referenced by their position in the profile.
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedConstraint {
    Relation {
        kind: ConstraintKind,
        entities: Vec<usize>,
        engine_id: ConstraintId,
    },
    /// Two keypoints made coincident
    Keypoint {
        first: (usize, Keypoint),
        second: (usize, Keypoint),
        engine_id: ConstraintId,
    },
}

impl AppliedConstraint {
    /// Get the engine-side id
    pub fn engine_id(&self) -> ConstraintId {
        match self {
            AppliedConstraint::Relation { engine_id, .. }
            | AppliedConstraint::Keypoint { engine_id, .. } => *engine_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!(
            ConstraintKind::parse("Horizontal").unwrap(),
            ConstraintKind::Horizontal
        );
        assert_eq!(
            ConstraintKind::parse("PARALLEL").unwrap(),
            ConstraintKind::Parallel
        );
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = ConstraintKind::parse("glued").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(err.to_string().contains("horizontal"));
    }

    #[test]
    fn test_line_relations_reject_circles() {
        assert!(ConstraintKind::Parallel.accepts(EntityKind::Line));
        assert!(!ConstraintKind::Parallel.accepts(EntityKind::Circle));
        assert!(ConstraintKind::Concentric.accepts(EntityKind::Arc));
        assert!(!ConstraintKind::Tangent.accepts(EntityKind::Point));
        assert_eq!(ConstraintKind::Vertical.arity(), 1);
        assert_eq!(ConstraintKind::Equal.arity(), 2);
    }

    #[test]
    fn test_keypoints_by_entity_kind() {
        assert!(Keypoint::Start.applies_to(EntityKind::Line));
        assert!(!Keypoint::Start.applies_to(EntityKind::Circle));
        assert!(Keypoint::Center.applies_to(EntityKind::Arc));
        assert!(!Keypoint::Center.applies_to(EntityKind::Line));
    }
}
