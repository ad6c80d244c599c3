//! Shared Feature Parameters
//!
//! Parameter types and checks used by more than one feature family.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ProfileUse;
use crate::error::{SessionError, SessionResult};

/// Side of the profile plane a feature grows towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Along the plane normal
    #[default]
    Normal,
    /// Against the plane normal
    Reverse,
    /// Half the extent on each side
    Symmetric,
    /// The full extent on each side
    Both,
}

impl Direction {
    /// Get the wire name of this direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Normal => "Normal",
            Direction::Reverse => "Reverse",
            Direction::Symmetric => "Symmetric",
            Direction::Both => "Both",
        }
    }
}

/// Winding hand of a helix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Hand {
    #[default]
    Right,
    Left,
}

impl Hand {
    /// Get the wire name of this hand
    pub fn as_str(&self) -> &'static str {
        match self {
            Hand::Right => "Right",
            Hand::Left => "Left",
        }
    }
}

/// Typed parameter set of one feature family
///
/// `M` is the family's method enum. A parameter struct may serve several
/// families when their inputs coincide.
pub trait FeatureParams<M: Copy> {
    /// Check numeric members before the engine is called
    ///
    /// Every numeric member is checked for finiteness whatever the variant.
    /// Range checks only apply to members the variant uses.
    fn check(&self, method: M) -> SessionResult<()>;

    /// Session profiles the variant consumes
    fn profile_use(&self, method: M) -> ProfileUse;

    /// Resolved parameters echoed back in the creation record
    fn echo(&self, method: M) -> Map<String, Value>;
}

/// Builder for the parameter echo of a creation record
#[derive(Debug, Default)]
pub struct Echo(Map<String, Value>);

impl Echo {
    /// Create an empty echo
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolved parameter
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Add a parameter only when it was supplied
    pub fn with_opt<T: Into<Value>>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    /// Add a 3D point as `[x, y, z]`
    pub fn with_point(self, key: &str, x: f64, y: f64, z: f64) -> Self {
        self.with(key, vec![x, y, z])
    }

    /// Finish the echo
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Reject a 1-based plane index that does not address a plane
pub fn ensure_plane_index(name: &str, index: u32) -> SessionResult<()> {
    if index >= 1 {
        Ok(())
    } else {
        Err(SessionError::invalid_parameter(
            name,
            "plane indices are 1-based (1 = Top, 2 = Front, 3 = Right)",
        ))
    }
}

/// Reject a ratio outside `[0, 1]`
pub fn ensure_ratio(name: &str, value: f64) -> SessionResult<()> {
    crate::error::ensure_finite(name, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SessionError::invalid_parameter(
            name,
            format!("must lie between 0 and 1, got {value}"),
        ))
    }
}

/// Reject an angle outside `(0, 360]` degrees
pub fn ensure_sweep_angle(name: &str, degrees: f64) -> SessionResult<()> {
    crate::error::ensure_finite(name, degrees)?;
    if degrees > 0.0 && degrees <= 360.0 {
        Ok(())
    } else {
        Err(SessionError::invalid_parameter(
            name,
            format!("must be in (0, 360] degrees, got {degrees}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_rejects_unknown_strings() {
        let dir: Direction = serde_json::from_str("\"Reverse\"").unwrap();
        assert_eq!(dir, Direction::Reverse);
        assert!(serde_json::from_str::<Direction>("\"Sideways\"").is_err());
    }

    #[test]
    fn test_echo_builder() {
        let echo = Echo::new()
            .with("distance", 0.05)
            .with_opt("revolutions", None::<f64>)
            .with_point("point1", 0.0, 1.0, 2.0)
            .into_map();
        assert_eq!(echo.len(), 2);
        assert_eq!(echo["distance"], Value::from(0.05));
        assert_eq!(echo["point1"], serde_json::json!([0.0, 1.0, 2.0]));
    }

    #[test]
    fn test_range_helpers() {
        assert!(ensure_plane_index("plane_index", 0).is_err());
        assert!(ensure_plane_index("plane_index", 4).is_ok());
        assert!(ensure_ratio("ratio", 0.5).is_ok());
        assert!(ensure_ratio("ratio", 1.5).is_err());
        assert!(ensure_sweep_angle("angle", 360.0).is_ok());
        assert!(ensure_sweep_angle("angle", 0.0).is_err());
    }
}
