//! Sketch planes

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// One of the three base reference planes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferencePlane {
    /// XZ plane (Top view)
    Top,
    /// XY plane (Front view)
    Front,
    /// YZ plane (Right view)
    Right,
}

impl ReferencePlane {
    /// Get the 1-based engine index of the plane
    pub fn index(&self) -> u32 {
        match self {
            ReferencePlane::Top => 1,
            ReferencePlane::Front => 2,
            ReferencePlane::Right => 3,
        }
    }

    /// Get the display name of the plane
    pub fn name(&self) -> &'static str {
        match self {
            ReferencePlane::Top => "Top (XZ)",
            ReferencePlane::Front => "Front (XY)",
            ReferencePlane::Right => "Right (YZ)",
        }
    }

    /// Get all base planes
    pub fn all() -> [ReferencePlane; 3] {
        [
            ReferencePlane::Top,
            ReferencePlane::Front,
            ReferencePlane::Right,
        ]
    }
}

/// A plane a sketch can be opened on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneRef {
    /// A base plane by name
    Base(ReferencePlane),
    /// Any plane by 1-based index, including user reference planes
    Index(u32),
}

impl PlaneRef {
    /// Get the 1-based engine index
    pub fn index(&self) -> u32 {
        match self {
            PlaneRef::Base(plane) => plane.index(),
            PlaneRef::Index(index) => *index,
        }
    }
}

impl From<ReferencePlane> for PlaneRef {
    fn from(plane: ReferencePlane) -> Self {
        PlaneRef::Base(plane)
    }
}

impl FromStr for PlaneRef {
    type Err = SessionError;

    /// Accepts `Top`/`XZ`, `Front`/`XY`, `Right`/`YZ` or a 1-based index
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "top" | "xz" => Ok(PlaneRef::Base(ReferencePlane::Top)),
            "front" | "xy" => Ok(PlaneRef::Base(ReferencePlane::Front)),
            "right" | "yz" => Ok(PlaneRef::Base(ReferencePlane::Right)),
            other => other.parse::<u32>().map(PlaneRef::Index).map_err(|_| {
                SessionError::InvalidReference(format!(
                    "Unknown plane '{trimmed}'. Use Top/XZ, Front/XY, Right/YZ or a plane index"
                ))
            }),
        }
    }
}

impl std::fmt::Display for PlaneRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaneRef::Base(plane) => f.write_str(plane.name()),
            PlaneRef::Index(index) => write!(f, "Plane {index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_plane_names() {
        assert_eq!("Top".parse::<PlaneRef>().unwrap().index(), 1);
        assert_eq!("xy".parse::<PlaneRef>().unwrap().index(), 2);
        assert_eq!("YZ".parse::<PlaneRef>().unwrap().index(), 3);
        assert_eq!("5".parse::<PlaneRef>().unwrap(), PlaneRef::Index(5));
    }

    #[test]
    fn test_parse_unknown_plane() {
        let err = "Diagonal".parse::<PlaneRef>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[test]
    fn test_base_plane_indices_are_distinct() {
        let indices: Vec<u32> = ReferencePlane::all().iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
