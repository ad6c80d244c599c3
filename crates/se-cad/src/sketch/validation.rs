//! Profile closure validation
//!
//! The engine validates a profile when it is closed. Which checks it runs is
//! selected by a bitfield of [`ValidationFlags`].

use serde::{Deserialize, Serialize};

/// Bitfield of profile closure requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationFlags(u32);

impl ValidationFlags {
    /// No requirements beyond the engine defaults
    pub const DEFAULT: Self = Self(0);
    /// The profile must form a closed loop
    pub const CLOSED: Self = Self(1);
    /// The profile must contain a single loop
    pub const SINGLE: Self = Self(4);
    pub const NO_SELF_INTERSECTION: Self = Self(8);
    /// The profile must carry a reference axis
    pub const REF_AXIS_REQUIRED: Self = Self(16);
    /// The profile must not cross its reference axis
    pub const NO_REF_AXIS_INTERSECTION: Self = Self(32);
    pub const ALLOW_NESTED: Self = Self(8192);

    /// Flags for a profile that will be revolved
    pub const FOR_REVOLVE: Self = Self(Self::CLOSED.0 | Self::REF_AXIS_REQUIRED.0);

    /// Create flags from raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Get the raw bits
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Check if every flag in `other` is set
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ValidationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Display for ValidationFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Selects closure flags for a profile
pub struct ProfileValidator;

impl ProfileValidator {
    /// Get the flags a profile is closed with
    ///
    /// The presence of an axis of revolution is the only input.
    pub fn flags(axis_set: bool) -> ValidationFlags {
        if axis_set {
            ValidationFlags::FOR_REVOLVE
        } else {
            ValidationFlags::DEFAULT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(ValidationFlags::DEFAULT.bits(), 0);
        assert_eq!(ValidationFlags::FOR_REVOLVE.bits(), 17);
        assert_eq!(
            ValidationFlags::CLOSED | ValidationFlags::REF_AXIS_REQUIRED,
            ValidationFlags::FOR_REVOLVE
        );
    }

    #[test]
    fn test_validator_is_exhaustive_and_exclusive() {
        let without = ProfileValidator::flags(false);
        let with = ProfileValidator::flags(true);
        assert_eq!(without, ValidationFlags::DEFAULT);
        assert_eq!(with, ValidationFlags::FOR_REVOLVE);
        assert_ne!(without, with);
        assert!(with.contains(ValidationFlags::REF_AXIS_REQUIRED));
        assert!(!without.contains(ValidationFlags::REF_AXIS_REQUIRED));
    }
}
