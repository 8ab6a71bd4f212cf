//! Profile pack configuration.
//!
//! A profile pack is a YAML document carrying hazard profiles plus the cargo
//! entries that map cargo keys onto them. Packs are parsed by
//! [`loader`], checked by [`validation`], and merged into a
//! [`crate::profile::catalog::ProfileCatalog`].

use serde::{Deserialize, Serialize};

use crate::profile::HazardProfile;

pub mod loader;
pub mod validation;

// ============================================================================
// Pack document
// ============================================================================

/// Root document of a profile pack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePack {
    /// Cargo key → profile mappings.
    #[serde(default)]
    pub entries: Vec<CargoEntrySpec>,

    /// Profile definitions referenced by the entries.
    #[serde(default)]
    pub profiles: Vec<HazardProfile>,
}

/// One cargo mapping inside a pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CargoEntrySpec {
    /// Cargo classification key (e.g., `fuel_tanker`, `hazmat_class_7`).
    pub cargo: String,

    /// How the cargo resolves to a profile.
    #[serde(flatten)]
    pub kind: CargoEntryKind,
}

/// Resolution strategy for a cargo entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CargoEntryKind {
    /// Tanker cargo: routed to a full or partial variant by fill level.
    Tanker {
        /// Profile key used at (effectively) full load.
        full: String,
        /// Profile key used below the full threshold.
        partial: String,
        /// Fill levels below this select the partial variant.
        #[serde(default = "default_full_threshold")]
        full_threshold: f32,
    },

    /// Classified hazardous material: one fixed, non-scalable profile.
    Fixed {
        /// Profile key.
        profile: String,
    },
}

const fn default_full_threshold() -> f32 {
    1.0
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tanker_entry_yaml() {
        let yaml = r"
cargo: fuel_tanker
kind: tanker
full: fuel_tanker_full
partial: fuel_tanker_partial
";
        let entry: CargoEntrySpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entry.cargo, "fuel_tanker");
        match entry.kind {
            CargoEntryKind::Tanker { full_threshold, .. } => {
                assert!((full_threshold - 1.0).abs() < f32::EPSILON);
            }
            CargoEntryKind::Fixed { .. } => panic!("expected tanker entry"),
        }
    }

    #[test]
    fn test_fixed_entry_yaml() {
        let yaml = r"
cargo: hazmat_class_7
kind: fixed
profile: hazmat_radioactive
";
        let entry: CargoEntrySpec = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(entry.kind, CargoEntryKind::Fixed { ref profile } if profile == "hazmat_radioactive"));
    }

    #[test]
    fn test_empty_pack() {
        let pack: ProfilePack = serde_yaml::from_str("{}").unwrap();
        assert!(pack.entries.is_empty());
        assert!(pack.profiles.is_empty());
    }
}
