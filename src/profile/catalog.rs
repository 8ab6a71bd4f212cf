//! Immutable catalog of hazard profiles.
//!
//! Built-in profile packs are embedded in the binary at compile time and
//! merged with any runtime-loaded packs into a [`ProfileCatalog`]. The
//! catalog is constructed once at process start, wrapped in an `Arc`, and
//! shared read-only by every incident; nothing is copied per incident.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::validation::Validator;
use crate::config::{CargoEntryKind, ProfilePack};
use crate::error::ConfigError;
use crate::profile::HazardProfile;

/// Built-in profile packs: `(pack name, embedded YAML)`.
const BUILTIN_PACKS: [(&str, &str); 2] = [
    ("fuel_tanker", include_str!("../../profiles/fuel_tanker.yaml")),
    ("hazmat", include_str!("../../profiles/hazmat.yaml")),
];

// ============================================================================
// Catalog
// ============================================================================

/// A cargo key's resolution target inside the catalog.
#[derive(Debug, Clone)]
pub enum CatalogEntry {
    /// Tanker cargo routed by fill level.
    Tanker {
        /// Variant used at (effectively) full load.
        full: Arc<HazardProfile>,
        /// Variant used below the full threshold.
        partial: Arc<HazardProfile>,
        /// Fill levels below this select the partial variant.
        full_threshold: f32,
    },
    /// One fixed profile, fill level ignored.
    Fixed(Arc<HazardProfile>),
}

/// Read-only registry mapping cargo keys to hazard profiles.
#[derive(Debug, Default)]
pub struct ProfileCatalog {
    entries: HashMap<String, CatalogEntry>,
    profiles: HashMap<String, Arc<HazardProfile>>,
}

impl ProfileCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the catalog from the embedded built-in packs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an embedded pack fails to parse or validate.
    /// The built-in packs are covered by tests, so this only fires when a
    /// pack edit slipped past them.
    pub fn builtin() -> Result<Self, ConfigError> {
        let mut catalog = Self::new();
        for (name, yaml) in BUILTIN_PACKS {
            let pack: ProfilePack =
                serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
                    path: name.into(),
                    message: e.to_string(),
                })?;
            catalog.merge_pack(name, pack)?;
        }
        Ok(catalog)
    }

    /// Validates a pack and merges its profiles and entries into the catalog.
    ///
    /// Later packs may reference profiles from earlier packs; a cargo entry
    /// defined twice is rejected by validation of the merged state here.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` when the pack is invalid, or
    /// when an entry references a profile key that exists in neither this
    /// pack nor the catalog.
    pub fn merge_pack(&mut self, name: &str, pack: ProfilePack) -> Result<(), ConfigError> {
        let report = Validator::new().validate(&pack);
        for warning in &report.warnings {
            tracing::warn!(pack = name, %warning, "profile pack warning");
        }
        if report.has_errors() {
            return Err(ConfigError::ValidationError {
                path: name.to_string(),
                errors: report.errors,
            });
        }

        for profile in pack.profiles {
            if self.profiles.contains_key(&profile.key) {
                return Err(ConfigError::InvalidValue {
                    field: "profiles.key".to_string(),
                    value: profile.key,
                    expected: "a profile key not already in the catalog".to_string(),
                });
            }
            self.profiles
                .insert(profile.key.clone(), Arc::new(profile));
        }

        for entry in pack.entries {
            if self.entries.contains_key(&entry.cargo) {
                return Err(ConfigError::InvalidValue {
                    field: "entries.cargo".to_string(),
                    value: entry.cargo,
                    expected: "a cargo key not already in the catalog".to_string(),
                });
            }
            let resolved = match entry.kind {
                CargoEntryKind::Tanker {
                    full,
                    partial,
                    full_threshold,
                } => CatalogEntry::Tanker {
                    full: self.resolve_profile(&full)?,
                    partial: self.resolve_profile(&partial)?,
                    full_threshold,
                },
                CargoEntryKind::Fixed { profile } => {
                    CatalogEntry::Fixed(self.resolve_profile(&profile)?)
                }
            };
            self.entries.insert(entry.cargo, resolved);
        }

        Ok(())
    }

    fn resolve_profile(&self, key: &str) -> Result<Arc<HazardProfile>, ConfigError> {
        self.profiles
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "entries".to_string(),
                value: key.to_string(),
                expected: "a profile key defined in this or an earlier pack".to_string(),
            })
    }

    /// Looks up the catalog entry for a cargo key.
    #[must_use]
    pub fn entry(&self, cargo: &str) -> Option<&CatalogEntry> {
        self.entries.get(cargo)
    }

    /// Looks up a profile by its own key (admin tooling, tests).
    #[must_use]
    pub fn profile(&self, key: &str) -> Option<&Arc<HazardProfile>> {
        self.profiles.get(key)
    }

    /// Number of cargo entries in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog has no cargo entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the known cargo keys.
    pub fn cargo_keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// ============================================================================
// Tests
// ============================================================================
