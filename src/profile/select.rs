//! Profile selection.
//!
//! Maps a cargo classification plus an optional fill level onto a concrete
//! profile variant. Absence of a mapping is an expected outcome for ordinary
//! freight, not a fault.

use std::sync::Arc;

use tracing::warn;

use crate::error::SelectError;
use crate::profile::HazardProfile;
use crate::profile::catalog::{CatalogEntry, ProfileCatalog};

/// Fill levels below this always route to the partial tanker variant,
/// independent of the configured full threshold. The original routing was a
/// union of a "below 10%" check and a "below threshold" check; both arms are
/// preserved.
const LOW_FILL_CUTOFF: f32 = 0.1;

/// Which variant a selection resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedVariant {
    /// Tanker full-load variant.
    Full,
    /// Tanker partial-load variant.
    Partial,
    /// Fixed hazardous-material profile.
    Fixed,
}

/// A resolved profile selection.
#[derive(Debug, Clone)]
pub struct Selection {
    /// The selected profile, shared with the catalog.
    pub profile: Arc<HazardProfile>,

    /// The clamped fill level that applies to this incident.
    /// `1.0` for fixed entries, which ignore fill.
    pub fill_level: f32,

    /// Which variant was chosen.
    pub variant: SelectedVariant,
}

/// Selects the profile variant for a cargo key.
///
/// Tanker entries require a fill level and route on it; fixed entries map
/// deterministically and ignore any supplied fill. Out-of-range fill levels
/// are clamped to `[0, 1]` and logged as a warning rather than rejected.
///
/// # Errors
///
/// - [`SelectError::ProfileNotFound`] when the cargo key has no mapping
/// - [`SelectError::FillLevelRequired`] when a tanker entry gets no fill
pub fn select(
    catalog: &ProfileCatalog,
    cargo: &str,
    fill_level: Option<f32>,
) -> Result<Selection, SelectError> {
    let entry = catalog
        .entry(cargo)
        .ok_or_else(|| SelectError::ProfileNotFound {
            cargo: cargo.to_string(),
        })?;

    match entry {
        CatalogEntry::Fixed(profile) => Ok(Selection {
            profile: Arc::clone(profile),
            fill_level: 1.0,
            variant: SelectedVariant::Fixed,
        }),
        CatalogEntry::Tanker {
            full,
            partial,
            full_threshold,
        } => {
            let raw = fill_level.ok_or_else(|| SelectError::FillLevelRequired {
                cargo: cargo.to_string(),
            })?;
            let fill = clamp_fill(cargo, raw);
            let (profile, variant) = if fill < LOW_FILL_CUTOFF || fill < *full_threshold {
                (partial, SelectedVariant::Partial)
            } else {
                (full, SelectedVariant::Full)
            };
            Ok(Selection {
                profile: Arc::clone(profile),
                fill_level: fill,
                variant,
            })
        }
    }
}

/// Clamps a fill level to `[0, 1]`, logging out-of-range inputs.
#[must_use]
pub fn clamp_fill(cargo: &str, raw: f32) -> f32 {
    if (0.0..=1.0).contains(&raw) {
        raw
    } else {
        let clamped = raw.clamp(0.0, 1.0);
        warn!(cargo, raw, clamped, "fill level out of range, clamping");
        clamped
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ProfileCatalog {
        ProfileCatalog::builtin().unwrap()
    }

    #[test]
    fn test_unknown_cargo_not_found() {
        let err = select(&catalog(), "wool_bales", None).unwrap_err();
        assert!(matches!(err, SelectError::ProfileNotFound { .. }));
    }

    #[test]
    fn test_tanker_requires_fill() {
        let err = select(&catalog(), "fuel_tanker", None).unwrap_err();
        assert!(matches!(err, SelectError::FillLevelRequired { .. }));
    }

    #[test]
    fn test_tanker_threshold_boundary() {
        // Builtin threshold is 1.0: only an exact full load selects the
        // full variant.
        let catalog = catalog();
        let low = select(&catalog, "fuel_tanker", Some(0.09)).unwrap();
        assert_eq!(low.variant, SelectedVariant::Partial);

        let high = select(&catalog, "fuel_tanker", Some(0.99)).unwrap();
        assert_eq!(high.variant, SelectedVariant::Partial);

        let full = select(&catalog, "fuel_tanker", Some(1.0)).unwrap();
        assert_eq!(full.variant, SelectedVariant::Full);
        assert_eq!(full.profile.key, "fuel_tanker_full");
    }

    #[test]
    fn test_fill_clamped_above_one() {
        let selection = select(&catalog(), "fuel_tanker", Some(1.8)).unwrap();
        assert_eq!(selection.variant, SelectedVariant::Full);
        assert!((selection.fill_level - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_fill_clamped_below_zero() {
        let selection = select(&catalog(), "fuel_tanker", Some(-0.4)).unwrap();
        assert_eq!(selection.variant, SelectedVariant::Partial);
        assert!(selection.fill_level.abs() < f32::EPSILON);
    }

    #[test]
    fn test_fixed_entry_ignores_fill() {
        let catalog = catalog();
        let a = select(&catalog, "hazmat_class_7", None).unwrap();
        let b = select(&catalog, "hazmat_class_7", Some(0.02)).unwrap();
        assert_eq!(a.variant, SelectedVariant::Fixed);
        assert_eq!(a.profile.key, b.profile.key);
        assert_eq!(a.profile.key, "hazmat_radioactive");
    }

    #[test]
    fn test_hazmat_classes_map_deterministically() {
        let catalog = catalog();
        for (cargo, key) in [
            ("hazmat_class_3", "hazmat_flammable"),
            ("hazmat_class_6", "hazmat_toxic"),
            ("hazmat_class_8", "hazmat_corrosive"),
        ] {
            let selection = select(&catalog, cargo, None).unwrap();
            assert_eq!(selection.profile.key, key);
        }
    }
}
