//! Profile pack validation.
//!
//! Semantic validation performed on a fully deserialized [`ProfilePack`]
//! before it is merged into a catalog. Validation collects ALL issues
//! instead of stopping at the first, so a pack author gets one complete
//! report per load attempt.

use std::collections::HashSet;

use crate::config::{CargoEntryKind, ProfilePack};
use crate::error::{Severity, ValidationIssue};
use crate::profile::{ChainCount, HazardProfile, PhaseTemplate, Scalable, ZoneSpec};

// ============================================================================
// Public API
// ============================================================================

/// Result of profile pack validation.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Issues that prevent the pack from being used.
    pub errors: Vec<ValidationIssue>,

    /// Informational issues; the pack still loads.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Profile pack validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a pack and returns the collected report.
    #[must_use]
    pub fn validate(mut self, pack: &ProfilePack) -> ValidationReport {
        self.check_profiles(pack);
        self.check_entries(pack);
        ValidationReport {
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        });
    }

    fn warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
        });
    }

    // ------------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------------

    fn check_profiles(&mut self, pack: &ProfilePack) {
        let mut seen = HashSet::new();
        for (i, profile) in pack.profiles.iter().enumerate() {
            let path = format!("profiles[{i}]");
            if profile.key.is_empty() {
                self.error(&path, "profile key is empty");
            } else if !seen.insert(profile.key.as_str()) {
                self.error(&path, format!("duplicate profile key '{}'", profile.key));
            }
            self.check_profile(&path, profile);
        }
    }

    fn check_profile(&mut self, path: &str, profile: &HazardProfile) {
        if profile.label.is_empty() {
            self.warning(path, "label is empty");
        }
        if profile.phases.is_empty() {
            self.warning(path, "profile has no phases");
        }
        if let Some(smoke) = &profile.persistent_smoke {
            self.check_zone(&format!("{path}.persistent_smoke"), smoke);
        }
        for (i, phase) in profile.phases.iter().enumerate() {
            self.check_phase(&format!("{path}.phases[{i}]"), profile, phase);
        }
    }

    #[allow(clippy::cognitive_complexity)]
    fn check_phase(&mut self, path: &str, profile: &HazardProfile, phase: &PhaseTemplate) {
        if phase.name.is_empty() {
            self.error(path, "phase name is empty");
        }
        if !scalable_positive(phase.radius) {
            self.error(format!("{path}.radius"), "radius must be positive");
        }
        if !(0.0..=1.0).contains(&phase.camera_shake) {
            self.warning(
                format!("{path}.camera_shake"),
                "camera shake outside [0, 1]",
            );
        }

        if let Some(gate) = phase.min_fill_level {
            if !(0.0..=1.0).contains(&gate) {
                self.error(
                    format!("{path}.min_fill_level"),
                    "min_fill_level must be in [0, 1]",
                );
            }
            if !profile.scalable {
                self.warning(
                    format!("{path}.min_fill_level"),
                    "min_fill_level has no effect on a non-scalable profile",
                );
            }
        }

        if let Some(damage) = &phase.damage {
            if !scalable_positive(damage.radius) {
                self.error(format!("{path}.damage.radius"), "radius must be positive");
            }
            if !scalable_positive(damage.amount) {
                self.error(format!("{path}.damage.amount"), "amount must be positive");
            }
        }

        if let Some(zone) = &phase.zone {
            self.check_zone(&format!("{path}.zone"), zone);
        }

        match (&phase.chain, phase.delay_end_ms) {
            (Some(chain), Some(delay_end)) => {
                if delay_end < phase.delay_ms {
                    self.error(
                        format!("{path}.delay_end_ms"),
                        "chain window ends before it starts",
                    );
                }
                if phase.always_fire {
                    self.error(path, "chain phases cannot also be always_fire");
                }
                let ordered = match chain.count {
                    ChainCount::Fixed([min, max]) => min <= max,
                    ChainCount::Scaled { base: [min, max] } => min <= max,
                };
                if !ordered {
                    self.error(format!("{path}.chain.count"), "count range is inverted");
                }
                if chain.interval_ms[0] > chain.interval_ms[1] {
                    self.error(
                        format!("{path}.chain.interval_ms"),
                        "interval range is inverted",
                    );
                }
                if chain.interval_ms[0] == 0 {
                    self.warning(
                        format!("{path}.chain.interval_ms"),
                        "zero minimum interval allows simultaneous sub-events",
                    );
                }
                if chain.radius <= 0.0 {
                    self.error(
                        format!("{path}.chain.radius"),
                        "scatter radius must be positive",
                    );
                }
            }
            (Some(_), None) => {
                self.error(
                    format!("{path}.delay_end_ms"),
                    "chain phases require delay_end_ms",
                );
            }
            (None, Some(_)) => {
                self.warning(
                    format!("{path}.delay_end_ms"),
                    "delay_end_ms has no effect without a chain",
                );
            }
            (None, None) => {}
        }
    }

    fn check_zone(&mut self, path: &str, zone: &ZoneSpec) {
        if zone.tick_interval_ms == 0 {
            self.error(
                format!("{path}.tick_interval_ms"),
                "tick interval must be positive",
            );
        }
        if !scalable_positive(zone.inner.radius) {
            self.error(format!("{path}.inner.radius"), "radius must be positive");
        }
        if zone.inner.dps < 0.0 {
            self.error(format!("{path}.inner.dps"), "dps must not be negative");
        }
        if let Some(outer) = &zone.outer {
            if outer.dps < 0.0 {
                self.error(format!("{path}.outer.dps"), "dps must not be negative");
            }
            // Only comparable when both rings use the same representation;
            // a mixed fixed/scaled pair crosses over depending on fill.
            match (zone.inner.radius, outer.radius) {
                (Scalable::Fixed(inner), Scalable::Fixed(out))
                | (Scalable::Scaled { base: inner }, Scalable::Scaled { base: out }) => {
                    if out <= inner {
                        self.error(
                            format!("{path}.outer.radius"),
                            "outer radius must exceed inner radius",
                        );
                    }
                }
                _ => self.warning(
                    format!("{path}.outer.radius"),
                    "mixed fixed/scaled rings cannot be ordered statically",
                ),
            }
        }
        if let Some(traction) = zone.traction_factor {
            if !(0.0..=1.0).contains(&traction) {
                self.error(
                    format!("{path}.traction_factor"),
                    "traction factor must be in [0, 1]",
                );
            }
        }
    }

    // ------------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------------

    fn check_entries(&mut self, pack: &ProfilePack) {
        let mut seen = HashSet::new();
        for (i, entry) in pack.entries.iter().enumerate() {
            let path = format!("entries[{i}]");
            if entry.cargo.is_empty() {
                self.error(&path, "cargo key is empty");
            } else if !seen.insert(entry.cargo.as_str()) {
                self.error(&path, format!("duplicate cargo key '{}'", entry.cargo));
            }
            if let CargoEntryKind::Tanker { full_threshold, .. } = &entry.kind {
                if !(0.0..=1.0).contains(full_threshold) || *full_threshold == 0.0 {
                    self.error(
                        format!("{path}.full_threshold"),
                        "full threshold must be in (0, 1]",
                    );
                }
            }
        }
    }
}

fn scalable_positive(field: Scalable) -> bool {
    match field {
        Scalable::Fixed(v) | Scalable::Scaled { base: v } => v > 0.0,
    }
}

// ============================================================================
// Tests
// ============================================================================
