//! Hazard profile data model.
//!
//! A [`HazardProfile`] is an immutable, ordered script of [`PhaseTemplate`]s
//! describing what happens when a particular cargo fails catastrophically.
//! Profiles are deserialized from YAML profile packs, loaded once into a
//! [`catalog::ProfileCatalog`], and shared by reference across every incident
//! that uses them; only the resolved per-incident copies
//! ([`crate::scale::ResolvedPhase`]) are owned by a running incident.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod catalog;
pub mod select;

pub use catalog::ProfileCatalog;

// ============================================================================
// Scalable fields
// ============================================================================

/// A numeric field that is either fixed or scaled by the fill level.
///
/// Scaled fields resolve to `base * max(fill, 0.1)`; the 0.1 floor guarantees
/// a non-zero minimal effect even at a near-empty fill. In YAML a fixed field
/// is a bare number and a scaled field is `{ base: <number> }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalable {
    /// A concrete value, unaffected by fill level.
    Fixed(f32),
    /// A base value multiplied by the effective scale factor.
    Scaled {
        /// Value at full fill.
        base: f32,
    },
}

impl Scalable {
    /// Resolves this field against an effective scale factor.
    ///
    /// The caller is responsible for flooring the scale at 0.1; this method
    /// applies the factor as given so it stays a pure multiply.
    #[must_use]
    pub const fn resolve(self, scale: f32) -> f32 {
        match self {
            Self::Fixed(value) => value,
            Self::Scaled { base } => base * scale,
        }
    }
}

/// A chain sub-event count range, either fixed or scaled element-wise.
///
/// Scaled ranges resolve each bound as `floor(base * scale)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainCount {
    /// Fixed inclusive `[min, max]` range.
    Fixed([u32; 2]),
    /// Base `[min, max]` range scaled element-wise and floored.
    Scaled {
        /// Range at full fill.
        base: [f32; 2],
    },
}

impl ChainCount {
    /// Resolves this range against an effective scale factor.
    #[must_use]
    pub fn resolve(self, scale: f32) -> [u32; 2] {
        match self {
            Self::Fixed(range) => range,
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Self::Scaled { base } => [
                (base[0] * scale).floor().max(0.0) as u32,
                (base[1] * scale).floor().max(0.0) as u32,
            ],
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// An immutable hazard profile: identity plus an ordered phase script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardProfile {
    /// Unique profile key (e.g., `fuel_tanker_full`).
    pub key: String,

    /// Human-readable label for logs and admin tooling.
    pub label: String,

    /// Whether scaled fields in this profile respond to fill level.
    #[serde(default)]
    pub scalable: bool,

    /// Dispatch alert requested when an incident using this profile starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertSpec>,

    /// Lingering smoke zone registered at the incident origin on start,
    /// independent of any per-phase zones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_smoke: Option<ZoneSpec>,

    /// Ordered phase templates. Delays are relative to incident start and
    /// need not be non-decreasing; phases may overlap.
    pub phases: Vec<PhaseTemplate>,
}

/// Dispatch alert request attached to a profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertSpec {
    /// Alert priority forwarded to the (external) dispatch collaborator.
    pub priority: u8,
}

// ============================================================================
// Phase templates
// ============================================================================

/// One scheduled step of a hazard timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTemplate {
    /// Phase name, carried through to emitted events.
    pub name: String,

    /// Fire offset in milliseconds from incident start.
    #[serde(default)]
    pub delay_ms: u64,

    /// End of the chain window; required for chain phases,
    /// must satisfy `delay_end_ms >= delay_ms`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_end_ms: Option<u64>,

    /// Bypass the `min_fill_level` gate entirely.
    #[serde(default)]
    pub always_fire: bool,

    /// Chain descriptor; present only on chain phases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<ChainSpec>,

    /// Effect radius.
    pub radius: Scalable,

    /// Camera shake intensity in `[0, 1]`.
    #[serde(default)]
    pub camera_shake: f32,

    /// Particle/sound descriptors rendered by the presentation layer.
    #[serde(default)]
    pub effect: EffectSpec,

    /// One-time direct damage dealt when the phase fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<DamageSpec>,

    /// Hazard zone spawned when the phase fires (at most one per phase).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZoneSpec>,

    /// Phase is skipped when the fill level is below this value
    /// (scalable profiles only); ignored when `always_fire` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_fill_level: Option<f32>,
}

/// Presentation descriptors for a phase: which effect to render and with
/// what assets. Opaque to this crate beyond pass-through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectSpec {
    /// Effect kind (e.g., `explosion_large`, `fireball`).
    #[serde(default)]
    pub kind: String,

    /// Particle system names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub particles: Vec<String>,

    /// Sound bank names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sounds: Vec<String>,
}

/// One-time direct damage dealt by a phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DamageSpec {
    /// Damage radius around the epicenter.
    pub radius: Scalable,
    /// Damage amount at the epicenter.
    pub amount: Scalable,
}

/// Randomized secondary-detonation burst attached to a chain phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChainSpec {
    /// Inclusive range for the number of sub-events.
    pub count: ChainCount,

    /// Inclusive `[min, max]` interval between sub-events, in milliseconds.
    pub interval_ms: [u64; 2],

    /// Scatter radius around the incident origin for sub-event epicenters.
    pub radius: f32,
}

// ============================================================================
// Hazard zones
// ============================================================================

/// Classification of a hazard zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// Toxic smoke cloud.
    ToxicSmoke,
    /// Radiation field.
    Radiation,
    /// Corrosive spill on the ground.
    CorrosiveSpill,
    /// Lingering fire.
    Fire,
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToxicSmoke => write!(f, "toxic_smoke"),
            Self::Radiation => write!(f, "radiation"),
            Self::CorrosiveSpill => write!(f, "corrosive_spill"),
            Self::Fire => write!(f, "fire"),
        }
    }
}

/// A concentric damage ring of a hazard zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ZoneRing {
    /// Ring radius from the zone center.
    pub radius: Scalable,
    /// Damage per second applied to occupants inside this ring.
    pub dps: f32,
}

/// Template for a hazard zone spawned by a phase (or by a profile's
/// persistent smoke attribute).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Zone classification.
    pub kind: ZoneKind,

    /// Inner (or only) damage ring.
    pub inner: ZoneRing,

    /// Optional outer ring; occupants are classified inner-first by
    /// distance from center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer: Option<ZoneRing>,

    /// Interval between damage-over-time ticks, in milliseconds.
    pub tick_interval_ms: u64,

    /// Expiry policy: a finite lifetime or persist until cleanup/restart.
    #[serde(rename = "duration")]
    pub expiry: ZoneExpiry,

    /// Damage per second applied to vehicle occupants; vehicles take no
    /// zone damage when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_dps: Option<f32>,

    /// Traction multiplier reported for vehicles inside the zone
    /// (e.g., a corrosive slick).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traction_factor: Option<f32>,
}

/// Zone expiry policy.
///
/// Serialized as a humantime string (`"90s"`, `"10m"`) or the sentinel
/// `until-cleanup`. Zones are never persisted to durable storage; a process
/// restart implicitly cleans up every zone regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneExpiry {
    /// Zone removes itself after this lifetime.
    Finite(Duration),
    /// Zone persists until an explicit cleanup or process restart.
    UntilCleanup,
}

impl Serialize for ZoneExpiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(d) => serializer.collect_str(&humantime::format_duration(*d)),
            Self::UntilCleanup => serializer.serialize_str("until-cleanup"),
        }
    }
}

impl<'de> Deserialize<'de> for ZoneExpiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "until-cleanup" {
            return Ok(Self::UntilCleanup);
        }
        humantime::parse_duration(&raw)
            .map(Self::Finite)
            .map_err(|e| serde::de::Error::custom(format!("invalid zone duration '{raw}': {e}")))
    }
}

// ============================================================================
// Tests
// ============================================================================
