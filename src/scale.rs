//! Phase scaling.
//!
//! Resolves a profile's phase templates into concrete per-incident numbers.
//! This is a pure transform: identical `(profile, fill)` inputs always yield
//! identical output. All randomness lives in the scheduler.

use serde::Serialize;

use crate::profile::{EffectSpec, HazardProfile, PhaseTemplate, ZoneExpiry, ZoneKind, ZoneSpec};

/// Floor applied to the effective scale factor. Guarantees a non-zero
/// minimal effect even at a near-empty fill.
pub const MIN_SCALE: f32 = 0.1;

// ============================================================================
// Resolved types
// ============================================================================

/// A phase template with every scalable field replaced by a concrete number.
///
/// Owned exclusively by the incident that produced it; never mutated after
/// creation.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPhase {
    /// Phase name, carried through to emitted events.
    pub name: String,
    /// Fire offset in milliseconds from incident start.
    pub delay_ms: u64,
    /// End of the chain window, when present.
    pub delay_end_ms: Option<u64>,
    /// Resolved chain descriptor for chain phases.
    pub chain: Option<ResolvedChain>,
    /// Effect radius.
    pub radius: f32,
    /// Camera shake intensity.
    pub camera_shake: f32,
    /// Presentation descriptors, passed through unchanged.
    pub effect: EffectSpec,
    /// One-time direct damage.
    pub damage: Option<ResolvedDamage>,
    /// Hazard zone spawned when this phase fires.
    pub zone: Option<ResolvedZone>,
}

/// Resolved chain descriptor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResolvedChain {
    /// Inclusive `[min, max]` sub-event count.
    pub count: [u32; 2],
    /// Inclusive `[min, max]` inter-event interval in milliseconds.
    pub interval_ms: [u64; 2],
    /// Scatter radius for sub-event epicenters.
    pub radius: f32,
}

/// Resolved one-time damage descriptor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResolvedDamage {
    /// Damage radius around the epicenter.
    pub radius: f32,
    /// Damage amount at the epicenter.
    pub amount: f32,
}

/// Resolved damage ring.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResolvedRing {
    /// Ring radius from the zone center.
    pub radius: f32,
    /// Damage per second inside this ring.
    pub dps: f32,
}

/// Fully resolved hazard zone descriptor, ready for registration.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedZone {
    /// Zone classification.
    pub kind: ZoneKind,
    /// Inner (or only) damage ring.
    pub inner: ResolvedRing,
    /// Optional outer ring.
    pub outer: Option<ResolvedRing>,
    /// Interval between damage ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Expiry policy.
    #[serde(skip)]
    pub expiry: ZoneExpiry,
    /// Damage per second for vehicle occupants.
    pub vehicle_dps: Option<f32>,
    /// Traction multiplier for vehicles inside the zone.
    pub traction_factor: Option<f32>,
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolves a profile at the given fill level.
///
/// Non-scalable profiles copy every phase through unchanged and ignore the
/// fill level entirely. Scalable profiles multiply every scaled field by
/// `max(fill, 0.1)` and drop phases gated above that effective scale, except
/// `always_fire` phases which bypass the gate. The floor applies to gating
/// too: every fill in `[0, 0.1]` resolves identically, phase set included.
#[must_use]
pub fn resolve(profile: &HazardProfile, fill_level: f32) -> Vec<ResolvedPhase> {
    let scale = scale_factor(profile.scalable, fill_level);

    profile
        .phases
        .iter()
        .filter(|phase| {
            if !profile.scalable || phase.always_fire {
                return true;
            }
            phase.min_fill_level.is_none_or(|gate| scale >= gate)
        })
        .map(|phase| resolve_phase(phase, scale))
        .collect()
}

/// Effective scale factor for a profile at a given fill level.
///
/// Non-scalable profiles always run at `1.0`; scalable ones at the fill
/// level, floored so a near-empty load still produces a visible incident.
#[must_use]
pub fn scale_factor(scalable: bool, fill_level: f32) -> f32 {
    if scalable {
        fill_level.clamp(0.0, 1.0).max(MIN_SCALE)
    } else {
        1.0
    }
}

fn resolve_phase(phase: &PhaseTemplate, scale: f32) -> ResolvedPhase {
    ResolvedPhase {
        name: phase.name.clone(),
        delay_ms: phase.delay_ms,
        delay_end_ms: phase.delay_end_ms,
        chain: phase.chain.map(|chain| ResolvedChain {
            count: chain.count.resolve(scale),
            interval_ms: chain.interval_ms,
            radius: chain.radius,
        }),
        radius: phase.radius.resolve(scale),
        camera_shake: phase.camera_shake,
        effect: phase.effect.clone(),
        damage: phase.damage.map(|damage| ResolvedDamage {
            radius: damage.radius.resolve(scale),
            amount: damage.amount.resolve(scale),
        }),
        zone: phase.zone.as_ref().map(|zone| resolve_zone(zone, scale)),
    }
}

/// Resolves a zone spec against an effective scale factor.
///
/// Also used directly by the coordinator for a profile's persistent smoke,
/// which is not attached to any phase.
#[must_use]
pub fn resolve_zone(zone: &ZoneSpec, scale: f32) -> ResolvedZone {
    ResolvedZone {
        kind: zone.kind,
        inner: ResolvedRing {
            radius: zone.inner.radius.resolve(scale),
            dps: zone.inner.dps,
        },
        outer: zone.outer.map(|ring| ResolvedRing {
            radius: ring.radius.resolve(scale),
            dps: ring.dps,
        }),
        tick_interval_ms: zone.tick_interval_ms,
        expiry: zone.expiry,
        vehicle_dps: zone.vehicle_dps,
        traction_factor: zone.traction_factor,
    }
}

// ============================================================================
// Tests
// ============================================================================
