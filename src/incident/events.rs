//! Events emitted by the timeline scheduler.
//!
//! The scheduler only produces instructions; the presentation layer renders
//! the effect descriptors and the physics/entity layer applies the damage
//! descriptors. Delivery order within one incident matches fire order; no
//! ordering is guaranteed across incidents.

use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::Serialize;

use super::IncidentId;

/// Instruction to render one effect.
#[derive(Debug, Clone, Serialize)]
pub struct EffectDescriptor {
    /// Effect kind (e.g., `explosion_large`).
    pub kind: String,
    /// World position of the effect.
    pub epicenter: Vec3,
    /// Effect radius.
    pub radius: f32,
    /// Camera shake intensity in `[0, 1]`.
    pub camera_shake: f32,
    /// Particle system names.
    pub particles: Vec<String>,
    /// Sound bank names.
    pub sounds: Vec<String>,
}

/// Instruction to apply one-time blast damage.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DamageDescriptor {
    /// World position of the blast center.
    pub epicenter: Vec3,
    /// Damage radius.
    pub radius: f32,
    /// Damage amount at the center.
    pub amount: f32,
}

/// One record on an incident's ordered event stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IncidentEvent {
    /// The incident's timeline has started running.
    Started {
        /// Incident id.
        incident: IncidentId,
        /// Wall-clock start time.
        at: DateTime<Utc>,
        /// Incident origin point.
        origin: Vec3,
        /// Number of resolved phases (chain sub-events not included).
        phases: usize,
    },

    /// The profile requested a dispatch alert; forwarded to the (external)
    /// dispatch collaborator.
    AlertRequested {
        /// Incident id.
        incident: IncidentId,
        /// Alert priority.
        priority: u8,
    },

    /// A phase (or chain sub-event) fired. Effect, damage, and any zone
    /// registration happen atomically as one unit at fire time.
    PhaseFired {
        /// Incident id.
        incident: IncidentId,
        /// Name of the phase that fired.
        phase: String,
        /// Sub-event index for chain bursts; `None` for the phase itself.
        chain_index: Option<u32>,
        /// Fire offset in milliseconds from incident start.
        offset_ms: u64,
        /// Effect to render.
        effect: EffectDescriptor,
        /// One-time damage to apply, when the phase deals any.
        damage: Option<DamageDescriptor>,
    },

    /// All phases and sub-events have fired.
    Completed {
        /// Incident id.
        incident: IncidentId,
    },

    /// The incident was cancelled; remaining phases were suppressed.
    Cancelled {
        /// Incident id.
        incident: IncidentId,
    },
}

impl IncidentEvent {
    /// The incident this event belongs to.
    #[must_use]
    pub const fn incident(&self) -> IncidentId {
        match self {
            Self::Started { incident, .. }
            | Self::AlertRequested { incident, .. }
            | Self::PhaseFired { incident, .. }
            | Self::Completed { incident }
            | Self::Cancelled { incident } => *incident,
        }
    }
}
