//! Timeline scheduler.
//!
//! The [`IncidentEngine`] drives many concurrent hazard incidents, each an
//! independent logical timeline running on its own spawned task. The full
//! firing schedule — including the randomized chain expansion — is drawn
//! up-front from a per-incident seeded RNG, so a fixed seed reproduces the
//! exact sub-event counts, offsets, and epicenters. Firing is the only
//! suspension point and is a cooperative `sleep_until`, never a busy wait.
//!
//! Cancellation races are resolved in favor of *not* firing: every fire
//! boundary is a biased `select!` that checks the cancellation token first.
//! Already-fired effects and already-registered zones are never retracted.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::IncidentError;
use crate::observability::metrics;
use crate::scale::ResolvedPhase;
use crate::zone::ZoneRegistry;

pub mod events;

pub use events::{DamageDescriptor, EffectDescriptor, IncidentEvent};

// ============================================================================
// Identity and state
// ============================================================================

/// Unique identifier of a running (or finished) incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IncidentId(Uuid);

impl IncidentId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for IncidentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of one incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentState {
    /// Created, timeline task not yet running.
    Scheduled,
    /// Timeline task is driving phases.
    Running,
    /// Every phase and sub-event fired.
    Completed,
    /// Cancelled; remaining phases were suppressed.
    Cancelled,
}

impl IncidentState {
    /// Returns `true` for `Completed` and `Cancelled`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Handle to a started incident.
///
/// Cheap to clone; observing state does not keep the incident alive and
/// dropping every handle does not cancel it.
#[derive(Debug, Clone)]
pub struct IncidentHandle {
    id: IncidentId,
    state: watch::Receiver<IncidentState>,
}

impl IncidentHandle {
    /// The incident's id.
    #[must_use]
    pub const fn id(&self) -> IncidentId {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> IncidentState {
        *self.state.borrow()
    }

    /// Waits until the incident reaches a terminal state and returns it.
    pub async fn wait(&mut self) -> IncidentState {
        // The timeline task always stores a terminal state before dropping
        // the sender, so a closed channel still carries the final state.
        if let Ok(state) = self.state.wait_for(|s| s.is_terminal()).await {
            return *state;
        }
        *self.state.borrow()
    }
}

// ============================================================================
// Engine
// ============================================================================

struct ActiveIncident {
    cancel: CancellationToken,
}

/// Scheduler for concurrent hazard incident timelines.
pub struct IncidentEngine {
    incidents: DashMap<IncidentId, ActiveIncident>,
    zones: Arc<ZoneRegistry>,
    event_tx: mpsc::UnboundedSender<IncidentEvent>,
    shutdown: CancellationToken,
}

impl IncidentEngine {
    /// Creates an engine wired to the given zone registry.
    ///
    /// Returns the engine plus the receiving end of its event stream.
    /// Within one incident, event delivery order matches fire order.
    #[must_use]
    pub fn new(zones: Arc<ZoneRegistry>) -> (Arc<Self>, mpsc::UnboundedReceiver<IncidentEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Self {
            incidents: DashMap::new(),
            zones,
            event_tx,
            shutdown: CancellationToken::new(),
        });
        (engine, event_rx)
    }

    /// Starts an incident with a randomly drawn seed.
    #[must_use]
    pub fn start(self: &Arc<Self>, phases: Vec<ResolvedPhase>, origin: Vec3) -> IncidentHandle {
        self.start_seeded(phases, origin, rand::random())
    }

    /// Starts an incident with an explicit RNG seed.
    ///
    /// The seed fixes every chain draw — sub-event count, intervals, and
    /// scatter epicenters — which is how tests pin down the otherwise
    /// randomized burst.
    ///
    /// A resolved phase list that is empty (everything gated out) yields a
    /// valid handle that is already `Completed`; this is not an error.
    #[must_use]
    pub fn start_seeded(
        self: &Arc<Self>,
        phases: Vec<ResolvedPhase>,
        origin: Vec3,
        seed: u64,
    ) -> IncidentHandle {
        let id = IncidentId::new();
        let (state_tx, state_rx) = watch::channel(IncidentState::Scheduled);

        if phases.is_empty() {
            debug!(%id, "no phases after resolution, completing immediately");
            let _ = state_tx.send(IncidentState::Completed);
            let _ = self.event_tx.send(IncidentEvent::Completed { incident: id });
            return IncidentHandle { id, state: state_rx };
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let schedule = build_schedule(&phases, origin, &mut rng);

        let cancel = self.shutdown.child_token();
        self.incidents.insert(
            id,
            ActiveIncident {
                cancel: cancel.clone(),
            },
        );
        metrics::record_incident_started(self.incidents.len());
        info!(%id, phases = phases.len(), firings = schedule.len(), seed, "incident started");

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine
                .run_timeline(id, phases, schedule, origin, state_tx, cancel)
                .await;
        });

        IncidentHandle { id, state: state_rx }
    }

    /// Cancels a running incident.
    ///
    /// Suppresses every not-yet-fired phase and sub-event; a cancel racing a
    /// fire boundary wins. Already-fired effects and registered zones stay.
    ///
    /// # Errors
    ///
    /// Returns [`IncidentError::NotFound`] when the incident is unknown or
    /// already finished. Callers treat this as a non-fatal no-op.
    pub fn cancel(&self, id: IncidentId) -> Result<(), IncidentError> {
        self.incidents
            .get(&id)
            .map(|entry| entry.cancel.cancel())
            .ok_or(IncidentError::NotFound(id))
    }

    /// Emits a dispatch alert request on the event stream.
    ///
    /// Called by the coordinator for profiles that carry an alert spec; the
    /// actual dispatch contact is an external collaborator's job.
    pub fn request_alert(&self, incident: IncidentId, priority: u8) {
        let _ = self.event_tx.send(IncidentEvent::AlertRequested {
            incident,
            priority,
        });
    }

    /// Number of incidents currently in flight.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.incidents.len()
    }

    /// Cancels every running incident and refuses nothing afterwards;
    /// intended for host shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn run_timeline(
        &self,
        id: IncidentId,
        phases: Vec<ResolvedPhase>,
        schedule: Vec<Firing>,
        origin: Vec3,
        state_tx: watch::Sender<IncidentState>,
        cancel: CancellationToken,
    ) {
        let started = Instant::now();
        let _ = state_tx.send(IncidentState::Running);
        let _ = self.event_tx.send(IncidentEvent::Started {
            incident: id,
            at: Utc::now(),
            origin,
            phases: phases.len(),
        });

        for firing in &schedule {
            let deadline = started + firing.offset;
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(%id, "cancelled, suppressing remaining firings");
                    let _ = state_tx.send(IncidentState::Cancelled);
                    let _ = self.event_tx.send(IncidentEvent::Cancelled { incident: id });
                    self.incidents.remove(&id);
                    metrics::record_incident_cancelled(self.incidents.len());
                    return;
                }
                () = tokio::time::sleep_until(deadline) => {
                    self.fire(id, &phases[firing.phase_idx], firing);
                }
            }
        }

        let _ = state_tx.send(IncidentState::Completed);
        let _ = self.event_tx.send(IncidentEvent::Completed { incident: id });
        self.incidents.remove(&id);
        metrics::record_incident_completed(self.incidents.len());
        debug!(%id, "incident completed");
    }

    /// Fires one scheduled entry: effect, optional damage, optional zone,
    /// emitted atomically as one event.
    fn fire(&self, id: IncidentId, phase: &ResolvedPhase, firing: &Firing) {
        // Zones spawn on the phase's own firing only, never per sub-event.
        if firing.chain_index.is_none() {
            if let Some(zone) = &phase.zone {
                let zone_id = self.zones.register(zone.clone(), firing.epicenter, Some(id));
                debug!(%id, %zone_id, phase = %phase.name, "phase registered hazard zone");
            }
        }

        let effect = EffectDescriptor {
            kind: phase.effect.kind.clone(),
            epicenter: firing.epicenter,
            radius: phase.radius,
            camera_shake: phase.camera_shake,
            particles: phase.effect.particles.clone(),
            sounds: phase.effect.sounds.clone(),
        };
        let damage = phase.damage.map(|damage| DamageDescriptor {
            epicenter: firing.epicenter,
            radius: damage.radius,
            amount: damage.amount,
        });

        metrics::record_phase_fired(&phase.name);
        let _ = self.event_tx.send(IncidentEvent::PhaseFired {
            incident: id,
            phase: phase.name.clone(),
            chain_index: firing.chain_index,
            offset_ms: as_millis(firing.offset),
            effect,
            damage,
        });
    }
}

impl std::fmt::Debug for IncidentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncidentEngine")
            .field("active", &self.incidents.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Schedule construction
// ============================================================================

/// One planned firing within an incident's timeline.
struct Firing {
    offset: Duration,
    phase_idx: usize,
    chain_index: Option<u32>,
    epicenter: Vec3,
}

/// Expands resolved phases into a flat, offset-sorted firing schedule.
///
/// Chain phases contribute their own firing at `delay_ms` plus `N` sub-event
/// firings, `N` drawn uniformly from the count range. Sub-event offsets
/// accumulate random intervals from `delay_ms`, clamped to `delay_end_ms`;
/// epicenters scatter uniformly in the chain's disc around the origin.
fn build_schedule(phases: &[ResolvedPhase], origin: Vec3, rng: &mut ChaCha8Rng) -> Vec<Firing> {
    let mut schedule = Vec::with_capacity(phases.len());
    for (phase_idx, phase) in phases.iter().enumerate() {
        schedule.push(Firing {
            offset: Duration::from_millis(phase.delay_ms),
            phase_idx,
            chain_index: None,
            epicenter: origin,
        });

        let Some(chain) = phase.chain else { continue };
        let window_end = phase.delay_end_ms.unwrap_or(phase.delay_ms);
        let count = rng.gen_range(chain.count[0]..=chain.count[1]);
        let mut clock = phase.delay_ms;
        for chain_index in 0..count {
            let step = rng.gen_range(chain.interval_ms[0]..=chain.interval_ms[1]);
            clock = clock.saturating_add(step).min(window_end);
            schedule.push(Firing {
                offset: Duration::from_millis(clock),
                phase_idx,
                chain_index: Some(chain_index),
                epicenter: origin + scatter(rng, chain.radius),
            });
        }
    }
    // Stable sort keeps intra-phase order for equal offsets.
    schedule.sort_by_key(|firing| firing.offset);
    schedule
}

/// Uniform random point in a disc of the given radius on the ground plane.
fn scatter(rng: &mut ChaCha8Rng, radius: f32) -> Vec3 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let dist = radius * rng.r#gen::<f32>().sqrt();
    Vec3::new(angle.cos() * dist, 0.0, angle.sin() * dist)
}

#[allow(clippy::cast_possible_truncation)]
const fn as_millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

// ============================================================================
// Tests
// ============================================================================
