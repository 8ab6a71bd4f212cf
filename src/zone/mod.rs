//! Hazard zone registry.
//!
//! The single source of truth for "is point P hazardous". Incident timelines
//! register zones; damage application and UI collaborators query them; an
//! external cleanup action (or a finite lifetime) removes them. Each zone
//! owns a spawned task driving its damage-over-time ticks and its one-shot
//! expiry timer.
//!
//! Nothing here is persisted: a process restart is an implicit cleanup of
//! every zone. That is a deliberate design property — persistent world
//! hazards surviving a restart would change game balance.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use glam::Vec3;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ZoneError;
use crate::incident::IncidentId;
use crate::observability::metrics;
use crate::profile::ZoneKind;
use crate::scale::{ResolvedRing, ResolvedZone};
use crate::zone::ZoneExpiryKind::{Finite, Persistent};

// ============================================================================
// Identity and occupants
// ============================================================================

/// Unique identifier of a registered hazard zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ZoneId(Uuid);

impl ZoneId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// External entity id as reported by the entity-tracking collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OccupantId(pub u64);

/// What kind of entity an occupant is; decides which damage rate applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupantKind {
    /// A character; takes the ring's damage rate.
    Character,
    /// A vehicle; takes the zone's `vehicle_dps` (none configured, no damage)
    /// and is additionally reported the zone's traction factor.
    Vehicle,
}

/// Which concentric ring an occupant was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneBand {
    /// Inside the inner ring.
    Inner,
    /// Between the inner and outer ring.
    Outer,
}

/// One damage-over-time application, emitted on the registry's tick stream.
/// The physics/entity layer applies the actual damage.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DamageTick {
    /// Zone that ticked.
    pub zone: ZoneId,
    /// Zone classification.
    pub kind: ZoneKind,
    /// Occupant being damaged.
    pub occupant: OccupantId,
    /// Occupant classification.
    pub occupant_kind: OccupantKind,
    /// Ring the occupant was classified into.
    pub band: ZoneBand,
    /// Damage amount for this tick (`rate × tick interval`).
    pub amount: f32,
    /// Traction multiplier for vehicles, when the zone defines one.
    pub traction_factor: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
struct Occupant {
    kind: OccupantKind,
    position: Vec3,
}

// ============================================================================
// Zone state
// ============================================================================

enum ZoneExpiryKind {
    Finite(Instant),
    Persistent,
}

struct ZoneEntry {
    incident: Option<IncidentId>,
    zone: ResolvedZone,
    center: Vec3,
    registered_at: DateTime<Utc>,
    expiry: ZoneExpiryKind,
    cancel: CancellationToken,
}

impl ZoneEntry {
    /// Outermost radius of the zone.
    fn reach(&self) -> f32 {
        self.zone
            .outer
            .map_or(self.zone.inner.radius, |ring| ring.radius)
    }

    fn classify(&self, position: Vec3) -> Option<(ZoneBand, f32)> {
        let distance = (position - self.center).length();
        if distance <= self.zone.inner.radius {
            return Some((ZoneBand::Inner, self.zone.inner.dps));
        }
        match self.zone.outer {
            Some(ring) if distance <= ring.radius => Some((ZoneBand::Outer, ring.dps)),
            _ => None,
        }
    }
}

/// Read-only description of a registered zone.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneSnapshot {
    /// Zone id.
    pub id: ZoneId,
    /// Incident that spawned the zone, when any. A zone may outlive it.
    pub incident: Option<IncidentId>,
    /// Zone classification.
    pub kind: ZoneKind,
    /// Zone center.
    pub center: Vec3,
    /// Inner (or only) damage ring.
    pub inner: ResolvedRing,
    /// Optional outer ring.
    pub outer: Option<ResolvedRing>,
    /// Tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// `true` for zones that persist until cleanup or restart.
    pub persistent: bool,
    /// Remaining lifetime in milliseconds for finite zones.
    pub remaining_ms: Option<u64>,
    /// Wall-clock registration time.
    pub registered_at: DateTime<Utc>,
    /// Damage per second for vehicles, when configured.
    pub vehicle_dps: Option<f32>,
    /// Traction multiplier for vehicles, when configured.
    pub traction_factor: Option<f32>,
}

// ============================================================================
// Registry
// ============================================================================

/// Concurrent registry of active hazard zones.
pub struct ZoneRegistry {
    zones: DashMap<ZoneId, ZoneEntry>,
    occupants: DashMap<OccupantId, Occupant>,
    tick_tx: mpsc::UnboundedSender<DamageTick>,
    shutdown: CancellationToken,
}

impl ZoneRegistry {
    /// Creates a registry.
    ///
    /// Returns the registry plus the receiving end of its damage tick
    /// stream.
    #[must_use]
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<DamageTick>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Self {
            zones: DashMap::new(),
            occupants: DashMap::new(),
            tick_tx,
            shutdown: CancellationToken::new(),
        });
        (registry, tick_rx)
    }

    /// Registers a zone and starts its tick/expiry task.
    ///
    /// Finite zones schedule a one-shot removal at `now + duration`;
    /// persistent zones are removed only by [`Self::cleanup`] or process
    /// restart.
    #[must_use]
    pub fn register(
        self: &Arc<Self>,
        zone: ResolvedZone,
        center: Vec3,
        incident: Option<IncidentId>,
    ) -> ZoneId {
        let id = ZoneId::new();
        let cancel = self.shutdown.child_token();
        let deadline = match zone.expiry {
            crate::profile::ZoneExpiry::Finite(duration) => Some(Instant::now() + duration),
            crate::profile::ZoneExpiry::UntilCleanup => None,
        };
        let expiry = deadline.map_or(Persistent, Finite);
        let tick = Duration::from_millis(zone.tick_interval_ms);
        // Anchor the tick baseline here, not at the task's first poll; the
        // first tick lands one interval after registration.
        let first_tick = Instant::now() + tick;

        info!(
            %id,
            kind = %zone.kind,
            persistent = deadline.is_none(),
            "hazard zone registered"
        );
        self.zones.insert(
            id,
            ZoneEntry {
                incident,
                zone,
                center,
                registered_at: Utc::now(),
                expiry,
                cancel: cancel.clone(),
            },
        );
        metrics::record_zone_registered(self.zones.len());

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            registry.run_zone(id, first_tick, tick, deadline, cancel).await;
        });
        id
    }

    /// Drives one zone's periodic DOT ticks and one-shot expiry.
    async fn run_zone(
        &self,
        id: ZoneId,
        first_tick: Instant,
        tick: Duration,
        deadline: Option<Instant>,
        cancel: CancellationToken,
    ) {
        let mut interval = tokio::time::interval_at(first_tick, tick);
        // A missed tick is simply retried next cycle, never bursted.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = expiry_sleep(deadline) => {
                    if self.remove(id).is_some() {
                        debug!(%id, "hazard zone expired");
                        metrics::record_zone_expired(self.zones.len());
                    }
                    break;
                }
                _ = interval.tick() => self.apply_dot(id, tick),
            }
        }
    }

    /// Applies one DOT tick to every reported occupant inside the zone.
    fn apply_dot(&self, id: ZoneId, tick: Duration) {
        let Some(entry) = self.zones.get(&id) else {
            return;
        };
        let secs = tick.as_secs_f32();
        metrics::record_dot_tick();

        for occupant_ref in &self.occupants {
            let occupant = *occupant_ref.value();
            let Some((band, ring_dps)) = entry.classify(occupant.position) else {
                continue;
            };
            let (amount, traction_factor) = match occupant.kind {
                OccupantKind::Character => (ring_dps * secs, None),
                OccupantKind::Vehicle => {
                    let dps = entry.zone.vehicle_dps;
                    let traction = entry.zone.traction_factor;
                    if dps.is_none() && traction.is_none() {
                        continue;
                    }
                    (dps.unwrap_or(0.0) * secs, traction)
                }
            };
            let _ = self.tick_tx.send(DamageTick {
                zone: id,
                kind: entry.zone.kind,
                occupant: *occupant_ref.key(),
                occupant_kind: occupant.kind,
                band,
                amount,
                traction_factor,
            });
        }
    }

    /// Returns every zone whose (outermost) radius covers the point.
    /// Overlapping zones all appear.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> Vec<ZoneId> {
        self.zones
            .iter()
            .filter(|entry| (point - entry.center).length() <= entry.reach())
            .map(|entry| *entry.key())
            .collect()
    }

    /// Snapshot of a registered zone, or `None` when unknown.
    #[must_use]
    pub fn describe(&self, id: ZoneId) -> Option<ZoneSnapshot> {
        self.zones.get(&id).map(|entry| ZoneSnapshot {
            id,
            incident: entry.incident,
            kind: entry.zone.kind,
            center: entry.center,
            inner: entry.zone.inner,
            outer: entry.zone.outer,
            tick_interval_ms: entry.zone.tick_interval_ms,
            persistent: matches!(entry.expiry, Persistent),
            remaining_ms: match entry.expiry {
                Finite(at) => Some(as_millis(at.saturating_duration_since(Instant::now()))),
                Persistent => None,
            },
            registered_at: entry.registered_at,
            vehicle_dps: entry.zone.vehicle_dps,
            traction_factor: entry.zone.traction_factor,
        })
    }

    /// Explicitly removes a zone.
    ///
    /// Idempotent: the second call on the same id (or a call on an expired
    /// zone) returns `ZoneError::NotFound` without further effect.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::NotFound`] when the zone is unknown, already
    /// expired, or already cleaned up.
    pub fn cleanup(&self, id: ZoneId) -> Result<(), ZoneError> {
        self.remove(id).map_or(Err(ZoneError::NotFound(id)), |()| {
            info!(%id, "hazard zone cleaned up");
            metrics::record_zone_cleaned(self.zones.len());
            Ok(())
        })
    }

    fn remove(&self, id: ZoneId) -> Option<()> {
        self.zones.remove(&id).map(|(_, entry)| {
            entry.cancel.cancel();
        })
    }

    /// Reports an occupant's current position (upserts).
    ///
    /// Occupancy is fed by an external entity-tracking collaborator; the
    /// registry itself never infers presence.
    pub fn update_occupant(&self, id: OccupantId, kind: OccupantKind, position: Vec3) {
        self.occupants.insert(id, Occupant { kind, position });
    }

    /// Forgets an occupant (despawn, disconnect).
    pub fn remove_occupant(&self, id: OccupantId) {
        self.occupants.remove(&id);
    }

    /// Ids of all currently active zones.
    #[must_use]
    pub fn active(&self) -> Vec<ZoneId> {
        self.zones.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of currently active zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns `true` if no zones are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Cancels every zone task and clears the registry; host shutdown only.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.zones.clear();
    }
}

impl std::fmt::Debug for ZoneRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneRegistry")
            .field("zones", &self.zones.len())
            .field("occupants", &self.occupants.len())
            .finish_non_exhaustive()
    }
}

async fn expiry_sleep(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn as_millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

// ============================================================================
// Tests
// ============================================================================
