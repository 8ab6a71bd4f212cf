//! Incident coordinator.
//!
//! The crate's front door: the single entry point game code calls when a
//! cargo vehicle is destroyed. Wires together the profile catalog, the
//! fill-level scaler, the timeline scheduler, and the zone registry, and
//! handles the profile-level concerns that belong to no single phase
//! (dispatch alerts, persistent smoke).

use std::sync::Arc;

use glam::Vec3;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::SelectError;
use crate::incident::{IncidentEngine, IncidentEvent, IncidentHandle};
use crate::profile::ProfileCatalog;
use crate::profile::select::select;
use crate::scale::{resolve, resolve_zone, scale_factor};
use crate::zone::{DamageTick, ZoneRegistry};

/// Orchestrates the full report-to-incident pipeline.
pub struct HazardCoordinator {
    catalog: ProfileCatalog,
    engine: Arc<IncidentEngine>,
    zones: Arc<ZoneRegistry>,
}

impl HazardCoordinator {
    /// Creates a coordinator over a catalog, wiring a fresh engine and
    /// zone registry.
    ///
    /// Returns the coordinator plus the engine's incident event stream and
    /// the registry's damage tick stream; the host forwards both into its
    /// own effect and damage layers.
    #[must_use]
    pub fn new(
        catalog: ProfileCatalog,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<IncidentEvent>,
        mpsc::UnboundedReceiver<DamageTick>,
    ) {
        let (zones, tick_rx) = ZoneRegistry::new();
        let (engine, event_rx) = IncidentEngine::new(Arc::clone(&zones));
        (
            Self {
                catalog,
                engine,
                zones,
            },
            event_rx,
            tick_rx,
        )
    }

    /// Reports a destroyed cargo vehicle and starts the matching incident.
    ///
    /// Selects the profile variant for `cargo` and `fill_level`, resolves
    /// the phase list at the effective scale, starts the timeline, requests
    /// a dispatch alert when the profile carries one, and registers the
    /// profile's persistent smoke zone at the origin.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::ProfileNotFound`] for an unknown cargo key and
    /// [`SelectError::FillLevelRequired`] when a tanker entry is reported
    /// without a fill level.
    pub fn report_incident(
        &self,
        cargo: &str,
        fill_level: Option<f32>,
        origin: Vec3,
    ) -> Result<IncidentHandle, SelectError> {
        self.report_incident_inner(cargo, fill_level, origin, None)
    }

    /// Like [`Self::report_incident`] but pins the timeline RNG seed, for
    /// reproducing a specific chain burst.
    pub fn report_incident_seeded(
        &self,
        cargo: &str,
        fill_level: Option<f32>,
        origin: Vec3,
        seed: u64,
    ) -> Result<IncidentHandle, SelectError> {
        self.report_incident_inner(cargo, fill_level, origin, Some(seed))
    }

    fn report_incident_inner(
        &self,
        cargo: &str,
        fill_level: Option<f32>,
        origin: Vec3,
        seed: Option<u64>,
    ) -> Result<IncidentHandle, SelectError> {
        let selection = select(&self.catalog, cargo, fill_level)?;
        let profile = &selection.profile;
        let phases = resolve(profile, selection.fill_level);
        info!(
            cargo,
            profile = %profile.key,
            variant = ?selection.variant,
            fill = selection.fill_level,
            phases = phases.len(),
            "incident reported"
        );

        let handle = match seed {
            Some(seed) => self.engine.start_seeded(phases, origin, seed),
            None => self.engine.start(phases, origin),
        };

        if let Some(alert) = &profile.alert {
            self.engine.request_alert(handle.id(), alert.priority);
        }

        // Persistent smoke belongs to the whole incident, not to a phase;
        // it goes up at the origin the moment the incident starts.
        if let Some(smoke) = &profile.persistent_smoke {
            let scale = scale_factor(profile.scalable, selection.fill_level);
            let zone_id =
                self.zones
                    .register(resolve_zone(smoke, scale), origin, Some(handle.id()));
            debug!(incident = %handle.id(), %zone_id, "persistent smoke registered");
        }

        Ok(handle)
    }

    /// The profile catalog backing this coordinator.
    #[must_use]
    pub const fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    /// The timeline scheduler, for cancellation and introspection.
    #[must_use]
    pub fn engine(&self) -> &Arc<IncidentEngine> {
        &self.engine
    }

    /// The zone registry, for containment queries, occupancy, and cleanup.
    #[must_use]
    pub fn zones(&self) -> &Arc<ZoneRegistry> {
        &self.zones
    }

    /// Cancels every incident and zone; host shutdown only.
    pub fn shutdown(&self) {
        self.engine.shutdown();
        self.zones.shutdown();
    }
}

impl std::fmt::Debug for HazardCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HazardCoordinator")
            .field("profiles", &self.catalog.len())
            .field("incidents", &self.engine.active_count())
            .field("zones", &self.zones.len())
            .finish_non_exhaustive()
    }
}
