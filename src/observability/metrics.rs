//! Metrics collection.
//!
//! Typed convenience functions over the `metrics` facade with label
//! cardinality protection for config-derived names. The crate never
//! installs a recorder; a host that wants an exporter installs one and
//! calls [`describe_metrics`] once afterwards. Without a recorder every
//! macro is a silent no-op.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Registers metric descriptions with the global recorder.
pub fn describe_metrics() {
    describe_counter!(
        "flashover_incidents_started_total",
        "Total number of hazard incidents started"
    );
    describe_counter!(
        "flashover_incidents_completed_total",
        "Total number of incidents that ran their full timeline"
    );
    describe_counter!(
        "flashover_incidents_cancelled_total",
        "Total number of incidents cancelled before completion"
    );
    describe_gauge!(
        "flashover_incidents_active",
        "Number of incidents currently in flight"
    );
    describe_counter!(
        "flashover_phases_fired_total",
        "Total number of phase and chain firings"
    );
    describe_counter!(
        "flashover_zones_registered_total",
        "Total number of hazard zones registered"
    );
    describe_counter!(
        "flashover_zones_removed_total",
        "Total number of hazard zones removed, by reason"
    );
    describe_gauge!(
        "flashover_zones_active",
        "Number of hazard zones currently active"
    );
    describe_counter!(
        "flashover_dot_ticks_total",
        "Total number of damage-over-time tick cycles"
    );
}

/// Records an incident start.
#[allow(clippy::cast_precision_loss)]
pub fn record_incident_started(active: usize) {
    counter!("flashover_incidents_started_total").increment(1);
    gauge!("flashover_incidents_active").set(active as f64);
}

/// Records an incident completing its full timeline.
#[allow(clippy::cast_precision_loss)]
pub fn record_incident_completed(active: usize) {
    counter!("flashover_incidents_completed_total").increment(1);
    gauge!("flashover_incidents_active").set(active as f64);
}

/// Records an incident cancellation.
#[allow(clippy::cast_precision_loss)]
pub fn record_incident_cancelled(active: usize) {
    counter!("flashover_incidents_cancelled_total").increment(1);
    gauge!("flashover_incidents_active").set(active as f64);
}

/// Records one phase or chain firing.
pub fn record_phase_fired(phase: &str) {
    counter!("flashover_phases_fired_total", "phase" => sanitize_phase_label(phase)).increment(1);
}

/// Records a zone registration.
#[allow(clippy::cast_precision_loss)]
pub fn record_zone_registered(active: usize) {
    counter!("flashover_zones_registered_total").increment(1);
    gauge!("flashover_zones_active").set(active as f64);
}

/// Records an explicit zone cleanup.
#[allow(clippy::cast_precision_loss)]
pub fn record_zone_cleaned(active: usize) {
    counter!("flashover_zones_removed_total", "reason" => "cleanup").increment(1);
    gauge!("flashover_zones_active").set(active as f64);
}

/// Records a zone expiring at the end of its finite lifetime.
#[allow(clippy::cast_precision_loss)]
pub fn record_zone_expired(active: usize) {
    counter!("flashover_zones_removed_total", "reason" => "expired").increment(1);
    gauge!("flashover_zones_active").set(active as f64);
}

/// Records one damage-over-time tick cycle.
pub fn record_dot_tick() {
    counter!("flashover_dot_ticks_total").increment(1);
}

/// Maximum length for phase name labels.
///
/// Phase names come from profile packs and are used directly as labels.
/// This caps the label length to prevent cardinality issues.
const MAX_PHASE_LABEL_LEN: usize = 64;

/// Sanitizes a phase name for use as a metrics label.
///
/// Truncates to [`MAX_PHASE_LABEL_LEN`] characters and replaces any
/// characters invalid in exporter labels with underscores.
fn sanitize_phase_label(name: &str) -> String {
    name.chars()
        .take(MAX_PHASE_LABEL_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
