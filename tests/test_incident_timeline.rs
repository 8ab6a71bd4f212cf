//! End-to-end timeline tests driven through the coordinator, using the
//! builtin fuel tanker pack and tokio's paused clock.

use std::time::Duration;

use glam::Vec3;
use tokio::sync::mpsc;

use flashover::coordinator::HazardCoordinator;
use flashover::incident::{IncidentEvent, IncidentState};
use flashover::profile::ProfileCatalog;
use flashover::zone::DamageTick;

fn coordinator() -> (
    HazardCoordinator,
    mpsc::UnboundedReceiver<IncidentEvent>,
    mpsc::UnboundedReceiver<DamageTick>,
) {
    HazardCoordinator::new(ProfileCatalog::builtin().expect("builtin packs must load"))
}

fn drain(rx: &mut mpsc::UnboundedReceiver<IncidentEvent>) -> Vec<IncidentEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn full_tanker_fires_phases_in_offset_order() {
    let (coordinator, mut events, _ticks) = coordinator();
    let mut handle = coordinator
        .report_incident_seeded("fuel_tanker", Some(1.0), Vec3::ZERO, 42)
        .unwrap();
    assert_eq!(handle.wait().await, IncidentState::Completed);

    let events = drain(&mut events);
    assert!(matches!(events.first(), Some(IncidentEvent::Started { .. })));
    assert!(matches!(events.last(), Some(IncidentEvent::Completed { .. })));

    let firings: Vec<(String, Option<u32>, u64)> = events
        .iter()
        .filter_map(|event| match event {
            IncidentEvent::PhaseFired {
                phase,
                chain_index,
                offset_ms,
                ..
            } => Some((phase.clone(), *chain_index, *offset_ms)),
            _ => None,
        })
        .collect();

    // Scripted phases land at their configured delays, in order.
    assert_eq!(firings[0].0, "initial_blast");
    assert_eq!(firings[0].2, 0);
    assert_eq!(firings[1].0, "fireball");
    assert_eq!(firings[1].2, 1800);
    assert_eq!(firings[2].0, "fuel_fire");
    assert_eq!(firings[2].2, 2500);

    // Offsets never go backwards across the whole schedule.
    for window in firings.windows(2) {
        assert!(
            window[1].2 >= window[0].2,
            "firing offsets regressed: {firings:?}"
        );
    }

    // The chain burst lands inside its configured window with 3..=6
    // sub-events at full scale, indexed in order.
    let burst: Vec<&(String, Option<u32>, u64)> = firings
        .iter()
        .filter(|(phase, chain, _)| phase == "secondary_detonations" && chain.is_some())
        .collect();
    assert!(
        (3..=6).contains(&burst.len()),
        "expected 3..=6 sub-events, got {}",
        burst.len()
    );
    for (i, (_, chain_index, offset_ms)) in burst.iter().enumerate() {
        assert_eq!(*chain_index, Some(u32::try_from(i).unwrap()));
        assert!((5000..=15000).contains(offset_ms));
    }
}

#[tokio::test(start_paused = true)]
async fn same_seed_reproduces_the_burst() {
    let (coordinator, mut events, _ticks) = coordinator();

    let mut first = coordinator
        .report_incident_seeded("fuel_tanker", Some(1.0), Vec3::ZERO, 9001)
        .unwrap();
    first.wait().await;
    let first_firings: Vec<String> = drain(&mut events)
        .iter()
        .filter_map(|event| match event {
            IncidentEvent::PhaseFired {
                phase,
                chain_index,
                offset_ms,
                effect,
                ..
            } => Some(format!(
                "{phase}:{chain_index:?}:{offset_ms}:{}",
                effect.epicenter
            )),
            _ => None,
        })
        .collect();

    let mut second = coordinator
        .report_incident_seeded("fuel_tanker", Some(1.0), Vec3::ZERO, 9001)
        .unwrap();
    second.wait().await;
    let second_firings: Vec<String> = drain(&mut events)
        .iter()
        .filter_map(|event| match event {
            IncidentEvent::PhaseFired {
                phase,
                chain_index,
                offset_ms,
                effect,
                ..
            } => Some(format!(
                "{phase}:{chain_index:?}:{offset_ms}:{}",
                effect.epicenter
            )),
            _ => None,
        })
        .collect();

    assert_eq!(first_firings, second_firings);
}

#[tokio::test(start_paused = true)]
async fn cancel_suppresses_remaining_phases_but_keeps_zones() {
    let (coordinator, mut events, _ticks) = coordinator();
    let origin = Vec3::new(10.0, 0.0, 0.0);
    let mut handle = coordinator
        .report_incident_seeded("fuel_tanker", Some(1.0), origin, 42)
        .unwrap();

    // Let initial_blast (0ms) and fireball (1800ms) fire, then cancel
    // before fuel_fire at 2500ms.
    tokio::time::advance(Duration::from_millis(2000)).await;
    settle().await;
    coordinator.engine().cancel(handle.id()).unwrap();

    assert_eq!(handle.wait().await, IncidentState::Cancelled);

    let fired: Vec<String> = drain(&mut events)
        .iter()
        .filter_map(|event| match event {
            IncidentEvent::PhaseFired { phase, .. } => Some(phase.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(fired, vec!["initial_blast", "fireball"]);

    // Persistent smoke went up at report time and is never retracted.
    assert_eq!(coordinator.zones().contains(origin).len(), 1);

    tokio::time::advance(Duration::from_secs(20)).await;
    settle().await;
    assert!(
        drain(&mut events)
            .iter()
            .all(|e| !matches!(e, IncidentEvent::PhaseFired { .. })),
        "no firing may follow a cancel"
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_after_completion_reports_not_found() {
    let (coordinator, _events, _ticks) = coordinator();
    let mut handle = coordinator
        .report_incident_seeded("fuel_tanker", Some(0.05), Vec3::ZERO, 1)
        .unwrap();
    handle.wait().await;
    settle().await;

    assert!(coordinator.engine().cancel(handle.id()).is_err());
}

#[tokio::test(start_paused = true)]
async fn concurrent_incidents_run_independently() {
    let (coordinator, mut events, _ticks) = coordinator();
    let mut tanker = coordinator
        .report_incident_seeded("fuel_tanker", Some(1.0), Vec3::ZERO, 5)
        .unwrap();
    let mut hazmat = coordinator
        .report_incident_seeded("hazmat_class_3", None, Vec3::new(100.0, 0.0, 0.0), 6)
        .unwrap();
    assert_ne!(tanker.id(), hazmat.id());

    // Cancelling one leaves the other's timeline untouched.
    coordinator.engine().cancel(hazmat.id()).unwrap();
    assert_eq!(hazmat.wait().await, IncidentState::Cancelled);
    assert_eq!(tanker.wait().await, IncidentState::Completed);

    let tanker_fired = drain(&mut events)
        .iter()
        .filter(|event| {
            matches!(
                event,
                IncidentEvent::PhaseFired { incident, .. } if *incident == tanker.id()
            )
        })
        .count();
    assert!(tanker_fired >= 7, "tanker timeline must run in full");
}

#[tokio::test(start_paused = true)]
async fn events_serialize_as_tagged_json() {
    let (coordinator, mut events, _ticks) = coordinator();
    let mut handle = coordinator
        .report_incident_seeded("fuel_tanker", Some(0.05), Vec3::ZERO, 3)
        .unwrap();
    handle.wait().await;

    for event in drain(&mut events) {
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("event").is_some(), "missing tag: {value}");
        assert!(value.get("incident").is_some(), "missing id: {value}");
    }
}
