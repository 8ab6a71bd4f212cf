//! Runtime pack loading tests: a server operator drops a custom YAML pack
//! next to the builtin ones and reports incidents against it.

use std::io::Write;

use glam::Vec3;

use flashover::config::loader::load_catalog;
use flashover::coordinator::HazardCoordinator;
use flashover::error::ConfigError;
use flashover::incident::{IncidentEvent, IncidentState};

const AMMO_PACK: &str = r#"
entries:
  - cargo: ammo_crate
    kind: tanker
    full: ammo_crate_full
    partial: ammo_crate_spent
    full_threshold: 0.8

profiles:
  - key: ammo_crate_full
    label: Ammunition crate (live)
    scalable: true
    phases:
      - name: cookoff
        delay_ms: 0
        radius: { base: 6.0 }
        camera_shake: 0.4
        effect:
          kind: explosion_medium
          particles: [exp_ammo]
          sounds: [sfx_crackle]
        damage:
          radius: { base: 5.0 }
          amount: { base: 70.0 }

  - key: ammo_crate_spent
    label: Ammunition crate (spent)
    scalable: true
    phases:
      - name: scatter
        delay_ms: 0
        always_fire: true
        radius: 2.0
        camera_shake: 0.1
        effect:
          kind: debris_burst
          particles: [debris_casings]
          sounds: [sfx_rattle]
"#;

fn write_pack(dir: &tempfile::TempDir, name: &str, yaml: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    path
}

#[tokio::test(start_paused = true)]
async fn custom_pack_extends_the_builtin_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(&dir, "ammo.yaml", AMMO_PACK);
    let catalog = load_catalog(&[path]).unwrap();

    // Builtin entries are still present alongside the new one.
    assert!(catalog.entry("fuel_tanker").is_some());
    assert!(catalog.entry("hazmat_class_7").is_some());
    assert!(catalog.entry("ammo_crate").is_some());

    let (coordinator, mut events, _ticks) = HazardCoordinator::new(catalog);
    let mut handle = coordinator
        .report_incident_seeded("ammo_crate", Some(0.9), Vec3::ZERO, 2)
        .unwrap();
    assert_eq!(handle.wait().await, IncidentState::Completed);

    let mut fired = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let IncidentEvent::PhaseFired { phase, effect, .. } = event {
            fired.push((phase, effect.radius));
        }
    }
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].0, "cookoff");
    // 0.9 fill against the 0.8 full threshold selects the full variant,
    // scaled: 6.0 × 0.9.
    assert!((fired[0].1 - 5.4).abs() < 1e-3);
}

#[tokio::test(start_paused = true)]
async fn custom_threshold_routes_below_it_to_partial() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(&dir, "ammo.yaml", AMMO_PACK);
    let catalog = load_catalog(&[path]).unwrap();

    let (coordinator, mut events, _ticks) = HazardCoordinator::new(catalog);
    let mut handle = coordinator
        .report_incident_seeded("ammo_crate", Some(0.5), Vec3::ZERO, 2)
        .unwrap();
    handle.wait().await;

    let mut fired = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let IncidentEvent::PhaseFired { phase, .. } = event {
            fired.push(phase);
        }
    }
    assert_eq!(fired, vec!["scatter"]);
}

#[test]
fn invalid_pack_reports_every_problem_at_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(
        &dir,
        "broken.yaml",
        r#"
entries:
  - cargo: junk
    kind: fixed
    profile: junk_profile

profiles:
  - key: junk_profile
    label: Junk
    phases:
      - name: pop
        delay_ms: 0
        radius: -3.0
        camera_shake: 0.1
        effect:
          kind: pop
        damage:
          radius: 0.0
          amount: -5.0
"#,
    );

    let err = load_catalog(&[path]).unwrap_err();
    let ConfigError::ValidationError { errors, .. } = err else {
        panic!("expected a validation error, got {err}");
    };
    // Negative phase radius, non-positive damage radius, negative damage
    // amount: all three collected in one pass.
    assert!(errors.len() >= 3, "expected >= 3 issues, got {errors:?}");
}

#[test]
fn unparseable_pack_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(&dir, "mangled.yaml", "entries: [not: {valid");

    let err = load_catalog(std::slice::from_ref(&path)).unwrap_err();
    match err {
        ConfigError::ParseError { path: p, .. } => {
            assert!(p.ends_with("mangled.yaml"), "got {}", p.display());
        }
        other => panic!("expected a parse error, got {other}"),
    }
}

#[test]
fn pack_shadowing_a_builtin_cargo_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(
        &dir,
        "shadow.yaml",
        r#"
entries:
  - cargo: fuel_tanker
    kind: fixed
    profile: impostor

profiles:
  - key: impostor
    label: Impostor
    phases:
      - name: fizzle
        delay_ms: 0
        radius: 1.0
        camera_shake: 0.0
        effect:
          kind: fizzle
"#,
    );

    assert!(load_catalog(&[path]).is_err());
}
