//! Property-based tests for fill-level scaling.
//!
//! Uses proptest to generate random scalable profiles and fill levels,
//! then verify the scaler's structural invariants hold.

use proptest::prelude::*;

use flashover::profile::{
    ChainCount, DamageSpec, EffectSpec, HazardProfile, PhaseTemplate, Scalable,
};
use flashover::scale::{MIN_SCALE, resolve, scale_factor};

// ===========================================================================
// Generators
// ===========================================================================

fn arb_scalable(max: f32) -> impl Strategy<Value = Scalable> {
    prop_oneof![
        (0.1f32..max).prop_map(Scalable::Fixed),
        (0.1f32..max).prop_map(|base| Scalable::Scaled { base }),
    ]
}

fn arb_phase() -> impl Strategy<Value = PhaseTemplate> {
    (
        arb_scalable(50.0),
        proptest::option::of(0.0f32..=1.0),
        any::<bool>(),
        proptest::option::of((arb_scalable(20.0), arb_scalable(300.0))),
        0u64..30_000,
    )
        .prop_map(
            |(radius, min_fill_level, always_fire, damage, delay_ms)| PhaseTemplate {
                name: "phase".to_string(),
                delay_ms,
                delay_end_ms: None,
                always_fire,
                chain: None,
                radius,
                camera_shake: 0.3,
                effect: EffectSpec::default(),
                damage: damage.map(|(radius, amount)| DamageSpec { radius, amount }),
                zone: None,
                min_fill_level,
            },
        )
}

fn arb_profile() -> impl Strategy<Value = HazardProfile> {
    proptest::collection::vec(arb_phase(), 1..8).prop_map(|phases| HazardProfile {
        key: "generated".to_string(),
        label: "Generated".to_string(),
        scalable: true,
        alert: None,
        persistent_smoke: None,
        phases,
    })
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    /// Every scaled output respects the 0.1 scale floor: a resolved radius
    /// is never smaller than `base × MIN_SCALE`.
    #[test]
    fn resolved_radius_never_below_floor(
        profile in arb_profile(),
        fill in 0.0f32..=1.0,
    ) {
        for phase in resolve(&profile, fill) {
            prop_assert!(phase.radius >= 0.1 * MIN_SCALE - 1e-6);
        }
    }

    /// Raising the fill level never shrinks any resolved scaled value and
    /// never removes a phase that a lower fill admitted.
    #[test]
    fn scaling_is_monotonic_in_fill(
        profile in arb_profile(),
        lo in 0.0f32..=1.0,
        hi in 0.0f32..=1.0,
    ) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let at_lo = resolve(&profile, lo);
        let at_hi = resolve(&profile, hi);

        prop_assert!(at_hi.len() >= at_lo.len());

        // Resolution preserves template order, so walking the template with
        // both gates pairs each low-fill survivor with its high-fill twin.
        let mut lo_idx = 0;
        let mut hi_idx = 0;
        let lo_scale = scale_factor(true, lo);
        let hi_scale = scale_factor(true, hi);
        for phase in &profile.phases {
            let in_lo = phase.always_fire || phase.min_fill_level.is_none_or(|g| lo_scale >= g);
            let in_hi = phase.always_fire || phase.min_fill_level.is_none_or(|g| hi_scale >= g);
            if in_lo {
                prop_assert!(in_hi, "phase admitted at low fill must survive high fill");
                let low = &at_lo[lo_idx];
                let high = &at_hi[hi_idx];
                prop_assert!(high.radius >= low.radius - 1e-5);
                if let (Some(ld), Some(hd)) = (low.damage, high.damage) {
                    prop_assert!(hd.radius >= ld.radius - 1e-5);
                    prop_assert!(hd.amount >= ld.amount - 1e-5);
                }
                lo_idx += 1;
            }
            if in_hi {
                hi_idx += 1;
            }
        }
    }

    /// Fixed values ignore the fill level entirely.
    #[test]
    fn fixed_values_are_fill_independent(
        base in 0.1f32..100.0,
        fill_a in 0.0f32..=1.0,
        fill_b in 0.0f32..=1.0,
    ) {
        let a = Scalable::Fixed(base).resolve(scale_factor(true, fill_a));
        let b = Scalable::Fixed(base).resolve(scale_factor(true, fill_b));
        prop_assert!((a - b).abs() < f32::EPSILON);
        prop_assert!((a - base).abs() < f32::EPSILON);
    }

    /// `always_fire` phases survive every fill level; gated phases survive
    /// exactly when the floored effective scale reaches their gate.
    #[test]
    fn gating_matches_effective_scale(
        profile in arb_profile(),
        fill in 0.0f32..=1.0,
    ) {
        let scale = scale_factor(true, fill);
        let resolved = resolve(&profile, fill);
        let expected = profile
            .phases
            .iter()
            .filter(|p| p.always_fire || p.min_fill_level.is_none_or(|gate| scale >= gate))
            .count();
        prop_assert_eq!(resolved.len(), expected);
    }

    /// The scale floor is total: every fill in `[0, 0.1]` resolves to the
    /// same phase set and the same values as fill 0.1.
    #[test]
    fn fills_below_floor_resolve_like_the_floor(
        profile in arb_profile(),
        fill in 0.0f32..=0.1,
    ) {
        let below = resolve(&profile, fill);
        let floor = resolve(&profile, MIN_SCALE);
        prop_assert_eq!(below.len(), floor.len());
        for (a, b) in below.iter().zip(&floor) {
            prop_assert!((a.radius - b.radius).abs() < f32::EPSILON);
            prop_assert_eq!(&a.name, &b.name);
        }
    }

    /// Chain counts floor at the scaled bounds and never invert.
    #[test]
    fn chain_counts_floor_and_stay_ordered(
        lo in 1.0f32..10.0,
        span in 0.0f32..10.0,
        fill in 0.0f32..=1.0,
    ) {
        let count = ChainCount::Scaled { base: [lo, lo + span] };
        let [min, max] = count.resolve(scale_factor(true, fill));
        prop_assert!(min <= max);
        prop_assert_eq!(min, (lo * fill.max(MIN_SCALE)).floor() as u32);
    }

    /// A non-scalable profile resolves identically at every fill level.
    #[test]
    fn non_scalable_ignores_fill(
        mut profile in arb_profile(),
        fill in 0.0f32..=1.0,
    ) {
        profile.scalable = false;
        let at_fill = resolve(&profile, fill);
        let at_full = resolve(&profile, 1.0);
        prop_assert_eq!(at_fill.len(), at_full.len());
        for (a, b) in at_fill.iter().zip(&at_full) {
            prop_assert!((a.radius - b.radius).abs() < f32::EPSILON);
        }
    }
}
