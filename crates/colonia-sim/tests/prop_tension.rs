//! Property-based tests for tension bounds and levels.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use colonia_sim::Tension;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// No sequence of changes leaves the bounds.
    #[test]
    fn prop_tension_stays_bounded(deltas in prop::collection::vec(-2000i32..2000, 0..40)) {
        let mut tension = Tension::default();
        for delta in deltas {
            let value = tension.modify(delta);
            prop_assert!((Tension::MIN..=Tension::MAX).contains(&value));
            prop_assert_eq!(value, tension.value());
        }
    }

    /// Higher tension never maps to a friendlier level.
    #[test]
    fn prop_level_is_monotone(a in 0i32..=1000, b in 0i32..=1000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(Tension::new(low).level() <= Tension::new(high).level());
    }

    /// Decay moves toward zero and never below it.
    #[test]
    fn prop_decay_never_overshoots(start in 0i32..=1000, amount in 0i32..200) {
        let mut tension = Tension::new(start);
        tension.decay(amount);
        prop_assert!(tension.value() <= start);
        prop_assert!(tension.value() >= 0);
    }
}
