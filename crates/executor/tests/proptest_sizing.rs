//! Property-based tests for LOT_SIZE quantity normalization.
//!
//! Uses `proptest` to verify the sizing invariants across random quantities
//! and step sizes.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use executor::normalize_quantity;

fn step_sizes() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(dec!(0.00001)),
        Just(dec!(0.0001)),
        Just(dec!(0.001)),
        Just(dec!(0.01)),
        Just(dec!(0.1)),
        Just(dec!(0.5)),
        Just(dec!(1)),
    ]
}

fn quantities() -> impl Strategy<Value = Decimal> {
    // Quantities up to 10^7 with up to 6 fractional digits.
    (0u64..10_000_000_000_000, 0u32..=6).prop_map(|(mantissa, scale)| {
        Decimal::new(mantissa as i64, scale)
    })
}

proptest! {
    /// Normalization never rounds up, so the result never exceeds the input.
    #[test]
    fn never_exceeds_input(q in quantities(), s in step_sizes()) {
        let n = normalize_quantity(q, Some(s));
        prop_assert!(n <= q, "normalize({q}, {s}) = {n} > {q}");
    }

    /// The result is an exact multiple of the step size.
    #[test]
    fn result_is_step_multiple(q in quantities(), s in step_sizes()) {
        let n = normalize_quantity(q, Some(s));
        prop_assert!(
            (n % s).is_zero(),
            "normalize({q}, {s}) = {n} is not a multiple of {s}"
        );
    }

    /// Truncation discards strictly less than one full step.
    #[test]
    fn discards_less_than_one_step(q in quantities(), s in step_sizes()) {
        let n = normalize_quantity(q, Some(s));
        prop_assert!(n > q - s, "normalize({q}, {s}) = {n} <= {q} - {s}");
    }

    /// Normalizing an already-normalized quantity changes nothing.
    #[test]
    fn idempotent(q in quantities(), s in step_sizes()) {
        let once = normalize_quantity(q, Some(s));
        let twice = normalize_quantity(once, Some(s));
        prop_assert_eq!(once, twice);
    }

    /// Without a step size, normalization is the identity.
    #[test]
    fn identity_without_step(q in quantities()) {
        prop_assert_eq!(normalize_quantity(q, None), q);
    }
}
