use std::sync::Arc;
use std::time::Duration;

use hostwatch::system::fake::FakeProbe;
use hostwatch::system::rate::{NegativeDeltaPolicy, RateComputer};
use hostwatch::system::snapshot::SnapshotAggregator;
use proptest::prelude::*;

proptest! {
    #[test]
    fn rate_matches_counter_formula(
        r0 in 0u64..1 << 40,
        dr in 0u64..1 << 32,
        t0 in 1u64..1 << 40,
        dt in 1u64..86_400_000,
    ) {
        let rc = RateComputer::starting_at(0, NegativeDeltaPolicy::PassThrough);
        rc.compute_at(r0, 0, t0);
        let rates = rc.compute_at(r0 + dr, 0, t0 + dt);
        let expected = dr as f64 / 1024.0 / (dt as f64 / 1000.0);
        prop_assert!((rates.download_kb_per_sec - expected).abs() <= expected.abs() * 1e-9 + 1e-9);
        prop_assert_eq!(rates.upload_kb_per_sec, 0.0);
    }

    #[test]
    fn clamped_rates_are_never_negative(
        r0 in 0u64..1 << 40,
        r1 in 0u64..1 << 40,
        dt in 0u64..10_000,
    ) {
        let rc = RateComputer::starting_at(0, NegativeDeltaPolicy::ClampToZero);
        rc.compute_at(r0, r0, 1000);
        let rates = rc.compute_at(r1, r1, 1000 + dt);
        prop_assert!(rates.download_kb_per_sec >= 0.0);
        prop_assert!(rates.upload_kb_per_sec >= 0.0);
    }

    #[test]
    fn memory_usage_stays_within_percent_range(
        total in 1u64..1 << 46,
        available_fraction in 0.0f64..=1.0,
    ) {
        let available = (total as f64 * available_fraction) as u64;
        let agg = SnapshotAggregator::new(
            Arc::new(FakeProbe::new().with_memory(total, available.min(total))),
            RateComputer::starting_at(0, NegativeDeltaPolicy::PassThrough),
            Duration::from_millis(1),
        );
        let usage: f64 = agg.stats().memory_usage.parse().unwrap();
        prop_assert!((0.0..=100.0).contains(&usage));
    }
}
