use std::collections::BTreeMap;

use proptest::prelude::*;
use vitalscope::metrics::{Attribution, MetricSample};
use vitalscope::{
    Accumulator, MetricValue, ScoringConfig, ScoringTable, SignalKind, Verdict,
};

fn signal_kind() -> impl Strategy<Value = SignalKind> {
    prop::sample::select(SignalKind::ALL.to_vec())
}

fn verdict() -> impl Strategy<Value = Verdict> {
    prop_oneof![
        Just(Verdict::Good),
        Just(Verdict::NeedsImprovement),
        Just(Verdict::Poor),
    ]
}

fn shift(value: f64, had_recent_input: bool) -> MetricSample {
    MetricSample::new(SignalKind::Cls, value, 0.0).with_attribution(Attribution {
        had_recent_input,
        ..Attribution::default()
    })
}

proptest! {
    #[test]
    fn finalize_only_succeeds_once(kind in signal_kind(), values in prop::collection::vec(0.0f64..5000.0, 0..8)) {
        let mut accumulator = Accumulator::new(kind);
        for value in values {
            accumulator.ingest(MetricSample::new(kind, value, 0.0));
        }
        let frozen = accumulator.value().clone();

        prop_assert!(accumulator.finalize());
        prop_assert!(!accumulator.finalize());
        prop_assert!(accumulator.is_finalized());
        prop_assert_eq!(accumulator.value(), &frozen);
    }

    #[test]
    fn late_samples_never_change_a_finalized_value(
        kind in signal_kind(),
        before in prop::collection::vec(0.0f64..5000.0, 0..5),
        after in prop::collection::vec(0.0f64..5000.0, 1..5),
    ) {
        let mut accumulator = Accumulator::new(kind);
        for value in before {
            accumulator.ingest(MetricSample::new(kind, value, 0.0));
        }
        accumulator.finalize();
        let frozen = accumulator.value().clone();
        let recorded = accumulator.raw_entries().len();

        for value in after {
            prop_assert!(!accumulator.ingest(MetricSample::new(kind, value, 1.0)));
        }
        prop_assert_eq!(accumulator.value(), &frozen);
        prop_assert_eq!(accumulator.raw_entries().len(), recorded);
    }

    #[test]
    fn layout_shift_total_skips_input_driven_shifts(
        shifts in prop::collection::vec((0.0f64..0.5, any::<bool>()), 0..20),
    ) {
        let mut accumulator = Accumulator::new(SignalKind::Cls);
        for (value, had_recent_input) in &shifts {
            accumulator.ingest(shift(*value, *had_recent_input));
        }

        let expected: f64 = shifts
            .iter()
            .filter(|(_, had_recent_input)| !had_recent_input)
            .map(|(value, _)| value)
            .sum();
        let total = accumulator.value().as_scalar().unwrap();
        prop_assert!((total - expected).abs() < 1e-9);
        prop_assert_eq!(accumulator.raw_entries().len(), shifts.len());
    }

    #[test]
    fn classification_follows_inclusive_boundaries(kind in signal_kind(), value in 0.0f64..10_000.0) {
        let table = ScoringTable::default();
        let Some(spec) = table.threshold(kind).copied() else {
            prop_assert_eq!(table.classify(kind, value), None);
            return Ok(());
        };

        let expected = if value <= spec.good {
            Verdict::Good
        } else if value <= spec.needs_improvement {
            Verdict::NeedsImprovement
        } else {
            Verdict::Poor
        };
        prop_assert_eq!(table.classify(kind, value), Some(expected));
        prop_assert_eq!(table.classify(kind, spec.good), Some(Verdict::Good));
        prop_assert_eq!(
            table.classify(kind, spec.needs_improvement),
            Some(Verdict::NeedsImprovement)
        );
    }

    #[test]
    fn values_between_bounds_need_improvement(kind in signal_kind(), fraction in 0.0f64..1.0) {
        let table = ScoringTable::default();
        let Some(spec) = table.threshold(kind).copied() else {
            return Ok(());
        };
        let inside = spec.good + (spec.needs_improvement - spec.good) * fraction;
        if inside > spec.good {
            prop_assert_eq!(table.classify(kind, inside), Some(Verdict::NeedsImprovement));
        }
    }

    #[test]
    fn composite_is_bounded_and_deterministic(
        verdicts in prop::collection::btree_map(signal_kind(), verdict(), 0..7),
    ) {
        let table = ScoringTable::new(&ScoringConfig::default()).unwrap();
        let first = table.composite(&verdicts);
        let second = table.composite(&verdicts);
        prop_assert!(first <= 100);
        prop_assert_eq!(first, second);

        let all_good: BTreeMap<SignalKind, Verdict> =
            verdicts.keys().map(|kind| (*kind, Verdict::Good)).collect();
        prop_assert!(table.composite(&all_good) >= first);
    }

    #[test]
    fn headline_of_series_is_its_largest_sample(values in prop::collection::vec(0.0f64..1000.0, 0..10)) {
        let expected = values.iter().copied().fold(0.0, f64::max);
        prop_assert_eq!(MetricValue::Series(values).headline(), expected);
    }
}

fn epsilon(bound: f64) -> f64 {
    bound.abs().max(1.0) * 1e-6
}

#[test]
fn every_configured_signal_flips_just_past_its_bounds() {
    let table = ScoringTable::default();
    let mut checked = 0;
    for kind in SignalKind::ALL {
        let Some(spec) = table.threshold(kind) else {
            continue;
        };
        assert_eq!(table.classify(kind, spec.good), Some(Verdict::Good), "{kind}");
        assert_eq!(
            table.classify(kind, spec.good + epsilon(spec.good)),
            Some(Verdict::NeedsImprovement),
            "{kind}"
        );
        assert_eq!(
            table.classify(kind, spec.needs_improvement),
            Some(Verdict::NeedsImprovement),
            "{kind}"
        );
        assert_eq!(
            table.classify(kind, spec.needs_improvement + epsilon(spec.needs_improvement)),
            Some(Verdict::Poor),
            "{kind}"
        );
        checked += 1;
    }
    assert_eq!(checked, ScoringConfig::default().thresholds.len());
}
