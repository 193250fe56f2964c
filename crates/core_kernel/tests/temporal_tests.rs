//! EffectivePeriod behavior tests

use chrono::NaiveDate;
use core_kernel::{EffectivePeriod, TemporalError};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn bounded_period_boundaries_are_inclusive() {
    let p = EffectivePeriod::new(d(2024, 1, 1), d(2024, 3, 31)).unwrap();
    assert!(p.contains(d(2024, 1, 1)));
    assert!(p.contains(d(2024, 3, 31)));
    assert!(!p.contains(d(2024, 4, 1)));
}

#[test]
fn open_period_has_no_upper_bound() {
    let p = EffectivePeriod::starting(d(2020, 1, 1));
    assert!(p.contains(d(2099, 12, 31)));
}

#[test]
fn inverted_range_is_rejected() {
    assert!(matches!(
        EffectivePeriod::new(d(2024, 2, 1), d(2024, 1, 1)),
        Err(TemporalError::InvertedPeriod { .. })
    ));
}

#[test]
fn superseding_rows_do_not_overlap_when_adjacent() {
    // The standard supersession pattern: close the old row the day before
    // the new one starts.
    let old = EffectivePeriod::new(d(2023, 1, 1), d(2023, 12, 31)).unwrap();
    let new = EffectivePeriod::starting(d(2024, 1, 1));
    assert!(!old.overlaps(&new));
}

#[test]
fn two_open_periods_always_overlap() {
    let a = EffectivePeriod::starting(d(2020, 1, 1));
    let b = EffectivePeriod::starting(d(2025, 1, 1));
    assert!(a.overlaps(&b));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn day_strategy() -> impl Strategy<Value = NaiveDate> {
        // A generous window around the era the system actually handles.
        (0i64..20_000).prop_map(|offset| d(1990, 1, 1) + chrono::Duration::days(offset))
    }

    fn period_strategy() -> impl Strategy<Value = EffectivePeriod> {
        (day_strategy(), 0i64..5_000, any::<bool>()).prop_map(|(from, len, open)| {
            if open {
                EffectivePeriod::starting(from)
            } else {
                EffectivePeriod::new(from, from + chrono::Duration::days(len)).unwrap()
            }
        })
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in period_strategy(), b in period_strategy()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn a_shared_day_implies_overlap(
            a in period_strategy(),
            b in period_strategy(),
            day in day_strategy()
        ) {
            if a.contains(day) && b.contains(day) {
                prop_assert!(a.overlaps(&b));
            }
        }

        #[test]
        fn disjoint_periods_share_no_day(
            a in period_strategy(),
            b in period_strategy(),
            day in day_strategy()
        ) {
            if !a.overlaps(&b) {
                prop_assert!(!(a.contains(day) && b.contains(day)));
            }
        }
    }
}
