//! Milestone crossing detection
//!
//! Run milestones are fixed single-run thresholds, each rewarded once ever.
//! Cumulative milestones sit on a super-linear schedule:
//! `m_1 = step`, `m_k = m_{k-1} + k * step` (100, 300, 600, 1000, ...).
//! Crossings are detected by comparing bucket indices, so one big run can
//! cross several milestones and every one of them is reported.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "threshold", rename_all = "snake_case")]
pub enum Milestone {
    Run(u64),
    Cumulative(u64),
}

impl Milestone {
    pub fn threshold(&self) -> u64 {
        match self {
            Milestone::Run(t) | Milestone::Cumulative(t) => *t,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Milestone::Run(t) => {
                let cheer = match t {
                    0..100 => "Great job!",
                    100..200 => "Awesome!",
                    _ => "Incredible!",
                };
                let plural = if *t == 1 { "" } else { "s" };
                format!("{cheer} You scored {t} point{plural}!")
            }
            Milestone::Cumulative(t) => format!("Reached {t} total points!"),
        }
    }
}

/// k-th triangular number, exact for any `k: u64`
fn triangular(k: u64) -> u128 {
    let k = k as u128;
    k * (k + 1) / 2
}

/// Threshold of the k-th cumulative milestone, `None` once it exceeds `u64::MAX`
pub fn checked_cumulative_threshold(k: u64, step: u64) -> Option<u64> {
    u64::try_from(triangular(k).checked_mul(step as u128)?).ok()
}

/// Threshold of the k-th cumulative milestone (k = 0 is the origin), saturating
pub fn cumulative_threshold(k: u64, step: u64) -> u64 {
    checked_cumulative_threshold(k, step).unwrap_or(u64::MAX)
}

/// Number of cumulative milestones at or below `value`
///
/// Largest k with `k(k+1)/2 <= value / step`, from the closed form then
/// corrected against float rounding.
pub fn bucket_index(value: u64, step: u64) -> u64 {
    if step == 0 {
        return 0;
    }
    let q = (value / step) as u128;
    let estimate = ((8.0 * q as f64 + 1.0).sqrt() - 1.0) / 2.0;
    let mut k = estimate.max(0.0) as u64;
    while k > 0 && triangular(k) > q {
        k -= 1;
    }
    while triangular(k + 1) <= q {
        k += 1;
    }
    k
}

/// Cumulative thresholds in `(before, after]`, ascending
pub fn crossed_cumulative(before: u64, after: u64, step: u64) -> Vec<u64> {
    if after <= before || step == 0 {
        return Vec::new();
    }
    let from = bucket_index(before, step);
    let to = bucket_index(after, step);
    (from + 1..=to)
        .map(|k| cumulative_threshold(k, step))
        .collect()
}

/// Fixed thresholds reached by this run and never reached before, ascending
pub fn new_run_milestones(
    run_score: u64,
    thresholds: &[u64],
    reached: &BTreeSet<u64>,
) -> Vec<u64> {
    let mut fresh: Vec<u64> = thresholds
        .iter()
        .copied()
        .filter(|t| *t <= run_score && !reached.contains(t))
        .collect();
    fresh.sort_unstable();
    fresh.dedup();
    fresh
}

/// Newly reached milestones: run milestones first, then cumulative ones
pub fn track(
    run_score: u64,
    cumulative_before: u64,
    cumulative_after: u64,
    reached_run: &BTreeSet<u64>,
    run_thresholds: &[u64],
    step: u64,
) -> Vec<Milestone> {
    new_run_milestones(run_score, run_thresholds, reached_run)
        .into_iter()
        .map(Milestone::Run)
        .chain(
            crossed_cumulative(cumulative_before, cumulative_after, step)
                .into_iter()
                .map(Milestone::Cumulative),
        )
        .collect()
}

/// Fraction of the way from the last crossed milestone to the next one
pub fn bucket_progress(value: u64, step: u64) -> f32 {
    if step == 0 {
        return 0.0;
    }
    let k = bucket_index(value, step);
    let lo = cumulative_threshold(k, step);
    let hi = cumulative_threshold(k + 1, step);
    if hi <= lo {
        return 1.0;
    }
    (value - lo) as f32 / (hi - lo) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_schedule_is_superlinear() {
        let got: Vec<u64> = (1..=5).map(|k| cumulative_threshold(k, 100)).collect();
        assert_eq!(got, vec![100, 300, 600, 1000, 1500]);
    }

    #[test]
    fn test_cross_90_to_260() {
        assert_eq!(crossed_cumulative(90, 260, 100), vec![100]);
    }

    #[test]
    fn test_one_run_crosses_several() {
        assert_eq!(crossed_cumulative(50, 1000, 100), vec![100, 300, 600, 1000]);
    }

    #[test]
    fn test_boundary_values() {
        // Landing exactly on a threshold crosses it; starting on one does not re-cross
        assert_eq!(crossed_cumulative(99, 100, 100), vec![100]);
        assert_eq!(crossed_cumulative(100, 299, 100), Vec::<u64>::new());
    }

    #[test]
    fn test_run_milestone_150() {
        let reached = BTreeSet::new();
        assert_eq!(new_run_milestones(150, &[100, 200], &reached), vec![100]);
    }

    #[test]
    fn test_run_milestones_once_ever() {
        let reached: BTreeSet<u64> = [1, 100].into_iter().collect();
        assert_eq!(new_run_milestones(250, &[1, 100, 200], &reached), vec![200]);
    }

    #[test]
    fn test_track_orders_run_before_cumulative() {
        let reached = BTreeSet::new();
        let got = track(210, 90, 300, &reached, &[1, 100, 200], 100);
        assert_eq!(
            got,
            vec![
                Milestone::Run(1),
                Milestone::Run(100),
                Milestone::Run(200),
                Milestone::Cumulative(100),
                Milestone::Cumulative(300),
            ]
        );
    }

    #[test]
    fn test_bucket_progress() {
        assert_eq!(bucket_progress(0, 100), 0.0);
        assert_eq!(bucket_progress(50, 100), 0.5);
        assert_eq!(bucket_progress(100, 100), 0.0);
        assert_eq!(bucket_progress(200, 100), 0.5);
    }

    #[test]
    fn test_huge_totals_stay_bounded() {
        let k = bucket_index(u64::MAX, 100);
        assert!(cumulative_threshold(k, 100) <= u64::MAX);
        assert_eq!(checked_cumulative_threshold(k + 1, 100), None);
        assert!(checked_cumulative_threshold(k, 100).is_some());
        assert_eq!(bucket_index(u64::MAX, 1), 6_074_000_999);
        assert_eq!(bucket_progress(u64::MAX, 100), 1.0);
    }

    #[test]
    fn test_crossings_near_max() {
        let k = bucket_index(u64::MAX, 100);
        let last = cumulative_threshold(k, 100);
        assert_eq!(crossed_cumulative(last - 1, u64::MAX, 100), vec![last]);
        assert!(crossed_cumulative(last, u64::MAX, 100).is_empty());
    }

    #[test]
    fn test_bucket_index_matches_schedule() {
        for k in 1..2000u64 {
            let t = cumulative_threshold(k, 7);
            assert_eq!(bucket_index(t, 7), k);
            assert_eq!(bucket_index(t - 1, 7), k - 1);
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(Milestone::Run(1).message(), "Great job! You scored 1 point!");
        assert_eq!(Milestone::Run(200).message(), "Incredible! You scored 200 points!");
        assert_eq!(Milestone::Cumulative(300).message(), "Reached 300 total points!");
    }

    proptest! {
        #[test]
        fn prop_track_idempotent(run in 0u64..500, before in 0u64..5000, gained in 0u64..2000) {
            let thresholds = [1, 100, 200];
            let mut reached = BTreeSet::new();
            let first = track(run, before, before + gained, &reached, &thresholds, 100);
            for m in &first {
                if let Milestone::Run(t) = m {
                    reached.insert(*t);
                }
            }
            let after = before + gained;
            prop_assert!(track(run, after, after, &reached, &thresholds, 100).is_empty());
        }

        #[test]
        fn prop_crossings_ascending_and_in_range(before in 0u64..10_000, gained in 0u64..10_000) {
            let after = before + gained;
            let crossed = crossed_cumulative(before, after, 100);
            prop_assert!(crossed.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(crossed.iter().all(|t| *t > before && *t <= after));
            let expected = bucket_index(after, 100) - bucket_index(before, 100);
            prop_assert_eq!(crossed.len() as u64, expected);
        }
    }
}
