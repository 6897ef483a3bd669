// Display-only estimate of a log's total step count while it is still being decoded.

use std::fmt;

use serde::Serialize;

/// What is known about the total number of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StepCount {
    Unknown,
    Estimated(u64),
    Exact(u64),
}

impl fmt::Display for StepCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepCount::Unknown => write!(f, "???"),
            StepCount::Estimated(n) => write!(f, "est. {n}"),
            StepCount::Exact(n) => write!(f, "{n}"),
        }
    }
}

fn ease_in_out_quad(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// Extrapolate the total step count from the consumed input fraction.
///
/// The result is rounded to a power of ten that shrinks as more of the input
/// has been consumed: early estimates keep only the leading digit, late ones
/// are exact. Never less than `steps_seen`.
pub fn estimate_total(consumed_fraction: f64, steps_seen: usize) -> Option<u64> {
    if steps_seen == 0 || !(consumed_fraction > 0.0) {
        return None;
    }
    let consumed = consumed_fraction.min(1.0);
    let total = steps_seen as f64 / consumed;
    let digits = total.log10();
    let coarseness = (digits * (1.0 - ease_in_out_quad(consumed * 2.0 / 3.0))).trunc();
    let precision = 10f64.powi(coarseness.max(0.0) as i32);
    let rounded = ((total / precision).round() * precision) as u64;
    Some(rounded.max(steps_seen as u64))
}

/// Keeps the displayed estimate from moving backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressEstimator {
    best: u64,
}

impl ProgressEstimator {
    pub fn update(&mut self, consumed_fraction: f64, steps_seen: usize) -> StepCount {
        match estimate_total(consumed_fraction, steps_seen) {
            Some(estimate) => {
                self.best = self.best.max(estimate);
                StepCount::Estimated(self.best)
            }
            None if self.best > 0 => StepCount::Estimated(self.best),
            None => StepCount::Unknown,
        }
    }
}
