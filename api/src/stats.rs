//! Statistical reducers over reading values.
//!
//! All functions take a materialized slice fetched by a filtered scan and
//! return `None` on empty input, keeping "no data" distinct from zero.

use std::cmp::Reverse;
use std::collections::HashMap;

pub fn min(values: &[i64]) -> Option<i64> {
    values.iter().copied().min()
}

pub fn max(values: &[i64]) -> Option<i64> {
    values.iter().copied().max()
}

/// Arithmetic mean rounded to two decimals, half away from zero.
pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let sum: i64 = values.iter().sum();
    Some(round2(sum as f64 / values.len() as f64))
}

/// Order statistic at percentile `p` (0..=100) with midpoint interpolation:
/// the target rank is `p/100 * (n-1)`; a fractional rank averages the two
/// bracketing sorted values.
pub fn percentile(values: &[i64], p: f64) -> Option<f64> {
    debug_assert!((0.0..=100.0).contains(&p));

    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;

    if lo == hi {
        Some(sorted[lo] as f64)
    } else {
        Some((sorted[lo] + sorted[hi]) as f64 / 2.0)
    }
}

/// Most frequent value. Ties resolve to the smallest value so the result
/// does not depend on scan order.
pub fn mode(values: &[i64]) -> Option<i64> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by_key(|&(value, count)| (count, Reverse(value)))
        .map(|(value, _)| value)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
