//! Order statistics over frame durations
//!
//! Deterministic quickselect: middle-index pivot, single-pass Lomuto
//! partition. Slices are reordered in place, so callers hand in a scratch
//! copy rather than the sample store itself.

use crate::config::LowMethod;

/// Returns the `k`-th smallest value (0-based) of `values`, reordering it.
///
/// An empty slice yields 0; `k` past the end selects the largest value.
pub fn select_nth(values: &mut [u64], k: usize) -> u64 {
    let Some(last) = values.len().checked_sub(1) else {
        return 0;
    };
    let k = k.min(last);

    let mut left = 0;
    let mut right = last;
    loop {
        if left == right {
            return values[left];
        }

        let pivot = left + (right - left) / 2;
        let (lo, hi) = partition(values, left, right, pivot);

        if k < lo {
            right = lo - 1;
        } else if k > hi {
            left = hi + 1;
        } else {
            return values[k];
        }
    }
}

/// Lomuto partition of `values[left..=right]` around `values[pivot]`.
///
/// Returns the index range `lo..=hi` holding values equal to the pivot:
/// everything before `lo` is smaller, everything after `hi` is larger.
fn partition(values: &mut [u64], left: usize, right: usize, pivot: usize) -> (usize, usize) {
    let pivot_value = values[pivot];
    values.swap(pivot, right);

    let mut store = left;
    for i in left..right {
        if values[i] < pivot_value {
            values.swap(store, i);
            store += 1;
        }
    }
    values.swap(right, store);

    // Gather duplicates of the pivot next to it; identical frame times are
    // common (vsync) and would otherwise shrink the range one slot per pass.
    let mut hi = store;
    for i in store + 1..=right {
        if values[i] == pivot_value {
            hi += 1;
            values.swap(hi, i);
        }
    }

    (store, hi)
}

/// Index of the `p`-th percentile (0.0..=1.0) among `n` ascending values.
pub fn percentile_index(n: usize, p: f64) -> usize {
    if n <= 1 {
        return 0;
    }
    let p = p.clamp(0.0, 1.0);
    let rank = (n as f64 * p).ceil() as usize;
    rank.saturating_sub(1).min(n - 1)
}

/// Number of worst frames averaged for a given fraction: `max(1, ceil(n * fraction))`.
pub fn worst_count(n: usize, worst_fraction: f64) -> usize {
    ((n as f64 * worst_fraction).ceil() as usize).clamp(1, n.max(1))
}

/// Mean of exactly the `k` largest values, reordering `values`.
///
/// Values tied with the selection threshold are counted only as often as
/// needed to reach `k`, so the result does not depend on tie order.
pub fn mean_worst_k(values: &mut [u64], k: usize) -> u64 {
    let n = values.len();
    if n == 0 || k == 0 {
        return 0;
    }
    let k = k.min(n);

    let threshold = select_nth(values, n - k);

    let mut sum: u128 = 0;
    let mut above = 0usize;
    for &v in values.iter() {
        if v > threshold {
            sum += u128::from(v);
            above += 1;
        }
    }
    if above < k {
        sum += (k - above) as u128 * u128::from(threshold);
    }

    u64::try_from(sum / k as u128).unwrap_or(u64::MAX)
}

/// Representative "low" frame duration of `values` for the worst `worst_fraction`.
///
/// - [`LowMethod::Percentile`]: the frame at the `1 - worst_fraction` percentile
/// - [`LowMethod::MeanWorst`]: the mean of the `ceil(n * worst_fraction)` worst frames
pub fn low_frame_ns(values: &mut [u64], method: LowMethod, worst_fraction: f64) -> u64 {
    let n = values.len();
    if n == 0 {
        return 0;
    }
    match method {
        LowMethod::MeanWorst => mean_worst_k(values, worst_count(n, worst_fraction)),
        LowMethod::Percentile => {
            let index = percentile_index(n, 1.0 - worst_fraction);
            select_nth(values, index)
        }
    }
}
