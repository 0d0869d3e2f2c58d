//! Number formatting shared by snapshots and benchmark artifacts
//!
//! Values are rounded half away from zero on a scaled integer before being
//! printed. Benchmark consumers parse these strings, so the output must stay
//! stable across releases.

/// Rounded whole number; 0 for non-positive or non-finite input.
pub fn whole(v: f64) -> u64 {
    if !(v.is_finite() && v > 0.0) {
        return 0;
    }
    v.round() as u64
}

/// One decimal place; `"0.0"` for non-positive or non-finite input.
pub fn fixed1(v: f64) -> String {
    if !(v.is_finite() && v > 0.0) {
        return "0.0".to_string();
    }
    let t = (v * 10.0).round() as u64;
    format!("{}.{}", t / 10, t % 10)
}

/// Three decimal places; `"0.000"` for non-positive or non-finite input.
pub fn fixed3(v: f64) -> String {
    if !(v.is_finite() && v > 0.0) {
        return "0.000".to_string();
    }
    let t = (v * 1000.0).round() as u64;
    format!("{}.{:03}", t / 1000, t % 1000)
}
