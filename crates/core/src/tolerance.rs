//! Floating point comparison with an explicit tolerance.
//!
//! Positions and extents are accumulated from sums of item dimensions, so
//! every equality or ordering test on them goes through these helpers.

/// Absolute tolerance used for all length, area and weight comparisons.
pub const EPSILON: f64 = 1e-6;

/// Returns true if `a` and `b` are equal within [`EPSILON`].
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= EPSILON
}

/// Returns true if `a <= b` within [`EPSILON`].
#[inline]
pub fn approx_le(a: f64, b: f64) -> bool {
    a <= b + EPSILON
}

/// Returns true if `a >= b` within [`EPSILON`].
#[inline]
pub fn approx_ge(a: f64, b: f64) -> bool {
    a + EPSILON >= b
}

/// Returns true if `a < b` by more than [`EPSILON`].
#[inline]
pub fn definitely_lt(a: f64, b: f64) -> bool {
    a < b - EPSILON
}

/// Returns true if `a > b` by more than [`EPSILON`].
#[inline]
pub fn definitely_gt(a: f64, b: f64) -> bool {
    a > b + EPSILON
}

/// Floors `value / unit` to a whole count, saturating on infinite or
/// non-positive units.
pub fn whole_count(value: f64, unit: f64) -> u64 {
    if unit <= 0.0 {
        return u64::MAX;
    }
    let ratio = value / unit + EPSILON;
    if ratio <= 0.0 {
        0
    } else {
        // `as` saturates for infinities and out-of-range values.
        ratio.floor() as u64
    }
}
