use crate::types::Value;

/// Returns `true` when a field sample can be used as-is (neither NaN nor infinite).
#[inline]
pub fn is_valid_sample(v: Value) -> bool {
    v.is_finite()
}

/// Maps a degenerate sample to `0` so a regular grid keeps its topology.
#[inline]
pub fn clamp_sample(v: Value) -> Value {
    if is_valid_sample(v) { v } else { 0. }
}

/// Number of stepped samples in `[-half_range, half_range]`, both ends included
/// when the step divides the range.
///
/// ```text
/// -R    -R+s   -R+2s  ...  -R+(n-1)s <= R
///  0      1      2    ...     n-1
/// ```
///
/// Counting up front instead of accumulating `x += step` keeps the last sample
/// from drifting past `R` through rounding.
#[inline]
pub fn sample_count(half_range: Value, step: Value) -> usize {
    if !(step > 0.) || !(half_range >= 0.) || !step.is_finite() || !half_range.is_finite() {
        return 0;
    }
    ((2. * half_range) / step + 1e-9).floor() as usize + 1
}

/// Coordinate of the `i`-th stepped sample starting at `-half_range`.
#[inline]
pub fn sample_coord(half_range: Value, step: Value, i: usize) -> Value {
    -half_range + i as Value * step
}
