use crate::types::Value;

// linearly map a number from one range to another
pub fn remap(s: Value, range_in: [Value; 2], range_out: [Value; 2]) -> Value {
    range_out[0] + (s - range_in[0]) * (range_out[1] - range_out[0]) / (range_in[1] - range_in[0])
}

// Linear interpolation
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

// Luminance multiplier for a surface sample: 0.5 at the bottom of the height
// range, 1.0 at the top. Not clamped outside the range.
pub fn height_shade(z: Value, half_range: Value) -> Value {
    let height_factor = remap(z, [-half_range, half_range], [0., 1.]);
    lerp(0.5, 1.0, height_factor)
}
