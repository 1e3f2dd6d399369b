use std::sync::Arc;

use nalgebra::{Point3, Vector3};

/// Scalar field value, and the type of both domain coordinates.
pub type Value = f64;

/// A point in natural `(x, y, z = f(x, y))` space.
pub type Point = Point3<Value>;

/// A vector in natural `(x, y, z)` space.
pub type Vector = Vector3<Value>;

/// A point in render space, where `y` is up and carries the field value.
pub type RenderPoint = Point3<f32>;

/// A direction in render space.
pub type RenderVector = Vector3<f32>;

/// A two-variable scalar field: maps `(x, y)` to a [`Value`].
///
/// Undefined inputs may return `NaN` or an infinity. The function must be pure,
/// since it is sampled `O(resolution²)` times per plot and from worker threads.
pub type ScalarField = dyn Fn(Value, Value) -> Value + Send + Sync;

/// Shared handle to a [`ScalarField`].
pub type FieldRef = Arc<ScalarField>;

/// Linear RGB triple with components nominally in `[0, 1]`.
///
/// Components are not clamped: height shading may push them past `1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Multiplies every component by `factor`.
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_unpack_per_channel() {
        let c = Rgb::from_hex(0x44ff44);
        assert!((c.r - 68.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.g, 1.0);
        assert!((c.b - 68.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn scaling_does_not_clamp() {
        let c = Rgb::new(1.0, 0.5, 0.0).scaled(1.5);
        assert_eq!(c.to_array(), [1.5, 0.75, 0.0]);
    }
}
