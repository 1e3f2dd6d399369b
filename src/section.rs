use derive_more::Display;

use crate::{
    axes::render_point,
    types::{RenderPoint, ScalarField, Value},
    utils::{is_valid_sample, sample_coord, sample_count},
};

/// Which domain coordinate a cross-section holds fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default)]
pub enum Axis {
    /// `x = value`; the line runs along y.
    #[default]
    #[display("x")]
    X,
    /// `y = value`; the line runs along x.
    #[display("y")]
    Y,
}

/// Points of a 1D slice through a field, in render space.
///
/// Ordered by strictly increasing free coordinate. Samples where the field is
/// undefined are left out, so consecutive points may straddle a gap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossSectionPolyline {
    pub axis: Axis,
    pub fixed_value: Value,
    pub points: Vec<RenderPoint>,
    /// How many positions were evaluated, valid or not.
    pub samples: usize,
}

impl CrossSectionPolyline {
    /// A polyline needs at least two points to draw anything.
    pub fn is_drawable(&self) -> bool {
        self.points.len() > 1
    }
}

/// Samples `function` along the line `axis = fixed_value` from `-half_range`
/// to `half_range` in `step` increments.
pub fn slice(
    function: &ScalarField,
    axis: Axis,
    fixed_value: Value,
    half_range: Value,
    step: Value,
) -> CrossSectionPolyline {
    let samples = sample_count(half_range, step);
    let points = (0..samples)
        .filter_map(|i| {
            let free = sample_coord(half_range, step, i);
            let (x, y) = match axis {
                Axis::X => (fixed_value, free),
                Axis::Y => (free, fixed_value),
            };
            let z = function(x, y);
            is_valid_sample(z).then(|| render_point(x, y, z))
        })
        .collect();

    CrossSectionPolyline {
        axis,
        fixed_value,
        points,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_slice_runs_along_y() {
        let line = slice(&|x: Value, y: Value| x + 2. * y, Axis::X, 3., 1., 0.5);
        assert_eq!(line.samples, 5);
        assert_eq!(line.points.len(), 5);
        // render (x, f, y)
        assert_eq!(line.points[0], RenderPoint::new(3., 1., -1.));
        assert_eq!(line.points[4], RenderPoint::new(3., 5., 1.));
        assert!(line.points.windows(2).all(|w| w[0].z < w[1].z));
    }

    #[test]
    fn y_slice_runs_along_x() {
        let line = slice(&|x: Value, y: Value| x * y, Axis::Y, 2., 10., 0.2);
        assert_eq!(line.samples, 101);
        assert!(line.points.iter().all(|p| p.z == 2.));
        assert!(line.points.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn singular_samples_are_dropped() {
        // 1/x along y = 0 crosses the pole at x = 0.
        let line = slice(&|x: Value, _y: Value| 1. / x, Axis::Y, 0., 1., 0.25);
        assert_eq!(line.samples, 9);
        assert_eq!(line.points.len(), 8);
        assert!(line.points.iter().all(|p| p.y.is_finite()));
        assert!(line.is_drawable());
    }

    #[test]
    fn undefined_everywhere_is_not_drawable() {
        let line = slice(&|_x: Value, _y: Value| Value::NAN, Axis::X, 0., 10., 0.2);
        assert!(line.points.is_empty());
        assert!(!line.is_drawable());

        let single = slice(&|x: Value, _y: Value| (-(x * x)).sqrt(), Axis::Y, 0., 1., 0.5);
        assert_eq!(single.points.len(), 1);
        assert!(!single.is_drawable());
    }
}
