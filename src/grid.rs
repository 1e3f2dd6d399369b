use ndarray::{Array2, Zip};

use crate::{
    error::{PlotError, Result},
    types::{ScalarField, Value},
    utils::clamp_sample,
};

/// A square sampling domain split into `resolution × resolution` cells.
///
/// The domain is `[cx - half_range, cx + half_range] × [cy - half_range, cy + half_range]`
/// and has `(resolution + 1)²` corner points. The main surface uses a centered
/// grid; the tangent-plane patch offsets it to the tangent point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    half_range: Value,
    resolution: usize,
    center: (Value, Value),
}

impl GridSpec {
    /// Creates a grid centred on the origin.
    ///
    /// Returns [`PlotError::InvalidGrid`] unless `half_range` is finite and positive,
    /// `resolution ≥ 1`, and every corner index fits in a `u32`.
    pub fn new(half_range: Value, resolution: usize) -> Result<Self> {
        let corners = resolution.checked_add(1).and_then(|n| n.checked_mul(n));
        if !(half_range.is_finite() && half_range > 0.)
            || resolution < 1
            || corners.is_none_or(|c| c > u32::MAX as usize)
        {
            return Err(PlotError::InvalidGrid {
                half_range,
                resolution,
            });
        }
        Ok(Self {
            half_range,
            resolution,
            center: (0., 0.),
        })
    }

    /// Moves the centre of the domain.
    pub fn with_center(mut self, x: Value, y: Value) -> Self {
        self.center = (x, y);
        self
    }

    pub fn half_range(&self) -> Value {
        self.half_range
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn center(&self) -> (Value, Value) {
        self.center
    }

    /// Distance between neighbouring corners: `2·half_range / resolution`.
    pub fn step(&self) -> Value {
        2. * self.half_range / self.resolution as Value
    }

    /// Number of corners along one side.
    pub fn corners_per_side(&self) -> usize {
        self.resolution + 1
    }

    /// Domain coordinates of corner `(i, j)`; `i` walks x, `j` walks y.
    #[inline]
    pub fn corner(&self, i: usize, j: usize) -> (Value, Value) {
        let step = self.step();
        (
            self.center.0 - self.half_range + i as Value * step,
            self.center.1 - self.half_range + j as Value * step,
        )
    }

    /// Evaluates `function` at every corner.
    ///
    /// The result is indexed `[i][j]` like [`corner`](GridSpec::corner). NaN and
    /// infinite samples are stored as `0` so the grid never loses a vertex.
    pub fn sample(&self, function: &ScalarField) -> Array2<Value> {
        let n = self.corners_per_side();
        let mut heights = Array2::<Value>::zeros((n, n));
        Zip::indexed(&mut heights).par_for_each(|(i, j), z| {
            let (x, y) = self.corner(i, j);
            *z = clamp_sample(function(x, y));
        });
        heights
    }

    /// The two triangles of cell `(i, j)` as vertex indices, winding `a,b,c` then `b,d,c`.
    ///
    /// ```text
    ///  j+1  c---d
    ///       | \ |
    ///  j    a---b
    ///       i   i+1
    /// ```
    #[inline]
    pub fn cell_triangles(&self, i: usize, j: usize) -> [[u32; 3]; 2] {
        let n = self.corners_per_side();
        let a = (i * n + j) as u32;
        let b = a + n as u32;
        let c = a + 1;
        let d = b + 1;
        [[a, b, c], [b, d, c]]
    }
}
