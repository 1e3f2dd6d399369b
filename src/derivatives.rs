use derive_more::Display;

use crate::{
    types::{FieldRef, ScalarField, Value},
    utils::is_valid_sample,
};

/// Step used by every finite-difference stencil.
pub const DEFAULT_STEP: Value = 0.001;

/// Second partial derivatives at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hessian {
    pub fxx: Value,
    pub fyy: Value,
    pub fxy: Value,
}

impl Hessian {
    pub fn determinant(&self) -> Value {
        self.fxx * self.fyy - self.fxy * self.fxy
    }
}

/// Second-derivative test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CriticalPointClass {
    #[display("minimum")]
    Minimum,
    #[display("maximum")]
    Maximum,
    #[display("saddle")]
    Saddle,
    #[display("indeterminate")]
    Indeterminate,
}

impl CriticalPointClass {
    pub fn from_hessian(hessian: &Hessian) -> Self {
        let det = hessian.determinant();
        if det > 0. {
            if hessian.fxx > 0. {
                Self::Minimum
            } else {
                Self::Maximum
            }
        } else if det < 0. {
            Self::Saddle
        } else {
            // det == 0, or NaN from undefined samples
            Self::Indeterminate
        }
    }
}

/// First-order approximation of a field around `(x0, y0)`:
///
/// ```text
/// z = z0 + fx·(x − x0) + fy·(y − y0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentPlane {
    pub x0: Value,
    pub y0: Value,
    pub z0: Value,
    pub fx: Value,
    pub fy: Value,
}

impl TangentPlane {
    #[inline]
    pub fn value_at(&self, x: Value, y: Value) -> Value {
        self.z0 + self.fx * (x - self.x0) + self.fy * (y - self.y0)
    }

    /// Wraps the plane as a [`ScalarField`] so it can be meshed like any surface.
    pub fn into_field(self) -> FieldRef {
        std::sync::Arc::new(move |x: Value, y: Value| self.value_at(x, y))
    }
}

/// Finite-difference derivatives of a [`ScalarField`].
///
/// First partials use a forward difference and return `0` when either sample
/// is undefined, so overlays stay drawable near singularities. Second partials
/// use central differences with the same step and are not guarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialAnalyzer {
    pub h: Value,
}

impl Default for DifferentialAnalyzer {
    fn default() -> Self {
        Self { h: DEFAULT_STEP }
    }
}

impl DifferentialAnalyzer {
    pub fn new(h: Value) -> Self {
        Self { h }
    }

    /// `∂f/∂x ≈ (f(x + h, y) − f(x, y)) / h`
    pub fn partial_x(&self, f: &ScalarField, x: Value, y: Value) -> Value {
        self.forward(f(x + self.h, y), f(x, y))
    }

    /// `∂f/∂y ≈ (f(x, y + h) − f(x, y)) / h`
    pub fn partial_y(&self, f: &ScalarField, x: Value, y: Value) -> Value {
        self.forward(f(x, y + self.h), f(x, y))
    }

    #[inline]
    fn forward(&self, ahead: Value, here: Value) -> Value {
        if !is_valid_sample(ahead) || !is_valid_sample(here) {
            return 0.;
        }
        (ahead - here) / self.h
    }

    /// `∇f = (∂f/∂x, ∂f/∂y)`
    pub fn gradient(&self, f: &ScalarField, x: Value, y: Value) -> (Value, Value) {
        (self.partial_x(f, x, y), self.partial_y(f, x, y))
    }

    /// `|∇f|`
    pub fn gradient_magnitude(&self, f: &ScalarField, x: Value, y: Value) -> Value {
        let (gx, gy) = self.gradient(f, x, y);
        gx.hypot(gy)
    }

    /// Rate of change along `(dir_x, dir_y)`, which need not be normalized.
    ///
    /// A zero direction yields `0`.
    pub fn directional_derivative(
        &self,
        f: &ScalarField,
        x: Value,
        y: Value,
        dir_x: Value,
        dir_y: Value,
    ) -> Value {
        let magnitude = dir_x.hypot(dir_y);
        if magnitude == 0. {
            return 0.;
        }
        let (gx, gy) = self.gradient(f, x, y);
        gx * (dir_x / magnitude) + gy * (dir_y / magnitude)
    }

    pub fn hessian(&self, f: &ScalarField, x: Value, y: Value) -> Hessian {
        let h = self.h;
        let h2 = h * h;
        let center = f(x, y);
        let fxx = (f(x + h, y) - 2. * center + f(x - h, y)) / h2;
        let fyy = (f(x, y + h) - 2. * center + f(x, y - h)) / h2;
        let fxy = (f(x + h, y + h) - f(x + h, y - h) - f(x - h, y + h) + f(x - h, y - h)) / (4. * h2);
        Hessian { fxx, fyy, fxy }
    }

    pub fn tangent_plane(&self, f: &ScalarField, x0: Value, y0: Value) -> TangentPlane {
        TangentPlane {
            x0,
            y0,
            z0: f(x0, y0),
            fx: self.partial_x(f, x0, y0),
            fy: self.partial_y(f, x0, y0),
        }
    }

    pub fn classify_critical_point(&self, f: &ScalarField, x: Value, y: Value) -> CriticalPointClass {
        CriticalPointClass::from_hessian(&self.hessian(f, x, y))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn paraboloid(x: Value, y: Value) -> Value {
        x * x + y * y
    }

    fn saddle(x: Value, y: Value) -> Value {
        x * x - y * y
    }

    #[test]
    fn partials_of_paraboloid() {
        let d = DifferentialAnalyzer::default();
        assert_abs_diff_eq!(d.partial_x(&paraboloid, 1., 1.), 2., epsilon = 1e-2);
        assert_abs_diff_eq!(d.partial_y(&paraboloid, 1., 1.), 2., epsilon = 1e-2);
        assert_abs_diff_eq!(d.gradient_magnitude(&paraboloid, 1., 1.), 8f64.sqrt(), epsilon = 1e-2);
    }

    #[test]
    fn undefined_samples_give_zero_slope() {
        let d = DifferentialAnalyzer::default();
        let reciprocal = |x: Value, _y: Value| 1. / x;
        assert_eq!(d.partial_x(&reciprocal, 0., 0.), 0.);
        assert_eq!(d.partial_y(&|x: Value, y: Value| (x + y).sqrt(), -1., 0.), 0.);
    }

    #[test]
    fn directional_derivative_normalizes_direction() {
        let d = DifferentialAnalyzer::default();
        let plane = |x: Value, y: Value| 3. * x + 4. * y;
        assert_abs_diff_eq!(d.directional_derivative(&plane, 0., 0., 10., 0.), 3., epsilon = 1e-6);
        assert_abs_diff_eq!(d.directional_derivative(&plane, 0., 0., 0., -2.), -4., epsilon = 1e-6);
        assert_abs_diff_eq!(d.directional_derivative(&plane, 0., 0., 3., 4.), 5., epsilon = 1e-6);
        assert_eq!(d.directional_derivative(&plane, 0., 0., 0., 0.), 0.);
    }

    #[test]
    fn hessian_of_quadratics() {
        let d = DifferentialAnalyzer::default();
        let h = d.hessian(&|x: Value, y: Value| x * x + 3. * x * y - y * y, 0.5, -0.5);
        assert_abs_diff_eq!(h.fxx, 2., epsilon = 1e-3);
        assert_abs_diff_eq!(h.fyy, -2., epsilon = 1e-3);
        assert_abs_diff_eq!(h.fxy, 3., epsilon = 1e-3);
    }

    #[test]
    fn classification() {
        let d = DifferentialAnalyzer::default();
        assert_eq!(d.classify_critical_point(&paraboloid, 0., 0.), CriticalPointClass::Minimum);
        assert_eq!(d.classify_critical_point(&saddle, 0., 0.), CriticalPointClass::Saddle);
        assert_eq!(
            d.classify_critical_point(&|x: Value, y: Value| -(x * x) - y * y, 0., 0.),
            CriticalPointClass::Maximum
        );
        assert_eq!(
            d.classify_critical_point(&|x: Value, y: Value| x + y, 0., 0.),
            CriticalPointClass::Indeterminate
        );
        assert_eq!(
            d.classify_critical_point(&|x: Value, _y: Value| 1. / x, 0., 0.),
            CriticalPointClass::Indeterminate
        );
    }

    #[test]
    fn tangent_plane_touches_the_surface() {
        let d = DifferentialAnalyzer::default();
        let f = |x: Value, y: Value| x.sin() * y.cos() + x * y;
        for (x0, y0) in [(0., 0.), (1.3, -0.7), (-4., 2.5)] {
            let plane = d.tangent_plane(&f, x0, y0);
            assert_eq!(plane.value_at(x0, y0), f(x0, y0));
            let field = plane.into_field();
            assert_eq!(field(x0, y0), f(x0, y0));
        }
    }

    #[test]
    fn tangent_plane_is_linear() {
        let d = DifferentialAnalyzer::default();
        let plane = d.tangent_plane(&paraboloid, 1., 1.);
        let mid = plane.value_at(1.5, 0.5);
        let ends = (plane.value_at(2., 0.) + plane.value_at(1., 1.)) / 2.;
        assert_abs_diff_eq!(mid, ends, epsilon = 1e-9);
    }
}
