use crate::types::{Value, Vector};

/// Smallest polar angle kept away from either pole.
pub const POLE_EPSILON: Value = 1e-6;

/// Spherical coordinates in a Y-up basis.
///
/// ```text
///         +Y
///          |  phi
///          | /
///          |/____ +X
///         /  \
///       +Z    theta (from +Z towards +X)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: Value,
    /// Polar angle from `+Y`, in `[0, π]`.
    pub phi: Value,
    /// Azimuth around `+Y`, measured from `+Z` towards `+X`.
    pub theta: Value,
}

impl Spherical {
    pub fn new(radius: Value, phi: Value, theta: Value) -> Self {
        Self { radius, phi, theta }
    }

    pub fn from_vector(v: &Vector) -> Self {
        let radius = v.norm();
        if radius == 0. {
            return Self::new(0., 0., 0.);
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1., 1.).acos(),
        }
    }

    pub fn to_vector(&self) -> Vector {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Pulls `phi` off the poles, where the azimuth is undefined.
    pub fn make_safe(mut self) -> Self {
        self.phi = self.phi.clamp(POLE_EPSILON, std::f64::consts::PI - POLE_EPSILON);
        self
    }
}
