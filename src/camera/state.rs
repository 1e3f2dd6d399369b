use nalgebra::{Matrix3, Rotation3, UnitQuaternion};

use crate::{
    camera::spherical::Spherical,
    config::OrbitSettings,
    types::{Point, Value, Vector},
};

/// Squared distance / quaternion difference below which a tick counts as still.
pub const MOVE_EPSILON: Value = 1e-6;

/// Rotation still to be applied, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotateDelta {
    pub theta: Value,
    pub phi: Value,
}

impl RotateDelta {
    pub fn magnitude(&self) -> Value {
        self.theta.hypot(self.phi)
    }
}

/// Everything the orbit camera knows between ticks.
///
/// Only [`step`](CameraState::step) and the input methods of
/// [`OrbitController`](crate::camera::OrbitController) change it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub target: Point,
    pub position: Point,
    /// Camera orientation; the camera looks down its local `-Z`.
    pub orientation: UnitQuaternion<Value>,
    pub up: Vector,
    /// Coordinates of `position - target` as of the last tick.
    pub spherical: Spherical,
    pub rotate_delta: RotateDelta,
    pub pan_offset: Vector,
    /// Radius multiplier for the next tick; `1` means no zoom.
    pub zoom_scale: Value,
    last_position: Point,
    last_orientation: UnitQuaternion<Value>,
}

impl CameraState {
    /// A camera at `position` looking at `target`, with nothing pending.
    pub fn looking_at(position: Point, target: Point, up: Vector) -> Self {
        let up = up.try_normalize(Value::EPSILON).unwrap_or_else(Vector::y);
        Self {
            target,
            position,
            orientation: look_rotation(&position, &target, &up),
            up,
            spherical: Spherical::from_vector(&(y_up_basis(&up) * (position - target))),
            rotate_delta: RotateDelta::default(),
            pan_offset: Vector::zeros(),
            zoom_scale: 1.,
            last_position: Point::origin(),
            last_orientation: UnitQuaternion::identity(),
        }
    }

    pub fn radius(&self) -> Value {
        self.spherical.radius
    }

    pub fn theta(&self) -> Value {
        self.spherical.theta
    }

    pub fn phi(&self) -> Value {
        self.spherical.phi
    }

    /// Camera-space `+X` in world coordinates.
    pub fn right_axis(&self) -> Vector {
        self.orientation * Vector::x()
    }

    /// Camera-space `+Y` in world coordinates.
    pub fn up_axis(&self) -> Vector {
        self.orientation * Vector::y()
    }

    /// Drops all pending rotation, pan, and zoom.
    pub fn clear_pending(&mut self) {
        self.rotate_delta = RotateDelta::default();
        self.pan_offset = Vector::zeros();
        self.zoom_scale = 1.;
    }

    /// Advances the camera by one frame and reports whether it moved.
    ///
    /// ```text
    /// offset   = position - target, rotated into a Y-up basis
    /// (r,θ,φ)  = spherical(offset)
    /// θ, φ    += pending rotation   (× damping_factor when damping)
    /// φ        = clamp(φ, min_polar, max_polar), then off the poles
    /// r        = clamp(r · zoom, min_distance, max_distance)
    /// target  += pan offset
    /// position = target + cartesian(r,θ,φ), looking at target
    /// pending *= 1 - damping_factor   (or 0 without damping), zoom = 1
    /// ```
    pub fn step(&self, settings: &OrbitSettings) -> (CameraState, bool) {
        let mut next = *self;
        let to_y_up = y_up_basis(&self.up);

        let offset = to_y_up * (self.position - self.target);
        let mut spherical = Spherical::from_vector(&offset);

        let applied = if settings.enable_damping {
            settings.damping_factor
        } else {
            1.
        };
        spherical.theta += self.rotate_delta.theta * applied;
        spherical.phi += self.rotate_delta.phi * applied;

        spherical.phi = settings
            .min_polar_angle
            .max(settings.max_polar_angle.min(spherical.phi));
        spherical = spherical.make_safe();

        spherical.radius = settings
            .min_distance
            .max(settings.max_distance.min(spherical.radius * self.zoom_scale));

        next.target = self.target + self.pan_offset;
        next.position = next.target + to_y_up.inverse() * spherical.to_vector();
        next.orientation = look_rotation(&next.position, &next.target, &self.up);
        next.spherical = spherical;

        if settings.enable_damping {
            let keep = 1. - settings.damping_factor;
            next.rotate_delta.theta *= keep;
            next.rotate_delta.phi *= keep;
            next.pan_offset *= keep;
        } else {
            next.rotate_delta = RotateDelta::default();
            next.pan_offset = Vector::zeros();
        }
        next.zoom_scale = 1.;

        let moved = (self.last_position - next.position).norm_squared() > MOVE_EPSILON
            || 8. * (1. - self.last_orientation.coords.dot(&next.orientation.coords)) > MOVE_EPSILON;
        if moved {
            next.last_position = next.position;
            next.last_orientation = next.orientation;
        }

        (next, moved)
    }
}

/// Rotation taking `up` onto `+Y`.
fn y_up_basis(up: &Vector) -> UnitQuaternion<Value> {
    UnitQuaternion::rotation_between(up, &Vector::y()).unwrap_or_else(|| {
        // up is -Y
        UnitQuaternion::from_axis_angle(&Vector::x_axis(), std::f64::consts::PI)
    })
}

/// Orientation of a camera at `eye` whose local `-Z` faces `target`.
///
/// When the view direction is parallel to `up` the direction is nudged so a
/// right axis still exists.
pub fn look_rotation(eye: &Point, target: &Point, up: &Vector) -> UnitQuaternion<Value> {
    let mut z = eye - target;
    if z.norm_squared() == 0. {
        z.z = 1.;
    }
    z.normalize_mut();

    let mut x = up.cross(&z);
    if x.norm_squared() == 0. {
        if up.z.abs() == 1. {
            z.x += 1e-4;
        } else {
            z.z += 1e-4;
        }
        z.normalize_mut();
        x = up.cross(&z);
    }
    x.normalize_mut();
    let y = z.cross(&x);

    let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
    UnitQuaternion::from_rotation_matrix(&rotation)
}
