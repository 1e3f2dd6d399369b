use crate::types::{Rgb, Value, Vector};

/// Sampling and styling parameters for a plot.
///
/// Inserted as a resource by [`SurfacePlotPlugin`](crate::plugin::SurfacePlotPlugin);
/// changes take effect on the next plot or overlay recompute.
///
/// ```rust,ignore
/// app.add_plugins(SurfacePlotPlugin {
///     config: PlotConfig { resolution: 80, ..default() },
///     ..default()
/// });
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    /// The domain is `[-half_range, half_range]²`, and heights are shaded over
    /// the same range. Default: `10`.
    pub half_range: Value,
    /// Surface cells per side. Default: `50`.
    pub resolution: usize,
    /// Spacing of the gradient glyph grid. Default: `4`.
    pub gradient_step: Value,
    /// Spacing of cross-section samples. Default: `0.2`.
    pub section_step: Value,
    /// Side length of the tangent-plane patch. Default: `4`.
    pub tangent_patch_size: Value,
    /// Cells per side of the tangent-plane patch. Default: `10`.
    pub tangent_patch_segments: usize,
    pub surface_color: Rgb,
    pub surface_opacity: f32,
    pub tangent_color: Rgb,
    pub tangent_opacity: f32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            half_range: 10.,
            resolution: 50,
            gradient_step: 4.,
            section_step: 0.2,
            tangent_patch_size: 4.,
            tangent_patch_segments: 10,
            surface_color: Rgb::from_hex(0x44ff44),
            surface_opacity: 0.7,
            tangent_color: Rgb::from_hex(0xffaa44),
            tangent_opacity: 0.6,
        }
    }
}

/// Tuning for [`OrbitController`](crate::camera::OrbitController).
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitSettings {
    /// When `false`, every input event is ignored. Ticks still run.
    pub enabled: bool,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    /// Inertial settling of pending motion. Default: `true`.
    pub enable_damping: bool,
    /// Fraction of pending motion applied per tick while damping. Default: `0.05`.
    pub damping_factor: Value,
    pub rotate_speed: Value,
    pub zoom_speed: Value,
    pub pan_speed: Value,
    /// Default: `5`.
    pub min_distance: Value,
    /// Default: `50`.
    pub max_distance: Value,
    /// Polar angle range measured from the up axis. Default: `[0, π]`.
    pub min_polar_angle: Value,
    pub max_polar_angle: Value,
    /// Vertical field of view used to scale panning. Default: `60`.
    pub fov_degrees: Value,
    /// World up; the camera orbits about it and polar angles are measured from it.
    /// Default: `+Y`.
    pub up: Vector,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.,
            zoom_speed: 1.,
            pan_speed: 1.,
            min_distance: 5.,
            max_distance: 50.,
            min_polar_angle: 0.,
            max_polar_angle: std::f64::consts::PI,
            fov_degrees: 60.,
            up: Vector::y(),
        }
    }
}
