//! Mapping from natural `(x, y, z = f(x, y))` space to render space, plus the
//! axis guide descriptors drawn around the plot.
//!
//! Render space is Y-up, so the field value travels on the render `y` axis and
//! the domain `y` coordinate on the render `z` axis:
//!
//! ```text
//!  natural          render
//!  (x, y, z)   →   (x, z, y)
//! ```
//!
//! Every descriptor built from `(x, y, f(x, y))` goes through [`render_point`] or
//! [`render_vector`]; nothing else in the crate hardcodes the swap.

use crate::types::{Point, RenderPoint, RenderVector, Rgb, Value, Vector};

#[inline]
pub fn render_point(x: Value, y: Value, z: Value) -> RenderPoint {
    RenderPoint::new(x as f32, z as f32, y as f32)
}

#[inline]
pub fn render_vector(dx: Value, dy: Value, dz: Value) -> RenderVector {
    RenderVector::new(dx as f32, dz as f32, dy as f32)
}

/// Inverse of [`render_point`].
#[inline]
pub fn natural_point(p: &RenderPoint) -> Point {
    Point::new(p.x as Value, p.z as Value, p.y as Value)
}

/// Inverse of [`render_vector`].
#[inline]
pub fn natural_vector(v: &RenderVector) -> Vector {
    Vector::new(v.x as Value, v.z as Value, v.y as Value)
}

/// A text label anchored in render space.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub text: String,
    pub position: RenderPoint,
    pub color: Rgb,
}

/// A short arrow marking the sign of an axis near its end.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisArrow {
    pub origin: RenderPoint,
    pub direction: RenderVector,
    pub length: f32,
    pub color: Rgb,
}

/// Which axis guides are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideState {
    /// Axis name labels and the signed arrows.
    pub axis_labels: bool,
    /// Numeric ticks along each axis.
    pub coordinates: bool,
}

impl Default for GuideState {
    fn default() -> Self {
        Self {
            axis_labels: true,
            coordinates: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisGuides {
    pub labels: Vec<AxisLabel>,
    pub arrows: Vec<AxisArrow>,
    pub ticks: Vec<AxisLabel>,
}

const ARROW_LENGTH: f32 = 1.5;
const TICK_OFFSET: Value = -0.5;

/// Natural axes in label order, with their positive/negative arrow colors and tick color.
const AXES: [(&str, [Value; 3], u32, u32, u32); 3] = [
    ("X", [1., 0., 0.], 0xff4444, 0x884444, 0xff8888),
    ("Y", [0., 1., 0.], 0x4444ff, 0x444488, 0x8888ff),
    ("Z", [0., 0., 1.], 0x44ff44, 0x448844, 0x88ff88),
];

impl AxisGuides {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.arrows.is_empty() && self.ticks.is_empty()
    }

    /// Every text anchor, labels first.
    pub fn texts(&self) -> impl Iterator<Item = &AxisLabel> {
        self.labels.iter().chain(&self.ticks)
    }
}

/// Builds the guides `state` switches on for a plot spanning
/// `[-half_range, half_range]` on every axis.
///
/// Ticks sit at ±5 and ±10 inside the range; the origin is never labelled.
pub fn axis_guides(half_range: Value, state: GuideState) -> AxisGuides {
    let mut guides = AxisGuides::default();
    if state.axis_labels {
        push_labels(&mut guides, half_range);
    }
    if state.coordinates {
        push_ticks(&mut guides, half_range);
    }
    guides
}

fn push_labels(guides: &mut AxisGuides, half_range: Value) {
    for (name, [ux, uy, uz], positive, negative, _) in AXES {
        let label_at = half_range + 2.;
        guides.labels.push(AxisLabel {
            text: name.to_string(),
            position: render_point(ux * label_at, uy * label_at, uz * label_at),
            color: Rgb::from_hex(positive),
        });

        let arrow_at = half_range - 1.;
        for (sign, color) in [(1., positive), (-1., negative)] {
            guides.arrows.push(AxisArrow {
                origin: render_point(sign * ux * arrow_at, sign * uy * arrow_at, sign * uz * arrow_at),
                direction: render_vector(sign * ux, sign * uy, sign * uz),
                length: ARROW_LENGTH,
                color: Rgb::from_hex(color),
            });
        }
    }
}

fn push_ticks(guides: &mut AxisGuides, half_range: Value) {
    for coord in [5., 10., -5., -10.] {
        if coord > half_range || coord < -half_range {
            continue;
        }
        for (name, [ux, uy, uz], _, _, tick) in AXES {
            // Ticks are nudged off their own axis so the text does not sit on the line.
            let position = match name {
                "Z" => render_point(TICK_OFFSET, 0., coord),
                _ => {
                    let p = [ux * coord, uy * coord, uz * coord];
                    render_point(p[0], p[1], p[2] + TICK_OFFSET)
                }
            };
            guides.ticks.push(AxisLabel {
                text: format!("{coord}"),
                position,
                color: Rgb::from_hex(tick),
            });
        }
    }
}
