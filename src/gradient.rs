use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    axes::{render_point, render_vector},
    derivatives::DifferentialAnalyzer,
    types::{RenderPoint, RenderVector, ScalarField, Value},
    utils::{is_valid_sample, sample_coord, sample_count},
};

/// Glyphs shorter than this are not emitted.
pub const MIN_GLYPH_MAGNITUDE: Value = 0.1;

/// Display length cap.
pub const MAX_GLYPH_MAGNITUDE: Value = 3.0;

/// One gradient arrow: placed on the surface, pointing uphill in the domain plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientGlyph {
    /// Surface point `(x, f(x, y), y)` in render space.
    pub origin: RenderPoint,
    /// Unit vector along `(∂f/∂x, 0, ∂f/∂y)` in render space.
    pub direction: RenderVector,
    /// `|∇f|` clamped to [`MAX_GLYPH_MAGNITUDE`].
    pub magnitude: f32,
}

/// Samples the gradient on a coarse grid over `[-half_range, half_range]²`.
///
/// Grid points where the field is undefined are skipped, as are points whose
/// gradient is no longer than [`MIN_GLYPH_MAGNITUDE`]. Glyphs come out in
/// row-major order: x outer, y inner.
pub fn sample_field(
    analyzer: &DifferentialAnalyzer,
    function: &ScalarField,
    half_range: Value,
    step: Value,
) -> Vec<GradientGlyph> {
    let count = sample_count(half_range, step);

    (0..count)
        .into_par_iter()
        .flat_map_iter(|i| {
            let x = sample_coord(half_range, step, i);
            (0..count).filter_map(move |j| {
                let y = sample_coord(half_range, step, j);
                glyph_at(analyzer, function, x, y)
            })
        })
        .collect()
}

fn glyph_at(
    analyzer: &DifferentialAnalyzer,
    function: &ScalarField,
    x: Value,
    y: Value,
) -> Option<GradientGlyph> {
    let z = function(x, y);
    if !is_valid_sample(z) {
        return None;
    }

    let (gx, gy) = analyzer.gradient(function, x, y);
    let magnitude = gx.hypot(gy).min(MAX_GLYPH_MAGNITUDE);
    if !(magnitude > MIN_GLYPH_MAGNITUDE) {
        return None;
    }

    Some(GradientGlyph {
        origin: render_point(x, y, z),
        direction: render_vector(gx, gy, 0.).normalize(),
        magnitude: magnitude as f32,
    })
}
