use std::sync::Arc;

use derive_more::Display;
use tracing::{debug, warn};

use crate::{
    config::PlotConfig,
    derivatives::{CriticalPointClass, DifferentialAnalyzer},
    error::{ParseError, PlotError, Result},
    gradient::{GradientGlyph, sample_field},
    grid::GridSpec,
    mesh::{Shading, SurfaceMesh, synthesize},
    section::{Axis, CrossSectionPolyline, slice},
    types::{FieldRef, Rgb, Value},
    utils::is_valid_sample,
};

/// A few expressions worth trying, in the order they are offered.
pub const SAMPLE_EXPRESSIONS: &[&str] = &[
    "x^2 + y^2",
    "x^2 - y^2",
    "sin(x) * cos(y)",
    "sqrt(x^2 + y^2)",
    "x * y",
    "exp(-(x^2 + y^2) / 10)",
];

/// Turns expression text into a [`ScalarField`](crate::types::ScalarField).
///
/// The returned field must never panic; evaluation failures become `NaN`.
/// Any `Fn(&str) -> Result<FieldRef, ParseError>` is a compiler:
///
/// ```rust,ignore
/// let compiler = |text: &str| my_parser::compile(text).map_err(|e| ParseError::new(e.to_string()));
/// engine.plot_expression("x^2 - y^2", &compiler)?;
/// ```
pub trait ExpressionCompiler {
    fn compile(&self, text: &str) -> core::result::Result<FieldRef, ParseError>;
}

impl<F> ExpressionCompiler for F
where
    F: Fn(&str) -> core::result::Result<FieldRef, ParseError>,
{
    fn compile(&self, text: &str) -> core::result::Result<FieldRef, ParseError> {
        self(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OverlayKind {
    #[display("tangent plane")]
    TangentPlane,
    #[display("gradient field")]
    Gradient,
    #[display("cross section")]
    CrossSection,
}

/// Which overlays are switched on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    pub tangent: bool,
    pub gradient: bool,
    pub cross_section: bool,
}

impl OverlayState {
    pub fn set(&mut self, kind: OverlayKind, enabled: bool) {
        match kind {
            OverlayKind::TangentPlane => self.tangent = enabled,
            OverlayKind::Gradient => self.gradient = enabled,
            OverlayKind::CrossSection => self.cross_section = enabled,
        }
    }

    pub fn get(&self, kind: OverlayKind) -> bool {
        match kind {
            OverlayKind::TangentPlane => self.tangent,
            OverlayKind::Gradient => self.gradient,
            OverlayKind::CrossSection => self.cross_section,
        }
    }
}

/// Overlay parameters besides the on/off switches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRequest {
    pub state: OverlayState,
    pub tangent_point: (Value, Value),
    pub section_axis: Axis,
    pub section_value: Value,
}

impl Default for OverlayRequest {
    fn default() -> Self {
        Self {
            state: OverlayState::default(),
            tangent_point: (0., 0.),
            section_axis: Axis::X,
            section_value: 0.,
        }
    }
}

/// Surface color and opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceStyle {
    pub color: Rgb,
    pub opacity: f32,
}

/// Render-ready overlay geometry. Switched-off overlays are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlays {
    pub tangent_plane: Option<Arc<SurfaceMesh>>,
    pub glyphs: Vec<GradientGlyph>,
    pub cross_section: Option<CrossSectionPolyline>,
}

/// Everything the render host draws for one plot state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotFrame {
    /// Increases with every state change; older frames are never published over newer ones.
    pub generation: u64,
    /// Generation at which the surface inputs last changed.
    pub surface_generation: u64,
    pub surface: Option<Arc<SurfaceMesh>>,
    pub overlays: Overlays,
}

/// Values shown next to the tangent plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentReadout {
    pub x0: Value,
    pub y0: Value,
    pub z0: Value,
    pub dfdx: Value,
    pub dfdy: Value,
    pub classification: CriticalPointClass,
}

/// Builds every enabled overlay for `field`.
///
/// The tangent patch is skipped when the field is undefined at the tangent
/// point, and the cross-section when fewer than two of its samples are valid.
pub fn recompute_overlays(
    field: &FieldRef,
    analyzer: &DifferentialAnalyzer,
    config: &PlotConfig,
    patch: &GridSpec,
    request: &OverlayRequest,
) -> Overlays {
    let mut overlays = Overlays::default();

    if request.state.tangent {
        let (x0, y0) = request.tangent_point;
        let plane = analyzer.tangent_plane(field.as_ref(), x0, y0);
        if is_valid_sample(plane.z0) {
            let patch = patch.with_center(x0, y0);
            let mesh = synthesize(
                plane.into_field().as_ref(),
                &patch,
                config.tangent_color,
                config.tangent_opacity,
                Shading::Flat,
            );
            overlays.tangent_plane = Some(Arc::new(mesh));
        }
    }

    if request.state.gradient {
        overlays.glyphs = sample_field(analyzer, field.as_ref(), config.half_range, config.gradient_step);
    }

    if request.state.cross_section {
        let line = slice(
            field.as_ref(),
            request.section_axis,
            request.section_value,
            config.half_range,
            config.section_step,
        );
        overlays.cross_section = line.is_drawable().then_some(line);
    }

    debug!(
        tangent = overlays.tangent_plane.is_some(),
        glyphs = overlays.glyphs.len(),
        section_points = overlays.cross_section.as_ref().map_or(0, |l| l.points.len()),
        "recomputed overlays"
    );
    overlays
}

/// Immutable snapshot of the engine, enough to build a [`PlotFrame`] off-thread.
#[derive(Clone)]
pub struct FrameJob {
    generation: u64,
    surface_generation: u64,
    field: FieldRef,
    analyzer: DifferentialAnalyzer,
    config: PlotConfig,
    grid: GridSpec,
    patch: GridSpec,
    style: SurfaceStyle,
    request: OverlayRequest,
    /// `Some` when the current surface can be kept.
    reuse_surface: Option<Arc<SurfaceMesh>>,
}

impl FrameJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn run(self) -> PlotFrame {
        let surface = match self.reuse_surface {
            Some(surface) => surface,
            None => Arc::new(synthesize(
                self.field.as_ref(),
                &self.grid,
                self.style.color,
                self.style.opacity,
                Shading::Height,
            )),
        };
        let overlays = recompute_overlays(&self.field, &self.analyzer, &self.config, &self.patch, &self.request);
        PlotFrame {
            generation: self.generation,
            surface_generation: self.surface_generation,
            surface: Some(surface),
            overlays,
        }
    }
}

/// Owns the current field and overlay settings, and the last published frame.
///
/// In immediate mode (the default) every change rebuilds the frame before
/// returning. In deferred mode changes only schedule work: the host takes a
/// [`FrameJob`] with [`frame_job`](PlotEngine::frame_job), runs it wherever it
/// likes, and hands the result back to [`publish`](PlotEngine::publish).
pub struct PlotEngine {
    config: PlotConfig,
    grid: GridSpec,
    patch: GridSpec,
    analyzer: DifferentialAnalyzer,
    field: Option<FieldRef>,
    expression: Option<String>,
    style: SurfaceStyle,
    request: OverlayRequest,
    frame: PlotFrame,
    generation: u64,
    surface_generation: u64,
    pending: bool,
    deferred: bool,
}

impl PlotEngine {
    /// Returns [`PlotError::InvalidGrid`] if either the surface grid or the
    /// tangent patch described by `config` is degenerate.
    pub fn new(config: PlotConfig) -> Result<Self> {
        let (grid, patch) = grids_for(&config)?;
        Ok(Self {
            style: SurfaceStyle {
                color: config.surface_color,
                opacity: config.surface_opacity,
            },
            config,
            grid,
            patch,
            analyzer: DifferentialAnalyzer::default(),
            field: None,
            expression: None,
            request: OverlayRequest::default(),
            frame: PlotFrame::default(),
            generation: 0,
            surface_generation: 0,
            pending: false,
            deferred: false,
        })
    }

    /// Switches to deferred rebuilding.
    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &DifferentialAnalyzer {
        &self.analyzer
    }

    pub fn field(&self) -> Option<&FieldRef> {
        self.field.as_ref()
    }

    /// Text of the last successfully plotted expression.
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    pub fn style(&self) -> SurfaceStyle {
        self.style
    }

    pub fn overlays(&self) -> OverlayState {
        self.request.state
    }

    pub fn overlay_request(&self) -> &OverlayRequest {
        &self.request
    }

    /// Last published frame.
    pub fn frame(&self) -> &PlotFrame {
        &self.frame
    }

    /// Generation the next published frame will carry.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_dirty(&self) -> bool {
        self.pending
    }

    /// Replaces the configuration and re-plots. On error nothing changes.
    pub fn set_config(&mut self, config: PlotConfig) -> Result<()> {
        let (grid, patch) = grids_for(&config)?;
        self.config = config;
        self.grid = grid;
        self.patch = patch;
        self.schedule(true);
        Ok(())
    }

    /// Plots `field` and rebuilds every enabled overlay for it.
    pub fn plot_field(&mut self, field: FieldRef) {
        self.field = Some(field);
        self.expression = None;
        self.schedule(true);
    }

    /// Compiles and plots `text`.
    ///
    /// Blank text, a [`ParseError`], or a field that is undefined at the
    /// origin abort the plot and keep the previous surface.
    pub fn plot_expression(&mut self, text: &str, compiler: &impl ExpressionCompiler) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            warn!("rejected empty expression");
            return Err(PlotError::EmptyExpression);
        }

        let field = compiler.compile(text).map_err(|e| {
            warn!(expression = text, error = %e, "failed to compile expression");
            PlotError::from(e)
        })?;

        if !is_valid_sample(field(0., 0.)) {
            warn!(expression = text, "expression is undefined at the origin");
            return Err(PlotError::NonFiniteAtOrigin);
        }

        self.plot_field(field);
        self.expression = Some(text.to_string());
        Ok(())
    }

    /// Changes surface color and opacity; the surface is rebuilt.
    pub fn set_style(&mut self, color: Rgb, opacity: f32) {
        self.style = SurfaceStyle {
            color,
            opacity: opacity.clamp(0., 1.),
        };
        self.schedule(true);
    }

    pub fn toggle_overlay(&mut self, kind: OverlayKind, enabled: bool) {
        debug!(%kind, enabled, "overlay toggled");
        self.request.state.set(kind, enabled);
        self.schedule(false);
    }

    /// Replaces every overlay switch at once.
    pub fn set_overlays(&mut self, state: OverlayState) {
        self.request.state = state;
        self.schedule(false);
    }

    pub fn set_tangent_point(&mut self, x0: Value, y0: Value) {
        self.request.tangent_point = (x0, y0);
        if self.request.state.tangent {
            self.schedule(false);
        }
    }

    pub fn set_cross_section(&mut self, axis: Axis, value: Value) {
        self.request.section_axis = axis;
        self.request.section_value = value;
        if self.request.state.cross_section {
            self.schedule(false);
        }
    }

    /// Rebuilds all overlays against the current field.
    pub fn recompute_overlays(&mut self) {
        self.schedule(false);
    }

    /// Partial derivatives and classification at the tangent point.
    pub fn readout(&self) -> Option<TangentReadout> {
        let field = self.field.as_ref()?;
        let (x0, y0) = self.request.tangent_point;
        let f = field.as_ref();
        Some(TangentReadout {
            x0,
            y0,
            z0: f(x0, y0),
            dfdx: self.analyzer.partial_x(f, x0, y0),
            dfdy: self.analyzer.partial_y(f, x0, y0),
            classification: self.analyzer.classify_critical_point(f, x0, y0),
        })
    }

    fn schedule(&mut self, surface_changed: bool) {
        if self.field.is_none() {
            return;
        }
        self.generation += 1;
        if surface_changed {
            self.surface_generation = self.generation;
        }
        self.pending = true;
        if !self.deferred {
            self.recompute();
        }
    }

    /// Takes the pending rebuild as a runnable snapshot, if there is one.
    pub fn frame_job(&mut self) -> Option<FrameJob> {
        if !self.pending {
            return None;
        }
        let field = self.field.clone()?;
        self.pending = false;
        // The published surface is only reusable if it was built from the current inputs.
        let reuse_surface = if self.frame.surface_generation == self.surface_generation {
            self.frame.surface.clone()
        } else {
            None
        };
        Some(FrameJob {
            generation: self.generation,
            surface_generation: self.surface_generation,
            field,
            analyzer: self.analyzer,
            config: self.config.clone(),
            grid: self.grid,
            patch: self.patch,
            style: self.style,
            request: self.request,
            reuse_surface,
        })
    }

    /// Installs `frame` unless a newer one is already published.
    ///
    /// Returns whether the frame was accepted.
    pub fn publish(&mut self, frame: PlotFrame) -> bool {
        if frame.generation <= self.frame.generation {
            debug!(
                stale = frame.generation,
                current = self.frame.generation,
                "discarding stale frame"
            );
            return false;
        }
        self.frame = frame;
        true
    }

    /// Runs any pending rebuild on the calling thread.
    pub fn recompute(&mut self) {
        if let Some(job) = self.frame_job() {
            let frame = job.run();
            self.publish(frame);
        }
    }
}

fn grids_for(config: &PlotConfig) -> Result<(GridSpec, GridSpec)> {
    let grid = GridSpec::new(config.half_range, config.resolution)?;
    let patch = GridSpec::new(config.tangent_patch_size / 2., config.tangent_patch_segments)?;
    Ok((grid, patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paraboloid() -> FieldRef {
        Arc::new(|x: Value, y: Value| x * x + y * y)
    }

    fn engine() -> PlotEngine {
        PlotEngine::new(PlotConfig {
            resolution: 10,
            ..PlotConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn nothing_is_built_before_a_plot() {
        let mut e = engine();
        e.toggle_overlay(OverlayKind::Gradient, true);
        assert!(e.frame().surface.is_none());
        assert_eq!(e.generation(), 0);
        assert!(e.readout().is_none());
    }

    #[test]
    fn plotting_builds_surface_and_enabled_overlays() {
        let mut e = engine();
        e.toggle_overlay(OverlayKind::Gradient, true);
        e.plot_field(paraboloid());
        let frame = e.frame();
        assert_eq!(frame.surface.as_ref().unwrap().vertex_count(), 121);
        assert!(!frame.overlays.glyphs.is_empty());
        assert!(frame.overlays.tangent_plane.is_none());
        assert!(frame.overlays.cross_section.is_none());
    }

    #[test]
    fn overlay_toggles_keep_the_surface() {
        let mut e = engine();
        e.plot_field(paraboloid());
        let surface = e.frame().surface.clone().unwrap();
        e.toggle_overlay(OverlayKind::TangentPlane, true);
        e.toggle_overlay(OverlayKind::CrossSection, true);
        let frame = e.frame();
        assert!(Arc::ptr_eq(frame.surface.as_ref().unwrap(), &surface));
        let patch = frame.overlays.tangent_plane.as_ref().unwrap();
        assert_eq!(patch.vertex_count(), 121);
        assert_eq!(frame.overlays.cross_section.as_ref().unwrap().points.len(), 101);

        e.toggle_overlay(OverlayKind::CrossSection, false);
        assert!(e.frame().overlays.cross_section.is_none());
    }

    #[test]
    fn tangent_patch_follows_the_tangent_point() {
        let mut e = engine();
        e.plot_field(paraboloid());
        e.toggle_overlay(OverlayKind::TangentPlane, true);
        e.set_tangent_point(1., 2.);
        let patch = e.frame().overlays.tangent_plane.clone().unwrap();
        // patch centre (x0, f(x0, y0), y0) in render space
        let centre = patch.positions[60];
        assert!((centre[0] - 1.).abs() < 1e-6);
        assert!((centre[1] - 5.).abs() < 1e-6);
        assert!((centre[2] - 2.).abs() < 1e-6);

        let readout = e.readout().unwrap();
        assert!((readout.dfdx - 2.).abs() < 1e-2);
        assert!((readout.dfdy - 4.).abs() < 1e-2);
        assert_eq!(readout.z0, 5.);
    }

    #[test]
    fn tangent_patch_is_skipped_where_undefined() {
        let mut e = engine();
        e.plot_field(Arc::new(|x: Value, _y: Value| x.ln()));
        e.toggle_overlay(OverlayKind::TangentPlane, true);
        assert!(e.frame().overlays.tangent_plane.is_none());
        e.set_tangent_point(2., 0.);
        assert!(e.frame().overlays.tangent_plane.is_some());
    }

    #[test]
    fn rejected_expressions_keep_the_previous_plot() {
        let compiler = |text: &str| -> core::result::Result<FieldRef, ParseError> {
            match text {
                "x^2 + y^2" => Ok(paraboloid()),
                "1/x" => Ok(Arc::new(|x: Value, _y: Value| 1. / x)),
                _ => Err(ParseError::new(format!("unexpected token in {text:?}"))),
            }
        };

        let mut e = engine();
        e.plot_expression("  x^2 + y^2 ", &compiler).unwrap();
        assert_eq!(e.expression(), Some("x^2 + y^2"));
        let generation = e.frame().generation;

        assert!(matches!(e.plot_expression("   ", &compiler), Err(PlotError::EmptyExpression)));
        assert!(matches!(e.plot_expression("x +* y", &compiler), Err(PlotError::Parse(_))));
        assert!(matches!(e.plot_expression("1/x", &compiler), Err(PlotError::NonFiniteAtOrigin)));

        assert_eq!(e.expression(), Some("x^2 + y^2"));
        assert_eq!(e.frame().generation, generation);
    }

    #[test]
    fn style_changes_rebuild_the_surface() {
        let mut e = engine();
        e.plot_field(paraboloid());
        let before = e.frame().surface.clone().unwrap();
        e.set_style(Rgb::from_hex(0xff4444), 3.);
        let after = e.frame().surface.clone().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.opacity, 1.);
        assert_ne!(before.colors, after.colors);
    }

    #[test]
    fn deferred_engine_publishes_only_newer_frames() {
        let mut e = engine().deferred();
        e.plot_field(paraboloid());
        assert!(e.is_dirty());
        assert!(e.frame().surface.is_none());

        let first = e.frame_job().unwrap();
        assert!(!e.is_dirty());
        e.toggle_overlay(OverlayKind::Gradient, true);
        let second = e.frame_job().unwrap();
        assert!(second.generation() > first.generation());

        // the newer job lands first; the older one is discarded
        assert!(e.publish(second.run()));
        assert!(!e.publish(first.run()));
        assert!(!e.frame().overlays.glyphs.is_empty());
    }

    #[test]
    fn overlay_jobs_never_reuse_a_superseded_surface() {
        let mut e = engine().deferred();
        e.plot_field(paraboloid());
        e.recompute();
        let old_surface = e.frame().surface.clone().unwrap();

        e.plot_field(Arc::new(|x: Value, y: Value| x - y));
        let _in_flight = e.frame_job().unwrap();
        e.toggle_overlay(OverlayKind::Gradient, true);
        let frame = e.frame_job().unwrap().run();
        assert!(!Arc::ptr_eq(frame.surface.as_ref().unwrap(), &old_surface));
        assert_ne!(frame.surface.as_ref().unwrap().positions, old_surface.positions);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(PlotEngine::new(PlotConfig {
            resolution: 0,
            ..PlotConfig::default()
        })
        .is_err());

        let mut e = engine();
        let result = e.set_config(PlotConfig {
            tangent_patch_size: 0.,
            ..PlotConfig::default()
        });
        assert!(matches!(result, Err(PlotError::InvalidGrid { .. })));
        assert_eq!(e.config().resolution, 10);
    }
}
