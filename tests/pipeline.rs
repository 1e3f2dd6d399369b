use std::sync::Arc;

use approx::assert_abs_diff_eq;
use bevy_surface_plot::{
    axes::natural_point,
    camera::{OrbitController, PointerButton, ViewPreset},
    config::{OrbitSettings, PlotConfig},
    derivatives::CriticalPointClass,
    engine::{OverlayKind, OverlayState, PlotEngine},
    error::ParseError,
    section::Axis,
    types::{FieldRef, Value},
};

fn saddle() -> FieldRef {
    Arc::new(|x: Value, y: Value| x * x - y * y)
}

fn bowl() -> FieldRef {
    Arc::new(|x: Value, y: Value| x * x + y * y)
}

#[test]
fn default_plot_has_full_topology_and_all_overlays() {
    let mut engine = PlotEngine::new(PlotConfig::default()).unwrap();
    engine.set_overlays(OverlayState {
        tangent: true,
        gradient: true,
        cross_section: true,
    });
    engine.plot_field(saddle());

    let frame = engine.frame();
    let surface = frame.surface.as_ref().unwrap();
    assert_eq!(surface.vertex_count(), 51 * 51);
    assert_eq!(surface.triangle_count(), 2 * 50 * 50);

    let tangent = frame.overlays.tangent_plane.as_ref().unwrap();
    assert_eq!(tangent.vertex_count(), 11 * 11);
    // grid at step 4 over [-10, 10]: 6 × 6 points, none flat
    assert_eq!(frame.overlays.glyphs.len(), 36);
    assert_eq!(frame.overlays.cross_section.as_ref().unwrap().points.len(), 101);
}

#[test]
fn surface_vertices_sit_on_the_field() {
    let mut engine = PlotEngine::new(PlotConfig {
        resolution: 8,
        ..PlotConfig::default()
    })
    .unwrap();
    let field = saddle();
    engine.plot_field(field.clone());
    let surface = engine.frame().surface.clone().unwrap();
    for v in 0..surface.vertex_count() {
        let p = natural_point(&surface.vertex(v).position);
        assert_abs_diff_eq!(p.z, field(p.x, p.y), epsilon = 1e-3);
    }
}

#[test]
fn undefined_field_keeps_mesh_whole_but_drops_section_points() {
    let mut engine = PlotEngine::new(PlotConfig::default()).unwrap();
    engine.toggle_overlay(OverlayKind::CrossSection, true);
    engine.set_cross_section(Axis::Y, 0.);
    engine.plot_field(Arc::new(|x: Value, _y: Value| (x - 5.1).sqrt()));

    let frame = engine.frame();
    assert_eq!(frame.surface.as_ref().unwrap().vertex_count(), 51 * 51);
    let line = frame.overlays.cross_section.as_ref().unwrap();
    // only x in [5.2, 10] is defined
    assert_eq!(line.samples, 101);
    assert_eq!(line.points.len(), 25);
    assert!(line.points.iter().all(|p| p.y.is_finite()));
}

#[test]
fn readout_classifies_the_tangent_point() {
    let compiler = |text: &str| -> Result<FieldRef, ParseError> {
        match text {
            "x^2 + y^2" => Ok(bowl()),
            "x^2 - y^2" => Ok(saddle()),
            other => Err(ParseError::new(other)),
        }
    };
    let mut engine = PlotEngine::new(PlotConfig::default()).unwrap();

    engine.plot_expression("x^2 + y^2", &compiler).unwrap();
    assert_eq!(engine.readout().unwrap().classification, CriticalPointClass::Minimum);

    engine.plot_expression("x^2 - y^2", &compiler).unwrap();
    assert_eq!(engine.readout().unwrap().classification, CriticalPointClass::Saddle);

    engine.set_tangent_point(1., 1.);
    let readout = engine.readout().unwrap();
    assert_abs_diff_eq!(readout.dfdx, 2., epsilon = 1e-2);
    assert_abs_diff_eq!(readout.dfdy, -2., epsilon = 1e-2);
}

#[test]
fn camera_settles_after_a_drag_and_reset_restores_home() {
    let mut camera = OrbitController::new(OrbitSettings::default()).with_viewport_height(800.);
    let home = *camera.state();

    camera.pointer_down(PointerButton::Primary, 400., 400.);
    camera.pointer_move(480., 360.);
    camera.pointer_up();

    let mut moving_ticks = 0;
    for _ in 0..1000 {
        if camera.update() {
            moving_ticks += 1;
        }
    }
    assert!(moving_ticks > 10);
    assert!(camera.state().rotate_delta.magnitude() < 1e-12);
    assert!(!camera.update());

    camera.apply_preset(ViewPreset::Reset);
    assert_abs_diff_eq!(camera.state().position, home.position, epsilon = 1e-9);
    assert_abs_diff_eq!(camera.state().target, home.target);
}
