use std::sync::Arc;

use bevy::prelude::*;
use bevy_surface_plot::{
    SurfacePlotPlugin,
    camera::ViewPreset,
    engine::OverlayKind,
    plugin::{OrbitCamera, PlotGuides, SurfacePlot},
    section::Axis as SectionAxis,
    types::{FieldRef, Value},
};

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, SurfacePlotPlugin::default()))
        .add_systems(Startup, setup)
        .add_systems(Update, keyboard)
        .run();
}

fn field(f: impl Fn(Value, Value) -> Value + Send + Sync + 'static) -> FieldRef {
    Arc::new(f)
}

fn fields() -> Vec<(&'static str, FieldRef)> {
    vec![
        ("x^2 + y^2", field(|x, y| (x * x + y * y) / 10.)),
        ("x^2 - y^2", field(|x, y| (x * x - y * y) / 10.)),
        ("sin(x) * cos(y)", field(|x, y| 3. * x.sin() * y.cos())),
        ("1 / x", field(|x, _y| 1. / x)),
    ]
}

fn setup(mut commands: Commands, mut plot: ResMut<SurfacePlot>) {
    bevy::log::info!("Surface plot: 1-4 views, G/T/C overlays, L/K axis labels and ticks, arrows move the tangent point, N next field");

    commands.spawn(OrbitCamera::default());
    commands.spawn((
        DirectionalLight::default(),
        Transform::from_xyz(10., 10., 10.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    if let Some((name, field)) = fields().into_iter().next() {
        bevy::log::info!("plotting z = {name}");
        plot.plot_field(field);
    }
}

fn keyboard(
    keys: Res<ButtonInput<KeyCode>>,
    mut plot: ResMut<SurfacePlot>,
    mut guides: ResMut<PlotGuides>,
    mut cameras: Query<&mut OrbitCamera>,
    mut next_field: Local<usize>,
) {
    for (key, preset) in [
        (KeyCode::Digit1, ViewPreset::TopDown),
        (KeyCode::Digit2, ViewPreset::Front),
        (KeyCode::Digit3, ViewPreset::Side),
        (KeyCode::Digit4, ViewPreset::Reset),
    ] {
        if keys.just_pressed(key) {
            for mut camera in cameras.iter_mut() {
                camera.apply_preset(preset);
            }
        }
    }

    for (key, kind) in [
        (KeyCode::KeyT, OverlayKind::TangentPlane),
        (KeyCode::KeyG, OverlayKind::Gradient),
        (KeyCode::KeyC, OverlayKind::CrossSection),
    ] {
        if keys.just_pressed(key) {
            let enabled = !plot.overlays().get(kind);
            plot.toggle_overlay(kind, enabled);
        }
    }

    if keys.just_pressed(KeyCode::KeyL) {
        guides.state.axis_labels = !guides.state.axis_labels;
    }
    if keys.just_pressed(KeyCode::KeyK) {
        guides.state.coordinates = !guides.state.coordinates;
    }

    let (x0, y0) = plot.overlay_request().tangent_point;
    let mut moved = (x0, y0);
    if keys.just_pressed(KeyCode::ArrowLeft) {
        moved.0 -= 1.;
    }
    if keys.just_pressed(KeyCode::ArrowRight) {
        moved.0 += 1.;
    }
    if keys.just_pressed(KeyCode::ArrowDown) {
        moved.1 -= 1.;
    }
    if keys.just_pressed(KeyCode::ArrowUp) {
        moved.1 += 1.;
    }
    if moved != (x0, y0) {
        plot.set_tangent_point(moved.0, moved.1);
        plot.set_cross_section(SectionAxis::X, moved.0);
        if let Some(readout) = plot.readout() {
            bevy::log::info!(
                "at ({}, {}): df/dx = {:.3}, df/dy = {:.3}, {}",
                readout.x0,
                readout.y0,
                readout.dfdx,
                readout.dfdy,
                readout.classification
            );
        }
    }

    if keys.just_pressed(KeyCode::KeyN) {
        let mut all = fields();
        *next_field = (*next_field + 1) % all.len();
        let (name, field) = all.swap_remove(*next_field);
        bevy::log::info!("plotting z = {name}");
        plot.plot_field(field);
    }
}
