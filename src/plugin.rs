use bevy::{
    asset::RenderAssetUsages,
    input::mouse::AccumulatedMouseScroll,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
    window::PrimaryWindow,
};

use crate::{
    axes::{AxisGuides, GuideState, axis_guides},
    camera::{InteractionMode, OrbitController, PointerButton},
    config::{OrbitSettings, PlotConfig},
    engine::{PlotEngine, PlotFrame},
    mesh::SurfaceMesh,
    types::{RenderPoint, RenderVector, Rgb, Value},
};

/// System sets for the plot pipeline.
///
/// ```text
/// SurfacePlotSet::Spawn  →  [async compute]  →  SurfacePlotSet::Publish  →  SurfacePlotSet::Upload
/// SurfacePlotSet::Input  →  SurfacePlotSet::Camera
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfacePlotSet {
    /// Feeds mouse input into every [`OrbitCamera`].
    Input,
    /// Ticks every [`OrbitCamera`], writes its [`Transform`], and places guide text.
    Camera,
    /// Spawns an async compute task when the engine has pending work.
    Spawn,
    /// Polls tasks and publishes finished frames into the engine.
    Publish,
    /// Replaces the surface and tangent-plane entities after a new frame lands.
    Upload,
}

/// The plot engine as a resource. Mutate it from your own systems to plot,
/// toggle overlays, or move the tangent point:
///
/// ```rust,ignore
/// fn plot_saddle(mut plot: ResMut<SurfacePlot>) {
///     plot.plot_field(Arc::new(|x, y| x * x - y * y));
/// }
/// ```
#[derive(Resource, Deref, DerefMut)]
pub struct SurfacePlot(pub PlotEngine);

/// Stops or resumes every per-frame system of the plugin.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotTicking {
    pub running: bool,
}

impl Default for PlotTicking {
    fn default() -> Self {
        Self { running: true }
    }
}

impl PlotTicking {
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }
}

/// Axis guide switches and the guides built for the current plot range.
///
/// Guides are rebuilt only when the switches or `half_range` change.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlotGuides {
    pub state: GuideState,
    built: Option<(Value, GuideState)>,
    guides: AxisGuides,
}

impl PlotGuides {
    pub fn guides(&self) -> &AxisGuides {
        &self.guides
    }

    /// Returns `true` if the guides were rebuilt.
    fn refresh(&mut self, half_range: Value) -> bool {
        let key = (half_range, self.state);
        if self.built == Some(key) {
            return false;
        }
        self.guides = axis_guides(half_range, self.state);
        self.built = Some(key);
        true
    }
}

/// Screen-space text pinned to a render-space anchor.
#[derive(Component, Debug, Clone, Copy)]
pub struct GuideText(RenderPoint);

/// Orbit controls for a 3D camera.
#[derive(Component, Deref, DerefMut)]
#[require(Camera3d, Transform)]
pub struct OrbitCamera(pub OrbitController);

impl Default for OrbitCamera {
    fn default() -> Self {
        Self(OrbitController::default())
    }
}

impl OrbitCamera {
    pub fn new(settings: OrbitSettings) -> Self {
        Self(OrbitController::new(settings))
    }
}

/// Marker for entities spawned from the current [`PlotFrame`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotLayer {
    Surface,
    TangentPlane,
}

/// Holds an in-flight frame build.
#[derive(Component)]
pub struct FrameTask(Task<PlotFrame>);

/// Colors of the gizmo overlays.
const GLYPH_COLOR: Color = Color::srgb(1., 0.267, 1.);
const SECTION_COLOR: Color = Color::srgb(1., 1., 0.267);

/// Bevy plugin that renders a [`PlotEngine`] and drives [`OrbitCamera`]s.
///
/// Frames are built on the `AsyncComputeTaskPool` so a high resolution never
/// stalls the main thread. A frame that finishes after a newer one is dropped.
///
/// ```text
/// SurfacePlot changed
///   → FrameTask spawned            (SurfacePlotSet::Spawn)
///   → [async compute runs]
///   → PlotFrame published          (SurfacePlotSet::Publish, once task completes)
///   → Mesh3d entities replaced     (SurfacePlotSet::Upload)
///   → glyphs + cross-section drawn with gizmos every frame
/// ```
#[derive(Default)]
pub struct SurfacePlotPlugin {
    /// Initial value of the [`PlotConfig`] used by the engine.
    pub config: PlotConfig,
}

impl Plugin for SurfacePlotPlugin {
    fn build(&self, app: &mut App) {
        let engine = PlotEngine::new(self.config.clone()).unwrap_or_else(|err| {
            tracing::error!("invalid plot config ({err}), falling back to defaults");
            PlotEngine::new(PlotConfig::default()).expect("default plot config is valid")
        });
        app.insert_resource(SurfacePlot(engine.deferred()))
            .init_resource::<PlotTicking>()
            .init_resource::<PlotGuides>();

        #[cfg(feature = "auto_refresh")]
        app.configure_sets(
            Update,
            (
                (SurfacePlotSet::Input, SurfacePlotSet::Camera).chain(),
                (
                    SurfacePlotSet::Spawn,
                    SurfacePlotSet::Publish,
                    SurfacePlotSet::Upload,
                )
                    .chain(),
            ),
        )
        .add_systems(
            Update,
            (
                orbit_camera_input.in_set(SurfacePlotSet::Input),
                orbit_camera_tick.in_set(SurfacePlotSet::Camera),
                (refresh_guides, place_guide_texts)
                    .chain()
                    .after(orbit_camera_tick)
                    .in_set(SurfacePlotSet::Camera),
                spawn_frame_tasks.in_set(SurfacePlotSet::Spawn),
                poll_frame_tasks.in_set(SurfacePlotSet::Publish),
                upload_frame.in_set(SurfacePlotSet::Upload),
                draw_overlays.after(SurfacePlotSet::Upload),
            )
                .run_if(is_ticking),
        );
    }
}

fn is_ticking(ticking: Res<PlotTicking>) -> bool {
    ticking.running
}

/// Translates mouse buttons, cursor position, and scroll into controller input.
///
/// Bevy reports upward scrolling as positive `y`; the controller expects the
/// DOM convention, so the sign flips.
fn orbit_camera_input(
    buttons: Res<ButtonInput<MouseButton>>,
    scroll: Res<AccumulatedMouseScroll>,
    window: Single<&Window, With<PrimaryWindow>>,
    mut cameras: Query<&mut OrbitCamera>,
) {
    const BUTTONS: [(MouseButton, PointerButton); 3] = [
        (MouseButton::Left, PointerButton::Primary),
        (MouseButton::Middle, PointerButton::Middle),
        (MouseButton::Right, PointerButton::Secondary),
    ];

    let cursor = window.cursor_position();
    let released = BUTTONS.iter().any(|(b, _)| buttons.just_released(*b));

    let height = (window.height() as Value).max(1.);

    // Only touch the component mutably on real input so change detection stays meaningful.
    for mut camera in cameras.iter_mut() {
        if camera.viewport_height() != height {
            camera.set_viewport_height(height);
        }

        if let Some(cursor) = cursor {
            let (x, y) = (cursor.x as Value, cursor.y as Value);
            for (mouse_button, pointer_button) in BUTTONS {
                if buttons.just_pressed(mouse_button) {
                    camera.pointer_down(pointer_button, x, y);
                }
            }
            if camera.mode() != InteractionMode::Idle {
                camera.pointer_move(x, y);
            }
        }
        if released {
            camera.pointer_up();
        }
        if scroll.delta.y != 0. {
            camera.wheel(-scroll.delta.y as Value);
        }
    }
}

/// Advances every orbit camera by one frame.
///
/// The [`Transform`] is written when the tick moves the camera or when the
/// controller was edited since the last tick, e.g. by a view preset.
fn orbit_camera_tick(mut cameras: Query<(&mut OrbitCamera, &mut Transform)>) {
    for (mut camera, mut transform) in cameras.iter_mut() {
        // read before update(), which marks the component changed itself
        let edited = camera.is_changed();
        if camera.update() || edited {
            let state = camera.state();
            let q = &state.orientation;
            transform.translation = Vec3::new(
                state.position.x as f32,
                state.position.y as f32,
                state.position.z as f32,
            );
            transform.rotation = Quat::from_xyzw(q.i as f32, q.j as f32, q.k as f32, q.w as f32);
        }
    }
}

/// Spawns an async compute task for the engine's pending rebuild, if any.
///
/// Tasks still in flight are dropped, which cancels them; their frames would be
/// stale on arrival.
fn spawn_frame_tasks(
    mut commands: Commands,
    mut plot: ResMut<SurfacePlot>,
    in_flight: Query<Entity, With<FrameTask>>,
) {
    let Some(job) = plot.frame_job() else {
        return;
    };
    for entity in in_flight.iter() {
        commands.entity(entity).despawn();
    }
    let task_pool = AsyncComputeTaskPool::get();
    let task = task_pool.spawn(async move { job.run() });
    commands.spawn(FrameTask(task));
}

/// Polls in-flight [`FrameTask`]s and publishes finished frames.
///
/// Non-blocking: tasks that haven't finished are retried next frame.
fn poll_frame_tasks(
    mut commands: Commands,
    mut plot: ResMut<SurfacePlot>,
    mut tasks: Query<(Entity, &mut FrameTask)>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        if let Some(frame) = block_on(future::poll_once(&mut task.0)) {
            plot.publish(frame);
            commands.entity(entity).despawn();
        }
    }
}

/// Replaces the [`PlotLayer`] entities whenever a newer frame has been published.
fn upload_frame(
    mut commands: Commands,
    plot: Res<SurfacePlot>,
    layers: Query<Entity, With<PlotLayer>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut uploaded: Local<u64>,
) {
    let frame = plot.frame();
    if frame.generation == *uploaded {
        return;
    }
    *uploaded = frame.generation;

    for entity in layers.iter() {
        commands.entity(entity).despawn();
    }

    let layers = [
        (PlotLayer::Surface, frame.surface.as_deref()),
        (PlotLayer::TangentPlane, frame.overlays.tangent_plane.as_deref()),
    ];
    for (layer, mesh) in layers {
        let Some(mesh) = mesh else {
            continue;
        };
        let material = StandardMaterial {
            base_color: Color::srgba(1., 1., 1., mesh.opacity),
            alpha_mode: AlphaMode::Blend,
            double_sided: true,
            cull_mode: None,
            ..Default::default()
        };
        commands.spawn((
            layer,
            Mesh3d(meshes.add(to_bevy_mesh(mesh))),
            MeshMaterial3d(materials.add(material)),
            Transform::default(),
        ));
    }
}

/// Respawns the guide text entities after the guides are rebuilt.
fn refresh_guides(
    mut commands: Commands,
    plot: Res<SurfacePlot>,
    mut guides: ResMut<PlotGuides>,
    texts: Query<Entity, With<GuideText>>,
) {
    if !guides.refresh(plot.config().half_range) {
        return;
    }
    for entity in texts.iter() {
        commands.entity(entity).despawn();
    }
    for label in guides.guides().texts() {
        let Rgb { r, g, b } = label.color;
        commands.spawn((
            GuideText(label.position),
            Text::new(label.text.clone()),
            TextFont {
                font_size: 14.,
                ..default()
            },
            TextColor(Color::srgb(r, g, b)),
            Node {
                position_type: PositionType::Absolute,
                ..default()
            },
            Visibility::Hidden,
        ));
    }
}

/// Projects every [`GuideText`] anchor through the first orbit camera.
fn place_guide_texts(
    cameras: Query<(&Camera, &GlobalTransform), With<OrbitCamera>>,
    mut texts: Query<(&GuideText, &mut Node, &mut Visibility)>,
) {
    let Some((camera, camera_transform)) = cameras.iter().next() else {
        return;
    };
    for (anchor, mut node, mut visibility) in texts.iter_mut() {
        match camera.world_to_viewport(camera_transform, to_vec3(&anchor.0)) {
            Ok(screen) => {
                node.left = Val::Px(screen.x);
                node.top = Val::Px(screen.y);
                *visibility = Visibility::Inherited;
            }
            Err(_) => *visibility = Visibility::Hidden,
        }
    }
}

/// Draws gradient glyphs, the cross-section, and axis arrows.
fn draw_overlays(plot: Res<SurfacePlot>, guides: Res<PlotGuides>, mut gizmos: Gizmos) {
    let overlays = &plot.frame().overlays;

    for glyph in &overlays.glyphs {
        let start = to_vec3(&glyph.origin);
        let end = start + to_dir(&glyph.direction) * glyph.magnitude;
        gizmos.arrow(start, end, GLYPH_COLOR);
    }

    if let Some(line) = &overlays.cross_section {
        gizmos.linestrip(line.points.iter().map(to_vec3), SECTION_COLOR);
    }

    for arrow in &guides.guides().arrows {
        let start = to_vec3(&arrow.origin);
        let end = start + to_dir(&arrow.direction) * arrow.length;
        gizmos.arrow(start, end, Color::srgb(arrow.color.r, arrow.color.g, arrow.color.b));
    }
}

/// Copies a [`SurfaceMesh`] into a Bevy [`Mesh`] with position, normal, and color attributes.
pub fn to_bevy_mesh(surface: &SurfaceMesh) -> Mesh {
    let colors: Vec<[f32; 4]> = surface
        .colors
        .iter()
        .map(|[r, g, b]| [*r, *g, *b, 1.])
        .collect();

    let mut bevy_mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, surface.positions.clone());
    bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, surface.normals.clone());
    bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    bevy_mesh.insert_indices(Indices::U32(surface.indices.clone()));
    bevy_mesh
}

#[inline]
fn to_vec3(p: &RenderPoint) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

#[inline]
fn to_dir(v: &RenderVector) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy::tasks::TaskPool;

    use super::*;
    use crate::{
        camera::ViewPreset,
        grid::GridSpec,
        mesh::{Shading, synthesize},
    };

    fn plot_app() -> App {
        let mut app = App::new();
        let engine = PlotEngine::new(PlotConfig::default()).unwrap().deferred();
        app.insert_resource(SurfacePlot(engine))
            .init_resource::<PlotGuides>();
        app
    }

    fn count<C: Component>(app: &mut App) -> usize {
        let world = app.world_mut();
        world.query_filtered::<(), With<C>>().iter(world).count()
    }

    #[test]
    fn bevy_mesh_carries_every_vertex_and_index() {
        let grid = GridSpec::new(2., 4).unwrap();
        let surface = synthesize(&|x: Value, y: Value| x * y, &grid, Rgb::new(1., 0., 0.), 0.5, Shading::Height);
        let mesh = to_bevy_mesh(&surface);
        assert_eq!(mesh.count_vertices(), 25);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(96));
        assert!(mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_some());
        assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
    }

    #[test]
    fn ticking_can_be_stopped_and_resumed() {
        let mut ticking = PlotTicking::default();
        assert!(ticking.running);
        ticking.stop();
        assert!(!ticking.running);
        ticking.resume();
        assert!(ticking.running);
    }

    #[test]
    fn preset_pose_reaches_the_transform() {
        let mut app = App::new();
        app.add_systems(Update, orbit_camera_tick);
        let camera = app.world_mut().spawn(OrbitCamera::default()).id();
        for _ in 0..3 {
            app.update();
        }
        let home = app.world().get::<Transform>(camera).unwrap().translation;
        assert!(home.distance(Vec3::splat(15.)) < 1e-3);

        app.world_mut()
            .get_mut::<OrbitCamera>(camera)
            .unwrap()
            .apply_preset(ViewPreset::TopDown);
        app.update();
        let top = app.world().get::<Transform>(camera).unwrap().translation;
        assert!(top.distance(Vec3::new(0., 20., 0.)) < 1e-3);
    }

    #[test]
    fn newer_work_cancels_frames_in_flight() {
        AsyncComputeTaskPool::get_or_init(TaskPool::new);
        let mut app = plot_app();
        app.add_systems(Update, spawn_frame_tasks);

        app.world_mut()
            .resource_mut::<SurfacePlot>()
            .plot_field(Arc::new(|x: Value, y: Value| x * y));
        app.update();
        app.world_mut()
            .resource_mut::<SurfacePlot>()
            .plot_field(Arc::new(|x: Value, y: Value| x - y));
        app.update();

        assert_eq!(count::<FrameTask>(&mut app), 1);
    }

    #[test]
    fn guides_are_cached_until_range_or_switches_change() {
        let mut guides = PlotGuides::default();
        assert!(guides.refresh(10.));
        assert!(!guides.refresh(10.));
        assert_eq!(guides.guides().arrows.len(), 6);

        assert!(guides.refresh(6.));
        guides.state.coordinates = false;
        assert!(guides.refresh(6.));
        assert!(guides.guides().ticks.is_empty());
    }

    #[test]
    fn switching_guides_off_removes_their_text_and_arrows() {
        let mut app = plot_app();
        app.add_systems(Update, refresh_guides);
        app.update();
        // 3 axis names and 12 ticks
        assert_eq!(count::<GuideText>(&mut app), 15);

        app.world_mut().resource_mut::<PlotGuides>().state = GuideState {
            axis_labels: false,
            coordinates: false,
        };
        app.update();
        assert_eq!(count::<GuideText>(&mut app), 0);
        assert!(app.world().resource::<PlotGuides>().guides().is_empty());
    }
}
