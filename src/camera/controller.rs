use derive_more::Display;
use tracing::{debug, trace};

use crate::{
    camera::state::CameraState,
    config::OrbitSettings,
    types::{Point, Value},
};

/// Radius multiplier per dolly/wheel notch at `zoom_speed = 1`.
const ZOOM_STEP: Value = 0.95;

/// Distance used by the axis-aligned view presets.
pub const PRESET_DISTANCE: Value = 20.;

/// Camera position of the default view.
pub const HOME_POSITION: [Value; 3] = [15., 15., 15.];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Which drag gesture is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum InteractionMode {
    #[default]
    Idle,
    Rotating,
    Panning,
    Dollying,
}

/// Raw input delivered by the host, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { button: PointerButton, x: Value, y: Value },
    PointerMove { x: Value, y: Value },
    PointerUp,
    /// Positive `delta_y` scrolls down, as in DOM wheel events.
    Wheel { delta_y: Value },
}

/// Fixed viewpoints that bypass incremental motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ViewPreset {
    /// Looking down the value axis.
    TopDown,
    Front,
    Side,
    /// The initial three-quarter view.
    Reset,
}

impl ViewPreset {
    pub fn position(&self) -> Point {
        match self {
            Self::TopDown => Point::new(0., PRESET_DISTANCE, 0.),
            Self::Front => Point::new(0., 0., PRESET_DISTANCE),
            Self::Side => Point::new(PRESET_DISTANCE, 0., 0.),
            Self::Reset => Point::from(HOME_POSITION),
        }
    }
}

/// Orbit camera driven by pointer drags and the wheel.
///
/// Input methods only accumulate pending motion; [`update`](OrbitController::update)
/// applies it once per frame.
///
/// ```text
///            primary down             pointer up
///   Idle ───────────────────▶ Rotating ─────────▶ Idle
///   Idle ── middle down ────▶ Panning  ─────────▶ Idle
///   Idle ── secondary down ─▶ Dollying ─────────▶ Idle
///   wheel: zooms only while Idle
/// ```
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub settings: OrbitSettings,
    state: CameraState,
    mode: InteractionMode,
    /// Pointer position at the previous event of the current drag.
    anchor: (Value, Value),
    /// Height of the viewport in pixels; drag distances are relative to it.
    viewport_height: Value,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(OrbitSettings::default())
    }
}

impl OrbitController {
    pub fn new(settings: OrbitSettings) -> Self {
        let state = CameraState::looking_at(ViewPreset::Reset.position(), Point::origin(), settings.up);
        let mut controller = Self {
            settings,
            state,
            mode: InteractionMode::Idle,
            anchor: (0., 0.),
            viewport_height: 1.,
        };
        controller.update();
        controller
    }

    pub fn with_viewport_height(mut self, height: Value) -> Self {
        self.set_viewport_height(height);
        self
    }

    pub fn viewport_height(&self) -> Value {
        self.viewport_height
    }

    pub fn set_viewport_height(&mut self, height: Value) {
        self.viewport_height = height.max(1.);
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown { button, x, y } => self.pointer_down(button, x, y),
            InputEvent::PointerMove { x, y } => self.pointer_move(x, y),
            InputEvent::PointerUp => self.pointer_up(),
            InputEvent::Wheel { delta_y } => self.wheel(delta_y),
        }
    }

    pub fn pointer_down(&mut self, button: PointerButton, x: Value, y: Value) {
        if !self.settings.enabled {
            return;
        }
        let (mode, allowed) = match button {
            PointerButton::Primary => (InteractionMode::Rotating, self.settings.enable_rotate),
            PointerButton::Middle => (InteractionMode::Panning, self.settings.enable_pan),
            PointerButton::Secondary => (InteractionMode::Dollying, self.settings.enable_zoom),
        };
        if !allowed {
            return;
        }
        self.mode = mode;
        self.anchor = (x, y);
    }

    pub fn pointer_move(&mut self, x: Value, y: Value) {
        if !self.settings.enabled || self.mode == InteractionMode::Idle {
            return;
        }
        let (dx, dy) = (x - self.anchor.0, y - self.anchor.1);
        self.anchor = (x, y);

        match self.mode {
            InteractionMode::Rotating => self.rotate(dx, dy),
            InteractionMode::Panning => self.pan(dx, dy),
            InteractionMode::Dollying => {
                if dy > 0. {
                    self.dolly_out();
                } else if dy < 0. {
                    self.dolly_in();
                }
            }
            InteractionMode::Idle => {}
        }
    }

    /// Ends any drag.
    pub fn pointer_up(&mut self) {
        self.mode = InteractionMode::Idle;
    }

    /// Ignored while a drag is in progress.
    pub fn wheel(&mut self, delta_y: Value) {
        if !self.settings.enabled || !self.settings.enable_zoom || self.mode != InteractionMode::Idle {
            return;
        }
        if delta_y < 0. {
            self.dolly_out();
        } else if delta_y > 0. {
            self.dolly_in();
        }
    }

    fn rotate(&mut self, dx: Value, dy: Value) {
        let speed = self.settings.rotate_speed;
        let full_turn = 2. * std::f64::consts::PI / self.viewport_height;
        self.state.rotate_delta.theta -= full_turn * dx * speed;
        self.state.rotate_delta.phi -= full_turn * dy * speed;
    }

    fn pan(&mut self, dx: Value, dy: Value) {
        let speed = self.settings.pan_speed;
        let (dx, dy) = (dx * speed, dy * speed);

        // World units covered by half the viewport height at the target's depth.
        let half_fov = self.settings.fov_degrees.to_radians() / 2.;
        let target_distance = (self.state.position - self.state.target).norm() * half_fov.tan();

        let left = self.state.right_axis() * (-2. * dx * target_distance / self.viewport_height);
        let up = self.state.up_axis() * (2. * dy * target_distance / self.viewport_height);
        self.state.pan_offset += left + up;
    }

    fn zoom_factor(&self) -> Value {
        ZOOM_STEP.powf(self.settings.zoom_speed)
    }

    fn dolly_out(&mut self) {
        self.state.zoom_scale /= self.zoom_factor();
    }

    fn dolly_in(&mut self) {
        self.state.zoom_scale *= self.zoom_factor();
    }

    /// Applies pending motion. Call once per frame.
    ///
    /// Returns `true` if the camera moved enough to be worth re-rendering.
    pub fn update(&mut self) -> bool {
        let (next, moved) = self.state.step(&self.settings);
        self.state = next;
        if moved {
            trace!(
                radius = next.radius(),
                theta = next.theta(),
                phi = next.phi(),
                "orbit camera moved"
            );
        }
        moved
    }

    /// Jumps to `preset`, dropping pending motion and any pan, then runs one update.
    pub fn apply_preset(&mut self, preset: ViewPreset) -> bool {
        debug!(%preset, "applying view preset");
        let mut state = self.state;
        state.clear_pending();
        state.up = self.settings.up.try_normalize(Value::EPSILON).unwrap_or(state.up);
        state.target = Point::origin();
        state.position = preset.position();
        self.state = state;
        self.update()
    }
}
