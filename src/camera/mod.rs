//! Orbit camera: spherical coordinates around a look-at target, driven by
//! pointer drags and wheel notches, settled once per frame.

pub mod controller;
pub mod spherical;
pub mod state;

pub use controller::{InputEvent, InteractionMode, OrbitController, PointerButton, ViewPreset};
pub use spherical::Spherical;
pub use state::{CameraState, RotateDelta};
