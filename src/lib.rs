pub mod axes;
pub mod camera;
pub mod config;
pub mod derivatives;
pub mod engine;
pub mod error;
pub mod gradient;
pub mod grid;
pub mod interp;
pub mod mesh;
pub mod plugin;
pub mod section;
pub mod types;
pub mod utils;

pub use plugin::SurfacePlotPlugin;
