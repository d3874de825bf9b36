//! Core of a small interactive OBJ mesh viewer.
//!
//! Parsing, normalization and camera math live in plain modules that run
//! without a GPU, so they can be tested headless. The `render` module owns
//! everything that talks to wgpu, and the binary wires it to a winit window.

pub mod app;
pub mod camera;
pub mod input;
pub mod math;
pub mod mesh;
pub mod obj;
pub mod render;
pub mod settings;

pub use app::{aspect_ratio, frame_params, FrameParams};
pub use camera::{CameraState, OrbitController};
pub use input::{InputState, MouseButton};
pub use math::{Matrix4, Vector3};
pub use mesh::Mesh;
pub use obj::{load_obj, load_obj_from_str, LoadOptions, LoadStats, LoadedObj, ObjError};
pub use render::{
    GpuBufferSet, Renderer, ShaderDiagnostic, ShaderError, ShaderProgram, ShaderStage,
    UniformBlock,
};
pub use settings::ViewerSettings;
