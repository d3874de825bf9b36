pub mod buffers;
pub mod native;
pub mod shader;
pub mod shared;

pub use buffers::GpuBufferSet;
pub use native::Renderer;
pub use shader::{
    ShaderDiagnostic, ShaderError, ShaderProgram, ShaderStage, ShaderTargets, UniformBlock,
};
pub use shared::{FRAGMENT_SHADER, VERTEX_SHADER};

/// Headless device for GPU tests. Falls back to a software adapter, and
/// returns `None` (with a note on stderr) when neither is available.
#[cfg(test)]
pub(crate) fn test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::default();
    let request = |force_fallback_adapter| {
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            force_fallback_adapter,
            ..Default::default()
        }))
    };
    let Some(adapter) = request(false).or_else(|| request(true)) else {
        eprintln!("skipping GPU test: no wgpu adapter available");
        return None;
    };
    let descriptor = wgpu::DeviceDescriptor {
        label: Some("test-device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
    };
    match pollster::block_on(adapter.request_device(&descriptor, None)) {
        Ok(pair) => Some(pair),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}
