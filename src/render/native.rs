use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use super::buffers::GpuBufferSet;
use super::shader::{ShaderProgram, ShaderTargets};
use super::shared::{FRAGMENT_SHADER, VERTEX_SHADER};
use crate::app::{aspect_ratio, FrameParams};
use crate::math::Vector3;
use crate::mesh::Mesh;
use crate::settings::ViewerSettings;

/// GPU renderer backed by wgpu that draws one lit mesh into a window.
///
/// Fields drop in declaration order: mesh buffers, shader program, surface
/// and device, and finally the renderer's handle on the window.
pub struct Renderer {
    buffers: GpuBufferSet,
    program: ShaderProgram,
    depth: DepthBuffer,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    settings: ViewerSettings,
    window: Arc<Window>,
}

impl Renderer {
    /// Initializes the GPU for `window`, builds the shader program and
    /// uploads `mesh`. Shader failures do not fail construction; see
    /// [`Renderer::shader_program`].
    pub async fn new(window: Arc<Window>, mesh: &Mesh, settings: ViewerSettings) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::all()),
            ..Default::default()
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        info!("using adapter {:?}", adapter.get_info());

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("viewer-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor, None)
            .await
            .context("failed to create GPU device")?;
        device.on_uncaptured_error(Box::new(|err| error!("GPU error: {err}")));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;

        // Fifo paces presentation to the display refresh.
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let program = ShaderProgram::new(
            &device,
            VERTEX_SHADER,
            FRAGMENT_SHADER,
            &GpuBufferSet::LAYOUTS,
            ShaderTargets {
                color_format: surface_format,
                depth_format: Some(DepthBuffer::FORMAT),
            },
        )
        .await;
        let buffers = GpuBufferSet::from_mesh(&device, mesh, "mesh");

        Ok(Self {
            buffers,
            program,
            depth,
            surface,
            device,
            queue,
            config,
            size,
            settings,
            window,
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Exposes the inner window for event handling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn shader_program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Width over height of the current surface.
    pub fn aspect(&self) -> f32 {
        aspect_ratio(self.size.width, self.size.height)
    }

    /// Resizes the swap chain to match the new dimensions. Zero sized
    /// (minimized) windows keep the previous configuration.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Clears the frame and draws the mesh with the transforms in `frame`.
    pub fn render(&mut self, frame: &FrameParams) -> Result<(), wgpu::SurfaceError> {
        let program = &mut self.program;
        program.set_matrix4("model", &frame.model);
        program.set_matrix4("view", &frame.view);
        program.set_matrix4("projection", &frame.projection);
        program.set_matrix4("normalMatrix", &frame.model.normal_matrix());
        set_vector(program, "lightPos", self.settings.light_position);
        set_vector(program, "lightColor", self.settings.light_color);
        set_vector(program, "objectColor", self.settings.object_color);
        set_vector(program, "viewPos", frame.camera_position);
        program.flush(&self.queue);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let clear = self.settings.clear_color;
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mesh-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(clear.x()),
                            g: f64::from(clear.y()),
                            b: f64::from(clear.z()),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.program.bind(&mut pass);
            self.buffers.draw(&mut pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn set_vector(program: &mut ShaderProgram, name: &str, value: Vector3) {
    program.set_vector3(name, value.x(), value.y(), value.z());
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}
