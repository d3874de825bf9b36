use std::fmt;
use std::mem;

use bytemuck::{bytes_of, Pod, Zeroable};
use log::{debug, error, trace};
use thiserror::Error;

use crate::math::Matrix4;

/// Entry point the vertex source must define.
pub const VERTEX_ENTRY_POINT: &str = "vs_main";
/// Entry point the fragment source must define.
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    /// Combining both stages into a render pipeline.
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "VERTEX",
            Self::Fragment => "FRAGMENT",
            Self::Link => "PROGRAM",
        })
    }
}

/// Compiler or linker message captured while building a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDiagnostic {
    pub stage: ShaderStage,
    pub message: String,
}

impl fmt::Display for ShaderDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage: {}", self.stage, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader program failed to build: {}", join(diagnostics))]
    Build { diagnostics: Vec<ShaderDiagnostic> },
}

fn join(diagnostics: &[ShaderDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Formats the program renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderTargets {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
}

/// Uniform block shared by both stages. Vectors are padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Uniforms {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    light_pos: [f32; 4],
    light_color: [f32; 4],
    object_color: [f32; 4],
    view_pos: [f32; 4],
}

/// CPU staging copy of the program's uniforms, addressed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    data: Uniforms,
}

impl UniformBlock {
    /// Size of the block in bytes as laid out in WGSL.
    pub const SIZE: u64 = mem::size_of::<Uniforms>() as u64;

    pub fn new() -> Self {
        let identity = Matrix4::IDENTITY.to_cols_array_2d();
        Self {
            data: Uniforms {
                model: identity,
                view: identity,
                projection: identity,
                normal_matrix: identity,
                ..Uniforms::zeroed()
            },
        }
    }

    /// Writes a `mat4x4` uniform. Names the block does not declare are
    /// ignored.
    pub fn set_matrix4(&mut self, name: &str, value: &Matrix4) {
        let slot = match name {
            "model" => &mut self.data.model,
            "view" => &mut self.data.view,
            "projection" => &mut self.data.projection,
            "normalMatrix" => &mut self.data.normal_matrix,
            _ => {
                trace!("no mat4 uniform named {name}");
                return;
            }
        };
        *slot = value.to_cols_array_2d();
    }

    /// Writes a `vec3` uniform. Names the block does not declare are ignored.
    pub fn set_vector3(&mut self, name: &str, x: f32, y: f32, z: f32) {
        let slot = match name {
            "lightPos" => &mut self.data.light_pos,
            "lightColor" => &mut self.data.light_color,
            "objectColor" => &mut self.data.object_color,
            "viewPos" => &mut self.data.view_pos,
            _ => {
                trace!("no vec3 uniform named {name}");
                return;
            }
        };
        *slot = [x, y, z, 0.0];
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytes_of(&self.data)
    }
}

impl Default for UniformBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Vertex and fragment stages linked into a render pipeline, plus the
/// uniform buffer they read.
///
/// Building never fails outright: compile and link errors are collected as
/// [`ShaderDiagnostic`]s and the program is kept even if it cannot draw.
/// Call [`ShaderProgram::check`] to decide whether that is acceptable.
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    uniforms: UniformBlock,
    diagnostics: Vec<ShaderDiagnostic>,
}

impl ShaderProgram {
    /// Compiles both WGSL stages and links them for the vertex layout in
    /// `layouts`. The sources must define [`VERTEX_ENTRY_POINT`] and
    /// [`FRAGMENT_ENTRY_POINT`].
    pub async fn new(
        device: &wgpu::Device,
        vertex_source: &str,
        fragment_source: &str,
        layouts: &[wgpu::VertexBufferLayout<'_>],
        targets: ShaderTargets,
    ) -> Self {
        let mut diagnostics = Vec::new();
        let vertex =
            compile_stage(device, ShaderStage::Vertex, vertex_source, &mut diagnostics).await;
        let fragment =
            compile_stage(device, ShaderStage::Fragment, fragment_source, &mut diagnostics).await;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(UniformBlock::SIZE),
                },
                count: None,
            }],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform-buffer"),
            size: UniformBlock::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform-bind-group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh-pipeline-layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: VERTEX_ENTRY_POINT,
                buffers: layouts,
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: targets.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: FRAGMENT_ENTRY_POINT,
                targets: &[Some(wgpu::ColorTargetState {
                    format: targets.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
        });

        if let Some(err) = device.pop_error_scope().await {
            diagnostics.push(report(ShaderStage::Link, &err));
        }

        // `vertex` and `fragment` are released here; the pipeline keeps what
        // it needs.
        Self {
            pipeline,
            bind_group,
            uniform_buffer,
            uniforms: UniformBlock::new(),
            diagnostics,
        }
    }

    /// Messages collected while compiling and linking; empty on success.
    pub fn diagnostics(&self) -> &[ShaderDiagnostic] {
        &self.diagnostics
    }

    /// `Ok` when every stage compiled and the pipeline linked.
    pub fn check(&self) -> Result<(), ShaderError> {
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(ShaderError::Build {
                diagnostics: self.diagnostics.clone(),
            })
        }
    }

    /// Makes this program current for the following draws in `pass`.
    pub fn bind<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
    }

    pub fn set_matrix4(&mut self, name: &str, value: &Matrix4) {
        self.uniforms.set_matrix4(name, value);
    }

    pub fn set_vector3(&mut self, name: &str, x: f32, y: f32, z: f32) {
        self.uniforms.set_vector3(name, x, y, z);
    }

    /// Uploads the staged uniforms; they take effect with the next submit.
    pub fn flush(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.uniform_buffer, 0, self.uniforms.as_bytes());
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        debug!("releasing shader program");
        self.uniform_buffer.destroy();
    }
}

async fn compile_stage(
    device: &wgpu::Device,
    stage: ShaderStage,
    source: &str,
    diagnostics: &mut Vec<ShaderDiagnostic>,
) -> wgpu::ShaderModule {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let label = format!("mesh-{}-stage", stage.to_string().to_lowercase());
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = device.pop_error_scope().await {
        diagnostics.push(report(stage, &err));
    }
    module
}

fn report(stage: ShaderStage, err: &wgpu::Error) -> ShaderDiagnostic {
    let diagnostic = ShaderDiagnostic {
        stage,
        message: err.to_string(),
    };
    error!("{diagnostic}");
    diagnostic
}
