use std::mem;

use log::debug;
use wgpu::util::DeviceExt;

use crate::mesh::Mesh;

const VEC3_STRIDE: wgpu::BufferAddress = (3 * mem::size_of::<f32>()) as wgpu::BufferAddress;

/// Mesh data uploaded to the GPU: positions in vertex slot 0, normals in
/// slot 1, and a `u32` index buffer.
pub struct GpuBufferSet {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GpuBufferSet {
    /// Vertex layouts matching the buffers, in slot order. Slot `n` feeds
    /// shader location `n`.
    pub const LAYOUTS: [wgpu::VertexBufferLayout<'static>; 2] = [
        wgpu::VertexBufferLayout {
            array_stride: VEC3_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
        },
        wgpu::VertexBufferLayout {
            array_stride: VEC3_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 1,
            }],
        },
    ];

    /// Uploads `mesh` once. The buffers are static; later changes to the mesh
    /// are not seen.
    pub fn from_mesh(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.to_array()).collect();
        let normals: Vec<[f32; 3]> = mesh.normals.iter().map(|n| n.to_array()).collect();

        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-positions")),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let normals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-normals")),
            contents: bytemuck::cast_slice(&normals),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        debug!(
            "uploaded {label}: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.indices.len()
        );

        Self {
            positions,
            normals,
            indices,
            index_count: mesh.indices.len() as u32,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Records an indexed triangle draw of the whole mesh. Does nothing for an
    /// empty mesh.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        if self.index_count == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.positions.slice(..));
        pass.set_vertex_buffer(1, self.normals.slice(..));
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

impl Drop for GpuBufferSet {
    fn drop(&mut self) {
        debug!("releasing mesh buffers");
        self.positions.destroy();
        self.normals.destroy();
        self.indices.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::render::test_device;

    fn triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        mesh.normals = vec![Vector3::new(0.0, 0.0, 1.0); 3];
        mesh.indices = vec![0, 1, 2];
        mesh
    }

    #[test]
    fn layouts_feed_matching_locations() {
        for (slot, layout) in GpuBufferSet::LAYOUTS.iter().enumerate() {
            assert_eq!(layout.array_stride, 12);
            assert_eq!(layout.attributes.len(), 1);
            assert_eq!(layout.attributes[0].shader_location, slot as u32);
            assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x3);
        }
    }

    #[test]
    fn uploads_every_attribute() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let buffers = GpuBufferSet::from_mesh(&device, &triangle(), "triangle");
        assert_eq!(buffers.index_count(), 3);
        assert_eq!(buffers.positions.size(), 36);
        assert_eq!(buffers.normals.size(), 36);
        assert_eq!(buffers.indices.size(), 12);
    }

    #[test]
    fn empty_mesh_uploads_without_error() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let buffers = GpuBufferSet::from_mesh(&device, &Mesh::new(), "empty");
        assert_eq!(buffers.index_count(), 0);
    }
}
