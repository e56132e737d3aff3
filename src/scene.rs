// Scene contract and the built-in colored quad
//
// The engine drives anything implementing Renderable; the quad scene is
// the one hardcoded draw this renderer exists to produce.

use std::sync::Arc;

use ash::vk;
use glam::{Vec2, Vec3};

use crate::backend::buffer::MeshBuffer;
use crate::backend::error::Result;
use crate::backend::VulkanDevice;

/// What the render loop needs from a scene: GPU resource setup, a
/// per-frame tick, draw commands for an open render pass, and teardown
/// before the device goes away.
pub trait Renderable {
    fn on_init(&mut self, device: &Arc<VulkanDevice>) -> Result<()>;
    fn on_update(&mut self, dt: f32);
    fn on_render(&self, device: &ash::Device, cmd: vk::CommandBuffer);
    fn on_shutdown(&mut self, device: &Arc<VulkanDevice>);
}

/// Interleaved vertex: 2D position + RGB color
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Vertex {
    pub pos: Vec2,
    pub color: Vec3,
}

pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex {
        pos: Vec2::new(-0.5, -0.5),
        color: Vec3::new(1.0, 0.0, 0.0),
    },
    Vertex {
        pos: Vec2::new(0.5, -0.5),
        color: Vec3::new(0.0, 1.0, 0.0),
    },
    Vertex {
        pos: Vec2::new(0.5, 0.5),
        color: Vec3::new(0.0, 0.0, 1.0),
    },
    Vertex {
        pos: Vec2::new(-0.5, 0.5),
        color: Vec3::new(1.0, 1.0, 1.0),
    },
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

struct QuadMesh {
    vertex_buffer: MeshBuffer,
    index_buffer: MeshBuffer,
    index_count: u32,
}

/// A single colored quad, drawn indexed
pub struct QuadScene {
    mesh: Option<QuadMesh>,
}

impl QuadScene {
    pub fn new() -> Self {
        Self { mesh: None }
    }
}

impl Renderable for QuadScene {
    fn on_init(&mut self, device: &Arc<VulkanDevice>) -> Result<()> {
        let vertex_buffer = MeshBuffer::new_with_data(
            device,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            &QUAD_VERTICES,
        )?;
        let index_buffer =
            MeshBuffer::new_with_data(device, vk::BufferUsageFlags::INDEX_BUFFER, &QUAD_INDICES)?;

        self.mesh = Some(QuadMesh {
            vertex_buffer,
            index_buffer,
            index_count: QUAD_INDICES.len() as u32,
        });

        log::info!(
            "Quad scene initialized ({} vertices, {} indices)",
            QUAD_VERTICES.len(),
            QUAD_INDICES.len()
        );

        Ok(())
    }

    fn on_update(&mut self, _dt: f32) {}

    fn on_render(&self, device: &ash::Device, cmd: vk::CommandBuffer) {
        let Some(mesh) = &self.mesh else {
            return;
        };

        unsafe {
            device.cmd_bind_vertex_buffers(cmd, 0, &[mesh.vertex_buffer.buffer], &[0]);
            device.cmd_bind_index_buffer(cmd, mesh.index_buffer.buffer, 0, vk::IndexType::UINT16);
            device.cmd_draw_indexed(cmd, mesh.index_count, 1, 0, 0, 0);
        }
    }

    fn on_shutdown(&mut self, device: &Arc<VulkanDevice>) {
        if let Some(mut mesh) = self.mesh.take() {
            mesh.vertex_buffer.destroy(device);
            mesh.index_buffer.destroy(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_indices_form_two_triangles_over_four_vertices() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES
            .iter()
            .all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }

    #[test]
    fn vertex_is_tightly_packed() {
        // The pipeline's binding stride assumes no padding
        assert_eq!(std::mem::size_of::<Vertex>(), 5 * std::mem::size_of::<f32>());
    }
}
