use crate::mesh::{GpuMesh, MeshError};
use wgpu::*;

/// Draws the first submesh of a mesh with one pipeline into whatever color
/// target it is handed.
pub struct SphereRenderer {
    render_pipeline: RenderPipeline,
    mesh: GpuMesh,
}

impl SphereRenderer {
    pub fn new(render_pipeline: RenderPipeline, mesh: GpuMesh) -> Result<Self, MeshError> {
        if mesh.submeshes.is_empty() {
            return Err(MeshError::NoSubmesh);
        }
        Ok(Self {
            render_pipeline,
            mesh,
        })
    }

    pub fn render(&self, encoder: &mut CommandEncoder, target_view: &TextureView, clear: Color) {
        let mut r_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("sphere_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: target_view,
                depth_slice: None,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(clear),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let submesh = &self.mesh.submeshes[0];
        r_pass.set_pipeline(&self.render_pipeline);
        r_pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        r_pass.set_index_buffer(submesh.index_buffer.slice(..), submesh.index_format);
        r_pass.draw_indexed(0..submesh.index_count, 0, 0..1);
    }
}
