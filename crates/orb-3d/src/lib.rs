pub mod mesh;
pub mod pipeline;
pub mod render;
pub mod shader;

pub use mesh::{
    GpuMesh, Indices, MeshError, MeshModel, SphereDescriptor, Submesh, Vertex, VertexDescriptor,
    generate_sphere,
};
pub use pipeline::{PipelineDescriptor, PipelineError, create_pipeline, validate_vertex_layout};
pub use render::SphereRenderer;
pub use shader::{
    FRAGMENT_ENTRY, SPHERE_SHADER, ShaderError, ShaderFunction, ShaderLibrary, VERTEX_ENTRY,
};
