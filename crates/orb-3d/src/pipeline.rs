use naga::{ScalarKind, ShaderStage};
use thiserror::Error;
use wgpu::{
    BlendState, ColorTargetState, ColorWrites, Device, FragmentState, FrontFace, MultisampleState,
    PipelineCompilationOptions, PipelineLayoutDescriptor, PolygonMode, PrimitiveState,
    PrimitiveTopology, RenderPipeline, RenderPipelineDescriptor, TextureFormat, VertexFormat,
    VertexState,
};

use crate::mesh::{MeshError, VertexDescriptor};
use crate::shader::{ShaderError, ShaderFunction, ShaderLibrary};

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("invalid vertex layout: {0}")]
    Layout(#[from] MeshError),
    #[error("`{function}` reads location {location}, which the vertex layout does not provide")]
    MissingAttribute { function: String, location: u32 },
    #[error(
        "`{function}` reads location {location} as {components} x {kind:?}, incompatible with layout format {format:?}"
    )]
    IncompatibleAttribute {
        function: String,
        location: u32,
        components: u8,
        kind: ScalarKind,
        format: VertexFormat,
    },
}

pub struct PipelineDescriptor<'a> {
    pub label: Option<&'a str>,
    pub library: &'a ShaderLibrary,
    pub vertex_function: &'a str,
    pub fragment_function: &'a str,
    pub vertex_layout: &'a VertexDescriptor,
    pub color_format: TextureFormat,
}

fn format_shape(format: VertexFormat) -> Option<(u8, ScalarKind)> {
    let shape = match format {
        VertexFormat::Float32 => (1, ScalarKind::Float),
        VertexFormat::Float32x2 => (2, ScalarKind::Float),
        VertexFormat::Float32x3 => (3, ScalarKind::Float),
        VertexFormat::Float32x4 => (4, ScalarKind::Float),
        VertexFormat::Uint32 => (1, ScalarKind::Uint),
        VertexFormat::Uint32x2 => (2, ScalarKind::Uint),
        VertexFormat::Uint32x3 => (3, ScalarKind::Uint),
        VertexFormat::Uint32x4 => (4, ScalarKind::Uint),
        VertexFormat::Sint32 => (1, ScalarKind::Sint),
        VertexFormat::Sint32x2 => (2, ScalarKind::Sint),
        VertexFormat::Sint32x3 => (3, ScalarKind::Sint),
        VertexFormat::Sint32x4 => (4, ScalarKind::Sint),
        _ => return None,
    };
    Some(shape)
}

/// The layout must be well formed, and every input the vertex function reads
/// must be fed by an attribute of the same scalar kind with no more
/// components than the shader declares.
pub fn validate_vertex_layout(
    function: &ShaderFunction<'_>,
    layout: &VertexDescriptor,
) -> Result<(), PipelineError> {
    layout.validate()?;
    for input in &function.inputs {
        let attribute =
            layout
                .attribute_at(input.location)
                .ok_or_else(|| PipelineError::MissingAttribute {
                    function: function.name.to_string(),
                    location: input.location,
                })?;

        let compatible = format_shape(attribute.format)
            .is_some_and(|(n, kind)| kind == input.kind && n <= input.components);
        if !compatible {
            return Err(PipelineError::IncompatibleAttribute {
                function: function.name.to_string(),
                location: input.location,
                components: input.components,
                kind: input.kind,
                format: attribute.format,
            });
        }
    }
    Ok(())
}

pub fn create_pipeline(
    device: &Device,
    desc: &PipelineDescriptor<'_>,
) -> Result<RenderPipeline, PipelineError> {
    let vertex = desc
        .library
        .function_for_stage(desc.vertex_function, ShaderStage::Vertex)?;
    let fragment = desc
        .library
        .function_for_stage(desc.fragment_function, ShaderStage::Fragment)?;
    validate_vertex_layout(&vertex, desc.vertex_layout)?;

    let shader = desc.library.create_module(device);

    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("sphere_pipeline_layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: desc.label,
        layout: Some(&layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some(vertex.name),
            buffers: &[desc.vertex_layout.buffer_layout()],
            compilation_options: PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some(fragment.name),
            targets: &[Some(ColorTargetState {
                format: desc.color_format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: PipelineCompilationOptions::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    log::info!(
        "created render pipeline ({} -> {}, {:?})",
        vertex.name,
        fragment.name,
        desc.color_format
    );

    Ok(pipeline)
}
