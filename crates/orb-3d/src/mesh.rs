use glam::Vec3;
use thiserror::Error;
use wgpu::util::DeviceExt;
use wgpu::{Buffer, BufferUsages, Device, IndexFormat, VertexAttribute, VertexBufferLayout, VertexFormat};

/// Interleaved vertex as laid out by the sphere generator: position, normal
/// and texture coordinate in a single buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexSemantic {
    Position,
    Normal,
    TexCoord,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexAttributeDesc {
    pub semantic: VertexSemantic,
    pub format: VertexFormat,
    pub offset: u64,
    pub shader_location: u32,
}

/// Describes how vertices are laid out in a vertex buffer.
///
/// Built by whoever produces the vertex data and turned into a
/// [`VertexBufferLayout`] when the render pipeline is assembled, so the
/// pipeline always reads the buffer the way it was written.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexDescriptor {
    pub stride: u64,
    pub attributes: Vec<VertexAttributeDesc>,
    wgpu_attributes: Vec<VertexAttribute>,
}

impl VertexDescriptor {
    pub fn new(stride: u64, attributes: Vec<VertexAttributeDesc>) -> Self {
        let wgpu_attributes = attributes
            .iter()
            .map(|a| VertexAttribute {
                format: a.format,
                offset: a.offset,
                shader_location: a.shader_location,
            })
            .collect();
        Self {
            stride,
            attributes,
            wgpu_attributes,
        }
    }

    /// Layout of [`Vertex`]: position at location 0, normal at 1, texture
    /// coordinate at 2.
    pub fn for_vertex() -> Self {
        let vec3 = std::mem::size_of::<[f32; 3]>() as u64;
        Self::new(
            std::mem::size_of::<Vertex>() as u64,
            vec![
                VertexAttributeDesc {
                    semantic: VertexSemantic::Position,
                    format: VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                VertexAttributeDesc {
                    semantic: VertexSemantic::Normal,
                    format: VertexFormat::Float32x3,
                    offset: vec3,
                    shader_location: 1,
                },
                VertexAttributeDesc {
                    semantic: VertexSemantic::TexCoord,
                    format: VertexFormat::Float32x2,
                    offset: vec3 * 2,
                    shader_location: 2,
                },
            ],
        )
    }

    pub fn attribute(&self, semantic: VertexSemantic) -> Option<&VertexAttributeDesc> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }

    pub fn attribute_at(&self, shader_location: u32) -> Option<&VertexAttributeDesc> {
        self.attributes
            .iter()
            .find(|a| a.shader_location == shader_location)
    }

    /// Every attribute must fit inside the stride and locations must be
    /// unique.
    pub fn validate(&self) -> Result<(), MeshError> {
        for (i, a) in self.attributes.iter().enumerate() {
            let end = a.offset.checked_add(a.format.size());
            if end.is_none_or(|end| end > self.stride) {
                return Err(MeshError::AttributeOutOfBounds {
                    shader_location: a.shader_location,
                    offset: a.offset,
                    size: a.format.size(),
                    stride: self.stride,
                });
            }
            if self.attributes[..i]
                .iter()
                .any(|b| b.shader_location == a.shader_location)
            {
                return Err(MeshError::DuplicateLocation(a.shader_location));
            }
        }
        Ok(())
    }

    pub fn buffer_layout(&self) -> VertexBufferLayout<'_> {
        VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.wgpu_attributes,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    /// Picks the narrowest index type able to address `vertex_count` vertices.
    /// 0xFFFF is the primitive restart value and is never used as an index.
    pub fn for_vertex_count(indices: Vec<u32>, vertex_count: usize) -> Self {
        if vertex_count <= u16::MAX as usize {
            Indices::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            Indices::U32(indices)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Indices::U16(v) => v.len(),
            Indices::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            Indices::U16(_) => IndexFormat::Uint16,
            Indices::U32(_) => IndexFormat::Uint32,
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            Indices::U16(v) => Box::new(v.iter().map(|&i| i as u32)),
            Indices::U32(v) => Box::new(v.iter().copied()),
        }
    }

    fn as_bytes(&self) -> &[u8] {
        match self {
            Indices::U16(v) => bytemuck::cast_slice(v),
            Indices::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("a sphere needs at least 3 radial and 2 vertical segments, got {radial}x{vertical}")]
    TooFewSegments { radial: u32, vertical: u32 },
    #[error("a {radial}x{vertical} sphere has more vertices or indices than a 32-bit index can address")]
    TooManySegments { radial: u32, vertical: u32 },
    #[error("attribute at location {shader_location} ({size} bytes at offset {offset}) does not fit the stride {stride}")]
    AttributeOutOfBounds {
        shader_location: u32,
        offset: u64,
        size: u64,
        stride: u64,
    },
    #[error("more than one attribute uses location {0}")]
    DuplicateLocation(u32),
    #[error("vertex layout has no position attribute")]
    MissingPosition,
    #[error("unsupported position format {0:?}")]
    UnsupportedPositionFormat(VertexFormat),
    #[error("vertex layout stride {layout} does not match the vertex size {vertex}")]
    StrideMismatch { layout: u64, vertex: u64 },
    #[error("mesh has no submeshes")]
    NoSubmesh,
    #[error("submesh {submesh} has {count} indices, not a triangle list")]
    NotTriangleList { submesh: usize, count: usize },
    #[error("submesh {submesh} references vertex {index} but the mesh has {vertex_count}")]
    IndexOutOfRange {
        submesh: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// CPU-side mesh produced by a generator, before any GPU allocation.
#[derive(Clone, Debug)]
pub struct MeshModel {
    pub vertices: Vec<Vertex>,
    pub descriptor: VertexDescriptor,
    pub submeshes: Vec<Indices>,
}

impl MeshModel {
    pub fn validate(&self) -> Result<(), MeshError> {
        let position = self
            .descriptor
            .attribute(VertexSemantic::Position)
            .ok_or(MeshError::MissingPosition)?;
        if !matches!(
            position.format,
            VertexFormat::Float32x3 | VertexFormat::Float32x4
        ) {
            return Err(MeshError::UnsupportedPositionFormat(position.format));
        }

        let vertex_size = std::mem::size_of::<Vertex>() as u64;
        if self.descriptor.stride != vertex_size {
            return Err(MeshError::StrideMismatch {
                layout: self.descriptor.stride,
                vertex: vertex_size,
            });
        }
        self.descriptor.validate()?;

        if self.submeshes.is_empty() {
            return Err(MeshError::NoSubmesh);
        }

        let vertex_count = self.vertices.len();
        for (submesh, indices) in self.submeshes.iter().enumerate() {
            if indices.len() % 3 != 0 {
                return Err(MeshError::NotTriangleList {
                    submesh,
                    count: indices.len(),
                });
            }
            if let Some(index) = indices.iter().find(|&i| i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    submesh,
                    index,
                    vertex_count,
                });
            }
        }

        Ok(())
    }
}

/// Parameters of a UV sphere. `extent` is the size of the bounding box, so
/// each radius is half of it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SphereDescriptor {
    pub extent: Vec3,
    pub radial_segments: u32,
    pub vertical_segments: u32,
    pub inward_normals: bool,
}

impl Default for SphereDescriptor {
    fn default() -> Self {
        Self {
            extent: Vec3::splat(0.75),
            radial_segments: 100,
            vertical_segments: 100,
            inward_normals: false,
        }
    }
}

/// Generates a UV sphere centered on the origin, rings running from the +Y
/// pole to the -Y pole. Seam vertices are duplicated; pole rows emit a single
/// triangle per segment.
pub fn generate_sphere(desc: &SphereDescriptor) -> Result<MeshModel, MeshError> {
    let segments = desc.radial_segments;
    let rings = desc.vertical_segments;
    if segments < 3 || rings < 2 {
        return Err(MeshError::TooFewSegments {
            radial: segments,
            vertical: rings,
        });
    }

    let radii = desc.extent * 0.5;
    let normal_sign = if desc.inward_normals { -1.0 } else { 1.0 };
    let pi = std::f32::consts::PI;

    let too_many = MeshError::TooManySegments {
        radial: segments,
        vertical: rings,
    };
    let vertex_count = rings
        .checked_add(1)
        .zip(segments.checked_add(1))
        .and_then(|(r, s)| r.checked_mul(s))
        .ok_or(too_many.clone())?;
    let index_count = segments
        .checked_mul(rings - 1)
        .and_then(|n| n.checked_mul(6))
        .ok_or(too_many)?;

    let mut vertices = Vec::with_capacity(vertex_count as usize);
    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = v * pi;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let phi = u * 2.0 * pi;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let unit = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
            let position = unit * radii;
            // ellipsoid normal: gradient of the implicit surface
            let normal = (position / (radii * radii)).normalize_or_zero() * normal_sign;

            vertices.push(Vertex {
                position: position.to_array(),
                normal: normal.to_array(),
                tex_coords: [u, v],
            });
        }
    }

    let mut indices = Vec::with_capacity(index_count as usize);
    let mut push = |a: u32, b: u32, c: u32| {
        if desc.inward_normals {
            indices.extend_from_slice(&[a, c, b]);
        } else {
            indices.extend_from_slice(&[a, b, c]);
        }
    };
    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            if ring != 0 {
                push(current, current + 1, next);
            }
            if ring != rings - 1 {
                push(current + 1, next + 1, next);
            }
        }
    }

    let vertex_count = vertices.len();
    log::debug!(
        "generated sphere: {} vertices, {} indices",
        vertex_count,
        indices.len()
    );

    Ok(MeshModel {
        vertices,
        descriptor: VertexDescriptor::for_vertex(),
        submeshes: vec![Indices::for_vertex_count(indices, vertex_count)],
    })
}

pub struct Submesh {
    pub index_buffer: Buffer,
    pub index_count: u32,
    pub index_format: IndexFormat,
}

/// Mesh resident on the GPU: one vertex buffer and one index buffer per
/// submesh.
pub struct GpuMesh {
    pub vertex_buffer: Buffer,
    pub vertex_count: u32,
    pub descriptor: VertexDescriptor,
    pub submeshes: Vec<Submesh>,
}

impl GpuMesh {
    pub fn from_model(device: &Device, model: &MeshModel) -> Result<Self, MeshError> {
        model.validate()?;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(&model.vertices),
            usage: BufferUsages::VERTEX,
        });

        let submeshes = model
            .submeshes
            .iter()
            .map(|indices| Submesh {
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_indices"),
                    contents: indices.as_bytes(),
                    usage: BufferUsages::INDEX,
                }),
                index_count: indices.len() as u32,
                index_format: indices.format(),
            })
            .collect();

        Ok(Self {
            vertex_buffer,
            vertex_count: model.vertices.len() as u32,
            descriptor: model.descriptor.clone(),
            submeshes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_sphere() -> MeshModel {
        generate_sphere(&SphereDescriptor::default()).unwrap()
    }

    #[test]
    fn sphere_is_a_triangle_list_with_valid_indices() {
        let model = default_sphere();
        assert_eq!(model.submeshes.len(), 1);
        let indices = &model.submeshes[0];
        assert_eq!(indices.len() % 3, 0);
        assert!(indices.iter().all(|i| (i as usize) < model.vertices.len()));
        assert!(model.validate().is_ok());
    }

    #[test]
    fn sphere_counts() {
        let model = default_sphere();
        assert_eq!(model.vertices.len(), 101 * 101);
        // two pole rows of single triangles, 98 rows of quads
        assert_eq!(model.submeshes[0].len(), 2 * 100 * 3 + 98 * 100 * 6);
    }

    #[test]
    fn small_sphere_uses_16_bit_indices() {
        let model = default_sphere();
        assert_eq!(model.submeshes[0].format(), IndexFormat::Uint16);

        let dense = generate_sphere(&SphereDescriptor {
            radial_segments: 300,
            vertical_segments: 300,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(dense.submeshes[0].format(), IndexFormat::Uint32);
        assert!(dense.validate().is_ok());
    }

    #[test]
    fn vertices_lie_on_the_extent() {
        let model = default_sphere();
        for v in &model.vertices {
            let r = Vec3::from_array(v.position).length();
            assert!((r - 0.375).abs() < 1e-5, "radius {r}");
        }
        assert_eq!(model.vertices[0].position, [0.0, 0.375, 0.0]);
        let last = model.vertices.last().unwrap().position;
        assert!((last[1] + 0.375).abs() < 1e-6);
    }

    #[test]
    fn normals_point_outward_unless_inward() {
        let outward = default_sphere();
        let inward = generate_sphere(&SphereDescriptor {
            inward_normals: true,
            ..Default::default()
        })
        .unwrap();

        let mid = outward.vertices.len() / 2;
        let p = Vec3::from_array(outward.vertices[mid].position);
        assert!(Vec3::from_array(outward.vertices[mid].normal).dot(p) > 0.0);
        assert!(Vec3::from_array(inward.vertices[mid].normal).dot(p) < 0.0);

        let (Indices::U16(a), Indices::U16(b)) = (&outward.submeshes[0], &inward.submeshes[0])
        else {
            panic!("expected 16-bit indices");
        };
        assert_eq!(a[0], b[0]);
        assert_eq!(a[1], b[2]);
        assert_eq!(a[2], b[1]);
    }

    #[test]
    fn outward_triangles_wind_counter_clockwise_from_outside() {
        let model = default_sphere();
        let Indices::U16(indices) = &model.submeshes[0] else {
            panic!("expected 16-bit indices");
        };
        let tri = &indices[300..303];
        let p = |i: u16| Vec3::from_array(model.vertices[i as usize].position);
        let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
        let n = (b - a).cross(c - a);
        assert!(n.dot((a + b + c) / 3.0) > 0.0);
    }

    #[test]
    fn rejects_too_few_segments() {
        let err = generate_sphere(&SphereDescriptor {
            radial_segments: 2,
            vertical_segments: 1,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            err,
            MeshError::TooFewSegments {
                radial: 2,
                vertical: 1
            }
        );
    }

    #[test]
    fn rejects_segment_counts_that_overflow_the_index_range() {
        let err = generate_sphere(&SphereDescriptor {
            radial_segments: 70_000,
            vertical_segments: 70_000,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            err,
            MeshError::TooManySegments {
                radial: 70_000,
                vertical: 70_000
            }
        );

        let err = generate_sphere(&SphereDescriptor {
            radial_segments: u32::MAX,
            vertical_segments: 2,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, MeshError::TooManySegments { .. }));
    }

    #[test]
    fn restart_value_is_never_a_16_bit_index() {
        let last = u16::MAX as u32 - 1;
        assert_eq!(
            Indices::for_vertex_count(vec![0, 1, last], u16::MAX as usize).format(),
            IndexFormat::Uint16
        );
        assert_eq!(
            Indices::for_vertex_count(vec![0, 1, last + 1], u16::MAX as usize + 1).format(),
            IndexFormat::Uint32
        );
    }

    #[test]
    fn validate_rejects_attributes_past_the_stride() {
        let mut model = default_sphere();
        model.descriptor = VertexDescriptor::new(
            32,
            vec![VertexAttributeDesc {
                semantic: VertexSemantic::Position,
                format: VertexFormat::Float32x3,
                offset: 64,
                shader_location: 0,
            }],
        );
        assert_eq!(
            model.validate(),
            Err(MeshError::AttributeOutOfBounds {
                shader_location: 0,
                offset: 64,
                size: 12,
                stride: 32
            })
        );

        // the last float of a vec3 at offset 24 lands past a 32 byte stride
        let mut attributes = VertexDescriptor::for_vertex().attributes;
        attributes[2].format = VertexFormat::Float32x3;
        model.descriptor = VertexDescriptor::new(32, attributes);
        assert!(matches!(
            model.validate(),
            Err(MeshError::AttributeOutOfBounds {
                shader_location: 2,
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_locations() {
        let mut model = default_sphere();
        let mut attributes = VertexDescriptor::for_vertex().attributes;
        attributes[1].shader_location = 0;
        model.descriptor = VertexDescriptor::new(32, attributes);
        assert_eq!(model.validate(), Err(MeshError::DuplicateLocation(0)));
    }

    #[test]
    fn validate_rejects_broken_models() {
        let mut model = default_sphere();
        model.submeshes = vec![Indices::U32(vec![0, 1])];
        assert_eq!(
            model.validate(),
            Err(MeshError::NotTriangleList {
                submesh: 0,
                count: 2
            })
        );

        let count = model.vertices.len();
        model.submeshes = vec![Indices::U32(vec![0, 1, count as u32])];
        assert!(matches!(
            model.validate(),
            Err(MeshError::IndexOutOfRange { index, .. }) if index == count as u32
        ));

        model.submeshes.clear();
        assert_eq!(model.validate(), Err(MeshError::NoSubmesh));
    }

    #[test]
    fn validate_rejects_unsupported_layouts() {
        let mut model = default_sphere();
        model.descriptor = VertexDescriptor::new(
            model.descriptor.stride,
            vec![VertexAttributeDesc {
                semantic: VertexSemantic::Normal,
                format: VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
        );
        assert_eq!(model.validate(), Err(MeshError::MissingPosition));

        model.descriptor = VertexDescriptor::new(
            model.descriptor.stride,
            vec![VertexAttributeDesc {
                semantic: VertexSemantic::Position,
                format: VertexFormat::Uint8x4,
                offset: 0,
                shader_location: 0,
            }],
        );
        assert_eq!(
            model.validate(),
            Err(MeshError::UnsupportedPositionFormat(VertexFormat::Uint8x4))
        );

        model.descriptor = VertexDescriptor::new(16, VertexDescriptor::for_vertex().attributes);
        assert_eq!(
            model.validate(),
            Err(MeshError::StrideMismatch {
                layout: 16,
                vertex: 32
            })
        );
    }

    #[test]
    fn buffer_layout_follows_descriptor() {
        let descriptor = VertexDescriptor::for_vertex();
        let layout = descriptor.buffer_layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[2].offset, 24);
        assert_eq!(
            descriptor.attribute_at(0).map(|a| a.semantic),
            Some(VertexSemantic::Position)
        );
    }
}
