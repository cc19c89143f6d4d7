use std::borrow::Cow;

use naga::{Binding, ScalarKind, ShaderStage, TypeInner, VectorSize};
use thiserror::Error;
use wgpu::{Device, ShaderModule};

pub const VERTEX_ENTRY: &str = "vertex_main";
pub const FRAGMENT_ENTRY: &str = "fragment_main";

/// Passes the position straight through to clip space and paints every
/// covered pixel red.
pub const SPHERE_SHADER: &str = r#"
struct VertexIn {
    @location(0) position: vec3<f32>,
};

@vertex
fn vertex_main(vertex_in: VertexIn) -> @builtin(position) vec4<f32> {
    return vec4<f32>(vertex_in.position, 1.0);
}

@fragment
fn fragment_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
"#;

#[derive(Debug, Error, PartialEq)]
pub enum ShaderError {
    #[error("shader failed to parse:\n{0}")]
    Parse(String),
    #[error("shader failed validation:\n{0}")]
    Validation(String),
    #[error("shader has no entry point named `{0}`")]
    MissingEntryPoint(String),
    #[error("entry point `{name}` is a {found:?} function, expected {expected:?}")]
    WrongStage {
        name: String,
        expected: ShaderStage,
        found: ShaderStage,
    },
    #[error("entry point `{name}` takes an input at location {location} that is not a scalar or vector")]
    UnsupportedInput { name: String, location: u32 },
}

/// One `@location` input of a vertex entry point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexInput {
    pub location: u32,
    pub components: u8,
    pub kind: ScalarKind,
}

/// A named entry point looked up in a [`ShaderLibrary`].
#[derive(Clone, Debug)]
pub struct ShaderFunction<'a> {
    pub name: &'a str,
    pub stage: ShaderStage,
    pub inputs: Vec<VertexInput>,
}

/// WGSL source that parsed and validated, kept alongside its IR so entry
/// points can be inspected before a pipeline is built.
#[derive(Debug)]
pub struct ShaderLibrary {
    source: Cow<'static, str>,
    module: naga::Module,
}

impl ShaderLibrary {
    pub fn compile(source: impl Into<Cow<'static, str>>) -> Result<Self, ShaderError> {
        let source = source.into();
        let module = naga::front::wgsl::parse_str(&source)
            .map_err(|e| ShaderError::Parse(e.emit_to_string(&source)))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| ShaderError::Validation(e.emit_to_string(&source)))?;

        Ok(Self { source, module })
    }

    pub fn sphere() -> Result<Self, ShaderError> {
        Self::compile(SPHERE_SHADER)
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.module
            .entry_points
            .iter()
            .map(|ep| ep.name.as_str())
            .collect()
    }

    pub fn function(&self, name: &str) -> Result<ShaderFunction<'_>, ShaderError> {
        let ep = self
            .module
            .entry_points
            .iter()
            .find(|ep| ep.name == name)
            .ok_or_else(|| ShaderError::MissingEntryPoint(name.to_string()))?;

        let inputs = if ep.stage == ShaderStage::Vertex {
            self.vertex_inputs(&ep.name, &ep.function)?
        } else {
            Vec::new()
        };

        Ok(ShaderFunction {
            name: ep.name.as_str(),
            stage: ep.stage,
            inputs,
        })
    }

    pub fn function_for_stage(
        &self,
        name: &str,
        stage: ShaderStage,
    ) -> Result<ShaderFunction<'_>, ShaderError> {
        let function = self.function(name)?;
        if function.stage != stage {
            return Err(ShaderError::WrongStage {
                name: name.to_string(),
                expected: stage,
                found: function.stage,
            });
        }
        Ok(function)
    }

    pub fn create_module(&self, device: &Device) -> ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sphere_shader"),
            source: wgpu::ShaderSource::Wgsl(self.source.clone()),
        })
    }

    fn vertex_inputs(
        &self,
        name: &str,
        function: &naga::Function,
    ) -> Result<Vec<VertexInput>, ShaderError> {
        let mut inputs = Vec::new();
        for arg in &function.arguments {
            match &arg.binding {
                Some(binding) => self.push_input(name, binding, arg.ty, &mut inputs)?,
                None => {
                    if let TypeInner::Struct { members, .. } = &self.module.types[arg.ty].inner {
                        for member in members {
                            if let Some(binding) = &member.binding {
                                self.push_input(name, binding, member.ty, &mut inputs)?;
                            }
                        }
                    }
                }
            }
        }
        inputs.sort_by_key(|i| i.location);
        Ok(inputs)
    }

    fn push_input(
        &self,
        name: &str,
        binding: &Binding,
        ty: naga::Handle<naga::Type>,
        inputs: &mut Vec<VertexInput>,
    ) -> Result<(), ShaderError> {
        let Binding::Location { location, .. } = binding else {
            return Ok(());
        };
        let (components, kind) = match &self.module.types[ty].inner {
            TypeInner::Scalar(scalar) => (1, scalar.kind),
            TypeInner::Vector { size, scalar } => {
                let n = match size {
                    VectorSize::Bi => 2,
                    VectorSize::Tri => 3,
                    VectorSize::Quad => 4,
                };
                (n, scalar.kind)
            }
            _ => {
                return Err(ShaderError::UnsupportedInput {
                    name: name.to_string(),
                    location: *location,
                });
            }
        };
        inputs.push(VertexInput {
            location: *location,
            components,
            kind,
        });
        Ok(())
    }
}
