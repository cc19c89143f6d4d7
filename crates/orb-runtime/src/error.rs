use orb_3d::{MeshError, PipelineError, ShaderError};
use thiserror::Error;

/// Every way the setup-and-draw sequence can fail. None of them are
/// recoverable; callers report and exit.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no GPU adapter available: {0}")]
    NoDevice(#[source] wgpu::RequestAdapterError),
    #[error("could not open a device on the adapter: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("could not create a surface for the view: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("the view surface is not supported by the adapter")]
    SurfaceUnsupported,
    #[error("the view surface cannot present {0:?}")]
    UnsupportedFormat(wgpu::TextureFormat),
    #[error("mesh conversion failed: {0}")]
    Mesh(#[from] MeshError),
    #[error("shader compilation failed: {0}")]
    Shader(#[from] ShaderError),
    #[error("pipeline creation failed: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("no drawable available: {0}")]
    NoDrawable(#[source] wgpu::SurfaceError),
    #[error("waiting for the GPU failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("reading back the frame failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
    #[error("the read-back callback was dropped before it ran")]
    ReadbackLost,
}
