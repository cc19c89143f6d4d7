pub mod config;
pub mod context;
pub mod error;
pub mod offscreen;

use winit::{dpi::PhysicalSize, window::Window};

use wgpu::{
    Color, CommandEncoderDescriptor, Device, Surface, SurfaceConfiguration, TextureFormat,
    TextureViewDescriptor,
};

pub use config::{SceneConfig, SphereSection, ViewSection};
pub use context::GpuContext;
pub use error::RenderError;
pub use offscreen::{Frame, OffscreenRenderer};

use orb_3d::{
    FRAGMENT_ENTRY, GpuMesh, PipelineDescriptor, ShaderLibrary, SphereRenderer, VERTEX_ENTRY,
    create_pipeline, generate_sphere,
};

pub type RcWindow = std::sync::Arc<Window>;

/// Pixel format of every color target the sphere is drawn into.
pub const COLOR_FORMAT: TextureFormat = TextureFormat::Bgra8Unorm;

/// Mesh generation, shader compilation and pipeline assembly, in that order.
pub fn build_sphere_renderer(
    device: &Device,
    format: TextureFormat,
    sphere: &SphereSection,
) -> Result<SphereRenderer, RenderError> {
    let model = generate_sphere(&sphere.descriptor())?;
    let mesh = GpuMesh::from_model(device, &model)?;

    let library = ShaderLibrary::sphere()?;

    let pipeline = create_pipeline(
        device,
        &PipelineDescriptor {
            label: Some("sphere_pipeline"),
            library: &library,
            vertex_function: VERTEX_ENTRY,
            fragment_function: FRAGMENT_ENTRY,
            vertex_layout: &mesh.descriptor,
            color_format: format,
        },
    )?;

    Ok(SphereRenderer::new(pipeline, mesh)?)
}

pub async fn create_graphics(window: RcWindow, config: &SceneConfig) -> Result<Graphics, RenderError> {
    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(std::sync::Arc::clone(&window))?;

    let gpu = GpuContext::with_instance(instance, Some(&surface)).await?;

    let size = window.inner_size();
    let width = size.width.max(1);
    let height = size.height.max(1);

    let caps = surface.get_capabilities(&gpu.adapter);
    if !caps.formats.contains(&COLOR_FORMAT) {
        return Err(RenderError::UnsupportedFormat(COLOR_FORMAT));
    }
    let mut surface_config = surface
        .get_default_config(&gpu.adapter, width, height)
        .ok_or(RenderError::SurfaceUnsupported)?;
    surface_config.format = COLOR_FORMAT;
    surface_config.view_formats.clear();
    surface.configure(&gpu.device, &surface_config);

    let renderer = build_sphere_renderer(&gpu.device, COLOR_FORMAT, &config.sphere)?;

    Ok(Graphics {
        window,
        surface,
        surface_config,
        gpu,
        renderer,
        clear_color: config.view.clear_color(),
    })
}

/// The live view: a window surface and the renderer drawing into it.
pub struct Graphics {
    window: RcWindow,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    gpu: GpuContext,
    renderer: SphereRenderer,
    clear_color: Color,
}

impl Graphics {
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface_config.width = new_size.width.max(1);
        self.surface_config.height = new_size.height.max(1);
        self.surface.configure(&self.gpu.device, &self.surface_config);
    }

    /// Encodes one pass with a single draw call, submits it and presents.
    pub fn draw(&mut self) -> Result<(), RenderError> {
        let frame = self
            .surface
            .get_current_texture()
            .map_err(RenderError::NoDrawable)?;

        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        self.renderer.render(&mut encoder, &view, self.clear_color);
        self.gpu.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
