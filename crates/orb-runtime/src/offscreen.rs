use std::sync::mpsc;

use orb_3d::SphereRenderer;
use wgpu::{
    Buffer, BufferDescriptor, BufferUsages, Color, CommandEncoderDescriptor, Extent3d, MapMode,
    Origin3d, TexelCopyBufferInfo, TexelCopyBufferLayout, TexelCopyTextureInfo, Texture,
    TextureAspect, TextureDescriptor, TextureDimension, TextureUsages, TextureView,
    TextureViewDescriptor,
};

use crate::{COLOR_FORMAT, GpuContext, RenderError, SceneConfig, build_sphere_renderer};

const BYTES_PER_PIXEL: u32 = 4;

/// A read-back BGRA8 image with tightly packed rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub bgra: Vec<u8>,
}

impl Frame {
    /// Returns the pixel at (x, y) as `[b, g, r, a]`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * BYTES_PER_PIXEL) as usize;
        [
            self.bgra[i],
            self.bgra[i + 1],
            self.bgra[i + 2],
            self.bgra[i + 3],
        ]
    }
}

fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Runs the same setup-and-draw sequence as the window, but into a texture
/// that is copied back to the CPU.
pub struct OffscreenRenderer {
    gpu: GpuContext,
    renderer: SphereRenderer,
    target: Texture,
    target_view: TextureView,
    readback: Buffer,
    width: u32,
    height: u32,
    clear_color: Color,
}

impl OffscreenRenderer {
    pub async fn new(config: &SceneConfig) -> Result<Self, RenderError> {
        let gpu = GpuContext::new().await?;
        Self::with_context(gpu, config)
    }

    pub fn with_context(gpu: GpuContext, config: &SceneConfig) -> Result<Self, RenderError> {
        let width = config.view.width.max(1);
        let height = config.view.height.max(1);

        let target = gpu.device.create_texture(&TextureDescriptor {
            label: Some("offscreen_color"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&TextureViewDescriptor::default());

        let readback = gpu.device.create_buffer(&BufferDescriptor {
            label: Some("offscreen_readback"),
            size: padded_bytes_per_row(width) as u64 * height as u64,
            usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let renderer = build_sphere_renderer(&gpu.device, COLOR_FORMAT, &config.sphere)?;

        Ok(Self {
            gpu,
            renderer,
            target,
            target_view,
            readback,
            width,
            height,
            clear_color: config.view.clear_color(),
        })
    }

    /// Draws one frame and blocks until its pixels are on the CPU.
    pub fn render_frame(&self) -> Result<Frame, RenderError> {
        let padded = padded_bytes_per_row(self.width);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("offscreen_encoder"),
            });
        self.renderer
            .render(&mut encoder, &self.target_view, self.clear_color);
        encoder.copy_texture_to_buffer(
            TexelCopyTextureInfo {
                texture: &self.target,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.gpu.queue.submit(Some(encoder.finish()));

        let slice = self.readback.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.gpu.device.poll(wgpu::PollType::wait_indefinitely())?;
        rx.recv().map_err(|_| RenderError::ReadbackLost)??;

        let row = (self.width * BYTES_PER_PIXEL) as usize;
        let mut bgra = Vec::with_capacity(row * self.height as usize);
        {
            let data = slice.get_mapped_range();
            for chunk in data.chunks(padded as usize) {
                bgra.extend_from_slice(&chunk[..row]);
            }
        }
        self.readback.unmap();

        Ok(Frame {
            width: self.width,
            height: self.height,
            bgra,
        })
    }
}
