use wgpu::{
    Adapter, Device, ExperimentalFeatures, Features, Instance, Limits, MemoryHints,
    PowerPreference, Queue, RequestAdapterOptions, Surface,
};

use crate::error::RenderError;

/// The default GPU and the device/queue opened on it.
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Headless context, for rendering to textures.
    pub async fn new() -> Result<Self, RenderError> {
        Self::with_instance(Instance::default(), None).await
    }

    /// Picks an adapter able to present to `compatible_surface` when one is
    /// given.
    pub async fn with_instance(
        instance: Instance,
        compatible_surface: Option<&Surface<'_>>,
    ) -> Result<Self, RenderError> {
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface,
            })
            .await
            .map_err(RenderError::NoDevice)?;

        let info = adapter.get_info();
        log::info!("selected adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("orb_device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: MemoryHints::Performance,
                trace: Default::default(),
                experimental_features: ExperimentalFeatures::disabled(),
            })
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }
}
