use anyhow::{Context, Result};

use super::init::open_device;
use super::GpuInit;

/// Surfaceless device + queue.
///
/// Drives the frame pipeline into an offscreen "screen" texture for the
/// headless mode and for GPU-backed tests.
pub struct HeadlessGpu {
    _instance: wgpu::Instance,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    pub async fn new(init: &GpuInit) -> Result<Self> {
        let instance = init.instance();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .with_context(|| {
                format!("failed to find a GPU adapter for backends {:?}", init.backends)
            })?;

        let (device, queue) = open_device(&adapter, init, "lens headless device").await?;

        Ok(Self {
            _instance: instance,
            device,
            queue,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Opens a headless device, or `None` when the machine has no adapter.
    ///
    /// GPU-backed tests return early on `None`.
    pub(crate) fn try_gpu() -> Option<HeadlessGpu> {
        match pollster::block_on(HeadlessGpu::new(&GpuInit::default())) {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("skipping GPU test: {e:#}");
                None
            }
        }
    }
}
