use anyhow::{Context, Result};

use crate::coords::Viewport;

use super::resource::{Owned, ResourceKind};

/// Offscreen stand-in for the window surface.
///
/// The composite pass renders into it when there is no window (headless
/// mode, tests); `read` copies the result back to the CPU.
pub struct CaptureTarget {
    size: Viewport,
    texture: Owned<wgpu::Texture>,
    view: Owned<wgpu::TextureView>,
}

impl CaptureTarget {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(device: &wgpu::Device, size: Viewport) -> Result<Self> {
        anyhow::ensure!(size.is_valid(), "capture target has zero size");

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lens capture target"),
            size: size.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            size,
            texture: Owned::new(ResourceKind::Texture, "capture color", texture),
            view: Owned::new(ResourceKind::TextureView, "capture view", view),
        })
    }

    pub fn size(&self) -> Viewport {
        self.size
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Copies the target into CPU memory, blocking until the GPU is done.
    pub fn read(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<image::RgbaImage> {
        let Viewport { width, height } = self.size;
        let row_bytes = width * 4;
        let padded_row_bytes = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lens capture staging"),
            size: padded_row_bytes as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lens capture encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(height),
                },
            },
            self.size.extent(),
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("failed waiting for capture copy")?;
        rx.recv()
            .context("capture map callback never ran")?
            .context("failed to map capture buffer")?;

        let mut pixels = Vec::with_capacity((row_bytes * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks_exact(padded_row_bytes as usize) {
                pixels.extend_from_slice(&row[..row_bytes as usize]);
            }
        }
        staging.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .context("capture buffer has unexpected size")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ColorRgba;
    use crate::device::testing::try_gpu;
    use crate::render::{clear_pass, RenderTarget};

    #[test]
    fn zero_size_is_rejected_before_gpu_work() {
        let Some(gpu) = try_gpu() else { return };
        assert!(CaptureTarget::new(gpu.device(), Viewport::new(0, 4)).is_err());
    }

    #[test]
    fn unaligned_width_reads_back_every_pixel() {
        let Some(gpu) = try_gpu() else { return };
        // 3 * 4 bytes per row forces row padding.
        let capture = CaptureTarget::new(gpu.device(), Viewport::new(3, 5)).unwrap();
        let color = ColorRgba::new(1.0, 0.0, 0.0, 1.0);

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        clear_pass(&mut RenderTarget::new(&mut encoder, capture.view()), "test clear", color);
        gpu.queue().submit(std::iter::once(encoder.finish()));

        let img = capture.read(gpu.device(), gpu.queue()).unwrap();
        assert_eq!(img.dimensions(), (3, 5));
        assert!(img.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }
}
