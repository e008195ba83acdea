use anyhow::{Context, Result};

use lens_engine::coords::Viewport;
use lens_engine::device::HeadlessGpu;
use lens_engine::render::{clear_pass, CaptureTarget, EmptyScene, FramePipeline, RenderCtx, RenderTarget};
use lens_engine::time::FrameClock;

use crate::config::{Preset, ViewConfig};

/// Renders `config.frames` frames (at least one) without a window.
///
/// The last frame is written to `config.capture` as PNG when set.
pub fn run(config: &ViewConfig) -> Result<()> {
    let gpu = pollster::block_on(HeadlessGpu::new(&config.gpu))
        .context("failed to initialize headless GPU context")?;

    let size = Viewport::from(config.window.size);
    let capture = CaptureTarget::new(gpu.device(), size)?;

    let pipeline = match config.preset {
        Preset::Lens => Some(FramePipeline::new(
            gpu.device(),
            CaptureTarget::FORMAT,
            size,
            config.clear,
            config.blur,
        )?),
        Preset::Clear => None,
    };

    let frames = config.frames.unwrap_or(1).max(1);
    let mut clock = FrameClock::default();
    let mut scene = EmptyScene;

    for _ in 0..frames {
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), CaptureTarget::FORMAT, size);
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lens headless frame"),
            });
        {
            let mut screen = RenderTarget::new(&mut encoder, capture.view());
            match &pipeline {
                Some(p) => p.encode(&ctx, &mut screen, &mut scene),
                None => clear_pass(&mut screen, "lens screen clear", config.clear),
            }
        }
        gpu.queue().submit(std::iter::once(encoder.finish()));
        clock.tick();
    }

    log::info!("rendered {} headless frames at {}x{}", clock.frames(), size.width, size.height);

    if let Some(path) = &config.capture {
        let img = capture.read(gpu.device(), gpu.queue())?;
        img.save(path)
            .with_context(|| format!("failed to write capture to {}", path.display()))?;
        log::info!("captured last frame to {}", path.display());
    }

    Ok(())
}
