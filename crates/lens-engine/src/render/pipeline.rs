use anyhow::{Context, Result};

use crate::coords::{ColorRgba, Viewport};
use crate::filter::{BlurParams, BlurParamsError};

use super::blur::BlurPass;
use super::ctx::{RenderCtx, RenderTarget};
use super::mesh::QuadMesh;
use super::target::OffscreenTarget;

/// Scene content drawn into the offscreen target.
///
/// The target is bound and already cleared when `draw` runs; implementations
/// load it rather than clear it.
pub trait Scene {
    fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>);
}

/// Draws nothing; the offscreen target keeps the clear color.
#[derive(Debug, Default, Copy, Clone)]
pub struct EmptyScene;

impl Scene for EmptyScene {
    fn draw(&mut self, _ctx: &RenderCtx<'_>, _target: &mut RenderTarget<'_>) {}
}

/// Offscreen scene pass followed by the blurred composite pass.
///
/// All GPU objects are created in `new` and released when the pipeline is
/// dropped. Per frame, `encode` records in fixed order:
/// 1. bind offscreen, clear
/// 2. scene draw
/// 3. bind screen, clear
/// 4. composite (blurred quad)
///
/// Submission and presentation belong to the caller.
pub struct FramePipeline {
    clear: ColorRgba,
    quad: QuadMesh,
    offscreen: OffscreenTarget,
    composite: BlurPass,
}

impl FramePipeline {
    /// Creates the pipeline for a `viewport`-sized offscreen target and a
    /// screen target of `target_format`.
    ///
    /// Fails if the offscreen target is incomplete or the blur program does
    /// not build.
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        viewport: Viewport,
        clear: ColorRgba,
        params: BlurParams,
    ) -> Result<Self> {
        params.validate()?;
        anyhow::ensure!(clear.is_finite(), "clear color must be finite");

        let offscreen = OffscreenTarget::new(device, viewport, params.edge)
            .context("framebuffer is not complete")?;
        let composite = BlurPass::new(device, target_format, &offscreen, params)
            .context("failed to build blur program")?;
        let quad = QuadMesh::new(device);

        log::info!(
            "frame pipeline ready: {}x{} offscreen, {}x{} blur",
            viewport.width,
            viewport.height,
            params.diameter(),
            params.diameter()
        );

        Ok(Self {
            clear,
            quad,
            offscreen,
            composite,
        })
    }

    /// Changes step and radius for the following frames; see
    /// [`BlurPass::set_params`].
    pub fn set_blur_params(
        &mut self,
        queue: &wgpu::Queue,
        params: BlurParams,
    ) -> Result<(), BlurParamsError> {
        self.composite.set_params(queue, params)
    }

    /// Records one frame into `screen.encoder`, compositing onto
    /// `screen.color_view`.
    pub fn encode(&self, ctx: &RenderCtx<'_>, screen: &mut RenderTarget<'_>, scene: &mut dyn Scene) {
        debug_assert_eq!(ctx.target_format, self.composite.target_format());

        log::trace!("frame: offscreen pass");
        self.offscreen.clear(screen.encoder, self.clear);
        {
            let mut offscreen = RenderTarget::new(screen.encoder, self.offscreen.view());
            let scene_ctx = RenderCtx::new(
                ctx.device,
                ctx.queue,
                self.offscreen.format(),
                self.offscreen.size(),
            );
            scene.draw(&scene_ctx, &mut offscreen);
        }

        log::trace!("frame: composite pass");
        self.composite.draw(screen, &self.quad, self.clear);
    }
}
