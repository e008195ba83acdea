use anyhow::Result;

use lens_engine::coords::{ColorRgba, Viewport};
use lens_engine::core::{App, AppControl, FrameCtx};
use lens_engine::device::Gpu;
use lens_engine::filter::BlurParams;
use lens_engine::render::{resource, EmptyScene, FramePipeline};

/// Counts presented frames against an optional limit.
#[derive(Debug, Clone, Copy)]
pub struct FrameLimit {
    remaining: Option<u64>,
}

impl FrameLimit {
    pub fn new(limit: Option<u64>) -> Self {
        Self { remaining: limit }
    }

    /// Records one presented frame.
    pub fn tick(&mut self) -> AppControl {
        match self.remaining.as_mut() {
            None => AppControl::Continue,
            Some(n) => {
                *n = n.saturating_sub(1);
                if *n == 0 {
                    AppControl::Exit
                } else {
                    AppControl::Continue
                }
            }
        }
    }
}

/// Offscreen scene pass + blurred composite, once per frame.
pub struct LensApp {
    clear: ColorRgba,
    blur: BlurParams,
    limit: FrameLimit,
    scene: EmptyScene,
    pipeline: Option<FramePipeline>,
}

impl LensApp {
    pub fn new(clear: ColorRgba, blur: BlurParams, frames: Option<u64>) -> Self {
        Self {
            clear,
            blur,
            limit: FrameLimit::new(frames),
            scene: EmptyScene,
            pipeline: None,
        }
    }
}

impl App for LensApp {
    fn init(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        // The offscreen target keeps the startup size for the whole run.
        let pipeline = FramePipeline::new(
            gpu.device(),
            gpu.surface_format(),
            Viewport::from(gpu.size()),
            self.clear,
            self.blur,
        )?;
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return AppControl::Abort;
        };
        let scene = &mut self.scene;

        match ctx.render(|rctx, target| pipeline.encode(rctx, target, scene)) {
            AppControl::Continue => self.limit.tick(),
            other => other,
        }
    }

    fn on_exit(&mut self) {
        self.pipeline = None;
        log::debug!("gpu objects still live: {}", resource::live_total());
    }
}

/// Clears the window every frame.
pub struct ClearApp {
    color: ColorRgba,
    limit: FrameLimit,
}

impl ClearApp {
    pub fn new(color: ColorRgba, frames: Option<u64>) -> Self {
        Self {
            color,
            limit: FrameLimit::new(frames),
        }
    }
}

impl App for ClearApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        match ctx.clear(self.color) {
            AppControl::Continue => self.limit.tick(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_exits() {
        let mut limit = FrameLimit::new(None);
        for _ in 0..1000 {
            assert_eq!(limit.tick(), AppControl::Continue);
        }
    }

    #[test]
    fn limit_exits_on_last_frame() {
        let mut limit = FrameLimit::new(Some(3));
        assert_eq!(limit.tick(), AppControl::Continue);
        assert_eq!(limit.tick(), AppControl::Continue);
        assert_eq!(limit.tick(), AppControl::Exit);
    }

    #[test]
    fn zero_limit_exits_after_first_frame() {
        assert_eq!(FrameLimit::new(Some(0)).tick(), AppControl::Exit);
    }
}
