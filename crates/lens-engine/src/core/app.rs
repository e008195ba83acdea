use anyhow::Result;
use winit::event::WindowEvent;

use crate::device::Gpu;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    /// Close the window and exit normally.
    Exit,
    /// Close the window and report failure.
    Abort,
}

/// Application contract driven by [`crate::window::Runtime`].
pub trait App {
    /// Called once the window and GPU context exist, before the first frame.
    ///
    /// GPU resources are created here. An error aborts startup.
    fn init(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let _ = gpu;
        Ok(())
    }

    /// Called for window events before the runtime handles them.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once when the loop ends, while the GPU context is still alive.
    fn on_exit(&mut self) {}
}
