use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Inner size in physical pixels; also the offscreen target size.
    pub size: PhysicalSize<u32>,
    /// Request a transparent framebuffer.
    pub transparent: bool,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lens".to_string(),
            size: PhysicalSize::new(800, 600),
            transparent: false,
            resizable: true,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and drives `app` until the window closes.
    ///
    /// Returns an error if the window or GPU context cannot be created, if
    /// `App::init` fails, or if the app aborts the loop.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
    finished: bool,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            failure: None,
            finished: false,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.size)
            .with_transparent(self.config.transparent)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = &self.gpu_init;
        let entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("failed to initialize GPU context for window")?;

        entry
            .with_gpu(|gpu| self.app.init(gpu))
            .context("application initialization failed")?;

        Ok(entry)
    }

    /// Ends the loop: app teardown first, then the window and GPU context.
    fn finish(&mut self, event_loop: &ActiveEventLoop, failure: Option<anyhow::Error>) {
        if let Some(err) = failure {
            log::error!("{err:#}");
            self.failure.get_or_insert(err);
        }

        if !self.finished {
            self.finished = true;
            self.app.on_exit();
            if let Some(entry) = self.entry.take() {
                let frames = entry.borrow_clock().frames();
                match entry.borrow_clock().average_fps() {
                    Some(fps) => log::info!("closing after {frames} frames ({fps:.1} fps)"),
                    None => log::info!("closing after {frames} frames"),
                }
            }
        }

        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else { return };
        let app = &mut self.app;

        let control = entry.with_mut(|fields| {
            let time = fields.clock.tick();
            log::trace!("frame {} dt {:.4}s", time.frame_index, time.dt);

            let mut ctx = FrameCtx {
                window: fields.window,
                gpu: fields.gpu,
                time,
            };
            app.on_frame(&mut ctx)
        });

        match control {
            AppControl::Continue => {}
            AppControl::Exit => self.finish(event_loop, None),
            AppControl::Abort => self.finish(event_loop, Some(anyhow!("render loop aborted"))),
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.finished {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.entry = Some(entry);
            }
            Err(e) => self.finish(event_loop, Some(e)),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.finished {
            event_loop.exit();
            return;
        }

        // Continuous redraw: one frame per loop iteration.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.finished {
            event_loop.exit();
            return;
        }

        match self.app.on_window_event(&event) {
            AppControl::Continue => {}
            AppControl::Exit => return self.finish(event_loop, None),
            AppControl::Abort => {
                return self.finish(event_loop, Some(anyhow!("application aborted")));
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::debug!("close requested");
                self.finish(event_loop, None);
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        if !self.finished {
            self.finish(event_loop, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_a_resizable_opaque_window() {
        let c = RuntimeConfig::default();
        assert_eq!(c.size, PhysicalSize::new(800, 600));
        assert!(c.resizable);
        assert!(!c.transparent);
    }
}
