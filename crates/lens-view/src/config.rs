use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use winit::dpi::PhysicalSize;

use lens_engine::coords::ColorRgba;
use lens_engine::device::{parse_backends, GpuInit};
use lens_engine::filter::{BlurParams, EdgeMode};
use lens_engine::window::RuntimeConfig;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum Preset {
    /// Transparent 800x600 window, scene rendered offscreen and box-blurred.
    Lens,
    /// Opaque 1280x780 window cleared to dark grey every frame.
    Clear,
}

#[derive(Debug, Parser)]
#[command(name = "lens-view", version, about = "Offscreen render + box-blur composite viewer")]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = Preset::Lens)]
    pub preset: Preset,

    /// Window and offscreen width in physical pixels.
    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    #[arg(long)]
    pub title: Option<String>,

    /// Clear color as `r,g,b,a` in [0, 1].
    #[arg(long, value_name = "R,G,B,A")]
    pub clear: Option<ColorRgba>,

    /// Distance between blur taps in texture coordinates.
    #[arg(long)]
    pub blur_step: Option<f32>,

    /// Taps per side of the center tap; 4 gives a 9x9 kernel.
    #[arg(long)]
    pub blur_radius: Option<u32>,

    /// Address mode for taps outside the texture (repeat|clamp).
    #[arg(long)]
    pub edge: Option<EdgeMode>,

    /// GPU backends: all, primary, gl, vulkan, metal, dx12 (`+`-separated).
    #[arg(long, value_parser = parse_backends, default_value = "all")]
    pub backend: wgpu::Backends,

    /// Exit after this many frames.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Render without a window.
    #[arg(long)]
    pub headless: bool,

    /// Save the last headless frame as PNG.
    #[arg(long, value_name = "PATH", requires = "headless")]
    pub capture: Option<PathBuf>,

    /// Log filter in `env_logger` syntax; overrides RUST_LOG.
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}

/// Fully resolved run configuration.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub preset: Preset,
    pub window: RuntimeConfig,
    pub gpu: GpuInit,
    pub clear: ColorRgba,
    pub blur: BlurParams,
    pub frames: Option<u64>,
    pub headless: bool,
    pub capture: Option<PathBuf>,
}

impl ViewConfig {
    /// Defaults for `preset` before any overrides.
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Lens => Self {
                preset,
                window: RuntimeConfig {
                    title: "Lens View".to_string(),
                    size: PhysicalSize::new(800, 600),
                    transparent: true,
                    resizable: true,
                },
                gpu: GpuInit::transparent(),
                clear: ColorRgba::new(0.0, 0.0, 0.0, 0.5),
                blur: BlurParams::default(),
                frames: None,
                headless: false,
                capture: None,
            },
            Preset::Clear => Self {
                preset,
                window: RuntimeConfig {
                    title: "Todo".to_string(),
                    size: PhysicalSize::new(1280, 780),
                    transparent: false,
                    resizable: true,
                },
                gpu: GpuInit::default(),
                clear: ColorRgba::new(0.1, 0.1, 0.1, 1.0),
                blur: BlurParams::default(),
                frames: None,
                headless: false,
                capture: None,
            },
        }
    }
}

impl Cli {
    pub fn into_config(self) -> Result<ViewConfig> {
        let mut config = ViewConfig::preset(self.preset);

        if let Some(w) = self.width {
            config.window.size.width = w;
        }
        if let Some(h) = self.height {
            config.window.size.height = h;
        }
        anyhow::ensure!(
            config.window.size.width > 0 && config.window.size.height > 0,
            "window size must be non-zero, got {}x{}",
            config.window.size.width,
            config.window.size.height
        );

        if let Some(title) = self.title {
            config.window.title = title;
        }
        if let Some(clear) = self.clear {
            config.clear = clear;
        }
        if let Some(step) = self.blur_step {
            config.blur.step = step;
        }
        if let Some(radius) = self.blur_radius {
            config.blur.radius = radius;
        }
        if let Some(edge) = self.edge {
            config.blur.edge = edge;
        }
        config.blur.validate()?;

        anyhow::ensure!(
            self.capture.is_none() || self.headless,
            "--capture is only available with --headless"
        );

        config.gpu.backends = self.backend;
        config.frames = self.frames;
        config.headless = self.headless;
        config.capture = self.capture;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ViewConfig> {
        let mut argv = vec!["lens-view"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)?.into_config()
    }

    #[test]
    fn lens_preset_matches_the_classic_viewer() {
        let c = parse(&[]).unwrap();
        assert_eq!(c.preset, Preset::Lens);
        assert_eq!(c.window.title, "Lens View");
        assert_eq!(c.window.size, PhysicalSize::new(800, 600));
        assert!(c.window.transparent);
        assert_eq!(c.clear, ColorRgba::new(0.0, 0.0, 0.0, 0.5));
        assert_eq!(c.blur.taps(), 81);
        assert_eq!(c.gpu.backends, wgpu::Backends::all());
    }

    #[test]
    fn clear_preset_is_opaque_grey() {
        let c = parse(&["--preset", "clear"]).unwrap();
        assert_eq!(c.window.title, "Todo");
        assert_eq!(c.window.size, PhysicalSize::new(1280, 780));
        assert!(!c.window.transparent);
        assert_eq!(c.clear.a, 1.0);
    }

    #[test]
    fn overrides_apply() {
        let c = parse(&[
            "--width", "320", "--height", "200", "--clear", "1,0,0,1", "--blur-radius", "2",
            "--blur-step", "0.01", "--edge", "clamp", "--backend", "gl", "--frames", "3",
        ])
        .unwrap();
        assert_eq!(c.window.size, PhysicalSize::new(320, 200));
        assert_eq!(c.clear, ColorRgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(c.blur.taps(), 25);
        assert_eq!(c.blur.edge, EdgeMode::Clamp);
        assert_eq!(c.gpu.backends, wgpu::Backends::GL);
        assert_eq!(c.frames, Some(3));
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(parse(&["--width", "0"]).is_err());
    }

    #[test]
    fn oversized_radius_is_rejected() {
        assert!(parse(&["--blur-radius", "100"]).is_err());
    }

    #[test]
    fn capture_requires_headless() {
        assert!(parse(&["--capture", "out.png"]).is_err());
        let c = parse(&["--headless", "--capture", "out.png"]).unwrap();
        assert_eq!(c.capture, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn bad_backend_is_a_parse_error() {
        assert!(parse(&["--backend", "glide"]).is_err());
    }
}
