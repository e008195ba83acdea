use anyhow::{Context, Result};

/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends the instance may use. `Backends::GL` pins the OpenGL backend.
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: the blur averages stored values, and a linear target
    /// keeps clear colors byte-exact on screen.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior). FIFO is universally supported.
    pub present_mode: wgpu::PresentMode,

    /// Composite alpha modes in preference order.
    ///
    /// The first one the surface supports wins; otherwise the surface's first
    /// reported mode is used.
    pub alpha_modes: Vec<wgpu::CompositeAlphaMode>,

    /// Required wgpu features. Empty for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the device. Texture dimension limits are raised
    /// to whatever the adapter supports.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency hint for the surface.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_modes: Vec::new(),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// Preset for a window with a transparent framebuffer.
    pub fn transparent() -> Self {
        Self {
            alpha_modes: vec![
                wgpu::CompositeAlphaMode::PreMultiplied,
                wgpu::CompositeAlphaMode::PostMultiplied,
            ],
            ..Self::default()
        }
    }

    pub(crate) fn instance(&self) -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: self.backends,
            ..Default::default()
        })
    }
}

/// Requests the logical device and queue from `adapter`.
pub(crate) async fn open_device(
    adapter: &wgpu::Adapter,
    init: &GpuInit,
    label: &str,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    let info = adapter.get_info();
    log::info!(
        "using adapter {:?} ({:?} backend, {:?})",
        info.name,
        info.backend,
        info.device_type
    );

    let required_limits = init
        .required_limits
        .clone()
        .using_resolution(adapter.limits());

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: init.required_features,
            required_limits,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")
}

/// Parses a backend selector for configuration input.
///
/// Accepts `all`, `primary`, `gl`, `vulkan`, `metal` and `dx12`, and
/// `+`-separated combinations such as `vulkan+gl`.
pub fn parse_backends(s: &str) -> std::result::Result<wgpu::Backends, String> {
    let mut backends = wgpu::Backends::empty();
    for name in s.split('+').map(str::trim) {
        backends |= match name.to_ascii_lowercase().as_str() {
            "all" => wgpu::Backends::all(),
            "primary" => wgpu::Backends::PRIMARY,
            "gl" | "opengl" | "gles" => wgpu::Backends::GL,
            "vulkan" | "vk" => wgpu::Backends::VULKAN,
            "metal" => wgpu::Backends::METAL,
            "dx12" | "d3d12" => wgpu::Backends::DX12,
            other => return Err(format!("unknown backend {other:?}")),
        };
    }
    Ok(backends)
}
