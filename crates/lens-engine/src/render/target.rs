use crate::coords::{ColorRgba, Viewport};
use crate::filter::EdgeMode;

use super::ctx::{clear_pass, RenderTarget};
use super::resource::{Owned, ResourceKind};

/// Color format of the offscreen target.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Reasons an offscreen target cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("offscreen target has zero size ({width}x{height})")]
    ZeroSize { width: u32, height: u32 },

    #[error("offscreen target {width}x{height} exceeds the device limit of {max}")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error("format {format:?} cannot be both rendered to and sampled")]
    NotRenderable { format: wgpu::TextureFormat },

    #[error("format {format:?} does not support linear filtering")]
    NotFilterable { format: wgpu::TextureFormat },
}

/// Completeness check run before any texture is allocated.
pub fn check_completeness(
    size: Viewport,
    format: wgpu::TextureFormat,
    limits: &wgpu::Limits,
    features: wgpu::Features,
) -> Result<(), TargetError> {
    let Viewport { width, height } = size;

    if !size.is_valid() {
        return Err(TargetError::ZeroSize { width, height });
    }

    let max = limits.max_texture_dimension_2d;
    if width > max || height > max {
        return Err(TargetError::TooLarge { width, height, max });
    }

    let caps = format.guaranteed_format_features(features);
    let needed = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
    if !caps.allowed_usages.contains(needed) {
        return Err(TargetError::NotRenderable { format });
    }
    if !caps
        .flags
        .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
    {
        return Err(TargetError::NotFilterable { format });
    }

    Ok(())
}

/// Offscreen color target: texture + view written by the scene pass, and the
/// sampler the composite pass reads it through.
///
/// Fixed size; created once at startup.
pub struct OffscreenTarget {
    size: Viewport,
    format: wgpu::TextureFormat,
    texture: Owned<wgpu::Texture>,
    view: Owned<wgpu::TextureView>,
    sampler: Owned<wgpu::Sampler>,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, size: Viewport, edge: EdgeMode) -> Result<Self, TargetError> {
        Self::with_format(device, size, OFFSCREEN_FORMAT, edge)
    }

    pub fn with_format(
        device: &wgpu::Device,
        size: Viewport,
        format: wgpu::TextureFormat,
        edge: EdgeMode,
    ) -> Result<Self, TargetError> {
        check_completeness(size, format, &device.limits(), device.features())?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lens offscreen color"),
            size: size.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let address_mode = edge.address_mode();
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lens offscreen sampler"),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        log::debug!(
            "offscreen target {}x{} {format:?} ({edge:?})",
            size.width,
            size.height
        );

        Ok(Self {
            size,
            format,
            texture: Owned::new(ResourceKind::Texture, "offscreen color", texture),
            view: Owned::new(ResourceKind::TextureView, "offscreen view", view),
            sampler: Owned::new(ResourceKind::Sampler, "offscreen sampler", sampler),
        })
    }

    pub fn size(&self) -> Viewport {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Binds this target for rendering and clears it to `color`.
    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder, color: ColorRgba) {
        let mut target = RenderTarget::new(encoder, &self.view);
        clear_pass(&mut target, "lens offscreen clear", color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::try_gpu;

    fn check(w: u32, h: u32, format: wgpu::TextureFormat) -> Result<(), TargetError> {
        check_completeness(
            Viewport::new(w, h),
            format,
            &wgpu::Limits::downlevel_defaults(),
            wgpu::Features::empty(),
        )
    }

    #[test]
    fn positive_sizes_within_limits_are_complete() {
        for (w, h) in [(1, 1), (800, 600), (1280, 780), (2048, 1)] {
            assert_eq!(check(w, h, OFFSCREEN_FORMAT), Ok(()), "{w}x{h}");
        }
    }

    #[test]
    fn zero_size_is_incomplete() {
        assert_eq!(
            check(0, 600, OFFSCREEN_FORMAT),
            Err(TargetError::ZeroSize { width: 0, height: 600 })
        );
    }

    #[test]
    fn oversized_target_is_incomplete() {
        let max = wgpu::Limits::downlevel_defaults().max_texture_dimension_2d;
        assert_eq!(
            check(max + 1, 10, OFFSCREEN_FORMAT),
            Err(TargetError::TooLarge { width: max + 1, height: 10, max })
        );
    }

    #[test]
    fn integer_format_is_not_filterable() {
        assert!(matches!(
            check(16, 16, wgpu::TextureFormat::Rgba32Uint),
            Err(TargetError::NotFilterable { .. })
        ));
    }

    #[test]
    fn shared_exponent_format_is_not_renderable() {
        assert!(matches!(
            check(16, 16, wgpu::TextureFormat::Rgb9e5Ufloat),
            Err(TargetError::NotRenderable { .. })
        ));
    }

    #[test]
    fn allocated_texture_matches_requested_size() {
        let Some(gpu) = try_gpu() else { return };
        for (w, h) in [(800, 600), (1, 1), (333, 77)] {
            let target = OffscreenTarget::new(gpu.device(), Viewport::new(w, h), EdgeMode::Repeat)
                .expect("complete target");
            let tex = target.texture();
            assert_eq!((tex.width(), tex.height()), (w, h));
            assert_eq!(tex.format(), OFFSCREEN_FORMAT);
        }
    }
}
