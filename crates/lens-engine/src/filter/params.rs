use std::str::FromStr;

use bytemuck::{Pod, Zeroable};

/// Texture address mode applied to blur taps that fall outside `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum EdgeMode {
    /// Wrap around (the GL default wrap mode).
    #[default]
    Repeat,
    /// Clamp to the border texel.
    Clamp,
}

impl EdgeMode {
    pub fn address_mode(self) -> wgpu::AddressMode {
        match self {
            EdgeMode::Repeat => wgpu::AddressMode::Repeat,
            EdgeMode::Clamp => wgpu::AddressMode::ClampToEdge,
        }
    }
}

impl FromStr for EdgeMode {
    type Err = BlurParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repeat" => Ok(EdgeMode::Repeat),
            "clamp" => Ok(EdgeMode::Clamp),
            other => Err(BlurParamsError::UnknownEdgeMode(other.to_string())),
        }
    }
}

/// Reasons a blur configuration is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BlurParamsError {
    #[error("unknown edge mode {0:?} (expected repeat|clamp)")]
    UnknownEdgeMode(String),

    #[error("blur radius {radius} exceeds maximum {max}")]
    RadiusTooLarge { radius: u32, max: u32 },

    #[error("blur step {0} must be finite and non-negative")]
    InvalidStep(f32),

    /// The address mode lives in the offscreen sampler and is fixed at creation.
    #[error("edge mode is fixed at {current:?}, cannot switch to {requested:?}")]
    EdgeModeChanged {
        current: EdgeMode,
        requested: EdgeMode,
    },
}

/// Shape of the box blur.
///
/// Taps are taken at `t + (dx, dy) * step` for integer `dx, dy` in
/// `[-radius, radius]` and averaged with equal weight. `step` is in texture
/// coordinates, so the blur radius in pixels grows with the texture size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlurParams {
    pub radius: u32,
    pub step: f32,
    pub edge: EdgeMode,
}

impl Default for BlurParams {
    /// 9×9 taps, 1/300 step.
    fn default() -> Self {
        Self {
            radius: 4,
            step: 1.0 / 300.0,
            edge: EdgeMode::Repeat,
        }
    }
}

impl BlurParams {
    /// Largest radius accepted; 33×33 taps per pixel.
    pub const MAX_RADIUS: u32 = 16;

    /// Taps along one axis.
    #[inline]
    pub fn diameter(&self) -> u32 {
        2 * self.radius + 1
    }

    /// Total taps per output pixel.
    #[inline]
    pub fn taps(&self) -> u32 {
        self.diameter() * self.diameter()
    }

    /// Weight of each tap.
    #[inline]
    pub fn weight(&self) -> f32 {
        1.0 / self.taps() as f32
    }

    pub fn validate(&self) -> Result<(), BlurParamsError> {
        if self.radius > Self::MAX_RADIUS {
            return Err(BlurParamsError::RadiusTooLarge {
                radius: self.radius,
                max: Self::MAX_RADIUS,
            });
        }
        if !self.step.is_finite() || self.step < 0.0 {
            return Err(BlurParamsError::InvalidStep(self.step));
        }
        Ok(())
    }

    pub(crate) fn uniform(&self) -> BlurUniform {
        BlurUniform {
            step: self.step,
            radius: self.radius,
            _pad: [0.0; 2],
        }
    }
}

/// GPU layout of `BlurParams` (std140, 16 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct BlurUniform {
    pub step: f32,
    pub radius: u32,
    pub _pad: [f32; 2],
}
