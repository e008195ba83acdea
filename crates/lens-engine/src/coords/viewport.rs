use winit::dpi::PhysicalSize;

/// Render area size in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both dimensions are non-zero.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[inline]
    pub fn extent(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl From<PhysicalSize<u32>> for Viewport {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_is_invalid() {
        assert!(!Viewport::new(0, 600).is_valid());
        assert!(!Viewport::new(800, 0).is_valid());
        assert!(Viewport::new(800, 600).is_valid());
    }

    #[test]
    fn extent_is_single_layer() {
        let e = Viewport::new(800, 600).extent();
        assert_eq!((e.width, e.height, e.depth_or_array_layers), (800, 600, 1));
    }
}
