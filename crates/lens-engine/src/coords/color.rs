use std::str::FromStr;

/// Straight (non-premultiplied) RGBA color, components in `[0, 1]`.
///
/// Used as a clear color; the alpha component reaches the window surface
/// unchanged so a transparent window can composite it.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Quantizes to 8-bit unorm the way an `Rgba8Unorm` target stores it.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        self.to_array()
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

/// Failure parsing a `r,g,b,a` color string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseColorError {
    #[error("expected 4 comma-separated components, got {0}")]
    ComponentCount(usize),
    #[error("invalid component {value:?}: {reason}")]
    Component { value: String, reason: String },
    #[error("component {0} is outside [0, 1]")]
    OutOfRange(f32),
}

impl FromStr for ColorRgba {
    type Err = ParseColorError;

    /// Parses `"r,g,b,a"` with each component in `[0, 1]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(ParseColorError::ComponentCount(parts.len()));
        }

        let mut c = [0.0f32; 4];
        for (slot, part) in c.iter_mut().zip(&parts) {
            let v: f32 = part.parse().map_err(|e: std::num::ParseFloatError| {
                ParseColorError::Component {
                    value: part.to_string(),
                    reason: e.to_string(),
                }
            })?;
            if !(0.0..=1.0).contains(&v) {
                return Err(ParseColorError::OutOfRange(v));
            }
            *slot = v;
        }

        Ok(Self::new(c[0], c[1], c[2], c[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_components() {
        let c: ColorRgba = "0, 0, 0, 0.5".parse().unwrap();
        assert_eq!(c, ColorRgba::new(0.0, 0.0, 0.0, 0.5));
    }

    #[test]
    fn rejects_wrong_component_count() {
        assert_eq!(
            "0.1,0.2,0.3".parse::<ColorRgba>(),
            Err(ParseColorError::ComponentCount(3))
        );
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            "0,0,2,1".parse::<ColorRgba>(),
            Err(ParseColorError::OutOfRange(2.0))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "a,b,c,d".parse::<ColorRgba>(),
            Err(ParseColorError::Component { .. })
        ));
    }

    #[test]
    fn rgba8_quantization_rounds() {
        assert_eq!(ColorRgba::new(0.0, 1.0, 0.1, 0.5).to_rgba8(), [0, 255, 26, 128]);
    }
}
