//! Box-blur filter definition.
//!
//! `BlurParams` is the single source of truth for the filter shape; the GPU
//! composite pass uploads it as a uniform and `box_blur` evaluates the same
//! filter on the CPU (bilinear taps, same address mode) for verification.

mod box_blur;
mod params;

pub use box_blur::{box_blur, sample_bilinear};
pub use params::{BlurParams, BlurParamsError, EdgeMode};
pub(crate) use params::BlurUniform;
