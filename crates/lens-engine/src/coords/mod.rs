//! Small value types shared by the runtime and the render pipeline.
//!
//! Sizes are physical pixels. Colors are straight RGBA in `[0, 1]`.

mod color;
mod viewport;

pub use color::{ColorRgba, ParseColorError};
pub use viewport::Viewport;
