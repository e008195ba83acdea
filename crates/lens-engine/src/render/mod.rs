//! GPU rendering subsystem.
//!
//! The frame pipeline is two passes recorded into one encoder:
//! offscreen scene pass (clear + `Scene`) → composite pass (clear + blurred
//! full-screen quad). Each GPU object lives in an owning handle
//! (`QuadMesh`, `ShaderProgram`, `OffscreenTarget`, `BlurPass`) and is
//! passed to operations explicitly.
//!
//! Convention:
//! - quad positions are NDC, texture coordinates have a top-left origin.
//! - sizes are physical pixels.

mod blur;
mod ctx;
mod mesh;
mod pipeline;
mod readback;
pub mod resource;
pub mod shader;
mod target;

pub use blur::BlurPass;
pub use ctx::{clear_pass, RenderCtx, RenderTarget};
pub use mesh::{QuadMesh, QuadVertex, QUAD_VERTICES};
pub use pipeline::{EmptyScene, FramePipeline, Scene};
pub use readback::CaptureTarget;
pub use shader::{ShaderError, ShaderProgram, ShaderSources, ShaderStage};
pub use target::{check_completeness, OffscreenTarget, TargetError, OFFSCREEN_FORMAT};
