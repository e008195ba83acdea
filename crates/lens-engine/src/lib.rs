//! Lens engine crate.
//!
//! Owns the platform + GPU runtime and the two-pass offscreen/blur frame
//! pipeline used by the `lens-view` binary.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod filter;
pub mod render;
