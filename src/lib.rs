//! softraster: a CPU triangle rasterizer
//!
//! Triangles go through a programmable vertex stage, get clipped against the
//! view frustum in homogeneous space, and are scan-converted into a color and
//! depth buffer with perspective-correct varyings.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod demos;
pub mod error;
pub mod image_io;
pub mod logging;
pub mod rasterizer;
