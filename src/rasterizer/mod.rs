//! CPU software rasterizer
//!
//! Features:
//! - Homogeneous clipping against all six frustum planes
//! - Perspective-correct varyings (or affine, per settings)
//! - Scanline fill with depth test and straight-alpha blending
//! - Nearest and bilinear sampling from any framebuffer
//!
//! # Module Organization
//!
//! - `math` - Vec3, Vec4, Mat4 builders
//! - `types` - Color, Fragment, Vertex, Triangle, RasterSettings
//! - `framebuffer` - color + depth grids, compositing
//! - `sampling` - Texture trait, FilterMode
//! - `clip` - ClipPlane, pooled Clipper
//! - `render` - single-triangle scan conversion
//! - `pipeline` - Shader trait, Renderer, DrawStats
//! - `constants` - resolution and depth sentinels

pub mod clip;
pub mod constants;
pub mod framebuffer;
pub mod math;
pub mod pipeline;
pub mod render;
pub mod sampling;
pub mod types;

// =============================================================================
// Convenience re-exports for commonly used items
// =============================================================================

// Types - core data structures
pub use types::{Color, Fragment, RasterSettings, Triangle, Vertex};

// Math - vectors and matrices
pub use math::{
    Vec3, Vec4, Mat4,
    mat4_identity, mat4_scale, mat4_translation,
    mat4_rotation_x, mat4_rotation_y, mat4_rotation_z, mat4_rotation_axis,
    mat4_perspective, mat4_mul, mat4_transform_vec4, mat4_transform_point,
};

// Framebuffer and sampling
pub use framebuffer::Framebuffer;
pub use sampling::{FilterMode, Texture};

// Clipping
pub use clip::{clip_to_frustum, clip_triangles, ClipPlane, Clipper};

// Rendering
pub use render::draw_triangle;
pub use pipeline::{draw_triangles, DrawStats, FnShader, Renderer, Shader};

// Constants
pub use constants::{DEPTH_FAR, HEIGHT, WIDTH};
