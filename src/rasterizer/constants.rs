//! Rasterizer constants
//!
//! Default resolution and depth-buffer sentinels.

/// Default framebuffer width
pub const WIDTH: usize = 320;

/// Default framebuffer height
pub const HEIGHT: usize = 240;

/// Depth written by a clear: the far end of the normalized depth range.
/// Any fragment that survives the (-1, 1) range check passes against it.
pub const DEPTH_FAR: f32 = 1.0;

/// Vertices with clip-space w below this are behind the near plane, a
/// slightly stricter test than w <= 0
pub const W_EPSILON: f32 = 1e-5;
