//! Core types for the rasterizer
//!
//! Stored colors, shaded fragments, vertices, triangles and the switches
//! that control rasterization.

use super::math::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

// =============================================================================
// Colors
// =============================================================================

/// Stored RGBA color (straight, non-premultiplied alpha)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    /// Cleared color: fully transparent black
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self { r: bytes[0], g: bytes[1], b: bytes[2], a: bytes[3] }
    }

    /// Channels as floats in 0..=255
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r as f32, self.g as f32, self.b as f32, self.a as f32)
    }
}

/// Output of the fragment stage for one pixel. Channels are in 0..=255.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fragment {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Fragment {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Fragment from a sampled texel (x, y, z, w) = (r, g, b, a)
    pub fn from_vec4(v: Vec4) -> Self {
        Self { r: v.x, g: v.y, b: v.z, a: v.w }
    }

    pub fn from_color(c: Color) -> Self {
        Self::from_vec4(c.to_vec4())
    }
}

// =============================================================================
// Primitives
// =============================================================================

/// A pipeline vertex.
///
/// Before the vertex stage `position` is a model-space point (w = 1) and
/// `attributes` carries the per-vertex inputs. The vertex stage produces a
/// clip-space `position` and fills `varyings`, which are the only values
/// interpolated across the triangle. All three vertices of a triangle must
/// carry the same number of varyings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
    pub varyings: Vec<f32>,
    pub attributes: Vec<f32>,
}

impl Vertex {
    /// Model-space vertex with input attributes and no varyings yet
    pub fn new(position: Vec3, attributes: Vec<f32>) -> Self {
        Self {
            position: Vec4::from_vec3(position, 1.0),
            varyings: Vec::new(),
            attributes,
        }
    }

    /// Clip-space vertex, as produced by a vertex stage
    pub fn clip(position: Vec4, varyings: Vec<f32>) -> Self {
        Self {
            position,
            varyings,
            attributes: Vec::new(),
        }
    }
}

/// Three vertices in order. Counter-clockwise on screen (y up) is front-facing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v1: Vertex, v2: Vertex, v3: Vertex) -> Self {
        Self { vertices: [v1, v2, v3] }
    }

    /// Same vertices, opposite winding
    pub fn reversed(&self) -> Self {
        let [a, b, c] = &self.vertices;
        Self::new(b.clone(), a.clone(), c.clone())
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Rasterization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Discard back-facing triangles; when off they are drawn with the last two vertices swapped
    pub backface_cull: bool,
    /// Use Z-buffer (true) or draw in submission order (false)
    pub use_zbuffer: bool,
    /// Perspective-correct varyings (true) or affine screen-space interpolation (false)
    pub perspective_correct: bool,
    /// Clip against the 6 frustum planes (true) or only reject triangles reaching w <= 0 (false)
    pub clip_frustum: bool,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            backface_cull: true,
            use_zbuffer: true,
            perspective_correct: true,
            clip_frustum: true,
        }
    }
}
