//! Texture sampling
//!
//! Anything that can answer the four accessors below can be bound as a
//! texture. Coordinates are normalized: (0, 0) is the first stored pixel,
//! (1, 1) the far corner. Out-of-range coordinates clamp to the edge; there
//! is no wrap or mirror mode.

use serde::{Deserialize, Serialize};
use super::framebuffer::Framebuffer;
use super::math::Vec4;

/// Texture filtering mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    Nearest,
    #[default]
    Bilinear,
}

impl FilterMode {
    pub fn label(&self) -> &'static str {
        match self {
            FilterMode::Nearest => "nearest",
            FilterMode::Bilinear => "bilinear",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            FilterMode::Nearest => FilterMode::Bilinear,
            FilterMode::Bilinear => FilterMode::Nearest,
        }
    }
}

/// A sampleable texture. Colors come back as (r, g, b, a) in 0..=255.
pub trait Texture {
    fn color_nearest(&self, u: f32, v: f32) -> Vec4;
    fn color_bilinear(&self, u: f32, v: f32) -> Vec4;
    fn depth_nearest(&self, u: f32, v: f32) -> f32;
    fn depth_bilinear(&self, u: f32, v: f32) -> f32;

    fn sample(&self, u: f32, v: f32, filter: FilterMode) -> Vec4 {
        match filter {
            FilterMode::Nearest => self.color_nearest(u, v),
            FilterMode::Bilinear => self.color_bilinear(u, v),
        }
    }
}

/// Texel index for nearest sampling, clamped to 0..size
#[inline]
fn nearest_index(t: f32, size: usize) -> usize {
    let i = (t * size as f32).floor() as i64;
    i.clamp(0, size as i64 - 1) as usize
}

/// The two texel indices straddling `t` (pixel centers at +0.5) and the
/// weight of the second one
#[inline]
fn bilinear_taps(t: f32, size: usize) -> (usize, usize, f32) {
    let x = t * size as f32 - 0.5;
    let base = x.floor();
    let max = size as i64 - 1;
    let lo = (base as i64).clamp(0, max) as usize;
    let hi = (base as i64 + 1).clamp(0, max) as usize;
    (lo, hi, x - base)
}

impl Framebuffer {
    #[inline]
    fn texel(&self, x: usize, y: usize) -> Vec4 {
        let i = (y * self.width + x) * 4;
        Vec4::new(
            self.pixels[i] as f32,
            self.pixels[i + 1] as f32,
            self.pixels[i + 2] as f32,
            self.pixels[i + 3] as f32,
        )
    }

    fn bilinear<T, F>(&self, u: f32, v: f32, fetch: F, lerp: fn(T, T, f32) -> T) -> T
    where
        T: Copy,
        F: Fn(usize, usize) -> T,
    {
        let (x0, x1, ax) = bilinear_taps(u, self.width);
        let (y0, y1, ay) = bilinear_taps(v, self.height);
        let top = lerp(fetch(x0, y0), fetch(x1, y0), ax);
        let bottom = lerp(fetch(x0, y1), fetch(x1, y1), ax);
        lerp(top, bottom, ay)
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

fn lerp_vec4(a: Vec4, b: Vec4, t: f32) -> Vec4 {
    a + (b - a) * t
}

fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl Texture for Framebuffer {
    fn color_nearest(&self, u: f32, v: f32) -> Vec4 {
        if self.is_empty() {
            return Vec4::ZERO;
        }
        self.texel(nearest_index(u, self.width), nearest_index(v, self.height))
    }

    fn color_bilinear(&self, u: f32, v: f32) -> Vec4 {
        if self.is_empty() {
            return Vec4::ZERO;
        }
        self.bilinear(u, v, |x, y| self.texel(x, y), lerp_vec4)
    }

    fn depth_nearest(&self, u: f32, v: f32) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        self.zbuffer[nearest_index(v, self.height) * self.width + nearest_index(u, self.width)]
    }

    fn depth_bilinear(&self, u: f32, v: f32) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        self.bilinear(u, v, |x, y| self.zbuffer[y * self.width + x], lerp_f32)
    }
}
