//! Framebuffer: color grid plus a parallel depth grid
//!
//! Colors are straight RGBA, 4 bytes per pixel, row 0 first. Depth holds the
//! normalized device z of the nearest fragment written so far; a clear resets
//! it to `DEPTH_FAR`.

use super::constants::DEPTH_FAR;
use super::types::{Color, Fragment};

/// Framebuffer for software rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    pub pixels: Vec<u8>,   // RGBA, 4 bytes per pixel
    pub zbuffer: Vec<f32>, // Depth buffer
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    /// Transparent black, depth at the far sentinel
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            zbuffer: vec![DEPTH_FAR; width * height],
            width,
            height,
        }
    }

    /// Wrap existing RGBA bytes. Returns None if the length does not match.
    pub fn from_rgba(width: usize, height: usize, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width * height * 4 {
            return None;
        }
        Some(Self {
            pixels,
            zbuffer: vec![DEPTH_FAR; width * height],
            width,
            height,
        })
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.pixels = vec![0; width * height * 4];
            self.zbuffer = vec![DEPTH_FAR; width * height];
        }
    }

    /// Fill every pixel with `color` and reset depth
    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
        self.clear_depth();
    }

    /// Clear framebuffer with transparent black (for alpha compositing)
    pub fn clear_transparent(&mut self) {
        self.pixels.fill(0);
        self.clear_depth();
    }

    pub fn clear_depth(&mut self) {
        self.zbuffer.fill(DEPTH_FAR);
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Color> {
        let i = self.index(x, y)? * 4;
        Some(Color::from_bytes([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]))
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i * 4..i * 4 + 4].copy_from_slice(&color.to_bytes());
        }
    }

    pub fn get_depth(&self, x: usize, y: usize) -> Option<f32> {
        self.index(x, y).map(|i| self.zbuffer[i])
    }

    pub fn set_depth(&mut self, x: usize, y: usize, depth: f32) {
        if let Some(i) = self.index(x, y) {
            self.zbuffer[i] = depth;
        }
    }

    /// Composite a fragment over the stored pixel.
    ///
    /// Alpha >= 255 replaces the pixel. Otherwise, with mix = a/255, each
    /// color channel becomes old*(1-mix) + new*mix and the stored alpha
    /// becomes old_a + mix*(255-old_a).
    pub fn blend_pixel(&mut self, x: usize, y: usize, frag: Fragment) {
        let Some(i) = self.index(x, y) else { return };
        let px = &mut self.pixels[i * 4..i * 4 + 4];
        if frag.a >= 255.0 {
            px[0] = to_channel(frag.r);
            px[1] = to_channel(frag.g);
            px[2] = to_channel(frag.b);
            px[3] = 255;
            return;
        }
        let mix = frag.a / 255.0;
        let keep = 1.0 - mix;
        px[0] = to_channel(px[0] as f32 * keep + frag.r * mix);
        px[1] = to_channel(px[1] as f32 * keep + frag.g * mix);
        px[2] = to_channel(px[2] as f32 * keep + frag.b * mix);
        let old_a = px[3] as f32;
        px[3] = to_channel(old_a + mix * (255.0 - old_a));
    }

    /// Depth-test and composite one fragment. Closer or equal depth wins.
    /// Returns true if the pixel was written.
    pub fn write_fragment(&mut self, x: usize, y: usize, depth: f32, frag: Fragment, use_zbuffer: bool) -> bool {
        let Some(i) = self.index(x, y) else { return false };
        if use_zbuffer {
            if depth > self.zbuffer[i] {
                return false;
            }
            self.zbuffer[i] = depth;
        }
        self.blend_pixel(x, y, frag);
        true
    }

    /// Number of pixels with nonzero alpha
    pub fn coverage(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] > 0).count()
    }
}

#[inline]
fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
