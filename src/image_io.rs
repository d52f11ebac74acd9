//! Texture decoding and PNG export
//!
//! Images are decoded with the `image` crate into a `Framebuffer` so any
//! image can be bound as a texture. Row 0 of the image is row 0 of the
//! buffer (v = 0).

use std::path::Path;

use crate::error::AssetError;
use crate::rasterizer::{Color, Framebuffer};

/// Decode PNG, JPEG or BMP bytes into a texture
pub fn texture_from_bytes(bytes: &[u8]) -> Result<Framebuffer, AssetError> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = img.dimensions();
    Framebuffer::from_rgba(width as usize, height as usize, img.into_raw())
        .ok_or_else(|| AssetError::Validation("decoded image has unexpected size".to_string()))
}

/// Load an image file as a texture
pub fn load_texture<P: AsRef<Path>>(path: P) -> Result<Framebuffer, AssetError> {
    let bytes = std::fs::read(path.as_ref())?;
    let tex = texture_from_bytes(&bytes)?;
    log::info!("loaded texture {} ({}x{})", path.as_ref().display(), tex.width, tex.height);
    Ok(tex)
}

/// Two-color checkerboard with square cells of `cell` pixels
pub fn checkerboard(width: usize, height: usize, cell: usize, a: Color, b: Color) -> Framebuffer {
    let cell = cell.max(1);
    let mut fb = Framebuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let color = if (x / cell + y / cell) % 2 == 0 { a } else { b };
            fb.set_pixel(x, y, color);
        }
    }
    fb
}

/// Fallback texture for the textured demo
pub fn default_texture() -> Framebuffer {
    checkerboard(64, 64, 8, Color::new(178, 84, 52), Color::new(222, 200, 170))
}

/// Load the configured texture, falling back to the checkerboard
pub fn load_texture_or_default(path: Option<&str>) -> Framebuffer {
    let Some(path) = path else {
        return default_texture();
    };
    match load_texture(path) {
        Ok(tex) => tex,
        Err(e) => {
            log::warn!("texture {} unavailable ({}), using checkerboard", path, e);
            default_texture()
        }
    }
}

/// Write the color grid as a PNG
pub fn save_png<P: AsRef<Path>>(fb: &Framebuffer, path: P) -> Result<(), AssetError> {
    let img = image::RgbaImage::from_raw(fb.width as u32, fb.height as u32, fb.pixels.clone())
        .ok_or_else(|| AssetError::Validation("framebuffer size does not match its pixels".to_string()))?;
    img.save_with_format(path.as_ref(), image::ImageFormat::Png)?;
    Ok(())
}
