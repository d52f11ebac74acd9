//! Pipeline driver
//!
//! vertex stage -> clip -> rasterize, one triangle at a time. The shader and
//! the uniform bundle are supplied by the caller; the pipeline never looks
//! inside the uniforms.

use super::clip::Clipper;
use super::framebuffer::Framebuffer;
use super::render::{rasterize_triangle, ScanScratch};
use super::types::{Fragment, RasterSettings, Triangle, Vertex};

/// Programmable stages.
///
/// `vertex` maps an input vertex to clip space and fills its varyings;
/// `fragment` maps interpolated varyings to a color, or None to discard.
pub trait Shader<U: ?Sized> {
    fn vertex(&self, input: &Vertex, uniforms: &U) -> Vertex;
    fn fragment(&self, varyings: &[f32], uniforms: &U) -> Option<Fragment>;
}

/// A shader made of two closures
pub struct FnShader<V, F> {
    pub vertex: V,
    pub fragment: F,
}

impl<U, V, F> Shader<U> for FnShader<V, F>
where
    U: ?Sized,
    V: Fn(&Vertex, &U) -> Vertex,
    F: Fn(&[f32], &U) -> Option<Fragment>,
{
    fn vertex(&self, input: &Vertex, uniforms: &U) -> Vertex {
        (self.vertex)(input, uniforms)
    }

    fn fragment(&self, varyings: &[f32], uniforms: &U) -> Option<Fragment> {
        (self.fragment)(varyings, uniforms)
    }
}

/// Per-draw counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Input triangles
    pub triangles_submitted: usize,
    /// Inputs removed entirely by clipping (or w <= 0 rejection)
    pub triangles_clipped: usize,
    /// Post-clip triangles that reached scan conversion
    pub triangles_rasterized: usize,
    pub triangles_culled: usize,
    pub triangles_degenerate: usize,
    pub fragments_shaded: usize,
    /// Fragments whose depth fell outside (-1, 1)
    pub depth_rejected: usize,
    pub pixels_written: usize,
}

impl DrawStats {
    /// Accumulate counters from another draw
    pub fn accumulate(&mut self, other: &DrawStats) {
        self.triangles_submitted += other.triangles_submitted;
        self.triangles_clipped += other.triangles_clipped;
        self.triangles_rasterized += other.triangles_rasterized;
        self.triangles_culled += other.triangles_culled;
        self.triangles_degenerate += other.triangles_degenerate;
        self.fragments_shaded += other.fragments_shaded;
        self.depth_rejected += other.depth_rejected;
        self.pixels_written += other.pixels_written;
    }
}

/// Draws triangle lists, reusing its clip pool and scan buffers between calls
#[derive(Debug, Default)]
pub struct Renderer {
    pub settings: RasterSettings,
    clipper: Clipper,
    scratch: ScanScratch,
}

impl Renderer {
    pub fn new(settings: RasterSettings) -> Self {
        Self {
            settings,
            clipper: Clipper::new(),
            scratch: ScanScratch::default(),
        }
    }

    /// Run every triangle through the pipeline into `fb`
    pub fn draw<S, U>(&mut self, fb: &mut Framebuffer, triangles: &[Triangle], shader: &S, uniforms: &U) -> DrawStats
    where
        S: Shader<U> + ?Sized,
        U: ?Sized,
    {
        let mut stats = DrawStats {
            triangles_submitted: triangles.len(),
            ..DrawStats::default()
        };
        let mut fragment = |varyings: &[f32]| shader.fragment(varyings, uniforms);

        for tri in triangles {
            let out = tri.vertices.each_ref().map(|v| shader.vertex(v, uniforms));

            if !self.settings.clip_frustum {
                if out.iter().any(|v| !(v.position.w > 0.0)) {
                    stats.triangles_clipped += 1;
                    continue;
                }
                let [a, b, c] = &out;
                rasterize_triangle(
                    fb,
                    [a.position, b.position, c.position],
                    [&a.varyings, &b.varyings, &c.varyings],
                    &self.settings,
                    &mut self.scratch,
                    &mut stats,
                    &mut fragment,
                );
                continue;
            }

            let stride = out.iter().map(|v| v.varyings.len()).min().unwrap_or(0);
            self.clipper.reset(stride);
            let indices = out.each_ref().map(|v| self.clipper.push_vertex(v.position, &v.varyings));
            self.clipper.push_triangle(indices);
            self.clipper.clip_to_frustum();

            if self.clipper.triangles().is_empty() {
                stats.triangles_clipped += 1;
                continue;
            }
            for &[a, b, c] in self.clipper.triangles() {
                rasterize_triangle(
                    fb,
                    [self.clipper.position(a), self.clipper.position(b), self.clipper.position(c)],
                    [self.clipper.varyings(a), self.clipper.varyings(b), self.clipper.varyings(c)],
                    &self.settings,
                    &mut self.scratch,
                    &mut stats,
                    &mut fragment,
                );
            }
        }

        log::debug!(
            "draw: {} tris in, {} clipped away, {} rasterized, {} culled, {} degenerate, {} fragments, {} pixels",
            stats.triangles_submitted,
            stats.triangles_clipped,
            stats.triangles_rasterized,
            stats.triangles_culled,
            stats.triangles_degenerate,
            stats.fragments_shaded,
            stats.pixels_written,
        );
        if stats.depth_rejected > 0 {
            log::warn!("draw: {} fragments outside the depth range", stats.depth_rejected);
        }
        stats
    }
}

/// Draw with default settings and a throwaway renderer
pub fn draw_triangles<S, U>(fb: &mut Framebuffer, triangles: &[Triangle], shader: &S, uniforms: &U) -> DrawStats
where
    S: Shader<U> + ?Sized,
    U: ?Sized,
{
    Renderer::default().draw(fb, triangles, shader, uniforms)
}
