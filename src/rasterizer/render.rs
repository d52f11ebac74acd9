//! Triangle scan conversion
//!
//! Takes one clip-space triangle (all w > 0) and paints it:
//! divide by w, map to pixels, cull, fit a screen-space plane to every
//! channel, then walk the upper and lower halves row by row.
//!
//! Each vertex carries its varyings divided by w plus two extra channels,
//! NDC z and 1/w. All of them are affine in screen space, so they step by a
//! constant per pixel; the true varyings come back as channel / (1/w).
//! Pixel (x, y) samples the triangle at integer coordinates; a pixel on an
//! edge belongs to the triangle on its right and below.

use super::framebuffer::Framebuffer;
use super::math::Vec4;
use super::pipeline::DrawStats;
use super::types::{Fragment, RasterSettings, Triangle};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ScreenPoint {
    x: f32,
    y: f32,
}

/// Edge line walked from its upper endpoint. Evaluated directly per row
/// (not accumulated) so two triangles sharing an edge agree exactly.
struct Edge {
    x0: f32,
    y0: f32,
    slope: f32,
}

impl Edge {
    fn new(from: ScreenPoint, to: ScreenPoint) -> Self {
        let dy = to.y - from.y;
        let slope = if dy != 0.0 { (to.x - from.x) / dy } else { 0.0 };
        Self { x0: from.x, y0: from.y, slope }
    }

    #[inline]
    fn x_at(&self, y: f32) -> f32 {
        self.x0 + (y - self.y0) * self.slope
    }
}

/// Screen-space plane of every channel, anchored at the top vertex
struct ChannelPlane<'a> {
    origin: ScreenPoint,
    base: &'a [f32],
    dx: &'a [f32],
    dy: &'a [f32],
}

impl ChannelPlane<'_> {
    fn eval_into(&self, x: f32, y: f32, out: &mut Vec<f32>) {
        let (ox, oy) = (x - self.origin.x, y - self.origin.y);
        out.clear();
        out.extend(
            self.base
                .iter()
                .zip(self.dx)
                .zip(self.dy)
                .map(|((b, dx), dy)| b + dx * ox + dy * oy),
        );
    }
}

/// Reusable per-triangle buffers
#[derive(Debug, Default)]
pub struct ScanScratch {
    channels: [Vec<f32>; 3],
    dx: Vec<f32>,
    dy: Vec<f32>,
    row: Vec<f32>,
    recovered: Vec<f32>,
}

/// Row range [ceil(v)] clamped to 0..=max
#[inline]
fn clamp_ceil(v: f32, max: usize) -> usize {
    (v.ceil() as i64).clamp(0, max as i64) as usize
}

/// Rasterize one clip-space triangle into `fb`.
///
/// Every vertex must have w > 0. The fragment function receives the
/// interpolated varyings (as many as the shortest of the three lists) and
/// returns None or a zero alpha to discard. Counters land in `stats`.
pub fn rasterize_triangle<F>(
    fb: &mut Framebuffer,
    positions: [Vec4; 3],
    varyings: [&[f32]; 3],
    settings: &RasterSettings,
    scratch: &mut ScanScratch,
    stats: &mut DrawStats,
    fragment: &mut F,
) where
    F: FnMut(&[f32]) -> Option<Fragment>,
{
    let n = varyings.iter().map(|v| v.len()).min().unwrap_or(0);
    let (width, height) = (fb.width as f32, fb.height as f32);
    let ScanScratch { channels, dx, dy, row, recovered } = scratch;

    // === PERSPECTIVE DIVIDE + VIEWPORT ===
    let mut pts = [ScreenPoint::default(); 3];
    for i in 0..3 {
        let p = positions[i];
        let ndc = p.perspective_divide();
        pts[i] = ScreenPoint {
            x: (ndc.x + 1.0) * width / 2.0,
            y: (ndc.y + 1.0) * height / 2.0,
        };
        let inv_w = if settings.perspective_correct { 1.0 / p.w } else { 1.0 };
        let ch = &mut channels[i];
        ch.clear();
        ch.extend(varyings[i][..n].iter().map(|v| v * inv_w));
        ch.push(ndc.z);
        ch.push(inv_w);
    }

    // === SORT ===
    // Rotate so the lowest y comes first; rotation keeps the winding
    let mut i1 = 0;
    if pts[1].y < pts[i1].y {
        i1 = 1;
    }
    if pts[2].y < pts[i1].y {
        i1 = 2;
    }
    let (mut i2, mut i3) = ((i1 + 1) % 3, (i1 + 2) % 3);

    // === CULL ===
    let p1 = pts[i1];
    let mut cr = (pts[i2].x - p1.x) * (pts[i3].y - p1.y) - (pts[i2].y - p1.y) * (pts[i3].x - p1.x);
    if cr == 0.0 || !cr.is_finite() {
        stats.triangles_degenerate += 1;
        return;
    }
    if cr < 0.0 {
        if settings.backface_cull {
            stats.triangles_culled += 1;
            return;
        }
        std::mem::swap(&mut i2, &mut i3);
        cr = -cr;
    }
    let (p2, p3) = (pts[i2], pts[i3]);

    // === GRADIENTS ===
    // Plane fit: r = r1 + dx*(x - x1) + dy*(y - y1) through all three vertices
    let (w12, h12) = (p2.x - p1.x, p2.y - p1.y);
    let (w13, h13) = (p3.x - p1.x, p3.y - p1.y);
    dx.clear();
    dy.clear();
    for k in 0..n + 2 {
        let r1 = channels[i1][k];
        let d2 = channels[i2][k] - r1;
        let d3 = channels[i3][k] - r1;
        dx.push((d2 * h13 - d3 * h12) / cr);
        dy.push((d3 * w12 - d2 * w13) / cr);
    }
    stats.triangles_rasterized += 1;

    let plane = ChannelPlane {
        origin: p1,
        base: &channels[i1],
        dx,
        dy,
    };

    // === SCAN ===
    let long = Edge::new(p1, p3);
    let upper_right = Edge::new(p1, p2);
    let mut span = |y_start: f32, y_end: f32, left: &Edge, right: &Edge| {
        let rows = clamp_ceil(y_start, fb.height)..clamp_ceil(y_end, fb.height);
        for y in rows {
            let yf = y as f32;
            let x0 = clamp_ceil(left.x_at(yf), fb.width);
            let x1 = clamp_ceil(right.x_at(yf), fb.width);
            if x0 >= x1 {
                continue;
            }
            plane.eval_into(x0 as f32, yf, row);
            for x in x0..x1 {
                if x > x0 {
                    for (v, d) in row.iter_mut().zip(plane.dx) {
                        *v += d;
                    }
                }

                let inv_w = row[n + 1];
                recovered.clear();
                recovered.extend(row[..n].iter().map(|v| v / inv_w));

                stats.fragments_shaded += 1;
                let Some(frag) = fragment(recovered) else { continue };
                if !(frag.a > 0.0) {
                    continue;
                }

                let depth = row[n];
                if !(depth > -1.0 && depth < 1.0) {
                    stats.depth_rejected += 1;
                    continue;
                }
                if fb.write_fragment(x, y, depth, frag, settings.use_zbuffer) {
                    stats.pixels_written += 1;
                }
            }
        }
    };

    span(p1.y, p2.y.min(p3.y), &long, &upper_right);
    if p2.y > p3.y {
        span(p3.y, p2.y, &Edge::new(p3, p2), &upper_right);
    } else {
        span(p2.y, p3.y, &long, &Edge::new(p2, p3));
    }
}

/// Rasterize a single clip-space triangle without clipping.
/// A vertex with w <= 0 drops the whole triangle.
pub fn draw_triangle<F>(
    fb: &mut Framebuffer,
    triangle: &Triangle,
    settings: &RasterSettings,
    mut fragment: F,
) -> DrawStats
where
    F: FnMut(&[f32]) -> Option<Fragment>,
{
    let mut stats = DrawStats {
        triangles_submitted: 1,
        ..DrawStats::default()
    };
    if triangle.vertices.iter().any(|v| !(v.position.w > 0.0)) {
        stats.triangles_clipped += 1;
        return stats;
    }
    let [a, b, c] = &triangle.vertices;
    let mut scratch = ScanScratch::default();
    rasterize_triangle(
        fb,
        [a.position, b.position, c.position],
        [&a.varyings, &b.varyings, &c.varyings],
        settings,
        &mut scratch,
        &mut stats,
        &mut fragment,
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::types::{Color, Vertex};

    fn ndc_vertex(x: f32, y: f32, z: f32, w: f32, varyings: Vec<f32>) -> Vertex {
        Vertex::clip(Vec4::new(x * w, y * w, z * w, w), varyings)
    }

    fn flat(x: f32, y: f32, z: f32) -> Vertex {
        ndc_vertex(x, y, z, 1.0, vec![])
    }

    fn solid(c: Color) -> impl FnMut(&[f32]) -> Option<Fragment> {
        move |_| Some(Fragment::from_color(c))
    }

    fn barycentric(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> [f32; 3] {
        let det = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
        let l2 = ((p.0 - a.0) * (c.1 - a.1) - (p.1 - a.1) * (c.0 - a.0)) / det;
        let l3 = ((b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)) / det;
        [1.0 - l2 - l3, l2, l3]
    }

    #[test]
    fn test_perspective_correct_matches_closed_form() {
        let ndc = [(-0.8, -0.8), (0.8, -0.6), (0.0, 0.8)];
        let ws = [1.0, 2.0, 4.0];
        let values = [1.0, 9.0, 3.0];
        let verts: Vec<Vertex> = (0..3)
            .map(|i| {
                let (x, y) = ndc[i];
                let w = ws[i];
                ndc_vertex(x, y, 0.5, w, vec![values[i], x * w, y * w, w])
            })
            .collect();
        let tri = Triangle::new(verts[0].clone(), verts[1].clone(), verts[2].clone());

        let mut fb = Framebuffer::new(32, 32);
        let mut samples: Vec<Vec<f32>> = Vec::new();
        let stats = draw_triangle(&mut fb, &tri, &RasterSettings::default(), |v| {
            samples.push(v.to_vec());
            Some(Fragment::from_color(Color::WHITE))
        });
        assert!(samples.len() > 50);
        assert_eq!(stats.pixels_written as usize, samples.len());

        let mut max_affine_gap: f32 = 0.0;
        for s in &samples {
            // clip x and w recovered perspective-correctly land exactly on the pixel
            let p = (s[1] / s[3], s[2] / s[3]);
            let px = (p.0 + 1.0) * 16.0;
            let py = (p.1 + 1.0) * 16.0;
            assert!((px - px.round()).abs() < 1e-3 && (py - py.round()).abs() < 1e-3);

            let l = barycentric(p, ndc[0], ndc[1], ndc[2]);
            let num: f32 = (0..3).map(|i| l[i] * values[i] / ws[i]).sum();
            let den: f32 = (0..3).map(|i| l[i] / ws[i]).sum();
            let expected = num / den;
            assert!((s[0] - expected).abs() < 1e-3, "{} vs {}", s[0], expected);

            let affine: f32 = (0..3).map(|i| l[i] * values[i]).sum();
            max_affine_gap = max_affine_gap.max((affine - expected).abs());
        }
        assert!(max_affine_gap > 0.5);
    }

    #[test]
    fn test_affine_mode_interpolates_screen_linearly() {
        let ndc = [(-0.8, -0.8), (0.8, -0.6), (0.0, 0.8)];
        let ws = [1.0, 2.0, 4.0];
        let values = [1.0, 9.0, 3.0];
        let v = |i: usize| ndc_vertex(ndc[i].0, ndc[i].1, 0.5, ws[i], vec![values[i], ndc[i].0, ndc[i].1]);
        let tri = Triangle::new(v(0), v(1), v(2));

        let settings = RasterSettings { perspective_correct: false, ..RasterSettings::default() };
        let mut fb = Framebuffer::new(32, 32);
        let mut checked = 0;
        draw_triangle(&mut fb, &tri, &settings, |s| {
            let l = barycentric((s[1], s[2]), ndc[0], ndc[1], ndc[2]);
            let affine: f32 = (0..3).map(|i| l[i] * values[i]).sum();
            assert!((s[0] - affine).abs() < 1e-3);
            checked += 1;
            None
        });
        assert!(checked > 50);
        assert_eq!(fb.coverage(), 0);
    }

    #[test]
    fn test_shared_diagonal_is_watertight() {
        let (lo, hi) = (-0.55, 0.45);
        let bl = flat(lo, lo, 0.0);
        let br = flat(hi, lo, 0.0);
        let tr = flat(hi, hi, 0.0);
        let tl = flat(lo, hi, 0.0);
        let settings = RasterSettings::default();
        let mut fb = Framebuffer::new(20, 20);
        let mut stats = draw_triangle(&mut fb, &Triangle::new(bl.clone(), br, tr.clone()), &settings, solid(Color::RED));
        stats.accumulate(&draw_triangle(&mut fb, &Triangle::new(bl, tr, tl), &settings, solid(Color::RED)));
        // columns and rows 5..15
        assert_eq!(stats.fragments_shaded, 100);
        assert_eq!(fb.coverage(), 100);
        assert_eq!(fb.get_pixel(5, 5), Some(Color::RED));
        assert_eq!(fb.get_pixel(14, 14), Some(Color::RED));
        assert_eq!(fb.get_pixel(15, 14), Some(Color::TRANSPARENT));
        assert_eq!(fb.get_pixel(4, 5), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_depth_order_independent() {
        let far = Triangle::new(flat(-0.9, -0.9, 0.2), flat(0.9, -0.9, 0.2), flat(0.0, 0.9, 0.2));
        let near = Triangle::new(flat(-0.5, -0.9, -0.3), flat(0.9, -0.2, -0.3), flat(-0.2, 0.9, -0.3));
        let settings = RasterSettings::default();

        let mut a = Framebuffer::new(24, 24);
        draw_triangle(&mut a, &far, &settings, solid(Color::RED));
        draw_triangle(&mut a, &near, &settings, solid(Color::GREEN));

        let mut b = Framebuffer::new(24, 24);
        draw_triangle(&mut b, &near, &settings, solid(Color::GREEN));
        draw_triangle(&mut b, &far, &settings, solid(Color::RED));

        assert_eq!(a, b);
        assert_eq!(a.get_pixel(12, 12), Some(Color::GREEN));
    }

    #[test]
    fn test_without_zbuffer_last_draw_wins() {
        let far = Triangle::new(flat(-0.9, -0.9, 0.2), flat(0.9, -0.9, 0.2), flat(0.0, 0.9, 0.2));
        let near = Triangle::new(flat(-0.9, -0.9, -0.3), flat(0.9, -0.9, -0.3), flat(0.0, 0.9, -0.3));
        let settings = RasterSettings { use_zbuffer: false, ..RasterSettings::default() };
        let mut fb = Framebuffer::new(16, 16);
        draw_triangle(&mut fb, &near, &settings, solid(Color::GREEN));
        draw_triangle(&mut fb, &far, &settings, solid(Color::RED));
        assert_eq!(fb.get_pixel(8, 8), Some(Color::RED));
    }

    #[test]
    fn test_backface_writes_nothing() {
        let front = Triangle::new(flat(-0.8, -0.8, 0.0), flat(0.8, -0.8, 0.0), flat(0.0, 0.8, 0.0));
        let mut fb = Framebuffer::new(16, 16);
        let stats = draw_triangle(&mut fb, &front.reversed(), &RasterSettings::default(), solid(Color::WHITE));
        assert_eq!(fb.coverage(), 0);
        assert_eq!(stats.triangles_culled, 1);
        assert_eq!(stats.fragments_shaded, 0);
    }

    #[test]
    fn test_cull_disabled_draws_both_windings_alike() {
        let front = Triangle::new(flat(-0.8, -0.7, 0.0), flat(0.6, -0.8, 0.0), flat(0.1, 0.8, 0.0));
        let settings = RasterSettings { backface_cull: false, ..RasterSettings::default() };
        let mut a = Framebuffer::new(16, 16);
        let mut b = Framebuffer::new(16, 16);
        draw_triangle(&mut a, &front, &settings, solid(Color::BLUE));
        let stats = draw_triangle(&mut b, &front.reversed(), &settings, solid(Color::BLUE));
        assert_eq!(stats.triangles_culled, 0);
        assert!(a.coverage() > 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_collinear_is_noop() {
        let tri = Triangle::new(flat(-0.5, -0.5, 0.0), flat(0.0, 0.0, 0.0), flat(0.5, 0.5, 0.0));
        let mut fb = Framebuffer::new(16, 16);
        let stats = draw_triangle(&mut fb, &tri, &RasterSettings::default(), solid(Color::WHITE));
        assert_eq!(fb.coverage(), 0);
        assert_eq!(stats.triangles_degenerate, 1);
    }

    #[test]
    fn test_oversized_triangle_covers_buffer_without_overrun() {
        let tri = Triangle::new(flat(-3.0, -3.0, 0.0), flat(3.0, -3.0, 0.0), flat(0.0, 3.0, 0.0));
        let mut fb = Framebuffer::new(13, 7);
        let stats = draw_triangle(&mut fb, &tri, &RasterSettings::default(), solid(Color::WHITE));
        assert_eq!(fb.coverage(), 13 * 7);
        assert_eq!(stats.pixels_written, 13 * 7);
    }

    #[test]
    fn test_zero_alpha_and_none_discard() {
        let tri = Triangle::new(flat(-0.8, -0.8, 0.0), flat(0.8, -0.8, 0.0), flat(0.0, 0.8, 0.0));
        let mut fb = Framebuffer::new(16, 16);
        let stats = draw_triangle(&mut fb, &tri, &RasterSettings::default(), |_| Some(Fragment::new(255.0, 0.0, 0.0, 0.0)));
        assert!(stats.fragments_shaded > 0);
        assert_eq!(stats.pixels_written, 0);
        draw_triangle(&mut fb, &tri, &RasterSettings::default(), |_| None);
        assert_eq!(fb.coverage(), 0);
        assert_eq!(fb.get_depth(8, 8), Some(crate::rasterizer::constants::DEPTH_FAR));
    }

    #[test]
    fn test_depth_out_of_range_is_skipped() {
        let tri = Triangle::new(flat(-0.8, -0.8, 1.5), flat(0.8, -0.8, 1.5), flat(0.0, 0.8, 1.5));
        let mut fb = Framebuffer::new(16, 16);
        let stats = draw_triangle(&mut fb, &tri, &RasterSettings::default(), solid(Color::WHITE));
        assert_eq!(fb.coverage(), 0);
        assert!(stats.depth_rejected > 0);
        assert_eq!(stats.depth_rejected, stats.fragments_shaded);
    }

    #[test]
    fn test_non_positive_w_is_dropped() {
        let tri = Triangle::new(flat(-0.8, -0.8, 0.0), ndc_vertex(0.8, -0.8, 0.0, -1.0, vec![]), flat(0.0, 0.8, 0.0));
        let mut fb = Framebuffer::new(16, 16);
        let stats = draw_triangle(&mut fb, &tri, &RasterSettings::default(), solid(Color::WHITE));
        assert_eq!(stats.triangles_clipped, 1);
        assert_eq!(fb.coverage(), 0);
    }

    #[test]
    fn test_varyings_reach_fragment() {
        let red = |x, y| ndc_vertex(x, y, 0.0, 1.0, vec![255.0, 0.0, 0.0, 255.0]);
        let tri = Triangle::new(red(-0.8, -0.8), red(0.8, -0.8), red(0.0, 0.8));
        let mut fb = Framebuffer::new(16, 16);
        draw_triangle(&mut fb, &tri, &RasterSettings::default(), |v| Some(Fragment::new(v[0], v[1], v[2], v[3])));
        assert_eq!(fb.get_pixel(8, 8), Some(Color::RED));
    }
}
