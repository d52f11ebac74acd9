//! Demo scenes
//!
//! Five small scenes that exercise the pipeline: flat gradients, a procedural
//! grid, a vertex-stage animation, near-plane clipping and texture filtering.
//! A scene is just a kind and a clock; the frame loop owns the buffer, the
//! renderer and the running flag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rasterizer::{
    mat4_identity, mat4_mul, mat4_rotation_x, mat4_rotation_z, mat4_scale, mat4_transform_vec4,
    mat4_translation, DrawStats, FilterMode, Fragment, Framebuffer, Mat4, Renderer, Shader,
    Texture, Triangle, Vec3, Vertex,
};

/// Clock advance per rendered frame
pub const TICK: f32 = 0.01;

// Varying layout shared by every demo: r, g, b, a, u, v
const U: usize = 4;
const V: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemoKind {
    Gradient,
    Grid,
    VertexShader,
    #[default]
    Clipping,
    Textured,
}

impl DemoKind {
    pub const ALL: [DemoKind; 5] = [
        DemoKind::Gradient,
        DemoKind::Grid,
        DemoKind::VertexShader,
        DemoKind::Clipping,
        DemoKind::Textured,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DemoKind::Gradient => "gradient",
            DemoKind::Grid => "grid",
            DemoKind::VertexShader => "vertex-shader",
            DemoKind::Clipping => "clipping",
            DemoKind::Textured => "textured",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|&k| k == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DemoKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match name.as_str() {
            "gradient" => Ok(DemoKind::Gradient),
            "grid" => Ok(DemoKind::Grid),
            "vertexshader" | "vertex" => Ok(DemoKind::VertexShader),
            "clipping" | "clip" => Ok(DemoKind::Clipping),
            "textured" | "texture" => Ok(DemoKind::Textured),
            _ => Err(format!(
                "unknown demo '{}' (expected one of: {})",
                s,
                Self::ALL.map(|k| k.label()).join(", ")
            )),
        }
    }
}

// =============================================================================
// Shaders
// =============================================================================

/// Per-draw values visible to every demo shader
pub struct DemoUniforms<'a> {
    pub model: Mat4,
    pub projection: Mat4,
    pub texture: Option<&'a dyn Texture>,
    pub filter: FilterMode,
}

/// projection * model * position; attributes pass through as varyings
fn transform(input: &Vertex, u: &DemoUniforms<'_>) -> Vertex {
    let world = mat4_transform_vec4(&u.model, input.position);
    Vertex::clip(mat4_transform_vec4(&u.projection, world), input.attributes.clone())
}

fn color_of(varyings: &[f32]) -> Option<Fragment> {
    match varyings {
        [r, g, b, a, ..] => Some(Fragment::new(*r, *g, *b, *a)),
        _ => None,
    }
}

/// Interpolated vertex color
pub struct VertexColorShader;

impl Shader<DemoUniforms<'_>> for VertexColorShader {
    fn vertex(&self, input: &Vertex, u: &DemoUniforms<'_>) -> Vertex {
        transform(input, u)
    }

    fn fragment(&self, varyings: &[f32], _: &DemoUniforms<'_>) -> Option<Fragment> {
        color_of(varyings)
    }
}

/// What the even checker cells show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckerFill {
    /// Opaque black
    Black,
    /// The vertex color with (r, g, b) rotated to (g, b, r)
    Swizzle,
}

/// Checker over the (u, v) varyings; odd cells keep the vertex color
pub struct CheckerShader {
    /// Cells per unit of u and v
    pub cells: f32,
    pub fill: CheckerFill,
}

impl Shader<DemoUniforms<'_>> for CheckerShader {
    fn vertex(&self, input: &Vertex, u: &DemoUniforms<'_>) -> Vertex {
        transform(input, u)
    }

    fn fragment(&self, varyings: &[f32], _: &DemoUniforms<'_>) -> Option<Fragment> {
        let color = color_of(varyings)?;
        let (u, v) = (*varyings.get(U)?, *varyings.get(V)?);
        let cell = (u * self.cells).floor() as i64 + (v * self.cells).floor() as i64;
        if cell.rem_euclid(2) != 0 {
            return Some(color);
        }
        Some(match self.fill {
            CheckerFill::Black => Fragment::new(0.0, 0.0, 0.0, 255.0),
            CheckerFill::Swizzle => Fragment::new(color.g, color.b, color.r, color.a),
        })
    }
}

/// Texture lookup at (u, v). Discards everything when no texture is bound.
pub struct TextureShader;

impl Shader<DemoUniforms<'_>> for TextureShader {
    fn vertex(&self, input: &Vertex, u: &DemoUniforms<'_>) -> Vertex {
        transform(input, u)
    }

    fn fragment(&self, varyings: &[f32], uniforms: &DemoUniforms<'_>) -> Option<Fragment> {
        let texture = uniforms.texture?;
        let (u, v) = (*varyings.get(U)?, *varyings.get(V)?);
        Some(Fragment::from_vec4(texture.sample(u, v, uniforms.filter)))
    }
}

// =============================================================================
// Geometry
// =============================================================================

fn vertex(x: f32, y: f32, attributes: [f32; 6]) -> Vertex {
    Vertex::new(Vec3::new(x, y, 0.0), attributes.to_vec())
}

/// The (-1, -1)..(1, 1) square in the z = 0 plane, front faces only
pub fn square() -> Vec<Triangle> {
    let [v1, v2, v3, v4] = square_corners();
    vec![
        Triangle::new(v1.clone(), v2, v3.clone()),
        Triangle::new(v1, v3, v4),
    ]
}

/// The square with a back face for each triangle
pub fn double_sided_square() -> Vec<Triangle> {
    let front = square();
    let back: Vec<Triangle> = front.iter().map(Triangle::reversed).collect();
    front.into_iter().chain(back).collect()
}

fn square_corners() -> [Vertex; 4] {
    [
        vertex(-1.0, -1.0, [255.0, 0.0, 0.0, 255.0, 0.0, 0.0]),
        vertex(1.0, -1.0, [0.0, 255.0, 0.0, 255.0, 1.0, 0.0]),
        vertex(1.0, 1.0, [0.0, 0.0, 255.0, 255.0, 1.0, 1.0]),
        vertex(-1.0, 1.0, [0.0, 0.0, 0.0, 255.0, 0.0, 1.0]),
    ]
}

/// Screen-space triangle whose corners orbit the centre at different rates
pub fn orbiting_triangle(time: f32) -> Triangle {
    let corner = |phase: f32, attributes| vertex(phase.sin() * 0.3125, phase.cos() * 0.4167, attributes);
    Triangle::new(
        corner(time - 1.5 - (time / 1.3538).sin(), [255.0, 0.0, 0.0, 255.0, 0.0, 0.0]),
        corner(time + 2.0, [0.0, 255.0, 0.0, 255.0, 10.0, 0.0]),
        corner(time + 1.0, [0.0, 0.0, 255.0, 255.0, 10.0, 10.0]),
    )
}

// =============================================================================
// Scenes
// =============================================================================

/// A demo and its clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoScene {
    pub kind: DemoKind,
    pub time: f32,
}

impl DemoScene {
    pub fn new(kind: DemoKind) -> Self {
        Self { kind, time: 0.0 }
    }

    pub fn tick(&mut self) {
        self.time += TICK;
    }

    /// Draw the current frame into `fb`. The caller clears the buffer first.
    pub fn render(
        &self,
        renderer: &mut Renderer,
        fb: &mut Framebuffer,
        projection: &Mat4,
        texture: Option<&dyn Texture>,
        filter: FilterMode,
    ) -> DrawStats {
        let t = self.time;
        let mut uniforms = DemoUniforms {
            model: mat4_identity(),
            projection: mat4_identity(),
            texture,
            filter,
        };

        match self.kind {
            DemoKind::Gradient => {
                renderer.draw(fb, &[orbiting_triangle(t)], &VertexColorShader, &uniforms)
            }
            DemoKind::Grid => {
                let shader = CheckerShader { cells: 1.0, fill: CheckerFill::Black };
                renderer.draw(fb, &[orbiting_triangle(t)], &shader, &uniforms)
            }
            DemoKind::VertexShader => {
                let aspect = fb.width as f32 / fb.height.max(1) as f32;
                let size = ((t * 2.4).sin() + 3.0) * 0.1;
                uniforms.model = chain(&[
                    mat4_scale(Vec3::new(1.0, aspect, 1.0)),
                    mat4_translation(Vec3::new((t * 0.5).sin(), 0.3 * (t * 2.0).sin(), 0.0)),
                    mat4_scale(Vec3::new(size, size, size)),
                    mat4_rotation_z(t),
                ]);
                renderer.draw(fb, &square(), &VertexColorShader, &uniforms)
            }
            DemoKind::Clipping => {
                let shader = CheckerShader { cells: 10.0, fill: CheckerFill::Swizzle };
                let quad = double_sided_square();
                uniforms.projection = *projection;

                uniforms.model = chain(&[
                    mat4_translation(Vec3::new(0.0, 0.0, (t * 2.5).sin() - 1.0)),
                    mat4_scale(Vec3::new(0.3, 0.3, 0.3)),
                    mat4_rotation_x(t),
                ]);
                let mut stats = renderer.draw(fb, &quad, &shader, &uniforms);

                uniforms.model = chain(&[
                    mat4_translation(Vec3::new(0.0, 0.0, -1.0)),
                    mat4_scale(Vec3::new(0.3, 0.3, 0.3)),
                    mat4_rotation_x(t * 1.532),
                ]);
                stats.accumulate(&renderer.draw(fb, &quad, &shader, &uniforms));
                stats
            }
            DemoKind::Textured => {
                uniforms.projection = *projection;
                uniforms.model = chain(&[
                    mat4_translation(Vec3::new(0.0, 0.0, -0.3 + (t * 5.0).sin() * 0.2)),
                    mat4_scale(Vec3::new(0.3, 0.3, 0.3)),
                ]);
                renderer.draw(fb, &double_sided_square(), &TextureShader, &uniforms)
            }
        }
    }
}

/// Product of matrices, leftmost applied last
fn chain(matrices: &[Mat4]) -> Mat4 {
    matrices.iter().fold(mat4_identity(), |acc, m| mat4_mul(&acc, m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::image_io::default_texture;
    use crate::rasterizer::Color;
    use std::f32::consts::PI;

    // the first clipping square is centred on the eye plane here
    const CLIP_CROSSING_TIME: f32 = PI / 5.0;

    fn render(kind: DemoKind, time: f32, texture: Option<&dyn Texture>, filter: FilterMode) -> (Framebuffer, DrawStats) {
        let config = RenderConfig::default();
        let mut fb = Framebuffer::new(config.width, config.height);
        let mut renderer = Renderer::new(config.raster.clone());
        let scene = DemoScene { kind, time };
        let stats = scene.render(&mut renderer, &mut fb, &config.projection(), texture, filter);
        (fb, stats)
    }

    #[test]
    fn test_demo_names_parse() {
        assert_eq!("Vertex-Shader".parse::<DemoKind>(), Ok(DemoKind::VertexShader));
        assert_eq!("vertex_shader".parse::<DemoKind>(), Ok(DemoKind::VertexShader));
        assert_eq!("GRID".parse::<DemoKind>(), Ok(DemoKind::Grid));
        assert!("spinning-cube".parse::<DemoKind>().is_err());
        for kind in DemoKind::ALL {
            assert_eq!(kind.label().parse::<DemoKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_demo_cycle_wraps() {
        assert_eq!(DemoKind::Textured.next(), DemoKind::Gradient);
        assert_eq!(DemoKind::Gradient.prev(), DemoKind::Textured);
        assert_eq!(DemoKind::Grid.next().prev(), DemoKind::Grid);
    }

    #[test]
    fn test_tick_advances_clock() {
        let mut scene = DemoScene::new(DemoKind::Gradient);
        for _ in 0..100 {
            scene.tick();
        }
        assert!((scene.time - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_double_sided_square_has_one_back_face_per_front() {
        let (fb, stats) = render(DemoKind::Clipping, 0.0, None, FilterMode::Bilinear);
        assert_eq!(stats.triangles_submitted, 8);
        assert_eq!(stats.triangles_culled, 4);
        assert_eq!(stats.depth_rejected, 0);
        assert!(stats.pixels_written > 0);
        assert!(fb.coverage() > 0);
    }

    #[test]
    fn test_clipping_demo_draws_while_crossing_eye_plane() {
        let (fb, stats) = render(DemoKind::Clipping, CLIP_CROSSING_TIME, None, FilterMode::Bilinear);
        assert_eq!(stats.triangles_submitted, 8);
        assert!(stats.triangles_rasterized > 0);
        assert!(fb.coverage() > 0);
    }

    #[test]
    fn test_clipping_demo_swizzles_alternate_cells() {
        let (fb, _) = render(DemoKind::Clipping, 0.0, None, FilterMode::Bilinear);
        let colors: std::collections::HashSet<[u8; 4]> = fb
            .pixels
            .chunks_exact(4)
            .filter(|px| px[3] > 0)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect();
        assert!(colors.len() > 10);
    }

    #[test]
    fn test_grid_demo_has_black_and_colored_cells() {
        let (fb, stats) = render(DemoKind::Grid, 0.0, None, FilterMode::Bilinear);
        assert_eq!(stats.triangles_culled, 0);
        let black = fb.pixels.chunks_exact(4).filter(|px| px == &Color::BLACK.to_bytes()).count();
        assert!(black > 0);
        assert!(fb.coverage() > black);
    }

    #[test]
    fn test_gradient_demo_stays_in_frame() {
        let (fb, stats) = render(DemoKind::Gradient, 3.7, None, FilterMode::Bilinear);
        assert_eq!(stats.triangles_clipped, 0);
        assert_eq!(stats.pixels_written, fb.coverage());
    }

    #[test]
    fn test_vertex_shader_demo_ignores_projection() {
        let (fb, stats) = render(DemoKind::VertexShader, 1.0, None, FilterMode::Bilinear);
        assert_eq!(stats.triangles_submitted, 2);
        assert_eq!(stats.triangles_culled, 0);
        assert!(fb.coverage() > 0);
    }

    #[test]
    fn test_textured_demo_filter_changes_output() {
        let tex = default_texture();
        let time = 0.942; // square at its closest, magnified about 3x
        let (nearest, _) = render(DemoKind::Textured, time, Some(&tex), FilterMode::Nearest);
        let (bilinear, stats) = render(DemoKind::Textured, time, Some(&tex), FilterMode::Bilinear);
        assert_eq!(stats.depth_rejected, 0);
        assert_eq!(nearest.coverage(), bilinear.coverage());
        assert_ne!(nearest.pixels, bilinear.pixels);
    }

    #[test]
    fn test_textured_demo_without_texture_draws_nothing() {
        let (fb, stats) = render(DemoKind::Textured, 0.5, None, FilterMode::Nearest);
        assert_eq!(fb.coverage(), 0);
        assert!(stats.fragments_shaded > 0);
        assert_eq!(stats.pixels_written, 0);
    }
}
