//! Homogeneous frustum clipping
//!
//! Triangles are clipped in clip space, before the perspective divide, one
//! plane at a time. Each plane is a signed distance that is >= 0 inside:
//!
//! | plane  | distance |
//! |--------|----------|
//! | near   | z + w    |
//! | far    | w - z    |
//! | left   | x + w    |
//! | right  | w - x    |
//! | bottom | y + w    |
//! | top    | w - y    |
//!
//! A vertex is behind a plane when its distance is negative; a vertex exactly
//! on a plane is kept. The near test also puts every vertex with
//! `w < W_EPSILON` behind, which is slightly stricter than `w <= 0` and keeps
//! tiny positive w away from the divide. Near is still a single pass: an edge
//! leaving a behind vertex is cut where it has crossed both the `z + w` and
//! the `w - W_EPSILON` boundary, so one triangle yields at most two.
//!
//! Vertices created by a split live in the clipper's arena for the duration
//! of one draw call.

use super::constants::W_EPSILON;
use super::math::Vec4;
use super::types::{Triangle, Vertex};

/// One of the six canonical frustum planes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipPlane {
    Near,
    Far,
    Left,
    Right,
    Bottom,
    Top,
}

impl ClipPlane {
    /// Clipping order used by `clip_to_frustum`
    pub const ALL: [ClipPlane; 6] = [
        ClipPlane::Near,
        ClipPlane::Far,
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
    ];

    /// Signed distance of a clip-space point; negative is outside
    #[inline]
    pub fn distance(self, p: Vec4) -> f32 {
        match self {
            ClipPlane::Near => p.z + p.w,
            ClipPlane::Far => p.w - p.z,
            ClipPlane::Left => p.x + p.w,
            ClipPlane::Right => p.w - p.x,
            ClipPlane::Bottom => p.y + p.w,
            ClipPlane::Top => p.w - p.y,
        }
    }

    /// Whether a point survives this plane. The near plane also requires w >= W_EPSILON.
    pub fn contains(self, p: Vec4) -> bool {
        match self {
            ClipPlane::Near => p.w >= W_EPSILON && self.distance(p) >= 0.0,
            _ => self.distance(p) >= 0.0,
        }
    }

    #[inline]
    fn is_behind(self, p: Vec4) -> bool {
        match self {
            ClipPlane::Near => p.w < W_EPSILON || self.distance(p) < 0.0,
            _ => self.distance(p) < 0.0,
        }
    }

    /// Edge parameter, measured from `behind`, where the edge enters the
    /// inside half-space. `inside` must not be behind.
    fn crossing(self, behind: Vec4, inside: Vec4) -> f32 {
        let cut = |db: f32, di: f32| if db < 0.0 { db / (db - di) } else { 0.0 };
        let t = cut(self.distance(behind), self.distance(inside));
        match self {
            ClipPlane::Near => t.max(cut(behind.w - W_EPSILON, inside.w - W_EPSILON)),
            _ => t,
        }
    }
}

/// Pooled clip stage.
///
/// Vertices are stored struct-of-arrays: one position and `stride` varyings
/// per vertex. Triangles are index triples into that pool, so a vertex
/// shared by several triangles is never mutated in place. Call `reset` at
/// the start of each draw call; the allocations are kept.
#[derive(Debug, Default)]
pub struct Clipper {
    stride: usize,
    positions: Vec<Vec4>,
    varyings: Vec<f32>,
    sources: Vec<Option<usize>>,
    inputs: usize,
    triangles: Vec<[usize; 3]>,
    spare: Vec<[usize; 3]>,
}

impl Clipper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the pool and set the number of varyings per vertex
    pub fn reset(&mut self, stride: usize) {
        self.stride = stride;
        self.positions.clear();
        self.varyings.clear();
        self.sources.clear();
        self.inputs = 0;
        self.triangles.clear();
        self.spare.clear();
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Add an input vertex and return its index. Varyings are padded with
    /// zeros or truncated to the stride.
    pub fn push_vertex(&mut self, position: Vec4, varyings: &[f32]) -> usize {
        let index = self.positions.len();
        self.positions.push(position);
        let n = varyings.len().min(self.stride);
        self.varyings.extend_from_slice(&varyings[..n]);
        self.varyings.extend(std::iter::repeat(0.0).take(self.stride - n));
        self.sources.push(Some(self.inputs));
        self.inputs += 1;
        index
    }

    pub fn push_triangle(&mut self, indices: [usize; 3]) {
        self.triangles.push(indices);
    }

    /// Clip every pending triangle against one plane
    pub fn clip_against(&mut self, plane: ClipPlane) {
        let input = std::mem::take(&mut self.triangles);
        let mut output = std::mem::take(&mut self.spare);
        output.clear();

        for &tri in &input {
            let behind = tri.map(|i| plane.is_behind(self.positions[i]));
            match behind.iter().filter(|&&b| b).count() {
                0 => output.push(tri),
                3 => {}
                _ => {
                    // Rotate so `a` is the first behind vertex in winding order.
                    // With one vertex behind, b and c are inside; with two, b is
                    // behind too and c is the survivor.
                    let Some(s) = (0..3).find(|&i| behind[i] && !behind[(i + 2) % 3]) else {
                        continue;
                    };
                    let (a, b, c) = (tri[s], tri[(s + 1) % 3], tri[(s + 2) % 3]);
                    if behind[(s + 1) % 3] {
                        let bc = self.intersect(plane, b, c);
                        let ac = self.intersect(plane, a, c);
                        output.push([ac, bc, c]);
                    } else {
                        let ab = self.intersect(plane, a, b);
                        let ac = self.intersect(plane, a, c);
                        output.push([ab, b, c]);
                        output.push([ab, c, ac]);
                    }
                }
            }
        }

        self.triangles = output;
        self.spare = input;
    }

    /// Clip every pending triangle against all six planes
    pub fn clip_to_frustum(&mut self) {
        for plane in ClipPlane::ALL {
            if self.triangles.is_empty() {
                break;
            }
            self.clip_against(plane);
        }
    }

    /// Surviving triangles as index triples
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn position(&self, index: usize) -> Vec4 {
        self.positions[index]
    }

    pub fn varyings(&self, index: usize) -> &[f32] {
        &self.varyings[index * self.stride..(index + 1) * self.stride]
    }

    /// Push order of an input vertex, or None for a vertex created by a split
    pub fn source(&self, index: usize) -> Option<usize> {
        self.sources[index]
    }

    /// New vertex on the edge from `behind` to `inside`. Always measured from
    /// the behind end so a shared edge yields the same point.
    fn intersect(&mut self, plane: ClipPlane, behind: usize, inside: usize) -> usize {
        let t = plane.crossing(self.positions[behind], self.positions[inside]);
        let pb = self.positions[behind];
        let pi = self.positions[inside];
        let index = self.positions.len();
        self.positions.push(pb + (pi - pb) * t);
        for k in 0..self.stride {
            let vb = self.varyings[behind * self.stride + k];
            let vi = self.varyings[inside * self.stride + k];
            self.varyings.push(vb + (vi - vb) * t);
        }
        self.sources.push(None);
        index
    }
}

fn run_clipper(triangles: &[Triangle], clip: impl Fn(&mut Clipper)) -> Vec<Triangle> {
    let mut clipper = Clipper::new();
    let mut out = Vec::with_capacity(triangles.len());
    for tri in triangles {
        // each triangle keeps its own varying count
        let stride = tri.vertices.iter().map(|v| v.varyings.len()).min().unwrap_or(0);
        clipper.reset(stride);
        let indices = tri.vertices.each_ref().map(|v| clipper.push_vertex(v.position, &v.varyings));
        clipper.push_triangle(indices);
        clip(&mut clipper);

        let vertex = |i: usize| match clipper.source(i) {
            Some(k) => tri.vertices[k].clone(),
            None => Vertex::clip(clipper.position(i), clipper.varyings(i).to_vec()),
        };
        out.extend(
            clipper
                .triangles()
                .iter()
                .map(|&[a, b, c]| Triangle::new(vertex(a), vertex(b), vertex(c))),
        );
    }
    out
}

/// Clip a list of clip-space triangles against one plane.
/// Inputs entirely inside come back unchanged; split vertices carry no attributes.
pub fn clip_triangles(triangles: &[Triangle], plane: ClipPlane) -> Vec<Triangle> {
    run_clipper(triangles, |c| c.clip_against(plane))
}

/// Clip a list of clip-space triangles against all six planes, in `ClipPlane::ALL` order
pub fn clip_to_frustum(triangles: &[Triangle]) -> Vec<Triangle> {
    run_clipper(triangles, |c| c.clip_to_frustum())
}
