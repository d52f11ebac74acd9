//! Vector and matrix math for the pipeline
//!
//! `Vec3` is a model-space position, `Vec4` a homogeneous clip-space point.
//! Matrices are row-major `[[f32; 4]; 4]` and multiply column vectors, so
//! `mat4_mul(&a, &b)` applied to `p` transforms by `b` first, then `a`.

use std::ops::{Add, Mul, Sub};
use serde::{Deserialize, Serialize};

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if l == 0.0 {
            return Vec3::ZERO;
        }
        self.scale(1.0 / l)
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

/// Homogeneous point (clip space before the perspective divide)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn from_vec3(p: Vec3, w: f32) -> Self {
        Self { x: p.x, y: p.y, z: p.z, w }
    }

    pub fn dot(self, other: Vec4) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// 2D cross product of the xy components (twice the signed triangle area)
    pub fn cross2(self, other: Vec4) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec4 {
        let l = self.len();
        if l == 0.0 {
            return Vec4::ZERO;
        }
        self.scale(1.0 / l)
    }

    pub fn scale(self, s: f32) -> Vec4 {
        Vec4 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
            w: self.w * s,
        }
    }

    /// Divide x, y and z by w (clip space -> NDC). w is left untouched.
    pub fn perspective_divide(self) -> Vec4 {
        Vec4 {
            x: self.x / self.w,
            y: self.y / self.w,
            z: self.z / self.w,
            w: self.w,
        }
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    fn add(self, other: Vec4) -> Vec4 {
        Vec4::new(self.x + other.x, self.y + other.y, self.z + other.z, self.w + other.w)
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    fn sub(self, other: Vec4) -> Vec4 {
        Vec4::new(self.x - other.x, self.y - other.y, self.z - other.z, self.w - other.w)
    }
}

impl Mul<f32> for Vec4 {
    type Output = Vec4;
    fn mul(self, s: f32) -> Vec4 {
        self.scale(s)
    }
}

// =============================================================================
// 4x4 Matrix operations
// =============================================================================

/// 4x4 transformation matrix type (row-major)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub fn mat4_identity() -> Mat4 {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Create scale matrix
pub fn mat4_scale(s: Vec3) -> Mat4 {
    [
        [s.x, 0.0, 0.0, 0.0],
        [0.0, s.y, 0.0, 0.0],
        [0.0, 0.0, s.z, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Create translation matrix
pub fn mat4_translation(t: Vec3) -> Mat4 {
    [
        [1.0, 0.0, 0.0, t.x],
        [0.0, 1.0, 0.0, t.y],
        [0.0, 0.0, 1.0, t.z],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Rotation about the X axis (radians, right-handed)
pub fn mat4_rotation_x(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, c, -s, 0.0],
        [0.0, s, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Rotation about the Y axis (radians, right-handed)
pub fn mat4_rotation_y(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    [
        [c, 0.0, s, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [-s, 0.0, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Rotation about the Z axis (radians, right-handed)
pub fn mat4_rotation_z(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    [
        [c, -s, 0.0, 0.0],
        [s, c, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Rotation about an arbitrary axis (Rodrigues). A zero axis yields identity.
pub fn mat4_rotation_axis(axis: Vec3, angle: f32) -> Mat4 {
    let k = axis.normalize();
    if k == Vec3::ZERO {
        return mat4_identity();
    }
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    let (x, y, z) = (k.x, k.y, k.z);
    [
        [c + x * x * t, x * y * t - z * s, x * z * t + y * s, 0.0],
        [y * x * t + z * s, c + y * y * t, y * z * t - x * s, 0.0],
        [z * x * t - y * s, z * y * t + x * s, c + z * z * t, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Symmetric perspective projection.
///
/// `fov` is the full field of view in radians. The horizontal scale is
/// `1 / tan(fov / 2)` and the vertical scale is that times `width / height`.
/// Eye-space z = -near maps to NDC -1 and z = -far to NDC +1; clip w = -z.
pub fn mat4_perspective(width: f32, height: f32, near: f32, far: f32, fov: f32) -> Mat4 {
    let sx = 1.0 / (fov / 2.0).tan();
    let sy = sx * width / height;
    let zz = (far + near) / (near - far);
    let zw = 2.0 * far * near / (near - far);
    [
        [sx, 0.0, 0.0, 0.0],
        [0.0, sy, 0.0, 0.0],
        [0.0, 0.0, zz, zw],
        [0.0, 0.0, -1.0, 0.0],
    ]
}

/// Multiply two 4x4 matrices
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut result = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    result
}

/// Transform a homogeneous point by a 4x4 matrix
pub fn mat4_transform_vec4(m: &Mat4, v: Vec4) -> Vec4 {
    let row = |r: &[f32; 4]| r[0] * v.x + r[1] * v.y + r[2] * v.z + r[3] * v.w;
    Vec4::new(row(&m[0]), row(&m[1]), row(&m[2]), row(&m[3]))
}

/// Transform a point (w = 1) by a 4x4 matrix, keeping the resulting w
pub fn mat4_transform_point(m: &Mat4, p: Vec3) -> Vec4 {
    mat4_transform_vec4(m, Vec4::from_vec3(p, 1.0))
}
