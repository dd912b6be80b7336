//! Math type re-exports and scene-specific math types.
//!
//! Vectors and 4x4 matrices come from `glam`. The on-disk format stores
//! transforms as row-major 3x4 matrices, which get their own POD type here.

pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Axis-aligned bounding box as stored in bones and model headers.
#[derive(Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or the zero box when empty.
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        points.iter().fold(Self::new(*first, *first), |mut b, p| {
            b.min = b.min.min(*p);
            b.max = b.max.max(*p);
            b
        })
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl fmt::Debug for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aabb({:?} - {:?})", self.min, self.max)
    }
}

/// Row-major 3x4 affine matrix, the transform layout of the target runtime.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Mtx34 {
    pub rows: [[f32; 4]; 3],
}

impl Mtx34 {
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    /// Drop the projective row of a column-major `Mat4`.
    pub fn from_mat4(m: &Mat4) -> Self {
        let r = |i: usize| {
            let row = m.row(i);
            [row.x, row.y, row.z, row.w]
        };
        Self { rows: [r(0), r(1), r(2)] }
    }

    /// Extend to a `Mat4` with an identity bottom row.
    pub fn to_mat4(&self) -> Mat4 {
        let [a, b, c] = self.rows;
        Mat4::from_cols_array_2d(&[a, b, c, [0.0, 0.0, 0.0, 1.0]]).transpose()
    }

    /// Flat view in file order.
    #[inline]
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.rows)
    }
}

impl Default for Mtx34 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Debug for Mtx34 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows.iter()).finish()
    }
}
