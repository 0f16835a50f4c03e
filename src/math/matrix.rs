use std::ops::Mul;

use serde::{Deserialize, Serialize};

use super::Vector3;
use crate::error::{RenderError, Result};

/// 4×4 transform stored as 16 cells in row-major order.
///
/// Transforms act on column vectors: `a * b` applies `b` first, then `a`.
/// Translation lives in cells 3, 7 and 11. Angles passed to the rotation and
/// projection constructors are in degrees.
///
/// Constructors come in two flavours: a value form returning a fresh matrix,
/// and an `_into` form writing into a caller-owned scratch matrix so a render
/// loop can reuse one allocation per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix4 {
    m: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

impl Matrix4 {
    pub const IDENTITY: Self = Self { m: IDENTITY };

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Builds a matrix from 16 row-major values.
    pub const fn from_rows(m: [f32; 16]) -> Self {
        Self { m }
    }

    pub fn from_column_major(cols: [f32; 16]) -> Self {
        Self::from_rows(cols).transpose()
    }

    /// Row-major cells.
    pub fn as_array(&self) -> &[f32; 16] {
        &self.m
    }

    /// Cells in the column-major order graphics APIs expect for uploads.
    pub fn to_column_major(&self) -> [f32; 16] {
        self.transpose().m
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.m[row * 4 + col]
    }

    pub fn identity_into(out: &mut Self) -> &mut Self {
        out.m = IDENTITY;
        out
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut out = Self::identity();
        Self::translation_into(x, y, z, &mut out);
        out
    }

    pub fn translation_into(x: f32, y: f32, z: f32, out: &mut Self) -> &mut Self {
        Self::identity_into(out);
        out.m[3] = x;
        out.m[7] = y;
        out.m[11] = z;
        out
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut out = Self::identity();
        Self::scale_into(x, y, z, &mut out);
        out
    }

    pub fn scale_into(x: f32, y: f32, z: f32, out: &mut Self) -> &mut Self {
        Self::identity_into(out);
        out.m[0] = x;
        out.m[5] = y;
        out.m[10] = z;
        out
    }

    /// Rotation of `degrees` around `axis` (Rodrigues form).
    ///
    /// A zero angle or a zero axis yields identity.
    pub fn rotation(axis: Vector3, degrees: f32) -> Self {
        let mut out = Self::identity();
        Self::rotation_into(axis, degrees, &mut out);
        out
    }

    pub fn rotation_into(axis: Vector3, degrees: f32, out: &mut Self) -> &mut Self {
        Self::identity_into(out);
        let length = axis.length();
        if degrees == 0.0 || length == 0.0 {
            return out;
        }
        let n = axis / length;
        let (x, y, z) = (n.x(), n.y(), n.z());
        let radians = degrees.to_radians();
        let (s, c) = radians.sin_cos();
        let t = 1.0 - c;

        let m = &mut out.m;
        m[0] = x * x * t + c;
        m[1] = x * y * t - z * s;
        m[2] = x * z * t + y * s;

        m[4] = y * x * t + z * s;
        m[5] = y * y * t + c;
        m[6] = y * z * t - x * s;

        m[8] = z * x * t - y * s;
        m[9] = z * y * t + x * s;
        m[10] = z * z * t + c;
        out
    }

    pub fn rotation_x(degrees: f32) -> Self {
        Self::rotation(Vector3::X, degrees)
    }

    pub fn rotation_y(degrees: f32) -> Self {
        Self::rotation(Vector3::Y, degrees)
    }

    pub fn rotation_z(degrees: f32) -> Self {
        Self::rotation(Vector3::Z, degrees)
    }

    /// Symmetric perspective frustum; `fov` is the vertical field of view in
    /// degrees.
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut out = Self::identity();
        Self::perspective_into(fov, aspect, near, far, &mut out);
        out
    }

    pub fn perspective_into(fov: f32, aspect: f32, near: f32, far: f32, out: &mut Self) -> &mut Self {
        let y = (fov.to_radians() * 0.5).tan() * near;
        let x = y * aspect;
        Self::frustum_into(-x, x, -y, y, near, far, out)
    }

    /// OpenGL-style perspective frustum. Opposing bounds must differ.
    pub fn frustum(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Self {
        let mut out = Self::identity();
        Self::frustum_into(l, r, b, t, n, f, &mut out);
        out
    }

    pub fn frustum_into(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32, out: &mut Self) -> &mut Self {
        out.m = [
            2.0 * n / (r - l),
            0.0,
            (r + l) / (r - l),
            0.0,
            0.0,
            2.0 * n / (t - b),
            (t + b) / (t - b),
            0.0,
            0.0,
            0.0,
            -(f + n) / (f - n),
            -2.0 * f * n / (f - n),
            0.0,
            0.0,
            -1.0,
            0.0,
        ];
        out
    }

    /// OpenGL-style orthographic projection. Opposing bounds must differ.
    pub fn ortho(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Self {
        let mut out = Self::identity();
        Self::ortho_into(l, r, b, t, n, f, &mut out);
        out
    }

    pub fn ortho_into(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32, out: &mut Self) -> &mut Self {
        out.m = [
            2.0 / (r - l),
            0.0,
            0.0,
            -(r + l) / (r - l),
            0.0,
            2.0 / (t - b),
            0.0,
            -(t + b) / (t - b),
            0.0,
            0.0,
            -2.0 / (f - n),
            -(f + n) / (f - n),
            0.0,
            0.0,
            0.0,
            1.0,
        ];
        out
    }

    /// Right-handed view matrix looking from `eye` towards `center`.
    pub fn look_at(eye: Vector3, center: Vector3, up: Vector3) -> Self {
        let mut out = Self::identity();
        Self::look_at_into(eye, center, up, &mut out);
        out
    }

    pub fn look_at_into(eye: Vector3, center: Vector3, up: Vector3, out: &mut Self) -> &mut Self {
        let forward = (eye - center).unit();
        let side = up.cross(forward).unit();
        let true_up = forward.cross(side).unit();

        out.m = [
            side.x(),
            side.y(),
            side.z(),
            -side.dot(eye),
            true_up.x(),
            true_up.y(),
            true_up.z(),
            -true_up.dot(eye),
            forward.x(),
            forward.y(),
            forward.z(),
            -forward.dot(eye),
            0.0,
            0.0,
            0.0,
            1.0,
        ];
        out
    }

    /// Row-by-column product `a · b`.
    pub fn multiply(a: &Self, b: &Self) -> Self {
        let mut out = Self::identity();
        Self::multiply_into(a, b, &mut out);
        out
    }

    pub fn multiply_into<'a>(a: &Self, b: &Self, out: &'a mut Self) -> &'a mut Self {
        for row in 0..4 {
            for col in 0..4 {
                out.m[row * 4 + col] = (0..4).map(|i| a.m[row * 4 + i] * b.m[i * 4 + col]).sum();
            }
        }
        out
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::identity();
        self.transpose_into(&mut out);
        out
    }

    pub fn transpose_into<'a>(&self, out: &'a mut Self) -> &'a mut Self {
        for row in 0..4 {
            for col in 0..4 {
                out.m[col * 4 + row] = self.m[row * 4 + col];
            }
        }
        out
    }

    /// Inverse via the full cofactor expansion.
    ///
    /// Fails with [`RenderError::NotInvertible`] only when the determinant is
    /// exactly zero; near-singular input produces very large cells instead.
    pub fn inverse(&self) -> Result<Self> {
        let mut out = Self::identity();
        self.inverse_into(&mut out)?;
        Ok(out)
    }

    /// Writes the inverse into `out`. On failure `out` is left untouched.
    pub fn inverse_into<'a>(&self, out: &'a mut Self) -> Result<&'a mut Self> {
        let m = &self.m;
        let mut r = [0.0f32; 16];

        r[0] = m[5] * m[10] * m[15] - m[5] * m[14] * m[11] - m[6] * m[9] * m[15]
            + m[6] * m[13] * m[11]
            + m[7] * m[9] * m[14]
            - m[7] * m[13] * m[10];
        r[1] = -m[1] * m[10] * m[15] + m[1] * m[14] * m[11] + m[2] * m[9] * m[15]
            - m[2] * m[13] * m[11]
            - m[3] * m[9] * m[14]
            + m[3] * m[13] * m[10];
        r[2] = m[1] * m[6] * m[15] - m[1] * m[14] * m[7] - m[2] * m[5] * m[15]
            + m[2] * m[13] * m[7]
            + m[3] * m[5] * m[14]
            - m[3] * m[13] * m[6];
        r[3] = -m[1] * m[6] * m[11] + m[1] * m[10] * m[7] + m[2] * m[5] * m[11]
            - m[2] * m[9] * m[7]
            - m[3] * m[5] * m[10]
            + m[3] * m[9] * m[6];

        r[4] = -m[4] * m[10] * m[15] + m[4] * m[14] * m[11] + m[6] * m[8] * m[15]
            - m[6] * m[12] * m[11]
            - m[7] * m[8] * m[14]
            + m[7] * m[12] * m[10];
        r[5] = m[0] * m[10] * m[15] - m[0] * m[14] * m[11] - m[2] * m[8] * m[15]
            + m[2] * m[12] * m[11]
            + m[3] * m[8] * m[14]
            - m[3] * m[12] * m[10];
        r[6] = -m[0] * m[6] * m[15] + m[0] * m[14] * m[7] + m[2] * m[4] * m[15]
            - m[2] * m[12] * m[7]
            - m[3] * m[4] * m[14]
            + m[3] * m[12] * m[6];
        r[7] = m[0] * m[6] * m[11] - m[0] * m[10] * m[7] - m[2] * m[4] * m[11]
            + m[2] * m[8] * m[7]
            + m[3] * m[4] * m[10]
            - m[3] * m[8] * m[6];

        r[8] = m[4] * m[9] * m[15] - m[4] * m[13] * m[11] - m[5] * m[8] * m[15]
            + m[5] * m[12] * m[11]
            + m[7] * m[8] * m[13]
            - m[7] * m[12] * m[9];
        r[9] = -m[0] * m[9] * m[15] + m[0] * m[13] * m[11] + m[1] * m[8] * m[15]
            - m[1] * m[12] * m[11]
            - m[3] * m[8] * m[13]
            + m[3] * m[12] * m[9];
        r[10] = m[0] * m[5] * m[15] - m[0] * m[13] * m[7] - m[1] * m[4] * m[15]
            + m[1] * m[12] * m[7]
            + m[3] * m[4] * m[13]
            - m[3] * m[12] * m[5];
        r[11] = -m[0] * m[5] * m[11] + m[0] * m[9] * m[7] + m[1] * m[4] * m[11]
            - m[1] * m[8] * m[7]
            - m[3] * m[4] * m[9]
            + m[3] * m[8] * m[5];

        r[12] = -m[4] * m[9] * m[14] + m[4] * m[13] * m[10] + m[5] * m[8] * m[14]
            - m[5] * m[12] * m[10]
            - m[6] * m[8] * m[13]
            + m[6] * m[12] * m[9];
        r[13] = m[0] * m[9] * m[14] - m[0] * m[13] * m[10] - m[1] * m[8] * m[14]
            + m[1] * m[12] * m[10]
            + m[2] * m[8] * m[13]
            - m[2] * m[12] * m[9];
        r[14] = -m[0] * m[5] * m[14] + m[0] * m[13] * m[6] + m[1] * m[4] * m[14]
            - m[1] * m[12] * m[6]
            - m[2] * m[4] * m[13]
            + m[2] * m[12] * m[5];
        r[15] = m[0] * m[5] * m[10] - m[0] * m[9] * m[6] - m[1] * m[4] * m[10]
            + m[1] * m[8] * m[6]
            + m[2] * m[4] * m[9]
            - m[2] * m[8] * m[5];

        let det = m[0] * r[0] + m[1] * r[4] + m[2] * r[8] + m[3] * r[12];
        if det == 0.0 {
            return Err(RenderError::NotInvertible);
        }
        for cell in &mut r {
            *cell /= det;
        }
        out.m = r;
        Ok(out)
    }

    /// Full 4×4 transform followed by the homogeneous divide.
    pub fn transform_point(&self, v: Vector3) -> Vector3 {
        let m = &self.m;
        let (x, y, z) = (v.x(), v.y(), v.z());
        let w = m[12] * x + m[13] * y + m[14] * z + m[15];
        Vector3::new(
            m[0] * x + m[1] * y + m[2] * z + m[3],
            m[4] * x + m[5] * y + m[6] * z + m[7],
            m[8] * x + m[9] * y + m[10] * z + m[11],
        ) / w
    }

    /// Upper-left 3×3 block only: no translation, no divide.
    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        let m = &self.m;
        let (x, y, z) = (v.x(), v.y(), v.z());
        Vector3::new(
            m[0] * x + m[1] * y + m[2] * z,
            m[4] * x + m[5] * y + m[6] * z,
            m[8] * x + m[9] * y + m[10] * z,
        )
    }
}

impl Mul for Matrix4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::multiply(&self, &rhs)
    }
}

impl From<glam::Mat4> for Matrix4 {
    fn from(mat: glam::Mat4) -> Self {
        Self::from_column_major(mat.to_cols_array())
    }
}

impl From<Matrix4> for glam::Mat4 {
    fn from(mat: Matrix4) -> Self {
        glam::Mat4::from_cols_array(&mat.to_column_major())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::{Mat4, Vec3};

    fn sample() -> Matrix4 {
        Matrix4::from_rows([
            2.0, 0.5, -1.0, 3.0, //
            0.0, 1.5, 2.0, -4.0, //
            1.0, -2.0, 0.25, 1.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    fn assert_cells_close(a: &Matrix4, b: &Matrix4, epsilon: f32) {
        for (x, y) in a.as_array().iter().zip(b.as_array()) {
            assert_abs_diff_eq!(*x, *y, epsilon = epsilon);
        }
    }

    #[test]
    fn identity_is_neutral_for_multiply() {
        let m = sample() * Matrix4::perspective(45.0, 1.5, 0.1, 50.0);
        assert_eq!(Matrix4::multiply(&m, &Matrix4::identity()), m);
        assert_eq!(Matrix4::multiply(&Matrix4::identity(), &m), m);
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let matrices = [
            sample(),
            Matrix4::perspective(60.0, 16.0 / 9.0, 0.1, 100.0),
            Matrix4::rotation(Vector3::new(1.0, 2.0, 3.0), 33.0) * Matrix4::translation(4.0, -1.0, 2.0),
            Matrix4::look_at(Vector3::new(3.0, 4.0, 5.0), Vector3::ZERO, Vector3::Y),
        ];
        for m in matrices {
            let inverse = m.inverse().unwrap();
            assert_cells_close(&(m * inverse), &Matrix4::identity(), 1e-5);
        }
    }

    #[test]
    fn inverse_matches_glam() {
        let m = sample();
        let ours = m.inverse().unwrap();
        let theirs = Matrix4::from(Mat4::from(m).inverse());
        assert_cells_close(&ours, &theirs, 1e-5);
    }

    #[test]
    fn zero_row_is_not_invertible() {
        let mut cells = *sample().as_array();
        cells[4..8].fill(0.0);
        let singular = Matrix4::from_rows(cells);
        assert_eq!(singular.inverse(), Err(RenderError::NotInvertible));

        let mut scratch = Matrix4::translation(1.0, 2.0, 3.0);
        assert!(singular.inverse_into(&mut scratch).is_err());
        assert_eq!(scratch, Matrix4::translation(1.0, 2.0, 3.0));
    }

    #[test]
    fn transpose_twice_is_identity_operation() {
        let m = sample();
        assert_eq!(m.transpose().transpose(), m);
        assert_eq!(m.transpose().get(0, 3), 0.0);
        assert_eq!(m.transpose().get(3, 0), 3.0);
    }

    #[test]
    fn perspective_depth_cell() {
        let (near, far) = (0.1, 1000.0);
        let m = Matrix4::perspective(60.0, 1.0, near, far);
        assert_abs_diff_eq!(m.as_array()[10], -(far + near) / (far - near), epsilon = 1e-6);
        assert_eq!(m.as_array()[14], -1.0);

        let theirs = Matrix4::from(Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, near, far));
        assert_cells_close(&m, &theirs, 1e-4);
    }

    #[test]
    fn ortho_maps_box_to_clip_cube() {
        let m = Matrix4::ortho(-2.0, 2.0, -1.0, 1.0, 0.5, 10.0);
        let corner = m.transform_point(Vector3::new(2.0, 1.0, -10.0));
        assert_abs_diff_eq!(corner.x(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(corner.y(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(corner.z(), 1.0, epsilon = 1e-6);
        let theirs = Matrix4::from(Mat4::orthographic_rh_gl(-2.0, 2.0, -1.0, 1.0, 0.5, 10.0));
        assert_cells_close(&m, &theirs, 1e-6);
    }

    #[test]
    fn rotation_matches_axis_angle() {
        let axis = Vector3::new(1.0, 1.0, 0.0);
        let ours = Matrix4::rotation(axis, 90.0);
        let theirs = Matrix4::from(Mat4::from_axis_angle(Vec3::from(axis.unit()), 90f32.to_radians()));
        assert_cells_close(&ours, &theirs, 1e-6);

        let turned = Matrix4::rotation_z(90.0).transform_vector(Vector3::X);
        assert_abs_diff_eq!(turned.y(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_rotation_is_identity() {
        assert_eq!(Matrix4::rotation(Vector3::ZERO, 45.0), Matrix4::identity());
        assert_eq!(Matrix4::rotation(Vector3::Y, 0.0), Matrix4::identity());
    }

    #[test]
    fn look_at_matches_glam() {
        let eye = Vector3::new(3.0, 2.0, 5.0);
        let center = Vector3::new(0.0, 0.5, 0.0);
        let ours = Matrix4::look_at(eye, center, Vector3::Y);
        let theirs = Matrix4::from(Mat4::look_at_rh(eye.into(), center.into(), Vec3::Y));
        assert_cells_close(&ours, &theirs, 1e-5);

        let at_origin = ours.transform_point(eye);
        assert_abs_diff_eq!(at_origin.length(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn point_and_vector_transforms_differ_on_translation() {
        let m = Matrix4::translation(1.0, 2.0, 3.0) * Matrix4::scale(2.0, 2.0, 2.0);
        assert_eq!(m.transform_point(Vector3::ONE), Vector3::new(3.0, 4.0, 5.0));
        assert_eq!(m.transform_vector(Vector3::ONE), Vector3::splat(2.0));
    }

    #[test]
    fn into_variants_reuse_scratch() {
        let mut scratch = Matrix4::identity();
        Matrix4::translation_into(1.0, 0.0, 0.0, &mut scratch);
        assert_eq!(scratch, Matrix4::translation(1.0, 0.0, 0.0));
        let a = Matrix4::scale(2.0, 3.0, 4.0);
        let b = Matrix4::translation(1.0, 1.0, 1.0);
        Matrix4::multiply_into(&a, &b, &mut scratch);
        assert_eq!(scratch, a * b);
        Matrix4::perspective_into(45.0, 2.0, 1.0, 10.0, &mut scratch);
        assert_eq!(scratch, Matrix4::perspective(45.0, 2.0, 1.0, 10.0));
    }

    #[test]
    fn column_major_upload_layout() {
        let m = Matrix4::translation(7.0, 8.0, 9.0);
        let cols = m.to_column_major();
        assert_eq!(&cols[12..15], &[7.0, 8.0, 9.0]);
        assert_eq!(Matrix4::from_column_major(cols), m);
    }
}
