use crate::error::{RenderError, Result};
use crate::math::{Matrix4, Vector3};

use super::context::GraphicsContext;

/// Value accepted by [`Renderer::set_uniform`](super::Renderer::set_uniform).
///
/// `Vector` and `Matrix` are flattened to their canonical upload form first: a
/// vector becomes `vec3`, a matrix becomes a column-major `mat4`. Raw `Floats`
/// are passed through as given, so a 9 or 16 element array must already be in
/// column-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    /// Integer uniform, typically a sampler unit.
    Int(i32),
    Vector(Vector3),
    Matrix(Matrix4),
    Floats(Vec<f32>),
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<Vector3> for UniformValue {
    fn from(value: Vector3) -> Self {
        UniformValue::Vector(value)
    }
}

impl From<Matrix4> for UniformValue {
    fn from(value: Matrix4) -> Self {
        UniformValue::Matrix(value)
    }
}

impl From<&Matrix4> for UniformValue {
    fn from(value: &Matrix4) -> Self {
        UniformValue::Matrix(*value)
    }
}

impl From<Vec<f32>> for UniformValue {
    fn from(values: Vec<f32>) -> Self {
        UniformValue::Floats(values)
    }
}

impl From<&[f32]> for UniformValue {
    fn from(values: &[f32]) -> Self {
        UniformValue::Floats(values.to_vec())
    }
}

impl<const N: usize> From<[f32; N]> for UniformValue {
    fn from(values: [f32; N]) -> Self {
        UniformValue::Floats(values.to_vec())
    }
}

/// Issues the upload matching the shape of `value`.
pub(crate) fn upload<C: GraphicsContext>(
    ctx: &mut C,
    location: &C::UniformLocation,
    name: &str,
    value: &UniformValue,
) -> Result<()> {
    match value {
        UniformValue::Float(value) => ctx.uniform_1_f32(location, *value),
        UniformValue::Int(value) => ctx.uniform_1_i32(location, *value),
        UniformValue::Vector(v) => ctx.uniform_f32_slice(location, 3, &v.to_array()),
        UniformValue::Matrix(m) => ctx.uniform_matrix_f32_slice(location, 4, false, &m.to_column_major()),
        UniformValue::Floats(values) => match values.len() {
            len @ 1..=4 => ctx.uniform_f32_slice(location, len as u8, values),
            9 => ctx.uniform_matrix_f32_slice(location, 3, false, values),
            16 => ctx.uniform_matrix_f32_slice(location, 4, false, values),
            len => {
                return Err(RenderError::UnsupportedUniformLength {
                    name: name.to_string(),
                    len,
                })
            }
        },
    }
    Ok(())
}
