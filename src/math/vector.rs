use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Immutable three component vector.
///
/// Every operation returns a new value; operands are never modified. The
/// arithmetic operators accept either another `Vector3` (component-wise) or an
/// `f32`, which is broadcast to all three components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    x: f32,
    y: f32,
    z: f32,
}

/// Spherical parameterization produced by [`Vector3::to_angles`], in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Angles {
    /// Azimuth in the XZ plane, measured from +X towards +Z.
    pub theta: f32,
    /// Elevation above the XZ plane.
    pub phi: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    pub fn negative(&self) -> Self {
        -*self
    }

    /// Component-wise sum; an `f32` operand is broadcast.
    pub fn add(&self, other: impl Into<Self>) -> Self {
        *self + other.into()
    }

    pub fn subtract(&self, other: impl Into<Self>) -> Self {
        *self - other.into()
    }

    pub fn multiply(&self, other: impl Into<Self>) -> Self {
        *self * other.into()
    }

    pub fn divide(&self, other: impl Into<Self>) -> Self {
        *self / other.into()
    }

    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(&self) -> f32 {
        self.dot(*self).sqrt()
    }

    /// Returns the vector scaled to unit length.
    ///
    /// The vector must have a nonzero length; a zero vector yields NaN
    /// components.
    pub fn unit(&self) -> Self {
        *self / self.length()
    }

    /// Smallest of the three components.
    pub fn min_component(&self) -> f32 {
        self.x.min(self.y).min(self.z)
    }

    /// Largest of the three components.
    pub fn max_component(&self) -> f32 {
        self.x.max(self.y).max(self.z)
    }

    pub fn to_angles(&self) -> Angles {
        Angles {
            theta: self.z.atan2(self.x),
            phi: (self.y / self.length()).clamp(-1.0, 1.0).asin(),
        }
    }

    pub fn from_angles(theta: f32, phi: f32) -> Self {
        Self::new(
            theta.cos() * phi.cos(),
            phi.sin(),
            theta.sin() * phi.cos(),
        )
    }

    /// Angle in radians between `self` and `other`. Both must be nonzero.
    pub fn angle_to(&self, other: Self) -> f32 {
        let cos = self.dot(other) / (self.length() * other.length());
        cos.clamp(-1.0, 1.0).acos()
    }

    pub fn angle_between(a: Self, b: Self) -> f32 {
        a.angle_to(b)
    }

    pub fn min(a: Self, b: Self) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
    }

    pub fn max(a: Self, b: Self) -> Self {
        Self::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
    }

    /// Linear interpolation; `fraction` is not clamped.
    pub fn lerp(a: Self, b: Self, fraction: f32) -> Self {
        a * (1.0 - fraction) + b * fraction
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// First `n` components, `n` capped at three.
    pub fn to_vec(&self, n: usize) -> Vec<f32> {
        self.to_array().into_iter().take(n).collect()
    }

    pub fn from_array(values: [f32; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }
}

impl From<f32> for Vector3 {
    fn from(value: f32) -> Self {
        Self::splat(value)
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(values: [f32; 3]) -> Self {
        Self::from_array(values)
    }
}

impl From<Vector3> for [f32; 3] {
    fn from(v: Vector3) -> Self {
        v.to_array()
    }
}

impl From<glam::Vec3> for Vector3 {
    fn from(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for glam::Vec3 {
    fn from(v: Vector3) -> Self {
        glam::Vec3::new(v.x, v.y, v.z)
    }
}

impl Neg for Vector3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

macro_rules! impl_componentwise {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Vector3 {
            type Output = Self;
            fn $method(self, rhs: Self) -> Self {
                Self::new(self.x $op rhs.x, self.y $op rhs.y, self.z $op rhs.z)
            }
        }

        impl $trait<f32> for Vector3 {
            type Output = Self;
            fn $method(self, rhs: f32) -> Self {
                Self::new(self.x $op rhs, self.y $op rhs, self.z $op rhs)
            }
        }
    };
}

impl_componentwise!(Add, add, +);
impl_componentwise!(Sub, sub, -);
impl_componentwise!(Mul, mul, *);
impl_componentwise!(Div, div, /);
