//! Vector and matrix math shared by the camera and the renderer.

pub mod matrix;
pub mod vector;

pub use matrix::Matrix4;
pub use vector::{Angles, Vector3};
