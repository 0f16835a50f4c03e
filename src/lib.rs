//! Minimal real-time 3D rendering core.
//!
//! The crate provides the math types a small renderer needs ([`Vector3`],
//! [`Matrix4`]), a perspective [`Camera`], and a [`Renderer`] that owns GPU
//! resources (shaders, programs, geometry) behind opaque names. All GPU work
//! goes through an injected [`GraphicsContext`], so the core runs headless
//! against [`RecordingContext`] in tests and tools, and against a real
//! OpenGL / WebGL2 context through `GlowContext` (feature `glow`).

pub mod camera;
pub mod config;
pub mod demo;
pub mod error;
pub mod math;
pub mod render;

pub use camera::Camera;
pub use config::RendererConfig;
pub use error::{RenderError, ResourceKind, Result};
pub use math::{Angles, Matrix4, Vector3};
#[cfg(feature = "glow")]
pub use render::GlowContext;
pub use render::{
    AttributeLayout, CallLog, CameraMatrices, GlCall, GraphicsContext, MatrixMode,
    RecordingContext, Renderer, SharedRenderer, ShaderStage, UniformValue,
};
