pub mod context;
#[cfg(feature = "glow")]
pub mod gl;
pub mod recording;
pub mod renderer;
pub mod shared;
pub mod uniform;

pub use context::{
    AttributeType, BufferTarget, ContextError, GraphicsContext, IndexType, PrimitiveMode,
    ShaderStage,
};
#[cfg(feature = "glow")]
pub use gl::GlowContext;
pub use recording::{CallLog, GlCall, RecordingContext};
pub use renderer::{AttributeLayout, MatrixMode, Renderer};
pub use shared::{CameraMatrices, SharedRenderer};
pub use uniform::UniformValue;
