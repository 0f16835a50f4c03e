use thiserror::Error;

use crate::render::ShaderStage;

/// Errors reported by the math and rendering core.
///
/// Construction-time failures (compile, link, inversion, unknown names) abort the
/// current operation. Draw-time backend errors never surface here; the renderer
/// logs them instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program failed to link: {log}")]
    ProgramLink { log: String },

    #[error("unknown shader \"{0}\", create it with create_vertex_shader/create_fragment_shader")]
    UnknownShader(String),

    #[error("unknown program \"{0}\", create it with compile_shader_program")]
    UnknownProgram(String),

    #[error("unknown geometry \"{0}\", create it with create_geometry")]
    UnknownGeometry(String),

    #[error("{kind} name \"{name}\" is already registered")]
    DuplicateName { kind: ResourceKind, name: String },

    #[error("matrix is not invertible (determinant is zero)")]
    NotInvertible,

    #[error("no active program, call use_shader_program first")]
    NoActiveProgram,

    #[error("cannot load uniform \"{name}\" of length {len}")]
    UnsupportedUniformLength { name: String, len: usize },

    #[error("graphics backend error: {0}")]
    Backend(String),

    #[error("renderer has been disposed")]
    Disposed,
}

/// Registry a name collision happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Program,
    Geometry,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Program => f.write_str("program"),
            ResourceKind::Geometry => f.write_str("geometry"),
        }
    }
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
