use std::fmt::{self, Debug};

/// Retained-mode graphics context the renderer drives.
///
/// The shape follows the subset of an OpenGL / WebGL2 context the core needs.
/// A context is injected into [`Renderer`](super::Renderer) at construction and
/// every operation goes through it; there is no process-wide context.
///
/// Object creation reports backend failures as `Err(String)`, in the same way
/// `glow` does.
pub trait GraphicsContext {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type Buffer: Copy + Debug;
    type VertexArray: Copy + Debug;
    type UniformLocation: Clone + Debug;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&mut self, shader: Self::Shader, source: &str);
    fn compile_shader(&mut self, shader: Self::Shader);
    fn shader_compile_status(&mut self, shader: Self::Shader) -> bool;
    fn shader_info_log(&mut self, shader: Self::Shader) -> String;
    fn delete_shader(&mut self, shader: Self::Shader);

    fn create_program(&mut self) -> Result<Self::Program, String>;
    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader);
    fn link_program(&mut self, program: Self::Program);
    fn program_link_status(&mut self, program: Self::Program) -> bool;
    fn program_info_log(&mut self, program: Self::Program) -> String;
    fn use_program(&mut self, program: Option<Self::Program>);
    fn delete_program(&mut self, program: Self::Program);

    fn uniform_location(&mut self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;
    fn attrib_location(&mut self, program: Self::Program, name: &str) -> Option<u32>;

    fn uniform_1_f32(&mut self, location: &Self::UniformLocation, value: f32);
    fn uniform_1_i32(&mut self, location: &Self::UniformLocation, value: i32);
    /// Uploads a `vecN` uniform, `components` in `1..=4`.
    fn uniform_f32_slice(&mut self, location: &Self::UniformLocation, components: u8, values: &[f32]);
    /// Uploads a `matN` uniform, `dimension` 3 or 4.
    fn uniform_matrix_f32_slice(
        &mut self,
        location: &Self::UniformLocation,
        dimension: u8,
        transpose: bool,
        values: &[f32],
    );

    fn create_buffer(&mut self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<Self::Buffer>);
    /// Uploads static data to the buffer bound at `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]);
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: AttributeType,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn enable_vertex_attrib_array(&mut self, index: u32);

    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&mut self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray);

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: i32, count: i32);
    fn draw_elements(&mut self, mode: PrimitiveMode, count: i32, index_type: IndexType, offset: i32);

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Pops the oldest pending error flag, `None` when the context is clean.
    fn get_error(&mut self) -> Option<ContextError>;
}

/// Pipeline stage a shader is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

/// Component type of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
}

/// Error flag reported by the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextError {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    InvalidFramebufferOperation,
    OutOfMemory,
    ContextLost,
    Other(u32),
}

impl ContextError {
    /// Maps a raw GL error code; `NO_ERROR` (0) maps to `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        let error = match code {
            0 => return None,
            0x0500 => ContextError::InvalidEnum,
            0x0501 => ContextError::InvalidValue,
            0x0502 => ContextError::InvalidOperation,
            0x0505 => ContextError::OutOfMemory,
            0x0506 => ContextError::InvalidFramebufferOperation,
            0x9242 => ContextError::ContextLost,
            other => ContextError::Other(other),
        };
        Some(error)
    }
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::InvalidEnum => f.write_str("INVALID_ENUM"),
            ContextError::InvalidValue => f.write_str("INVALID_VALUE"),
            ContextError::InvalidOperation => f.write_str("INVALID_OPERATION"),
            ContextError::InvalidFramebufferOperation => f.write_str("INVALID_FRAMEBUFFER_OPERATION"),
            ContextError::OutOfMemory => f.write_str("OUT_OF_MEMORY"),
            ContextError::ContextLost => f.write_str("CONTEXT_LOST"),
            ContextError::Other(code) => write!(f, "0x{code:04X}"),
        }
    }
}
