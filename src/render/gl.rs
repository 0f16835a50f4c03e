use glow::HasContext;

use super::context::{
    AttributeType, BufferTarget, ContextError, GraphicsContext, IndexType, PrimitiveMode,
    ShaderStage,
};

/// [`GraphicsContext`] backed by a `glow` OpenGL / WebGL2 context.
pub struct GlowContext<G: HasContext = glow::Context> {
    gl: G,
}

impl<G: HasContext> GlowContext<G> {
    /// Wraps a loaded context.
    ///
    /// # Safety
    ///
    /// `gl` must stay current on the calling thread for as long as the
    /// returned value is used; every trait method issues raw GL calls.
    pub unsafe fn new(gl: G) -> Self {
        Self { gl }
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn into_inner(self) -> G {
        self.gl
    }
}

fn shader_kind(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn attribute_type(data_type: AttributeType) -> u32 {
    match data_type {
        AttributeType::Byte => glow::BYTE,
        AttributeType::UnsignedByte => glow::UNSIGNED_BYTE,
        AttributeType::Short => glow::SHORT,
        AttributeType::UnsignedShort => glow::UNSIGNED_SHORT,
        AttributeType::Int => glow::INT,
        AttributeType::UnsignedInt => glow::UNSIGNED_INT,
        AttributeType::Float => glow::FLOAT,
    }
}

fn primitive_mode(mode: PrimitiveMode) -> u32 {
    match mode {
        PrimitiveMode::Points => glow::POINTS,
        PrimitiveMode::Lines => glow::LINES,
        PrimitiveMode::LineStrip => glow::LINE_STRIP,
        PrimitiveMode::Triangles => glow::TRIANGLES,
        PrimitiveMode::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveMode::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn index_type(index_type: IndexType) -> u32 {
    match index_type {
        IndexType::UnsignedByte => glow::UNSIGNED_BYTE,
        IndexType::UnsignedShort => glow::UNSIGNED_SHORT,
        IndexType::UnsignedInt => glow::UNSIGNED_INT,
    }
}

// SAFETY (all methods): `GlowContext::new` requires the context to be current.
impl<G: HasContext> GraphicsContext for GlowContext<G> {
    type Shader = G::Shader;
    type Program = G::Program;
    type Buffer = G::Buffer;
    type VertexArray = G::VertexArray;
    type UniformLocation = G::UniformLocation;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(shader_kind(stage)) }
    }

    fn shader_source(&mut self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn shader_compile_status(&mut self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&mut self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&mut self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn link_program(&mut self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&mut self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&mut self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn use_program(&mut self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn delete_program(&mut self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn uniform_location(&mut self, program: Self::Program, name: &str) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn attrib_location(&mut self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_1_f32(&mut self, location: &Self::UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(location), value) }
    }

    fn uniform_1_i32(&mut self, location: &Self::UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(location), value) }
    }

    fn uniform_f32_slice(&mut self, location: &Self::UniformLocation, components: u8, values: &[f32]) {
        let location = Some(location);
        unsafe {
            match components {
                1 => self.gl.uniform_1_f32_slice(location, values),
                2 => self.gl.uniform_2_f32_slice(location, values),
                3 => self.gl.uniform_3_f32_slice(location, values),
                _ => self.gl.uniform_4_f32_slice(location, values),
            }
        }
    }

    fn uniform_matrix_f32_slice(
        &mut self,
        location: &Self::UniformLocation,
        dimension: u8,
        transpose: bool,
        values: &[f32],
    ) {
        let location = Some(location);
        unsafe {
            match dimension {
                3 => self.gl.uniform_matrix_3_f32_slice(location, transpose, values),
                _ => self.gl.uniform_matrix_4_f32_slice(location, transpose, values),
            }
        }
    }

    fn create_buffer(&mut self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(buffer_target(target), buffer) }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(buffer_target(target), data, glow::STATIC_DRAW)
        }
    }

    fn delete_buffer(&mut self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: AttributeType,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                index,
                size,
                attribute_type(data_type),
                normalized,
                stride,
                offset,
            )
        }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, String> {
        unsafe { self.gl.create_vertex_array() }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) }
    }

    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(primitive_mode(mode), first, count) }
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: i32, element_type: IndexType, offset: i32) {
        unsafe {
            self.gl
                .draw_elements(primitive_mode(mode), count, index_type(element_type), offset)
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn get_error(&mut self) -> Option<ContextError> {
        ContextError::from_code(unsafe { self.gl.get_error() })
    }
}
