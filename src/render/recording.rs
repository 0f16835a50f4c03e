use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use super::context::{
    AttributeType, BufferTarget, ContextError, GraphicsContext, IndexType, PrimitiveMode,
    ShaderStage,
};

/// One call issued against a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader { stage: ShaderStage, shader: u32 },
    ShaderSource { shader: u32 },
    CompileShader { shader: u32 },
    DeleteShader { shader: u32 },
    CreateProgram { program: u32 },
    AttachShader { program: u32, shader: u32 },
    LinkProgram { program: u32 },
    UseProgram { program: Option<u32> },
    DeleteProgram { program: u32 },
    GetUniformLocation { program: u32, name: String },
    GetAttribLocation { program: u32, name: String },
    Uniform1f { location: u32, value: f32 },
    Uniform1i { location: u32, value: i32 },
    UniformVector { location: u32, components: u8, values: Vec<f32> },
    UniformMatrix { location: u32, dimension: u8, transpose: bool, values: Vec<f32> },
    CreateBuffer { buffer: u32 },
    BindBuffer { target: BufferTarget, buffer: Option<u32> },
    BufferData { target: BufferTarget, bytes: usize },
    DeleteBuffer { buffer: u32 },
    VertexAttribPointer {
        index: u32,
        size: i32,
        data_type: AttributeType,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    EnableVertexAttribArray { index: u32 },
    CreateVertexArray { vertex_array: u32 },
    BindVertexArray { vertex_array: Option<u32> },
    DeleteVertexArray { vertex_array: u32 },
    DrawArrays { mode: PrimitiveMode, first: i32, count: i32 },
    DrawElements { mode: PrimitiveMode, count: i32, index_type: IndexType, offset: i32 },
    Viewport { x: i32, y: i32, width: i32, height: i32 },
}

impl GlCall {
    pub fn is_draw(&self) -> bool {
        matches!(self, GlCall::DrawArrays { .. } | GlCall::DrawElements { .. })
    }
}

/// Shared handle on the calls recorded by a context.
///
/// Cloning is cheap; all clones observe the same log, so a caller can keep one
/// after moving the context into a renderer.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<GlCall>>>,
}

impl CallLog {
    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn draw_calls(&self) -> Vec<GlCall> {
        self.calls.lock().iter().filter(|call| call.is_draw()).cloned().collect()
    }

    pub fn count(&self, predicate: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    fn push(&self, call: GlCall) {
        self.calls.lock().push(call);
    }
}

/// Headless context that records every call instead of talking to a GPU.
///
/// It simulates enough of a real driver to exercise the renderer: a shader
/// whose source contains the configured error marker fails to compile, a
/// program can be told to fail linking, and uniform / attribute lookups only
/// succeed for names that appear in the attached shader sources.
#[derive(Debug)]
pub struct RecordingContext {
    log: CallLog,
    next_id: u32,
    compile_error_marker: String,
    fail_link: bool,
    fail_vertex_arrays: bool,
    shaders: HashMap<u32, RecordedShader>,
    programs: HashMap<u32, RecordedProgram>,
    pending_errors: VecDeque<ContextError>,
}

#[derive(Debug, Default)]
struct RecordedShader {
    stage: Option<ShaderStage>,
    source: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct RecordedProgram {
    shaders: Vec<u32>,
    linked: bool,
    uniforms: Vec<String>,
    attributes: Vec<String>,
}

fn intern(names: &mut Vec<String>, name: &str) -> u32 {
    let index = match names.iter().position(|known| known == name) {
        Some(index) => index,
        None => {
            names.push(name.to_string());
            names.len() - 1
        }
    };
    index as u32
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            next_id: 1,
            compile_error_marker: "#error".to_string(),
            fail_link: false,
            fail_vertex_arrays: false,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            pending_errors: VecDeque::new(),
        }
    }

    /// Returns a handle on the call log shared with this context.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Sources containing `marker` fail to compile. Defaults to `#error`.
    pub fn with_compile_error_marker(mut self, marker: impl Into<String>) -> Self {
        self.compile_error_marker = marker.into();
        self
    }

    /// Makes every subsequent link fail.
    pub fn set_fail_link(&mut self, fail: bool) {
        self.fail_link = fail;
    }

    /// Makes every subsequent vertex array allocation fail.
    pub fn set_fail_vertex_arrays(&mut self, fail: bool) {
        self.fail_vertex_arrays = fail;
    }

    /// Queues an error flag to be reported by the next `get_error` calls.
    pub fn push_error(&mut self, error: ContextError) {
        self.pending_errors.push_back(error);
    }

    /// Number of shader and program objects currently alive.
    pub fn live_objects(&self) -> usize {
        self.shaders.len() + self.programs.len()
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn program_mentions(&self, program: u32, name: &str) -> bool {
        self.programs.get(&program).is_some_and(|record| {
            record.linked
                && record.shaders.iter().any(|shader| {
                    self.shaders
                        .get(shader)
                        .is_some_and(|s| s.source.contains(name))
                })
        })
    }
}

impl GraphicsContext for RecordingContext {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type UniformLocation = u32;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<u32, String> {
        let shader = self.allocate();
        self.shaders.insert(
            shader,
            RecordedShader {
                stage: Some(stage),
                ..RecordedShader::default()
            },
        );
        self.log.push(GlCall::CreateShader { stage, shader });
        Ok(shader)
    }

    fn shader_source(&mut self, shader: u32, source: &str) {
        if let Some(record) = self.shaders.get_mut(&shader) {
            record.source = source.to_string();
        }
        self.log.push(GlCall::ShaderSource { shader });
    }

    fn compile_shader(&mut self, shader: u32) {
        let marker = self.compile_error_marker.clone();
        if let Some(record) = self.shaders.get_mut(&shader) {
            record.compiled = !record.source.contains(&marker);
        }
        self.log.push(GlCall::CompileShader { shader });
    }

    fn shader_compile_status(&mut self, shader: u32) -> bool {
        self.shaders.get(&shader).is_some_and(|record| record.compiled)
    }

    fn shader_info_log(&mut self, shader: u32) -> String {
        match self.shaders.get(&shader) {
            Some(record) if !record.compiled => {
                let stage = record.stage.map(|s| s.to_string()).unwrap_or_default();
                format!("ERROR: 0:1: '{}' : {stage} compilation terminated", self.compile_error_marker)
            }
            _ => String::new(),
        }
    }

    fn delete_shader(&mut self, shader: u32) {
        self.shaders.remove(&shader);
        self.log.push(GlCall::DeleteShader { shader });
    }

    fn create_program(&mut self) -> Result<u32, String> {
        let program = self.allocate();
        self.programs.insert(program, RecordedProgram::default());
        self.log.push(GlCall::CreateProgram { program });
        Ok(program)
    }

    fn attach_shader(&mut self, program: u32, shader: u32) {
        if let Some(record) = self.programs.get_mut(&program) {
            record.shaders.push(shader);
        }
        self.log.push(GlCall::AttachShader { program, shader });
    }

    fn link_program(&mut self, program: u32) {
        let compiled = self.programs.get(&program).is_some_and(|record| {
            record.shaders.len() == 2
                && record
                    .shaders
                    .iter()
                    .all(|shader| self.shaders.get(shader).is_some_and(|s| s.compiled))
        });
        let fail_link = self.fail_link;
        if let Some(record) = self.programs.get_mut(&program) {
            record.linked = compiled && !fail_link;
        }
        self.log.push(GlCall::LinkProgram { program });
    }

    fn program_link_status(&mut self, program: u32) -> bool {
        self.programs.get(&program).is_some_and(|record| record.linked)
    }

    fn program_info_log(&mut self, program: u32) -> String {
        if self.program_link_status(program) {
            String::new()
        } else {
            "error: vertex and fragment shaders failed to link".to_string()
        }
    }

    fn use_program(&mut self, program: Option<u32>) {
        self.log.push(GlCall::UseProgram { program });
    }

    fn delete_program(&mut self, program: u32) {
        self.programs.remove(&program);
        self.log.push(GlCall::DeleteProgram { program });
    }

    fn uniform_location(&mut self, program: u32, name: &str) -> Option<u32> {
        self.log.push(GlCall::GetUniformLocation {
            program,
            name: name.to_string(),
        });
        if !self.program_mentions(program, name) {
            return None;
        }
        let record = self.programs.get_mut(&program)?;
        let index = intern(&mut record.uniforms, name);
        // distinct across programs so tests can tell uploads apart
        Some(program * 1000 + index)
    }

    fn attrib_location(&mut self, program: u32, name: &str) -> Option<u32> {
        self.log.push(GlCall::GetAttribLocation {
            program,
            name: name.to_string(),
        });
        if !self.program_mentions(program, name) {
            return None;
        }
        let record = self.programs.get_mut(&program)?;
        Some(intern(&mut record.attributes, name))
    }

    fn uniform_1_f32(&mut self, location: &u32, value: f32) {
        self.log.push(GlCall::Uniform1f {
            location: *location,
            value,
        });
    }

    fn uniform_1_i32(&mut self, location: &u32, value: i32) {
        self.log.push(GlCall::Uniform1i {
            location: *location,
            value,
        });
    }

    fn uniform_f32_slice(&mut self, location: &u32, components: u8, values: &[f32]) {
        self.log.push(GlCall::UniformVector {
            location: *location,
            components,
            values: values.to_vec(),
        });
    }

    fn uniform_matrix_f32_slice(&mut self, location: &u32, dimension: u8, transpose: bool, values: &[f32]) {
        self.log.push(GlCall::UniformMatrix {
            location: *location,
            dimension,
            transpose,
            values: values.to_vec(),
        });
    }

    fn create_buffer(&mut self) -> Result<u32, String> {
        let buffer = self.allocate();
        self.log.push(GlCall::CreateBuffer { buffer });
        Ok(buffer)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<u32>) {
        self.log.push(GlCall::BindBuffer { target, buffer });
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) {
        self.log.push(GlCall::BufferData {
            target,
            bytes: data.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: u32) {
        self.log.push(GlCall::DeleteBuffer { buffer });
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
        self.log.push(GlCall::VertexAttribPointer {
            index,
            size,
            data_type,
            normalized,
            stride,
            offset,
        });
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.log.push(GlCall::EnableVertexAttribArray { index });
    }

    fn create_vertex_array(&mut self) -> Result<u32, String> {
        if self.fail_vertex_arrays {
            return Err("vertex array objects are unavailable".to_string());
        }
        let vertex_array = self.allocate();
        self.log.push(GlCall::CreateVertexArray { vertex_array });
        Ok(vertex_array)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<u32>) {
        self.log.push(GlCall::BindVertexArray { vertex_array });
    }

    fn delete_vertex_array(&mut self, vertex_array: u32) {
        self.log.push(GlCall::DeleteVertexArray { vertex_array });
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: i32, count: i32) {
        self.log.push(GlCall::DrawArrays { mode, first, count });
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: i32, index_type: IndexType, offset: i32) {
        self.log.push(GlCall::DrawElements {
            mode,
            count,
            index_type,
            offset,
        });
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.log.push(GlCall::Viewport { x, y, width, height });
    }

    fn get_error(&mut self) -> Option<ContextError> {
        self.pending_errors.pop_front()
    }
}
