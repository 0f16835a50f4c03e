use std::collections::HashMap;

use log::{debug, error, warn};
use uuid::Uuid;

use crate::camera::Camera;
use crate::config::RendererConfig;
use crate::error::{RenderError, ResourceKind, Result};
use crate::math::{Matrix4, Vector3};

use super::context::{AttributeType, BufferTarget, GraphicsContext, IndexType, PrimitiveMode, ShaderStage};
use super::shared::CameraMatrices;
use super::uniform::{self, UniformValue};

/// Upper bound on error flags drained after a draw; a lost context can keep
/// reporting forever.
const MAX_DRAINED_ERRORS: usize = 8;

/// Layout of one vertex attribute inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    pub dimension: i32,
    pub data_type: AttributeType,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
}

impl AttributeLayout {
    /// Tightly packed float components.
    pub fn floats(dimension: i32) -> Self {
        Self {
            dimension,
            data_type: AttributeType::Float,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }
}

/// Matrix targeted by the matrix-stack helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixMode {
    Projection,
    #[default]
    ModelView,
}

struct ShaderRecord<C: GraphicsContext> {
    shader: C::Shader,
    stage: ShaderStage,
}

struct ProgramRecord<C: GraphicsContext> {
    program: C::Program,
    vertex_shader: String,
    fragment_shader: String,
    uniform_locations: HashMap<String, Option<C::UniformLocation>>,
    attribute_locations: HashMap<String, Option<u32>>,
}

struct GeometryRecord<C: GraphicsContext> {
    vertex_buffer: C::Buffer,
    index_buffer: Option<C::Buffer>,
    count: usize,
    vertex_array: Option<CachedVertexArray<C>>,
}

struct CachedVertexArray<C: GraphicsContext> {
    vertex_array: C::VertexArray,
    /// Attribute slot the array was recorded with.
    location: Option<u32>,
}

/// Owns every GPU resource it creates and drives the injected context.
///
/// Shaders, programs and geometries are addressed by opaque string names.
/// The expected call order per frame is: select a program, bind camera
/// matrices (done automatically on selection), bind attributes, draw.
///
/// A renderer is single-threaded; see [`SharedRenderer`](super::SharedRenderer)
/// for hosts that need to call in from several threads.
pub struct Renderer<C: GraphicsContext> {
    ctx: C,
    config: RendererConfig,
    shaders: HashMap<String, ShaderRecord<C>>,
    programs: HashMap<String, ProgramRecord<C>>,
    geometries: HashMap<String, GeometryRecord<C>>,
    current_program: Option<String>,
    camera: Option<CameraMatrices>,
    matrix_mode: MatrixMode,
    disposed: bool,
}

impl<C: GraphicsContext> Renderer<C> {
    pub fn new(ctx: C) -> Self {
        Self::with_config(ctx, RendererConfig::default())
    }

    pub fn with_config(ctx: C, config: RendererConfig) -> Self {
        Self {
            ctx,
            config,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            geometries: HashMap::new(),
            current_program: None,
            camera: None,
            matrix_mode: MatrixMode::default(),
            disposed: false,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    /// Mutable access to the context for host-side frame work such as clears.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn current_program(&self) -> Option<&str> {
        self.current_program.as_deref()
    }

    pub fn camera(&self) -> Option<&CameraMatrices> {
        self.camera.as_ref()
    }

    pub fn has_shader(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    pub fn has_program(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn has_geometry(&self, name: &str) -> bool {
        self.geometries.contains_key(name)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn program_names(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    /// Number of elements `draw` will submit for `name`.
    pub fn geometry_draw_count(&self, name: &str) -> Option<usize> {
        self.geometries.get(name).map(|geometry| geometry.count)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            Err(RenderError::Disposed)
        } else {
            Ok(())
        }
    }

    // -- shaders --

    pub fn create_vertex_shader(&mut self, source: &str) -> Result<String> {
        self.create_shader(source, ShaderStage::Vertex)
    }

    pub fn create_fragment_shader(&mut self, source: &str) -> Result<String> {
        self.create_shader(source, ShaderStage::Fragment)
    }

    fn create_shader(&mut self, source: &str, stage: ShaderStage) -> Result<String> {
        self.ensure_live()?;
        let shader = self.ctx.create_shader(stage).map_err(RenderError::Backend)?;
        self.ctx.shader_source(shader, source);
        self.ctx.compile_shader(shader);
        if !self.ctx.shader_compile_status(shader) {
            let log = self.ctx.shader_info_log(shader);
            self.ctx.delete_shader(shader);
            return Err(RenderError::ShaderCompile { stage, log });
        }
        let name = generate_name();
        debug!("compiled {stage} shader {name}");
        self.shaders.insert(name.clone(), ShaderRecord { shader, stage });
        Ok(name)
    }

    /// Deletes a shader that is not needed for further linking.
    pub fn delete_shader(&mut self, name: &str) -> Result<()> {
        self.ensure_live()?;
        let record = self
            .shaders
            .remove(name)
            .ok_or_else(|| RenderError::UnknownShader(name.to_string()))?;
        self.ctx.delete_shader(record.shader);
        debug!("deleted {} shader {name}", record.stage);
        Ok(())
    }

    // -- programs --

    /// Links a program from two shaders created by this renderer.
    ///
    /// An empty `name` requests a generated one. When `name` is taken, a
    /// generated name is used if `allow_renaming` is set, otherwise the call
    /// fails with [`RenderError::DuplicateName`]. Returns the registered name.
    pub fn compile_shader_program(
        &mut self,
        name: &str,
        vertex_shader: &str,
        fragment_shader: &str,
        allow_renaming: bool,
    ) -> Result<String> {
        self.ensure_live()?;
        let taken = self.programs.contains_key(name);
        let name = claim_name(ResourceKind::Program, name, taken, allow_renaming)?;

        let vertex = self.lookup_shader(vertex_shader)?;
        let fragment = self.lookup_shader(fragment_shader)?;

        let program = self.ctx.create_program().map_err(RenderError::Backend)?;
        self.ctx.attach_shader(program, vertex);
        self.ctx.attach_shader(program, fragment);
        self.ctx.link_program(program);
        if !self.ctx.program_link_status(program) {
            let log = self.ctx.program_info_log(program);
            self.ctx.delete_program(program);
            return Err(RenderError::ProgramLink { log });
        }

        debug!("linked program {name}");
        self.programs.insert(
            name.clone(),
            ProgramRecord {
                program,
                vertex_shader: vertex_shader.to_string(),
                fragment_shader: fragment_shader.to_string(),
                uniform_locations: HashMap::new(),
                attribute_locations: HashMap::new(),
            },
        );
        Ok(name)
    }

    fn lookup_shader(&self, name: &str) -> Result<C::Shader> {
        self.shaders
            .get(name)
            .map(|record| record.shader)
            .ok_or_else(|| RenderError::UnknownShader(name.to_string()))
    }

    /// Activates a program and immediately re-applies the current camera
    /// matrices to it.
    pub fn use_shader_program(&mut self, name: &str) -> Result<()> {
        self.ensure_live()?;
        let program = self
            .programs
            .get(name)
            .map(|record| record.program)
            .ok_or_else(|| RenderError::UnknownProgram(name.to_string()))?;
        self.ctx.use_program(Some(program));
        self.current_program = Some(name.to_string());
        self.apply_camera()
    }

    /// Deletes the program and both of its shaders.
    pub fn delete_shader_program(&mut self, name: &str) -> Result<()> {
        self.ensure_live()?;
        let record = self
            .programs
            .remove(name)
            .ok_or_else(|| RenderError::UnknownProgram(name.to_string()))?;
        for shader in [&record.vertex_shader, &record.fragment_shader] {
            if let Some(shader) = self.shaders.remove(shader) {
                self.ctx.delete_shader(shader.shader);
            }
        }
        self.ctx.delete_program(record.program);
        if self.current_program.as_deref() == Some(name) {
            self.current_program = None;
            self.ctx.use_program(None);
        }
        debug!("deleted program {name}");
        Ok(())
    }

    // -- uniforms and attributes --

    /// Sets a uniform on the active program.
    ///
    /// The location is resolved on first use and cached for the program's
    /// lifetime. A name the program does not declare is a no-op.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        self.ensure_live()?;
        let value = value.into();
        let record = active_program(&self.current_program, &mut self.programs)?;
        let location = match record.uniform_locations.get(name) {
            Some(cached) => cached.clone(),
            None => {
                let location = self.ctx.uniform_location(record.program, name);
                if location.is_none() {
                    warn!("uniform {name} is not active in the current program");
                }
                record.uniform_locations.insert(name.to_string(), location.clone());
                location
            }
        };
        match location {
            Some(location) => uniform::upload(&mut self.ctx, &location, name, &value),
            None => Ok(()),
        }
    }

    /// Binds the vertex buffer of `geometry` to attribute `name` of the active
    /// program.
    pub fn set_attribute(&mut self, name: &str, geometry: &str, layout: AttributeLayout) -> Result<()> {
        self.ensure_live()?;
        let buffer = self
            .geometries
            .get(geometry)
            .map(|record| record.vertex_buffer)
            .ok_or_else(|| RenderError::UnknownGeometry(geometry.to_string()))?;
        self.bind_attribute(name, buffer, layout).map(|_| ())
    }

    fn attribute_location(&mut self, name: &str) -> Result<Option<u32>> {
        let record = active_program(&self.current_program, &mut self.programs)?;
        if let Some(cached) = record.attribute_locations.get(name) {
            return Ok(*cached);
        }
        let location = self.ctx.attrib_location(record.program, name);
        if location.is_none() {
            warn!("attribute {name} is not active in the current program");
        }
        record.attribute_locations.insert(name.to_string(), location);
        Ok(location)
    }

    fn bind_attribute(&mut self, name: &str, buffer: C::Buffer, layout: AttributeLayout) -> Result<Option<u32>> {
        let location = self.attribute_location(name)?;
        self.attach_buffer(location, buffer, layout);
        Ok(location)
    }

    fn attach_buffer(&mut self, location: Option<u32>, buffer: C::Buffer, layout: AttributeLayout) {
        self.ctx.bind_buffer(BufferTarget::Array, Some(buffer));
        if let Some(index) = location {
            self.ctx.vertex_attrib_pointer(
                index,
                layout.dimension,
                layout.data_type,
                layout.normalized,
                layout.stride,
                layout.offset,
            );
            self.ctx.enable_vertex_attrib_array(index);
        }
    }

    // -- geometry --

    /// Uploads vertex positions and optional 16-bit indices.
    ///
    /// The draw count is `indices.len()` when indices are given, otherwise
    /// `vertices.len() / 3`. Naming follows [`Renderer::compile_shader_program`].
    pub fn create_geometry(
        &mut self,
        name: &str,
        vertices: &[f32],
        indices: Option<&[u16]>,
        allow_renaming: bool,
    ) -> Result<String> {
        self.ensure_live()?;
        let taken = self.geometries.contains_key(name);
        let name = claim_name(ResourceKind::Geometry, name, taken, allow_renaming)?;

        let vertex_buffer = self.upload_buffer(BufferTarget::Array, bytemuck::cast_slice(vertices))?;
        let index_buffer = match indices
            .map(|indices| self.upload_buffer(BufferTarget::ElementArray, bytemuck::cast_slice(indices)))
            .transpose()
        {
            Ok(buffer) => buffer,
            Err(err) => {
                self.ctx.delete_buffer(vertex_buffer);
                return Err(err);
            }
        };
        let count = indices.map_or(vertices.len() / 3, <[u16]>::len);

        debug!("uploaded geometry {name} ({count} elements)");
        self.geometries.insert(
            name.clone(),
            GeometryRecord {
                vertex_buffer,
                index_buffer,
                count,
                vertex_array: None,
            },
        );
        Ok(name)
    }

    fn upload_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Result<C::Buffer> {
        let buffer = self.ctx.create_buffer().map_err(RenderError::Backend)?;
        self.ctx.bind_buffer(target, Some(buffer));
        self.ctx.buffer_data(target, data);
        self.ctx.bind_buffer(target, None);
        Ok(buffer)
    }

    pub fn delete_geometry(&mut self, name: &str) -> Result<()> {
        self.ensure_live()?;
        let record = self
            .geometries
            .remove(name)
            .ok_or_else(|| RenderError::UnknownGeometry(name.to_string()))?;
        self.release_geometry(record);
        debug!("deleted geometry {name}");
        Ok(())
    }

    fn release_geometry(&mut self, record: GeometryRecord<C>) {
        if let Some(cached) = record.vertex_array {
            self.ctx.delete_vertex_array(cached.vertex_array);
        }
        self.ctx.delete_buffer(record.vertex_buffer);
        if let Some(index_buffer) = record.index_buffer {
            self.ctx.delete_buffer(index_buffer);
        }
    }

    /// Draws a geometry as triangles with the active program.
    ///
    /// The position attribute binding is recorded into a vertex array object
    /// the first time a geometry is drawn and reused afterwards. Without an
    /// active program the positions go to attribute slot 0. Errors the context
    /// reports after the draw are logged, never returned.
    pub fn draw(&mut self, name: &str) -> Result<()> {
        self.ensure_live()?;
        let (vertex_buffer, index_buffer, count, cached) = {
            let geometry = self
                .geometries
                .get(name)
                .ok_or_else(|| RenderError::UnknownGeometry(name.to_string()))?;
            let cached = geometry
                .vertex_array
                .as_ref()
                .map(|cached| (cached.vertex_array, cached.location));
            (geometry.vertex_buffer, geometry.index_buffer, geometry.count, cached)
        };
        let count = i32::try_from(count)
            .map_err(|_| RenderError::Backend(format!("geometry {name} has too many elements")))?;

        let location = if self.current_program.is_some() {
            let position = self.config.position_attribute.clone();
            self.attribute_location(&position)?
        } else {
            Some(0)
        };
        match cached {
            Some((vertex_array, recorded)) if recorded == location => {
                self.ctx.bind_vertex_array(Some(vertex_array));
            }
            stale => {
                let vertex_array = self.ctx.create_vertex_array().map_err(RenderError::Backend)?;
                if let Some((previous, _)) = stale {
                    debug!("attribute slot changed, rebuilding vertex array for {name}");
                    self.ctx.delete_vertex_array(previous);
                }
                if let Some(geometry) = self.geometries.get_mut(name) {
                    geometry.vertex_array = Some(CachedVertexArray { vertex_array, location });
                }
                self.ctx.bind_vertex_array(Some(vertex_array));
                self.attach_buffer(location, vertex_buffer, AttributeLayout::floats(3));
            }
        }

        match index_buffer {
            Some(index_buffer) => {
                self.ctx.bind_buffer(BufferTarget::ElementArray, Some(index_buffer));
                self.ctx
                    .draw_elements(PrimitiveMode::Triangles, count, IndexType::UnsignedShort, 0);
            }
            None => self.ctx.draw_arrays(PrimitiveMode::Triangles, 0, count),
        }
        self.ctx.bind_vertex_array(None);

        if self.config.check_errors {
            for _ in 0..MAX_DRAINED_ERRORS {
                let Some(err) = self.ctx.get_error() else {
                    break;
                };
                error!("drawing geometry {name} raised {err}");
            }
        }
        Ok(())
    }

    // -- camera --

    /// Stores the projection / view pair and pushes it to the active program,
    /// if any. Every later program activation re-applies it.
    pub fn set_camera(&mut self, projection: Matrix4, view: Matrix4) -> Result<()> {
        self.ensure_live()?;
        self.camera = Some(CameraMatrices::new(projection, view));
        self.apply_camera()
    }

    pub fn set_camera_from(&mut self, camera: &Camera) -> Result<()> {
        let matrices = CameraMatrices::from(camera);
        self.set_camera(matrices.projection, matrices.view)
    }

    fn apply_camera(&mut self) -> Result<()> {
        let Some(camera) = self.camera else {
            return Ok(());
        };
        if self.current_program.is_none() {
            return Ok(());
        }
        let projection = self.config.projection_uniform.clone();
        let view = self.config.view_uniform.clone();
        self.set_uniform(&projection, camera.projection)?;
        self.set_uniform(&view, camera.view)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) -> Result<()> {
        self.ensure_live()?;
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        self.ctx.viewport(0, 0, width, height);
        Ok(())
    }

    // -- matrix stack --

    pub fn matrix_mode(&mut self, mode: MatrixMode) {
        self.matrix_mode = mode;
    }

    pub fn current_matrix_mode(&self) -> MatrixMode {
        self.matrix_mode
    }

    pub fn load_identity(&mut self) -> Result<()> {
        self.replace_matrix(|_| Matrix4::identity())
    }

    /// Right-multiplies the selected camera matrix by `m`.
    pub fn mult_matrix(&mut self, m: &Matrix4) -> Result<()> {
        self.replace_matrix(|current| Matrix4::multiply(current, m))
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        self.mult_matrix(&Matrix4::translation(x, y, z))
    }

    pub fn rotate(&mut self, degrees: f32, x: f32, y: f32, z: f32) -> Result<()> {
        self.mult_matrix(&Matrix4::rotation(Vector3::new(x, y, z), degrees))
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        self.mult_matrix(&Matrix4::scale(x, y, z))
    }

    pub fn perspective(&mut self, fov: f32, aspect: f32, near: f32, far: f32) -> Result<()> {
        self.mult_matrix(&Matrix4::perspective(fov, aspect, near, far))
    }

    pub fn frustum(&mut self, l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Result<()> {
        self.mult_matrix(&Matrix4::frustum(l, r, b, t, n, f))
    }

    pub fn ortho(&mut self, l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Result<()> {
        self.mult_matrix(&Matrix4::ortho(l, r, b, t, n, f))
    }

    pub fn look_at(&mut self, eye: Vector3, center: Vector3, up: Vector3) -> Result<()> {
        self.mult_matrix(&Matrix4::look_at(eye, center, up))
    }

    fn replace_matrix(&mut self, f: impl FnOnce(&Matrix4) -> Matrix4) -> Result<()> {
        self.ensure_live()?;
        let mut camera = self.camera.unwrap_or_default();
        let target = match self.matrix_mode {
            MatrixMode::Projection => &mut camera.projection,
            MatrixMode::ModelView => &mut camera.view,
        };
        *target = f(target);
        self.camera = Some(camera);
        self.apply_camera()
    }

    // -- teardown --

    /// Deletes every shader, program and geometry. The renderer rejects all
    /// further resource calls with [`RenderError::Disposed`].
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if self.current_program.take().is_some() {
            self.ctx.use_program(None);
        }
        for (_, record) in self.programs.drain() {
            self.ctx.delete_program(record.program);
        }
        for (_, record) in self.shaders.drain() {
            self.ctx.delete_shader(record.shader);
        }
        let geometries: Vec<_> = self.geometries.drain().map(|(_, record)| record).collect();
        for record in geometries {
            self.release_geometry(record);
        }
        self.camera = None;
        self.disposed = true;
        debug!("renderer disposed");
    }
}

fn active_program<'a, C: GraphicsContext>(
    current: &Option<String>,
    programs: &'a mut HashMap<String, ProgramRecord<C>>,
) -> Result<&'a mut ProgramRecord<C>> {
    current
        .as_deref()
        .and_then(|name| programs.get_mut(name))
        .ok_or(RenderError::NoActiveProgram)
}

fn claim_name(kind: ResourceKind, requested: &str, taken: bool, allow_renaming: bool) -> Result<String> {
    if requested.is_empty() {
        return Ok(generate_name());
    }
    if !taken {
        return Ok(requested.to_string());
    }
    if allow_renaming {
        let name = generate_name();
        debug!("{kind} name {requested} is taken, registering as {name}");
        Ok(name)
    } else {
        Err(RenderError::DuplicateName {
            kind,
            name: requested.to_string(),
        })
    }
}

fn generate_name() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::context::ContextError;
    use crate::render::recording::{CallLog, GlCall, RecordingContext};

    const VERTEX: &str = "attribute vec3 position;
uniform mat4 projectionMatrix;
uniform mat4 modelViewMatrix;
void main() { gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0); }";

    const FRAGMENT: &str = "precision mediump float;
uniform vec3 color;
void main() { gl_FragColor = vec4(color, 1.0); }";

    const TRIANGLE: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

    fn renderer() -> (Renderer<RecordingContext>, CallLog) {
        let ctx = RecordingContext::new();
        let log = ctx.log();
        (Renderer::new(ctx), log)
    }

    fn with_program(renderer: &mut Renderer<RecordingContext>, name: &str) -> String {
        let vs = renderer.create_vertex_shader(VERTEX).unwrap();
        let fs = renderer.create_fragment_shader(FRAGMENT).unwrap();
        renderer.compile_shader_program(name, &vs, &fs, false).unwrap()
    }

    fn uniform_lookups(log: &CallLog, uniform: &str) -> usize {
        log.count(|call| matches!(call, GlCall::GetUniformLocation { name, .. } if name == uniform))
    }

    #[test]
    fn compile_failure_carries_log_and_registers_nothing() {
        let (mut renderer, log) = renderer();
        let err = renderer.create_fragment_shader("#error broken").unwrap_err();
        match err {
            RenderError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("#error"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(log.count(|call| matches!(call, GlCall::DeleteShader { .. })), 1);
        assert!(renderer.shaders.is_empty());
    }

    #[test]
    fn duplicate_program_name_is_rejected_unless_renaming() {
        let (mut renderer, _log) = renderer();
        assert_eq!(with_program(&mut renderer, "p"), "p");

        let vs = renderer.create_vertex_shader(VERTEX).unwrap();
        let fs = renderer.create_fragment_shader(FRAGMENT).unwrap();
        assert_eq!(
            renderer.compile_shader_program("p", &vs, &fs, false),
            Err(RenderError::DuplicateName {
                kind: ResourceKind::Program,
                name: "p".to_string()
            })
        );

        let renamed = renderer.compile_shader_program("p", &vs, &fs, true).unwrap();
        assert_ne!(renamed, "p");
        assert!(renderer.has_program(&renamed));

        let generated = renderer.compile_shader_program("", &vs, &fs, false).unwrap();
        assert!(!generated.is_empty());
        assert_eq!(renderer.program_names().count(), 3);
    }

    #[test]
    fn unknown_shaders_fail_linking_setup() {
        let (mut renderer, _log) = renderer();
        let vs = renderer.create_vertex_shader(VERTEX).unwrap();
        assert_eq!(
            renderer.compile_shader_program("p", &vs, "missing", false),
            Err(RenderError::UnknownShader("missing".to_string()))
        );
        assert_eq!(
            renderer.compile_shader_program("p", "gone", &vs, false),
            Err(RenderError::UnknownShader("gone".to_string()))
        );
        assert!(!renderer.has_program("p"));
    }

    #[test]
    fn link_failure_is_reported_and_program_released() {
        let (mut renderer, log) = renderer();
        renderer.context_mut().set_fail_link(true);
        let vs = renderer.create_vertex_shader(VERTEX).unwrap();
        let fs = renderer.create_fragment_shader(FRAGMENT).unwrap();
        let err = renderer.compile_shader_program("p", &vs, &fs, false).unwrap_err();
        assert!(matches!(err, RenderError::ProgramLink { log } if log.contains("link")));
        assert!(!renderer.has_program("p"));
        assert_eq!(log.count(|call| matches!(call, GlCall::DeleteProgram { .. })), 1);
    }

    #[test]
    fn uniforms_need_an_active_program() {
        let (mut renderer, _log) = renderer();
        with_program(&mut renderer, "p");
        assert_eq!(renderer.set_uniform("color", Vector3::ONE), Err(RenderError::NoActiveProgram));
        assert_eq!(
            renderer.use_shader_program("nope"),
            Err(RenderError::UnknownProgram("nope".to_string()))
        );
        renderer.use_shader_program("p").unwrap();
        renderer.set_uniform("color", Vector3::ONE).unwrap();
    }

    #[test]
    fn uniform_locations_are_cached_per_program() {
        let (mut renderer, log) = renderer();
        with_program(&mut renderer, "p");
        renderer.use_shader_program("p").unwrap();
        renderer.set_uniform("color", Vector3::ONE).unwrap();
        renderer.set_uniform("color", Vector3::ZERO).unwrap();
        renderer.set_uniform("undeclared", 1.0f32).unwrap();
        renderer.set_uniform("undeclared", 2.0f32).unwrap();
        assert_eq!(uniform_lookups(&log, "color"), 1);
        assert_eq!(uniform_lookups(&log, "undeclared"), 1);
        assert_eq!(
            log.count(|call| matches!(call, GlCall::UniformVector { components: 3, .. })),
            2
        );
    }

    #[test]
    fn activating_a_program_pushes_camera_matrices() {
        let (mut renderer, log) = renderer();
        with_program(&mut renderer, "a");
        with_program(&mut renderer, "b");
        let camera = Camera::default();
        renderer.set_camera_from(&camera).unwrap();
        assert_eq!(log.count(|call| matches!(call, GlCall::UniformMatrix { .. })), 0);

        renderer.use_shader_program("a").unwrap();
        renderer.use_shader_program("b").unwrap();
        renderer.use_shader_program("a").unwrap();

        let uploads: Vec<_> = log
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                GlCall::UniformMatrix { values, transpose, .. } => Some((values, transpose)),
                _ => None,
            })
            .collect();
        assert_eq!(uploads.len(), 6);
        assert_eq!(uploads[0].0, camera.projection_matrix().to_column_major().to_vec());
        assert_eq!(uploads[1].0, camera.view_matrix().to_column_major().to_vec());
        assert!(uploads.iter().all(|(_, transpose)| !transpose));
        // one lookup per program, then cached
        assert_eq!(uniform_lookups(&log, "projectionMatrix"), 2);
        assert_eq!(renderer.camera(), Some(&CameraMatrices::from(&camera)));
    }

    #[test]
    fn non_indexed_geometry_draws_arrays() {
        let (mut renderer, log) = renderer();
        with_program(&mut renderer, "p");
        renderer.use_shader_program("p").unwrap();
        renderer.create_geometry("tri", &TRIANGLE, None, false).unwrap();
        log.clear();

        renderer.draw("tri").unwrap();
        assert_eq!(
            log.draw_calls(),
            vec![GlCall::DrawArrays {
                mode: PrimitiveMode::Triangles,
                first: 0,
                count: 3
            }]
        );
        assert!(log.calls().contains(&GlCall::VertexAttribPointer {
            index: 0,
            size: 3,
            data_type: AttributeType::Float,
            normalized: false,
            stride: 0,
            offset: 0,
        }));
    }

    #[test]
    fn indexed_geometry_draws_elements() {
        let (mut renderer, log) = renderer();
        with_program(&mut renderer, "p");
        renderer.use_shader_program("p").unwrap();
        renderer
            .create_geometry("tri", &TRIANGLE, Some(&[0, 1, 2]), false)
            .unwrap();
        assert_eq!(renderer.geometry_draw_count("tri"), Some(3));
        assert!(log.calls().contains(&GlCall::BufferData {
            target: BufferTarget::ElementArray,
            bytes: 6
        }));
        log.clear();

        renderer.draw("tri").unwrap();
        assert_eq!(
            log.draw_calls(),
            vec![GlCall::DrawElements {
                mode: PrimitiveMode::Triangles,
                count: 3,
                index_type: IndexType::UnsignedShort,
                offset: 0
            }]
        );
    }

    #[test]
    fn vertex_array_is_built_once_per_geometry() {
        let (mut renderer, log) = renderer();
        with_program(&mut renderer, "p");
        renderer.use_shader_program("p").unwrap();
        renderer.create_geometry("tri", &TRIANGLE, None, false).unwrap();
        for _ in 0..3 {
            renderer.draw("tri").unwrap();
        }
        assert_eq!(log.count(|call| matches!(call, GlCall::CreateVertexArray { .. })), 1);
        assert_eq!(log.count(|call| matches!(call, GlCall::VertexAttribPointer { .. })), 1);
        assert_eq!(log.draw_calls().len(), 3);
    }

    #[test]
    fn draw_rejects_unknown_geometry() {
        let (mut renderer, log) = renderer();
        assert_eq!(
            renderer.draw("ghost"),
            Err(RenderError::UnknownGeometry("ghost".to_string()))
        );
        assert!(log.draw_calls().is_empty());
    }

    #[test]
    fn draw_without_program_uses_slot_zero() {
        let (mut renderer, log) = renderer();
        renderer.create_geometry("tri", &TRIANGLE, None, false).unwrap();
        assert_eq!(renderer.draw("tri"), Ok(()));
        assert_eq!(
            log.draw_calls(),
            vec![GlCall::DrawArrays {
                mode: PrimitiveMode::Triangles,
                first: 0,
                count: 3
            }]
        );
        assert_eq!(log.count(|call| matches!(call, GlCall::EnableVertexAttribArray { index: 0 })), 1);
        assert_eq!(log.count(|call| matches!(call, GlCall::GetAttribLocation { .. })), 0);
    }

    /// Declares `normal` ahead of `position`; binding it first moves
    /// `position` to slot 1.
    const VERTEX_WITH_NORMAL: &str = "attribute vec3 normal;
attribute vec3 position;
uniform mat4 projectionMatrix;
uniform mat4 modelViewMatrix;
void main() { gl_Position = projectionMatrix * modelViewMatrix * vec4(position + normal * 0.0, 1.0); }";

    fn with_shifted_position(renderer: &mut Renderer<RecordingContext>, name: &str) {
        let vs = renderer.create_vertex_shader(VERTEX_WITH_NORMAL).unwrap();
        let fs = renderer.create_fragment_shader(FRAGMENT).unwrap();
        renderer.compile_shader_program(name, &vs, &fs, false).unwrap();
        renderer.use_shader_program(name).unwrap();
        renderer
            .set_attribute("normal", "tri", AttributeLayout::floats(3))
            .unwrap();
    }

    #[test]
    fn vertex_array_is_rebuilt_when_position_slot_moves() {
        let (mut renderer, log) = renderer();
        renderer.create_geometry("tri", &TRIANGLE, None, false).unwrap();
        with_program(&mut renderer, "a");
        renderer.use_shader_program("a").unwrap();
        renderer.draw("tri").unwrap();

        with_shifted_position(&mut renderer, "b");
        renderer.draw("tri").unwrap();
        renderer.draw("tri").unwrap();

        assert_eq!(log.count(|call| matches!(call, GlCall::CreateVertexArray { .. })), 2);
        assert_eq!(log.count(|call| matches!(call, GlCall::DeleteVertexArray { .. })), 1);
        assert_eq!(log.count(|call| matches!(call, GlCall::EnableVertexAttribArray { index: 1 })), 1);
        assert_eq!(log.draw_calls().len(), 3);
    }

    #[test]
    fn failed_rebuild_keeps_the_cached_vertex_array() {
        let (mut renderer, log) = renderer();
        renderer.create_geometry("tri", &TRIANGLE, None, false).unwrap();
        with_program(&mut renderer, "a");
        renderer.use_shader_program("a").unwrap();
        renderer.draw("tri").unwrap();

        with_shifted_position(&mut renderer, "b");
        renderer.context_mut().set_fail_vertex_arrays(true);
        assert!(matches!(renderer.draw("tri"), Err(RenderError::Backend(_))));
        assert_eq!(log.count(|call| matches!(call, GlCall::DeleteVertexArray { .. })), 0);

        renderer.delete_geometry("tri").unwrap();
        let deleted: Vec<_> = log
            .calls()
            .into_iter()
            .filter(|call| matches!(call, GlCall::DeleteVertexArray { .. }))
            .collect();
        assert_eq!(deleted.len(), 1);
    }

    #[test]
    fn draw_time_errors_are_logged_not_returned() {
        let (mut renderer, log) = renderer();
        with_program(&mut renderer, "p");
        renderer.use_shader_program("p").unwrap();
        renderer.create_geometry("tri", &TRIANGLE, None, false).unwrap();
        renderer.context_mut().push_error(ContextError::InvalidOperation);
        renderer.context_mut().push_error(ContextError::InvalidValue);
        assert_eq!(renderer.draw("tri"), Ok(()));
        assert_eq!(log.draw_calls().len(), 1);
        // both flags drained
        assert_eq!(renderer.context_mut().get_error(), None);
    }

    #[test]
    fn geometry_names_follow_program_policy() {
        let (mut renderer, _log) = renderer();
        renderer.create_geometry("g", &TRIANGLE, None, false).unwrap();
        assert_eq!(
            renderer.create_geometry("g", &TRIANGLE, None, false),
            Err(RenderError::DuplicateName {
                kind: ResourceKind::Geometry,
                name: "g".to_string()
            })
        );
        let renamed = renderer.create_geometry("g", &TRIANGLE, None, true).unwrap();
        assert_ne!(renamed, "g");
        assert_eq!(renderer.geometry_count(), 2);
    }

    #[test]
    fn deleting_the_active_program_clears_it() {
        let (mut renderer, log) = renderer();
        let vs = renderer.create_vertex_shader(VERTEX).unwrap();
        let fs = renderer.create_fragment_shader(FRAGMENT).unwrap();
        renderer.compile_shader_program("p", &vs, &fs, false).unwrap();
        renderer.use_shader_program("p").unwrap();

        renderer.delete_shader_program("p").unwrap();
        assert_eq!(renderer.current_program(), None);
        assert!(!renderer.has_shader(&vs));
        assert!(!renderer.has_shader(&fs));
        assert_eq!(log.count(|call| matches!(call, GlCall::DeleteShader { .. })), 2);
        assert_eq!(renderer.set_uniform("color", 1.0f32), Err(RenderError::NoActiveProgram));
        assert_eq!(
            renderer.delete_shader_program("p"),
            Err(RenderError::UnknownProgram("p".to_string()))
        );
    }

    #[test]
    fn deleting_geometry_releases_buffers_and_vertex_array() {
        let (mut renderer, log) = renderer();
        with_program(&mut renderer, "p");
        renderer.use_shader_program("p").unwrap();
        renderer
            .create_geometry("tri", &TRIANGLE, Some(&[0, 1, 2]), false)
            .unwrap();
        renderer.draw("tri").unwrap();
        renderer.delete_geometry("tri").unwrap();
        assert_eq!(log.count(|call| matches!(call, GlCall::DeleteBuffer { .. })), 2);
        assert_eq!(log.count(|call| matches!(call, GlCall::DeleteVertexArray { .. })), 1);
        assert_eq!(
            renderer.draw("tri"),
            Err(RenderError::UnknownGeometry("tri".to_string()))
        );
    }

    #[test]
    fn dispose_tears_everything_down() {
        let (mut renderer, _log) = renderer();
        with_program(&mut renderer, "p");
        renderer.use_shader_program("p").unwrap();
        renderer.create_geometry("tri", &TRIANGLE, None, false).unwrap();
        renderer.dispose();

        assert!(renderer.is_disposed());
        assert_eq!(renderer.context().live_objects(), 0);
        assert_eq!(renderer.geometry_count(), 0);
        assert_eq!(renderer.current_program(), None);
        assert_eq!(renderer.draw("tri"), Err(RenderError::Disposed));
        assert_eq!(renderer.create_vertex_shader(VERTEX), Err(RenderError::Disposed));
        renderer.dispose();
    }

    #[test]
    fn matrix_stack_composes_into_camera() {
        let (mut renderer, log) = renderer();
        with_program(&mut renderer, "p");
        renderer.use_shader_program("p").unwrap();

        renderer.matrix_mode(MatrixMode::Projection);
        renderer.perspective(60.0, 1.0, 0.1, 100.0).unwrap();
        renderer.matrix_mode(MatrixMode::ModelView);
        renderer.translate(0.0, 0.0, -5.0).unwrap();
        renderer.scale(2.0, 2.0, 2.0).unwrap();

        let camera = renderer.camera().copied().unwrap();
        assert_eq!(camera.projection, Matrix4::perspective(60.0, 1.0, 0.1, 100.0));
        assert_eq!(
            camera.view,
            Matrix4::translation(0.0, 0.0, -5.0) * Matrix4::scale(2.0, 2.0, 2.0)
        );
        // each step re-applies both matrices
        assert_eq!(log.count(|call| matches!(call, GlCall::UniformMatrix { .. })), 6);

        renderer.load_identity().unwrap();
        assert_eq!(renderer.camera().unwrap().view, Matrix4::identity());
    }

    #[test]
    fn explicit_attributes_bind_geometry_buffers() {
        let (mut renderer, log) = renderer();
        renderer.create_geometry("tri", &TRIANGLE, None, false).unwrap();
        assert_eq!(
            renderer.set_attribute("position", "tri", AttributeLayout::floats(3)),
            Err(RenderError::NoActiveProgram)
        );
        with_program(&mut renderer, "p");
        renderer.use_shader_program("p").unwrap();
        renderer
            .set_attribute("position", "tri", AttributeLayout::floats(3))
            .unwrap();
        assert_eq!(log.count(|call| matches!(call, GlCall::EnableVertexAttribArray { index: 0 })), 1);
        assert_eq!(
            renderer.set_attribute("position", "nope", AttributeLayout::floats(3)),
            Err(RenderError::UnknownGeometry("nope".to_string()))
        );
    }

    #[test]
    fn viewport_is_forwarded() {
        let (mut renderer, log) = renderer();
        renderer.set_viewport(800, 600).unwrap();
        assert_eq!(
            log.calls(),
            vec![GlCall::Viewport {
                x: 0,
                y: 0,
                width: 800,
                height: 600
            }]
        );
    }
}
