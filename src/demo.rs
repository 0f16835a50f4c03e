//! Built-in demo scene: a flat-colored triangle or cube driven through the
//! full renderer pipeline.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::camera::Camera;
use crate::math::Vector3;
use crate::render::{GraphicsContext, Renderer};

pub const VERTEX_SHADER: &str = r#"#version 300 es
in vec3 position;
uniform mat4 projectionMatrix;
uniform mat4 modelViewMatrix;

void main() {
    gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0);
}
"#;

pub const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
uniform vec3 color;
out vec4 fragColor;

void main() {
    fragColor = vec4(color, 1.0);
}
"#;

const TRIANGLE_VERTICES: &[f32] = &[
    -0.5, -0.5, 0.0, //
    0.5, -0.5, 0.0, //
    0.0, 0.5, 0.0,
];

const TRIANGLE_INDICES: &[u16] = &[0, 1, 2];

const CUBE_VERTICES: &[f32] = &[
    -0.5, -0.5, 0.5, 0.5, -0.5, 0.5, 0.5, 0.5, 0.5, -0.5, 0.5, 0.5, // front
    -0.5, -0.5, -0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, -0.5, // back
    -0.5, -0.5, -0.5, -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, 0.5, -0.5, // left
    0.5, -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, -0.5, // right
    -0.5, -0.5, -0.5, 0.5, -0.5, -0.5, 0.5, -0.5, 0.5, -0.5, -0.5, 0.5, // bottom
    -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, 0.5, 0.5, 0.5, -0.5, 0.5, 0.5, // top
];

const CUBE_INDICES: &[u16] = &[
    0, 1, 2, 0, 2, 3, // front
    4, 6, 5, 4, 7, 6, // back
    8, 9, 10, 8, 10, 11, // left
    12, 14, 13, 12, 15, 14, // right
    16, 18, 17, 16, 19, 18, // bottom
    20, 21, 22, 20, 22, 23, // top
];

/// Degrees the model turns around +Y per frame.
const TURN_PER_FRAME: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoMesh {
    Triangle,
    Cube,
}

impl DemoMesh {
    pub fn name(self) -> &'static str {
        match self {
            DemoMesh::Triangle => "triangle",
            DemoMesh::Cube => "cube",
        }
    }

    fn source(self) -> (&'static [f32], &'static [u16]) {
        match self {
            DemoMesh::Triangle => (TRIANGLE_VERTICES, TRIANGLE_INDICES),
            DemoMesh::Cube => (CUBE_VERTICES, CUBE_INDICES),
        }
    }

    /// Vertex positions plus indices, or a flattened triangle list when
    /// `indexed` is false.
    pub fn geometry(self, indexed: bool) -> (Vec<f32>, Option<Vec<u16>>) {
        let (vertices, indices) = self.source();
        if indexed {
            return (vertices.to_vec(), Some(indices.to_vec()));
        }
        let flattened = indices
            .iter()
            .flat_map(|&index| {
                let start = usize::from(index) * 3;
                vertices[start..start + 3].iter().copied()
            })
            .collect();
        (flattened, None)
    }
}

impl fmt::Display for DemoMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DemoMesh {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "triangle" => Ok(DemoMesh::Triangle),
            "cube" => Ok(DemoMesh::Cube),
            other => Err(anyhow!("Unknown mesh: {other}. Expected triangle or cube")),
        }
    }
}

/// Names of the resources a demo registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoScene {
    pub program: String,
    pub geometry: String,
    pub element_count: usize,
    pub indexed: bool,
}

/// Compiles the demo program, uploads `mesh` and binds the camera.
pub fn setup<C: GraphicsContext>(
    renderer: &mut Renderer<C>,
    camera: &Camera,
    mesh: DemoMesh,
    indexed: bool,
) -> Result<DemoScene> {
    let vertex = renderer
        .create_vertex_shader(VERTEX_SHADER)
        .context("failed to compile demo vertex shader")?;
    let fragment = renderer
        .create_fragment_shader(FRAGMENT_SHADER)
        .context("failed to compile demo fragment shader")?;
    let program = renderer
        .compile_shader_program("demo", &vertex, &fragment, true)
        .context("failed to link demo program")?;

    let (vertices, indices) = mesh.geometry(indexed);
    let geometry = renderer
        .create_geometry(mesh.name(), &vertices, indices.as_deref(), true)
        .with_context(|| format!("failed to upload {mesh} geometry"))?;
    let element_count = renderer.geometry_draw_count(&geometry).unwrap_or_default();

    renderer.set_camera_from(camera)?;
    renderer.use_shader_program(&program)?;
    Ok(DemoScene {
        program,
        geometry,
        element_count,
        indexed,
    })
}

/// Draws one frame: turns the model, picks a color and issues the draw.
pub fn render_frame<C: GraphicsContext>(
    renderer: &mut Renderer<C>,
    scene: &DemoScene,
    frame: u32,
) -> Result<()> {
    renderer.use_shader_program(&scene.program)?;
    if frame > 0 {
        renderer.rotate(TURN_PER_FRAME, 0.0, 1.0, 0.0)?;
    }
    let t = (frame % 8) as f32 / 7.0;
    let color = Vector3::lerp(Vector3::new(1.0, 0.4, 0.1), Vector3::new(0.1, 0.4, 1.0), t);
    renderer.set_uniform("color", color)?;
    renderer
        .draw(&scene.geometry)
        .with_context(|| format!("failed to draw {}", scene.geometry))
}
