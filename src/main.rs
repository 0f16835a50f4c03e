use std::env;

use anyhow::{anyhow, Context, Result};
use log::info;

use lumen_core::demo::{self, DemoMesh};
use lumen_core::{Camera, RecordingContext, Renderer, Vector3};

const USAGE: &str =
    "Usage: lumen-trace [triangle|cube] [--frames N] [--indexed|--no-indexed] [--trace] [--camera x,y,z]";

const VIEWPORT: (u32, u32) = (1280, 720);

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;

    let ctx = RecordingContext::new();
    let log = ctx.log();
    let mut renderer = Renderer::new(ctx);

    let mut camera = Camera::default();
    if let Some(position) = options.camera {
        camera.set_position(position);
    }
    camera.set_aspect_from_viewport(VIEWPORT.0, VIEWPORT.1);
    renderer.set_viewport(VIEWPORT.0, VIEWPORT.1)?;

    let scene = demo::setup(&mut renderer, &camera, options.mesh, options.indexed)?;
    println!("Compiled program {}", scene.program);
    println!(
        "Uploaded geometry {} ({} elements, {})",
        scene.geometry,
        scene.element_count,
        if scene.indexed { "indexed" } else { "non-indexed" }
    );

    for frame in 0..options.frames {
        let before = log.draw_calls().len();
        demo::render_frame(&mut renderer, &scene, frame)
            .with_context(|| format!("frame {frame} failed"))?;
        let draws = log.draw_calls().len() - before;
        println!("Frame {frame}: {draws} draw call(s)");
    }

    renderer.dispose();
    info!("renderer disposed after {} frame(s)", options.frames);

    let calls = log.calls();
    if options.trace {
        for (index, call) in calls.iter().enumerate() {
            println!("{index:>4} {call:?}");
        }
    }
    println!("Recorded {} context calls", calls.len());
    Ok(())
}

#[derive(Debug)]
struct CliOptions {
    mesh: DemoMesh,
    frames: u32,
    indexed: bool,
    trace: bool,
    camera: Option<Vector3>,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            mesh: DemoMesh::Cube,
            frames: 1,
            indexed: true,
            trace: false,
            camera: None,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--indexed" => options.indexed = true,
                "--no-indexed" => options.indexed = false,
                "--trace" => options.trace = true,
                "--frames" => {
                    let value = args.next().ok_or_else(|| anyhow!("--frames needs a value. {USAGE}"))?;
                    options.frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count {value}"))?;
                }
                "--camera" => {
                    let value = args.next().ok_or_else(|| anyhow!("--camera needs x,y,z. {USAGE}"))?;
                    options.camera = Some(parse_vector(&value)?);
                }
                "triangle" | "cube" => options.mesh = arg.parse()?,
                other => return Err(anyhow!("Unknown argument: {other}. {USAGE}")),
            }
        }
        Ok(options)
    }
}

fn parse_vector(value: &str) -> Result<Vector3> {
    let components = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid camera position {value}"))?;
    match components.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(anyhow!("camera position needs three components, got {value}")),
    }
}
