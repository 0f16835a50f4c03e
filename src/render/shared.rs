use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::camera::Camera;
use crate::math::Matrix4;

use super::context::GraphicsContext;
use super::renderer::Renderer;

/// Camera state consumed by the renderer's projection / view uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraMatrices {
    pub projection: Matrix4,
    pub view: Matrix4,
}

impl CameraMatrices {
    pub fn new(projection: Matrix4, view: Matrix4) -> Self {
        Self { projection, view }
    }
}

impl From<&Camera> for CameraMatrices {
    fn from(camera: &Camera) -> Self {
        Self {
            projection: *camera.projection_matrix(),
            view: *camera.view_matrix(),
        }
    }
}

/// Renderer handle for hosts that call in from several threads.
///
/// GPU state is global to the context, so every call must be serialized; this
/// wrapper does that with a single lock around the renderer.
pub struct SharedRenderer<C: GraphicsContext> {
    inner: Arc<Mutex<Renderer<C>>>,
}

impl<C: GraphicsContext> Clone for SharedRenderer<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: GraphicsContext> SharedRenderer<C> {
    pub fn new(renderer: Renderer<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(renderer)),
        }
    }

    /// Locks the renderer for a sequence of calls.
    pub fn lock(&self) -> MutexGuard<'_, Renderer<C>> {
        self.inner.lock()
    }

    /// Runs `f` with exclusive access to the renderer.
    pub fn with<R>(&self, f: impl FnOnce(&mut Renderer<C>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::RecordingContext;

    #[test]
    fn camera_matrices_copy_camera_state() {
        let camera = Camera::new(45.0, 1.5, 0.5, 20.0);
        let matrices = CameraMatrices::from(&camera);
        assert_eq!(&matrices.projection, camera.projection_matrix());
        assert_eq!(&matrices.view, camera.view_matrix());
    }

    #[test]
    fn shared_renderer_serializes_access_across_threads() {
        let shared = SharedRenderer::new(Renderer::new(RecordingContext::new()));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared.with(|renderer| {
                        renderer
                            .create_geometry(&format!("tri-{i}"), &[0.0; 9], None, false)
                            .unwrap();
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.lock().geometry_count(), 4);
    }
}
