use serde::{Deserialize, Serialize};

/// Naming and diagnostics settings for a [`Renderer`](crate::Renderer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Uniform receiving the camera projection matrix.
    pub projection_uniform: String,
    /// Uniform receiving the camera view matrix.
    pub view_uniform: String,
    /// Attribute `draw` binds the geometry's vertex buffer to.
    pub position_attribute: String,
    /// Poll the context error state after each draw call.
    pub check_errors: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            projection_uniform: "projectionMatrix".to_string(),
            view_uniform: "modelViewMatrix".to_string(),
            position_attribute: "position".to_string(),
            check_errors: true,
        }
    }
}
