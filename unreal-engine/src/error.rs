use thiserror::Error;

use unreal_render::RenderError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
}
