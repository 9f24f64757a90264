use thiserror::Error;

/// Recoverable errors raised at the editor's input boundary.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A zoom request or config asked for a non-positive or non-finite scale.
    #[error("invalid view scale: {0}")]
    InvalidScale(f32),

    #[error("invalid editor configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse editor configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EditorError>;
