//! Recoverable errors for scene editing and config loading
//!
//! Geometry degeneracies are not errors (they surface as `None`), and
//! contract violations such as normalizing a zero vector panic instead.

use thiserror::Error;

use crate::sim::FeatureId;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read or write scene data: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scene json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no feature with id {0:?}")]
    UnknownFeature(FeatureId),

    #[error("feature endpoints coincide at ({x}, {y})")]
    ZeroLengthFeature { x: f64, y: f64 },
}
