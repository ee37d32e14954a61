//! Error types for scene importing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`crate::resources::import()`] and [`crate::resources::load_scene`].
///
/// Both kinds are load-time, one-shot conditions. Nothing in the crate retries them.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The parser produced no scene or no root node: the file is missing, its format is
    /// unsupported or its content is corrupt.
    #[error("failed to load scene {path}: {reason}")]
    SceneLoad { path: PathBuf, reason: String },

    /// A texture referenced by a material could not be read or decoded.
    ///
    /// Only returned when the import runs with [`crate::resources::TexturePolicy::Fail`];
    /// otherwise it is logged and the mesh draws untextured.
    #[error("failed to resolve texture {path}: {reason}")]
    TextureResolution { path: PathBuf, reason: String },
}

impl ImportError {
    pub(crate) fn scene_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SceneLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
