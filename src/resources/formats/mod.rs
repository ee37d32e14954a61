//! Parsers that turn files into a [`Scene`]. The file extension picks the format.

use std::path::Path;

use crate::{data_structures::scene::Scene, error::ImportError};

mod gltf;
mod obj;

/// Extensions [`parse`] understands, lower case.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["obj", "gltf", "glb"];

pub(crate) fn parse(path: &Path) -> Result<Scene, ImportError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("obj") => obj::load(path),
        Some("gltf" | "glb") => self::gltf::load(path),
        _ => Err(ImportError::scene_load(
            path,
            format!(
                "unsupported format, expected one of {}",
                SUPPORTED_EXTENSIONS.join(", ")
            ),
        )),
    }
}
