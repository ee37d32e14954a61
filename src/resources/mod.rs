use std::path::Path;

use crate::{data_structures::scene::Scene, error::ImportError};

/**
 * This module contains all logic for loading meshes and textures from external files and
 * turning them into GPU resources.
 */
pub mod cache;
pub mod formats;
pub mod import;
pub mod mesh;
pub mod postprocess;
pub mod texture;

pub use cache::TextureCache;
pub use import::{
    ImportOptions, ImportedScene, SceneImporter, TexturePolicy, import, import_meshes,
};
pub use postprocess::PostProcess;

/// Parses a scene file and runs the selected post-processing steps on it.
///
/// Fails with [`ImportError::SceneLoad`] when the file is missing, its format is unknown or
/// corrupt, or the result has no root node.
pub fn load_scene(path: impl AsRef<Path>, steps: PostProcess) -> Result<Scene, ImportError> {
    let path = path.as_ref();
    let scene = formats::parse(path).and_then(|mut scene| {
        steps
            .apply(&mut scene)
            .map_err(|e| ImportError::scene_load(path, format!("{e:#}")))?;
        if scene.root().is_none() {
            return Err(ImportError::scene_load(path, "scene has no root node"));
        }
        Ok(scene)
    });
    if let Err(e) = &scene {
        log::error!("Error loading {}: {e}", path.display());
    }
    scene
}

/// [`import::import`] with default options.
pub fn load_model(
    path: impl AsRef<Path>,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<crate::data_structures::model::Model, ImportError> {
    import(path, &ImportOptions::default(), device, queue)
}
