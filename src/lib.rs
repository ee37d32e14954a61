//! scene-import
//!
//! Loads 3D scene files (Wavefront OBJ and glTF 2.0) and turns them into GPU resources that
//! can be drawn every frame with wgpu. Importing walks the scene's node hierarchy once,
//! flattens every referenced mesh into an interleaved vertex buffer plus an index buffer and
//! uploads each referenced image file exactly once, no matter how many materials use it.
//!
//! High-level modules
//! - `data_structures`: scene graph, vertices, render meshes, models and textures
//! - `resources`: parsers, post-processing, the texture cache and the importer
//! - `pipelines`: the render pipeline meshes are drawn with
//! - `error`: the import error type
//!
//! ```no_run
//! # fn frame(device: &wgpu::Device, queue: &wgpu::Queue, pass: &mut wgpu::RenderPass<'_>, shader: &scene_import::ModelShader) -> Result<(), scene_import::ImportError> {
//! let model = scene_import::import("assets/house.obj", &Default::default(), device, queue)?;
//! shader.bind(pass);
//! model.draw(pass, shader);
//! # Ok(())
//! # }
//! ```

pub mod data_structures;
pub mod error;
pub mod pipelines;
pub mod resources;

pub use data_structures::{
    instance::Instance,
    model::{DrawModel, Geometry, MeshData, Model, ModelVertex, RenderMesh},
    texture::{TextureResource, TextureRole},
};
pub use error::ImportError;
pub use pipelines::{ModelShader, ShaderBinding};
pub use resources::{
    ImportOptions, PostProcess, TextureCache, TexturePolicy, import, load_model, load_scene,
};
