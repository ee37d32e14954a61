//! Data structures shared by the importer and the renderer.
//!
//! - `scene` is the format-agnostic scene graph the parsers produce
//! - `model` contains vertices, render meshes and models plus the draw calls
//! - `texture` contains the GPU texture wrapper and the cached texture resources
//! - `instance` holds node transforms

pub mod instance;
pub mod model;
pub mod scene;
pub mod texture;
