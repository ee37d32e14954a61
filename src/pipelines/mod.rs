//! Render pipelines meshes are drawn with.
//!
//! Meshes only rely on the [`ShaderBinding`] contract: something is bound as the current
//! pipeline, its transform uniforms are already set, and it can hand out a bind group for
//! meshes that have no diffuse texture. [`model::ModelShader`] is the stock implementation.

pub mod model;

pub use model::ModelShader;

/// What a mesh needs from the shader that is current while it draws.
pub trait ShaderBinding {
    /// Bind group for texture group 0 used by meshes without a resident diffuse texture.
    fn untextured(&self) -> &wgpu::BindGroup;
}
