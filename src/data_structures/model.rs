//! Meshes and models: CPU geometry, GPU buffers and the draw entry points.
//!
//! The importer produces one [`MeshData`] per mesh reference. [`RenderMesh::new`] uploads it
//! into a vertex and an index buffer exactly once, and a [`Model`] owns the resulting meshes
//! together with the [`TextureCache`] their textures live in.

use std::{path::Path, path::PathBuf, rc::Rc};

use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::{TextureRole, TextureResource},
    pipelines::ShaderBinding,
    resources::cache::TextureCache,
};

/// Bind group slot the diffuse texture is bound to.
pub const TEXTURE_GROUP: u32 = 0;

/// Describes how a vertex type is laid out in a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// One interleaved vertex: 8 floats, 32 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    /// Floats per vertex.
    pub const FLOATS: usize = 8;
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
}

/**
 * The vertex stage reads position at location 0 (offset 0), normal at location 1
 * (offset 12) and texture coordinates at location 2 (offset 24) with a 32 byte stride.
 * Changing the vertex composition means changing `model.wgsl` as well.
 */
impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Interleaved vertices plus triangle-list indices of one mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The vertices as one flat float sequence, `vertex_count() * 8` long.
    pub fn floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Everything needed to build one [`RenderMesh`], without any GPU state.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub name: String,
    pub geometry: Geometry,
    /// Shared with the texture cache. Diffuse slots first, then specular.
    pub textures: Vec<Rc<TextureResource>>,
}

impl MeshData {
    /// First texture whose role is diffuse.
    pub fn diffuse(&self) -> Option<&Rc<TextureResource>> {
        self.textures
            .iter()
            .find(|texture| texture.role() == TextureRole::Diffuse)
    }
}

/// GPU-resident mesh, ready to be drawn every frame.
#[derive(Debug)]
pub struct RenderMesh {
    data: MeshData,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_elements: u32,
}

impl RenderMesh {
    /// Uploads the geometry. The buffers are sized to the data and never written again.
    pub fn new(device: &wgpu::Device, data: MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", data.name)),
            contents: bytemuck::cast_slice(&data.geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", data.name)),
            contents: bytemuck::cast_slice(&data.geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let num_elements = data.geometry.indices.len() as u32;
        Self {
            data,
            vertex_buffer,
            index_buffer,
            num_elements,
        }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn geometry(&self) -> &Geometry {
        &self.data.geometry
    }

    pub fn textures(&self) -> &[Rc<TextureResource>] {
        &self.data.textures
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn num_elements(&self) -> u32 {
        self.num_elements
    }

    /// Bind group of the first diffuse texture, if that texture made it onto the GPU.
    pub fn diffuse_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.data
            .diffuse()
            .and_then(|texture| texture.handle())
            .map(|handle| &handle.bind_group)
    }

    /// Expects `shader` to be bound already and its transform uniforms set.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, shader: &dyn ShaderBinding) {
        render_pass.draw_mesh(self, shader);
    }

    /// Frees both GPU buffers. Textures belong to the cache and are left alone.
    pub fn release(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// All meshes imported from one scene file plus the textures they share.
#[derive(Debug)]
pub struct Model {
    meshes: Vec<RenderMesh>,
    textures: TextureCache,
    directory: PathBuf,
}

impl Model {
    pub(crate) fn new(meshes: Vec<RenderMesh>, textures: TextureCache, directory: PathBuf) -> Self {
        Self {
            meshes,
            textures,
            directory,
        }
    }

    /// Meshes in import (pre-order traversal) order.
    pub fn meshes(&self) -> &[RenderMesh] {
        &self.meshes
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    /// Directory texture paths were resolved against.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Draws every mesh in import order with the currently bound shader.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, shader: &dyn ShaderBinding) {
        render_pass.draw_model(self, shader);
    }

    /// Destroys every buffer and texture the model owns.
    pub fn release(self) {
        for mesh in self.meshes {
            mesh.release();
        }
        self.textures.release();
    }
}

/// Draw calls for meshes and models, implemented on [`wgpu::RenderPass`].
pub trait DrawModel {
    fn draw_mesh(&mut self, mesh: &RenderMesh, shader: &dyn ShaderBinding);

    fn draw_model(&mut self, model: &Model, shader: &dyn ShaderBinding);
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &RenderMesh, shader: &dyn ShaderBinding) {
        // wgpu refuses empty buffer slices
        if mesh.num_elements == 0 {
            return;
        }
        let bind_group = mesh
            .diffuse_bind_group()
            .unwrap_or_else(|| shader.untextured());
        self.set_bind_group(TEXTURE_GROUP, bind_group, &[]);
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_model(&mut self, model: &Model, shader: &dyn ShaderBinding) {
        for mesh in &model.meshes {
            self.draw_mesh(mesh, shader);
        }
    }
}
