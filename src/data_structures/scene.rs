//! Format-agnostic scene graph produced by the format adapters.
//!
//! A [`Scene`] is the read-only input of the importer: a node arena with a root, the meshes
//! the nodes point at and the materials the meshes point at. Nodes are stored flat and refer
//! to their children by index so walking the hierarchy never recurses.

use crate::data_structures::instance::Instance;

/// Where the source format puts `(0, 0)` in texture space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UvOrigin {
    /// OpenGL style, as written by OBJ exporters.
    BottomLeft,
    /// wgpu/glTF style. This is what the renderer samples with.
    TopLeft,
}

/// Semantic of a material texture slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureType {
    Diffuse,
    Specular,
    Ambient,
    Normals,
    Shininess,
    Opacity,
}

/// One image reference of a material, exactly as the source file reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureSlot {
    pub ty: TextureType,
    /// Usually relative to the scene file's directory.
    pub path: String,
}

#[derive(Clone, Debug, Default)]
pub struct Material {
    pub name: String,
    pub textures: Vec<TextureSlot>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: Vec::new(),
        }
    }

    pub fn with_texture(mut self, ty: TextureType, path: impl Into<String>) -> Self {
        self.textures.push(TextureSlot {
            ty,
            path: path.into(),
        });
        self
    }

    /// All slots of type `ty` in declaration order. A material may carry several.
    pub fn textures_of(&self, ty: TextureType) -> impl Iterator<Item = &TextureSlot> {
        self.textures.iter().filter(move |slot| slot.ty == ty)
    }

    pub fn texture_count(&self, ty: TextureType) -> usize {
        self.textures_of(ty).count()
    }
}

/// A polygon. After triangulation every face has exactly three indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl From<[u32; 3]> for Face {
    fn from(indices: [u32; 3]) -> Self {
        Self {
            indices: indices.to_vec(),
        }
    }
}

/// Raw geometry of one mesh as delivered by a parser.
///
/// `normals`, each `tex_coords` channel, `tangents` and `bitangents` are either empty or hold
/// one entry per position.
#[derive(Clone, Debug, Default)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<Vec<[f32; 2]>>,
    pub faces: Vec<Face>,
    pub material_index: Option<usize>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
}

impl SourceMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_tex_coords(&self, channel: usize) -> bool {
        self.tex_coords
            .get(channel)
            .is_some_and(|uvs| !uvs.is_empty())
    }

    pub fn has_tangents(&self) -> bool {
        !self.tangents.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Node {
    pub name: String,
    /// Indices into [`Scene::meshes`]. The same mesh may appear on several nodes.
    pub mesh_indices: Vec<usize>,
    /// Indices into [`Scene::nodes`].
    pub children: Vec<usize>,
    /// Local transform relative to the parent. Recorded, never baked into vertices.
    pub transform: Instance,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub nodes: Vec<Node>,
    pub root: Option<usize>,
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<Material>,
    pub uv_origin: UvOrigin,
}

impl Scene {
    pub fn new(uv_origin: UvOrigin) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            meshes: Vec::new(),
            materials: Vec::new(),
            uv_origin,
        }
    }

    /// Appends a node and returns its index.
    pub fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.and_then(|idx| self.nodes.get(idx))
    }

    /// Material of `mesh`, if it names one that exists.
    pub fn material_of(&self, mesh: &SourceMesh) -> Option<&Material> {
        mesh.material_index.and_then(|idx| self.materials.get(idx))
    }

    /// Node indices in depth-first pre-order starting at the root.
    ///
    /// Siblings are visited in declaration order. Nodes unreachable from the root are skipped,
    /// and a node is never visited twice even if a malformed arena links it more than once.
    pub fn walk(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(idx) = stack.pop() {
            let Some(node) = self.nodes.get(idx) else {
                continue;
            };
            if std::mem::replace(&mut visited[idx], true) {
                continue;
            }
            order.push(idx);
            // reversed so the first child is popped next
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Total count of mesh references over all reachable nodes.
    pub fn mesh_reference_count(&self) -> usize {
        self.walk()
            .into_iter()
            .map(|idx| self.nodes[idx].mesh_indices.len())
            .sum()
    }
}
