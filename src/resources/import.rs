use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    data_structures::{
        model::{MeshData, Model, RenderMesh},
        scene::{Material, Scene, SourceMesh, TextureType},
        texture::{TextureResource, TextureRole},
    },
    error::ImportError,
    resources::{
        cache::TextureCache,
        load_scene, mesh,
        postprocess::{self, PostProcess},
        texture::{TextureUpload, WgpuTextureUpload, resolve_path},
    },
};

/// What happens when a material references an image that can not be loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TexturePolicy {
    /// Log it and keep going. The mesh keeps the reference and draws untextured.
    #[default]
    Tolerate,
    /// Abort the import with [`ImportError::TextureResolution`].
    Fail,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ImportOptions {
    pub texture_policy: TexturePolicy,
}

/// The CPU side of an import: everything a [`Model`] is built from.
#[derive(Debug)]
pub struct ImportedScene {
    pub directory: PathBuf,
    /// One entry per mesh reference, in traversal order.
    pub meshes: Vec<MeshData>,
    pub textures: TextureCache,
}

impl ImportedScene {
    /// Uploads every mesh's geometry. Textures are already on the GPU by now.
    pub fn into_model(self, device: &wgpu::Device) -> Model {
        let meshes = self
            .meshes
            .into_iter()
            .map(|data| RenderMesh::new(device, data))
            .collect();
        Model::new(meshes, self.textures, self.directory)
    }
}

/**
 * Walks a scene and turns every mesh reference into [`MeshData`].
 *
 * The importer owns the [`TextureCache`] for the whole pass and resolves every material
 * texture through it, so each image file is uploaded at most once no matter how many
 * meshes use it.
 */
pub struct SceneImporter<'a> {
    directory: PathBuf,
    textures: TextureCache,
    upload: &'a mut dyn TextureUpload,
    policy: TexturePolicy,
}

impl<'a> SceneImporter<'a> {
    /// `path` is the scene file; its directory becomes the base for texture paths.
    pub fn new(path: &Path, upload: &'a mut dyn TextureUpload, policy: TexturePolicy) -> Self {
        Self {
            directory: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            textures: TextureCache::new(),
            upload,
            policy,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Depth-first, pre-order: a node's own meshes come before its children's. A mesh
    /// referenced by several nodes is extracted once per reference.
    ///
    /// Every referenced mesh must consist of triangles over existing vertices, which
    /// [`load_scene`] guarantees. On error the textures uploaded so far are released.
    pub fn import_scene(&mut self, scene: &Scene) -> Result<Vec<MeshData>, ImportError> {
        let result = self.collect_meshes(scene);
        if result.is_err() {
            std::mem::take(&mut self.textures).release();
        }
        result
    }

    fn collect_meshes(&mut self, scene: &Scene) -> Result<Vec<MeshData>, ImportError> {
        if scene.root().is_none() {
            return Err(ImportError::scene_load(&self.directory, "scene has no root node"));
        }
        let mut meshes = Vec::with_capacity(scene.mesh_reference_count());
        for node_idx in scene.walk() {
            let node = &scene.nodes[node_idx];
            for &mesh_idx in &node.mesh_indices {
                let Some(mesh) = scene.meshes.get(mesh_idx) else {
                    return Err(ImportError::scene_load(
                        &self.directory,
                        format!("node {:?} references missing mesh {mesh_idx}", node.name),
                    ));
                };
                self.check_triangles(mesh)?;
                let geometry = mesh::extract_geometry(mesh);
                let mut textures = Vec::new();
                if let Some(material) = scene.material_of(mesh) {
                    textures.extend(self.resolve_texture(material, TextureType::Diffuse)?);
                    textures.extend(self.resolve_texture(material, TextureType::Specular)?);
                }
                log::debug!(
                    "Imported mesh {:?}: {} vertices, {} indices, {} textures.",
                    mesh.name,
                    geometry.vertex_count(),
                    geometry.indices.len(),
                    textures.len()
                );
                meshes.push(MeshData {
                    name: mesh.name.clone(),
                    geometry,
                    textures,
                });
            }
        }
        Ok(meshes)
    }

    fn check_triangles(&self, mesh: &SourceMesh) -> Result<(), ImportError> {
        postprocess::validate(mesh)
            .map_err(|e| ImportError::scene_load(&self.directory, format!("{e:#}")))?;
        match mesh.faces.iter().position(|face| face.indices.len() != 3) {
            Some(face_idx) => Err(ImportError::scene_load(
                &self.directory,
                format!(
                    "mesh {:?}: face {face_idx} has {} corners, expected a triangle",
                    mesh.name,
                    mesh.faces[face_idx].indices.len()
                ),
            )),
            None => Ok(()),
        }
    }

    /// Resolves every slot of type `ty` on `material`, in declaration order.
    ///
    /// Only diffuse and specular slots map to a [`TextureRole`]; other types resolve to
    /// nothing.
    pub fn resolve_texture(
        &mut self,
        material: &Material,
        ty: TextureType,
    ) -> Result<Vec<Rc<TextureResource>>, ImportError> {
        let role = match ty {
            TextureType::Diffuse => TextureRole::Diffuse,
            TextureType::Specular => TextureRole::Specular,
            _ => return Ok(Vec::new()),
        };
        let Self {
            directory,
            textures,
            upload,
            policy,
        } = self;

        material
            .textures_of(ty)
            .map(|slot| {
                let path = resolve_path(directory, &slot.path);
                textures.get_or_insert_with(path, role, |path, role| {
                    match upload.upload(path, role) {
                        Ok(handle) => Ok(Some(handle)),
                        Err(e) if *policy == TexturePolicy::Fail => {
                            Err(ImportError::TextureResolution {
                                path: path.to_path_buf(),
                                reason: format!("{e:#}"),
                            })
                        }
                        Err(e) => {
                            log::warn!(
                                "Texture {} of material {:?} could not be loaded, drawing untextured: {e:#}",
                                path.display(),
                                material.name
                            );
                            Ok(None)
                        }
                    }
                })
            })
            .collect()
    }

    pub fn into_cache(self) -> TextureCache {
        self.textures
    }
}

/// Parses `path` with every post-processing step and imports it without touching the GPU
/// for geometry. Textures go through `upload`.
pub fn import_meshes(
    path: impl AsRef<Path>,
    options: &ImportOptions,
    upload: &mut dyn TextureUpload,
) -> Result<ImportedScene, ImportError> {
    let path = path.as_ref();
    let scene = load_scene(path, PostProcess::ALL)?;

    let mut importer = SceneImporter::new(path, upload, options.texture_policy);
    let meshes = importer.import_scene(&scene)?;
    let directory = importer.directory().to_path_buf();
    let textures = importer.into_cache();

    log::info!(
        "Imported {}: {} meshes, {} textures ({} references).",
        path.display(),
        meshes.len(),
        textures.len(),
        textures.requests()
    );
    Ok(ImportedScene {
        directory,
        meshes,
        textures,
    })
}

/// Loads a scene file into a drawable [`Model`].
///
/// Blocks until the file is parsed and every buffer and texture is created. Either the
/// whole model comes back or an error does.
pub fn import(
    path: impl AsRef<Path>,
    options: &ImportOptions,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<Model, ImportError> {
    let mut upload = WgpuTextureUpload::new(device, queue);
    let imported = import_meshes(path, options, &mut upload)?;
    Ok(imported.into_model(device))
}
