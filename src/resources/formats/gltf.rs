use std::path::Path;

use ::gltf::{image::Source, mesh::Mode};

use crate::{
    data_structures::{
        instance::Instance,
        scene::{Face, Material, Node, Scene, SourceMesh, TextureType, UvOrigin},
    },
    error::ImportError,
};

/**
 * glTF 2.0, both `.gltf` with external buffers and binary `.glb`.
 *
 * Node indices are kept: node `i` of the document is node `i` of the scene. Every primitive
 * becomes its own mesh (named `mesh.primitive` when there are several) and a node refers
 * to all primitives of its mesh. The default scene (or the first one) decides the roots;
 * several roots hang below a synthetic root node.
 */
pub(crate) fn load(path: &Path) -> Result<Scene, ImportError> {
    let ::gltf::Gltf { document, blob } =
        ::gltf::Gltf::open(path).map_err(|e| ImportError::scene_load(path, e))?;
    let buffers = ::gltf::import_buffers(&document, path.parent(), blob)
        .map_err(|e| ImportError::scene_load(path, e))?;

    let mut scene = Scene::new(UvOrigin::TopLeft);
    scene.materials = document.materials().map(convert_material).collect();

    let mut primitives_of_mesh = Vec::new();
    for mesh in document.meshes() {
        let mut indices = Vec::new();
        let base_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh{}", mesh.index()));
        let split = mesh.primitives().count() > 1;
        for primitive in mesh.primitives() {
            let name = if split {
                format!("{base_name}.{}", primitive.index())
            } else {
                base_name.clone()
            };
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

            let positions: Vec<[f32; 3]> =
                reader.read_positions().map(Iterator::collect).unwrap_or_default();
            let normals = matching(
                &name,
                "normals",
                positions.len(),
                reader.read_normals().map(Iterator::collect).unwrap_or_default(),
            );
            let mut tex_coords = Vec::new();
            let mut set = 0;
            while let Some(channel) = reader.read_tex_coords(set) {
                tex_coords.push(matching(
                    &name,
                    "texture coordinates",
                    positions.len(),
                    channel.into_f32().collect(),
                ));
                set += 1;
            }
            let corners: Vec<u32> = match reader.read_indices() {
                Some(read) => read.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            indices.push(scene.meshes.len());
            scene.meshes.push(SourceMesh {
                faces: faces_for_mode(&name, primitive.mode(), &corners),
                name,
                positions,
                normals,
                tex_coords,
                material_index: primitive.material().index(),
                ..Default::default()
            });
        }
        primitives_of_mesh.push(indices);
    }

    let mut parents = vec![0usize; document.nodes().count()];
    for node in document.nodes() {
        let (translation, rotation, scale) = node.transform().decomposed();
        let children: Vec<usize> = node.children().map(|child| child.index()).collect();
        for &child in &children {
            parents[child] += 1;
        }
        scene.add_node(Node {
            name: node
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("node{}", node.index())),
            mesh_indices: node
                .mesh()
                .and_then(|mesh| primitives_of_mesh.get(mesh.index()).cloned())
                .unwrap_or_default(),
            children,
            transform: Instance::from_decomposed(translation, rotation, scale),
        });
    }
    if let Some(node) = parents.iter().position(|&count| count > 1) {
        return Err(ImportError::scene_load(
            path,
            format!("node {node} has more than one parent"),
        ));
    }

    let roots: Vec<usize> = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .map(|gltf_scene| gltf_scene.nodes().map(|node| node.index()).collect())
        .unwrap_or_default();
    if let Some(node) = roots.iter().find(|&&root| parents[root] > 0) {
        return Err(ImportError::scene_load(
            path,
            format!("scene root {node} is also a child of another node"),
        ));
    }

    scene.root = match roots.as_slice() {
        [] => None,
        [root] => Some(*root),
        _ => {
            let mut root = Node::new("root");
            root.children = roots;
            Some(scene.add_node(root))
        }
    };
    Ok(scene)
}

fn convert_material(material: ::gltf::Material) -> Material {
    let mut converted = Material::new(material.name().unwrap_or_default());
    let base_color = material
        .pbr_metallic_roughness()
        .base_color_texture()
        .map(|info| info.texture());
    let normals = material.normal_texture().map(|info| info.texture());
    for (ty, texture) in [(TextureType::Diffuse, base_color), (TextureType::Normals, normals)] {
        let Some(texture) = texture else {
            continue;
        };
        match texture.source().source() {
            Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                converted = converted.with_texture(ty, decode_uri(uri));
            }
            _ => log::debug!(
                "Material {:?}: embedded {ty:?} image has no file path, skipping.",
                converted.name
            ),
        }
    }
    converted
}

/// Image URIs are percent-encoded references, the file on disk is not.
fn decode_uri(uri: &str) -> String {
    match urlencoding::decode(uri) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            log::warn!("Image URI {uri:?} does not decode to UTF-8 ({e}), using it verbatim.");
            uri.to_owned()
        }
    }
}

/// Attributes that do not cover every position are dropped rather than misaligned.
fn matching<T>(mesh: &str, what: &str, count: usize, values: Vec<T>) -> Vec<T> {
    if values.is_empty() || values.len() == count {
        return values;
    }
    log::warn!(
        "Mesh {mesh:?}: {} {what} for {count} positions, ignoring them.",
        values.len()
    );
    Vec::new()
}

fn faces_for_mode(mesh: &str, mode: Mode, corners: &[u32]) -> Vec<Face> {
    match mode {
        Mode::Triangles => corners
            .chunks(3)
            .map(|c| Face {
                indices: c.to_vec(),
            })
            .collect(),
        // every second triangle is flipped to keep the winding
        Mode::TriangleStrip => corners
            .windows(3)
            .enumerate()
            .map(|(i, c)| match i % 2 {
                0 => Face::from([c[0], c[1], c[2]]),
                _ => Face::from([c[1], c[0], c[2]]),
            })
            .collect(),
        Mode::TriangleFan => match corners.split_first() {
            Some((&hub, rest)) => rest
                .windows(2)
                .map(|pair| Face::from([hub, pair[0], pair[1]]))
                .collect(),
            None => Vec::new(),
        },
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip => {
            log::warn!("Mesh {mesh:?}: {mode:?} primitives carry no triangles, skipping faces.");
            Vec::new()
        }
    }
}
