use std::path::Path;

use crate::{
    data_structures::scene::{Face, Material, Node, Scene, SourceMesh, TextureType, UvOrigin},
    error::ImportError,
};

/**
 * Wavefront OBJ through tobj.
 *
 * The scene gets a mesh-less root named after the file and one child per object or group,
 * each carrying exactly one mesh. Faces are read as written so polygons and stray lines
 * reach post-processing untouched.
 */
pub(crate) fn load(path: &Path) -> Result<Scene, ImportError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: false,
            ..Default::default()
        },
    )
    .map_err(|e| ImportError::scene_load(path, e))?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!(
                "Material library of {} could not be loaded ({e}), meshes will be untextured.",
                path.display()
            );
            Vec::new()
        }
    };

    let mut scene = Scene::new(UvOrigin::BottomLeft);
    scene.materials = materials.into_iter().map(convert_material).collect();

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let root = scene.add_node(Node::new(stem));
    scene.root = Some(root);

    for model in models {
        let mesh = convert_mesh(model);
        let mut node = Node::new(mesh.name.clone());
        node.mesh_indices.push(scene.meshes.len());
        scene.meshes.push(mesh);
        let child = scene.add_node(node);
        scene.nodes[root].children.push(child);
    }
    Ok(scene)
}

fn convert_material(material: tobj::Material) -> Material {
    let slots = [
        (TextureType::Diffuse, material.diffuse_texture),
        (TextureType::Specular, material.specular_texture),
        (TextureType::Ambient, material.ambient_texture),
        (TextureType::Normals, material.normal_texture),
        (TextureType::Shininess, material.shininess_texture),
        (TextureType::Opacity, material.dissolve_texture),
    ];
    slots
        .into_iter()
        .filter_map(|(ty, map)| Some(ty).zip(map.as_deref().and_then(texture_file)))
        .fold(Material::new(material.name), |material, (ty, path)| {
            material.with_texture(ty, path)
        })
}

/// The file name of a `map_*` statement, without the leading `-option args` that tobj
/// leaves in place. Names containing spaces survive.
fn texture_file(map: &str) -> Option<String> {
    let mut tokens = map.split_whitespace().peekable();
    while let Some(option) = tokens.next_if(|token| token.starts_with('-')) {
        let (required, optional) = match option {
            "-mm" => (2, 0),
            // u [v [w]]
            "-o" | "-s" | "-t" => (1, 2),
            "-blendu" | "-blendv" | "-bm" | "-boost" | "-cc" | "-clamp" | "-imfchan"
            | "-texres" | "-type" => (1, 0),
            _ => {
                log::warn!("Unknown texture option {option:?} in {map:?}, skipping it.");
                (0, 0)
            }
        };
        for _ in 0..required {
            tokens.next();
        }
        for _ in 0..optional {
            tokens.next_if(|token| token.parse::<f32>().is_ok());
        }
    }
    let file = tokens.collect::<Vec<_>>().join(" ");
    (!file.is_empty()).then_some(file)
}

fn convert_mesh(model: tobj::Model) -> SourceMesh {
    let mesh = model.mesh;
    let tex_coords = if mesh.texcoords.is_empty() {
        Vec::new()
    } else {
        vec![mesh.texcoords.chunks_exact(2).map(|uv| [uv[0], uv[1]]).collect()]
    };

    SourceMesh {
        name: model.name,
        positions: triples(&mesh.positions),
        normals: triples(&mesh.normals),
        tex_coords,
        faces: faces(&mesh.indices, &mesh.face_arities),
        material_index: mesh.material_id,
        ..Default::default()
    }
}

fn triples(flat: &[f32]) -> Vec<[f32; 3]> {
    flat.chunks_exact(3).map(|v| [v[0], v[1], v[2]]).collect()
}

/// tobj leaves `face_arities` empty when every face is a triangle.
fn faces(indices: &[u32], arities: &[u32]) -> Vec<Face> {
    if arities.is_empty() {
        return indices
            .chunks(3)
            .map(|corners| Face {
                indices: corners.to_vec(),
            })
            .collect();
    }
    let mut faces = Vec::with_capacity(arities.len());
    let mut start = 0;
    for &arity in arities {
        let end = start + arity as usize;
        let Some(corners) = indices.get(start..end) else {
            log::warn!("Face arities run past the index list, ignoring the rest.");
            break;
        };
        faces.push(Face {
            indices: corners.to_vec(),
        });
        start = end;
    }
    faces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_arities_split_the_index_list() {
        let faces = faces(&[0, 1, 2, 3, 0, 2, 4, 5], &[4, 2, 2]);
        let arities: Vec<_> = faces.iter().map(|f| f.indices.len()).collect();
        assert_eq!(arities, [4, 2, 2]);
        assert_eq!(faces[1].indices, [0, 2]);
    }

    #[test]
    fn short_index_list_stops_early() {
        let faces = faces(&[0, 1, 2, 3], &[3, 3]);
        assert_eq!(faces, [Face::from([0, 1, 2])]);
    }

    #[test]
    fn texture_options_are_not_part_of_the_file_name() {
        assert_eq!(texture_file("wood.png").as_deref(), Some("wood.png"));
        assert_eq!(texture_file("-bm 1.0 wood.png").as_deref(), Some("wood.png"));
        assert_eq!(
            texture_file("-clamp on -o 0.5 0.5 -s 2 2 1 my wood.png").as_deref(),
            Some("my wood.png")
        );
        assert_eq!(texture_file("-mm 0 1 -blendu off a.png").as_deref(), Some("a.png"));
        assert_eq!(texture_file("-t 0.1 b.png").as_deref(), Some("b.png"));
        assert_eq!(texture_file("-bm 0.5"), None);
        assert_eq!(texture_file("  "), None);
    }

    #[test]
    fn empty_texture_names_are_not_slots() {
        let material = convert_material(tobj::Material {
            name: "crate".into(),
            diffuse_texture: Some("crate.png".into()),
            specular_texture: Some(String::new()),
            normal_texture: Some("crate_n.png".into()),
            ..Default::default()
        });
        assert_eq!(material.name, "crate");
        assert_eq!(material.texture_count(TextureType::Diffuse), 1);
        assert_eq!(material.texture_count(TextureType::Specular), 0);
        assert_eq!(material.texture_count(TextureType::Normals), 1);
    }
}
