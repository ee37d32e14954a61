use crate::data_structures::{
    model::{Geometry, ModelVertex},
    scene::SourceMesh,
};

/**
 * Flattens one scene mesh into interleaved vertices and a triangle-list index buffer.
 *
 * Every position becomes one vertex. Normals that are missing become zero and texture
 * coordinates fall back to `(0, 0)` when the mesh has no first UV channel, so the vertex
 * layout never changes. Face indices are appended face by face in their original winding.
 */
pub fn extract_geometry(mesh: &SourceMesh) -> Geometry {
    let uvs = mesh.tex_coords.first();
    let vertices = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, position)| ModelVertex {
            position: *position,
            normal: mesh.normals.get(i).copied().unwrap_or_default(),
            tex_coords: uvs.and_then(|uvs| uvs.get(i)).copied().unwrap_or_default(),
        })
        .collect();

    let indices = mesh
        .faces
        .iter()
        .flat_map(|face| face.indices.iter().copied())
        .collect();

    Geometry { vertices, indices }
}
