//! Geometry clean-up applied between parsing and importing.

use anyhow::ensure;
use cgmath::{InnerSpace, Vector2, Vector3, Zero};

use crate::data_structures::scene::{Face, Scene, SourceMesh, UvOrigin};

/// Which clean-up steps [`PostProcess::apply`] runs.
///
/// Steps always run in the same order: triangulate, validate, generate normals, flip UVs,
/// generate tangents. Validation can not be switched off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostProcess {
    pub triangulate: bool,
    /// Only touches meshes that come without normals.
    pub gen_smooth_normals: bool,
    pub calc_tangent_space: bool,
    /// Only touches scenes whose format puts the UV origin bottom-left.
    pub flip_uvs: bool,
}

impl PostProcess {
    pub const ALL: Self = Self {
        triangulate: true,
        gen_smooth_normals: true,
        calc_tangent_space: true,
        flip_uvs: true,
    };

    pub const NONE: Self = Self {
        triangulate: false,
        gen_smooth_normals: false,
        calc_tangent_space: false,
        flip_uvs: false,
    };

    pub fn apply(&self, scene: &mut Scene) -> anyhow::Result<()> {
        for mesh in &mut scene.meshes {
            if self.triangulate {
                triangulate(mesh);
            }
            validate(mesh)?;
            if self.gen_smooth_normals && !mesh.has_normals() {
                gen_smooth_normals(mesh);
            }
        }
        if self.flip_uvs && scene.uv_origin == UvOrigin::BottomLeft {
            scene.meshes.iter_mut().for_each(flip_uvs);
            scene.uv_origin = UvOrigin::TopLeft;
        }
        if self.calc_tangent_space {
            scene.meshes.iter_mut().for_each(calc_tangent_space);
        }
        Ok(())
    }
}

impl Default for PostProcess {
    fn default() -> Self {
        Self::ALL
    }
}

/// Splits polygons into triangle fans and drops faces with fewer than three corners.
pub fn triangulate(mesh: &mut SourceMesh) {
    let mut dropped = 0;
    let faces = std::mem::take(&mut mesh.faces);
    for face in faces {
        match face.indices.len() {
            0..=2 => dropped += 1,
            3 => mesh.faces.push(face),
            _ => {
                let first = face.indices[0];
                for pair in face.indices[1..].windows(2) {
                    mesh.faces.push(Face::from([first, pair[0], pair[1]]));
                }
            }
        }
    }
    if dropped > 0 {
        log::warn!(
            "Mesh {:?}: dropped {dropped} faces with fewer than three corners.",
            mesh.name
        );
    }
}

/// Every face index must name an existing vertex.
pub fn validate(mesh: &SourceMesh) -> anyhow::Result<()> {
    let count = mesh.vertex_count();
    for (face_idx, face) in mesh.faces.iter().enumerate() {
        for &index in &face.indices {
            ensure!(
                (index as usize) < count,
                "mesh {:?}: face {face_idx} references vertex {index} but the mesh has {count} vertices",
                mesh.name
            );
        }
    }
    Ok(())
}

/// Per-vertex normals from the sum of adjacent face normals.
///
/// Face normals are left unnormalised before summing so bigger faces weigh more. Expects a
/// mesh that passed [`validate`].
pub fn gen_smooth_normals(mesh: &mut SourceMesh) {
    let mut normals = vec![Vector3::zero(); mesh.vertex_count()];
    for face in &mesh.faces {
        let Some((&first, rest)) = face.indices.split_first() else {
            continue;
        };
        for pair in rest.windows(2) {
            let corners = [first, pair[0], pair[1]].map(|i| i as usize);
            let [p0, p1, p2] = corners.map(|i| Vector3::from(mesh.positions[i]));
            let face_normal = (p1 - p0).cross(p2 - p0);
            for i in corners {
                normals[i] += face_normal;
            }
        }
    }
    mesh.normals = normals
        .into_iter()
        .map(|n| {
            if n.magnitude2() > f32::EPSILON {
                n.normalize().into()
            } else {
                [0.0; 3]
            }
        })
        .collect();
}

/// `v = 1 - v` on every channel.
pub fn flip_uvs(mesh: &mut SourceMesh) {
    for channel in &mut mesh.tex_coords {
        for uv in channel {
            uv[1] = 1.0 - uv[1];
        }
    }
}

/**
 * Tangents and bitangents from the first UV channel, averaged over the triangles each
 * vertex belongs to. Meshes without UVs are left alone, triangles whose UVs have no area
 * contribute nothing.
 */
pub fn calc_tangent_space(mesh: &mut SourceMesh) {
    let Some(uvs) = mesh
        .tex_coords
        .first()
        .filter(|uvs| !uvs.is_empty() && uvs.len() == mesh.positions.len())
    else {
        return;
    };
    let count = mesh.vertex_count();
    let mut tangents = vec![Vector3::zero(); count];
    let mut bitangents = vec![Vector3::zero(); count];
    let mut triangles_included = vec![0u32; count];

    for face in &mesh.faces {
        let [i0, i1, i2] = match face.indices.as_slice() {
            &[a, b, c] => [a, b, c].map(|i| i as usize),
            _ => continue,
        };
        let pos0 = Vector3::from(mesh.positions[i0]);
        let pos1 = Vector3::from(mesh.positions[i1]);
        let pos2 = Vector3::from(mesh.positions[i2]);
        let uv0 = Vector2::from(uvs[i0]);
        let uv1 = Vector2::from(uvs[i1]);
        let uv2 = Vector2::from(uvs[i2]);

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        // delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // flipped for right-handed normal maps in wgpu's texture coordinate system
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
            triangles_included[i] += 1;
        }
    }

    let average = |sums: Vec<Vector3<f32>>| -> Vec<[f32; 3]> {
        sums.into_iter()
            .zip(&triangles_included)
            .map(|(sum, &n)| match n {
                0 => [0.0; 3],
                n => (sum / n as f32).into(),
            })
            .collect()
    };
    mesh.tangents = average(tangents);
    mesh.bitangents = average(bitangents);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> SourceMesh {
        SourceMesh {
            name: "quad".into(),
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            tex_coords: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
            faces: vec![Face {
                indices: vec![0, 1, 2, 3],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn polygons_become_fans() {
        let mut mesh = quad();
        mesh.faces.push(Face { indices: vec![0, 1] });
        triangulate(&mut mesh);
        assert_eq!(mesh.faces, [Face::from([0, 1, 2]), Face::from([0, 2, 3])]);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut mesh = quad();
        mesh.faces = vec![Face::from([0, 1, 4])];
        let err = validate(&mesh).unwrap_err();
        assert!(err.to_string().contains("vertex 4"), "{err}");
    }

    #[test]
    fn smooth_normals_face_the_winding() {
        let mut mesh = quad();
        triangulate(&mut mesh);
        gen_smooth_normals(&mut mesh);
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 4]);
    }

    #[test]
    fn unused_vertices_get_zero_normals() {
        let mut mesh = quad();
        mesh.positions.push([5.0, 5.0, 5.0]);
        triangulate(&mut mesh);
        gen_smooth_normals(&mut mesh);
        assert_eq!(mesh.normals[4], [0.0; 3]);
    }

    #[test]
    fn tangents_follow_u_and_bitangents_oppose_v() {
        let mut mesh = quad();
        triangulate(&mut mesh);
        calc_tangent_space(&mut mesh);
        for (tangent, bitangent) in mesh.tangents.iter().zip(&mesh.bitangents) {
            assert_eq!(*tangent, [1.0, 0.0, 0.0]);
            assert_eq!(*bitangent, [0.0, -1.0, 0.0]);
        }
    }

    #[test]
    fn degenerate_uvs_contribute_nothing() {
        let mut mesh = quad();
        mesh.tex_coords = vec![vec![[0.5, 0.5]; 4]];
        triangulate(&mut mesh);
        calc_tangent_space(&mut mesh);
        assert_eq!(mesh.tangents, vec![[0.0; 3]; 4]);
        assert!(mesh.tangents.iter().all(|t| t.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn no_uvs_no_tangents() {
        let mut mesh = quad();
        mesh.tex_coords.clear();
        calc_tangent_space(&mut mesh);
        assert!(!mesh.has_tangents());
    }

    #[test]
    fn only_bottom_left_scenes_are_flipped() {
        let mut scene = Scene::new(UvOrigin::TopLeft);
        scene.meshes.push(quad());
        PostProcess::ALL.apply(&mut scene).unwrap();
        assert_eq!(scene.meshes[0].tex_coords[0][0], [0.0, 0.0]);

        let mut scene = Scene::new(UvOrigin::BottomLeft);
        scene.meshes.push(quad());
        PostProcess::ALL.apply(&mut scene).unwrap();
        assert_eq!(scene.meshes[0].tex_coords[0][0], [0.0, 1.0]);
        assert_eq!(scene.uv_origin, UvOrigin::TopLeft);
    }

    #[test]
    fn disabled_steps_leave_the_mesh_alone() {
        let mut scene = Scene::new(UvOrigin::BottomLeft);
        scene.meshes.push(quad());
        PostProcess::NONE.apply(&mut scene).unwrap();
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.faces.len(), 1);
        assert!(!mesh.has_normals());
        assert!(!mesh.has_tangents());
        assert_eq!(mesh.tex_coords[0][0], [0.0, 0.0]);
    }
}
