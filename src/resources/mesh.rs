use cgmath::Vector3;

use crate::data_structures::model::ModelVertex;

/// CPU-side mesh: vertices plus a triangle-list index buffer.
///
/// Uploaded once into a [`GpuMesh`](crate::data_structures::model::GpuMesh)
/// and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /**
     * Builds a mesh from parallel per-corner arrays where every three consecutive
     * entries form one triangle. Missing texture coordinates or normals default to zero.
     */
    pub fn from_triangle_soup(
        positions: &[[f32; 3]],
        tex_coords: &[[f32; 2]],
        normals: &[[f32; 3]],
    ) -> Self {
        let corners = positions.len() - positions.len() % 3;
        let vertices: Vec<ModelVertex> = (0..corners)
            .map(|i| ModelVertex {
                position: positions[i],
                tex_coords: tex_coords.get(i).copied().unwrap_or([0.0; 2]),
                normal: normals.get(i).copied().unwrap_or([0.0; 3]),
            })
            .collect();
        let indices = (0..vertices.len() as u32).collect();
        Self { vertices, indices }
    }

    /// Merge all models of an OBJ file into one indexed mesh.
    pub fn from_obj_models(models: &[tobj::Model]) -> Self {
        let mut data = MeshData::default();
        for m in models {
            let base = data.vertices.len() as u32;
            data.vertices
                .extend((0..m.mesh.positions.len() / 3).map(|i| ModelVertex {
                    position: [
                        m.mesh.positions[i * 3],
                        m.mesh.positions[i * 3 + 1],
                        m.mesh.positions[i * 3 + 2],
                    ],
                    tex_coords: [
                        m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                        1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                    ],
                    normal: [
                        m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                    ],
                }));
            // The indices are for positions, texels, and normals because we set `single_index` to true
            data.indices
                .extend(m.mesh.indices.iter().map(|index| base + index));
        }
        data
    }

    /// Axis-aligned unit cube centred on the origin, one texture repeat per face.
    pub fn cube() -> Self {
        // (normal, u, v) with u x v == normal so every face winds counter-clockwise
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        const QUAD: [(f32, f32); 6] = [
            (-1.0, -1.0),
            (1.0, -1.0),
            (1.0, 1.0),
            (-1.0, -1.0),
            (1.0, 1.0),
            (-1.0, 1.0),
        ];

        let mut positions = Vec::with_capacity(36);
        let mut tex_coords = Vec::with_capacity(36);
        let mut normals = Vec::with_capacity(36);
        for (n, u, v) in FACES {
            let (n, u, v) = (Vector3::from(n), Vector3::from(u), Vector3::from(v));
            for (a, b) in QUAD {
                positions.push((n * 0.5 + u * (a * 0.5) + v * (b * 0.5)).into());
                tex_coords.push([(a + 1.0) * 0.5, 1.0 - (b + 1.0) * 0.5]);
                normals.push(n.into());
            }
        }
        Self::from_triangle_soup(&positions, &tex_coords, &normals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn triangle_soup_drops_incomplete_triangle() {
        let mesh = MeshData::from_triangle_soup(
            &[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0; 3]],
            &[],
            &[],
        );
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[1].tex_coords, [0.0; 2]);
    }

    #[test]
    fn cube_faces_wind_outwards() {
        let cube = MeshData::cube();
        assert_eq!(cube.indices.len(), 36);
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vector3::from(cube.vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a).normalize();
            let stored = Vector3::from(cube.vertices[tri[0] as usize].normal);
            assert!((face_normal - stored).magnitude() < 1e-5);
        }
        assert!(cube
            .vertices
            .iter()
            .all(|v| v.position.iter().all(|c| c.abs() == 0.5)));
    }
}
