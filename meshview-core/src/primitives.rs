//! Generated geometry.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::mesh::Vertex;

/// A UV sphere centred on the origin with counter-clockwise outward-facing triangles.
///
/// `sectors` counts the slices around the Y axis and `stacks` the rings from pole to pole;
/// they are raised to 3 and 2 respectively.
pub fn sphere(radius: f32, sectors: u32, stacks: u32) -> (Vec<Vertex>, Vec<u32>) {
    let sectors = sectors.max(3);
    let stacks = stacks.max(2);

    let mut vertices = Vec::with_capacity(((sectors + 1) * (stacks + 1)) as usize);
    for stack in 0..=stacks {
        let v = stack as f32 / stacks as f32;
        let phi = PI / 2.0 - v * PI;
        for sector in 0..=sectors {
            let u = sector as f32 / sectors as f32;
            let theta = u * 2.0 * PI;
            let normal = Vec3::new(phi.cos() * theta.sin(), phi.sin(), phi.cos() * theta.cos());
            vertices.push(Vertex::new(normal * radius, normal, Vec2::new(u, 1.0 - v)));
        }
    }

    let mut indices = Vec::with_capacity((sectors * stacks * 6) as usize);
    let row = sectors + 1;
    for stack in 0..stacks {
        for sector in 0..sectors {
            let top = stack * row + sector;
            let bottom = top + row;
            if stack != 0 {
                indices.extend([top, bottom, top + 1]);
            }
            if stack != stacks - 1 {
                indices.extend([top + 1, bottom, bottom + 1]);
            }
        }
    }

    (vertices, indices)
}

/// An axis-aligned cube of edge `size` centred on the origin, with four vertices per face so
/// every face gets a flat normal.
pub fn cube(size: f32) -> (Vec<Vertex>, Vec<u32>) {
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let half = size / 2.0;

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, right, up) in FACES {
        let base = vertices.len() as u32;
        for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let position = (normal + right * (u * 2.0 - 1.0) + up * (v * 2.0 - 1.0)) * half;
            vertices.push(Vertex::new(position, normal, Vec2::new(u, v)));
        }
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(vertices: &[Vertex], tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from(vertices[i as usize].position);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]))
    }

    #[test]
    fn sphere_vertices_lie_on_the_surface() {
        let (vertices, indices) = sphere(2.0, 16, 8);
        assert_eq!(vertices.len(), 17 * 9);
        // Pole rows contribute one triangle per sector, the others two.
        assert_eq!(indices.len(), (16 * 8 * 2 - 2 * 16) * 3);
        for v in &vertices {
            assert!((Vec3::from(v.position).length() - 2.0).abs() < 1e-4);
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-4);
        }
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn sphere_triangles_face_outwards() {
        let (vertices, indices) = sphere(1.0, 8, 6);
        for tri in indices.chunks(3) {
            let centre: Vec3 = tri
                .iter()
                .map(|&i| Vec3::from(vertices[i as usize].position))
                .sum::<Vec3>()
                / 3.0;
            assert!(face_normal(&vertices, tri).dot(centre) > 0.0);
        }
    }

    #[test]
    fn cube_faces_are_flat_and_outward() {
        let (vertices, indices) = cube(2.0);
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        for v in &vertices {
            assert!(Vec3::from(v.position).abs().max_element() <= 1.0 + 1e-6);
        }
        for tri in indices.chunks(3) {
            let normal = Vec3::from(vertices[tri[0] as usize].normal);
            assert!(face_normal(&vertices, tri).normalize().abs_diff_eq(normal, 1e-5));
        }
    }
}
