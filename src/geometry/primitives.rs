// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Watertight primitive meshes
//!
//! Fixture geometry for consumers and tests: every primitive is closed,
//! manifold, and wound counter-clockwise viewed from outside.

use ahash::AHashMap;
use nalgebra::{Point3, Vector3};

use crate::model::{Mesh, Triangle};

/// Axis-aligned box with the given full extents. `centered` places the box
/// around the origin, otherwise its min corner sits at the origin.
pub fn cuboid(extents: Vector3<f64>, centered: bool) -> Mesh {
    let h = extents / 2.0;
    let offset = if centered { Vector3::zeros() } else { h };

    let mut mesh = Mesh::with_capacity(8, 12);
    for &(x, y, z) in &[
        (-h.x, -h.y, -h.z),
        (h.x, -h.y, -h.z),
        (h.x, h.y, -h.z),
        (-h.x, h.y, -h.z),
        (-h.x, -h.y, h.z),
        (h.x, -h.y, h.z),
        (h.x, h.y, h.z),
        (-h.x, h.y, h.z),
    ] {
        mesh.add_vertex(Point3::new(x, y, z) + offset);
    }

    for indices in [
        [0, 2, 1],
        [0, 3, 2], // bottom
        [4, 5, 6],
        [4, 6, 7], // top
        [0, 1, 5],
        [0, 5, 4], // front
        [3, 7, 6],
        [3, 6, 2], // back
        [0, 4, 7],
        [0, 7, 3], // left
        [1, 2, 6],
        [1, 6, 5], // right
    ] {
        mesh.add_face(Triangle::new(indices));
    }
    mesh
}

/// Unit icosahedron subdivided `subdivisions` times, scaled to `radius`,
/// centered at the origin.
pub fn icosphere(radius: f64, subdivisions: u32) -> Mesh {
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;

    let mut vertices: Vec<Point3<f64>> = [
        (-1.0, phi, 0.0),
        (1.0, phi, 0.0),
        (-1.0, -phi, 0.0),
        (1.0, -phi, 0.0),
        (0.0, -1.0, phi),
        (0.0, 1.0, phi),
        (0.0, -1.0, -phi),
        (0.0, 1.0, -phi),
        (phi, 0.0, -1.0),
        (phi, 0.0, 1.0),
        (-phi, 0.0, -1.0),
        (-phi, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Point3::from(Vector3::new(x, y, z).normalize() * radius))
    .collect();

    let mut faces: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: AHashMap<(usize, usize), usize> = AHashMap::new();
        let mut next_faces = Vec::with_capacity(faces.len() * 4);

        let mut midpoint = |a: usize, b: usize, vertices: &mut Vec<Point3<f64>>| -> usize {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let mid = (vertices[a].coords + vertices[b].coords) / 2.0;
                let index = vertices.len();
                vertices.push(Point3::from(mid.normalize() * radius));
                index
            })
        };

        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            next_faces.push([a, ab, ca]);
            next_faces.push([b, bc, ab]);
            next_faces.push([c, ca, bc]);
            next_faces.push([ab, bc, ca]);
        }
        faces = next_faces;
    }

    let mut mesh = Mesh::with_capacity(vertices.len(), faces.len());
    mesh.vertices = vertices;
    mesh.faces = faces.into_iter().map(Triangle::new).collect();
    mesh
}

/// Capped cylinder of the given radius and height, centered at the origin,
/// axis along +Z, with `stacks` subdivisions along the height.
pub fn cylinder(radius: f64, height: f64, segments: usize, stacks: usize) -> Mesh {
    let segments = segments.max(3);
    let stacks = stacks.max(1);
    let h = height / 2.0;

    let mut mesh = Mesh::with_capacity((stacks + 1) * segments + 2, 4 * segments * stacks);
    for ring in 0..=stacks {
        let ring_z = -h + height * ring as f64 / stacks as f64;
        for i in 0..segments {
            let angle = std::f64::consts::TAU * i as f64 / segments as f64;
            mesh.add_vertex(Point3::new(
                radius * angle.cos(),
                radius * angle.sin(),
                ring_z,
            ));
        }
    }
    let bottom_center = mesh.add_vertex(Point3::new(0.0, 0.0, -h));
    let top_center = mesh.add_vertex(Point3::new(0.0, 0.0, h));

    for ring in 0..stacks {
        for i in 0..segments {
            let next = (i + 1) % segments;
            let (b0, b1) = (ring * segments + i, ring * segments + next);
            let (t0, t1) = ((ring + 1) * segments + i, (ring + 1) * segments + next);

            mesh.add_face(Triangle::new([b0, b1, t1]));
            mesh.add_face(Triangle::new([b0, t1, t0]));
        }
    }

    let top_ring = stacks * segments;
    for i in 0..segments {
        let next = (i + 1) % segments;
        mesh.add_face(Triangle::new([bottom_center, next, i]));
        mesh.add_face(Triangle::new([top_center, top_ring + i, top_ring + next]));
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::TopologyGraph;
    use approx::assert_relative_eq;

    fn assert_watertight(mesh: &Mesh) {
        mesh.validate().unwrap();
        let graph = TopologyGraph::build(&mesh.faces);
        assert!(graph.boundary_loops().unwrap().is_empty());
    }

    #[test]
    fn test_cuboid_watertight() {
        assert_watertight(&cuboid(Vector3::new(2.0, 1.0, 3.0), true));
        assert_watertight(&cuboid(Vector3::new(1.0, 1.0, 1.0), false));
    }

    #[test]
    fn test_icosphere_watertight_and_on_radius() {
        let sphere = icosphere(2.0, 2);
        assert_watertight(&sphere);
        for vertex in &sphere.vertices {
            assert_relative_eq!(vertex.coords.norm(), 2.0, epsilon = 1e-12);
        }
        // 20 * 4^2 faces after two subdivisions.
        assert_eq!(sphere.face_count(), 320);
    }

    #[test]
    fn test_cylinder_watertight() {
        assert_watertight(&cylinder(0.5, 2.0, 12, 4));
    }

    #[test]
    fn test_outward_winding() {
        // Every face normal of a centered convex solid points away from the
        // origin.
        for mesh in [
            cuboid(Vector3::new(1.0, 2.0, 3.0), true),
            icosphere(1.0, 1),
            cylinder(1.0, 2.0, 8, 2),
        ] {
            for face in &mesh.faces {
                let normal = mesh.face_normal_raw(face);
                let center = (mesh.vertices[face.indices[0]].coords
                    + mesh.vertices[face.indices[1]].coords
                    + mesh.vertices[face.indices[2]].coords)
                    / 3.0;
                assert!(normal.dot(&center) > 0.0);
            }
        }
    }
}
