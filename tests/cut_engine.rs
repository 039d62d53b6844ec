// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cut engine scenarios

use approx::assert_relative_eq;
use meshsurgeon::geometry::{primitives, Plane};
use meshsurgeon::{cut, Bone, SkinBinding, Skeleton, SkinnedMeshData, TopologyGraph};
use nalgebra::{Point3, Vector3};

fn skinned_icosphere(subdivisions: u32) -> SkinnedMeshData {
    let mesh = primitives::icosphere(1.0, subdivisions);
    let skeleton = Skeleton {
        joints: vec![
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
        bones: vec![Bone::new(0, 1), Bone::new(1, 2)],
    };
    let bindings = vec![SkinBinding::default(); mesh.vertex_count()];
    SkinnedMeshData::new(mesh, skeleton, bindings)
}

fn assert_weight_invariant(data: &SkinnedMeshData) {
    assert_eq!(data.bindings.len(), data.mesh.vertex_count());
    for binding in &data.bindings {
        assert_relative_eq!(binding.weight_sum(), 1.0, epsilon = 1e-6);
        assert!(binding.iter().all(|(_, w)| w >= 0.0));
    }
}

#[test]
fn test_non_intersecting_plane_is_identity() {
    let data = skinned_icosphere(2);
    // Well outside the unit sphere's bounding volume.
    let plane = Plane::new(Vector3::z(), 5.0).unwrap();

    let pieces = cut(&data, &plane, 1.0).unwrap();
    assert_eq!(pieces.len(), 1);

    let piece = &pieces[0];
    assert_eq!(piece.mesh.vertex_count(), data.mesh.vertex_count());
    assert_eq!(piece.mesh.face_count(), data.mesh.face_count());
    for (out, orig) in piece.mesh.vertices.iter().zip(&data.mesh.vertices) {
        assert!((out - orig).norm() < 1e-6);
    }
    assert_weight_invariant(piece);
}

#[test]
fn test_equator_cut_returns_two_pieces() {
    let data = skinned_icosphere(2);
    let plane = Plane::new(Vector3::z(), 0.0).unwrap();

    let pieces = cut(&data, &plane, 1.0).unwrap();
    assert_eq!(pieces.len(), 2);

    for piece in &pieces {
        piece.validate().unwrap();
        assert_weight_invariant(piece);

        // Each half is a manifold with exactly one boundary loop, the seam.
        let graph = TopologyGraph::build(&piece.mesh.faces);
        let loops = graph.boundary_loops().unwrap();
        assert_eq!(loops.len(), 1);
        for &vertex in &loops[0] {
            assert!(plane.signed_distance(&piece.mesh.vertices[vertex]).abs() < 1e-9);
        }
    }

    // The two halves land on opposite sides.
    let sides: Vec<f64> = pieces
        .iter()
        .map(|p| p.mesh.centroid().z)
        .collect();
    assert!(sides[0] > 0.0 && sides[1] < 0.0);
}

#[test]
fn test_cut_is_pure_and_repeatable() {
    let data = skinned_icosphere(1);
    let before = data.mesh.vertices.clone();
    let plane = Plane::new(Vector3::new(1.0, 1.0, 0.0), 0.2).unwrap();

    let first = cut(&data, &plane, 1.0).unwrap();
    let second = cut(&data, &plane, 1.0).unwrap();

    // Input untouched, outputs identical.
    assert_eq!(data.mesh.vertices, before);
    assert_eq!(first.len(), second.len());
    for (p1, p2) in first.iter().zip(&second) {
        assert_eq!(p1.mesh.vertices, p2.mesh.vertices);
        assert_eq!(p1.mesh.faces.len(), p2.mesh.faces.len());
    }
}

#[test]
fn test_soft_seam_keeps_topology_and_moves_seam() {
    let data = skinned_icosphere(2);
    let plane = Plane::new(Vector3::z(), 0.0).unwrap();

    let crisp = cut(&data, &plane, 1.0).unwrap();
    let soft = cut(&data, &plane, 0.0).unwrap();
    assert_eq!(crisp.len(), soft.len());

    // Same connectivity either way; sharpness only reshapes positions.
    for (c, s) in crisp.iter().zip(&soft) {
        assert_eq!(c.mesh.vertex_count(), s.mesh.vertex_count());
        assert_eq!(c.mesh.face_count(), s.mesh.face_count());
        assert_weight_invariant(s);
    }

    // Sharpness 0 must actually move geometry relative to the crisp cut.
    let crisp_positions: Vec<Point3<f64>> = crisp
        .iter()
        .flat_map(|p| p.mesh.vertices.iter().copied())
        .collect();
    let soft_positions: Vec<Point3<f64>> = soft
        .iter()
        .flat_map(|p| p.mesh.vertices.iter().copied())
        .collect();
    let moved = crisp_positions
        .iter()
        .zip(&soft_positions)
        .any(|(a, b)| (a - b).norm() > 1e-9);
    assert!(moved);
}

#[test]
fn test_cut_off_center_keeps_all_surface_area_split() {
    // Cutting a cuboid off-center still yields exactly two boxes' worth of
    // faces, every face on a consistent side.
    let mesh = primitives::cuboid(Vector3::new(2.0, 2.0, 2.0), true);
    let bindings = vec![SkinBinding::default(); mesh.vertex_count()];
    let data = SkinnedMeshData::new(mesh, Skeleton::new(), bindings);
    let plane = Plane::new(Vector3::x(), 0.5).unwrap();

    let pieces = cut(&data, &plane, 1.0).unwrap();
    assert_eq!(pieces.len(), 2);
    for piece in &pieces {
        for face in &piece.mesh.faces {
            let centroid = (piece.mesh.vertices[face.indices[0]].coords
                + piece.mesh.vertices[face.indices[1]].coords
                + piece.mesh.vertices[face.indices[2]].coords)
                / 3.0;
            let side = plane.signed_distance(&Point3::from(centroid));
            // Faces sit on one side (seam faces touch the plane itself).
            assert!(side.abs() < 1e-9 || side.signum() == pieces_side(piece, &plane));
        }
    }
}

fn pieces_side(piece: &SkinnedMeshData, plane: &Plane) -> f64 {
    plane.signed_distance(&piece.mesh.centroid()).signum()
}
