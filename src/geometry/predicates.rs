// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Point-in-mesh predicate
//!
//! Ray-parity containment against a closed (watertight) mesh. Behavior on
//! open or non-manifold meshes is undefined: the caller owns that obligation,
//! it is not detected or silently handled here.

use nalgebra::{Point3, Vector3};

use crate::model::Mesh;

const EPS: f64 = 1e-9;

/// Test whether `point` lies inside the watertight `mesh`.
///
/// Casts a ray in the fixed direction normalize((1, 1, 1)) and counts
/// ray-triangle intersections over all faces; the point is interior iff the
/// count is odd.
pub fn point_in_mesh(point: &Point3<f64>, mesh: &Mesh) -> bool {
    let ray_dir = Vector3::new(1.0, 1.0, 1.0).normalize();
    let mut intersection_count = 0;

    for face in &mesh.faces {
        let v0 = &mesh.vertices[face.indices[0]];
        let v1 = &mesh.vertices[face.indices[1]];
        let v2 = &mesh.vertices[face.indices[2]];

        if ray_intersects_triangle(point, &ray_dir, v0, v1, v2) {
            intersection_count += 1;
        }
    }

    intersection_count % 2 == 1
}

/// Möller–Trumbore ray-triangle intersection, forward hits only.
pub fn ray_intersects_triangle(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    v0: &Point3<f64>,
    v1: &Point3<f64>,
    v2: &Point3<f64>,
) -> bool {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < EPS {
        return false; // Ray parallel to triangle
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    let t = f * edge2.dot(&q);
    t > EPS // Only count forward intersections
}
