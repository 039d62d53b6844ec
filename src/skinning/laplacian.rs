// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cotangent edge weights
//!
//! Discrete surface Laplacian weighting: each mesh edge gets the average of
//! the cotangents of the angles opposite it in its incident triangles.
//! Negative averages (obtuse configurations) are clamped to zero so the
//! assembled systems stay positive definite under the usual diagonal
//! regularization.

use ahash::AHashMap;

use crate::model::Mesh;

/// Canonical undirected edge key.
pub fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Cotangent weight per undirected edge of `mesh`.
pub fn cotangent_weights(mesh: &Mesh) -> AHashMap<(usize, usize), f64> {
    let mut sums: AHashMap<(usize, usize), (f64, u32)> = AHashMap::new();

    for face in &mesh.faces {
        let [a, b, c] = face.indices;
        for (corner, e0, e1) in [(a, b, c), (b, c, a), (c, a, b)] {
            let u = mesh.vertices[e0] - mesh.vertices[corner];
            let v = mesh.vertices[e1] - mesh.vertices[corner];
            let cross = u.cross(&v).norm();
            if cross < 1e-12 {
                continue; // Degenerate corner contributes nothing
            }
            let cot = u.dot(&v) / cross;
            let entry = sums.entry(edge_key(e0, e1)).or_insert((0.0, 0));
            entry.0 += cot;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(key, (sum, count))| (key, (sum / f64::from(count)).max(0.0)))
        .collect()
}
