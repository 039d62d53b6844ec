// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plane cut engine
//!
//! Splits a skinned mesh by a plane into its connected pieces. Triangles
//! crossing the plane are subdivided along it; vertices born on the seam get
//! bindings interpolated linearly by edge parameter. Each call recomputes from
//! the untouched input, so a caller previewing sharpness values simply calls
//! again.

use ahash::{AHashMap, AHashSet};
use log::debug;

use crate::error::{Result, SurgeryError};
use crate::geometry::Plane;
use crate::model::{Mesh, SkinBinding, SkinnedMeshData, Triangle};
use crate::relax::relax_region;
use crate::topology::{connected_face_components, TopologyGraph};

/// Distances this close to the plane count as on it.
const ON_PLANE_EPS: f64 = 1e-9;

/// Triangles thinner than this are discarded after splitting.
const DEGENERATE_AREA: f64 = 1e-12;

/// Cut `data` by `plane` into connected pieces, one snapshot per piece.
///
/// Pieces on the positive side of the plane come first, each side ordered by
/// discovery over ascending face indices. `sharpness` in [0, 1] shapes the
/// seam: 1 leaves a crisp planar edge, lower values relax the seam region and
/// blend positions toward the relaxed solution.
pub fn cut(data: &SkinnedMeshData, plane: &Plane, sharpness: f64) -> Result<Vec<SkinnedMeshData>> {
    data.validate()?;
    if data.mesh.faces.is_empty() {
        return Err(SurgeryError::EmptyMesh);
    }
    if !sharpness.is_finite() || !(0.0..=1.0).contains(&sharpness) {
        return Err(SurgeryError::ParameterOutOfRange {
            name: "sharpness",
            value: sharpness,
        });
    }

    let mut splitter = Splitter::new(data, plane);
    for face in &data.mesh.faces {
        splitter.split_face(face);
    }

    let Splitter {
        vertices,
        bindings,
        positive,
        negative,
        seam,
        ..
    } = splitter;

    debug!(
        "cut: {} positive / {} negative faces, {} seam vertices",
        positive.len(),
        negative.len(),
        seam.len()
    );

    let mut pieces = Vec::new();
    for side_faces in [&positive, &negative] {
        for component in connected_face_components(side_faces) {
            let piece = extract_piece(
                side_faces,
                &component,
                &vertices,
                &bindings,
                &seam,
                &data.skeleton,
                sharpness,
            )?;
            pieces.push(piece);
        }
    }

    Ok(pieces)
}

struct Splitter {
    vertices: Vec<nalgebra::Point3<f64>>,
    bindings: Vec<SkinBinding>,
    distances: Vec<f64>,
    edge_points: AHashMap<(usize, usize), usize>,
    positive: Vec<Triangle>,
    negative: Vec<Triangle>,
    seam: AHashSet<usize>,
}

impl Splitter {
    fn new(data: &SkinnedMeshData, plane: &Plane) -> Self {
        let vertices = data.mesh.vertices.clone();
        let distances = vertices.iter().map(|v| plane.signed_distance(v)).collect();
        Self {
            vertices,
            bindings: data.bindings.clone(),
            distances,
            edge_points: AHashMap::new(),
            positive: Vec::with_capacity(data.mesh.face_count()),
            negative: Vec::new(),
            seam: AHashSet::new(),
        }
    }

    fn sign(&self, vertex: usize) -> i8 {
        let d = self.distances[vertex];
        if d.abs() < ON_PLANE_EPS {
            0
        } else if d > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Interpolated vertex where edge (a, b) crosses the plane, deduplicated
    /// per undirected edge.
    fn edge_point(&mut self, a: usize, b: usize) -> usize {
        let key = (a.min(b), a.max(b));
        if let Some(&index) = self.edge_points.get(&key) {
            return index;
        }
        let (lo, hi) = key;
        let t = self.distances[lo] / (self.distances[lo] - self.distances[hi]);
        let position = self.vertices[lo] + (self.vertices[hi] - self.vertices[lo]) * t;
        let binding = SkinBinding::lerp(&self.bindings[lo], &self.bindings[hi], t);

        let index = self.vertices.len();
        self.vertices.push(position);
        self.bindings.push(binding);
        self.distances.push(0.0);
        self.edge_points.insert(key, index);
        index
    }

    fn split_face(&mut self, face: &Triangle) {
        let signs = [
            self.sign(face.indices[0]),
            self.sign(face.indices[1]),
            self.sign(face.indices[2]),
        ];
        let has_pos = signs.iter().any(|&s| s > 0);
        let has_neg = signs.iter().any(|&s| s < 0);

        if !(has_pos && has_neg) {
            // Fully coplanar faces land on the positive side.
            if has_neg {
                self.negative.push(*face);
            } else {
                self.positive.push(*face);
            }
            for (&index, &sign) in face.indices.iter().zip(&signs) {
                if sign == 0 && has_pos != has_neg {
                    self.seam.insert(index);
                }
            }
            return;
        }

        let mut pos_poly: Vec<usize> = Vec::with_capacity(4);
        let mut neg_poly: Vec<usize> = Vec::with_capacity(4);

        for i in 0..3 {
            let current = face.indices[i];
            let next = face.indices[(i + 1) % 3];
            let sc = self.sign(current);
            let sn = self.sign(next);

            if sc >= 0 {
                pos_poly.push(current);
            }
            if sc <= 0 {
                neg_poly.push(current);
            }
            if sc == 0 {
                self.seam.insert(current);
            }
            if sc as i32 * sn as i32 == -1 {
                let mid = self.edge_point(current, next);
                pos_poly.push(mid);
                neg_poly.push(mid);
                self.seam.insert(mid);
            }
        }

        self.fan_into(&pos_poly, true);
        self.fan_into(&neg_poly, false);
    }

    fn fan_into(&mut self, polygon: &[usize], positive: bool) {
        for i in 1..polygon.len().saturating_sub(1) {
            let triangle = Triangle::new([polygon[0], polygon[i], polygon[i + 1]]);
            if self.triangle_area(&triangle) < DEGENERATE_AREA {
                continue;
            }
            if positive {
                self.positive.push(triangle);
            } else {
                self.negative.push(triangle);
            }
        }
    }

    fn triangle_area(&self, triangle: &Triangle) -> f64 {
        let [a, b, c] = triangle.indices;
        let ab = self.vertices[b] - self.vertices[a];
        let ac = self.vertices[c] - self.vertices[a];
        ab.cross(&ac).norm() / 2.0
    }
}

#[allow(clippy::too_many_arguments)]
fn extract_piece(
    side_faces: &[Triangle],
    component: &[usize],
    vertices: &[nalgebra::Point3<f64>],
    bindings: &[SkinBinding],
    seam: &AHashSet<usize>,
    skeleton: &crate::model::Skeleton,
    sharpness: f64,
) -> Result<SkinnedMeshData> {
    // Compact vertices preserving ascending original order, so an untouched
    // input comes back geometrically identical.
    let mut used: Vec<usize> = component
        .iter()
        .flat_map(|&i| side_faces[i].indices)
        .collect();
    used.sort_unstable();
    used.dedup();

    let mut local_of: AHashMap<usize, usize> = AHashMap::with_capacity(used.len());
    for (local, &global) in used.iter().enumerate() {
        local_of.insert(global, local);
    }

    let mut mesh = Mesh::with_capacity(used.len(), component.len());
    mesh.vertices = used.iter().map(|&global| vertices[global]).collect();
    mesh.faces = component
        .iter()
        .map(|&i| {
            let [a, b, c] = side_faces[i].indices;
            Triangle::new([local_of[&a], local_of[&b], local_of[&c]])
        })
        .collect();

    let piece_bindings: Vec<SkinBinding> = used
        .iter()
        .map(|&global| bindings[global].normalized())
        .collect();

    if sharpness < 1.0 {
        let seeds: Vec<usize> = used
            .iter()
            .enumerate()
            .filter(|&(_, global)| seam.contains(global))
            .map(|(local, _)| local)
            .collect();
        if !seeds.is_empty() {
            let graph = TopologyGraph::build(&mesh.faces);
            let layers = (2.0 * (1.0 - sharpness)).ceil() as usize;
            relax_region(
                &mut mesh.vertices,
                &graph,
                &seeds,
                layers,
                1.0 - sharpness,
                "cut seam",
            )?;
        }
    }

    Ok(SkinnedMeshData::new(mesh, skeleton.clone(), piece_bindings))
}
