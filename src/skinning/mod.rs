// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Harmonic skin-weight solver
//!
//! Computes a per-vertex distribution of weights over bones that decays with
//! intrinsic surface distance rather than straight-line distance. One policy
//! is shipped: the local free/fixed partition. Per bone, vertices anchored to
//! that bone are held at weight 1, vertices anchored to a non-adjacent bone at
//! 0, and vertices anchored to an adjacent bone (one sharing a joint) are
//! solved for through a cotangent-Laplacian system. Weights are indexed per
//! bone. Raw fields are returned unnormalized; normalization belongs to the
//! render builder.

mod laplacian;

pub use laplacian::{cotangent_weights, edge_key};

use ahash::AHashSet;
use log::debug;
use nalgebra::DVector;
use rayon::prelude::*;

use crate::error::{Result, SurgeryError};
use crate::model::{Mesh, SkinBinding, Skeleton};
use crate::solver::SparseSystem;
use crate::topology::TopologyGraph;

/// Diagonal regularization keeping assembled Laplacians positive definite.
const REGULARIZATION: f64 = 1e-9;

/// Weights below this threshold are dropped from the output bindings.
const WEIGHT_CUTOFF: f64 = 1e-6;

/// Compute raw (unnormalized) skin bindings for every vertex of `mesh`
/// against `skeleton`.
///
/// Entry conditions, validated before any solve: the skeleton has at least
/// one bone, no bone has zero length, the mesh surface is a single connected
/// component, and every bone is the nearest bone of at least one vertex.
/// Per-bone systems are independent and solved in parallel.
pub fn compute_skin_weights(mesh: &Mesh, skeleton: &Skeleton) -> Result<Vec<SkinBinding>> {
    mesh.validate()?;
    skeleton.validate()?;
    if mesh.faces.is_empty() {
        return Err(SurgeryError::EmptyMesh);
    }
    if skeleton.bones.is_empty() {
        return Err(SurgeryError::EmptySkeleton);
    }
    for bone in 0..skeleton.bone_count() {
        let (a, b) = skeleton.segment(bone);
        if (b - a).norm_squared() <= f64::EPSILON {
            return Err(SurgeryError::ZeroLengthBone { bone });
        }
    }

    let graph = TopologyGraph::build(&mesh.faces);
    check_connected(&graph)?;

    // Nearest bone per vertex.
    let anchors: Vec<usize> = mesh
        .vertices
        .iter()
        .map(|vertex| skeleton.nearest_bone(vertex))
        .collect::<Result<_>>()?;

    let mut anchor_counts = vec![0usize; skeleton.bone_count()];
    for &anchor in &anchors {
        anchor_counts[anchor] += 1;
    }
    if let Some(bone) = anchor_counts.iter().position(|&count| count == 0) {
        return Err(SurgeryError::UnreferencedBone { bone });
    }

    // Bones sharing a joint, excluding the bone itself.
    let adjacent: Vec<AHashSet<usize>> = (0..skeleton.bone_count())
        .map(|bone| {
            (0..skeleton.bone_count())
                .filter(|&other| {
                    other != bone && skeleton.bones[bone].shares_joint(&skeleton.bones[other])
                })
                .collect()
        })
        .collect();

    let weights = cotangent_weights(mesh);

    debug!(
        "skin solve: {} bones over {} vertices",
        skeleton.bone_count(),
        mesh.vertex_count()
    );

    let per_bone: Vec<Vec<(usize, f64)>> = (0..skeleton.bone_count())
        .into_par_iter()
        .map(|bone| {
            solve_bone_field(bone, mesh, &graph, &anchors, &adjacent[bone], &weights)
        })
        .collect::<Result<_>>()?;

    let mut per_vertex: Vec<Vec<(usize, f64)>> = vec![Vec::new(); mesh.vertex_count()];
    for (bone, field) in per_bone.into_iter().enumerate() {
        for (vertex, weight) in field {
            per_vertex[vertex].push((bone, weight));
        }
    }

    Ok(per_vertex
        .into_iter()
        .map(SkinBinding::from_weights)
        .collect())
}

fn check_connected(graph: &TopologyGraph) -> Result<()> {
    let Some(start) = graph.first_vertex() else {
        return Err(SurgeryError::EmptyMesh);
    };
    let reached = graph.expand_region(&[start], usize::MAX).interior.len();
    let total = graph.vertex_count();
    if reached < total {
        return Err(SurgeryError::DisconnectedMesh {
            unreached: total - reached,
        });
    }
    Ok(())
}

/// Held weight for `vertex` in `bone`'s system, or `None` when it is free.
fn held_weight(
    bone: usize,
    vertex: usize,
    graph: &TopologyGraph,
    anchors: &[usize],
    adjacent: &AHashSet<usize>,
) -> Option<f64> {
    let anchor = anchors[vertex];
    if anchor == bone {
        Some(1.0)
    } else if !graph.contains_vertex(vertex) || !adjacent.contains(&anchor) {
        // Off-surface vertices and vertices anchored to an unrelated bone are
        // never solved for.
        Some(0.0)
    } else {
        None
    }
}

fn solve_bone_field(
    bone: usize,
    mesh: &Mesh,
    graph: &TopologyGraph,
    anchors: &[usize],
    adjacent: &AHashSet<usize>,
    weights: &ahash::AHashMap<(usize, usize), f64>,
) -> Result<Vec<(usize, f64)>> {
    let vertex_count = mesh.vertex_count();

    let mut free: Vec<usize> = Vec::new();
    let mut row_of: Vec<Option<usize>> = vec![None; vertex_count];
    for vertex in 0..vertex_count {
        if held_weight(bone, vertex, graph, anchors, adjacent).is_none() {
            row_of[vertex] = Some(free.len());
            free.push(vertex);
        }
    }

    let mut field: Vec<(usize, f64)> = Vec::new();
    for vertex in 0..vertex_count {
        if let Some(weight) = held_weight(bone, vertex, graph, anchors, adjacent) {
            if weight > WEIGHT_CUTOFF {
                field.push((vertex, weight));
            }
        }
    }

    if free.is_empty() {
        return Ok(field);
    }

    let mut system = SparseSystem::new(free.len());
    let mut rhs = DVector::zeros(free.len());

    for (row, &vertex) in free.iter().enumerate() {
        let mut diagonal = REGULARIZATION;
        for &neighbor in graph.neighbors(vertex) {
            let weight = weights
                .get(&edge_key(vertex, neighbor))
                .copied()
                .unwrap_or(0.0);
            if weight <= 0.0 {
                continue;
            }
            diagonal += weight;
            match row_of[neighbor] {
                Some(col) => system.add(row, col, -weight),
                None => {
                    let held = held_weight(bone, neighbor, graph, anchors, adjacent)
                        .unwrap_or(0.0);
                    rhs[row] += weight * held;
                }
            }
        }
        system.add(row, row, diagonal);
    }

    let solution = system.solve(&[rhs], &format!("bone {bone}"))?;
    for (row, &vertex) in free.iter().enumerate() {
        let weight = solution[0][row].clamp(0.0, 1.0);
        if weight > WEIGHT_CUTOFF {
            field.push((vertex, weight));
        }
    }

    Ok(field)
}
