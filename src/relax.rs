// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Local Laplace relaxation
//!
//! Shared by the cut seam profile and the merge seam smoothing: expand a seed
//! set by a hop budget, hold the expansion boundary fixed, solve three
//! independent scalar Laplace systems (x, y, z) over the free interior, and
//! blend vertices toward the solution. A region whose expansion has no
//! boundary left to pin is skipped - there is nothing to anchor the system.

use log::debug;
use nalgebra::{DVector, Point3};

use crate::error::Result;
use crate::solver::SparseSystem;
use crate::topology::TopologyGraph;

const REGULARIZATION: f64 = 1e-9;

/// Relax `vertices` around `seeds`, expanded by `layers` hops over `graph`.
///
/// `factor` is clamped to [0, 1]; 0 leaves positions untouched. `system`
/// names the seam region for error reporting.
pub fn relax_region(
    vertices: &mut [Point3<f64>],
    graph: &TopologyGraph,
    seeds: &[usize],
    layers: usize,
    factor: f64,
    system: &str,
) -> Result<()> {
    let factor = factor.clamp(0.0, 1.0);
    if factor <= 0.0 || seeds.is_empty() {
        return Ok(());
    }

    let region = graph.expand_region(seeds, layers);
    if region.boundary.is_empty() {
        debug!("relaxation of {system} skipped: expansion has no fixed boundary");
        return Ok(());
    }

    let mut free: Vec<usize> = region
        .interior
        .iter()
        .filter(|v| !region.boundary.contains(v))
        .copied()
        .collect();
    free.sort_unstable();
    if free.is_empty() {
        return Ok(());
    }

    let mut row_of = vec![None; vertices.len()];
    for (row, &vertex) in free.iter().enumerate() {
        row_of[vertex] = Some(row);
    }

    // Uniform graph Laplacian: diagonal = degree, off-diagonal = -1; fixed
    // neighbors accumulate into the right-hand sides.
    let mut sys = SparseSystem::new(free.len());
    let mut rhs = [
        DVector::zeros(free.len()),
        DVector::zeros(free.len()),
        DVector::zeros(free.len()),
    ];

    for (row, &vertex) in free.iter().enumerate() {
        let neighbors = graph.neighbors(vertex);
        sys.add(row, row, neighbors.len() as f64 + REGULARIZATION);
        for &neighbor in neighbors {
            match row_of[neighbor] {
                Some(col) => sys.add(row, col, -1.0),
                None => {
                    let fixed = vertices[neighbor];
                    rhs[0][row] += fixed.x;
                    rhs[1][row] += fixed.y;
                    rhs[2][row] += fixed.z;
                }
            }
        }
    }

    let solution = sys.solve(&rhs, system)?;

    for (row, &vertex) in free.iter().enumerate() {
        let relaxed = Point3::new(solution[0][row], solution[1][row], solution[2][row]);
        vertices[vertex] += (relaxed - vertices[vertex]) * factor;
    }

    Ok(())
}
