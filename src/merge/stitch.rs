// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary-loop pairing and seam patch triangulation
//!
//! Each paired hole is closed by projecting both loops onto a shared best-fit
//! plane and ear-clipping the annulus between them: the loop with the larger
//! projected extent is the outer ring, the other the hole. The smaller loop is
//! scaled 1.5x in plane coordinates first - a triangulation bias heuristic
//! only, connectivity changes but positions never do.

use ahash::AHashSet;
use nalgebra::{Point2, Point3};

use crate::error::{Result, SurgeryError};
use crate::geometry::{signed_area, PlaneFrame};
use crate::model::Triangle;

/// Bias factor applied to the smaller loop's projected coordinates.
const SCALE_BIAS: f64 = 1.5;

/// Greedy nearest-centroid pairing. O(n^2) over loop counts, which stay
/// small. Both lists must have equal length (checked by the caller).
pub(crate) fn pair_loops(
    loops_a: &[Vec<usize>],
    loops_b: &[Vec<usize>],
    vertices: &[Point3<f64>],
) -> Vec<(usize, usize)> {
    let centroid = |indices: &[usize]| -> Point3<f64> {
        let sum: nalgebra::Vector3<f64> = indices.iter().map(|&i| vertices[i].coords).sum();
        Point3::from(sum / indices.len() as f64)
    };
    let centroids_a: Vec<Point3<f64>> = loops_a.iter().map(|l| centroid(l)).collect();
    let centroids_b: Vec<Point3<f64>> = loops_b.iter().map(|l| centroid(l)).collect();

    let mut unmatched_a: Vec<usize> = (0..loops_a.len()).collect();
    let mut unmatched_b: Vec<usize> = (0..loops_b.len()).collect();
    let mut pairs = Vec::with_capacity(loops_a.len());

    while !unmatched_a.is_empty() && !unmatched_b.is_empty() {
        let mut best = (0, 0);
        let mut best_dist = f64::INFINITY;
        for (ai, &la) in unmatched_a.iter().enumerate() {
            for (bi, &lb) in unmatched_b.iter().enumerate() {
                let dist = (centroids_a[la] - centroids_b[lb]).norm();
                if dist < best_dist {
                    best_dist = dist;
                    best = (ai, bi);
                }
            }
        }
        pairs.push((unmatched_a.remove(best.0), unmatched_b.remove(best.1)));
    }
    pairs
}

/// Triangulate the band between one loop from each source mesh.
///
/// The projected loops must wind in opposite directions (they bound the hole
/// from opposite sides); matching winding is a topology error. Returned
/// triangles use global vertex indices and are oriented against the first
/// loop's directed boundary edges so the patch continues that surface.
pub(crate) fn stitch_pair(
    loop_a: &[usize],
    loop_b: &[usize],
    vertices: &[Point3<f64>],
    pair: usize,
) -> Result<Vec<Triangle>> {
    let combined: Vec<Point3<f64>> = loop_a
        .iter()
        .chain(loop_b)
        .map(|&i| vertices[i])
        .collect();
    let frame = PlaneFrame::fit(&combined)?;

    let mut projected_a: Vec<Point2<f64>> =
        loop_a.iter().map(|&i| frame.project(&vertices[i])).collect();
    let mut projected_b: Vec<Point2<f64>> =
        loop_b.iter().map(|&i| frame.project(&vertices[i])).collect();

    let area_a = signed_area(&projected_a);
    let area_b = signed_area(&projected_b);
    if area_a * area_b > 0.0 {
        return Err(SurgeryError::SameWindingLoops);
    }

    // Scale the smaller-extent loop about the shared frame origin.
    if extent(&projected_a) < extent(&projected_b) {
        scale(&mut projected_a);
    } else {
        scale(&mut projected_b);
    }

    let (outer_uv, outer_ids, hole_uv, hole_ids) = if extent(&projected_a) >= extent(&projected_b)
    {
        (&projected_a, loop_a, &projected_b, loop_b)
    } else {
        (&projected_b, loop_b, &projected_a, loop_a)
    };

    let mut coords = Vec::with_capacity(2 * (outer_uv.len() + hole_uv.len()));
    for uv in outer_uv.iter().chain(hole_uv) {
        coords.push(uv.x);
        coords.push(uv.y);
    }
    let hole_start = vec![outer_uv.len()];
    let lut: Vec<usize> = outer_ids.iter().chain(hole_ids).copied().collect();

    let indices = earcutr::earcut(&coords, &hole_start, 2)
        .map_err(|_| SurgeryError::PatchTriangulation { pair })?;
    if indices.len() < 3 {
        return Err(SurgeryError::PatchTriangulation { pair });
    }

    let mut patch: Vec<Triangle> = indices
        .chunks_exact(3)
        .map(|tri| Triangle::new([lut[tri[0]], lut[tri[1]], lut[tri[2]]]))
        .filter(|tri| !tri.is_degenerate())
        .collect();
    if patch.is_empty() {
        return Err(SurgeryError::PatchTriangulation { pair });
    }

    orient_against_loop(&mut patch, loop_a);
    Ok(patch)
}

fn extent(uv: &[Point2<f64>]) -> f64 {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in uv {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    ((max_x - min_x).powi(2) + (max_y - min_y).powi(2)).sqrt()
}

fn scale(uv: &mut [Point2<f64>]) {
    for p in uv.iter_mut() {
        p.coords *= SCALE_BIAS;
    }
}

/// A patch triangle must traverse a boundary edge of the surrounding surface
/// in the opposite direction to continue its orientation. If any patch edge
/// runs with the loop instead, flip the whole patch.
fn orient_against_loop(patch: &mut [Triangle], loop_a: &[usize]) {
    let mut loop_edges: AHashSet<(usize, usize)> = AHashSet::with_capacity(loop_a.len());
    for i in 0..loop_a.len() {
        loop_edges.insert((loop_a[i], loop_a[(i + 1) % loop_a.len()]));
    }

    let mut with_loop = 0usize;
    let mut against_loop = 0usize;
    for tri in patch.iter() {
        for edge in tri.edges() {
            if loop_edges.contains(&edge) {
                with_loop += 1;
            } else if loop_edges.contains(&(edge.1, edge.0)) {
                against_loop += 1;
            }
        }
    }

    if with_loop > against_loop {
        for tri in patch.iter_mut() {
            tri.indices.swap(1, 2);
        }
    }
}
