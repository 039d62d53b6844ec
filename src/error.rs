// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error taxonomy for mesh surgery operations
//!
//! Input errors are raised during entry validation, before any mutation, so a
//! failed call leaves its inputs untouched. Topology errors abort the affected
//! operation rather than producing a partially stitched mesh. Solve errors name
//! the system (bone, seam region) that failed. Nothing is retried
//! automatically; a caller retries by supplying different inputs.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SurgeryError>;

#[derive(Debug, Error)]
pub enum SurgeryError {
    // --- Input validation ---
    #[error("mesh has no faces")]
    EmptyMesh,

    #[error("skeleton has no bones")]
    EmptySkeleton,

    #[error("face {face} references vertex {index} (mesh has {count} vertices)")]
    FaceIndexOutOfRange {
        face: usize,
        index: usize,
        count: usize,
    },

    #[error("bone {bone} references joint {index} (skeleton has {count} joints)")]
    BoneJointOutOfRange {
        bone: usize,
        index: usize,
        count: usize,
    },

    #[error("joint index {index} is out of range (skeleton has {count} joints)")]
    JointOutOfRange { index: usize, count: usize },

    #[error("bone index {index} is out of range (skeleton has {count} bones)")]
    BoneOutOfRange { index: usize, count: usize },

    #[error("bone {bone} has zero length")]
    ZeroLengthBone { bone: usize },

    #[error("binding count {bindings} does not match vertex count {vertices}")]
    BindingCountMismatch { bindings: usize, vertices: usize },

    #[error("vertex {vertex} has a malformed skin binding")]
    MalformedBinding { vertex: usize },

    #[error("parameter {name} = {value} is outside its valid range")]
    ParameterOutOfRange { name: &'static str, value: f64 },

    #[error("attachment target kind does not match attachment mode")]
    AttachTargetMismatch,

    #[error("mesh is not connected ({unreached} vertices unreachable)")]
    DisconnectedMesh { unreached: usize },

    #[error("bone {bone} is not the nearest bone of any vertex")]
    UnreferencedBone { bone: usize },

    // --- Topology ---
    #[error("boundary loop counts differ: {left} loops vs {right}")]
    LoopCountMismatch { left: usize, right: usize },

    #[error("paired boundary loops have the same winding")]
    SameWindingLoops,

    #[error("non-manifold boundary at vertex {vertex}")]
    NonManifoldBoundary { vertex: usize },

    #[error("boundary edges do not close into a loop (started at vertex {start})")]
    OpenBoundaryChain { start: usize },

    #[error("patch triangulation failed for loop pair {pair}")]
    PatchTriangulation { pair: usize },

    // --- Numerics ---
    #[error("linear system for {system} is not positive definite")]
    NotPositiveDefinite { system: String },

    #[error("degenerate geometry: {entity}")]
    DegenerateGeometry { entity: String },
}
