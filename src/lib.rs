// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Meshsurgeon
//!
//! A skinned-mesh surgery kernel: cuts a bone-bound triangle mesh along a
//! plane, merges two bone-bound meshes into one, and computes per-vertex bone
//! influence weights from mesh geometry and a skeleton.
//!
//! Every operation is a pure function of an immutable [`SkinnedMeshData`]
//! snapshot: inputs are cloned into a private working copy and new snapshots
//! are returned, so a caller previewing parameters simply discards a stale
//! result and calls again. Rendering, gesture capture, undo, and asset I/O
//! are deliberately out of scope; serde derives exist on the data model for
//! embedding, but persistence belongs to the caller.

pub mod cut;
pub mod error;
pub mod geometry;
pub mod merge;
pub mod model;
pub mod relax;
pub mod skinning;
pub mod solver;
pub mod topology;

pub use cut::cut;
pub use error::{Result, SurgeryError};
pub use geometry::{point_in_mesh, Plane, PlaneFrame};
pub use merge::{
    merge, merge_stitch, AttachMode, AttachTarget, Attachment, MergeParams, MergeResult,
};
pub use model::{
    Bone, BoneInfluence, BoundingBox, Mesh, RenderJoint, RenderModel, SkinBinding, Skeleton,
    SkinnedMeshData, Triangle, MAX_INFLUENCES,
};
pub use skinning::compute_skin_weights;
pub use solver::SparseSystem;
pub use topology::TopologyGraph;
