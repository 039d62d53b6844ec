// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Canonical mesh, skeleton, and skin-binding model

mod binding;
mod mesh;
mod render;
mod skeleton;
mod snapshot;

pub use binding::{BoneInfluence, SkinBinding, MAX_INFLUENCES};
pub use mesh::{BoundingBox, Mesh, Triangle};
pub use render::{RenderJoint, RenderModel};
pub use skeleton::{Bone, Skeleton};
pub use snapshot::SkinnedMeshData;
