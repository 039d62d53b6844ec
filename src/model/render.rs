// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Render-side model builder and extractor
//!
//! The surgery engines exchange flat `SkinnedMeshData` snapshots; the render
//! side wants a rooted joint hierarchy so each bone's transform composes with
//! its parent. `RenderModel::build` performs that conversion, `extract` the
//! inverse read.

use log::warn;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::Result;
use crate::model::{Bone, Mesh, SkinBinding, Skeleton, SkinnedMeshData};

/// A joint in the rooted hierarchy. `parent` is `None` only for the root.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderJoint {
    pub parent: Option<usize>,
    pub position: Point3<f64>,
}

/// Render-ready skinned mesh: rooted joints plus normalized bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderModel {
    pub mesh: Mesh,
    pub joints: Vec<RenderJoint>,
    pub bindings: Vec<SkinBinding>,
}

impl RenderModel {
    /// Assemble a render model from a snapshot.
    ///
    /// Bones are attached as a rooted hierarchy by breadth-first traversal of
    /// the bone-edge graph outward from joint 0. Joints the traversal cannot
    /// reach are parented directly to the root. If the skeleton has no bones,
    /// a single root joint is synthesized at the mesh centroid. Bindings are
    /// normalized here (top four influences, weights rescaled to sum 1).
    pub fn build(data: &SkinnedMeshData) -> Result<Self> {
        data.validate()?;

        let joints = if data.skeleton.bones.is_empty() {
            vec![RenderJoint {
                parent: None,
                position: data.mesh.centroid(),
            }]
        } else {
            attach_hierarchy(&data.skeleton)
        };

        let bindings = data.bindings.iter().map(|b| b.normalized()).collect();

        Ok(Self {
            mesh: data.mesh.clone(),
            joints,
            bindings,
        })
    }

    /// Inverse read: recover a flat snapshot from the hierarchy.
    pub fn extract(&self) -> SkinnedMeshData {
        let joints = self.joints.iter().map(|j| j.position).collect();
        let bones = self
            .joints
            .iter()
            .enumerate()
            .filter_map(|(child, joint)| joint.parent.map(|parent| Bone::new(parent, child)))
            .collect();

        SkinnedMeshData::new(
            self.mesh.clone(),
            Skeleton { joints, bones },
            self.bindings.clone(),
        )
    }
}

fn attach_hierarchy(skeleton: &Skeleton) -> Vec<RenderJoint> {
    let count = skeleton.joint_count();
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); count];
    for bone in &skeleton.bones {
        let [a, b] = bone.joints;
        neighbors[a].push(b);
        neighbors[b].push(a);
    }

    let mut parent: Vec<Option<usize>> = vec![None; count];
    let mut visited = vec![false; count];
    let mut queue = VecDeque::new();
    visited[0] = true;
    queue.push_back(0);

    while let Some(joint) = queue.pop_front() {
        for &next in &neighbors[joint] {
            if !visited[next] {
                visited[next] = true;
                parent[next] = Some(joint);
                queue.push_back(next);
            }
        }
    }

    let unreached = visited.iter().filter(|&&v| !v).count();
    if unreached > 0 {
        warn!("{unreached} joints unreachable from joint 0; parenting them to the root");
        for (joint, seen) in visited.iter().enumerate().skip(1) {
            if !seen {
                parent[joint] = Some(0);
            }
        }
    }

    skeleton
        .joints
        .iter()
        .zip(parent)
        .map(|(&position, parent)| RenderJoint { parent, position })
        .collect()
}
