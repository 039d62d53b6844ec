// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh merge engine
//!
//! Unions two skinned meshes: pre-aligns by attachment mode, removes mutual
//! interior triangles, reindexes into one buffer, combines skeletons, stitches
//! the boundary loops left by removal, relaxes the seam, and reconciles skin
//! weights against the merged skeleton.
//!
//! The pipeline is split at the stitch: `merge_stitch` produces a
//! `MergeResult` holding the stitched snapshot and the seam seed set, and
//! `MergeResult::finish` runs relaxation plus skin reconciliation. A caller
//! previewing only `smooth_layers`/`smooth_factor` re-runs `finish` on the
//! same `MergeResult` without re-stitching. Seam state travels in that
//! explicit struct, never as scratch data on a mesh.

mod stitch;

use ahash::AHashSet;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurgeryError};
use crate::geometry::point_in_mesh;
use crate::model::{Bone, Mesh, SkinBinding, Skeleton, SkinnedMeshData, Triangle};
use crate::relax::relax_region;
use crate::skinning::compute_skin_weights;
use crate::topology::TopologyGraph;

/// Split-mode projections this close to a bone endpoint snap to the endpoint
/// instead of creating a near-degenerate bone.
const SPLIT_SNAP_MARGIN: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachMode {
    /// Rigidly translate A so its source joint lands on B's target joint.
    Snap,
    /// Insert a joint on B's target bone nearest A's source joint.
    Split,
    /// No pre-alignment; add one bone from source to target.
    Connect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachTarget {
    Joint(usize),
    Bone(usize),
}

/// How mesh A attaches to mesh B. Snap and connect target a joint of B,
/// split targets a bone of B.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Attachment {
    pub mode: AttachMode,
    pub source_joint: usize,
    pub target: AttachTarget,
}

/// Seam smoothing parameters. `smooth_factor` 0 leaves the stitched
/// positions untouched; values above 1 are clamped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MergeParams {
    pub smooth_layers: usize,
    pub smooth_factor: f64,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            smooth_layers: 2,
            smooth_factor: 0.5,
        }
    }
}

/// Stitched merge output plus the seam seed set needed for relaxation.
#[derive(Debug, Clone)]
pub struct MergeResult {
    stitched: SkinnedMeshData,
    seam_seeds: Vec<usize>,
}

impl MergeResult {
    /// The stitched snapshot before any seam smoothing.
    pub fn stitched(&self) -> &SkinnedMeshData {
        &self.stitched
    }

    /// Relax the seam region and reconcile its skin weights.
    ///
    /// Cheap to call repeatedly with different parameters: stitching is not
    /// redone.
    pub fn finish(&self, params: &MergeParams) -> Result<SkinnedMeshData> {
        if !params.smooth_factor.is_finite() || params.smooth_factor < 0.0 {
            return Err(SurgeryError::ParameterOutOfRange {
                name: "smooth_factor",
                value: params.smooth_factor,
            });
        }

        let mut result = self.stitched.clone();
        if self.seam_seeds.is_empty() {
            result.normalize_bindings();
            return Ok(result);
        }

        let graph = TopologyGraph::build(&result.mesh.faces);
        relax_region(
            &mut result.mesh.vertices,
            &graph,
            &self.seam_seeds,
            params.smooth_layers,
            params.smooth_factor,
            "merge seam",
        )?;

        // Seam-region vertices carry bindings that predate the merged
        // skeleton; re-solve them against it.
        let region = graph.expand_region(&self.seam_seeds, params.smooth_layers);
        if !region.interior.is_empty() {
            let solved = compute_skin_weights(&result.mesh, &result.skeleton)?;
            for &vertex in &region.interior {
                result.bindings[vertex] = solved[vertex];
            }
        }

        result.normalize_bindings();
        Ok(result)
    }
}

/// Merge `b` into `a` under `attachment`, smoothing the seam with `params`.
pub fn merge(
    a: &SkinnedMeshData,
    b: &SkinnedMeshData,
    attachment: &Attachment,
    params: &MergeParams,
) -> Result<SkinnedMeshData> {
    merge_stitch(a, b, attachment)?.finish(params)
}

/// Run the merge pipeline up to and including stitching.
pub fn merge_stitch(
    a: &SkinnedMeshData,
    b: &SkinnedMeshData,
    attachment: &Attachment,
) -> Result<MergeResult> {
    a.validate()?;
    b.validate()?;
    let resolved = validate_attachment(a, b, attachment)?;

    let mut a = a.clone();
    let mut b = b.clone();

    // 1. Pre-alignment.
    match resolved {
        ResolvedTarget::SnapJoint(target) => {
            let delta = b.skeleton.joints[target] - a.skeleton.joints[attachment.source_joint];
            a.mesh.translate(&delta);
            a.skeleton.translate(&delta);
        }
        ResolvedTarget::SplitBone(bone) => {
            split_bone(&mut b.skeleton, bone, &a.skeleton.joints[attachment.source_joint])?;
        }
        ResolvedTarget::ConnectJoint(_) => {}
    }

    // 2. Interior removal, both directions, against the pre-aligned originals.
    let removed_a: Vec<bool> = a
        .mesh
        .vertices
        .iter()
        .map(|v| point_in_mesh(v, &b.mesh))
        .collect();
    let removed_b: Vec<bool> = b
        .mesh
        .vertices
        .iter()
        .map(|v| point_in_mesh(v, &a.mesh))
        .collect();

    // 3. Reindexing into one combined buffer: A's kept vertices, then B's.
    let mut vertices = Vec::with_capacity(a.mesh.vertex_count() + b.mesh.vertex_count());
    let mut bindings = Vec::with_capacity(vertices.capacity());
    let bone_offset = a.skeleton.bone_count();

    let map_a = append_kept(&a, &removed_a, 0, &mut vertices, &mut bindings);
    let map_b = append_kept(&b, &removed_b, bone_offset, &mut vertices, &mut bindings);

    let faces_a = remap_faces(&a.mesh, &removed_a, &map_a);
    let faces_b = remap_faces(&b.mesh, &removed_b, &map_b);
    debug!(
        "merge: kept {}/{} faces of A, {}/{} of B",
        faces_a.len(),
        a.mesh.face_count(),
        faces_b.len(),
        b.mesh.face_count()
    );

    // 4. Skeleton combination.
    let skeleton = combine_skeletons(&a.skeleton, &b.skeleton, attachment);

    // 5. Boundary loops per source mesh.
    let loops_a = TopologyGraph::build(&faces_a).boundary_loops()?;
    let loops_b = TopologyGraph::build(&faces_b).boundary_loops()?;
    if loops_a.len() != loops_b.len() {
        return Err(SurgeryError::LoopCountMismatch {
            left: loops_a.len(),
            right: loops_b.len(),
        });
    }
    debug!("merge: stitching {} loop pairs", loops_a.len());

    // 6-8. Pair loops and triangulate one patch per pair.
    let mut faces = faces_a;
    faces.extend(faces_b);

    let mut seeds: AHashSet<usize> = AHashSet::new();
    for (pair, (la, lb)) in stitch::pair_loops(&loops_a, &loops_b, &vertices)
        .into_iter()
        .enumerate()
    {
        let patch = stitch::stitch_pair(&loops_a[la], &loops_b[lb], &vertices, pair)?;
        for tri in &patch {
            seeds.extend(tri.indices);
        }
        faces.extend(patch);
    }

    let stitched = SkinnedMeshData::new(Mesh { vertices, faces }, skeleton, bindings);
    stitched.validate()?;

    let mut seam_seeds: Vec<usize> = seeds.into_iter().collect();
    seam_seeds.sort_unstable();

    Ok(MergeResult {
        stitched,
        seam_seeds,
    })
}

/// Attachment with its target checked against the right index space.
enum ResolvedTarget {
    SnapJoint(usize),
    SplitBone(usize),
    ConnectJoint(usize),
}

fn validate_attachment(
    a: &SkinnedMeshData,
    b: &SkinnedMeshData,
    attachment: &Attachment,
) -> Result<ResolvedTarget> {
    if attachment.source_joint >= a.skeleton.joint_count() {
        return Err(SurgeryError::JointOutOfRange {
            index: attachment.source_joint,
            count: a.skeleton.joint_count(),
        });
    }
    match (attachment.mode, attachment.target) {
        (AttachMode::Snap | AttachMode::Connect, AttachTarget::Joint(joint)) => {
            if joint >= b.skeleton.joint_count() {
                return Err(SurgeryError::JointOutOfRange {
                    index: joint,
                    count: b.skeleton.joint_count(),
                });
            }
            if attachment.mode == AttachMode::Snap {
                Ok(ResolvedTarget::SnapJoint(joint))
            } else {
                Ok(ResolvedTarget::ConnectJoint(joint))
            }
        }
        (AttachMode::Split, AttachTarget::Bone(bone)) => {
            if bone >= b.skeleton.bone_count() {
                return Err(SurgeryError::BoneOutOfRange {
                    index: bone,
                    count: b.skeleton.bone_count(),
                });
            }
            Ok(ResolvedTarget::SplitBone(bone))
        }
        _ => Err(SurgeryError::AttachTargetMismatch),
    }
}

/// Insert a joint on `bone` at the clamped projection of `point`, splitting
/// the bone in two. Projections within 5% of an endpoint leave the skeleton
/// unchanged. Bindings referencing the split bone keep referencing its first
/// half.
fn split_bone(skeleton: &mut Skeleton, bone: usize, point: &nalgebra::Point3<f64>) -> Result<()> {
    let (t, projected) = skeleton.project_onto_bone(bone, point)?;
    if !(SPLIT_SNAP_MARGIN..=1.0 - SPLIT_SNAP_MARGIN).contains(&t) {
        return Ok(());
    }

    let new_joint = skeleton.joints.len();
    skeleton.joints.push(projected);
    let [start, end] = skeleton.bones[bone].joints;
    skeleton.bones[bone] = Bone::new(start, new_joint);
    skeleton.bones.push(Bone::new(new_joint, end));
    Ok(())
}

/// Append the kept vertices of `data` to the combined buffers, offsetting
/// binding bone indices, and return the old-to-new index map.
fn append_kept(
    data: &SkinnedMeshData,
    removed: &[bool],
    bone_offset: usize,
    vertices: &mut Vec<nalgebra::Point3<f64>>,
    bindings: &mut Vec<SkinBinding>,
) -> Vec<usize> {
    // Removed vertices keep a sentinel entry; faces referencing them are
    // dropped before the map is consulted.
    let mut map = vec![usize::MAX; data.mesh.vertex_count()];
    for (old, vertex) in data.mesh.vertices.iter().enumerate() {
        if removed[old] {
            continue;
        }
        map[old] = vertices.len();
        vertices.push(*vertex);
        bindings.push(data.bindings[old].offset_bones(bone_offset));
    }
    map
}

/// Faces survive only when none of their vertices was removed.
fn remap_faces(mesh: &Mesh, removed: &[bool], map: &[usize]) -> Vec<Triangle> {
    mesh.faces
        .iter()
        .filter(|face| face.indices.iter().all(|&v| !removed[v]))
        .map(|face| {
            Triangle::new([
                map[face.indices[0]],
                map[face.indices[1]],
                map[face.indices[2]],
            ])
        })
        .collect()
}

fn combine_skeletons(a: &Skeleton, b: &Skeleton, attachment: &Attachment) -> Skeleton {
    let mut joints = a.joints.clone();
    let mut bones = a.bones.clone();
    let joint_offset = a.joint_count();

    match (attachment.mode, attachment.target) {
        (AttachMode::Snap, AttachTarget::Joint(target)) => {
            // B's target joint coincides with A's source joint after
            // alignment; drop it and remap bone endpoints onto the source.
            let mut joint_map = vec![0usize; b.joint_count()];
            for (old, &position) in b.joints.iter().enumerate() {
                if old == target {
                    joint_map[old] = attachment.source_joint;
                } else {
                    joint_map[old] = joints.len();
                    joints.push(position);
                }
            }
            for bone in &b.bones {
                bones.push(Bone::new(
                    joint_map[bone.joints[0]],
                    joint_map[bone.joints[1]],
                ));
            }
        }
        _ => {
            joints.extend_from_slice(&b.joints);
            for bone in &b.bones {
                bones.push(Bone::new(
                    bone.joints[0] + joint_offset,
                    bone.joints[1] + joint_offset,
                ));
            }
            if let (AttachMode::Connect, AttachTarget::Joint(target)) =
                (attachment.mode, attachment.target)
            {
                bones.push(Bone::new(attachment.source_joint, target + joint_offset));
            }
        }
    }

    Skeleton { joints, bones }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn skeleton_with_bone() -> Skeleton {
        Skeleton {
            joints: vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 2.0)],
            bones: vec![Bone::new(0, 1)],
        }
    }

    #[test]
    fn test_split_bone_midpoint() {
        let mut skeleton = skeleton_with_bone();
        split_bone(&mut skeleton, 0, &Point3::new(1.0, 0.0, 1.0)).unwrap();

        assert_eq!(skeleton.joint_count(), 3);
        assert_eq!(skeleton.bone_count(), 2);
        assert!((skeleton.joints[2] - Point3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        assert_eq!(skeleton.bones[0], Bone::new(0, 2));
        assert_eq!(skeleton.bones[1], Bone::new(2, 1));
    }

    #[test]
    fn test_split_bone_snaps_near_endpoint() {
        let mut skeleton = skeleton_with_bone();
        // 2% along the bone: inside the 5% margin, no split happens.
        split_bone(&mut skeleton, 0, &Point3::new(1.0, 0.0, 0.04)).unwrap();
        assert_eq!(skeleton.joint_count(), 2);
        assert_eq!(skeleton.bone_count(), 1);

        // Just beyond the margin the split is real.
        split_bone(&mut skeleton, 0, &Point3::new(1.0, 0.0, 0.2)).unwrap();
        assert_eq!(skeleton.bone_count(), 2);
    }

    #[test]
    fn test_combine_skeletons_snap_remaps_shared_joint() {
        let a = skeleton_with_bone();
        let b = Skeleton {
            joints: vec![Point3::new(5.0, 0.0, 0.0), Point3::new(5.0, 1.0, 0.0)],
            bones: vec![Bone::new(0, 1)],
        };
        let attachment = Attachment {
            mode: AttachMode::Snap,
            source_joint: 1,
            target: AttachTarget::Joint(0),
        };

        let combined = combine_skeletons(&a, &b, &attachment);
        // B's joint 0 is dropped; its bone endpoint lands on A's source.
        assert_eq!(combined.joint_count(), 3);
        assert_eq!(combined.bone_count(), 2);
        assert_eq!(combined.bones[1], Bone::new(1, 2));
    }

    #[test]
    fn test_combine_skeletons_connect_adds_bridge_bone() {
        let a = skeleton_with_bone();
        let b = skeleton_with_bone();
        let attachment = Attachment {
            mode: AttachMode::Connect,
            source_joint: 1,
            target: AttachTarget::Joint(0),
        };

        let combined = combine_skeletons(&a, &b, &attachment);
        assert_eq!(combined.joint_count(), 4);
        assert_eq!(combined.bone_count(), 3);
        assert_eq!(combined.bones[2], Bone::new(1, 2));
    }

    #[test]
    fn test_attach_target_mismatch_rejected() {
        let skeleton = skeleton_with_bone();
        let mesh = crate::geometry::primitives::icosphere(1.0, 1);
        let bindings = vec![SkinBinding::default(); mesh.vertex_count()];
        let data = SkinnedMeshData::new(mesh, skeleton, bindings);

        let bad = Attachment {
            mode: AttachMode::Snap,
            source_joint: 0,
            target: AttachTarget::Bone(0),
        };
        assert!(matches!(
            merge_stitch(&data, &data.clone(), &bad),
            Err(SurgeryError::AttachTargetMismatch)
        ));
    }
}
