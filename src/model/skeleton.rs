// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Joint/bone skeleton
//!
//! Bones are unordered joint pairs: a graph edge, not necessarily
//! tree-structured in raw form. The render builder traverses the edge graph as
//! a rooted tree from joint 0 (see `render.rs`).

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurgeryError};

/// Unordered pair of joint indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bone {
    pub joints: [usize; 2],
}

impl Bone {
    pub fn new(a: usize, b: usize) -> Self {
        Self { joints: [a, b] }
    }

    /// The other endpoint, if `joint` is one of this bone's endpoints.
    pub fn other(&self, joint: usize) -> Option<usize> {
        if self.joints[0] == joint {
            Some(self.joints[1])
        } else if self.joints[1] == joint {
            Some(self.joints[0])
        } else {
            None
        }
    }

    pub fn shares_joint(&self, other: &Bone) -> bool {
        self.joints[0] == other.joints[0]
            || self.joints[0] == other.joints[1]
            || self.joints[1] == other.joints[0]
            || self.joints[1] == other.joints[1]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Skeleton {
    pub joints: Vec<Point3<f64>>,
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn validate(&self) -> Result<()> {
        for (bone_idx, bone) in self.bones.iter().enumerate() {
            for &index in &bone.joints {
                if index >= self.joints.len() {
                    return Err(SurgeryError::BoneJointOutOfRange {
                        bone: bone_idx,
                        index,
                        count: self.joints.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// World-space endpoints of bone `bone`.
    pub fn segment(&self, bone: usize) -> (Point3<f64>, Point3<f64>) {
        let b = &self.bones[bone];
        (self.joints[b.joints[0]], self.joints[b.joints[1]])
    }

    /// Clamped projection of `point` onto bone `bone`.
    ///
    /// Returns the segment parameter t ∈ [0, 1] and the projected point.
    /// A zero-length bone cannot be projected onto.
    pub fn project_onto_bone(&self, bone: usize, point: &Point3<f64>) -> Result<(f64, Point3<f64>)> {
        let (a, b) = self.segment(bone);
        let axis = b - a;
        let len_sq = axis.norm_squared();
        if len_sq <= f64::EPSILON {
            return Err(SurgeryError::ZeroLengthBone { bone });
        }
        let t = ((point - a).dot(&axis) / len_sq).clamp(0.0, 1.0);
        Ok((t, a + axis * t))
    }

    /// Euclidean distance from `point` to bone `bone` (clamped to the segment).
    pub fn bone_distance(&self, bone: usize, point: &Point3<f64>) -> Result<f64> {
        let (_, projected) = self.project_onto_bone(bone, point)?;
        Ok((point - projected).norm())
    }

    /// Index of the nearest bone to `point`.
    pub fn nearest_bone(&self, point: &Point3<f64>) -> Result<usize> {
        if self.bones.is_empty() {
            return Err(SurgeryError::EmptySkeleton);
        }
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for bone in 0..self.bones.len() {
            let dist = self.bone_distance(bone, point)?;
            if dist < best_dist {
                best_dist = dist;
                best = bone;
            }
        }
        Ok(best)
    }

    /// Translate every joint by `delta`.
    pub fn translate(&mut self, delta: &nalgebra::Vector3<f64>) {
        for joint in &mut self.joints {
            *joint += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_bone_chain() -> Skeleton {
        Skeleton {
            joints: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
            bones: vec![Bone::new(0, 1), Bone::new(1, 2)],
        }
    }

    #[test]
    fn test_projection_clamps() {
        let skel = two_bone_chain();

        let (t, p) = skel
            .project_onto_bone(0, &Point3::new(-5.0, 1.0, 0.0))
            .unwrap();
        assert_relative_eq!(t, 0.0);
        assert_relative_eq!((p - Point3::new(0.0, 0.0, 0.0)).norm(), 0.0);

        let (t, _) = skel
            .project_onto_bone(0, &Point3::new(0.25, 3.0, 0.0))
            .unwrap();
        assert_relative_eq!(t, 0.25);
    }

    #[test]
    fn test_zero_length_bone_rejected() {
        let skel = Skeleton {
            joints: vec![Point3::origin(), Point3::origin()],
            bones: vec![Bone::new(0, 1)],
        };
        assert!(matches!(
            skel.project_onto_bone(0, &Point3::new(1.0, 0.0, 0.0)),
            Err(SurgeryError::ZeroLengthBone { bone: 0 })
        ));
    }

    #[test]
    fn test_nearest_bone() {
        let skel = two_bone_chain();
        assert_eq!(skel.nearest_bone(&Point3::new(0.2, 0.5, 0.0)).unwrap(), 0);
        assert_eq!(skel.nearest_bone(&Point3::new(1.9, 0.5, 0.0)).unwrap(), 1);
    }

    #[test]
    fn test_shares_joint() {
        let skel = two_bone_chain();
        assert!(skel.bones[0].shares_joint(&skel.bones[1]));
        assert!(!Bone::new(0, 1).shares_joint(&Bone::new(2, 3)));
    }
}
