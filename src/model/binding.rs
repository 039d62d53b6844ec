// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-vertex skin bindings
//!
//! A binding holds up to four (bone, weight) influences. Raw solver output is
//! stored as-is; `normalized` enforces the render invariant (weights ≥ 0,
//! sum 1, all-zero collapses to bone 0 at weight 1).

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurgeryError};

/// Maximum bone influences per vertex.
pub const MAX_INFLUENCES: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneInfluence {
    pub bone: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkinBinding {
    pub influences: [BoneInfluence; MAX_INFLUENCES],
}

impl Default for SkinBinding {
    /// The fallback binding: bone 0 at full weight.
    fn default() -> Self {
        let mut influences = [BoneInfluence::default(); MAX_INFLUENCES];
        influences[0] = BoneInfluence {
            bone: 0,
            weight: 1.0,
        };
        Self { influences }
    }
}

impl SkinBinding {
    /// Build a binding from arbitrary (bone, weight) pairs, keeping the four
    /// highest weights. Weights are stored raw; call `normalized` to enforce
    /// the sum-to-one invariant.
    pub fn from_weights(weights: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut entries: Vec<(usize, f64)> =
            weights.into_iter().filter(|&(_, w)| w > 0.0).collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries.truncate(MAX_INFLUENCES);

        let mut influences = [BoneInfluence::default(); MAX_INFLUENCES];
        for (slot, (bone, weight)) in entries.into_iter().enumerate() {
            influences[slot] = BoneInfluence { bone, weight };
        }
        Self { influences }
    }

    /// Non-zero influences.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.influences
            .iter()
            .filter(|inf| inf.weight > 0.0)
            .map(|inf| (inf.bone, inf.weight))
    }

    pub fn weight_sum(&self) -> f64 {
        self.influences.iter().map(|inf| inf.weight).sum()
    }

    pub fn weight_of(&self, bone: usize) -> f64 {
        self.influences
            .iter()
            .filter(|inf| inf.bone == bone)
            .map(|inf| inf.weight)
            .sum()
    }

    /// Keep the four highest influences and rescale them to sum 1. An
    /// all-zero binding collapses to the default (bone 0, weight 1).
    pub fn normalized(&self) -> Self {
        let sum = self.weight_sum();
        if sum <= 0.0 {
            return Self::default();
        }
        let mut result = *self;
        for inf in &mut result.influences {
            inf.weight /= sum;
        }
        result
    }

    /// Weights must be finite and non-negative.
    pub fn validate(&self, vertex: usize) -> Result<()> {
        for inf in &self.influences {
            if !inf.weight.is_finite() || inf.weight < 0.0 {
                return Err(SurgeryError::MalformedBinding { vertex });
            }
        }
        Ok(())
    }

    /// Linear interpolation by edge parameter `t` over the union of both
    /// endpoints' bone sets. Used when a cut introduces a vertex on an edge.
    pub fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let mut weights: Vec<(usize, f64)> = Vec::with_capacity(2 * MAX_INFLUENCES);
        for (bone, w) in a.iter() {
            weights.push((bone, w * (1.0 - t)));
        }
        for (bone, w) in b.iter() {
            match weights.iter_mut().find(|(existing, _)| *existing == bone) {
                Some(entry) => entry.1 += w * t,
                None => weights.push((bone, w * t)),
            }
        }
        Self::from_weights(weights)
    }

    /// Shift every bone index by `offset` (combined-skeleton reindexing).
    pub fn offset_bones(&self, offset: usize) -> Self {
        let mut result = *self;
        for inf in &mut result.influences {
            if inf.weight > 0.0 {
                inf.bone += offset;
            }
        }
        result
    }

    /// Highest bone index referenced by a non-zero influence.
    pub fn max_bone(&self) -> Option<usize> {
        self.iter().map(|(bone, _)| bone).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_top_four_kept() {
        let binding =
            SkinBinding::from_weights([(0, 0.1), (1, 0.5), (2, 0.3), (3, 0.2), (4, 0.4)]);
        let bones: Vec<usize> = binding.iter().map(|(b, _)| b).collect();
        assert_eq!(bones, vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let binding = SkinBinding::from_weights([(0, 2.0), (1, 6.0)]).normalized();
        assert_relative_eq!(binding.weight_sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(binding.weight_of(1), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_binding_defaults_to_root_bone() {
        let binding = SkinBinding::from_weights([]).normalized();
        assert_eq!(binding, SkinBinding::default());
        assert_relative_eq!(binding.weight_of(0), 1.0);
    }

    #[test]
    fn test_lerp_preserves_bone_set() {
        let a = SkinBinding::from_weights([(0, 1.0)]);
        let b = SkinBinding::from_weights([(1, 1.0)]);
        let mid = SkinBinding::lerp(&a, &b, 0.25);
        assert_relative_eq!(mid.weight_of(0), 0.75, epsilon = 1e-12);
        assert_relative_eq!(mid.weight_of(1), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut binding = SkinBinding::default();
        binding.influences[0].weight = f64::NAN;
        assert!(binding.validate(7).is_err());
    }
}
