// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Skinned-mesh snapshot
//!
//! `SkinnedMeshData` is the unit exchanged at every engine boundary. Engines
//! take it by shared reference, clone a private working copy, and return new
//! snapshots; inputs are never mutated in place.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurgeryError};
use crate::model::{Mesh, SkinBinding, Skeleton};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkinnedMeshData {
    pub mesh: Mesh,
    pub skeleton: Skeleton,
    pub bindings: Vec<SkinBinding>,
}

impl SkinnedMeshData {
    pub fn new(mesh: Mesh, skeleton: Skeleton, bindings: Vec<SkinBinding>) -> Self {
        Self {
            mesh,
            skeleton,
            bindings,
        }
    }

    /// Entry validation: run before any mutation so failed inputs are left
    /// untouched.
    pub fn validate(&self) -> Result<()> {
        self.mesh.validate()?;
        self.skeleton.validate()?;

        if self.bindings.len() != self.mesh.vertex_count() {
            return Err(SurgeryError::BindingCountMismatch {
                bindings: self.bindings.len(),
                vertices: self.mesh.vertex_count(),
            });
        }

        for (vertex, binding) in self.bindings.iter().enumerate() {
            binding.validate(vertex)?;
            if let Some(bone) = binding.max_bone() {
                // A boneless skeleton still admits the synthesized bone 0.
                let limit = self.skeleton.bone_count().max(1);
                if bone >= limit {
                    return Err(SurgeryError::BoneOutOfRange {
                        index: bone,
                        count: self.skeleton.bone_count(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Replace every binding with its normalized form.
    pub fn normalize_bindings(&mut self) {
        for binding in &mut self.bindings {
            *binding = binding.normalized();
        }
    }
}
