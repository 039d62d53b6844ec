// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry predicates - plane fitting, projection, containment

mod frame;
mod plane;
mod predicates;
pub mod primitives;

pub use frame::{signed_area, PlaneFrame};
pub use plane::Plane;
pub use predicates::{point_in_mesh, ray_intersects_triangle};
