// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cutting plane

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurgeryError};

/// Oriented plane: unit normal plus scalar offset along it.
///
/// A point p is on the positive side when `normal · p - offset > 0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub offset: f64,
}

impl Plane {
    /// Normalizes `normal`; a zero-length normal is degenerate.
    pub fn new(normal: Vector3<f64>, offset: f64) -> Result<Self> {
        let len = normal.norm();
        if len <= f64::EPSILON {
            return Err(SurgeryError::DegenerateGeometry {
                entity: "plane normal of zero length".to_string(),
            });
        }
        Ok(Self {
            normal: normal / len,
            offset: offset / len,
        })
    }

    pub fn from_point_normal(point: &Point3<f64>, normal: Vector3<f64>) -> Result<Self> {
        let len = normal.norm();
        if len <= f64::EPSILON {
            return Err(SurgeryError::DegenerateGeometry {
                entity: "plane normal of zero length".to_string(),
            });
        }
        let unit = normal / len;
        Ok(Self {
            normal: unit,
            offset: unit.dot(&point.coords),
        })
    }

    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalizes_input() {
        let plane = Plane::new(Vector3::new(0.0, 0.0, 2.0), 4.0).unwrap();
        assert_relative_eq!(plane.normal.norm(), 1.0);
        assert_relative_eq!(plane.signed_distance(&Point3::new(0.0, 0.0, 2.0)), 0.0);
        assert_relative_eq!(plane.signed_distance(&Point3::new(0.0, 0.0, 3.0)), 1.0);
    }

    #[test]
    fn test_zero_normal_rejected() {
        assert!(Plane::new(Vector3::zeros(), 0.0).is_err());
    }
}
