// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Best-fit plane frames and 2D projection

use nalgebra::{Matrix3, Point2, Point3, Vector3};

use crate::error::{Result, SurgeryError};

/// Orthonormal frame on a best-fit plane: origin at the point centroid,
/// normal from the covariance matrix's smallest eigenvector.
#[derive(Debug, Clone, Copy)]
pub struct PlaneFrame {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
    pub tangent: Vector3<f64>,
    pub bitangent: Vector3<f64>,
}

impl PlaneFrame {
    /// Fit a frame to at least three points.
    ///
    /// Coincident or collinear input has no well-defined plane and is
    /// reported as degenerate.
    pub fn fit(points: &[Point3<f64>]) -> Result<Self> {
        if points.len() < 3 {
            return Err(SurgeryError::DegenerateGeometry {
                entity: format!("plane fit over {} points (need 3)", points.len()),
            });
        }

        let centroid_coords: Vector3<f64> =
            points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / points.len() as f64;
        let origin = Point3::from(centroid_coords);

        let mut covariance = Matrix3::zeros();
        for point in points {
            let d = point - origin;
            covariance += d * d.transpose();
        }

        let eigen = covariance.symmetric_eigen();
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[a]
                .partial_cmp(&eigen.eigenvalues[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let (smallest, middle, largest) = (order[0], order[1], order[2]);

        // Two significant spread directions are required for a plane.
        let scale = eigen.eigenvalues[largest].abs();
        if scale <= f64::EPSILON || eigen.eigenvalues[middle] <= scale * 1e-12 {
            return Err(SurgeryError::DegenerateGeometry {
                entity: "coincident or collinear points feeding a plane fit".to_string(),
            });
        }

        let normal = eigen.eigenvectors.column(smallest).into_owned().normalize();
        let tangent = eigen.eigenvectors.column(largest).into_owned().normalize();
        let bitangent = normal.cross(&tangent);

        Ok(Self {
            origin,
            normal,
            tangent,
            bitangent,
        })
    }

    /// Plane coordinates of `point`.
    pub fn project(&self, point: &Point3<f64>) -> Point2<f64> {
        let d = point - self.origin;
        Point2::new(d.dot(&self.tangent), d.dot(&self.bitangent))
    }

    /// Inverse of `project` (the out-of-plane component is dropped).
    pub fn unproject(&self, uv: &Point2<f64>) -> Point3<f64> {
        self.origin + self.tangent * uv.x + self.bitangent * uv.y
    }
}

/// Twice-signed-area shoelace sum, halved. Positive for counter-clockwise
/// polygons in frame coordinates; its sign is the winding test.
pub fn signed_area(polygon: &[Point2<f64>]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}
