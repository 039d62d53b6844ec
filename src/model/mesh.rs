// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle mesh representation

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurgeryError};

/// Triangle defined by three vertex indices, consistent winding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    /// The three directed edges of this triangle, in winding order.
    pub fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.indices;
        [(a, b), (b, c), (c, a)]
    }

    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.indices;
        a == b || b == c || a == c
    }
}

/// Triangular mesh: positions plus indexed faces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Add a vertex and return its index.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        let index = self.vertices.len();
        self.vertices.push(position);
        index
    }

    pub fn add_face(&mut self, face: Triangle) {
        self.faces.push(face);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Every face index must address an existing vertex.
    pub fn validate(&self) -> Result<()> {
        for (face_idx, face) in self.faces.iter().enumerate() {
            for &index in &face.indices {
                if index >= self.vertices.len() {
                    return Err(SurgeryError::FaceIndexOutOfRange {
                        face: face_idx,
                        index,
                        count: self.vertices.len(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn centroid(&self) -> Point3<f64> {
        if self.vertices.is_empty() {
            return Point3::origin();
        }
        let sum: Vector3<f64> = self.vertices.iter().map(|p| p.coords).sum();
        Point3::from(sum / self.vertices.len() as f64)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// Translate every vertex by `delta`.
    pub fn translate(&mut self, delta: &Vector3<f64>) {
        for vertex in &mut self.vertices {
            *vertex += delta;
        }
    }

    /// Area-weighted face normal (unnormalized cross product).
    pub fn face_normal_raw(&self, face: &Triangle) -> Vector3<f64> {
        let [a, b, c] = face.indices;
        let ab = self.vertices[b] - self.vertices[a];
        let ac = self.vertices[c] - self.vertices[a];
        ab.cross(&ac)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points(points: &[Point3<f64>]) -> Self {
        let mut bbox = Self::empty();
        for point in points {
            bbox.expand_to_include(point);
        }
        bbox
    }

    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);

        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn center(&self) -> Point3<f64> {
        Point3::from((self.min.coords + self.max.coords) / 2.0)
    }

    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(Triangle::new([0, 1, 2]));
        mesh.add_face(Triangle::new([0, 2, 3]));
        mesh
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut mesh = quad();
        mesh.add_face(Triangle::new([0, 1, 9]));
        assert!(matches!(
            mesh.validate(),
            Err(SurgeryError::FaceIndexOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn test_centroid_and_bbox() {
        let mesh = quad();
        let c = mesh.centroid();
        assert!((c - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);

        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Point3::new(1.0, 1.0, 0.0));
    }
}
