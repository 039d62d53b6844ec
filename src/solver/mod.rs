// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sparse symmetric positive-definite systems
//!
//! Assembly uses triplet accumulation: repeated entries at the same
//! (row, col) sum additively, which is exactly what Laplacian stamping wants.
//! Factorization goes through a dense Cholesky once the sparse pattern is
//! assembled; the systems solved here (free-vertex sets per bone, seam
//! regions) stay small enough that the dense factor is the pragmatic choice.
//!
//! Positive definiteness is the caller's obligation, discharged with an added
//! diagonal regularization term. A failed factorization reports which system
//! was being solved.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::error::{Result, SurgeryError};

/// Square sparse system assembled from additive (row, col, value) triplets.
#[derive(Debug, Clone)]
pub struct SparseSystem {
    coo: CooMatrix<f64>,
    dim: usize,
}

impl SparseSystem {
    pub fn new(dim: usize) -> Self {
        Self {
            coo: CooMatrix::new(dim, dim),
            dim,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Accumulate `value` at (row, col). Duplicate coordinates sum.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.dim && col < self.dim);
        if value != 0.0 {
            self.coo.push(row, col, value);
        }
    }

    /// Factor the assembled matrix and solve against each right-hand side.
    ///
    /// One factorization is shared across all right-hand sides. `system` names
    /// the caller's system for error reporting.
    pub fn solve(&self, rhs: &[DVector<f64>], system: &str) -> Result<Vec<DVector<f64>>> {
        let csc = CscMatrix::from(&self.coo);

        let mut dense = DMatrix::zeros(self.dim, self.dim);
        for (row, col, value) in csc.triplet_iter() {
            dense[(row, col)] = *value;
        }

        let chol = dense
            .cholesky()
            .ok_or_else(|| SurgeryError::NotPositiveDefinite {
                system: system.to_string(),
            })?;

        Ok(rhs.iter().map(|b| chol.solve(b)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_triplet_accumulation() {
        // Entries at the same coordinate must sum: 1 + 2 on the diagonal.
        let mut sys = SparseSystem::new(2);
        sys.add(0, 0, 1.0);
        sys.add(0, 0, 2.0);
        sys.add(1, 1, 4.0);

        let rhs = vec![DVector::from_vec(vec![6.0, 8.0])];
        let x = sys.solve(&rhs, "test").unwrap();

        assert_relative_eq!(x[0][0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[0][1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spd_solve_multiple_rhs() {
        // [2 1; 1 3] is SPD.
        let mut sys = SparseSystem::new(2);
        sys.add(0, 0, 2.0);
        sys.add(0, 1, 1.0);
        sys.add(1, 0, 1.0);
        sys.add(1, 1, 3.0);

        let rhs = vec![
            DVector::from_vec(vec![3.0, 4.0]),
            DVector::from_vec(vec![1.0, 1.0]),
        ];
        let x = sys.solve(&rhs, "test").unwrap();

        assert_relative_eq!(2.0 * x[0][0] + x[0][1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(x[0][0] + 3.0 * x[0][1], 4.0, epsilon = 1e-12);
        assert_relative_eq!(2.0 * x[1][0] + x[1][1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_not_positive_definite() {
        // [0 1; 1 0] is indefinite; Cholesky must refuse it.
        let mut sys = SparseSystem::new(2);
        sys.add(0, 1, 1.0);
        sys.add(1, 0, 1.0);

        let rhs = vec![DVector::from_vec(vec![1.0, 1.0])];
        let err = sys.solve(&rhs, "indefinite test").unwrap_err();
        assert!(matches!(
            err,
            SurgeryError::NotPositiveDefinite { system } if system == "indefinite test"
        ));
    }
}
