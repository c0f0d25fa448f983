// src/correlation.rs
//! Correlated Brownian Increments
//!
//! The three-factor model drives asset, variance and short rate with three
//! Brownian motions. Independent normals `z` are mapped to correlated ones by
//! a fixed 3×3 linear transform:
//! ```text
//! dW = M · z · √Δt
//! ```
//!
//! # Raw vs. Cholesky
//!
//! The textbook choice for `M` is the lower Cholesky factor `L` of the
//! correlation matrix `C` (so that `Cov(L z) = L Lᵀ = C`). Applying `C`
//! itself yields `Cov(C z) = C²`, which is what `Raw` mode does and what the
//! published price tables were produced with. Both are available through
//! [`CorrelationMode`]. With a non-zero ρ the two modes produce different
//! increment correlations.

use crate::error::{validation::validate_correlation, SdeError, SdeResult};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Which linear transform is applied to the independent draws
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMode {
    /// Apply the correlation matrix as given
    #[default]
    Raw,
    /// Apply the lower Cholesky factor of the correlation matrix
    Cholesky,
}

/// Symmetric 3×3 correlation matrix with unit diagonal
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrelationMatrix {
    matrix: Matrix3<f64>,
}

impl CorrelationMatrix {
    /// Build from the pairwise correlations (asset/variance, asset/rate,
    /// variance/rate)
    pub fn from_pairs(rho12: f64, rho13: f64, rho23: f64) -> SdeResult<Self> {
        validate_correlation("rho12", rho12)?;
        validate_correlation("rho13", rho13)?;
        validate_correlation("rho23", rho23)?;

        #[rustfmt::skip]
        let matrix = Matrix3::new(
            1.0,   rho12, rho13,
            rho12, 1.0,   rho23,
            rho13, rho23, 1.0,
        );
        Ok(Self { matrix })
    }

    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix3::identity()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }

    /// Lower-triangular Cholesky factor
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when the matrix is not positive definite.
    pub fn cholesky_factor(&self) -> SdeResult<Matrix3<f64>> {
        self.matrix
            .cholesky()
            .map(|c| c.l())
            .ok_or_else(|| SdeError::InvalidConfiguration {
                field: "correlation".to_string(),
                reason: "matrix is not positive definite".to_string(),
            })
    }

    /// The transform for a given mode
    pub fn transform(&self, mode: CorrelationMode) -> SdeResult<CorrelationTransform> {
        let matrix = match mode {
            CorrelationMode::Raw => self.matrix,
            CorrelationMode::Cholesky => self.cholesky_factor()?,
        };
        Ok(CorrelationTransform { matrix })
    }
}

/// Linear map from independent to correlated normals
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrelationTransform {
    matrix: Matrix3<f64>,
}

impl CorrelationTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Row-major copy of the applied matrix
    pub fn rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// `matrix · z`
    #[inline]
    pub fn apply(&self, z: [f64; 3]) -> [f64; 3] {
        let out = self.matrix * Vector3::from(z);
        [out[0], out[1], out[2]]
    }
}

impl Default for CorrelationTransform {
    fn default() -> Self {
        Self::identity()
    }
}
