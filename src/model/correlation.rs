//! Correlation matrix with the invariants the variance model relies on.

use nalgebra::DMatrix;

use crate::error::{AllocError, Result};

/// Maximum asymmetry `|C[i,j] - C[j,i]|` tolerated.
const SYMMETRY_TOL: f64 = 1e-10;

/// Slack on the unit diagonal and on the `[-1, 1]` range.
const ENTRY_TOL: f64 = 1e-12;

/// Diagonal shift applied before the Cholesky test, so that singular but
/// positive semidefinite matrices (e.g. perfectly correlated assets) pass.
const PSD_SHIFT: f64 = 1e-10;

/// Symmetric, unit-diagonal, positive semidefinite matrix with entries in
/// `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    matrix: DMatrix<f64>,
}

impl CorrelationMatrix {
    /// Validate and wrap a dense matrix.
    pub fn new(matrix: DMatrix<f64>) -> Result<Self> {
        validate(&matrix)?;
        Ok(CorrelationMatrix { matrix })
    }

    /// Build from row slices.
    ///
    /// ```
    /// use meanvar::model::CorrelationMatrix;
    ///
    /// let c = CorrelationMatrix::from_rows(&[&[1.0, 0.3], &[0.3, 1.0]]).unwrap();
    /// assert_eq!(c.get(0, 1), 0.3);
    /// ```
    pub fn from_rows(rows: &[&[f64]]) -> Result<Self> {
        let n = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n) {
            return Err(AllocError::DimensionMismatch {
                expected: n,
                got: bad.len(),
            });
        }
        Self::new(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
    }

    /// Uncorrelated assets.
    pub fn identity(n: usize) -> Self {
        CorrelationMatrix {
            matrix: DMatrix::identity(n, n),
        }
    }

    /// Assemble the matrix for one risk-free asset (index 0) followed by
    /// `n_risky` risky assets.
    ///
    /// `pairs` lists the risky-risky correlations of the upper triangle row
    /// by row: for four risky assets `a, b, c, d` that is
    /// `[ab, ac, ad, bc, bd, cd]`. Every entry involving the risk-free asset
    /// is 0.
    pub fn from_risky_pairs(n_risky: usize, pairs: &[f64]) -> Result<Self> {
        let expected = n_risky * n_risky.saturating_sub(1) / 2;
        if pairs.len() != expected {
            return Err(AllocError::DimensionMismatch {
                expected,
                got: pairs.len(),
            });
        }

        let n = n_risky + 1;
        let mut matrix = DMatrix::identity(n, n);
        let mut next = pairs.iter();
        for i in 1..n {
            for j in (i + 1)..n {
                // Length checked above.
                let rho = next.next().copied().unwrap_or_default();
                matrix[(i, j)] = rho;
                matrix[(j, i)] = rho;
            }
        }
        Self::new(matrix)
    }

    /// Number of assets covered.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Entry `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[(i, j)]
    }

    /// Borrow the underlying matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Clear the off-diagonal row and column of asset `index`.
    ///
    /// Keeps the matrix a valid correlation matrix: the result is block
    /// diagonal with a PSD block and a unit block.
    pub(crate) fn decouple(&mut self, index: usize) {
        for k in 0..self.dim() {
            if k != index {
                self.matrix[(index, k)] = 0.0;
                self.matrix[(k, index)] = 0.0;
            }
        }
    }
}

impl From<CorrelationMatrix> for DMatrix<f64> {
    fn from(c: CorrelationMatrix) -> Self {
        c.matrix
    }
}

/// Positive semidefiniteness via Cholesky of the slightly shifted matrix.
pub fn is_psd(matrix: &DMatrix<f64>) -> bool {
    let n = matrix.nrows();
    let shifted = matrix + DMatrix::<f64>::identity(n, n) * PSD_SHIFT;
    shifted.cholesky().is_some()
}

fn validate(m: &DMatrix<f64>) -> Result<()> {
    if m.nrows() != m.ncols() {
        return Err(AllocError::InvalidModel(format!(
            "correlation matrix must be square, got {}x{}",
            m.nrows(),
            m.ncols()
        )));
    }
    if let Some(v) = m.iter().find(|v| !v.is_finite()) {
        return Err(AllocError::InvalidModel(format!(
            "correlation entries must be finite, got {}",
            v
        )));
    }

    let n = m.nrows();
    for i in 0..n {
        if (m[(i, i)] - 1.0).abs() > ENTRY_TOL {
            return Err(AllocError::InvalidModel(format!(
                "correlation diagonal must be 1, got {} at ({}, {})",
                m[(i, i)],
                i,
                i
            )));
        }
        for j in 0..n {
            if m[(i, j)].abs() > 1.0 + ENTRY_TOL {
                return Err(AllocError::InvalidModel(format!(
                    "correlation {} at ({}, {}) outside [-1, 1]",
                    m[(i, j)],
                    i,
                    j
                )));
            }
            if j > i && (m[(i, j)] - m[(j, i)]).abs() > SYMMETRY_TOL {
                return Err(AllocError::InvalidModel(format!(
                    "correlation matrix not symmetric at ({}, {})",
                    i, j
                )));
            }
        }
    }

    if !is_psd(m) {
        return Err(AllocError::InvalidModel(
            "correlation matrix is not positive semidefinite".into(),
        ));
    }
    Ok(())
}
