//! Statistics of two jointly distributed sources A and B.
//!
//! Rows index the states of A, columns the states of B. The joint
//! distribution may be given directly or reconstructed from one ensemble and
//! the matching conditional matrix.

use crate::error::{CodingError, Result};
use crate::metrics::entropy_of;
use serde::Serialize;
use tracing::warn;

const TOLERANCE: f64 = 1e-6;
const EPS: f64 = 1e-12;

type Matrix = Vec<Vec<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointStatistics {
    /// `P(a_i, b_j)`, normalized.
    pub joint: Matrix,
    pub marginal_a: Vec<f64>,
    pub marginal_b: Vec<f64>,
    /// `P(b_j | a_i)` at `[i][j]`.
    pub b_given_a: Matrix,
    /// `P(a_i | b_j)` at `[i][j]`.
    pub a_given_b: Matrix,
    pub entropy_a: f64,
    pub entropy_b: f64,
    pub entropy_b_given_a: f64,
    pub entropy_a_given_b: f64,
    pub joint_entropy: f64,
    pub mutual_information: f64,
}

impl JointStatistics {
    /// From the joint matrix `P(A, B)`.
    pub fn from_joint(joint: &[Vec<f64>]) -> Result<Self> {
        let (rows, cols) = dimensions(joint)?;
        let joint = normalize(
            (0..rows)
                .map(|i| (0..cols).map(|j| joint[i][j]).collect())
                .collect(),
        )?;
        Ok(Self::derive(joint))
    }

    /// From the ensemble `P(A)` and the conditional matrix `P(B | A)`.
    pub fn from_a_and_b_given_a(p_a: &[f64], b_given_a: &[Vec<f64>]) -> Result<Self> {
        let (rows, cols) = dimensions(b_given_a)?;
        if p_a.len() != rows {
            return Err(mismatch("P(A)", p_a.len(), rows));
        }
        let joint = normalize(
            (0..rows)
                .map(|i| (0..cols).map(|j| p_a[i] * b_given_a[i][j]).collect())
                .collect(),
        )?;
        Ok(Self::derive(joint))
    }

    /// From the ensemble `P(B)` and the conditional matrix `P(A | B)`.
    pub fn from_b_and_a_given_b(p_b: &[f64], a_given_b: &[Vec<f64>]) -> Result<Self> {
        let (rows, cols) = dimensions(a_given_b)?;
        if p_b.len() != cols {
            return Err(mismatch("P(B)", p_b.len(), cols));
        }
        let joint = normalize(
            (0..rows)
                .map(|i| (0..cols).map(|j| a_given_b[i][j] * p_b[j]).collect())
                .collect(),
        )?;
        Ok(Self::derive(joint))
    }

    fn derive(joint: Matrix) -> Self {
        let rows = joint.len();
        let cols = joint[0].len();

        let marginal_a: Vec<f64> = joint.iter().map(|row| row.iter().sum()).collect();
        let marginal_b: Vec<f64> = (0..cols)
            .map(|j| joint.iter().map(|row| row[j]).sum())
            .collect();

        let conditional = |p: f64, marginal: f64| if marginal > EPS { p / marginal } else { 0.0 };
        let b_given_a: Matrix = (0..rows)
            .map(|i| (0..cols).map(|j| conditional(joint[i][j], marginal_a[i])).collect())
            .collect();
        let a_given_b: Matrix = (0..rows)
            .map(|i| (0..cols).map(|j| conditional(joint[i][j], marginal_b[j])).collect())
            .collect();

        let entropy_a = entropy_of(marginal_a.iter().copied());
        let entropy_b = entropy_of(marginal_b.iter().copied());
        let entropy_b_given_a = (0..rows)
            .map(|i| marginal_a[i] * entropy_of(b_given_a[i].iter().copied()))
            .sum();
        let entropy_a_given_b = (0..cols)
            .map(|j| marginal_b[j] * entropy_of(a_given_b.iter().map(|row| row[j])))
            .sum();
        let joint_entropy = entropy_of(joint.iter().flatten().copied());

        Self {
            mutual_information: entropy_a + entropy_b - joint_entropy,
            joint,
            marginal_a,
            marginal_b,
            b_given_a,
            a_given_b,
            entropy_a,
            entropy_b,
            entropy_b_given_a,
            entropy_a_given_b,
            joint_entropy,
        }
    }
}

fn dimensions(matrix: &[Vec<f64>]) -> Result<(usize, usize)> {
    let rows = matrix.len();
    let cols = matrix.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Err(CodingError::InvalidProbabilityTable("empty matrix".into()));
    }
    if matrix.iter().any(|row| row.len() != cols) {
        return Err(CodingError::InvalidProbabilityTable(
            "matrix rows differ in length".into(),
        ));
    }
    Ok((rows, cols))
}

fn mismatch(name: &str, got: usize, expected: usize) -> CodingError {
    CodingError::InvalidProbabilityTable(format!(
        "{name} has {got} entries, matrix expects {expected}"
    ))
}

/// Clamp negative cells to zero and scale the matrix to sum to 1.
fn normalize(mut joint: Matrix) -> Result<Matrix> {
    if joint.iter().flatten().any(|p| !p.is_finite()) {
        return Err(CodingError::InvalidProbabilityTable(
            "matrix contains a non-finite value".into(),
        ));
    }
    for p in joint.iter_mut().flatten() {
        *p = p.max(0.0);
    }
    let total: f64 = joint.iter().flatten().sum();
    if total <= 0.0 {
        return Err(CodingError::InvalidProbabilityTable(
            "joint probability sums to zero".into(),
        ));
    }
    if (total - 1.0).abs() > TOLERANCE {
        warn!(total, "joint distribution does not sum to 1, normalizing");
        for p in joint.iter_mut().flatten() {
            *p /= total;
        }
    }
    Ok(joint)
}
