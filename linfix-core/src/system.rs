//! Ridge-regularised normal equations built from a regression sample.

use tracing::{debug, instrument};

use crate::{
    error::{FixtureError, Result},
    matrix::DenseMatrix,
    sampler::RegressionSample,
};

/// Ridge constant used by the command-line driver.
pub const DEFAULT_RIDGE: f64 = 3.0;

/// A square linear system `A x = b`.
///
/// # Examples
/// ```
/// use linfix_core::{LinearSystem, RegressionSample};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let mut rng = SmallRng::seed_from_u64(1);
/// let sample = RegressionSample::generate(5, 3, &mut rng).expect("valid dimensions");
/// let system = LinearSystem::from_regression(&sample, 3.0).expect("valid ridge");
/// assert_eq!(system.dimension(), 3);
/// assert!(system.matrix().is_square());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LinearSystem {
    matrix: DenseMatrix,
    vector: Vec<f64>,
}

impl LinearSystem {
    /// Wraps a square matrix and a right-hand side of matching length.
    ///
    /// # Errors
    /// Returns [`FixtureError::ShapeMismatch`] when the matrix is not square
    /// or the vector length differs from its dimension.
    pub fn new(matrix: DenseMatrix, vector: Vec<f64>) -> Result<Self> {
        if !matrix.is_square() {
            return Err(FixtureError::shape_mismatch(
                "LinearSystem::new",
                "square matrix",
                matrix.shape(),
            ));
        }
        if vector.len() != matrix.rows() {
            return Err(FixtureError::shape_mismatch(
                "LinearSystem::new",
                format!("vector length {}", matrix.rows()),
                format!("vector length {}", vector.len()),
            ));
        }
        Ok(Self { matrix, vector })
    }

    /// Builds `A = XᵗX + λI` and `b = Xᵗy` from `sample`.
    ///
    /// # Errors
    /// Returns [`FixtureError::InvalidRidge`] when `lambda` is negative or not
    /// finite.
    #[instrument(name = "system.from_regression", err, skip(sample), fields(cols = sample.design().cols()))]
    pub fn from_regression(sample: &RegressionSample, lambda: f64) -> Result<Self> {
        validate_ridge(lambda)?;
        let design = sample.design();
        let mut matrix = design.gram()?;
        matrix.add_diagonal(lambda);
        let vector = design.transpose_mul_vec(sample.targets())?;
        debug!(dimension = matrix.rows(), "normal equations built");
        Self::new(matrix, vector)
    }

    /// Returns `A`.
    #[must_use]
    pub const fn matrix(&self) -> &DenseMatrix {
        &self.matrix
    }

    /// Returns `b`.
    #[must_use]
    pub fn vector(&self) -> &[f64] {
        &self.vector
    }

    /// Returns the shared dimension `d`.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.matrix.rows()
    }

    /// Splits the system into `(A, b)`.
    #[must_use]
    pub fn into_parts(self) -> (DenseMatrix, Vec<f64>) {
        (self.matrix, self.vector)
    }
}

/// Rejects negative or non-finite ridge constants.
///
/// # Errors
/// Returns [`FixtureError::InvalidRidge`] for rejected values.
pub fn validate_ridge(lambda: f64) -> Result<()> {
    if lambda.is_finite() && lambda >= 0.0 {
        Ok(())
    } else {
        Err(FixtureError::InvalidRidge { lambda })
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests compare entries within a tolerance"
)]
mod tests {
    use super::*;

    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    fn sample(seed: u64) -> RegressionSample {
        RegressionSample::generate(6, 4, &mut SmallRng::seed_from_u64(seed))
            .expect("valid dimensions")
    }

    #[test]
    fn matrix_is_square_and_symmetric() {
        let system = LinearSystem::from_regression(&sample(5), DEFAULT_RIDGE).expect("valid");
        let a = system.matrix();
        assert_eq!(a.rows(), 4);
        assert_eq!(a.cols(), 4);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(a.get(i, j), a.get(j, i));
            }
        }
    }

    #[rstest]
    #[case(0.5)]
    #[case(3.0)]
    #[case(100.0)]
    fn ridge_shifts_only_the_diagonal(#[case] lambda: f64) {
        let s = sample(8);
        let base = LinearSystem::from_regression(&s, 0.0).expect("valid");
        let ridged = LinearSystem::from_regression(&s, lambda).expect("valid");
        for i in 0..4 {
            for j in 0..4 {
                let b = base.matrix().get(i, j).expect("in range");
                let r = ridged.matrix().get(i, j).expect("in range");
                if i == j {
                    assert!((r - b - lambda).abs() < 1e-9);
                } else {
                    assert_eq!(r, b);
                }
            }
        }
        assert_eq!(base.vector(), ridged.vector());
    }

    #[test]
    fn vector_is_design_transpose_times_targets() {
        let s = sample(13);
        let system = LinearSystem::from_regression(&s, DEFAULT_RIDGE).expect("valid");
        let expected = s
            .design()
            .transpose()
            .mul_vec(s.targets())
            .expect("shapes agree");
        for (got, want) in system.vector().iter().zip(&expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_invalid_ridge(#[case] lambda: f64) {
        let err = LinearSystem::from_regression(&sample(1), lambda).expect_err("must fail");
        assert!(matches!(err, FixtureError::InvalidRidge { .. }));
    }

    #[test]
    fn new_rejects_non_square_matrix() {
        let m = DenseMatrix::zeros(2, 3).expect("small matrix");
        let err = LinearSystem::new(m, vec![0.0; 2]).expect_err("must fail");
        assert!(matches!(err, FixtureError::ShapeMismatch { .. }));
    }

    #[test]
    fn new_rejects_vector_length_mismatch() {
        let m = DenseMatrix::zeros(2, 2).expect("small matrix");
        let err = LinearSystem::new(m, vec![0.0; 3]).expect_err("must fail");
        assert!(matches!(err, FixtureError::ShapeMismatch { .. }));
    }
}
