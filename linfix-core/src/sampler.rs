//! Regression sampling: random design matrices, coefficients, and noisy
//! targets.

use std::f64::consts::PI;

use rand::Rng;
use tracing::{debug, instrument};

use crate::{
    error::{FixtureError, Result},
    matrix::{DenseMatrix, checked_total},
};

/// Standard deviation of the additive target noise.
pub const NOISE_STD_DEV: f64 = 0.1;

/// A synthetic linear-regression problem `y = Xβ + e`.
///
/// # Examples
/// ```
/// use linfix_core::RegressionSample;
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let sample = RegressionSample::generate(5, 3, &mut rng).expect("valid dimensions");
/// assert_eq!(sample.design().shape().rows, 5);
/// assert_eq!(sample.targets().len(), 5);
/// assert_eq!(sample.coefficients().len(), 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RegressionSample {
    design: DenseMatrix,
    targets: Vec<f64>,
    coefficients: Vec<f64>,
    noise: Vec<f64>,
}

impl RegressionSample {
    /// Draws a regression sample with `rows` observations and `cols` features.
    ///
    /// Entries of `X` and `β` are uniform in `[0, 1)`; the noise is normal
    /// with mean zero and standard deviation [`NOISE_STD_DEV`]. Draws happen
    /// in the order `X` (row-major), `β`, `e`.
    ///
    /// # Errors
    /// Returns [`FixtureError::TooFewColumns`] when `cols <= 1`,
    /// [`FixtureError::ZeroRows`] when `rows == 0`, or
    /// [`FixtureError::Overflow`] when `rows * cols` overflows. Validation
    /// happens before anything is drawn from `rng`.
    #[instrument(name = "sampler.generate", err, skip(rng))]
    #[expect(
        clippy::float_arithmetic,
        reason = "targets are formed from floating-point products and noise"
    )]
    pub fn generate<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Result<Self> {
        validate_dimensions(rows, cols)?;
        let total = checked_total(rows, cols)?;

        let values: Vec<f64> = (0..total).map(|_| rng.gen_range(0.0..1.0)).collect();
        let design = DenseMatrix::from_flat(rows, cols, values)?;
        let coefficients: Vec<f64> = (0..cols).map(|_| rng.gen_range(0.0..1.0)).collect();
        let noise: Vec<f64> = (0..rows)
            .map(|_| standard_normal_sample(rng) * NOISE_STD_DEV)
            .collect();

        let mut targets = design.mul_vec(&coefficients)?;
        for (target, e) in targets.iter_mut().zip(&noise) {
            *target += e;
        }

        debug!(rows, cols, "regression sample drawn");
        Ok(Self {
            design,
            targets,
            coefficients,
            noise,
        })
    }

    /// Returns the design matrix `X`.
    #[must_use]
    pub const fn design(&self) -> &DenseMatrix {
        &self.design
    }

    /// Returns the target vector `y`.
    #[must_use]
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Returns the coefficient vector `β`.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Returns the noise vector `e`.
    #[must_use]
    pub fn noise(&self) -> &[f64] {
        &self.noise
    }
}

/// Rejects dimensions the sampler cannot work with.
///
/// # Errors
/// See [`RegressionSample::generate`].
pub fn validate_dimensions(rows: usize, cols: usize) -> Result<()> {
    if cols <= 1 {
        return Err(FixtureError::TooFewColumns { cols });
    }
    if rows == 0 {
        return Err(FixtureError::ZeroRows);
    }
    checked_total(rows, cols).map(|_| ())
}

/// Draws one standard normal variate with the Box-Muller transform.
#[expect(
    clippy::float_arithmetic,
    reason = "Box-Muller transform requires floating-point arithmetic"
)]
pub(crate) fn standard_normal_sample<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let mut u1: f64 = rng.gen_range(0.0..1.0);
    if u1 <= f64::EPSILON {
        u1 = f64::EPSILON;
    }
    let u2: f64 = rng.gen_range(0.0..1.0);
    let radius = (-2.0 * u1.ln()).sqrt();
    radius * (2.0 * PI * u2).cos()
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests check sample statistics and residuals"
)]
mod tests {
    use super::*;

    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    #[rstest]
    #[case::minimal(1, 2)]
    #[case::tall(50, 3)]
    #[case::wide(3, 10)]
    fn generate_produces_requested_shapes(#[case] rows: usize, #[case] cols: usize) {
        let mut rng = SmallRng::seed_from_u64(42);
        let sample = RegressionSample::generate(rows, cols, &mut rng).expect("valid dimensions");
        assert_eq!(sample.design().rows(), rows);
        assert_eq!(sample.design().cols(), cols);
        assert_eq!(sample.targets().len(), rows);
        assert_eq!(sample.noise().len(), rows);
        assert_eq!(sample.coefficients().len(), cols);
    }

    #[test]
    fn uniform_draws_lie_in_unit_interval() {
        let mut rng = SmallRng::seed_from_u64(3);
        let sample = RegressionSample::generate(20, 4, &mut rng).expect("valid dimensions");
        let in_range = |v: &f64| (0.0..1.0).contains(v);
        assert!(sample.design().as_slice().iter().all(in_range));
        assert!(sample.coefficients().iter().all(in_range));
    }

    #[test]
    fn targets_equal_design_times_coefficients_plus_noise() {
        let mut rng = SmallRng::seed_from_u64(11);
        let sample = RegressionSample::generate(8, 3, &mut rng).expect("valid dimensions");
        let clean = sample
            .design()
            .mul_vec(sample.coefficients())
            .expect("shapes agree");
        for ((y, xb), e) in sample.targets().iter().zip(&clean).zip(sample.noise()) {
            assert!((y - (xb + e)).abs() < 1e-12);
        }
    }

    #[rstest]
    #[case::zero_cols(5, 0)]
    #[case::one_col(5, 1)]
    fn generate_rejects_too_few_columns(#[case] rows: usize, #[case] cols: usize) {
        let mut rng = SmallRng::seed_from_u64(1);
        let untouched = rng.clone();
        let err = RegressionSample::generate(rows, cols, &mut rng).expect_err("cols <= 1 must fail");
        assert!(matches!(err, FixtureError::TooFewColumns { cols: c } if c == cols));
        // No value may have been drawn before the rejection.
        assert_eq!(
            rng.gen_range(0.0..1.0_f64),
            untouched.clone().gen_range(0.0..1.0_f64)
        );
    }

    #[test]
    fn generate_rejects_zero_rows() {
        let mut rng = SmallRng::seed_from_u64(1);
        let err = RegressionSample::generate(0, 3, &mut rng).expect_err("zero rows must fail");
        assert!(matches!(err, FixtureError::ZeroRows));
    }

    #[test]
    fn same_seed_reproduces_the_sample() {
        let a = RegressionSample::generate(6, 3, &mut SmallRng::seed_from_u64(99))
            .expect("valid dimensions");
        let b = RegressionSample::generate(6, 3, &mut SmallRng::seed_from_u64(99))
            .expect("valid dimensions");
        assert_eq!(a, b);
    }

    #[test]
    #[expect(
        clippy::cast_precision_loss,
        reason = "draw count is far below f64 mantissa precision"
    )]
    fn noise_is_roughly_centred_with_expected_spread() {
        let mut rng = SmallRng::seed_from_u64(2024);
        let draws: Vec<f64> = (0..20_000)
            .map(|_| standard_normal_sample(&mut rng) * NOISE_STD_DEV)
            .collect();
        let n = draws.len() as f64;
        let mean = draws.iter().sum::<f64>() / n;
        let variance = draws.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.005, "mean {mean}");
        assert!((variance.sqrt() - NOISE_STD_DEV).abs() < 0.005, "sd {}", variance.sqrt());
    }
}
