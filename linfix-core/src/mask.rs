//! Additive masking of linear systems.
//!
//! A masked instance carries both the disguised system `(A + A_, b + b_)` and
//! the mask `(A_, b_)` itself, so a consumer can recover the original system
//! by subtraction.

use rand::Rng;
use tracing::{debug, instrument};

use crate::{
    error::{FixtureError, Result},
    matrix::{DenseMatrix, add_vectors, checked_total, sub_vectors},
    system::LinearSystem,
};

/// A masked linear system together with the mask that disguises it.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskedSystem {
    masked_matrix: DenseMatrix,
    mask_matrix: DenseMatrix,
    masked_vector: Vec<f64>,
    mask_vector: Vec<f64>,
}

impl MaskedSystem {
    /// Draws an independent uniform `[0, 1)` mask sized to `system` and adds
    /// it to both the matrix and the vector.
    ///
    /// The mask matrix is drawn row-major before the mask vector.
    ///
    /// # Errors
    /// Propagates shape errors from the element-wise sums; these cannot occur
    /// for a well-formed [`LinearSystem`].
    ///
    /// # Examples
    /// ```
    /// use linfix_core::{DenseMatrix, LinearSystem, MaskedSystem};
    /// use rand::{SeedableRng, rngs::SmallRng};
    ///
    /// let eye = DenseMatrix::identity(2).expect("small identity");
    /// let system = LinearSystem::new(eye, vec![1.0, 2.0]).expect("shapes agree");
    /// let masked = MaskedSystem::mask(&system, &mut SmallRng::seed_from_u64(3))
    ///     .expect("mask matches system");
    /// let recovered = masked.unmask().expect("shapes agree");
    /// assert!((recovered.vector()[1] - 2.0).abs() < 1e-12);
    /// ```
    #[instrument(name = "mask.apply", err, skip(system, rng), fields(dimension = system.dimension()))]
    pub fn mask<R: Rng + ?Sized>(system: &LinearSystem, rng: &mut R) -> Result<Self> {
        let d = system.dimension();
        let matrix_values: Vec<f64> = (0..checked_total(d, d)?)
            .map(|_| rng.gen_range(0.0..1.0))
            .collect();
        let mask_matrix = DenseMatrix::from_flat(d, d, matrix_values)?;
        let mask_vector: Vec<f64> = (0..d).map(|_| rng.gen_range(0.0..1.0)).collect();

        let masked_matrix = system.matrix().checked_add(&mask_matrix)?;
        let masked_vector = add_vectors(system.vector(), &mask_vector)?;
        debug!(dimension = d, "mask applied");
        Ok(Self {
            masked_matrix,
            mask_matrix,
            masked_vector,
            mask_vector,
        })
    }

    /// Assembles a masked instance from its four blocks.
    ///
    /// # Errors
    /// Returns [`FixtureError::ShapeMismatch`] when the matrices differ in
    /// shape, are not square, or the vectors do not match their dimension.
    pub fn from_parts(
        masked_matrix: DenseMatrix,
        mask_matrix: DenseMatrix,
        masked_vector: Vec<f64>,
        mask_vector: Vec<f64>,
    ) -> Result<Self> {
        if masked_matrix.shape() != mask_matrix.shape() {
            return Err(FixtureError::shape_mismatch(
                "MaskedSystem::from_parts",
                masked_matrix.shape(),
                mask_matrix.shape(),
            ));
        }
        // Reuse the square-matrix and vector-length checks.
        let masked = LinearSystem::new(masked_matrix, masked_vector)?;
        let mask = LinearSystem::new(mask_matrix, mask_vector)?;
        let (masked_matrix, masked_vector) = masked.into_parts();
        let (mask_matrix, mask_vector) = mask.into_parts();
        Ok(Self {
            masked_matrix,
            mask_matrix,
            masked_vector,
            mask_vector,
        })
    }

    /// Returns `A + A_`.
    #[must_use]
    pub const fn masked_matrix(&self) -> &DenseMatrix {
        &self.masked_matrix
    }

    /// Returns `A_`.
    #[must_use]
    pub const fn mask_matrix(&self) -> &DenseMatrix {
        &self.mask_matrix
    }

    /// Returns `b + b_`.
    #[must_use]
    pub fn masked_vector(&self) -> &[f64] {
        &self.masked_vector
    }

    /// Returns `b_`.
    #[must_use]
    pub fn mask_vector(&self) -> &[f64] {
        &self.mask_vector
    }

    /// Returns the shared dimension `d`.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.masked_matrix.rows()
    }

    /// Recovers the original system by subtracting the mask.
    ///
    /// # Errors
    /// Propagates shape errors; these cannot occur for an instance built by
    /// [`MaskedSystem::mask`] or [`MaskedSystem::from_parts`].
    pub fn unmask(&self) -> Result<LinearSystem> {
        let matrix = self.masked_matrix.checked_sub(&self.mask_matrix)?;
        let vector = sub_vectors(&self.masked_vector, &self.mask_vector)?;
        LinearSystem::new(matrix, vector)
    }

    /// Splits the instance into `(masked_matrix, mask_matrix, masked_vector,
    /// mask_vector)`.
    #[must_use]
    pub fn into_parts(self) -> (DenseMatrix, DenseMatrix, Vec<f64>, Vec<f64>) {
        (
            self.masked_matrix,
            self.mask_matrix,
            self.masked_vector,
            self.mask_vector,
        )
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

    use crate::{sampler::RegressionSample, system::DEFAULT_RIDGE};

    fn system(seed: u64) -> LinearSystem {
        let mut rng = SmallRng::seed_from_u64(seed);
        let sample = RegressionSample::generate(7, 3, &mut rng).expect("valid dimensions");
        LinearSystem::from_regression(&sample, DEFAULT_RIDGE).expect("valid ridge")
    }

    #[test]
    fn unmask_recovers_original_system() {
        let original = system(4);
        let masked =
            MaskedSystem::mask(&original, &mut SmallRng::seed_from_u64(5)).expect("mask fits");
        let recovered = masked.unmask().expect("shapes agree");
        for (got, want) in recovered
            .matrix()
            .as_slice()
            .iter()
            .zip(original.matrix().as_slice())
        {
            assert!((got - want).abs() < 1e-9);
        }
        for (got, want) in recovered.vector().iter().zip(original.vector()) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn mask_entries_are_uniform_unit_interval() {
        let masked =
            MaskedSystem::mask(&system(1), &mut SmallRng::seed_from_u64(2)).expect("mask fits");
        let in_range = |v: &f64| (0.0..1.0).contains(v);
        assert!(masked.mask_matrix().as_slice().iter().all(in_range));
        assert!(masked.mask_vector().iter().all(in_range));
        assert_eq!(masked.mask_matrix().shape(), masked.masked_matrix().shape());
        assert_eq!(masked.dimension(), 3);
    }

    #[test]
    fn into_parts_preserves_block_order() {
        let masked =
            MaskedSystem::mask(&system(9), &mut SmallRng::seed_from_u64(10)).expect("mask fits");
        let clone = masked.clone();
        let (masked_a, mask_a, masked_b, mask_b) = masked.into_parts();
        assert_eq!(&masked_a, clone.masked_matrix());
        assert_eq!(&mask_a, clone.mask_matrix());
        assert_eq!(masked_b, clone.masked_vector());
        assert_eq!(mask_b, clone.mask_vector());
    }

    #[test]
    fn from_parts_rejects_mismatched_matrices() {
        let err = MaskedSystem::from_parts(
            DenseMatrix::zeros(2, 2).expect("small"),
            DenseMatrix::zeros(3, 3).expect("small"),
            vec![0.0; 2],
            vec![0.0; 3],
        )
        .expect_err("must fail");
        assert!(matches!(err, FixtureError::ShapeMismatch { .. }));
    }

    #[test]
    fn from_parts_rejects_short_vector() {
        let err = MaskedSystem::from_parts(
            DenseMatrix::zeros(2, 2).expect("small"),
            DenseMatrix::zeros(2, 2).expect("small"),
            vec![0.0; 2],
            vec![0.0; 1],
        )
        .expect_err("must fail");
        assert!(matches!(err, FixtureError::ShapeMismatch { .. }));
    }
}
