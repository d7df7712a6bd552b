//! Dense row-major matrix storage and the handful of operations the fixture
//! builders need.
//!
//! Values live in a flat `Vec<f64>` of length `rows * cols`. Every operation
//! that combines two operands checks their shapes and reports
//! [`FixtureError::ShapeMismatch`] instead of panicking.

use std::fmt;

use crate::error::{FixtureError, Result};

/// A `rows x cols` pair used for diagnostics and format headers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Shape {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Dense `f64` matrix stored in row-major order.
///
/// # Examples
/// ```
/// use linfix_core::DenseMatrix;
///
/// let x = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])
///     .expect("rows have equal length");
/// let gram = x.gram().expect("small matrix");
/// assert_eq!(gram.get(0, 1), Some(14.0));
/// assert_eq!(gram.get(1, 0), Some(14.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl DenseMatrix {
    /// Creates a `rows x cols` matrix of zeros.
    ///
    /// # Errors
    /// Returns [`FixtureError::Overflow`] when `rows * cols` overflows.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let total = checked_total(rows, cols)?;
        Ok(Self {
            data: vec![0.0; total],
            rows,
            cols,
        })
    }

    /// Creates the `n x n` identity matrix.
    ///
    /// # Errors
    /// Returns [`FixtureError::Overflow`] when `n * n` overflows.
    pub fn identity(n: usize) -> Result<Self> {
        let mut matrix = Self::zeros(n, n)?;
        for i in 0..n {
            if let Some(slot) = matrix.data.get_mut(i * n + i) {
                *slot = 1.0;
            }
        }
        Ok(matrix)
    }

    /// Wraps a flat row-major buffer.
    ///
    /// # Errors
    /// Returns [`FixtureError::ShapeMismatch`] when `data.len()` differs from
    /// `rows * cols`, or [`FixtureError::Overflow`] when that product
    /// overflows.
    pub fn from_flat(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let total = checked_total(rows, cols)?;
        if data.len() != total {
            return Err(FixtureError::shape_mismatch(
                "from_flat",
                format!("{total} values"),
                format!("{} values", data.len()),
            ));
        }
        Ok(Self { data, rows, cols })
    }

    /// Builds a matrix from nested rows.
    ///
    /// # Errors
    /// Returns [`FixtureError::ShapeMismatch`] when the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let row_count = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(checked_total(row_count, cols)?);
        for row in rows {
            if row.len() != cols {
                return Err(FixtureError::shape_mismatch(
                    "from_rows",
                    format!("{cols} columns"),
                    format!("{} columns", row.len()),
                ));
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: row_count,
            cols,
        })
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the matrix shape.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        Shape {
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Reports whether the matrix is square.
    #[must_use]
    pub const fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Returns the flat row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Returns the entry at `(row, col)`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    /// Returns row `index` as a slice, or `None` when out of bounds.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.cols;
        self.data.get(start..start + self.cols)
    }

    /// Iterates over the rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // `chunks` rejects a zero size; a zero-column matrix has no entries.
        self.data.chunks(self.cols.max(1)).take(self.rows)
    }

    /// Returns the transpose.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut data = vec![0.0; self.data.len()];
        for (r, row) in self.iter_rows().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if let Some(slot) = data.get_mut(c * self.rows + r) {
                    *slot = *value;
                }
            }
        }
        Self {
            data,
            rows: self.cols,
            cols: self.rows,
        }
    }

    /// Computes the Gram matrix `XᵗX` (`cols x cols`).
    ///
    /// Only the upper triangle is accumulated; the lower triangle is mirrored
    /// from it so the result is exactly symmetric.
    ///
    /// # Errors
    /// Returns [`FixtureError::Overflow`] when `cols * cols` overflows.
    #[expect(
        clippy::float_arithmetic,
        reason = "the Gram product accumulates floating-point dot products"
    )]
    pub fn gram(&self) -> Result<Self> {
        let d = self.cols;
        let mut data = vec![0.0; checked_total(d, d)?];
        for row in self.iter_rows() {
            for (i, xi) in row.iter().enumerate() {
                for (j, xj) in row.iter().enumerate().skip(i) {
                    if let Some(slot) = data.get_mut(i * d + j) {
                        *slot += xi * xj;
                    }
                }
            }
        }
        for i in 0..d {
            for j in 0..i {
                let upper = data.get(j * d + i).copied().unwrap_or_default();
                if let Some(slot) = data.get_mut(i * d + j) {
                    *slot = upper;
                }
            }
        }
        Ok(Self {
            data,
            rows: d,
            cols: d,
        })
    }

    /// Computes `X v` for a vector of length `cols`.
    ///
    /// # Errors
    /// Returns [`FixtureError::ShapeMismatch`] when `v.len() != cols`.
    #[expect(
        clippy::float_arithmetic,
        reason = "matrix-vector products require floating-point arithmetic"
    )]
    pub fn mul_vec(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.cols {
            return Err(FixtureError::shape_mismatch(
                "mul_vec",
                format!("length {}", self.cols),
                format!("length {}", v.len()),
            ));
        }
        Ok(self
            .iter_rows()
            .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
            .collect())
    }

    /// Computes `Xᵗ v` for a vector of length `rows`.
    ///
    /// # Errors
    /// Returns [`FixtureError::ShapeMismatch`] when `v.len() != rows`.
    #[expect(
        clippy::float_arithmetic,
        reason = "matrix-vector products require floating-point arithmetic"
    )]
    pub fn transpose_mul_vec(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.rows {
            return Err(FixtureError::shape_mismatch(
                "transpose_mul_vec",
                format!("length {}", self.rows),
                format!("length {}", v.len()),
            ));
        }
        let mut out = vec![0.0; self.cols];
        for (row, weight) in self.iter_rows().zip(v) {
            for (acc, value) in out.iter_mut().zip(row) {
                *acc += value * weight;
            }
        }
        Ok(out)
    }

    /// Adds `lambda` to every diagonal entry in place.
    #[expect(
        clippy::float_arithmetic,
        reason = "the ridge shift adds to floating-point entries"
    )]
    pub fn add_diagonal(&mut self, lambda: f64) {
        let n = self.rows.min(self.cols);
        for i in 0..n {
            if let Some(slot) = self.data.get_mut(i * self.cols + i) {
                *slot += lambda;
            }
        }
    }

    /// Element-wise sum.
    ///
    /// # Errors
    /// Returns [`FixtureError::ShapeMismatch`] when the shapes differ.
    #[expect(
        clippy::float_arithmetic,
        reason = "element-wise sums of floating-point entries"
    )]
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "checked_add", |a, b| a + b)
    }

    /// Element-wise difference.
    ///
    /// # Errors
    /// Returns [`FixtureError::ShapeMismatch`] when the shapes differ.
    #[expect(
        clippy::float_arithmetic,
        reason = "element-wise differences of floating-point entries"
    )]
    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "checked_sub", |a, b| a - b)
    }

    fn zip_with(
        &self,
        other: &Self,
        operation: &'static str,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(FixtureError::shape_mismatch(
                operation,
                self.shape(),
                other.shape(),
            ));
        }
        Ok(Self {
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| op(*a, *b))
                .collect(),
            rows: self.rows,
            cols: self.cols,
        })
    }
}

/// Element-wise vector sum.
///
/// # Errors
/// Returns [`FixtureError::ShapeMismatch`] when the lengths differ.
#[expect(
    clippy::float_arithmetic,
    reason = "element-wise sums of floating-point entries"
)]
pub fn add_vectors(left: &[f64], right: &[f64]) -> Result<Vec<f64>> {
    zip_vectors(left, right, "add_vectors", |a, b| a + b)
}

/// Element-wise vector difference.
///
/// # Errors
/// Returns [`FixtureError::ShapeMismatch`] when the lengths differ.
#[expect(
    clippy::float_arithmetic,
    reason = "element-wise differences of floating-point entries"
)]
pub fn sub_vectors(left: &[f64], right: &[f64]) -> Result<Vec<f64>> {
    zip_vectors(left, right, "sub_vectors", |a, b| a - b)
}

fn zip_vectors(
    left: &[f64],
    right: &[f64],
    operation: &'static str,
    op: impl Fn(f64, f64) -> f64,
) -> Result<Vec<f64>> {
    if left.len() != right.len() {
        return Err(FixtureError::shape_mismatch(
            operation,
            format!("length {}", left.len()),
            format!("length {}", right.len()),
        ));
    }
    Ok(left.iter().zip(right).map(|(a, b)| op(*a, *b)).collect())
}

pub(crate) fn checked_total(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols).ok_or(FixtureError::Overflow)
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests compare against hand-computed products"
)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn sample() -> DenseMatrix {
        DenseMatrix::from_rows(vec![
            vec![1.0, 2.0, 0.5],
            vec![0.0, 1.0, 3.0],
            vec![2.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ])
        .expect("rows have equal length")
    }

    #[test]
    fn gram_matches_explicit_transpose_product() {
        let x = sample();
        let xt = x.transpose();
        let gram = x.gram().expect("small matrix");
        assert_eq!(gram.shape(), Shape { rows: 3, cols: 3 });
        for i in 0..3 {
            for j in 0..3 {
                let expected: f64 = xt
                    .row(i)
                    .expect("row in range")
                    .iter()
                    .zip(xt.row(j).expect("row in range"))
                    .map(|(a, b)| a * b)
                    .sum();
                let actual = gram.get(i, j).expect("entry in range");
                assert!((actual - expected).abs() < 1e-12, "({i},{j})");
            }
        }
    }

    #[test]
    fn gram_is_exactly_symmetric() {
        let gram = sample().gram().expect("small matrix");
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(gram.get(i, j), gram.get(j, i));
            }
        }
    }

    #[test]
    fn transpose_mul_vec_matches_manual_sum() {
        let x = sample();
        let out = x
            .transpose_mul_vec(&[1.0, 2.0, 3.0, 4.0])
            .expect("length matches rows");
        assert_eq!(out, vec![11.0, 8.0, 13.5]);
    }

    #[test]
    fn mul_vec_matches_manual_sum() {
        let x = sample();
        let out = x.mul_vec(&[1.0, 1.0, 2.0]).expect("length matches cols");
        assert_eq!(out, vec![4.0, 7.0, 4.0, 4.0]);
    }

    #[test]
    fn identity_has_unit_diagonal() {
        let eye = DenseMatrix::identity(3).expect("small identity");
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(eye.get(i, j), Some(expected));
            }
        }
    }

    #[test]
    fn add_diagonal_touches_only_the_diagonal() {
        let mut m = DenseMatrix::zeros(2, 2).expect("small matrix");
        m.add_diagonal(3.0);
        assert_eq!(m.as_slice(), &[3.0, 0.0, 0.0, 3.0]);
    }

    #[rstest]
    #[case::ragged(vec![vec![1.0, 2.0], vec![3.0]])]
    #[case::ragged_tail(vec![vec![1.0], vec![2.0], vec![3.0, 4.0]])]
    fn from_rows_rejects_ragged_input(#[case] rows: Vec<Vec<f64>>) {
        let err = DenseMatrix::from_rows(rows).expect_err("ragged rows must fail");
        assert!(matches!(err, FixtureError::ShapeMismatch { .. }));
    }

    #[test]
    fn from_flat_rejects_wrong_length() {
        let err = DenseMatrix::from_flat(2, 2, vec![1.0; 3]).expect_err("length mismatch");
        assert!(matches!(
            err,
            FixtureError::ShapeMismatch {
                operation: "from_flat",
                ..
            }
        ));
    }

    #[test]
    fn checked_ops_reject_shape_mismatch() {
        let a = DenseMatrix::zeros(2, 2).expect("small matrix");
        let b = DenseMatrix::zeros(2, 3).expect("small matrix");
        assert!(a.checked_add(&b).is_err());
        assert!(a.checked_sub(&b).is_err());
    }

    #[test]
    fn add_then_sub_recovers_operand() {
        let a = sample();
        let b = a.transpose().transpose();
        let sum = a.checked_add(&b).expect("same shape");
        let back = sum.checked_sub(&b).expect("same shape");
        assert_eq!(back, a);
    }

    #[test]
    fn vector_helpers_reject_length_mismatch() {
        assert!(add_vectors(&[1.0], &[1.0, 2.0]).is_err());
        assert!(sub_vectors(&[1.0, 2.0], &[1.0]).is_err());
        assert_eq!(
            add_vectors(&[1.0, 2.0], &[0.5, 0.5]).expect("same length"),
            vec![1.5, 2.5]
        );
    }

    #[test]
    fn out_of_bounds_access_returns_none() {
        let m = sample();
        assert_eq!(m.get(4, 0), None);
        assert_eq!(m.get(0, 3), None);
        assert!(m.row(4).is_none());
    }

    #[test]
    fn zeros_reports_overflow() {
        let err = DenseMatrix::zeros(usize::MAX, 2).expect_err("overflow");
        assert!(matches!(err, FixtureError::Overflow));
    }
}
