//! Reading fixtures back in.
//!
//! Tokens are separated by arbitrary whitespace, matching how the solver
//! harness scans the files, so line structure is not significant.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::SplitAsciiWhitespace;

use tracing::instrument;

use crate::{
    error::{FixtureError, ParseError, Result},
    mask::MaskedSystem,
    matrix::{DenseMatrix, checked_total},
    system::LinearSystem,
};

/// Parses a plain system written with [`VectorLayout::Separated`].
///
/// [`VectorLayout::Separated`]: crate::VectorLayout::Separated
///
/// # Errors
/// Returns [`FixtureError::Stream`] when reading fails, or
/// [`FixtureError::Parse`] / [`FixtureError::ShapeMismatch`] for malformed
/// content.
pub fn read_system(mut reader: impl BufRead) -> Result<LinearSystem> {
    let text = read_all(&mut reader)?;
    let mut tokens = Tokens::new(&text);
    let matrix = tokens.matrix("matrix")?;
    let vector = tokens.vector("vector")?;
    tokens.finish()?;
    LinearSystem::new(matrix, vector)
}

/// Parses a masked instance.
///
/// # Errors
/// Returns [`FixtureError::Stream`] when reading fails, or
/// [`FixtureError::Parse`] / [`FixtureError::ShapeMismatch`] for malformed
/// content.
pub fn read_masked_instance(mut reader: impl BufRead) -> Result<MaskedSystem> {
    let text = read_all(&mut reader)?;
    let mut tokens = Tokens::new(&text);
    let masked_matrix = tokens.matrix("masked matrix")?;
    let masked_vector = tokens.vector("masked vector")?;
    let mask_matrix = tokens.matrix("mask matrix")?;
    let mask_vector = tokens.vector("mask vector")?;
    tokens.finish()?;
    MaskedSystem::from_parts(masked_matrix, mask_matrix, masked_vector, mask_vector)
}

/// Opens `path` and parses a plain system from it.
///
/// # Errors
/// Returns [`FixtureError::Io`] when the file cannot be opened or read, and
/// the errors of [`read_system`] otherwise.
#[instrument(name = "format.read_system", err)]
pub fn read_system_from_path(path: &Path) -> Result<LinearSystem> {
    read_system(open(path)?).map_err(|err| attach_path(err, path))
}

/// Opens `path` and parses a masked instance from it.
///
/// # Errors
/// Returns [`FixtureError::Io`] when the file cannot be opened or read, and
/// the errors of [`read_masked_instance`] otherwise.
#[instrument(name = "format.read_masked_instance", err)]
pub fn read_masked_instance_from_path(path: &Path) -> Result<MaskedSystem> {
    read_masked_instance(open(path)?).map_err(|err| attach_path(err, path))
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

fn attach_path(err: FixtureError, path: &Path) -> FixtureError {
    match err {
        FixtureError::Stream(source) => FixtureError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}

fn read_all(reader: &mut impl BufRead) -> Result<String> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(FixtureError::Stream)?;
    Ok(text)
}

struct Tokens<'a> {
    inner: SplitAsciiWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_ascii_whitespace(),
        }
    }

    fn next(&mut self, section: &'static str) -> Result<&'a str, ParseError> {
        self.inner
            .next()
            .ok_or(ParseError::UnexpectedEof { section })
    }

    fn count(&mut self, section: &'static str) -> Result<usize, ParseError> {
        let token = self.next(section)?;
        token.parse().map_err(|_| ParseError::InvalidInteger {
            section,
            token: token.to_owned(),
        })
    }

    fn values(&mut self, section: &'static str, len: usize) -> Result<Vec<f64>, ParseError> {
        (0..len)
            .map(|_| {
                let token = self.next(section)?;
                token.parse().map_err(|_| ParseError::InvalidFloat {
                    section,
                    token: token.to_owned(),
                })
            })
            .collect()
    }

    fn matrix(&mut self, section: &'static str) -> Result<DenseMatrix> {
        let rows = self.count(section)?;
        let cols = self.count(section)?;
        let values = self.values(section, checked_total(rows, cols)?)?;
        DenseMatrix::from_flat(rows, cols, values)
    }

    fn vector(&mut self, section: &'static str) -> Result<Vec<f64>> {
        let len = self.count(section)?;
        Ok(self.values(section, len)?)
    }

    fn finish(mut self) -> Result<(), ParseError> {
        match self.inner.next() {
            Some(token) => Err(ParseError::TrailingData {
                token: token.to_owned(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use rstest::rstest;

    const SYSTEM: &str = "2 2\n4.0 1.5 \n1.5 3.0 \n2\n0.25 2.0 \n";
    const MASKED: &str = concat!(
        "2 2\n4.5 2.0 \n1.75 3.5 \n",
        "2\n1.0 2.5 \n",
        "2 2\n0.5 0.5 \n0.25 0.5 \n",
        "2\n0.75 0.5 ",
    );

    #[test]
    fn reads_plain_system() {
        let system = read_system(Cursor::new(SYSTEM)).expect("well-formed input");
        assert_eq!(system.matrix().as_slice(), &[4.0, 1.5, 1.5, 3.0]);
        assert_eq!(system.vector(), &[0.25, 2.0]);
    }

    #[test]
    fn reads_masked_instance_without_final_newline() {
        let instance = read_masked_instance(Cursor::new(MASKED)).expect("well-formed input");
        assert_eq!(instance.masked_matrix().as_slice(), &[4.5, 2.0, 1.75, 3.5]);
        assert_eq!(instance.masked_vector(), &[1.0, 2.5]);
        assert_eq!(instance.mask_matrix().as_slice(), &[0.5, 0.5, 0.25, 0.5]);
        assert_eq!(instance.mask_vector(), &[0.75, 0.5]);
    }

    #[rstest]
    #[case::truncated("2 2\n4.0 1.5 \n1.5", ParseError::UnexpectedEof { section: "matrix" })]
    #[case::missing_vector("2 2\n4.0 1.5 \n1.5 3.0 \n", ParseError::UnexpectedEof { section: "vector" })]
    #[case::bad_header(
        "two 2\n",
        ParseError::InvalidInteger { section: "matrix", token: "two".to_owned() }
    )]
    #[case::bad_entry(
        "2 2\n4.0 x \n",
        ParseError::InvalidFloat { section: "matrix", token: "x".to_owned() }
    )]
    #[case::trailing(
        "2 2\n4.0 1.5 \n1.5 3.0 \n2\n0.25 2.0 \n9",
        ParseError::TrailingData { token: "9".to_owned() }
    )]
    fn rejects_malformed_systems(#[case] input: &str, #[case] expected: ParseError) {
        let err = read_system(Cursor::new(input)).expect_err("malformed input must fail");
        match err {
            FixtureError::Parse(actual) => assert_eq!(actual, expected),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn legacy_concatenated_vector_is_not_readable() {
        let input = "2 2\n4.0 1.5 \n1.5 3.0 \n2\n0.252.0";
        let err = read_system(Cursor::new(input)).expect_err("concatenated vector");
        assert!(matches!(err, FixtureError::Parse(_)));
    }

    #[test]
    fn rejects_non_square_system() {
        let err = read_system(Cursor::new("1 2\n1.0 2.0 \n1\n3.0 \n")).expect_err("non-square");
        assert!(matches!(err, FixtureError::ShapeMismatch { .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing.test");
        let err = read_masked_instance_from_path(&path).expect_err("missing file");
        match err {
            FixtureError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
