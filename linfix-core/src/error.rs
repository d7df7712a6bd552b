//! Error types for the linfix core library.
//!
//! Defines the error enums exposed by the public API and a convenient result
//! alias.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Failures raised while reading the fixture text format back in.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ParseError {
    /// The input ended before the named section was complete.
    #[error("unexpected end of input while reading {section}")]
    UnexpectedEof {
        /// Section of the format being read.
        section: &'static str,
    },
    /// A header token was not a non-negative integer.
    #[error("invalid {section} header token `{token}`")]
    InvalidInteger {
        /// Section of the format being read.
        section: &'static str,
        /// Offending token.
        token: String,
    },
    /// An entry token was not a floating-point number.
    #[error("invalid {section} entry `{token}`")]
    InvalidFloat {
        /// Section of the format being read.
        section: &'static str,
        /// Offending token.
        token: String,
    },
    /// Tokens remained after the last expected block.
    #[error("unexpected trailing data starting with `{token}`")]
    TrailingData {
        /// First unread token.
        token: String,
    },
}

/// Errors produced while sampling, building, or serializing fixtures.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The design matrix must have more than one column.
    #[error("column count must be greater than one (got {cols})")]
    TooFewColumns {
        /// Requested column count.
        cols: usize,
    },
    /// The design matrix must have at least one row.
    #[error("row count must be greater than zero")]
    ZeroRows,
    /// The requested `rows * cols` overflowed `usize`.
    #[error("rows * cols overflows usize")]
    Overflow,
    /// The ridge constant was negative or non-finite.
    #[error("ridge constant must be finite and non-negative (got {lambda})")]
    InvalidRidge {
        /// Rejected ridge constant.
        lambda: f64,
    },
    /// Two operands of a matrix or vector operation disagreed in shape.
    #[error("shape mismatch in {operation}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Operation that detected the mismatch.
        operation: &'static str,
        /// Expected shape, rendered for display.
        expected: String,
        /// Actual shape, rendered for display.
        actual: String,
    },
    /// The destination directory does not exist or is not a directory.
    #[error("destination `{path}` is not an existing directory")]
    DestinationMissing {
        /// Rejected destination path.
        path: PathBuf,
    },
    /// Creating, writing, or reading a fixture file failed.
    #[error("I/O failure on `{path}`: {source}")]
    Io {
        /// Path of the file being accessed.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Reading from or writing to a caller-supplied stream failed.
    #[error("fixture stream I/O failed: {0}")]
    Stream(#[source] io::Error),
    /// A fixture file could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

define_error_codes! {
    /// Machine-readable error codes for [`FixtureError`].
    enum FixtureErrorCode for FixtureError {
        /// The design matrix had one column or fewer.
        TooFewColumns => TooFewColumns { .. } => "LINFIX_TOO_FEW_COLUMNS",
        /// The design matrix had no rows.
        ZeroRows => ZeroRows => "LINFIX_ZERO_ROWS",
        /// Dimension product overflowed.
        Overflow => Overflow => "LINFIX_OVERFLOW",
        /// Ridge constant was negative or non-finite.
        InvalidRidge => InvalidRidge { .. } => "LINFIX_INVALID_RIDGE",
        /// Operand shapes disagreed.
        ShapeMismatch => ShapeMismatch { .. } => "LINFIX_SHAPE_MISMATCH",
        /// Destination directory was missing.
        DestinationMissing => DestinationMissing { .. } => "LINFIX_DESTINATION_MISSING",
        /// File I/O failed.
        Io => Io { .. } => "LINFIX_IO",
        /// Stream I/O failed.
        Stream => Stream(..) => "LINFIX_STREAM",
        /// Parsing failed.
        Parse => Parse(..) => "LINFIX_PARSE",
    }
}

impl FixtureError {
    pub(crate) fn shape_mismatch(
        operation: &'static str,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::ShapeMismatch {
            operation,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Convenient result alias for fallible fixture operations.
pub type Result<T, E = FixtureError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(FixtureError::TooFewColumns { cols: 1 }, "LINFIX_TOO_FEW_COLUMNS")]
    #[case(FixtureError::ZeroRows, "LINFIX_ZERO_ROWS")]
    #[case(FixtureError::InvalidRidge { lambda: -1.0 }, "LINFIX_INVALID_RIDGE")]
    #[case(
        FixtureError::Parse(ParseError::UnexpectedEof { section: "matrix" }),
        "LINFIX_PARSE"
    )]
    #[case(
        FixtureError::Stream(io::Error::other("sink closed")),
        "LINFIX_STREAM"
    )]
    fn codes_are_stable(#[case] error: FixtureError, #[case] expected: &str) {
        assert_eq!(error.code().as_str(), expected);
        assert_eq!(error.code().to_string(), expected);
    }

    #[test]
    fn too_few_columns_message_names_the_count() {
        let err = FixtureError::TooFewColumns { cols: 1 };
        assert_eq!(err.to_string(), "column count must be greater than one (got 1)");
    }
}
