//! Pseudorandom fixtures for linear-regression and linear-system solvers.
//!
//! The pipeline runs one way: a [`RegressionSample`] is drawn, turned into
//! ridge-regularised normal equations ([`LinearSystem`]), optionally disguised
//! with an additive mask ([`MaskedSystem`]), and serialized to the
//! whitespace-delimited text format read by the solver test harness.
//!
//! ```
//! use linfix_core::{LinearSystem, MaskedSystem, RegressionSample, VectorLayout,
//!     write_masked_instance};
//! use rand::{SeedableRng, rngs::SmallRng};
//!
//! let mut rng = SmallRng::seed_from_u64(42);
//! let sample = RegressionSample::generate(5, 3, &mut rng).expect("valid dimensions");
//! let system = LinearSystem::from_regression(&sample, 3.0).expect("valid ridge");
//! let masked = MaskedSystem::mask(&system, &mut rng).expect("mask fits");
//!
//! let mut out = Vec::new();
//! write_masked_instance(&masked, VectorLayout::Separated, &mut out).expect("in-memory write");
//! assert!(String::from_utf8_lossy(&out).starts_with("3 3\n"));
//! ```

mod error;
mod format;
mod generator;
mod mask;
mod matrix;
mod sampler;
mod system;

pub use crate::{
    error::{FixtureError, FixtureErrorCode, ParseError, Result},
    format::{
        VectorLayout, format_value, read_masked_instance, read_masked_instance_from_path,
        read_system, read_system_from_path, write_masked_instance, write_masked_instance_to_path,
        write_system, write_system_to_path,
    },
    generator::{
        FIXTURE_EXTENSION, Fixture, FixtureGenerator, FixtureKind, GeneratorBuilder,
        GeneratorConfig, fixture_file_name, generate_fixture,
    },
    mask::MaskedSystem,
    matrix::{DenseMatrix, Shape, add_vectors, sub_vectors},
    sampler::{NOISE_STD_DEV, RegressionSample, validate_dimensions},
    system::{DEFAULT_RIDGE, LinearSystem, validate_ridge},
};
