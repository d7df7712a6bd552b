//! Batch generation of fixture files.
//!
//! A [`FixtureGenerator`] owns one random stream for its whole batch, so
//! successive fixtures are consecutive draws from that stream rather than
//! independently seeded instances.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{Span, debug, field, info, instrument};

use crate::{
    error::{FixtureError, Result},
    format::{VectorLayout, write_masked_instance_to_path, write_system_to_path},
    mask::MaskedSystem,
    sampler::{RegressionSample, validate_dimensions},
    system::{DEFAULT_RIDGE, LinearSystem, validate_ridge},
};

/// Extension shared by every fixture file.
pub const FIXTURE_EXTENSION: &str = "test";

/// Which fixture shape to produce.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FixtureKind {
    /// Masked normal equations, written as a four-block instance.
    #[default]
    Masked,
    /// Plain normal equations, written as a two-block system.
    System,
}

impl FixtureKind {
    /// File name prefix for this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Masked => "test_LS",
            Self::System => "test_LR",
        }
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Masked => "masked",
            Self::System => "system",
        })
    }
}

/// Returns the file name of fixture `index` for an `rows x cols` design.
///
/// # Examples
/// ```
/// use linfix_core::{FixtureKind, fixture_file_name};
///
/// assert_eq!(fixture_file_name(FixtureKind::Masked, 5, 3, 0), "test_LS_5x3_0.test");
/// assert_eq!(fixture_file_name(FixtureKind::System, 5, 3, 2), "test_LR_5x3_2.test");
/// ```
#[must_use]
pub fn fixture_file_name(kind: FixtureKind, rows: usize, cols: usize, index: usize) -> String {
    format!(
        "{}_{rows}x{cols}_{index}.{FIXTURE_EXTENSION}",
        kind.prefix()
    )
}

/// Validated generator settings.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    rows: usize,
    cols: usize,
    ridge: f64,
    kind: FixtureKind,
    layout: VectorLayout,
    seed: Option<u64>,
}

impl GeneratorConfig {
    /// Number of design-matrix rows `n`.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of design-matrix columns `d`.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Ridge constant `λ`.
    #[must_use]
    pub const fn ridge(&self) -> f64 {
        self.ridge
    }

    /// Fixture shape.
    #[must_use]
    pub const fn kind(&self) -> FixtureKind {
        self.kind
    }

    /// Vector block layout.
    #[must_use]
    pub const fn layout(&self) -> VectorLayout {
        self.layout
    }

    /// Explicit seed, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Configures and constructs [`FixtureGenerator`] instances.
///
/// # Examples
/// ```
/// use linfix_core::{FixtureKind, GeneratorBuilder};
///
/// let generator = GeneratorBuilder::new()
///     .with_rows(5)
///     .with_cols(3)
///     .with_seed(42)
///     .build()
///     .expect("configuration is valid");
/// assert_eq!(generator.config().kind(), FixtureKind::Masked);
/// assert_eq!(generator.config().ridge(), 3.0);
/// ```
#[derive(Clone, Debug)]
pub struct GeneratorBuilder {
    rows: usize,
    cols: usize,
    ridge: f64,
    kind: FixtureKind,
    layout: VectorLayout,
    seed: Option<u64>,
}

impl Default for GeneratorBuilder {
    fn default() -> Self {
        Self {
            rows: 1,
            cols: 2,
            ridge: DEFAULT_RIDGE,
            kind: FixtureKind::default(),
            layout: VectorLayout::default(),
            seed: None,
        }
    }
}

impl GeneratorBuilder {
    /// Creates a builder populated with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of design-matrix rows.
    #[must_use]
    pub const fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Sets the number of design-matrix columns.
    #[must_use]
    pub const fn with_cols(mut self, cols: usize) -> Self {
        self.cols = cols;
        self
    }

    /// Overrides the ridge constant.
    #[must_use]
    pub const fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }

    /// Selects the fixture shape.
    #[must_use]
    pub const fn with_kind(mut self, kind: FixtureKind) -> Self {
        self.kind = kind;
        self
    }

    /// Selects the vector block layout.
    #[must_use]
    pub const fn with_layout(mut self, layout: VectorLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Seeds the random stream for reproducible batches.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration and constructs a generator.
    ///
    /// # Errors
    /// Returns [`FixtureError::TooFewColumns`], [`FixtureError::ZeroRows`],
    /// [`FixtureError::Overflow`], or [`FixtureError::InvalidRidge`] for
    /// rejected settings.
    pub fn build(self) -> Result<FixtureGenerator> {
        validate_dimensions(self.rows, self.cols)?;
        validate_ridge(self.ridge)?;
        let config = GeneratorConfig {
            rows: self.rows,
            cols: self.cols,
            ridge: self.ridge,
            kind: self.kind,
            layout: self.layout,
            seed: self.seed,
        };
        let rng = config
            .seed
            .map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);
        Ok(FixtureGenerator { config, rng })
    }
}

/// One generated fixture, held in memory until it is written.
#[derive(Clone, Debug, PartialEq)]
pub enum Fixture {
    /// Masked normal equations.
    Masked(MaskedSystem),
    /// Plain normal equations.
    System(LinearSystem),
}

impl Fixture {
    /// Writes the fixture to `path` using `layout`.
    ///
    /// # Errors
    /// Returns [`FixtureError::Io`] when the file cannot be written.
    pub fn write_to_path(&self, layout: VectorLayout, path: &Path) -> Result<()> {
        match self {
            Self::Masked(instance) => write_masked_instance_to_path(instance, layout, path),
            Self::System(system) => write_system_to_path(system, layout, path),
        }
    }
}

/// Produces fixtures from a single random stream.
#[derive(Debug)]
pub struct FixtureGenerator {
    config: GeneratorConfig,
    rng: SmallRng,
}

impl FixtureGenerator {
    /// Returns the validated configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Draws the next fixture from the generator's stream.
    ///
    /// # Errors
    /// Propagates sampling and building failures; none occur for a
    /// configuration accepted by [`GeneratorBuilder::build`].
    pub fn next_fixture(&mut self) -> Result<Fixture> {
        generate_fixture(&self.config, &mut self.rng)
    }

    /// Writes `count` fixtures into `dest`, returning the written paths in
    /// order.
    ///
    /// `dest` must be an existing directory; this is checked before any
    /// value is drawn. Files are written one after another and the first
    /// failure aborts the batch, leaving earlier files in place.
    ///
    /// # Errors
    /// Returns [`FixtureError::DestinationMissing`] when `dest` is not a
    /// directory, or the first error raised while generating or writing.
    #[instrument(
        name = "generator.write_batch",
        err,
        skip(self),
        fields(dest = field::Empty, kind = %self.config.kind, rows = self.config.rows, cols = self.config.cols),
    )]
    pub fn write_batch(&mut self, dest: &Path, count: usize) -> Result<Vec<PathBuf>> {
        Span::current().record("dest", field::display(dest.display()));
        if !dest.is_dir() {
            return Err(FixtureError::DestinationMissing {
                path: dest.to_path_buf(),
            });
        }

        // `count` is caller-supplied; grow as files land.
        let mut written = Vec::new();
        for index in 0..count {
            let path = dest.join(fixture_file_name(
                self.config.kind,
                self.config.rows,
                self.config.cols,
                index,
            ));
            let fixture = self.next_fixture()?;
            fixture.write_to_path(self.config.layout, &path)?;
            debug!(index, path = %path.display(), "fixture written");
            written.push(path);
        }

        info!(count = written.len(), "batch completed");
        Ok(written)
    }
}

/// Runs the full pipeline once: sample, build normal equations, and mask
/// when the configuration asks for it.
///
/// # Errors
/// Propagates sampling and building failures.
pub fn generate_fixture<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Result<Fixture> {
    let sample = RegressionSample::generate(config.rows, config.cols, rng)?;
    let system = LinearSystem::from_regression(&sample, config.ridge)?;
    match config.kind {
        FixtureKind::System => Ok(Fixture::System(system)),
        FixtureKind::Masked => Ok(Fixture::Masked(MaskedSystem::mask(&system, rng)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn builder(rows: usize, cols: usize) -> GeneratorBuilder {
        GeneratorBuilder::new()
            .with_rows(rows)
            .with_cols(cols)
            .with_seed(7)
    }

    #[rstest]
    #[case(FixtureKind::Masked, "test_LS_10x4_3.test")]
    #[case(FixtureKind::System, "test_LR_10x4_3.test")]
    fn file_names_follow_kind_prefix(#[case] kind: FixtureKind, #[case] expected: &str) {
        assert_eq!(fixture_file_name(kind, 10, 4, 3), expected);
    }

    #[rstest]
    #[case::one_col(builder(5, 1))]
    #[case::zero_rows(builder(0, 3))]
    #[case::negative_ridge(builder(5, 3).with_ridge(-0.5))]
    fn build_rejects_invalid_settings(#[case] builder: GeneratorBuilder) {
        assert!(builder.build().is_err());
    }

    #[test]
    fn seeded_generators_agree() {
        let mut a = builder(5, 3).build().expect("valid");
        let mut b = builder(5, 3).build().expect("valid");
        assert_eq!(
            a.next_fixture().expect("fixture"),
            b.next_fixture().expect("fixture")
        );
    }

    #[test]
    fn successive_fixtures_advance_the_stream() {
        let mut generator = builder(5, 3).build().expect("valid");
        let first = generator.next_fixture().expect("fixture");
        let second = generator.next_fixture().expect("fixture");
        assert_ne!(first, second);
    }

    #[test]
    fn system_kind_yields_plain_system() {
        let mut generator = builder(4, 2)
            .with_kind(FixtureKind::System)
            .build()
            .expect("valid");
        let fixture = generator.next_fixture().expect("fixture");
        assert!(matches!(fixture, Fixture::System(ref s) if s.dimension() == 2));
    }

    #[test]
    fn write_batch_rejects_missing_destination() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope");
        let mut generator = builder(5, 3).build().expect("valid");
        let err = generator
            .write_batch(&missing, 1)
            .expect_err("destination is missing");
        assert!(matches!(err, FixtureError::DestinationMissing { .. }));
    }

    #[test]
    fn huge_count_stops_at_first_write_failure() {
        let dir = tempfile::tempdir().expect("temp dir");
        let blocked = dir.path().join("test_LS_2x2_0.test");
        std::fs::create_dir(&blocked).expect("block first path");
        let mut generator = builder(2, 2).build().expect("valid");
        let err = generator
            .write_batch(dir.path(), usize::MAX)
            .expect_err("first path is a directory");
        match err {
            FixtureError::Io { path, .. } => assert_eq!(path, blocked),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn write_batch_with_zero_count_writes_nothing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut generator = builder(5, 3).build().expect("valid");
        let written = generator.write_batch(dir.path(), 0).expect("empty batch");
        assert!(written.is_empty());
        let entries = std::fs::read_dir(dir.path()).expect("readable").count();
        assert_eq!(entries, 0);
    }
}
