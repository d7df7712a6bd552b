//! Serialization of systems and masked instances.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::{Span, field, instrument};

use super::VectorLayout;
use crate::{
    error::{FixtureError, Result},
    mask::MaskedSystem,
    matrix::DenseMatrix,
    system::LinearSystem,
};

/// Renders a value as the shortest decimal that round-trips, always keeping a
/// decimal point or exponent (`3.0`, `0.125`, `1e-7`).
///
/// # Examples
/// ```
/// use linfix_core::format_value;
///
/// assert_eq!(format_value(3.0), "3.0");
/// assert_eq!(format_value(0.125), "0.125");
/// ```
#[must_use]
pub fn format_value(value: f64) -> String {
    format!("{value:?}")
}

/// Writes a plain system: matrix `A` followed by vector `b`.
///
/// # Errors
/// Returns [`FixtureError::Stream`] when `writer` fails.
pub fn write_system(
    system: &LinearSystem,
    layout: VectorLayout,
    mut writer: impl Write,
) -> Result<()> {
    write_system_blocks(system, layout, &mut writer).map_err(FixtureError::Stream)
}

/// Writes a masked instance: masked matrix, masked vector, mask matrix, mask
/// vector.
///
/// # Errors
/// Returns [`FixtureError::Stream`] when `writer` fails.
pub fn write_masked_instance(
    instance: &MaskedSystem,
    layout: VectorLayout,
    mut writer: impl Write,
) -> Result<()> {
    write_masked_blocks(instance, layout, &mut writer).map_err(FixtureError::Stream)
}

/// Creates (or truncates) `path` and writes a plain system to it.
///
/// # Errors
/// Returns [`FixtureError::Io`] when the file cannot be created, written, or
/// flushed. A failed write may leave a truncated file behind.
#[instrument(name = "format.write_system", err, skip(system), fields(path = field::Empty))]
pub fn write_system_to_path(
    system: &LinearSystem,
    layout: VectorLayout,
    path: &Path,
) -> Result<()> {
    Span::current().record("path", field::display(path.display()));
    with_file(path, |writer| write_system_blocks(system, layout, writer))
}

/// Creates (or truncates) `path` and writes a masked instance to it.
///
/// # Errors
/// Returns [`FixtureError::Io`] when the file cannot be created, written, or
/// flushed. A failed write may leave a truncated file behind.
#[instrument(name = "format.write_masked_instance", err, skip(instance), fields(path = field::Empty))]
pub fn write_masked_instance_to_path(
    instance: &MaskedSystem,
    layout: VectorLayout,
    path: &Path,
) -> Result<()> {
    Span::current().record("path", field::display(path.display()));
    with_file(path, |writer| write_masked_blocks(instance, layout, writer))
}

fn with_file(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<()> {
    let to_error = |source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    body(&mut writer).map_err(to_error)?;
    writer.flush().map_err(to_error)
}

fn write_system_blocks(
    system: &LinearSystem,
    layout: VectorLayout,
    writer: &mut impl Write,
) -> io::Result<()> {
    write_matrix_block(system.matrix(), writer)?;
    match layout {
        VectorLayout::Separated => write_vector_block(system.vector(), true, writer),
        VectorLayout::Legacy => write_concatenated_vector_block(system.vector(), writer),
    }
}

fn write_masked_blocks(
    instance: &MaskedSystem,
    layout: VectorLayout,
    writer: &mut impl Write,
) -> io::Result<()> {
    write_matrix_block(instance.masked_matrix(), writer)?;
    write_vector_block(instance.masked_vector(), true, writer)?;
    write_matrix_block(instance.mask_matrix(), writer)?;
    let trailing_newline = layout == VectorLayout::Separated;
    write_vector_block(instance.mask_vector(), trailing_newline, writer)
}

fn write_matrix_block(matrix: &DenseMatrix, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "{} {}", matrix.rows(), matrix.cols())?;
    for row in matrix.iter_rows() {
        for value in row {
            write!(writer, "{} ", format_value(*value))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_vector_block(
    vector: &[f64],
    trailing_newline: bool,
    writer: &mut impl Write,
) -> io::Result<()> {
    writeln!(writer, "{}", vector.len())?;
    for value in vector {
        write!(writer, "{} ", format_value(*value))?;
    }
    if trailing_newline {
        writeln!(writer)?;
    }
    Ok(())
}

fn write_concatenated_vector_block(vector: &[f64], writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "{}", vector.len())?;
    for value in vector {
        writer.write_all(format_value(*value).as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn small_system() -> LinearSystem {
        let matrix = DenseMatrix::from_rows(vec![vec![4.0, 1.5], vec![1.5, 3.0]])
            .expect("rows have equal length");
        LinearSystem::new(matrix, vec![0.25, 2.0]).expect("shapes agree")
    }

    fn small_instance() -> MaskedSystem {
        MaskedSystem::from_parts(
            DenseMatrix::from_rows(vec![vec![4.5, 2.0], vec![1.75, 3.5]]).expect("rows"),
            DenseMatrix::from_rows(vec![vec![0.5, 0.5], vec![0.25, 0.5]]).expect("rows"),
            vec![1.0, 2.5],
            vec![0.75, 0.5],
        )
        .expect("shapes agree")
    }

    fn render(body: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        body(&mut buffer).expect("in-memory write");
        String::from_utf8(buffer).expect("output is UTF-8")
    }

    #[rstest]
    #[case(3.0, "3.0")]
    #[case(0.1, "0.1")]
    #[case(0.125, "0.125")]
    #[case(1e-7, "1e-7")]
    #[case(1e-5, "1e-5")]
    #[case(-2.5, "-2.5")]
    fn format_value_keeps_a_decimal_marker(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_value(value), expected);
    }

    #[test]
    fn written_entries_match_format_value() {
        let matrix = DenseMatrix::from_rows(vec![vec![1e-7, 0.0], vec![0.0, 1e21]]).expect("rows");
        let system = LinearSystem::new(matrix, vec![-1e-5, 2.0]).expect("shapes agree");
        for layout in [VectorLayout::Separated, VectorLayout::Legacy] {
            let text = render(|buf| write_system(&system, layout, buf));
            let tokens: Vec<&str> = text.split_ascii_whitespace().skip(2).take(4).collect();
            let expected: Vec<String> = [1e-7, 0.0, 0.0, 1e21].map(format_value).into();
            assert_eq!(tokens, expected);
            let tail = match layout {
                VectorLayout::Separated => format!("2\n{} {} \n", format_value(-1e-5), format_value(2.0)),
                VectorLayout::Legacy => format!("2\n{}{}", format_value(-1e-5), format_value(2.0)),
            };
            assert!(text.ends_with(&tail), "{text:?}");
        }
    }

    #[test]
    fn separated_system_layout() {
        let text = render(|buf| write_system(&small_system(), VectorLayout::Separated, buf));
        assert_eq!(text, "2 2\n4.0 1.5 \n1.5 3.0 \n2\n0.25 2.0 \n");
    }

    #[test]
    fn legacy_system_layout_concatenates_vector() {
        let text = render(|buf| write_system(&small_system(), VectorLayout::Legacy, buf));
        assert_eq!(text, "2 2\n4.0 1.5 \n1.5 3.0 \n2\n0.252.0");
    }

    #[test]
    fn separated_masked_layout() {
        let text = render(|buf| {
            write_masked_instance(&small_instance(), VectorLayout::Separated, buf)
        });
        assert_eq!(
            text,
            concat!(
                "2 2\n4.5 2.0 \n1.75 3.5 \n",
                "2\n1.0 2.5 \n",
                "2 2\n0.5 0.5 \n0.25 0.5 \n",
                "2\n0.75 0.5 \n",
            )
        );
    }

    #[test]
    fn legacy_masked_layout_omits_final_newline() {
        let text =
            render(|buf| write_masked_instance(&small_instance(), VectorLayout::Legacy, buf));
        assert!(text.ends_with("2\n0.75 0.5 "));
        assert!(text.starts_with("2 2\n4.5 2.0 \n"));
    }

    #[test]
    fn write_to_missing_directory_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent").join("fixture.test");
        let err = write_system_to_path(&small_system(), VectorLayout::Separated, &path)
            .expect_err("parent directory is missing");
        match err {
            FixtureError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn write_to_path_matches_in_memory_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fixture.test");
        write_masked_instance_to_path(&small_instance(), VectorLayout::Separated, &path)
            .expect("file write");
        let on_disk = std::fs::read_to_string(&path).expect("file readable");
        let in_memory = render(|buf| {
            write_masked_instance(&small_instance(), VectorLayout::Separated, buf)
        });
        assert_eq!(on_disk, in_memory);
    }
}
