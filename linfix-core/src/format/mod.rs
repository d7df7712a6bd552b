//! Whitespace-delimited text format shared with the solver test harness.
//!
//! A matrix block is a `<rows> <cols>` header line followed by one line per
//! row, each entry followed by a single space. A vector block is a `<len>`
//! header line followed by the entries.
//!
//! Two fixture shapes exist:
//!
//! - a plain system: matrix `A` then vector `b`;
//! - a masked instance: masked matrix, masked vector, mask matrix, mask
//!   vector.
//!
//! Every header is derived from the block it introduces.

mod parser;
mod writer;

pub use parser::{
    read_masked_instance, read_masked_instance_from_path, read_system, read_system_from_path,
};
pub use writer::{
    format_value, write_masked_instance, write_masked_instance_to_path, write_system,
    write_system_to_path,
};

/// Layout used for vector blocks.
///
/// # Examples
/// ```
/// use linfix_core::{DenseMatrix, LinearSystem, VectorLayout, write_system};
///
/// let system = LinearSystem::new(DenseMatrix::identity(2).expect("identity"), vec![0.5, 1.5])
///     .expect("shapes agree");
/// let mut separated = Vec::new();
/// write_system(&system, VectorLayout::Separated, &mut separated).expect("in-memory write");
/// assert!(String::from_utf8_lossy(&separated).ends_with("2\n0.5 1.5 \n"));
///
/// let mut legacy = Vec::new();
/// write_system(&system, VectorLayout::Legacy, &mut legacy).expect("in-memory write");
/// assert!(String::from_utf8_lossy(&legacy).ends_with("2\n0.51.5"));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum VectorLayout {
    /// Entries are each followed by a space and the block ends with a newline.
    #[default]
    Separated,
    /// Separator and newline layout of the original generator: plain-system
    /// vector entries are concatenated with no separator and no trailing
    /// newline, and the final mask vector of a masked instance has no
    /// trailing newline. Values still render through [`format_value`], so
    /// exponent forms differ from the original text (`1e-5`, not `1e-05`).
    /// Plain systems written this way cannot be read back.
    Legacy,
}
