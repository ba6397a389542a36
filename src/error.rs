//! Error types reported by [`Table`] operations.
//!
//! [`Table`]: crate::Table

use thiserror::Error;

// -----------------------------------------------------------------------------
// Table Errors
// -----------------------------------------------------------------------------

/// An error returned by a fallible [`Table`] operation.
///
/// [`Table`]: crate::Table
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TableError {
  /// An insert was vetoed because some index already contains a matching row.
  #[error("row matches an existing row in a unique index")]
  DuplicateRow,

  /// A position-taking operation received a position outside `0..len`.
  #[error("position {pos} is out of range for a table of {len} rows")]
  OutOfRange {
    /// The offending position.
    pos: usize,
    /// The number of live rows at the time of the call.
    len: usize,
  },

  /// An index failed its integrity self-check.
  ///
  /// This is only returned by [`Table::verify`]; inconsistencies detected
  /// during must-not-fail index callbacks are logged instead.
  ///
  /// [`Table::verify`]: crate::Table::verify
  #[error("index {index} failed verification")]
  InvariantViolation {
    /// Ordinal of the failing index in the construction list.
    index: usize,
    /// The specific inconsistency.
    #[source]
    source: VerifyError,
  },
}

// -----------------------------------------------------------------------------
// Verification Errors
// -----------------------------------------------------------------------------

/// A specific inconsistency found by an index integrity check.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum VerifyError {
  /// The index covers a different number of rows than the table holds.
  #[error("index covers {found} rows, table holds {expected}")]
  CountMismatch {
    /// The number of live table rows.
    expected: usize,
    /// The number of rows the index covers.
    found: usize,
  },

  /// A live table row has no entry in the index.
  #[error("row {pos} is missing from the index")]
  MissingRow {
    /// The position of the uncovered row.
    pos: usize,
  },

  /// The index refers to a position at or beyond the table size.
  #[error("position {pos} is out of bounds for a table of {len} rows")]
  StalePosition {
    /// The out-of-bounds position.
    pos: usize,
    /// The number of live rows at the time of the check.
    len: usize,
  },

  /// The index refers to the same position more than once.
  #[error("position {pos} appears more than once in the index")]
  DuplicatePosition {
    /// The repeated position.
    pos: usize,
  },

  /// An ordered index yielded two rows out of order.
  #[error("rows {left} and {right} are out of order")]
  OrderViolation {
    /// Position yielded first.
    left: usize,
    /// Position yielded second, which compares before `left`.
    right: usize,
  },

  /// A cached hash code does not match the row it is stored for.
  #[error("cached hash for row {pos} does not match its current hash")]
  HashMismatch {
    /// The position with the stale cached hash.
    pos: usize,
  },

  /// A hash index exceeds its documented 2/3 load factor.
  #[error("load factor exceeds 2/3 ({occupied} of {buckets} buckets occupied)")]
  Overloaded {
    /// Occupied buckets, counting tombstones.
    occupied: usize,
    /// Total buckets.
    buckets: usize,
  },

  /// A structural invariant of the index representation is broken.
  #[error("broken structure: {0}")]
  Structure(&'static str),
}
