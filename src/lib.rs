//! An in-memory multi-index table.
//!
//! `mitab` provides [`Table`], a dense, insertion-ordered store of rows of a
//! caller-defined type, kept synchronized with any number of pluggable
//! **indexes**. Where a traditional map stores key/value pairs, a table
//! stores plain rows and lets the application decide how they are indexed:
//! by a field, by a computed property, hashed or ordered, one index or
//! several (which is how you build a bimap).
//!
//! Three index types ship with the crate:
//!
//! - [`HashIndex`] — duplicate-rejecting lookup through a caller-supplied
//!   hash/equality policy ([`HashCallbacks`]). Linear probing over
//!   cache-friendly 8-byte buckets with cached hash codes and tombstones.
//! - [`TreeIndex`] — ordered lookup, ranges, and sorted iteration through a
//!   caller-supplied comparator ([`TreeCallbacks`]). A B-tree of 64-byte
//!   cache-line nodes storing row positions, not row copies.
//! - [`InsertionOrderIndex`] — stable iteration in insertion order.
//!
//! # Usage
//!
//! ```
//! use mitab::HashCallbacks;
//! use mitab::HashIndex;
//! use mitab::Table;
//! use mitab::TreeCallbacks;
//! use mitab::TreeIndex;
//!
//! struct Employee {
//!   id: u32,
//!   name: &'static str,
//! }
//!
//! // Unique hash index over `id`, with `u32` lookup keys.
//! #[derive(Default)]
//! struct ById;
//!
//! impl HashCallbacks<Employee> for ById {
//!   fn hash_code(&self, key: &Employee) -> u32 {
//!     key.id.wrapping_mul(0x9e37_79b9)
//!   }
//!
//!   fn matches(&self, row: &Employee, key: &Employee) -> bool {
//!     row.id == key.id
//!   }
//! }
//!
//! impl HashCallbacks<Employee, u32> for ById {
//!   fn hash_code(&self, key: &u32) -> u32 {
//!     key.wrapping_mul(0x9e37_79b9)
//!   }
//!
//!   fn matches(&self, row: &Employee, key: &u32) -> bool {
//!     row.id == *key
//!   }
//! }
//!
//! // Ordered index over `name`, with `str` lookup keys.
//! #[derive(Default)]
//! struct ByName;
//!
//! impl TreeCallbacks<Employee> for ByName {
//!   fn is_before(&self, row: &Employee, key: &Employee) -> bool {
//!     row.name < key.name
//!   }
//!
//!   fn matches(&self, row: &Employee, key: &Employee) -> bool {
//!     row.name == key.name
//!   }
//! }
//!
//! impl TreeCallbacks<Employee, str> for ByName {
//!   fn is_before(&self, row: &Employee, key: &str) -> bool {
//!     row.name < key
//!   }
//!
//!   fn matches(&self, row: &Employee, key: &str) -> bool {
//!     row.name == key
//!   }
//! }
//!
//! let mut table: Table<Employee, (HashIndex<ById>, TreeIndex<ByName>)> = Table::new();
//!
//! table.insert(Employee { id: 3, name: "cerf" }).unwrap();
//! table.insert(Employee { id: 1, name: "ada" }).unwrap();
//! table.insert(Employee { id: 2, name: "brin" }).unwrap();
//!
//! // Point lookup through the first index, by key type.
//! assert_eq!(table.find(&2).map(|e| e.name), Some("brin"));
//!
//! // Ordered traversal through the second index.
//! let names: Vec<&str> = table.ordered_by::<1>().map(|e| e.name).collect();
//! assert_eq!(names, ["ada", "brin", "cerf"]);
//!
//! // A duplicate id is vetoed and the table rolls back atomically.
//! assert!(table.insert(Employee { id: 1, name: "dijkstra" }).is_err());
//! assert_eq!(table.len(), 3);
//! ```
//!
//! # Positions and mutation
//!
//! Rows are identified by dense 0-based *position*. Erasing moves the last
//! row into the vacated slot, so positions and iterators are invalidated by
//! every mutation; [`Table::position_of`] converts a borrowed row back into
//! a position, and [`Table::erase_all`] is the sanctioned way to erase while
//! traversing.
//!
//! # Writing an index
//!
//! Indexes are ordinary values implementing [`TableIndex`]; the optional
//! capabilities ([`KeyIndex`], [`RangeIndex`], [`OrderedIndex`]) unlock the
//! corresponding [`Table`] operations. An index stores positions, never row
//! values or references, which is what makes growth of the backing sequence
//! and swap-with-last erasure safe.
//!
//! # Limits
//!
//! No internal synchronization: a table is a single-owner value. The index
//! encodings reserve two sentinel values of a 32-bit slot, bounding a table
//! to `2^30` rows.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod btree;
mod error;
mod hash;
mod index;
mod order;
mod table;
mod tree;

pub use self::btree::Positions;
pub use self::error::TableError;
pub use self::error::VerifyError;
pub use self::hash::HashCallbacks;
pub use self::hash::HashIndex;
pub use self::index::IndexList;
pub use self::index::KeyIndex;
pub use self::index::OrderedIndex;
pub use self::index::Pick;
pub use self::index::RangeIndex;
pub use self::index::TableIndex;
pub use self::order::Chain;
pub use self::order::InsertionOrderIndex;
pub use self::table::Table;
pub use self::tree::TreeCallbacks;
pub use self::tree::TreeIndex;
