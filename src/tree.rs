//! An order-preserving table index backed by the B-tree core.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crate::btree::BTreeImpl;
use crate::btree::LEAF_ROWS;
use crate::btree::Leaf;
use crate::btree::Parent;
use crate::btree::Positions;
use crate::btree::SearchKey;
use crate::error::VerifyError;
use crate::index::KeyIndex;
use crate::index::OrderedIndex;
use crate::index::RangeIndex;
use crate::index::TableIndex;

// -----------------------------------------------------------------------------
// Callbacks
// -----------------------------------------------------------------------------

/// Ordering and equality policy for a [`TreeIndex`].
///
/// The required implementation is over the row type itself (`K = R`).
/// Implementing the trait again for further key types enables lookups and
/// ranges with keys distinct from the stored rows.
///
/// `matches` could be derived from two `is_before` calls; it is separate
/// because equality is usually cheaper to answer directly.
pub trait TreeCallbacks<R, K: ?Sized = R> {
  /// Returns `true` if `row` orders strictly before `key`.
  fn is_before(&self, row: &R, key: &K) -> bool;

  /// Returns `true` if `row` matches `key` for the purpose of this index.
  fn matches(&self, row: &R, key: &K) -> bool;
}

// -----------------------------------------------------------------------------
// Search Key Construction
// -----------------------------------------------------------------------------

/// The one [`SearchKey`] implementation: a closure over the callbacks, the
/// row slice, and the probe key, built fresh for each operation.
struct SearchKeyImpl<F> {
  is_after: F,
}

impl<F> SearchKey for SearchKeyImpl<F>
where
  F: Fn(u32) -> bool,
{
  fn search_parent(&self, parent: &Parent) -> usize {
    parent.binary_search(&self.is_after)
  }

  fn search_leaf(&self, leaf: &Leaf) -> usize {
    leaf.binary_search(&self.is_after)
  }

  fn is_after(&self, row: u32) -> bool {
    (self.is_after)(row)
  }
}

fn search_key<'a, R, K, C>(
  callbacks: &'a C,
  rows: &'a [R],
  key: &'a K,
) -> SearchKeyImpl<impl Fn(u32) -> bool + 'a>
where
  K: ?Sized,
  C: TreeCallbacks<R, K>,
{
  SearchKeyImpl {
    is_after: move |row: u32| callbacks.is_before(&rows[row as usize], key),
  }
}

// -----------------------------------------------------------------------------
// Tree Index
// -----------------------------------------------------------------------------

/// A [`Table`] index that keeps rows in comparator order.
///
/// Supports point lookup, half-open ranges, and whole-table ordered
/// iteration. Like [`HashIndex`], it rejects rows that match an existing
/// row.
///
/// # Examples
///
/// ```
/// use mitab::Table;
/// use mitab::TreeCallbacks;
/// use mitab::TreeIndex;
///
/// #[derive(Default)]
/// struct ByValue;
///
/// impl TreeCallbacks<u32> for ByValue {
///   fn is_before(&self, row: &u32, key: &u32) -> bool {
///     row < key
///   }
///
///   fn matches(&self, row: &u32, key: &u32) -> bool {
///     row == key
///   }
/// }
///
/// let mut table: Table<u32, (TreeIndex<ByValue>,)> = Table::new();
///
/// for value in [5, 2, 8, 1] {
///   table.insert(value).unwrap();
/// }
///
/// let sorted: Vec<u32> = table.ordered().copied().collect();
/// assert_eq!(sorted, [1, 2, 5, 8]);
/// ```
///
/// [`Table`]: crate::Table
/// [`HashIndex`]: crate::HashIndex
#[derive(Default)]
pub struct TreeIndex<C> {
  callbacks: C,
  tree: BTreeImpl,
}

impl<C> TreeIndex<C> {
  /// Creates a new, empty index with default-constructed callbacks.
  #[inline]
  pub fn new() -> Self
  where
    C: Default,
  {
    Self::with_callbacks(C::default())
  }

  /// Creates a new, empty index around the given callbacks.
  #[inline]
  pub fn with_callbacks(callbacks: C) -> Self {
    Self {
      callbacks,
      tree: BTreeImpl::new(),
    }
  }
}

impl<C> Debug for TreeIndex<C> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TreeIndex").finish_non_exhaustive()
  }
}

impl<R, C> TableIndex<R> for TreeIndex<C>
where
  C: TreeCallbacks<R>,
{
  fn reserve(&mut self, n: usize) {
    self.tree.reserve(n);
  }

  fn clear(&mut self) {
    self.tree.clear();
  }

  fn insert(&mut self, rows: &[R], pos: usize) -> Option<usize> {
    let Self { callbacks, tree } = self;

    let row: &R = &rows[pos];
    let key = search_key(&*callbacks, rows, row);
    let (leaf, slot) = tree.prepare_insert(&key);

    // The slot the descent landed on is the only candidate duplicate.
    if slot < LEAF_ROWS
      && let Some(existing) = tree.leaf(leaf).rows[slot].get()
      && callbacks.matches(&rows[existing as usize], row)
    {
      return Some(existing as usize);
    }

    tree.commit_insert(leaf, slot, pos as u32);
    None
  }

  fn erase(&mut self, rows: &[R], pos: usize) {
    let Self { callbacks, tree } = self;

    let key = search_key(&*callbacks, rows, &rows[pos]);
    tree.erase(pos as u32, &key);
  }

  fn relocate(&mut self, rows: &[R], old: usize, new: usize) {
    let Self { callbacks, tree } = self;

    let key = search_key(&*callbacks, rows, &rows[old]);
    tree.renumber(old as u32, new as u32, &key);
  }

  fn verify(&self, rows: &[R]) -> Result<(), VerifyError> {
    let less = |a: u32, b: u32| {
      self
        .callbacks
        .is_before(&rows[a as usize], &rows[b as usize])
    };

    self.tree.verify(rows.len(), &less)
  }
}

impl<R, C, K> KeyIndex<R, K> for TreeIndex<C>
where
  K: ?Sized,
  C: TreeCallbacks<R> + TreeCallbacks<R, K>,
{
  fn find(&self, rows: &[R], key: &K) -> Option<usize> {
    let search = search_key(&self.callbacks, rows, key);
    let row: u32 = self.tree.search(&search).get()?;

    if <C as TreeCallbacks<R, K>>::matches(&self.callbacks, &rows[row as usize], key) {
      Some(row as usize)
    } else {
      None
    }
  }
}

impl<R, C, B> RangeIndex<R, B> for TreeIndex<C>
where
  B: ?Sized,
  C: TreeCallbacks<R> + TreeCallbacks<R, B>,
{
  type Range<'a>
    = Positions<'a>
  where
    Self: 'a;

  fn range(&self, rows: &[R], begin: &B, end: &B) -> Positions<'_> {
    let from = self.tree.search(&search_key(&self.callbacks, rows, begin));
    let to = self.tree.search(&search_key(&self.callbacks, rows, end));

    Positions::new(from, to)
  }
}

impl<R, C> OrderedIndex<R> for TreeIndex<C>
where
  C: TreeCallbacks<R>,
{
  type Positions<'a>
    = Positions<'a>
  where
    Self: 'a;

  fn positions(&self) -> Positions<'_> {
    Positions::new(self.tree.begin(), self.tree.end())
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
