//! A hash-based table index using linear probing.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crate::error::VerifyError;
use crate::index::KeyIndex;
use crate::index::TableIndex;

// -----------------------------------------------------------------------------
// Callbacks
// -----------------------------------------------------------------------------

/// Hashing and equality policy for a [`HashIndex`].
///
/// The required implementation is over the row type itself (`K = R`).
/// Implementing the trait again for further key types enables
/// [`Table::find`] with lookup keys distinct from the stored rows.
///
/// Matching keys must have equal hash codes. Non-matching keys with equal
/// hash codes are legal but cost extra probes.
///
/// [`Table::find`]: crate::Table::find
pub trait HashCallbacks<R, K: ?Sized = R> {
  /// Computes the hash code of `key`.
  fn hash_code(&self, key: &K) -> u32;

  /// Returns `true` if `row` matches `key` for the purpose of this index.
  fn matches(&self, row: &R, key: &K) -> bool;
}

// -----------------------------------------------------------------------------
// Bucket
// -----------------------------------------------------------------------------

/// One probe slot: the cached hash and a position biased by 2.
///
/// `value` of 0 is an empty bucket and 1 a tombstone, so a zeroed bucket
/// array is valid and the stored position is `value - 2`. Caching the hash
/// means a collision costs neither a row fetch nor an equality call unless
/// the cached hashes already agree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Bucket {
  hash: u32,
  value: u32,
}

const EMPTY: u32 = 0;
const ERASED: u32 = 1;

impl Bucket {
  #[inline]
  const fn occupied(hash: u32, pos: usize) -> Self {
    Self {
      hash,
      value: pos as u32 + 2,
    }
  }

  #[inline]
  const fn is_empty(self) -> bool {
    self.value == EMPTY
  }

  #[inline]
  const fn is_erased(self) -> bool {
    self.value == ERASED
  }

  #[inline]
  const fn is_occupied(self) -> bool {
    self.value >= 2
  }

  #[inline]
  const fn is_pos(self, pos: usize) -> bool {
    self.value == pos as u32 + 2
  }

  #[inline]
  const fn pos(self) -> usize {
    debug_assert!(self.value >= 2);
    (self.value - 2) as usize
  }
}

/// Advances a linear probe by one slot, wrapping at the end of the array.
#[inline]
const fn probe(len: usize, i: usize) -> usize {
  if i + 1 == len { 0 } else { i + 1 }
}

// -----------------------------------------------------------------------------
// Hash Index
// -----------------------------------------------------------------------------

/// A [`Table`] index backed by a linear-probing hash table.
///
/// The index rejects duplicates: inserting a row that matches an existing
/// row (per the [`HashCallbacks`] equality) vetoes the table insertion.
///
/// Erased entries leave tombstones to preserve probe chains; tombstones are
/// reclaimed on rehash, and the load factor counting them is kept at or
/// below 2/3.
///
/// # Examples
///
/// ```
/// use mitab::HashCallbacks;
/// use mitab::HashIndex;
/// use mitab::Table;
///
/// #[derive(Default)]
/// struct ByValue;
///
/// impl HashCallbacks<u32> for ByValue {
///   fn hash_code(&self, key: &u32) -> u32 {
///     key.wrapping_mul(0x9e37_79b9)
///   }
///
///   fn matches(&self, row: &u32, key: &u32) -> bool {
///     row == key
///   }
/// }
///
/// let mut table: Table<u32, (HashIndex<ByValue>,)> = Table::new();
///
/// table.insert(7).unwrap();
/// assert!(table.insert(7).is_err());
/// assert_eq!(table.find(&7), Some(&7));
/// ```
///
/// [`Table`]: crate::Table
#[derive(Clone, Default)]
pub struct HashIndex<C> {
  callbacks: C,
  buckets: Vec<Bucket>,
  erased: usize,
}

impl<C> HashIndex<C> {
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
      buckets: Vec::new(),
      erased: 0,
    }
  }

  /// Rebuilds the bucket array at the next power of two >= `target`.
  ///
  /// Occupied buckets are re-placed by their cached hash; no row is
  /// re-hashed and tombstones are dropped.
  fn rehash(&mut self, target: usize) {
    let size: usize = usize::max(target, 4).next_power_of_two();
    let mut buckets: Vec<Bucket> = vec![Bucket::default(); size];

    for old in &self.buckets {
      if old.is_occupied() {
        let mut i: usize = old.hash as usize % size;

        while !buckets[i].is_empty() {
          i = probe(size, i);
        }

        buckets[i] = *old;
      }
    }

    self.buckets = buckets;
    self.erased = 0;
  }

  /// Probes for the bucket holding `pos`, starting from `hash`.
  ///
  /// Returns `None` if an empty bucket is reached first, which means the
  /// index and the table disagree about `pos` being live.
  fn locate(&self, hash: u32, pos: usize) -> Option<usize> {
    if self.buckets.is_empty() {
      return None;
    }

    let len: usize = self.buckets.len();
    let mut i: usize = hash as usize % len;

    loop {
      let bucket: Bucket = self.buckets[i];

      if bucket.is_pos(pos) {
        return Some(i);
      }

      if bucket.is_empty() {
        return None;
      }

      i = probe(len, i);
    }
  }
}

impl<C> Debug for HashIndex<C> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("HashIndex")
      .field("buckets", &self.buckets.len())
      .field("erased", &self.erased)
      .finish_non_exhaustive()
  }
}

impl<R, C> TableIndex<R> for HashIndex<C>
where
  C: HashCallbacks<R>,
{
  fn reserve(&mut self, n: usize) {
    if self.buckets.len() < n * 2 {
      self.rehash(n * 2);
    }
  }

  fn clear(&mut self) {
    self.erased = 0;
    self.buckets.fill(Bucket::default());
  }

  fn insert(&mut self, rows: &[R], pos: usize) -> Option<usize> {
    if self.buckets.len() * 2 < (rows.len() + self.erased) * 3 {
      // Load factor above 2/3 counting tombstones.
      self.rehash(usize::max(self.buckets.len() * 2, rows.len() * 2));
    }

    let hash: u32 = self.callbacks.hash_code(&rows[pos]);
    let len: usize = self.buckets.len();

    let mut tombstone: Option<usize> = None;
    let mut i: usize = hash as usize % len;

    loop {
      let bucket: Bucket = self.buckets[i];

      if bucket.is_empty() {
        // No duplicate; prefer reusing the first tombstone on the chain.
        let slot: usize = match tombstone {
          Some(slot) => {
            self.erased -= 1;
            slot
          }
          None => i,
        };

        self.buckets[slot] = Bucket::occupied(hash, pos);
        return None;
      }

      if bucket.is_erased() {
        if tombstone.is_none() {
          tombstone = Some(i);
        }
      } else if bucket.hash == hash && self.callbacks.matches(&rows[bucket.pos()], &rows[pos]) {
        return Some(bucket.pos());
      }

      i = probe(len, i);
    }
  }

  fn erase(&mut self, rows: &[R], pos: usize) {
    let hash: u32 = self.callbacks.hash_code(&rows[pos]);

    match self.locate(hash, pos) {
      Some(i) => {
        self.buckets[i].value = ERASED;
        self.erased += 1;
      }
      None => {
        tracing::error!(pos, "hash index inconsistency: no bucket for erased row");
      }
    }
  }

  fn relocate(&mut self, rows: &[R], old: usize, new: usize) {
    let hash: u32 = self.callbacks.hash_code(&rows[old]);

    match self.locate(hash, old) {
      Some(i) => {
        self.buckets[i].value = new as u32 + 2;
      }
      None => {
        tracing::error!(old, new, "hash index inconsistency: no bucket for moved row");
      }
    }
  }

  fn verify(&self, rows: &[R]) -> Result<(), VerifyError> {
    let len: usize = rows.len();

    let mut seen: Vec<bool> = vec![false; len];
    let mut occupied: usize = 0;

    for bucket in &self.buckets {
      if !bucket.is_occupied() {
        continue;
      }

      occupied += 1;

      let pos: usize = bucket.pos();

      if pos >= len {
        return Err(VerifyError::StalePosition { pos, len });
      }

      if bucket.hash != self.callbacks.hash_code(&rows[pos]) {
        return Err(VerifyError::HashMismatch { pos });
      }

      if seen[pos] {
        return Err(VerifyError::DuplicatePosition { pos });
      }

      seen[pos] = true;
    }

    if occupied != len {
      return Err(VerifyError::CountMismatch {
        expected: len,
        found: occupied,
      });
    }

    for pos in 0..len {
      if self.locate(self.callbacks.hash_code(&rows[pos]), pos).is_none() {
        return Err(VerifyError::MissingRow { pos });
      }
    }

    if (occupied + self.erased) * 3 > self.buckets.len() * 2 {
      return Err(VerifyError::Overloaded {
        occupied: occupied + self.erased,
        buckets: self.buckets.len(),
      });
    }

    Ok(())
  }
}

impl<R, C, K> KeyIndex<R, K> for HashIndex<C>
where
  K: ?Sized,
  C: HashCallbacks<R> + HashCallbacks<R, K>,
{
  fn find(&self, rows: &[R], key: &K) -> Option<usize> {
    if self.buckets.is_empty() {
      return None;
    }

    let hash: u32 = <C as HashCallbacks<R, K>>::hash_code(&self.callbacks, key);
    let len: usize = self.buckets.len();

    let mut i: usize = hash as usize % len;

    loop {
      let bucket: Bucket = self.buckets[i];

      if bucket.is_empty() {
        return None;
      }

      if bucket.is_occupied()
        && bucket.hash == hash
        && <C as HashCallbacks<R, K>>::matches(&self.callbacks, &rows[bucket.pos()], key)
      {
        return Some(bucket.pos());
      }

      i = probe(len, i);
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use ahash::RandomState;

  use crate::error::VerifyError;
  use crate::hash::Bucket;
  use crate::hash::HashCallbacks;
  use crate::hash::HashIndex;
  use crate::index::KeyIndex;
  use crate::index::TableIndex;

  #[derive(Clone, Copy, Debug, PartialEq, Eq)]
  struct User {
    id: u32,
    name: &'static str,
  }

  struct ById {
    state: RandomState,
  }

  impl Default for ById {
    fn default() -> Self {
      Self {
        state: RandomState::with_seeds(7, 11, 13, 17),
      }
    }
  }

  impl HashCallbacks<User> for ById {
    fn hash_code(&self, key: &User) -> u32 {
      self.state.hash_one(key.id) as u32
    }

    fn matches(&self, row: &User, key: &User) -> bool {
      row.id == key.id
    }
  }

  impl HashCallbacks<User, u32> for ById {
    fn hash_code(&self, key: &u32) -> u32 {
      self.state.hash_one(*key) as u32
    }

    fn matches(&self, row: &User, key: &u32) -> bool {
      row.id == *key
    }
  }

  fn user(id: u32) -> User {
    User { id, name: "" }
  }

  fn fill(index: &mut HashIndex<ById>, rows: &[User]) {
    for pos in 0..rows.len() {
      assert_eq!(index.insert(rows, pos), None);
    }
  }

  #[test]
  fn find_on_zero_buckets() {
    let index: HashIndex<ById> = HashIndex::new();

    assert_eq!(index.find(&[], &1_u32), None);
    assert_eq!(index.verify(&[] as &[User]), Ok(()));
  }

  #[test]
  fn insert_and_find() {
    let rows: Vec<User> = (0..16).map(user).collect();
    let mut index: HashIndex<ById> = HashIndex::new();

    fill(&mut index, &rows);

    for pos in 0..rows.len() {
      assert_eq!(index.find(&rows, &(pos as u32)), Some(pos));
    }

    assert_eq!(index.find(&rows, &99_u32), None);
    assert_eq!(index.verify(&rows), Ok(()));
  }

  #[test]
  fn insert_rejects_duplicates() {
    let rows: Vec<User> = vec![user(1), user(2), user(1)];
    let mut index: HashIndex<ById> = HashIndex::new();

    assert_eq!(index.insert(&rows, 0), None);
    assert_eq!(index.insert(&rows, 1), None);
    assert_eq!(index.insert(&rows, 2), Some(0));
  }

  #[test]
  fn erase_leaves_tombstone() {
    let rows: Vec<User> = (0..8).map(user).collect();
    let mut index: HashIndex<ById> = HashIndex::new();

    fill(&mut index, &rows);
    index.erase(&rows, 3);

    assert_eq!(index.erased, 1);
    assert_eq!(index.find(&rows, &3_u32), None);
    assert_eq!(index.find(&rows, &4_u32), Some(4));
  }

  #[test]
  fn insert_reuses_tombstone() {
    let rows: Vec<User> = vec![user(1), user(2), user(3)];
    let mut index: HashIndex<ById> = HashIndex::new();

    fill(&mut index, &rows);
    index.erase(&rows, 2);

    assert_eq!(index.erased, 1);

    // Reinserting the same key probes the same chain and reclaims the
    // tombstone instead of consuming a fresh bucket.
    assert_eq!(index.insert(&rows, 2), None);
    assert_eq!(index.erased, 0);
    assert_eq!(index.find(&rows, &3_u32), Some(2));
  }

  #[test]
  fn relocate_rewrites_position() {
    let rows: Vec<User> = (0..4).map(user).collect();
    let mut index: HashIndex<ById> = HashIndex::new();

    fill(&mut index, &rows);

    // The coordinator erases position 1 and moves the back row into it.
    index.erase(&rows, 1);
    index.relocate(&rows, 3, 1);

    let rows: Vec<User> = vec![user(0), user(3), user(2)];

    assert_eq!(index.find(&rows, &3_u32), Some(1));
    assert_eq!(index.verify(&rows), Ok(()));
  }

  // Scenario: Inserts grow the table through several rehashes.
  // Expected: The load factor (counting tombstones) stays at or below 2/3
  // and every row remains findable.
  #[test]
  fn rehash_keeps_load_factor() {
    let rows: Vec<User> = (0..500).map(user).collect();
    let mut index: HashIndex<ById> = HashIndex::new();

    for pos in 0..rows.len() {
      assert_eq!(index.insert(&rows[..pos + 1], pos), None);
      assert!((pos + 1 + index.erased) * 3 <= index.buckets.len() * 2);
    }

    assert_eq!(index.verify(&rows), Ok(()));
  }

  #[test]
  fn reserve_sizes_buckets() {
    let mut index: HashIndex<ById> = HashIndex::new();

    TableIndex::<User>::reserve(&mut index, 100);

    let buckets: usize = index.buckets.len();

    assert!(buckets >= 200);
    assert!(buckets.is_power_of_two());

    // Idempotent: a smaller reserve leaves the array alone.
    TableIndex::<User>::reserve(&mut index, 50);
    assert_eq!(index.buckets.len(), buckets);
  }

  #[test]
  fn clear_keeps_allocation() {
    let rows: Vec<User> = (0..8).map(user).collect();
    let mut index: HashIndex<ById> = HashIndex::new();

    fill(&mut index, &rows);

    let buckets: usize = index.buckets.len();

    TableIndex::<User>::clear(&mut index);

    assert_eq!(index.buckets.len(), buckets);
    assert_eq!(index.find(&rows, &1_u32), None);
  }

  #[test]
  fn verify_detects_stale_position() {
    let rows: Vec<User> = vec![user(1), user(2)];
    let mut index: HashIndex<ById> = HashIndex::new();

    fill(&mut index, &rows);

    assert_eq!(
      index.verify(&rows[..1]),
      Err(VerifyError::StalePosition { pos: 1, len: 1 }),
    );
  }

  #[test]
  fn verify_detects_missing_row() {
    let rows: Vec<User> = vec![user(1), user(2)];
    let mut index: HashIndex<ById> = HashIndex::new();

    fill(&mut index, &rows);

    // Wipe a bucket behind the index's back.
    for bucket in index.buckets.iter_mut() {
      if bucket.is_occupied() && bucket.pos() == 1 {
        *bucket = Bucket::default();
      }
    }

    assert!(matches!(
      index.verify(&rows),
      Err(VerifyError::CountMismatch { .. }) | Err(VerifyError::MissingRow { .. }),
    ));
  }
}
