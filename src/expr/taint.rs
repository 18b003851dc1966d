/*!

A `Taint` is a set of opaque markers attached to a term. The engine never interprets
markers; it only guarantees propagation: the taint of a constructed term is the union
of its operands' taints plus whatever was attached explicitly, and no rewrite drops a
marker.

Markers are interned strings kept in a sorted, deduplicated small-vec so that the set
is cheap when empty (the overwhelmingly common case), hashable, and deterministic in
iteration order.

*/

use smallvec::SmallVec;

use crate::abstractions::IString;

#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Taint {
  // Sorted by string contents, no duplicates.
  markers: SmallVec<[IString; 1]>,
}

impl Taint {
  #[inline(always)]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn singleton(marker: &str) -> Self {
    let mut taint = Taint::new();
    taint.insert(IString::from(marker));
    taint
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.markers.is_empty()
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.markers.len()
  }

  pub fn contains(&self, marker: &str) -> bool {
    self.markers.binary_search_by(|m| m.as_str().cmp(marker)).is_ok()
  }

  pub fn insert(&mut self, marker: IString) {
    if let Err(position) = self.markers.binary_search_by(|m| m.as_str().cmp(marker.as_str())) {
      self.markers.insert(position, marker);
    }
  }

  /// Unions `other` into `self`.
  pub fn extend_with(&mut self, other: &Taint) {
    for marker in other.markers.iter() {
      self.insert(*marker);
    }
  }

  pub fn union(&self, other: &Taint) -> Taint {
    if other.is_empty() {
      return self.clone();
    }
    if self.is_empty() {
      return other.clone();
    }
    let mut result = self.clone();
    result.extend_with(other);
    result
  }

  pub fn is_superset_of(&self, other: &Taint) -> bool {
    other.markers.iter().all(|m| self.contains(m.as_str()))
  }

  pub fn iter(&self) -> impl Iterator<Item = &IString> {
    self.markers.iter()
  }
}

impl<'a> FromIterator<&'a str> for Taint {
  fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
    let mut taint = Taint::new();
    for marker in iter {
      taint.insert(IString::from(marker));
    }
    taint
  }
}

impl std::fmt::Debug for Taint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_set().entries(self.markers.iter().map(|m| m.as_str())).finish()
  }
}
