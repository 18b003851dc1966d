/*!

Memoization containers for the visitors.

`VisitCache` maps an input term to the value a visitor produced for it. Keys are
interned terms, so lookup is pointer-cheap and a key keeps its term alive for as long
as the entry exists. The cache is advisory: evicting an entry can only lose sharing,
never correctness, so the long-lived caches are trimmed back to a bound with uniform
random eviction after every top-level visit.

`LruCache` is the small true-LRU memo used by `simplify`.

*/

use rand::seq::IteratorRandom;
use tracing::debug;

use crate::abstractions::HashMap;
use crate::expr::RcExpression;

/// The bound the persistent visitor caches are trimmed back to.
pub const VISIT_CACHE_LIMIT: usize = 256;

/// Capacity of the `simplify` memo.
pub const SIMPLIFY_CACHE_LIMIT: usize = 128;

#[derive(Default)]
pub struct VisitCache<V> {
  map: HashMap<RcExpression, V>,
}

impl<V: Clone> VisitCache<V> {
  pub fn new() -> Self {
    VisitCache { map: HashMap::new() }
  }

  #[inline(always)]
  pub fn get(&self, node: &RcExpression) -> Option<V> {
    self.map.get(node).cloned()
  }

  #[inline(always)]
  pub fn insert(&mut self, node: RcExpression, value: V) {
    self.map.insert(node, value);
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.map.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  pub fn clear(&mut self) {
    self.map.clear();
  }

  /// Evicts uniformly random entries until at most `limit` remain.
  pub fn trim(&mut self, limit: usize) {
    let excess = self.map.len().saturating_sub(limit);
    if excess == 0 {
      return;
    }
    let mut rng = rand::thread_rng();
    let victims: Vec<RcExpression> = self.map.keys().cloned().choose_multiple(&mut rng, excess);
    for victim in victims {
      self.map.remove(&victim);
    }
    debug!(evicted = excess, remaining = self.map.len(), "trimmed visit cache");
  }
}

/// A bounded memo with true least-recently-used eviction. Entries are stamped with a
/// monotone tick on every touch; eviction scans for the stalest stamp, which is fine
/// at this capacity.
pub struct LruCache {
  map:      HashMap<RcExpression, (RcExpression, u64)>,
  tick:     u64,
  capacity: usize,
}

impl LruCache {
  pub fn new(capacity: usize) -> Self {
    assert!(capacity > 0, "LruCache requires a nonzero capacity");
    LruCache { map: HashMap::new(), tick: 0, capacity }
  }

  pub fn get(&mut self, key: &RcExpression) -> Option<RcExpression> {
    self.tick += 1;
    let tick = self.tick;
    self.map.get_mut(key).map(|entry| {
      entry.1 = tick;
      entry.0.clone()
    })
  }

  pub fn insert(&mut self, key: RcExpression, value: RcExpression) {
    self.tick += 1;
    if self.map.len() >= self.capacity && !self.map.contains_key(&key) {
      if let Some(stalest) = self
        .map
        .iter()
        .min_by_key(|(_, (_, stamp))| *stamp)
        .map(|(k, _)| k.clone())
      {
        self.map.remove(&stalest);
      }
    }
    self.map.insert(key, (value, self.tick));
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.map.len()
  }
}
