/*!

The intern table implements structural sharing of term nodes.

Every constructed `Expression` passes through [`intern`], which returns the canonical
`Rc` for its structure-plus-taint. This

1. reduces memory by eliminating duplicate representations;
2. makes structural equality a pointer comparison, which the visitor caches use as
   their key discipline;
3. keeps a rebuild with unchanged operands pointer-identical to its input, so
   fixed-point rewriting terminates by pointer comparison alone.

The table holds `Weak` references: a term lives only as long as some client or cache
holds it, and dead entries are swept lazily. The table is thread-local; the engine is
single-threaded by contract.

*/

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tracing::trace;

use crate::abstractions::{HashMap, HashType};
use crate::expr::expression::{Expression, RcExpression};

/// Dead-entry sweeps start once the table has grown past this many buckets.
const SWEEP_FLOOR: usize = 1024;

#[derive(Default)]
struct HashConsTable {
  buckets:  HashMap<HashType, SmallVec<[Weak<Expression>; 1]>>,
  sweep_at: usize,
}

impl HashConsTable {
  /// Returns the canonical node for `candidate`, inserting it if no canonical
  /// version exists.
  fn intern(&mut self, candidate: Expression) -> RcExpression {
    let bucket = self.buckets.entry(candidate.structural_hash()).or_default();
    bucket.retain(|weak| weak.strong_count() > 0);

    for weak in bucket.iter() {
      if let Some(canonical) = weak.upgrade() {
        if *canonical == candidate {
          return canonical;
        }
      }
    }

    let canonical = Rc::new(candidate);
    bucket.push(Rc::downgrade(&canonical));

    if self.buckets.len() > self.sweep_at.max(SWEEP_FLOOR) {
      self.sweep();
    }
    canonical
  }

  /// Drops buckets whose every entry has died.
  fn sweep(&mut self) {
    let before = self.buckets.len();
    self.buckets.retain(|_, bucket| {
      bucket.retain(|weak| weak.strong_count() > 0);
      !bucket.is_empty()
    });
    self.sweep_at = 2 * self.buckets.len();
    trace!(
      before,
      after = self.buckets.len(),
      "swept intern table"
    );
  }
}

thread_local! {
  static TABLE: RefCell<HashConsTable> = RefCell::new(HashConsTable::default());
}

/// Interns a freshly built node, returning its canonical `Rc`.
pub(crate) fn intern(candidate: Expression) -> RcExpression {
  TABLE.with(|table| table.borrow_mut().intern(candidate))
}
