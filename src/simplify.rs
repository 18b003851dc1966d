/*!

The top-level simplification API: `simplify` composes the constant folder with the
arithmetic simplifier and memoizes the composition in a small true-LRU cache;
`to_constant` additionally concretizes the result into a native value where it can.

*/

use std::cell::RefCell;

use crate::expr::{Expression, RcExpression, Sort};
use crate::visitor::arithmetic::arithmetic_simplify;
use crate::visitor::constant_fold::constant_fold;
use crate::visitor::{LruCache, SIMPLIFY_CACHE_LIMIT};

thread_local! {
  static SIMPLIFY_MEMO: RefCell<LruCache> = RefCell::new(LruCache::new(SIMPLIFY_CACHE_LIMIT));
}

/// Constant folding followed by arithmetic simplification, to a fixed point.
pub fn simplify(expression: &RcExpression) -> RcExpression {
  if let Some(hit) = SIMPLIFY_MEMO.with(|memo| memo.borrow_mut().get(expression)) {
    return hit;
  }
  let folded = constant_fold(expression);
  let simplified = arithmetic_simplify(&folded);
  SIMPLIFY_MEMO.with(|memo| {
    memo.borrow_mut().insert(expression.clone(), simplified.clone())
  });
  simplified
}

/// What `to_constant` managed to make of a term.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Concrete {
  Bool(bool),
  Word(u128),
  Bytes(Vec<u8>),
  /// Still symbolic; holds the simplified term.
  Term(RcExpression),
}

/// Simplifies `expression` and concretizes the result: constants yield their value,
/// and a byte-valued array with a declared `index_max` yields its contents when
/// every cell simplifies to a constant.
pub fn to_constant(expression: &RcExpression) -> Concrete {
  let value = arithmetic_simplify(expression);
  if let Some(b) = value.bool_value() {
    return Concrete::Bool(b);
  }
  if let Some(v) = value.bitvec_value() {
    return Concrete::Word(v);
  }
  if let Sort::Array { index_width, value_width } = value.sort() {
    if value_width == 8 {
      if let Some(count) = value.index_max() {
        if let Some(bytes) = concretize_bytes(&value, index_width, count) {
          return Concrete::Bytes(bytes);
        }
      }
    }
  }
  Concrete::Term(value)
}

fn concretize_bytes(array: &RcExpression, index_width: u32, count: u64) -> Option<Vec<u8>> {
  let mut bytes = Vec::with_capacity(count as usize);
  for i in 0..count {
    let cell = simplify(&Expression::select(
      array.clone(),
      Expression::bitvec_constant(index_width, i as u128),
    ));
    match cell.bitvec_value() {
      Some(value) => bytes.push(value as u8),
      None => return None,
    }
  }
  Some(bytes)
}
