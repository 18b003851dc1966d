/*!

The arithmetic simplifier: local, pattern-directed identities applied in fixed-point
mode, with the constant folder as the generic fallback once every operand of a node
has become concrete.

Every rule is sound as a model equivalence under the declared sorts, and every rule
either shrinks a well-founded measure (term depth, constant count, chain length) or
returns its input, so the per-node fixed point terminates. Rules that return one of
the node's operands hand it back unchanged, taint and all; rules that build a new
node attach the rewritten node's taint on top of the operands' own.

Contract note: a shift left by a constant at least as large as the width passes the
*left operand* through rather than rewriting to zero; callers rely on the
pass-through. Fully concrete shifts still evaluate to zero through the folder.

*/

use std::cell::RefCell;

use smallvec::smallvec;

use crate::expr::{mask, operation, Expression, Operator, RcExpression, Width};
use crate::visitor::cache::{VisitCache, VISIT_CACHE_LIMIT};
use crate::visitor::constant_fold::constant_fold;
use crate::visitor::{evaluate, Rewrite, Rewriter};

thread_local! {
  static ARITH_CACHE: RefCell<VisitCache<RcExpression>> = RefCell::new(VisitCache::new());
}

/// Rewrites `expression` to a fixed point of the local identity catalog.
pub fn arithmetic_simplify(expression: &RcExpression) -> RcExpression {
  ARITH_CACHE.with(|cell| {
    let mut cache = cell.borrow_mut();
    let mut simplifier = Rewrite(ArithmeticSimplifier { cache: &mut *cache });
    let result = evaluate(&mut simplifier, expression);
    drop(simplifier);
    cache.trim(VISIT_CACHE_LIMIT);
    result
  })
}

struct ArithmeticSimplifier<'c> {
  cache: &'c mut VisitCache<RcExpression>,
}

impl<'c> Rewriter for ArithmeticSimplifier<'c> {
  const FIXED_POINT: bool = true;

  fn rewrite(&mut self, node: &RcExpression, args: &[RcExpression]) -> Option<RcExpression> {
    use Operator::*;
    let op = node.operator()?;

    let specific = match op {
      BoolIte | BitVecIte => simplify_ite(args),
      BitVecExtract { begin, end } => simplify_extract(node, begin, end),
      BitVecAdd => simplify_add(args),
      BitVecSub => simplify_sub(args),
      BitVecOr => simplify_or(node, args),
      BitVecAnd => simplify_and(node, args),
      BitVecShiftLeft => simplify_shift_left(args),
      ArraySelect => simplify_select(node, args),
      _ => None,
    };

    specific.or_else(|| {
      // Generic arm: once every operand is concrete, the folder takes over.
      if args.iter().all(|a| a.is_constant()) {
        let folded = constant_fold(node);
        if !Expression::ptr_eq(&folded, node) {
          return Some(folded);
        }
      }
      None
    })
  }

  fn rewrite_cache(&mut self) -> &mut VisitCache<RcExpression> {
    self.cache
  }
}

/// Same node, or equal-valued constants of one width.
fn same_constant(a: &RcExpression, b: &RcExpression) -> bool {
  if Expression::ptr_eq(a, b) {
    return true;
  }
  match (a.bitvec_value(), b.bitvec_value()) {
    (Some(x), Some(y)) => x == y && a.width() == b.width(),
    _ => false,
  }
}

/// A constant condition selects its branch.
fn simplify_ite(args: &[RcExpression]) -> Option<RcExpression> {
  match args[0].bool_value()? {
    true => Some(args[1].clone()),
    false => Some(args[2].clone()),
  }
}

/// `x + 0 → x`, `0 + x → x`.
fn simplify_add(args: &[RcExpression]) -> Option<RcExpression> {
  if args[1].is_bitvec_value(0) {
    return Some(args[0].clone());
  }
  if args[0].is_bitvec_value(0) {
    return Some(args[1].clone());
  }
  None
}

/// `(a + b) − b → a` and `(b + a) − b → a`.
fn simplify_sub(args: &[RcExpression]) -> Option<RcExpression> {
  let (left, right) = (&args[0], &args[1]);
  if left.operator() == Some(Operator::BitVecAdd) {
    if same_constant(&left.operands()[0], right) {
      return Some(left.operands()[1].clone());
    }
    if same_constant(&left.operands()[1], right) {
      return Some(left.operands()[0].clone());
    }
  }
  None
}

/// Neutral/absorbing constants, constant-chain combining, constants to the right.
fn simplify_or(node: &RcExpression, args: &[RcExpression]) -> Option<RcExpression> {
  let (left, right) = (&args[0], &args[1]);
  let width = node.width().unwrap();

  if let Some(value) = right.bitvec_value() {
    if value == 0 {
      return Some(left.clone());
    }
    if value == mask(width) {
      return Some(right.clone());
    }
    // (a | k1) | k2 → a | (k1 | k2)
    if left.operator() == Some(Operator::BitVecOr) {
      if let Some(nested) = left.operands()[1].bitvec_value() {
        let combined = Expression::bitvec_constant(width, nested | value)
          .tainted(&left.operands()[1].taint().union(right.taint()));
        return Some(operation(
          Operator::BitVecOr,
          smallvec![left.operands()[0].clone(), combined],
          node.taint(),
        ));
      }
    }
  } else if left.is_constant() {
    // Constants ride on the right.
    return Some(operation(
      Operator::BitVecOr,
      smallvec![right.clone(), left.clone()],
      node.taint(),
    ));
  }
  None
}

/// Zero annihilates, the full mask is neutral, constant chains combine, and a
/// constant conjunct distributes over a disjunction.
fn simplify_and(node: &RcExpression, args: &[RcExpression]) -> Option<RcExpression> {
  let (left, right) = (&args[0], &args[1]);
  let width = node.width().unwrap();

  if let Some(value) = right.bitvec_value() {
    if value == 0 {
      return Some(right.clone());
    }
    if value == mask(width) {
      return Some(left.clone());
    }
    // (a & k1) & k2 → a & (k1 & k2)
    if left.operator() == Some(Operator::BitVecAnd) {
      if let Some(nested) = left.operands()[1].bitvec_value() {
        let combined = Expression::bitvec_constant(width, nested & value)
          .tainted(&left.operands()[1].taint().union(right.taint()));
        return Some(operation(
          Operator::BitVecAnd,
          smallvec![left.operands()[0].clone(), combined],
          node.taint(),
        ));
      }
    }
    // (a | b) & k → (k & a) | (k & b)
    if left.operator() == Some(Operator::BitVecOr) {
      let a = left.operands()[0].clone();
      let b = left.operands()[1].clone();
      return Some(operation(
        Operator::BitVecOr,
        smallvec![
          Expression::bitand(right.clone(), a),
          Expression::bitand(right.clone(), b)
        ],
        node.taint(),
      ));
    }
  } else if left.is_constant() {
    return Some(operation(
      Operator::BitVecAnd,
      smallvec![right.clone(), left.clone()],
      node.taint(),
    ));
  }
  None
}

/// `x << 0 → x`; a constant shift of at least the width passes `x` through (see the
/// module notes).
fn simplify_shift_left(args: &[RcExpression]) -> Option<RcExpression> {
  let (left, right) = (&args[0], &args[1]);
  let value = right.bitvec_value()?;
  if value == 0 {
    return Some(left.clone());
  }
  if value >= right.width().unwrap() as u128 {
    return Some(left.clone());
  }
  None
}

/// Narrows an extract over a concatenation, distributes it over bitwise operators,
/// and drops it entirely when it spans its operand.
fn simplify_extract(node: &RcExpression, begin: Width, end: Width) -> Option<RcExpression> {
  let op = &node.operands()[0];
  let op_width = op.width().unwrap();

  // A full-width extract is the identity.
  if begin == 0 && end == op_width - 1 {
    return Some(op.clone());
  }

  if op.operator() == Some(Operator::BitVecConcat) {
    return narrow_extract_of_concat(node, op, begin, end);
  }

  if matches!(
    op.operator(),
    Some(Operator::BitVecAnd) | Some(Operator::BitVecOr) | Some(Operator::BitVecXor)
  ) {
    let a = Expression::extract(op.operands()[0].clone(), begin, end);
    let b = Expression::extract(op.operands()[1].clone(), begin, end);
    return Some(operation(op.operator().unwrap(), smallvec![a, b], node.taint()));
  }

  None
}

/// Keeps only the concat operands that overlap `[begin, end]`, re-basing the range
/// against the survivors.
fn narrow_extract_of_concat(
  node: &RcExpression,
  concat: &RcExpression,
  begin: Width,
  end: Width,
) -> Option<RcExpression> {
  let size = end - begin + 1;

  // Walk LSB to MSB, tracking each operand's absolute bit offset.
  let mut selected_lsb_first: Vec<RcExpression> = Vec::new();
  let mut low: Width = 0;
  let mut new_begin = begin;
  for item in concat.operands().iter().rev() {
    let item_width = item.width().unwrap();
    if low + item_width <= begin {
      // Entirely below the range.
      new_begin -= item_width;
    } else if low <= end {
      selected_lsb_first.push(item.clone());
    }
    low += item_width;
  }

  if selected_lsb_first.len() == concat.operands().len() && new_begin == begin {
    return None;
  }

  let selected_width: Width = selected_lsb_first.iter().map(|o| o.width().unwrap()).sum();
  let narrowed = Expression::concat(selected_lsb_first.into_iter().rev());

  if new_begin == 0 && size == selected_width {
    // The survivors are exactly the requested range.
    return Some(narrowed.tainted(node.taint()));
  }
  Some(operation(
    Operator::BitVecExtract { begin: new_begin, end: new_begin + size - 1 },
    smallvec![narrowed],
    node.taint(),
  ))
}

/// Resolves a select against a chain of stores with concrete, distinct indices.
fn simplify_select(node: &RcExpression, args: &[RcExpression]) -> Option<RcExpression> {
  let (array, index) = (&args[0], &args[1]);
  if array.is_variable() {
    return None;
  }
  let index_value = index.bitvec_value();

  let mut current = array.clone();
  while current.operator() == Some(Operator::ArrayStore) {
    let stored_index = current.operands()[1].bitvec_value();
    match (index_value, stored_index) {
      (Some(i), Some(s)) if i != s => {
        // This layer cannot alias the lookup; peel it.
        current = current.operands()[0].clone();
      }
      _ => break,
    }
  }

  if index_value.is_some()
    && current.operator() == Some(Operator::ArrayStore)
    && current.operands()[1].bitvec_value() == index_value
  {
    return Some(current.operands()[2].clone());
  }

  if !Expression::ptr_eq(&current, array) {
    return Some(operation(
      Operator::ArraySelect,
      smallvec![current, index.clone()],
      node.taint(),
    ));
  }
  None
}
