/*!

The constant folder: evaluates any operation whose operand results are all concrete
constants, with SMT-LIB semantics.

Folding notes:

- Signed division truncates toward zero (`bvsdiv`); `bvsmod` takes the divisor's
  sign, `bvsrem` the dividend's. Division or remainder by a constant zero never
  folds; the term is left symbolic.
- Logical shifts saturate to zero once the shift amount reaches the width;
  arithmetic right shift fills with the sign bit. Arithmetic shift left is a shift
  left.
- `Neg` is two's-complement negation, `Not` bitwise complement, `BoolNot` logical
  negation.
- The short-circuit identities `and(true, x) = x` / `or(false, x) = x` apply even
  when the other operand is symbolic, and a constant-condition `ite` selects its
  branch outright.

A folded constant inherits the taint of the operation it replaces; an identity
rewrite hands back the chosen operand, taint and all.

The folder's memo is a process-wide (thread-local) cache trimmed back to
`VISIT_CACHE_LIMIT` after every top-level fold.

*/

use std::cell::RefCell;

use crate::expr::{
  from_signed, mask, to_signed, truncate, Expression, Operator, RcExpression, Taint, Width,
};
use crate::visitor::cache::{VisitCache, VISIT_CACHE_LIMIT};
use crate::visitor::{evaluate, Rewrite, Rewriter};

thread_local! {
  static FOLD_CACHE: RefCell<VisitCache<RcExpression>> = RefCell::new(VisitCache::new());
}

/// Folds every fully-constant operation in `expression`.
pub fn constant_fold(expression: &RcExpression) -> RcExpression {
  FOLD_CACHE.with(|cell| {
    let mut cache = cell.borrow_mut();
    let mut folder = Rewrite(ConstantFolder { cache: &mut *cache });
    let result = evaluate(&mut folder, expression);
    drop(folder);
    cache.trim(VISIT_CACHE_LIMIT);
    result
  })
}

struct ConstantFolder<'c> {
  cache: &'c mut VisitCache<RcExpression>,
}

impl<'c> Rewriter for ConstantFolder<'c> {
  fn rewrite(&mut self, node: &RcExpression, args: &[RcExpression]) -> Option<RcExpression> {
    use Operator::*;
    let op = node.operator()?;

    let specific = match op {
      BitVecConcat => fold_concat(node, args),
      BitVecZeroExtend(_) | BitVecSignExtend(_) => fold_extension(op, node, args),
      BitVecExtract { begin, end } => fold_extract(node, args, begin, end),
      BoolIte | BitVecIte => fold_ite(args),
      BoolAnd => fold_bool_and_identity(args),
      BoolOr => fold_bool_or_identity(args),
      _ => None,
    };

    specific.or_else(|| fold_operation(op, node, args))
  }

  fn rewrite_cache(&mut self) -> &mut VisitCache<RcExpression> {
    self.cache
  }
}

fn bool_result(value: bool, taint: &Taint) -> RcExpression {
  Expression::bool_constant(value).tainted(taint)
}

fn bitvec_result(width: Width, value: u128, taint: &Taint) -> RcExpression {
  Expression::bitvec_constant(width, value).tainted(taint)
}

/// `Concat` of constants accumulates MSB-first.
fn fold_concat(node: &RcExpression, args: &[RcExpression]) -> Option<RcExpression> {
  if !args.iter().all(|a| a.is_constant()) {
    return None;
  }
  let mut result: u128 = 0;
  for arg in args {
    result = (result << arg.width().unwrap()) | arg.bitvec_value().unwrap();
  }
  Some(bitvec_result(node.width().unwrap(), result, node.taint()))
}

fn fold_extension(op: Operator, node: &RcExpression, args: &[RcExpression]) -> Option<RcExpression> {
  let value = args[0].bitvec_value()?;
  let widened = match op {
    Operator::BitVecZeroExtend(_) => value,
    Operator::BitVecSignExtend(_) => {
      from_signed(to_signed(value, args[0].width().unwrap()), node.width().unwrap())
    }
    _ => unreachable!(),
  };
  Some(bitvec_result(node.width().unwrap(), widened, node.taint()))
}

fn fold_extract(
  node: &RcExpression,
  args: &[RcExpression],
  begin: Width,
  end: Width,
) -> Option<RcExpression> {
  let value = args[0].bitvec_value()?;
  let size = end - begin + 1;
  Some(bitvec_result(size, (value >> begin) & mask(size), node.taint()))
}

/// A constant condition selects its branch, constant or not.
fn fold_ite(args: &[RcExpression]) -> Option<RcExpression> {
  match args[0].bool_value()? {
    true => Some(args[1].clone()),
    false => Some(args[2].clone()),
  }
}

fn fold_bool_and_identity(args: &[RcExpression]) -> Option<RcExpression> {
  if args[0].bool_value() == Some(true) {
    return Some(args[1].clone());
  }
  if args[1].bool_value() == Some(true) {
    return Some(args[0].clone());
  }
  None
}

fn fold_bool_or_identity(args: &[RcExpression]) -> Option<RcExpression> {
  if args[0].bool_value() == Some(false) {
    return Some(args[1].clone());
  }
  if args[1].bool_value() == Some(false) {
    return Some(args[0].clone());
  }
  None
}

/// The operator table: folds when every operand result is a constant.
fn fold_operation(op: Operator, node: &RcExpression, args: &[RcExpression]) -> Option<RcExpression> {
  use Operator::*;

  if !args.iter().all(|a| a.is_constant()) {
    return None;
  }
  let taint = node.taint();

  // Boolean connectives.
  match op {
    BoolNot => return Some(bool_result(!bool_arg(args, 0), taint)),
    BoolAnd => return Some(bool_result(bool_arg(args, 0) && bool_arg(args, 1), taint)),
    BoolOr => return Some(bool_result(bool_arg(args, 0) || bool_arg(args, 1), taint)),
    BoolXor => return Some(bool_result(bool_arg(args, 0) ^ bool_arg(args, 1), taint)),
    BoolEq => return Some(bool_result(bool_arg(args, 0) == bool_arg(args, 1), taint)),
    Equal => {
      // Polymorphic: the operands are value-comparable constants of one sort.
      let verdict = match (args[0].bool_value(), args[1].bool_value()) {
        (Some(a), Some(b)) => a == b,
        _ => args[0].bitvec_value()? == args[1].bitvec_value()?,
      };
      return Some(bool_result(verdict, taint));
    }
    _ => {}
  }

  // Everything below operates on bit-vector operands.
  let a = args[0].bitvec_value()?;
  let width = args[0].width()?;

  // Comparisons.
  if let Some(verdict) = match op {
    LessThan => Some(to_signed(a, width) < to_signed(bv_arg(args, 1), width)),
    LessOrEqual => Some(to_signed(a, width) <= to_signed(bv_arg(args, 1), width)),
    GreaterThan => Some(to_signed(a, width) > to_signed(bv_arg(args, 1), width)),
    GreaterOrEqual => Some(to_signed(a, width) >= to_signed(bv_arg(args, 1), width)),
    UnsignedLessThan => Some(a < bv_arg(args, 1)),
    UnsignedLessOrEqual => Some(a <= bv_arg(args, 1)),
    UnsignedGreaterThan => Some(a > bv_arg(args, 1)),
    UnsignedGreaterOrEqual => Some(a >= bv_arg(args, 1)),
    _ => None,
  } {
    return Some(bool_result(verdict, taint));
  }

  let value = match op {
    BitVecAdd => truncate(a.wrapping_add(bv_arg(args, 1)), width),
    BitVecSub => truncate(a.wrapping_sub(bv_arg(args, 1)), width),
    BitVecMul => truncate(a.wrapping_mul(bv_arg(args, 1)), width),

    BitVecDiv => {
      let b = bv_arg(args, 1);
      if b == 0 {
        return None;
      }
      from_signed(to_signed(a, width).wrapping_div(to_signed(b, width)), width)
    }
    BitVecUnsignedDiv => {
      let b = bv_arg(args, 1);
      if b == 0 {
        return None;
      }
      a / b
    }
    BitVecMod => {
      let b = bv_arg(args, 1);
      if b == 0 {
        return None;
      }
      let divisor = to_signed(b, width);
      let mut r = to_signed(a, width).wrapping_rem(divisor);
      if r != 0 && (r < 0) != (divisor < 0) {
        r += divisor;
      }
      from_signed(r, width)
    }
    BitVecRem => {
      let b = bv_arg(args, 1);
      if b == 0 {
        return None;
      }
      from_signed(to_signed(a, width).wrapping_rem(to_signed(b, width)), width)
    }
    BitVecUnsignedRem => {
      let b = bv_arg(args, 1);
      if b == 0 {
        return None;
      }
      a % b
    }

    BitVecShiftLeft | BitVecArithShiftLeft => {
      let shamt = bv_arg(args, 1);
      if shamt >= width as u128 {
        0
      } else {
        truncate(a << shamt, width)
      }
    }
    BitVecShiftRight => {
      let shamt = bv_arg(args, 1);
      if shamt >= width as u128 {
        0
      } else {
        a >> shamt
      }
    }
    BitVecArithShiftRight => {
      let shamt = bv_arg(args, 1).min((width - 1) as u128);
      from_signed(to_signed(a, width) >> shamt, width)
    }

    BitVecAnd => a & bv_arg(args, 1),
    BitVecOr => a | bv_arg(args, 1),
    BitVecXor => a ^ bv_arg(args, 1),
    BitVecNot => truncate(!a, width),
    BitVecNeg => truncate(a.wrapping_neg(), width),

    _ => return None,
  };

  Some(bitvec_result(node.width().unwrap(), value, taint))
}

#[inline(always)]
fn bool_arg(args: &[RcExpression], index: usize) -> bool {
  args[index].bool_value().unwrap()
}

#[inline(always)]
fn bv_arg(args: &[RcExpression], index: usize) -> u128 {
  args[index].bitvec_value().unwrap()
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::expr::Expression;

  fn c8(value: u128) -> RcExpression {
    Expression::bitvec_constant(8, value)
  }

  #[test]
  fn modular_arithmetic() {
    assert_eq!(constant_fold(&Expression::add(c8(200), c8(100))).bitvec_value(), Some(44));
    assert_eq!(constant_fold(&Expression::sub(c8(3), c8(5))).bitvec_value(), Some(254));
    assert_eq!(constant_fold(&Expression::mul(c8(16), c8(16))).bitvec_value(), Some(0));
  }

  #[test]
  fn signed_division_truncates_toward_zero() {
    // -7 / 2 = -3 under bvsdiv.
    let q = constant_fold(&Expression::sdiv(c8(0xF9), c8(2)));
    assert_eq!(q.bitvec_value(), Some(from_signed(-3, 8)));
  }

  #[test]
  fn signed_mod_follows_the_divisor() {
    // bvsmod(-7, 2) = 1, bvsrem(-7, 2) = -1.
    assert_eq!(
      constant_fold(&Expression::smod(c8(0xF9), c8(2))).bitvec_value(),
      Some(1)
    );
    assert_eq!(
      constant_fold(&Expression::srem(c8(0xF9), c8(2))).bitvec_value(),
      Some(from_signed(-1, 8))
    );
  }

  #[test]
  fn division_by_zero_stays_symbolic() {
    for t in [
      Expression::sdiv(c8(1), c8(0)),
      Expression::udiv(c8(1), c8(0)),
      Expression::smod(c8(1), c8(0)),
      Expression::srem(c8(1), c8(0)),
      Expression::urem(c8(1), c8(0)),
    ] {
      assert!(Expression::ptr_eq(&constant_fold(&t), &t));
    }
  }

  #[test]
  fn shifts() {
    assert_eq!(constant_fold(&Expression::shl(c8(1), c8(3))).bitvec_value(), Some(8));
    assert_eq!(constant_fold(&Expression::shl(c8(1), c8(9))).bitvec_value(), Some(0));
    assert_eq!(constant_fold(&Expression::lshr(c8(0x80), c8(7))).bitvec_value(), Some(1));
    // Arithmetic right shift drags the sign bit.
    assert_eq!(constant_fold(&Expression::ashr(c8(0x80), c8(4))).bitvec_value(), Some(0xF8));
    assert_eq!(constant_fold(&Expression::ashr(c8(0x80), c8(200))).bitvec_value(), Some(0xFF));
  }

  #[test]
  fn negation_is_twos_complement_and_not_is_bitwise() {
    assert_eq!(constant_fold(&Expression::neg(c8(1))).bitvec_value(), Some(0xFF));
    assert_eq!(constant_fold(&Expression::bitnot(c8(0x0F))).bitvec_value(), Some(0xF0));
  }

  #[test]
  fn comparisons_respect_signedness() {
    let lt = constant_fold(&Expression::slt(c8(0xFF), c8(1))); // -1 < 1
    assert_eq!(lt.bool_value(), Some(true));
    let ult = constant_fold(&Expression::ult(c8(0xFF), c8(1)));
    assert_eq!(ult.bool_value(), Some(false));
  }

  #[test]
  fn concat_extract_extend() {
    let folded = constant_fold(&Expression::concat([c8(0xAB), c8(0xCD)]));
    assert_eq!(folded.bitvec_value(), Some(0xABCD));
    assert_eq!(folded.width(), Some(16));

    let piece = constant_fold(&Expression::extract(c8(0b1011_0100), 2, 5));
    assert_eq!(piece.bitvec_value(), Some(0b1101));

    assert_eq!(
      constant_fold(&Expression::zero_extend(c8(0x80), 8)).bitvec_value(),
      Some(0x0080)
    );
    assert_eq!(
      constant_fold(&Expression::sign_extend(c8(0x80), 8)).bitvec_value(),
      Some(0xFF80)
    );
  }

  #[test]
  fn boolean_short_circuit_identities() {
    let p = Expression::bool_variable("p");
    let t = Expression::bool_constant(true);
    let f = Expression::bool_constant(false);

    let and = constant_fold(&Expression::bool_and(t.clone(), p.clone()));
    assert!(Expression::ptr_eq(&and, &p));
    let or = constant_fold(&Expression::bool_or(p.clone(), f.clone()));
    assert!(Expression::ptr_eq(&or, &p));
    // But and(false, p) is out of the table's reach with a symbolic operand.
    let stuck = constant_fold(&Expression::bool_and(f, p));
    assert!(stuck.is_operation());
  }

  #[test]
  fn constant_condition_ite_selects_a_branch() {
    let a = Expression::bitvec_variable("a", 8);
    let b = Expression::bitvec_variable("b", 8);
    let chosen = constant_fold(&Expression::ite(Expression::bool_constant(false), a, b.clone()));
    assert!(Expression::ptr_eq(&chosen, &b));
  }

  #[test]
  fn folded_constants_inherit_taint() {
    let marked = c8(3).tainted(&Taint::singleton("sym"));
    let sum = constant_fold(&Expression::add(marked, c8(4)));
    assert_eq!(sum.bitvec_value(), Some(7));
    assert!(sum.taint().contains("sym"));
  }

  #[test]
  fn nested_terms_fold_bottom_up() {
    // (2 + 3) * 4 == 20
    let t = Expression::mul(Expression::add(c8(2), c8(3)), c8(4));
    assert_eq!(constant_fold(&t).bitvec_value(), Some(20));
  }
}
