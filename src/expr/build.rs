/*!

Sort-checked constructors for every term kind, and the `rebuild` primitive the
visitors use to re-parent rewritten operands.

Construction is the only place sorts are checked. An ill-sorted application is a bug
in the caller (or in a rewrite rule), not a recoverable condition, so every check is
a fail-fast `assert!`/`panic!` and rewriters deliberately do not catch them.

Taint discipline: an operation's taint is the union of its operands' taints plus
whatever extra taint the caller attaches (`rebuild` attaches the taint of the node
being rebuilt, so rewrites can only widen a taint set).

*/

use smallvec::smallvec;

use crate::abstractions::IString;
use crate::expr::expression::{Expression, ExpressionKind, OperandList, RcExpression};
use crate::expr::operator::Operator;
use crate::expr::sort::{truncate, Sort, Width};
use crate::expr::taint::Taint;

impl Expression {
  // region Leaves

  pub fn bool_variable(name: &str) -> RcExpression {
    Expression::make(
      ExpressionKind::BoolVariable { name: IString::from(name) },
      Sort::Bool,
      OperandList::new(),
      Taint::new(),
    )
  }

  pub fn bitvec_variable(name: &str, width: Width) -> RcExpression {
    Expression::make(
      ExpressionKind::BitVecVariable { name: IString::from(name) },
      Sort::bitvec(width),
      OperandList::new(),
      Taint::new(),
    )
  }

  /// An array variable. `index_max` is the client-declared bound used by
  /// `to_constant` when it tries to concretize the array into bytes.
  pub fn array_variable(
    name: &str,
    index_width: Width,
    value_width: Width,
    index_max: Option<u64>,
  ) -> RcExpression {
    // Validate the component widths through the bit-vector constructor checks.
    let _ = Sort::bitvec(index_width);
    let _ = Sort::bitvec(value_width);
    Expression::make(
      ExpressionKind::ArrayVariable { name: IString::from(name), index_max },
      Sort::Array { index_width, value_width },
      OperandList::new(),
      Taint::new(),
    )
  }

  pub fn bool_constant(value: bool) -> RcExpression {
    Expression::make(
      ExpressionKind::BoolConstant { value },
      Sort::Bool,
      OperandList::new(),
      Taint::new(),
    )
  }

  /// A bit-vector literal, normalized modulo `2^width`.
  pub fn bitvec_constant(width: Width, value: u128) -> RcExpression {
    let sort = Sort::bitvec(width);
    Expression::make(
      ExpressionKind::BitVecConstant { value: truncate(value, width) },
      sort,
      OperandList::new(),
      Taint::new(),
    )
  }

  // endregion

  // region Boolean connectives

  pub fn bool_not(x: RcExpression) -> RcExpression {
    operation(Operator::BoolNot, smallvec![x], &Taint::new())
  }

  pub fn bool_and(a: RcExpression, b: RcExpression) -> RcExpression {
    operation(Operator::BoolAnd, smallvec![a, b], &Taint::new())
  }

  pub fn bool_or(a: RcExpression, b: RcExpression) -> RcExpression {
    operation(Operator::BoolOr, smallvec![a, b], &Taint::new())
  }

  pub fn bool_xor(a: RcExpression, b: RcExpression) -> RcExpression {
    operation(Operator::BoolXor, smallvec![a, b], &Taint::new())
  }

  pub fn bool_eq(a: RcExpression, b: RcExpression) -> RcExpression {
    operation(Operator::BoolEq, smallvec![a, b], &Taint::new())
  }

  pub fn bool_ite(c: RcExpression, a: RcExpression, b: RcExpression) -> RcExpression {
    operation(Operator::BoolIte, smallvec![c, a, b], &Taint::new())
  }

  // endregion

  // region Bit-vector operations

  pub fn add(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecAdd, smallvec![l, r], &Taint::new())
  }

  pub fn sub(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecSub, smallvec![l, r], &Taint::new())
  }

  pub fn mul(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecMul, smallvec![l, r], &Taint::new())
  }

  pub fn sdiv(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecDiv, smallvec![l, r], &Taint::new())
  }

  pub fn udiv(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecUnsignedDiv, smallvec![l, r], &Taint::new())
  }

  pub fn smod(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecMod, smallvec![l, r], &Taint::new())
  }

  pub fn srem(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecRem, smallvec![l, r], &Taint::new())
  }

  pub fn urem(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecUnsignedRem, smallvec![l, r], &Taint::new())
  }

  pub fn shl(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecShiftLeft, smallvec![l, r], &Taint::new())
  }

  pub fn lshr(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecShiftRight, smallvec![l, r], &Taint::new())
  }

  pub fn ashl(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecArithShiftLeft, smallvec![l, r], &Taint::new())
  }

  pub fn ashr(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecArithShiftRight, smallvec![l, r], &Taint::new())
  }

  pub fn bitand(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecAnd, smallvec![l, r], &Taint::new())
  }

  pub fn bitor(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecOr, smallvec![l, r], &Taint::new())
  }

  pub fn bitxor(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::BitVecXor, smallvec![l, r], &Taint::new())
  }

  pub fn bitnot(x: RcExpression) -> RcExpression {
    operation(Operator::BitVecNot, smallvec![x], &Taint::new())
  }

  pub fn neg(x: RcExpression) -> RcExpression {
    operation(Operator::BitVecNeg, smallvec![x], &Taint::new())
  }

  /// Sign extension by `extend` added bits.
  pub fn sign_extend(x: RcExpression, extend: Width) -> RcExpression {
    operation(Operator::BitVecSignExtend(extend), smallvec![x], &Taint::new())
  }

  /// Zero extension by `extend` added bits.
  pub fn zero_extend(x: RcExpression, extend: Width) -> RcExpression {
    operation(Operator::BitVecZeroExtend(extend), smallvec![x], &Taint::new())
  }

  /// The inclusive bit range `[begin, end]` of `x`, bit 0 being the LSB.
  pub fn extract(x: RcExpression, begin: Width, end: Width) -> RcExpression {
    operation(Operator::BitVecExtract { begin, end }, smallvec![x], &Taint::new())
  }

  /// Concatenation, MSB-first. A single operand passes through unchanged.
  pub fn concat<I: IntoIterator<Item = RcExpression>>(items: I) -> RcExpression {
    let mut operands: OperandList = items.into_iter().collect();
    assert!(!operands.is_empty(), "Concat requires at least one operand");
    if operands.len() == 1 {
      return operands.pop().unwrap();
    }
    operation(Operator::BitVecConcat, operands, &Taint::new())
  }

  pub fn ite(c: RcExpression, a: RcExpression, b: RcExpression) -> RcExpression {
    operation(Operator::BitVecIte, smallvec![c, a, b], &Taint::new())
  }

  // endregion

  // region Comparisons

  pub fn slt(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::LessThan, smallvec![l, r], &Taint::new())
  }

  pub fn sle(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::LessOrEqual, smallvec![l, r], &Taint::new())
  }

  pub fn sgt(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::GreaterThan, smallvec![l, r], &Taint::new())
  }

  pub fn sge(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::GreaterOrEqual, smallvec![l, r], &Taint::new())
  }

  pub fn ult(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::UnsignedLessThan, smallvec![l, r], &Taint::new())
  }

  pub fn ule(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::UnsignedLessOrEqual, smallvec![l, r], &Taint::new())
  }

  pub fn ugt(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::UnsignedGreaterThan, smallvec![l, r], &Taint::new())
  }

  pub fn uge(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::UnsignedGreaterOrEqual, smallvec![l, r], &Taint::new())
  }

  pub fn equal(l: RcExpression, r: RcExpression) -> RcExpression {
    operation(Operator::Equal, smallvec![l, r], &Taint::new())
  }

  // endregion

  // region Arrays

  pub fn store(array: RcExpression, index: RcExpression, value: RcExpression) -> RcExpression {
    operation(Operator::ArrayStore, smallvec![array, index, value], &Taint::new())
  }

  pub fn select(array: RcExpression, index: RcExpression) -> RcExpression {
    operation(Operator::ArraySelect, smallvec![array, index], &Taint::new())
  }

  // endregion
}

/// Builds an operation node: checks the operand sorts, computes the result sort, and
/// unions the operand taints with `extra_taint`.
pub(crate) fn operation(
  op: Operator,
  operands: OperandList,
  extra_taint: &Taint,
) -> RcExpression {
  if let Some(arity) = op.arity() {
    assert_eq!(
      operands.len(),
      arity,
      "{} expects {} operands, got {}",
      op,
      arity,
      operands.len()
    );
  }
  let sort = signature(op, &operands);

  let mut taint = extra_taint.clone();
  for operand in operands.iter() {
    taint.extend_with(operand.taint());
  }

  Expression::make(ExpressionKind::Operation(op), sort, operands, taint)
}

/// Produces a term of the same kind as `node` over the new operand list, carrying
/// `node`'s taint. Constants and variables rebuild to themselves. A rebuild with
/// unchanged operands returns the original interned node.
pub(crate) fn rebuild(node: &RcExpression, operands: &[RcExpression]) -> RcExpression {
  match node.operator() {
    Some(op) => {
      if operands.len() == node.operands().len()
        && operands
          .iter()
          .zip(node.operands().iter())
          .all(|(a, b)| Expression::ptr_eq(a, b))
      {
        return node.clone();
      }
      operation(op, operands.iter().cloned().collect(), node.taint())
    }
    None => node.clone(),
  }
}

/// The sort signature of each operator: checks operand sorts, returns the result
/// sort. Panics describe the offending operand.
fn signature(op: Operator, operands: &[RcExpression]) -> Sort {
  use Operator::*;
  match op {
    BoolNot => {
      bool_operand(op, &operands[0]);
      Sort::Bool
    }

    BoolAnd | BoolOr | BoolXor | BoolEq => {
      bool_operand(op, &operands[0]);
      bool_operand(op, &operands[1]);
      Sort::Bool
    }

    BoolIte => {
      bool_operand(op, &operands[0]);
      bool_operand(op, &operands[1]);
      bool_operand(op, &operands[2]);
      Sort::Bool
    }

    BitVecAdd | BitVecSub | BitVecMul
    | BitVecDiv | BitVecUnsignedDiv | BitVecMod | BitVecRem | BitVecUnsignedRem
    | BitVecShiftLeft | BitVecShiftRight | BitVecArithShiftLeft | BitVecArithShiftRight
    | BitVecAnd | BitVecOr | BitVecXor => Sort::BitVec(matched_width(op, operands)),

    BitVecNot | BitVecNeg => Sort::BitVec(bitvec_operand(op, &operands[0])),

    BitVecSignExtend(extend) | BitVecZeroExtend(extend) => {
      let width = bitvec_operand(op, &operands[0]);
      Sort::bitvec(width + extend)
    }

    BitVecExtract { begin, end } => {
      let width = bitvec_operand(op, &operands[0]);
      assert!(
        begin <= end && end < width,
        "{} range out of bounds for {}",
        op,
        operands[0].sort()
      );
      Sort::bitvec(end - begin + 1)
    }

    BitVecConcat => {
      assert!(operands.len() >= 2, "{} expects at least two operands", op);
      let total = operands.iter().map(|o| bitvec_operand(op, o)).sum();
      Sort::bitvec(total)
    }

    BitVecIte => {
      bool_operand(op, &operands[0]);
      let width = bitvec_operand(op, &operands[1]);
      let alt = bitvec_operand(op, &operands[2]);
      assert_eq!(width, alt, "{} branches disagree on width: {} vs {}", op, width, alt);
      Sort::BitVec(width)
    }

    LessThan | LessOrEqual | GreaterThan | GreaterOrEqual
    | UnsignedLessThan | UnsignedLessOrEqual | UnsignedGreaterThan | UnsignedGreaterOrEqual => {
      matched_width(op, operands);
      Sort::Bool
    }

    Equal => {
      assert_eq!(
        operands[0].sort(),
        operands[1].sort(),
        "{} operands disagree on sort: {} vs {}",
        op,
        operands[0].sort(),
        operands[1].sort()
      );
      Sort::Bool
    }

    ArrayStore => {
      let (index_width, value_width) = array_operand(op, &operands[0]);
      index_operand(op, &operands[1], index_width);
      let stored = bitvec_operand(op, &operands[2]);
      assert_eq!(
        stored, value_width,
        "{} value width {} does not match array value sort {}",
        op, stored, value_width
      );
      operands[0].sort()
    }

    ArraySelect => {
      let (index_width, value_width) = array_operand(op, &operands[0]);
      index_operand(op, &operands[1], index_width);
      Sort::BitVec(value_width)
    }
  }
}

/// Checks that both operands are bit-vectors of one width and returns it.
fn matched_width(op: Operator, operands: &[RcExpression]) -> Width {
  let left = bitvec_operand(op, &operands[0]);
  let right = bitvec_operand(op, &operands[1]);
  assert_eq!(
    left, right,
    "{} operands disagree on width: {} vs {}",
    op, left, right
  );
  left
}

fn bool_operand(op: Operator, operand: &RcExpression) {
  assert!(
    operand.sort().is_bool(),
    "{} expects a Bool operand, got {}",
    op,
    operand.sort()
  );
}

fn bitvec_operand(op: Operator, operand: &RcExpression) -> Width {
  match operand.sort() {
    Sort::BitVec(width) => width,
    sort => panic!("{} expects a bit-vector operand, got {}", op, sort),
  }
}

fn array_operand(op: Operator, operand: &RcExpression) -> (Width, Width) {
  match operand.sort() {
    Sort::Array { index_width, value_width } => (index_width, value_width),
    sort => panic!("{} expects an array operand, got {}", op, sort),
  }
}

fn index_operand(op: Operator, operand: &RcExpression, index_width: Width) {
  let width = bitvec_operand(op, operand);
  assert_eq!(
    width, index_width,
    "{} index width {} does not match array index sort {}",
    op, width, index_width
  );
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn constants_normalize() {
    let c = Expression::bitvec_constant(8, 0x1FF);
    assert_eq!(c.bitvec_value(), Some(0xFF));
  }

  #[test]
  fn concat_width_is_the_sum() {
    let a = Expression::bitvec_variable("a", 4);
    let b = Expression::bitvec_variable("b", 12);
    let c = Expression::concat([a, b]);
    assert_eq!(c.width(), Some(16));
  }

  #[test]
  fn extension_widths() {
    let x = Expression::bitvec_variable("x", 8);
    assert_eq!(Expression::zero_extend(x.clone(), 24).width(), Some(32));
    assert_eq!(Expression::sign_extend(x.clone(), 8).width(), Some(16));
    assert_eq!(Expression::extract(x, 2, 5).width(), Some(4));
  }

  #[test]
  #[should_panic(expected = "disagree on width")]
  fn mixed_width_addition_refused() {
    let a = Expression::bitvec_variable("a", 8);
    let b = Expression::bitvec_variable("b", 16);
    Expression::add(a, b);
  }

  #[test]
  #[should_panic(expected = "expects a Bool operand")]
  fn ill_sorted_ite_refused() {
    let c = Expression::bitvec_variable("c", 1);
    let a = Expression::bitvec_variable("a", 8);
    let b = Expression::bitvec_variable("b", 8);
    Expression::ite(c, a, b);
  }

  #[test]
  #[should_panic(expected = "range out of bounds")]
  fn extract_out_of_range_refused() {
    let x = Expression::bitvec_variable("x", 8);
    Expression::extract(x, 4, 8);
  }

  #[test]
  fn taint_propagates_through_construction() {
    use crate::expr::Taint;
    let tainted = Expression::bitvec_variable("x", 8).tainted(&Taint::singleton("sym"));
    let sum = Expression::add(tainted, Expression::bitvec_constant(8, 1));
    assert!(sum.taint().contains("sym"));
  }

  #[test]
  fn rebuild_with_unchanged_operands_is_identity() {
    let x = Expression::bitvec_variable("x", 8);
    let y = Expression::bitvec_variable("y", 8);
    let sum = Expression::add(x.clone(), y.clone());
    let rebuilt = rebuild(&sum, &[x, y]);
    assert!(Expression::ptr_eq(&sum, &rebuilt));
  }

  #[test]
  fn rebuild_carries_the_node_taint() {
    use crate::expr::Taint;
    let x = Expression::bitvec_variable("x", 8);
    let y = Expression::bitvec_variable("y", 8);
    let sum = Expression::add(x, y).tainted(&Taint::singleton("sum"));
    let z = Expression::bitvec_variable("z", 8);
    let rebuilt = rebuild(&sum, &[z, sum.operands()[1].clone()]);
    assert!(rebuilt.taint().contains("sum"));
  }
}
