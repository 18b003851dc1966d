/*!

The tag of an operation node. Visitors dispatch on this tag with a `match` whose
specific arms come first and whose catch-all arm is the generic all-operations
behavior, so an operator nobody specializes still gets handled.

Width-parameterized operators carry their parameters in the tag itself
(`SignExtend`/`ZeroExtend` the number of added bits, `Extract` the inclusive bit
range), so rebuilding a node from new operands needs nothing but the tag.

The SMT-LIB name table lives here as the `FormatStyle::Input` rendering. It is total
over the operator set; the translator relies on that.

*/

use crate::expr::sort::Width;
use crate::format::{Formattable, FormatStyle};
use crate::impl_display_debug_for_formattable;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
  // Boolean connectives
  BoolNot,
  BoolAnd,
  BoolOr,
  BoolXor,
  BoolEq,
  BoolIte,

  // Bit-vector arithmetic
  BitVecAdd,
  BitVecSub,
  BitVecMul,
  BitVecDiv, // signed
  BitVecUnsignedDiv,
  BitVecMod, // signed, sign of divisor
  BitVecRem, // signed, sign of dividend
  BitVecUnsignedRem,

  // Shifts
  BitVecShiftLeft,
  BitVecShiftRight,
  BitVecArithShiftLeft,
  BitVecArithShiftRight,

  // Bitwise
  BitVecAnd,
  BitVecOr,
  BitVecXor,
  BitVecNot,
  BitVecNeg,

  // Width adjustment
  BitVecSignExtend(Width), // number of added bits
  BitVecZeroExtend(Width),
  BitVecExtract { begin: Width, end: Width }, // inclusive, LSB = 0
  BitVecConcat,                               // MSB-first operand order
  BitVecIte,

  // Comparisons, producing Bool
  LessThan, // signed
  LessOrEqual,
  GreaterThan,
  GreaterOrEqual,
  UnsignedLessThan,
  UnsignedLessOrEqual,
  UnsignedGreaterThan,
  UnsignedGreaterOrEqual,
  Equal, // polymorphic

  // Arrays
  ArrayStore,
  ArraySelect,
}

impl Operator {
  /// The number of operands the operator takes, or `None` for the variadic `Concat`.
  pub fn arity(&self) -> Option<usize> {
    use Operator::*;
    match self {
      BoolNot | BitVecNot | BitVecNeg
      | BitVecSignExtend(_) | BitVecZeroExtend(_) | BitVecExtract { .. } => Some(1),

      BoolAnd | BoolOr | BoolXor | BoolEq
      | BitVecAdd | BitVecSub | BitVecMul
      | BitVecDiv | BitVecUnsignedDiv | BitVecMod | BitVecRem | BitVecUnsignedRem
      | BitVecShiftLeft | BitVecShiftRight | BitVecArithShiftLeft | BitVecArithShiftRight
      | BitVecAnd | BitVecOr | BitVecXor
      | LessThan | LessOrEqual | GreaterThan | GreaterOrEqual
      | UnsignedLessThan | UnsignedLessOrEqual | UnsignedGreaterThan | UnsignedGreaterOrEqual
      | Equal | ArraySelect => Some(2),

      BoolIte | BitVecIte | ArrayStore => Some(3),

      BitVecConcat => None,
    }
  }

  /// The readable kind label, without parameters.
  pub fn label(&self) -> &'static str {
    use Operator::*;
    match self {
      BoolNot => "BoolNot",
      BoolAnd => "BoolAnd",
      BoolOr => "BoolOr",
      BoolXor => "BoolXor",
      BoolEq => "BoolEq",
      BoolIte => "BoolIte",
      BitVecAdd => "BitVecAdd",
      BitVecSub => "BitVecSub",
      BitVecMul => "BitVecMul",
      BitVecDiv => "BitVecDiv",
      BitVecUnsignedDiv => "BitVecUnsignedDiv",
      BitVecMod => "BitVecMod",
      BitVecRem => "BitVecRem",
      BitVecUnsignedRem => "BitVecUnsignedRem",
      BitVecShiftLeft => "BitVecShiftLeft",
      BitVecShiftRight => "BitVecShiftRight",
      BitVecArithShiftLeft => "BitVecArithShiftLeft",
      BitVecArithShiftRight => "BitVecArithShiftRight",
      BitVecAnd => "BitVecAnd",
      BitVecOr => "BitVecOr",
      BitVecXor => "BitVecXor",
      BitVecNot => "BitVecNot",
      BitVecNeg => "BitVecNeg",
      BitVecSignExtend(_) => "BitVecSignExtend",
      BitVecZeroExtend(_) => "BitVecZeroExtend",
      BitVecExtract { .. } => "BitVecExtract",
      BitVecConcat => "BitVecConcat",
      BitVecIte => "BitVecIte",
      LessThan => "LessThan",
      LessOrEqual => "LessOrEqual",
      GreaterThan => "GreaterThan",
      GreaterOrEqual => "GreaterOrEqual",
      UnsignedLessThan => "UnsignedLessThan",
      UnsignedLessOrEqual => "UnsignedLessOrEqual",
      UnsignedGreaterThan => "UnsignedGreaterThan",
      UnsignedGreaterOrEqual => "UnsignedGreaterOrEqual",
      Equal => "Equal",
      ArrayStore => "ArrayStore",
      ArraySelect => "ArraySelect",
    }
  }

  /// The SMT-LIB operator text, with width parameters substituted in.
  pub fn smtlib(&self) -> String {
    let mut out = String::new();
    self.repr(&mut out, FormatStyle::Input).unwrap();
    out
  }
}

impl Formattable for Operator {
  fn repr(&self, out: &mut dyn std::fmt::Write, style: FormatStyle) -> std::fmt::Result {
    use Operator::*;
    if style != FormatStyle::Input {
      // `Extract` carries its range in the label; everything else is the bare kind.
      return match self {
        BitVecExtract { begin, end } => write!(out, "BitVecExtract{{{}:{}}}", begin, end),
        _ => write!(out, "{}", self.label()),
      };
    }

    match self {
      BoolNot => write!(out, "not"),
      BoolAnd => write!(out, "and"),
      BoolOr => write!(out, "or"),
      BoolXor => write!(out, "xor"),
      BoolEq | Equal => write!(out, "="),
      BoolIte | BitVecIte => write!(out, "ite"),
      BitVecAdd => write!(out, "bvadd"),
      BitVecSub => write!(out, "bvsub"),
      BitVecMul => write!(out, "bvmul"),
      BitVecDiv => write!(out, "bvsdiv"),
      BitVecUnsignedDiv => write!(out, "bvudiv"),
      BitVecMod => write!(out, "bvsmod"),
      BitVecRem => write!(out, "bvsrem"),
      BitVecUnsignedRem => write!(out, "bvurem"),
      BitVecShiftLeft => write!(out, "bvshl"),
      BitVecShiftRight => write!(out, "bvlshr"),
      BitVecArithShiftLeft => write!(out, "bvashl"),
      BitVecArithShiftRight => write!(out, "bvashr"),
      BitVecAnd => write!(out, "bvand"),
      BitVecOr => write!(out, "bvor"),
      BitVecXor => write!(out, "bvxor"),
      BitVecNot => write!(out, "bvnot"),
      BitVecNeg => write!(out, "bvneg"),
      BitVecSignExtend(k) => write!(out, "(_ sign_extend {})", k),
      BitVecZeroExtend(k) => write!(out, "(_ zero_extend {})", k),
      // SMT-LIB writes the high bit first.
      BitVecExtract { begin, end } => write!(out, "(_ extract {} {})", end, begin),
      BitVecConcat => write!(out, "concat"),
      LessThan => write!(out, "bvslt"),
      LessOrEqual => write!(out, "bvsle"),
      GreaterThan => write!(out, "bvsgt"),
      GreaterOrEqual => write!(out, "bvsge"),
      UnsignedLessThan => write!(out, "bvult"),
      UnsignedLessOrEqual => write!(out, "bvule"),
      UnsignedGreaterThan => write!(out, "bvugt"),
      UnsignedGreaterOrEqual => write!(out, "bvuge"),
      ArrayStore => write!(out, "store"),
      ArraySelect => write!(out, "select"),
    }
  }
}
impl_display_debug_for_formattable!(Operator);


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn smtlib_names() {
    assert_eq!(Operator::BitVecAdd.smtlib(), "bvadd");
    assert_eq!(Operator::Equal.smtlib(), "=");
    assert_eq!(Operator::BitVecSignExtend(16).smtlib(), "(_ sign_extend 16)");
    assert_eq!(
      Operator::BitVecExtract { begin: 0, end: 7 }.smtlib(),
      "(_ extract 7 0)"
    );
  }

  #[test]
  fn labels() {
    assert_eq!(Operator::BitVecConcat.to_string(), "BitVecConcat");
    assert_eq!(
      Operator::BitVecExtract { begin: 4, end: 11 }.to_string(),
      "BitVecExtract{4:11}"
    );
  }
}
