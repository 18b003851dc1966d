/*!

An `Expression` is a node in the term DAG: a kind tag, a sort, an ordered operand
list, and a taint set. Expressions are immutable after construction and interned
(see [`intern`](crate::expr::intern)), so two structurally identical terms with the
same taint are the *same* `Rc` allocation and `Rc::ptr_eq` is a valid proxy for
structural equality. Visitor caches rely on this.

The structural hash is computed once at construction and cached in the node; `Hash`
just replays the cached value. Equality compares the cached hash, the shallow
contents, and the operand *pointers*: operands are interned before their parent
exists, so pointer comparison is exact.

*/

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::abstractions::{HashType, IString};
use crate::expr::operator::Operator;
use crate::expr::sort::{Sort, Width};
use crate::expr::taint::Taint;
use crate::format::{Formattable, FormatStyle};
use crate::impl_display_debug_for_formattable;

pub type RcExpression = Rc<Expression>;
/// Inline storage for operand lists; ternary operators are the widest common case.
pub type OperandList = SmallVec<[RcExpression; 3]>;

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
  BoolVariable { name: IString },
  BitVecVariable { name: IString },
  ArrayVariable { name: IString, index_max: Option<u64> },
  BoolConstant { value: bool },
  BitVecConstant { value: u128 },
  Operation(Operator),
}

pub struct Expression {
  kind:     ExpressionKind,
  sort:     Sort,
  operands: OperandList,
  taint:    Taint,
  hash:     HashType,
}

impl Expression {
  /// Assembles a node and hands it to the interner. All construction funnels through
  /// here; the sort-checked public constructors live in [`build`](crate::expr::build).
  pub(crate) fn make(
    kind: ExpressionKind,
    sort: Sort,
    operands: OperandList,
    taint: Taint,
  ) -> RcExpression {
    let hash = compute_hash(&kind, &sort, &operands, &taint);
    crate::expr::intern::intern(Expression { kind, sort, operands, taint, hash })
  }

  // region Accessors

  #[inline(always)]
  pub fn kind(&self) -> &ExpressionKind {
    &self.kind
  }

  #[inline(always)]
  pub fn sort(&self) -> Sort {
    self.sort
  }

  #[inline(always)]
  pub fn operands(&self) -> &[RcExpression] {
    &self.operands
  }

  #[inline(always)]
  pub fn taint(&self) -> &Taint {
    &self.taint
  }

  #[inline(always)]
  pub fn structural_hash(&self) -> HashType {
    self.hash
  }

  #[inline(always)]
  pub fn is_variable(&self) -> bool {
    matches!(
      self.kind,
      ExpressionKind::BoolVariable { .. }
        | ExpressionKind::BitVecVariable { .. }
        | ExpressionKind::ArrayVariable { .. }
    )
  }

  #[inline(always)]
  pub fn is_constant(&self) -> bool {
    matches!(
      self.kind,
      ExpressionKind::BoolConstant { .. } | ExpressionKind::BitVecConstant { .. }
    )
  }

  #[inline(always)]
  pub fn is_operation(&self) -> bool {
    matches!(self.kind, ExpressionKind::Operation(_))
  }

  /// The operator tag of an operation node.
  #[inline(always)]
  pub fn operator(&self) -> Option<Operator> {
    match self.kind {
      ExpressionKind::Operation(op) => Some(op),
      _ => None,
    }
  }

  /// The width of a bit-vector-sorted term.
  #[inline(always)]
  pub fn width(&self) -> Option<Width> {
    self.sort.width()
  }

  /// The name of a variable leaf.
  pub fn name(&self) -> Option<IString> {
    match &self.kind {
      ExpressionKind::BoolVariable { name }
      | ExpressionKind::BitVecVariable { name }
      | ExpressionKind::ArrayVariable { name, .. } => Some(*name),
      _ => None,
    }
  }

  /// The value of a `BoolConstant`.
  #[inline(always)]
  pub fn bool_value(&self) -> Option<bool> {
    match self.kind {
      ExpressionKind::BoolConstant { value } => Some(value),
      _ => None,
    }
  }

  /// The value of a `BitVecConstant`.
  #[inline(always)]
  pub fn bitvec_value(&self) -> Option<u128> {
    match self.kind {
      ExpressionKind::BitVecConstant { value } => Some(value),
      _ => None,
    }
  }

  /// `true` for a `BitVecConstant` with the given value.
  #[inline(always)]
  pub fn is_bitvec_value(&self, value: u128) -> bool {
    self.bitvec_value() == Some(value)
  }

  /// The declared index bound of an array term, inherited through `ArrayStore`
  /// layers down to the base `ArrayVariable`.
  pub fn index_max(&self) -> Option<u64> {
    let mut current = self;
    loop {
      match &current.kind {
        ExpressionKind::ArrayVariable { index_max, .. } => return *index_max,
        ExpressionKind::Operation(Operator::ArrayStore) => {
          current = &current.operands[0];
        }
        _ => return None,
      }
    }
  }

  /// Pointer identity. Valid as structural-plus-taint equality because terms are
  /// interned.
  #[inline(always)]
  pub fn ptr_eq(left: &RcExpression, right: &RcExpression) -> bool {
    Rc::ptr_eq(left, right)
  }

  // endregion

  /// This term with extra taint markers attached. Interning hands back the original
  /// node when the markers are already present.
  pub fn tainted(&self, markers: &Taint) -> RcExpression {
    Expression::make(
      self.kind.clone(),
      self.sort,
      self.operands.clone(),
      self.taint.union(markers),
    )
  }

  /// The node label used by diagnostics: operator tag, constant value, or variable
  /// name.
  pub fn label(&self) -> String {
    let mut out = String::new();
    self.repr(&mut out, FormatStyle::Default).unwrap();
    out
  }
}

impl PartialEq for Expression {
  fn eq(&self, other: &Self) -> bool {
    self.hash == other.hash
      && self.sort == other.sort
      && self.kind == other.kind
      && self.taint == other.taint
      && self.operands.len() == other.operands.len()
      && self
        .operands
        .iter()
        .zip(other.operands.iter())
        .all(|(a, b)| Rc::ptr_eq(a, b))
  }
}
impl Eq for Expression {}

impl Hash for Expression {
  fn hash<H: Hasher>(&self, state: &mut H) {
    state.write_u64(self.hash);
  }
}

fn compute_hash(
  kind: &ExpressionKind,
  sort: &Sort,
  operands: &[RcExpression],
  taint: &Taint,
) -> HashType {
  let mut hasher = std::collections::hash_map::DefaultHasher::new();
  kind.hash(&mut hasher);
  sort.hash(&mut hasher);
  hasher.write_usize(operands.len());
  for operand in operands {
    hasher.write_u64(operand.hash);
  }
  taint.hash(&mut hasher);
  hasher.finish()
}

impl Formattable for Expression {
  fn repr(&self, out: &mut dyn std::fmt::Write, style: FormatStyle) -> std::fmt::Result {
    match &self.kind {
      ExpressionKind::BoolVariable { name }
      | ExpressionKind::BitVecVariable { name }
      | ExpressionKind::ArrayVariable { name, .. } => write!(out, "{}", name)?,
      ExpressionKind::BoolConstant { value } => write!(out, "{}", value)?,
      ExpressionKind::BitVecConstant { value } => write!(out, "{}", value)?,
      ExpressionKind::Operation(op) => op.repr(out, FormatStyle::Default)?,
    }
    if style == FormatStyle::Debug {
      write!(out, ": {}", self.sort)?;
      if !self.taint.is_empty() {
        write!(out, " {:?}", self.taint)?;
      }
    }
    Ok(())
  }
}
impl_display_debug_for_formattable!(Expression);
