/*!

Crate-level tests that exercise the whole pipeline, construction through
simplification and translation, where the per-module unit tests would have to
reach across module seams.

*/

use crate::abstractions::HashMap;
use crate::expr::{Expression, Operator, RcExpression, Taint};
use crate::simplify::{simplify, to_constant, Concrete};
use crate::visitor::queries::{get_depth, get_variables};
use crate::visitor::replace::replace;
use crate::visitor::smtlib::translate_to_smtlib;

fn c8(value: u128) -> RcExpression {
  Expression::bitvec_constant(8, value)
}

#[test]
fn concrete_addition_folds() {
  let t = Expression::add(c8(3), c8(4));
  let simplified = simplify(&t);
  assert!(Expression::ptr_eq(&simplified, &c8(7)));
}

#[test]
fn additive_identity_vanishes() {
  let x = Expression::bitvec_variable("x", 8);
  let simplified = simplify(&Expression::add(x.clone(), c8(0)));
  assert!(Expression::ptr_eq(&simplified, &x));
}

#[test]
fn select_resolves_against_stores() {
  let base = Expression::array_variable("v", 32, 8, None);
  let arr = Expression::store(
    Expression::store(base, Expression::bitvec_constant(32, 1), c8(10)),
    Expression::bitvec_constant(32, 2),
    c8(20),
  );
  let at1 = simplify(&Expression::select(arr.clone(), Expression::bitvec_constant(32, 1)));
  assert!(Expression::ptr_eq(&at1, &c8(10)));
  let at2 = simplify(&Expression::select(arr, Expression::bitvec_constant(32, 2)));
  assert!(Expression::ptr_eq(&at2, &c8(20)));
}

#[test]
fn translation_of_addition() {
  let a = Expression::bitvec_variable("a", 32);
  let b = Expression::bitvec_variable("b", 32);
  assert_eq!(translate_to_smtlib(&Expression::add(a, b), false), "(bvadd a b)");
}

#[test]
fn translation_of_extract() {
  let x = Expression::bitvec_variable("x", 32);
  assert_eq!(
    translate_to_smtlib(&Expression::extract(x, 0, 7), false),
    "((_ extract 7 0) x)"
  );
}

#[test]
fn low_byte_of_a_concat() {
  let a = Expression::bitvec_variable("a", 4);
  let b = Expression::bitvec_variable("b", 4);
  let c = Expression::bitvec_variable("c", 4);
  let d = Expression::bitvec_variable("d", 4);
  let t = Expression::extract(Expression::concat([a, b, c.clone(), d.clone()]), 0, 7);
  let simplified = simplify(&t);
  assert!(Expression::ptr_eq(&simplified, &Expression::concat([c, d])));
}

#[test]
fn variable_free_terms_collapse_to_constants() {
  // A grab-bag of every operator family over concrete operands.
  let t = Expression::ite(
    Expression::bool_and(
      Expression::slt(c8(0xFF), c8(1)),
      Expression::bool_not(Expression::equal(c8(3), c8(4))),
    ),
    Expression::extract(Expression::concat([c8(0xAB), c8(0xCD)]), 4, 11),
    Expression::mul(c8(3), c8(5)),
  );
  let simplified = simplify(&t);
  assert!(simplified.is_constant());
  // Condition holds, so the extract branch wins: bits 4..11 of 0xABCD are 0xBC.
  assert_eq!(simplified.bitvec_value(), Some(0xBC));
}

#[test]
fn simplify_preserves_sorts() {
  let x = Expression::bitvec_variable("x", 8);
  let samples = [
    Expression::add(x.clone(), c8(0)),
    Expression::extract(Expression::concat([x.clone(), c8(1)]), 0, 7),
    Expression::slt(x.clone(), c8(3)),
    Expression::bool_or(Expression::bool_variable("p"), Expression::bool_constant(false)),
  ];
  for t in samples {
    assert_eq!(simplify(&t).sort(), t.sort());
  }
}

#[test]
fn simplify_is_idempotent() {
  let x = Expression::bitvec_variable("x", 8);
  let samples = [
    Expression::sub(Expression::add(x.clone(), c8(5)), c8(5)),
    Expression::bitor(Expression::bitor(x.clone(), c8(0x0F)), c8(0x30)),
    Expression::shl(x.clone(), c8(12)),
  ];
  for t in samples {
    let once = simplify(&t);
    let twice = simplify(&once);
    assert!(Expression::ptr_eq(&once, &twice));
  }
}

#[test]
fn taint_survives_the_whole_pipeline() {
  let x = Expression::bitvec_variable("x", 8).tainted(&Taint::singleton("user"));
  let t = Expression::add(
    Expression::mul(x, c8(1)),
    Expression::sub(c8(9), c8(9)),
  );
  let simplified = simplify(&t);
  assert!(simplified.taint().is_superset_of(t.taint()));
}

#[test]
fn free_variables_are_exact_through_sharing() {
  let x = Expression::bitvec_variable("x", 8);
  let y = Expression::bitvec_variable("y", 8);
  let shared = Expression::add(x.clone(), y.clone());
  let t = Expression::mul(shared.clone(), shared);
  let variables = get_variables(&t);
  assert_eq!(variables.len(), 2);
  assert!(variables.contains(&x) && variables.contains(&y));
}

#[test]
fn replacement_then_folding() {
  let x = Expression::bitvec_variable("x", 8);
  let t = Expression::add(x.clone(), c8(4));
  let mut bindings = HashMap::new();
  bindings.insert(x, c8(3));
  let substituted = replace(&t, &bindings);
  assert!(Expression::ptr_eq(&simplify(&substituted), &c8(7)));
}

#[test]
fn depth_shrinks_under_simplification() {
  let x = Expression::bitvec_variable("x", 8);
  let t = Expression::sub(Expression::add(x.clone(), c8(5)), c8(5));
  assert_eq!(get_depth(&t), 3);
  assert_eq!(get_depth(&simplify(&t)), 1);
}

#[test]
fn let_bound_translation_is_textually_consistent() {
  let x = Expression::bitvec_variable("x", 32);
  let y = Expression::bitvec_variable("y", 32);
  let shared = Expression::bitand(x, y);
  let t = Expression::bitor(shared.clone(), Expression::bitnot(shared));

  let flat = translate_to_smtlib(&t, false);
  assert_eq!(flat, "(bvor (bvand x y) (bvnot (bvand x y)))");

  let bound = translate_to_smtlib(&t, true);
  assert!(bound.starts_with("(let ((a_"));
  // The shared subterm's text appears exactly once, in its binder.
  assert_eq!(bound.matches("(bvand x y)").count(), 1);
}

#[test]
fn to_constant_reads_back_memory() {
  let base = Expression::array_variable("rom", 16, 8, Some(3));
  let arr = Expression::store(
    Expression::store(
      Expression::store(base, Expression::bitvec_constant(16, 0), c8(1)),
      Expression::bitvec_constant(16, 1),
      c8(2),
    ),
    Expression::bitvec_constant(16, 2),
    Expression::add(c8(1), c8(2)),
  );
  assert_eq!(to_constant(&arr), Concrete::Bytes(vec![1, 2, 3]));
}

#[test]
fn division_by_zero_survives_the_pipeline_symbolically() {
  let t = Expression::udiv(c8(7), c8(0));
  let simplified = simplify(&t);
  assert_eq!(simplified.operator(), Some(Operator::BitVecUnsignedDiv));
}
