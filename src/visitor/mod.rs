/*!

The visitor framework: an iterative post-order DAG traversal with per-node
memoization, and the dispatch discipline the rewriters hang off of.

A [`Visitor`] produces one value per node from the node and its operands' values.
Dispatch is a `match` inside `visit_node`, specific arms first, with the catch-all
arm supplying the generic behavior for every operator nobody specializes.

A [`Rewriter`] is the term-valued specialization. Its `rewrite` hook returns
`Some(replacement)` when a rule fired and `None` to decline, in which case the node
is rebuilt over its rewritten operands (which preserves sharing: a rebuild with
unchanged operands is pointer-identical to its input). Rewriters can opt into
fixed-point mode, where each node is re-dispatched until its rewrite converges, so
outer nodes always see fully-simplified children. Termination is
guaranteed because every rule either shrinks a well-founded measure (depth, constant
count) or returns its input, and convergence is detected by pointer equality on
interned terms.

The traversal itself uses two explicit stacks rather than recursion; deep terms must
not overflow the call stack. Operation nodes are visited in two passes: an expansion
pass that schedules the operands (left-to-right), and an application pass that pops
their results back off in reverse to realign them with operand order. Popping an
empty result stack, or finishing with anything but exactly one result, is a fatal
programmer error.

*/

pub mod arithmetic;
pub mod cache;
pub mod constant_fold;
pub mod queries;
pub mod replace;
pub mod smtlib;


use crate::expr::{rebuild, Expression, OperandList, RcExpression};
use cache::VisitCache;

pub use cache::{LruCache, SIMPLIFY_CACHE_LIMIT, VISIT_CACHE_LIMIT};

pub trait Visitor {
  type Value: Clone;

  /// Produces the value of `node` given the values of its operands. `args` is empty
  /// for leaves and aligned with `node.operands()` otherwise.
  fn visit_node(&mut self, node: &RcExpression, args: &[Self::Value]) -> Self::Value;

  /// The per-visit memo. Some visitors borrow a persistent cache, others own a
  /// fresh one per run.
  fn cache(&mut self) -> &mut VisitCache<Self::Value>;
}

pub trait Rewriter {
  /// Re-dispatch each node until its rewrite converges.
  const FIXED_POINT: bool = false;

  /// Applies rewrite rules at `node`, whose effective operands are `args`. `None`
  /// means no rule fired and the generic rebuild applies.
  fn rewrite(&mut self, node: &RcExpression, args: &[RcExpression]) -> Option<RcExpression>;

  fn rewrite_cache(&mut self) -> &mut VisitCache<RcExpression>;
}

/// Adapts a [`Rewriter`] to the driver. The adapter supplies the generic behavior:
/// rebuild-over-rewritten-operands when no rule fires, and the per-node fixed-point
/// loop when the rewriter asks for it.
pub struct Rewrite<R: Rewriter>(pub R);

impl<R: Rewriter> Visitor for Rewrite<R> {
  type Value = RcExpression;

  fn visit_node(&mut self, node: &RcExpression, args: &[RcExpression]) -> RcExpression {
    if !R::FIXED_POINT {
      return match self.0.rewrite(node, args) {
        Some(value) => value,
        None => rebuild(node, args),
      };
    }

    let mut current = rebuild(node, args);
    loop {
      let operands: OperandList = current.operands().iter().cloned().collect();
      match self.0.rewrite(&current, &operands) {
        None => return current,
        Some(next) => {
          if Expression::ptr_eq(&next, &current) || !next.is_operation() {
            return next;
          }
          current = next;
        }
      }
    }
  }

  fn cache(&mut self) -> &mut VisitCache<RcExpression> {
    self.0.rewrite_cache()
  }
}

enum Frame {
  Expand(RcExpression),
  Apply(RcExpression),
}

/// Runs `visitor` over the DAG rooted at `root` in post-order and returns the root's
/// value. Memoized nodes are not re-entered.
pub fn evaluate<V: Visitor>(visitor: &mut V, root: &RcExpression) -> V::Value {
  let mut results: Vec<V::Value> = Vec::new();
  let mut work: Vec<Frame> = vec![Frame::Expand(root.clone())];

  while let Some(frame) = work.pop() {
    match frame {
      Frame::Expand(node) => {
        if let Some(value) = visitor.cache().get(&node) {
          results.push(value);
        } else if node.is_operation() {
          work.push(Frame::Apply(node.clone()));
          // Schedule operands so the leftmost is expanded first.
          for operand in node.operands().iter().rev() {
            work.push(Frame::Expand(operand.clone()));
          }
        } else {
          let value = visitor.visit_node(&node, &[]);
          results.push(value);
        }
      }

      Frame::Apply(node) => {
        let arity = node.operands().len();
        let mut args: Vec<V::Value> = Vec::with_capacity(arity);
        for _ in 0..arity {
          args.push(results.pop().expect("result stack underflow"));
        }
        args.reverse();
        let value = visitor.visit_node(&node, &args);
        visitor.cache().insert(node, value.clone());
        results.push(value);
      }
    }
  }

  assert_eq!(
    results.len(),
    1,
    "visit finished with {} results on the stack",
    results.len()
  );
  results.pop().unwrap()
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::expr::Expression;

  /// Counts how many times each node kind is dispatched.
  struct CountingVisitor {
    dispatched: usize,
    cache:      VisitCache<usize>,
  }

  impl Visitor for CountingVisitor {
    type Value = usize;

    fn visit_node(&mut self, _node: &RcExpression, args: &[usize]) -> usize {
      self.dispatched += 1;
      1 + args.iter().copied().max().unwrap_or(0)
    }

    fn cache(&mut self) -> &mut VisitCache<usize> {
      &mut self.cache
    }
  }

  #[test]
  fn shared_subterms_are_dispatched_once() {
    let x = Expression::bitvec_variable("x", 8);
    let y = Expression::bitvec_variable("y", 8);
    let shared = Expression::add(x.clone(), y.clone());
    // (x + y) * (x + y): the sum node is shared.
    let root = Expression::mul(shared.clone(), shared);

    let mut visitor = CountingVisitor { dispatched: 0, cache: VisitCache::new() };
    let depth = evaluate(&mut visitor, &root);
    assert_eq!(depth, 3);
    // x, y, the (memoized) sum, and the product. Leaves are re-dispatched per
    // occurrence but the shared operation is entered once.
    assert_eq!(visitor.dispatched, 4);
  }
}
