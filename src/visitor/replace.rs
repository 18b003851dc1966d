/*!

Substitution of free variables: every variable leaf that appears as a key in the
binding map is replaced by its image, and parents are rebuilt over the rewritten
operands (with sharing, so an untouched subterm keeps its node).

Images are ordinary terms; a binding whose image disagrees with the variable's sort
is a caller bug and surfaces as a construction panic when the first parent rebuilds.

*/

use crate::abstractions::HashMap;
use crate::expr::RcExpression;
use crate::visitor::cache::VisitCache;
use crate::visitor::{evaluate, Rewrite, Rewriter};

/// Replaces bound variables in `expression` by their images.
pub fn replace(
  expression: &RcExpression,
  bindings: &HashMap<RcExpression, RcExpression>,
) -> RcExpression {
  let mut replacer = Rewrite(Replacer { bindings, cache: VisitCache::new() });
  evaluate(&mut replacer, expression)
}

struct Replacer<'b> {
  bindings: &'b HashMap<RcExpression, RcExpression>,
  cache:    VisitCache<RcExpression>,
}

impl<'b> Rewriter for Replacer<'b> {
  fn rewrite(&mut self, node: &RcExpression, _args: &[RcExpression]) -> Option<RcExpression> {
    if node.is_variable() {
      self.bindings.get(node).cloned()
    } else {
      None
    }
  }

  fn rewrite_cache(&mut self) -> &mut VisitCache<RcExpression> {
    &mut self.cache
  }
}
