/*!

Read-only term queries: the free-variable collector, the depth measure, and the
diagnostic pretty printer.

The collector and the depth measure ride the post-order driver. The pretty printer
is the one pre-order, recursive traversal in the crate; recursion keeps the
indentation bookkeeping trivial and diagnostic output is depth-capped anyway.

*/

use crate::abstractions::HashSet;
use crate::expr::RcExpression;
use crate::visitor::cache::VisitCache;
use crate::visitor::{evaluate, Visitor};

/// The set of variable leaves reachable in `expression`.
pub fn get_variables(expression: &RcExpression) -> HashSet<RcExpression> {
  let mut collector = VariableCollector { variables: HashSet::new(), cache: VisitCache::new() };
  evaluate(&mut collector, expression);
  collector.variables
}

struct VariableCollector {
  variables: HashSet<RcExpression>,
  cache:     VisitCache<()>,
}

impl Visitor for VariableCollector {
  type Value = ();

  fn visit_node(&mut self, node: &RcExpression, _args: &[()]) {
    if node.is_variable() {
      self.variables.insert(node.clone());
    }
  }

  fn cache(&mut self) -> &mut VisitCache<()> {
    &mut self.cache
  }
}

/// The height of the term: leaves measure 1.
pub fn get_depth(expression: &RcExpression) -> usize {
  let mut measure = DepthMeasure { cache: VisitCache::new() };
  evaluate(&mut measure, expression)
}

struct DepthMeasure {
  cache: VisitCache<usize>,
}

impl Visitor for DepthMeasure {
  type Value = usize;

  fn visit_node(&mut self, _node: &RcExpression, args: &[usize]) -> usize {
    1 + args.iter().copied().max().unwrap_or(0)
  }

  fn cache(&mut self) -> &mut VisitCache<usize> {
    &mut self.cache
  }
}

/// One node label per line, operands indented two deeper; subtrees past `depth`
/// levels print as `...`.
pub fn pretty_print(expression: &RcExpression, depth: Option<usize>) -> String {
  let mut printer = PrettyPrinter { output: String::new(), indent: 0, depth };
  printer.visit(expression);
  printer.output
}

struct PrettyPrinter {
  output: String,
  indent: usize,
  depth:  Option<usize>,
}

impl PrettyPrinter {
  fn line(&mut self, text: &str) {
    for _ in 0..self.indent {
      self.output.push(' ');
    }
    self.output.push_str(text);
    self.output.push('\n');
  }

  fn visit(&mut self, node: &RcExpression) {
    let label = node.label();
    self.line(&label);
    if !node.is_operation() {
      return;
    }
    self.indent += 2;
    if self.depth.map_or(true, |depth| self.indent < depth * 2) {
      for operand in node.operands() {
        self.visit(operand);
      }
    } else {
      self.line("...");
    }
    self.indent -= 2;
  }
}
