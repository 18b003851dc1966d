/*!

Serialization of terms to SMT-LIB 2 S-expression text (QF_ABV).

Literals: `#b0`/`#b1` for unit width, `#x…` with `width / 4` digits when the width is
a whole number of nibbles, and a full-width `#b…` binary literal otherwise. Operator
names come from the `FormatStyle::Input` table on [`Operator`], which is total over
the operation kinds.

`let`-binding compression: with `use_bindings` enabled, any rendered subterm longer
than [`LET_BINDING_THRESHOLD`] characters is interned under a fresh name `a_N` and
subsequent occurrences of the same rendered text reuse the name. `N` comes from a
process-global monotone counter, so names are fresh across every translation in the
process. The final output nests the bindings introduction-order-outward, which puts
each binding in scope for every later one:

```text
(let ((a_1 inner)) (let ((a_2 (f a_1))) body))
```

A `select` whose array operand is a `store` always routes that operand through the
binding intern, even below the length threshold; its index is emitted in place.

*/

use std::sync::atomic::{AtomicU64, Ordering};

use crate::abstractions::HashMap;
use crate::expr::{ExpressionKind, Operator, RcExpression, Width};
use crate::visitor::cache::VisitCache;
use crate::visitor::{evaluate, Visitor};

/// Rendered subterms longer than this are candidates for `let` binding.
pub const LET_BINDING_THRESHOLD: usize = 10;

static BINDING_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Renders `expression` as an SMT-LIB 2 S-expression.
pub fn translate_to_smtlib(expression: &RcExpression, use_bindings: bool) -> String {
  let mut translator = SmtlibTranslator::new(use_bindings);
  let body = evaluate(&mut translator, expression);
  translator.finish(body)
}

pub struct Binding {
  pub name:     String,
  pub term:     RcExpression,
  pub rendered: String,
}

pub struct SmtlibTranslator {
  use_bindings:     bool,
  bindings:         Vec<Binding>,
  bindings_by_text: HashMap<String, String>,
  cache:            VisitCache<String>,
}

impl SmtlibTranslator {
  pub fn new(use_bindings: bool) -> Self {
    SmtlibTranslator {
      use_bindings,
      bindings: Vec::new(),
      bindings_by_text: HashMap::new(),
      cache: VisitCache::new(),
    }
  }

  /// The bindings introduced so far, in introduction order.
  pub fn bindings(&self) -> &[Binding] {
    &self.bindings
  }

  /// Wraps the rendered body in its `let` bindings, introduction order outward.
  pub fn finish(&self, body: String) -> String {
    let mut output = body;
    for binding in self.bindings.iter().rev() {
      output = format!("(let (({} {})) {})", binding.name, binding.rendered, output);
    }
    output
  }

  /// Interns `rendered` under a fresh `a_N` name, or returns it unchanged when
  /// binding is off or the text is too short to be worth naming.
  fn bind(&mut self, term: &RcExpression, rendered: String, force: bool) -> String {
    if !self.use_bindings || (!force && rendered.len() <= LET_BINDING_THRESHOLD) {
      return rendered;
    }
    if let Some(name) = self.bindings_by_text.get(&rendered) {
      return name.clone();
    }
    let name = format!("a_{}", BINDING_SERIAL.fetch_add(1, Ordering::Relaxed) + 1);
    self.bindings.push(Binding {
      name: name.clone(),
      term: term.clone(),
      rendered: rendered.clone(),
    });
    self.bindings_by_text.insert(rendered, name.clone());
    name
  }
}

impl Visitor for SmtlibTranslator {
  type Value = String;

  fn visit_node(&mut self, node: &RcExpression, args: &[String]) -> String {
    match node.kind() {
      ExpressionKind::BoolConstant { value } => {
        if *value { "true".to_string() } else { "false".to_string() }
      }
      ExpressionKind::BitVecConstant { value } => {
        bitvec_literal(node.width().unwrap(), *value)
      }
      ExpressionKind::BoolVariable { name }
      | ExpressionKind::BitVecVariable { name }
      | ExpressionKind::ArrayVariable { name, .. } => name.to_string(),

      ExpressionKind::Operation(Operator::ArraySelect) => {
        let array = &node.operands()[0];
        let array_text = if array.operator() == Some(Operator::ArrayStore) {
          self.bind(array, args[0].clone(), true)
        } else {
          args[0].clone()
        };
        format!("(select {} {})", array_text, args[1])
      }

      ExpressionKind::Operation(op) => {
        let mut parts = Vec::with_capacity(args.len());
        for (operand, text) in node.operands().iter().zip(args.iter()) {
          parts.push(self.bind(operand, text.clone(), false));
        }
        format!("({} {})", op.smtlib(), parts.join(" "))
      }
    }
  }

  fn cache(&mut self) -> &mut VisitCache<String> {
    &mut self.cache
  }
}

fn bitvec_literal(width: Width, value: u128) -> String {
  if width == 1 {
    format!("#b{}", value)
  } else if width % 4 == 0 {
    format!("#x{:01$x}", value, (width / 4) as usize)
  } else {
    format!("#b{:01$b}", value, width as usize)
  }
}
