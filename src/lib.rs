/*!

`bvexpr` is a rewriting and simplification engine for a quantifier-free first-order
logic over fixed-width bit-vectors, booleans, and arrays: the term algebra of
SMT-LIB 2 `QF_ABV`.

Terms are immutable, interned, reference-counted nodes ([`expr`]). The engine is a
family of post-order DAG visitors ([`visitor`]): a constant folder, a fixed-point
arithmetic simplifier, a free-variable collector, a depth measure, a substitution
pass, a diagnostic pretty printer, and an SMT-LIB translator with optional
`let`-binding compression. The top-level [`simplify`] is the folder composed with
the simplifier, memoized.

The crate is single-threaded by contract: all persistent caches (the intern table
included) are thread-local, and no operation blocks or performs I/O. Incorrect use
(ill-sorted construction, popping an empty visitor stack) is a programmer error and
panics; for correct inputs the engine is purely functional.

*/

pub mod abstractions;
pub mod expr;
pub mod format;
pub mod simplify;
pub mod visitor;

#[cfg(test)]
mod tests;

pub use expr::{ArrayProxy, Expression, ExpressionKind, Operator, RcExpression, Sort, Taint, Width};
pub use simplify::{simplify, to_constant, Concrete};
pub use visitor::arithmetic::arithmetic_simplify;
pub use visitor::constant_fold::constant_fold;
pub use visitor::queries::{get_depth, get_variables, pretty_print};
pub use visitor::replace::replace;
pub use visitor::smtlib::{translate_to_smtlib, SmtlibTranslator, LET_BINDING_THRESHOLD};
