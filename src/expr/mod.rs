/*!

The term algebra: sorts, operator tags, taint, the interned expression node, and its
sort-checked constructors.

*/

mod build;
mod expression;
mod intern;
mod operator;
mod proxy;
mod sort;
mod taint;

pub use expression::{Expression, ExpressionKind, OperandList, RcExpression};
pub use operator::Operator;
pub use proxy::ArrayProxy;
pub use sort::{Sort, Width, MAX_WIDTH};
pub use taint::Taint;

pub(crate) use build::{operation, rebuild};
pub(crate) use sort::{from_signed, mask, to_signed, truncate};
