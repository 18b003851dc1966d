/*!

`ArrayProxy` is a thin client-side wrapper over an array-sorted term. Clients that
model a sparse memory keep one of these around and index through it; the engine
itself always operates on the underlying term, so the wrapper unwraps at the API
boundary (the historical contract was an unwrap at the top of every traversal).

*/

use crate::expr::expression::{Expression, RcExpression};

pub struct ArrayProxy {
  array: RcExpression,
}

impl ArrayProxy {
  pub fn new(array: RcExpression) -> Self {
    assert!(
      array.sort().is_array(),
      "ArrayProxy expects an array term, got {}",
      array.sort()
    );
    ArrayProxy { array }
  }

  /// The underlying array term.
  #[inline(always)]
  pub fn array(&self) -> &RcExpression {
    &self.array
  }

  #[inline(always)]
  pub fn index_max(&self) -> Option<u64> {
    self.array.index_max()
  }

  /// Writes through the proxy, producing a proxy over the new store layer.
  pub fn store(&self, index: RcExpression, value: RcExpression) -> ArrayProxy {
    ArrayProxy { array: Expression::store(self.array.clone(), index, value) }
  }

  /// Reads `array[index]`.
  pub fn select(&self, index: RcExpression) -> RcExpression {
    Expression::select(self.array.clone(), index)
  }
}

impl From<ArrayProxy> for RcExpression {
  fn from(proxy: ArrayProxy) -> RcExpression {
    proxy.array
  }
}

impl From<&ArrayProxy> for RcExpression {
  fn from(proxy: &ArrayProxy) -> RcExpression {
    proxy.array.clone()
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn proxy_unwraps_to_the_underlying_term() {
    let base = Expression::array_variable("mem", 32, 8, Some(4));
    let proxy = ArrayProxy::new(base.clone());
    let unwrapped: RcExpression = (&proxy).into();
    assert!(Expression::ptr_eq(&base, &unwrapped));
    assert_eq!(proxy.index_max(), Some(4));
  }

  #[test]
  fn stores_layer_through_the_proxy() {
    let base = Expression::array_variable("mem", 32, 8, None);
    let proxy = ArrayProxy::new(base)
      .store(Expression::bitvec_constant(32, 0), Expression::bitvec_constant(8, 0xAA));
    assert!(proxy.array().is_operation());
  }
}
