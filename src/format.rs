/*!

There is more than one useful text representation for sorts, operators, and terms: a
readable kind label for diagnostics, and the SMT-LIB concrete syntax for emission. This
module provides a unified API for formatting objects across the crate.

The trait that formattable types implement is `Formattable`. It works like the standard
library's `Display` trait, except that the caller chooses a `FormatStyle`. Both
`Display` and `Debug` can be derived from a `Formattable` implementation with the
`impl_display_debug_for_formattable!` convenience macro.

*/

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum FormatStyle {
  #[default]
  Default, // Readable kind labels, e.g. `BitVecAdd`, `BitVec(8)`
  Input,   // SMT-LIB concrete syntax, e.g. `bvadd`, `(_ BitVec 8)`
  Debug,   // Format with extra debugging information
}

pub trait Formattable {
  /// Writes a text representation of `self` according to the given `FormatStyle`.
  /// Use `format!` and friends to create a string.
  fn repr(&self, out: &mut dyn std::fmt::Write, style: FormatStyle) -> std::fmt::Result;
}

#[macro_export]
macro_rules! impl_display_debug_for_formattable {
    ($t:ty) => {
        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                <$t as $crate::format::Formattable>::repr(self, f, $crate::format::FormatStyle::Default)
            }
        }

        impl std::fmt::Debug for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                <$t as $crate::format::Formattable>::repr(self, f, $crate::format::FormatStyle::Debug)
            }
        }
    };
}
pub use impl_display_debug_for_formattable;
