#![allow(unused)]
/*!

Types/type aliases that abstract over the implementing backing type. If a backing
implementation is ever swapped out (say, `ustr` for `string_cache`), only this
module changes.

*/

// A fast hash set and hash map
pub use std::collections::{HashSet, HashMap};



use ustr::Ustr;
/// Interned strings. Create an interned string with `IString::from(..)`
pub type IString = Ustr;



/// The type of a cached structural hash.
pub type HashType = u64;
