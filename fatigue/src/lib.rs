//! This library implements types and functions to read the text reports of a
//! structural fatigue calculation and correlate them per calculation node.
//!
//! The summary report tells us, for each node, its accumulated damage, the
//! base moment of time its stresses are referred to and the reduced stress
//! component that governs it. Those attributes are then used as filters when
//! scanning the (much larger) local stress, elastic stress and accumulated
//! fatigue damage reports, which repeat the same block headers for every
//! node, component and base moment the solver went through.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::needless_return)]

pub mod cycles;
pub mod elastic;
pub mod errors;
pub mod local;
pub mod nodes;
pub mod reports;
pub mod scanner;
pub mod util;

/// Imports the most relevant exports from the library.
pub mod prelude {
  pub use crate::cycles::*;
  pub use crate::elastic::*;
  pub use crate::errors::*;
  pub use crate::local::*;
  pub use crate::nodes::*;
  pub use crate::reports::*;
  pub use crate::scanner::*;
}

#[cfg(test)]
mod tests;
