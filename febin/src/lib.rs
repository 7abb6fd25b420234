//! This library implements types and functions to decode the binary archive,
//! result and matrix files written by finite element solvers, and to turn
//! them into an assembled mesh with field results attached.
//!
//! Files are read whole and decoded through a pointer table of sections, each
//! a sequence of length-prefixed records. Everything is bounds-checked, and
//! structural problems abort the parse with the offending id or offset.
//!
//! On top of the mesh sit two geometry post-processors: element quality
//! scoring and midside node relaxation.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::needless_return)]

pub mod archive;
pub mod cache;
pub mod cursor;
pub mod decoder;
pub mod elements;
pub mod error;
pub mod fields;
pub mod flavour;
pub mod geometry;
pub mod matrix;
pub mod mesh;
pub mod parser;
pub mod quality;
pub mod relax;
pub mod results;
pub mod tables;

#[cfg(test)]
mod tests;

/// Re-exports everything a caller usually needs.
pub mod prelude {
  pub use crate::archive::read_archive;
  pub use crate::cache::ParseCache;
  pub use crate::decoder::{Decoder, SectionId};
  pub use crate::elements::*;
  pub use crate::error::{FebinError, Result};
  pub use crate::fields::*;
  pub use crate::flavour::*;
  pub use crate::geometry::*;
  pub use crate::matrix::*;
  pub use crate::mesh::*;
  pub use crate::parser::*;
  pub use crate::quality::*;
  pub use crate::relax::*;
  pub use crate::results::*;
  pub use crate::tables::*;
}
