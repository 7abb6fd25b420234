//! This module defines field results: per-node or per-element numeric
//! vectors of a given result kind at a given load step.
//!
//! A field result keeps its rows in file order inside a dense nalgebra matrix
//! (one row per id, one column per component) plus a map from id to row, so
//! lookups by id are cheap and the whole matrix can be handed to numerical
//! code as-is.

use std::collections::BTreeMap;
use std::fmt::Display;

use clap::ValueEnum;
use convert_case::{Case, Casing};
use nalgebra::{DMatrix, DVector};
use serde::{Serialize, Deserialize};

use crate::error::FebinError;

/// What a field result's rows are keyed by.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum Location {
  /// Rows are node ids.
  Node,
  /// Rows are element ids.
  Element
}

/// A load step and sub-step, identifying one solved state.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
  Hash, derive_more::From
)]
pub struct LoadStep {
  /// The load step, from 1.
  pub step: u32,
  /// The sub-step within it, from 1.
  pub substep: u32
}

impl LoadStep {
  /// Creates a load step reference.
  pub const fn new(step: u32, substep: u32) -> Self {
    return Self { step, substep };
  }
}

impl Display for LoadStep {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "load step {}, substep {}", self.step, self.substep);
  }
}

/// Generates the ResultKind enum.
macro_rules! gen_result_kinds {
  (
    $(
      {
        $desc:literal,
        $kname:ident,
        $code:literal,
        $loc:ident
      },
    )*
  ) => {
    /// The known result kinds.
    #[derive(
      Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd,
      Ord, Hash, ValueEnum
    )]
    #[non_exhaustive]
    pub enum ResultKind {
      $(
        #[doc = $desc]
        $kname,
      )*
    }

    impl ResultKind {
      /// Returns all known result kinds.
      pub const fn all() -> &'static [Self] {
        return &[ $(Self::$kname,)* ];
      }

      /// Returns the description of the kind.
      pub const fn desc(&self) -> &'static str {
        return match self {
          $(Self::$kname => $desc,)*
        };
      }

      /// Returns the code the solution summary uses.
      pub const fn code(&self) -> u32 {
        return match self {
          $(Self::$kname => $code,)*
        };
      }

      /// Returns whether rows are nodes or elements.
      pub const fn location(&self) -> Location {
        return match self {
          $(Self::$kname => Location::$loc,)*
        };
      }

      /// Returns the small name of the variant, CamelCase.
      pub const fn short_name(&self) -> &'static str {
        return match self {
          $(Self::$kname => stringify!($kname),)*
        };
      }
    }

    impl TryFrom<u32> for ResultKind {
      type Error = FebinError;

      fn try_from(code: u32) -> Result<Self, Self::Error> {
        return match code {
          $($code => Ok(Self::$kname),)*
          _ => Err(FebinError::UnknownResultKind(code))
        };
      }
    }
  }
}

gen_result_kinds!(
  { "Nodal displacements", Displacement, 1, Node },
  { "Nodal velocities", Velocity, 2, Node },
  { "Nodal accelerations", Acceleration, 3, Node },
  { "Nodal reaction forces", ReactionForce, 4, Node },
  { "Stresses averaged at nodes", NodalStress, 5, Node },
  { "Strains averaged at nodes", NodalStrain, 6, Node },
  { "Nodal temperatures", Temperature, 7, Node },
  { "Element stresses", ElementStress, 8, Element },
  { "Element strains", ElementStrain, 9, Element },
  { "Element energies", ElementEnergy, 10, Element },
);

impl ResultKind {
  /// Returns the small, snake case name of the variant, handy as a field
  /// name for visualization layers.
  pub fn snake_case_name(&self) -> String {
    return self.short_name().to_case(Case::Snake);
  }
}

impl Display for ResultKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.desc().to_lowercase());
  }
}

/// One field result: a fixed-width vector per node or element.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FieldResult {
  /// The kind of result.
  pub kind: ResultKind,
  /// The load step it was solved at.
  pub step: LoadStep,
  /// The solution time (or frequency) of that step.
  pub time: f64,
  /// The row ids, in file order.
  ids: Vec<i32>,
  /// Map from id to row.
  row_indexes: BTreeMap<i32, usize>,
  /// The data: one row per id, one column per component.
  data: DMatrix<f64>
}

impl FieldResult {
  /// Builds a field result out of ids and row-major values. `values` must
  /// hold `ids.len() * width` numbers, and ids must be unique.
  pub fn from_rows(
    kind: ResultKind,
    step: LoadStep,
    time: f64,
    ids: Vec<i32>,
    width: usize,
    values: &[f64]
  ) -> Result<Self, FebinError> {
    if ids.len() * width != values.len() {
      return Err(FebinError::RaggedResult {
        kind,
        expected: ids.len() * width,
        found: values.len()
      });
    }
    let mut row_indexes = BTreeMap::new();
    for (row, id) in ids.iter().enumerate() {
      if row_indexes.insert(*id, row).is_some() {
        return Err(FebinError::DuplicateResultId { kind, id: *id });
      }
    }
    let data = DMatrix::from_row_slice(ids.len(), width, values);
    return Ok(Self { kind, step, time, ids, row_indexes, data });
  }

  /// Returns whether rows are nodes or elements.
  pub fn location(&self) -> Location {
    return self.kind.location();
  }

  /// Returns the number of components per row.
  pub fn width(&self) -> usize {
    return self.data.ncols();
  }

  /// Returns the number of rows.
  pub fn len(&self) -> usize {
    return self.ids.len();
  }

  /// Checks whether there are no rows.
  pub fn is_empty(&self) -> bool {
    return self.ids.is_empty();
  }

  /// Returns the row ids in file order.
  pub fn ids(&self) -> &[i32] {
    return &self.ids;
  }

  /// Returns the underlying matrix.
  pub fn data(&self) -> &DMatrix<f64> {
    return &self.data;
  }

  /// Returns the vector for an id.
  pub fn row(&self, id: i32) -> Option<DVector<f64>> {
    let r = *self.row_indexes.get(&id)?;
    return Some(self.data.row(r).transpose());
  }

  /// Returns a single component for an id.
  pub fn get(&self, id: i32, component: usize) -> Option<f64> {
    let r = *self.row_indexes.get(&id)?;
    return self.data.get((r, component)).copied();
  }

  /// Returns the Euclidean norm of every row, in row order.
  pub fn norms(&self) -> Vec<f64> {
    return self.data.row_iter().map(|r| r.norm()).collect();
  }
}
