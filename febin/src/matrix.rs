//! This module implements the matrix parser: sparse stiffness, mass and
//! damping matrices stored as runs of consecutive entries along a row, plus
//! the map from equation numbers to nodal degrees of freedom.
//!
//! Entries are validated as they stream in. The first one outside the
//! declared dimension aborts the decode before it (or anything else from its
//! run) reaches the output.

use std::collections::BTreeMap;
use std::fmt::Display;

use log::{debug, info};
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use serde::{Serialize, Deserialize};

use crate::decoder::*;
use crate::error::{FebinError, Result};
use crate::flavour::FileKind;
use crate::geometry::Dof;

/// Payload size of a matrix header record.
pub const MATRIX_HEADER_BYTES: usize = 8;

/// Size of the fixed part of a run record.
pub const RUN_HEADER_BYTES: usize = 12;

/// Payload size of a DOF map record.
pub const DOF_RECORD_BYTES: usize = 8;

/// The kinds of system matrix a file can hold.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum MatrixKind {
  /// Stiffness matrix.
  Stiffness,
  /// Mass matrix.
  Mass,
  /// Damping matrix.
  Damping
}

impl MatrixKind {
  /// Returns all kinds.
  pub const fn all() -> &'static [Self] {
    return &[Self::Stiffness, Self::Mass, Self::Damping];
  }

  /// Returns the section the kind is stored in.
  pub const fn section(&self) -> SectionId {
    return match self {
      Self::Stiffness => SectionId::Stiffness,
      Self::Mass => SectionId::Mass,
      Self::Damping => SectionId::Damping,
    };
  }
}

impl Display for MatrixKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", format!("{:?}", self).to_lowercase());
  }
}

/// A square sparse matrix in coordinate form.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SparseMatrix {
  /// What the matrix is.
  pub kind: MatrixKind,
  /// Whether only the upper triangle is stored.
  pub symmetric: bool,
  /// The stored entries.
  entries: CooMatrix<f64>
}

impl SparseMatrix {
  /// Returns the number of rows (and columns).
  pub fn dimension(&self) -> usize {
    return self.entries.nrows();
  }

  /// Returns the number of stored entries.
  pub fn nnz(&self) -> usize {
    return self.entries.nnz();
  }

  /// Returns the stored entries as they were read. Symmetric matrices only
  /// have their upper triangle here.
  pub fn entries(&self) -> &CooMatrix<f64> {
    return &self.entries;
  }

  /// Returns all entries, with the lower triangle filled in for symmetric
  /// storage.
  pub fn mirrored(&self) -> CooMatrix<f64> {
    if !self.symmetric {
      return self.entries.clone();
    }
    let mut full = self.entries.clone();
    for (r, c, v) in self.entries.triplet_iter() {
      if r != c {
        full.push(c, r, *v);
      }
    }
    return full;
  }

  /// Returns the full matrix in compressed row form. Repeated entries are
  /// summed.
  pub fn to_csr(&self) -> CsrMatrix<f64> {
    return CsrMatrix::from(&self.mirrored());
  }

  /// Returns the diagonal.
  pub fn diagonal(&self) -> DVector<f64> {
    let mut diag = DVector::zeros(self.dimension());
    for (r, c, v) in self.entries.triplet_iter() {
      if r == c {
        diag[r] += *v;
      }
    }
    return diag;
  }
}

/// Decodes a matrix section: one header record, then runs.
pub(crate) struct MatrixDecoder {
  /// What we're decoding.
  kind: MatrixKind,
  /// The symmetry flag, once the header is in.
  symmetric: bool,
  /// The accepted entries, once the header is in.
  entries: Option<CooMatrix<f64>>
}

impl MatrixDecoder {
  /// Creates a decoder for a matrix kind.
  pub(crate) fn new(kind: MatrixKind) -> Self {
    return Self { kind, symmetric: false, entries: None };
  }

  /// Returns the number of accepted entries.
  pub(crate) fn accepted(&self) -> usize {
    return self.entries.as_ref().map_or(0, |e| e.nnz());
  }

  /// Reads the header record.
  fn header(&mut self, record: &Record<'_>) -> Result<()> {
    record.expect_len(MATRIX_HEADER_BYTES)?;
    let mut cur = record.cursor();
    let dimension = cur.read_u32()? as usize;
    self.symmetric = match cur.read_u32()? {
      0 => false,
      1 => true,
      x => return Err(record.corrupt(format!("bad symmetry flag {}", x)))
    };
    debug!(
      "Reading {}{} matrix of dimension {}.",
      if self.symmetric { "symmetric " } else { "" },
      self.kind,
      dimension
    );
    self.entries = Some(CooMatrix::new(dimension, dimension));
    return Ok(());
  }
}

impl SectionDecoder for MatrixDecoder {
  type Output = SparseMatrix;

  fn consume(&mut self, record: Record<'_>) -> Result<()> {
    let symmetric = self.symmetric;
    let entries = match self.entries.as_mut() {
      Some(e) => e,
      None => return self.header(&record)
    };
    let dimension = entries.nrows();
    if record.len() < RUN_HEADER_BYTES {
      return Err(record.corrupt("run record shorter than its header"));
    }
    let mut cur = record.cursor();
    let row = cur.read_i32()? as i64;
    let first = cur.read_i32()? as i64;
    let count = cur.read_u32()? as usize;
    record.expect_len(RUN_HEADER_BYTES + 8 * count)?;
    if count == 0 {
      return Ok(());
    }
    let last = first + count as i64 - 1;
    let in_range = |x: i64| x >= 0 && x < dimension as i64;
    if !in_range(row) || !in_range(first) || !in_range(last) {
      // the first column past the edge, or the run start
      let col = if in_range(first) && !in_range(last) {
        dimension as i64
      } else {
        first
      };
      return Err(FebinError::IndexOutOfRange { row, col, dimension });
    }
    if symmetric && first < row {
      return Err(FebinError::LowerTriangleEntry { row, col: first });
    }
    for c in 0..count {
      let value = cur.read_f64()?;
      entries.push(row as usize, first as usize + c, value);
    }
    return Ok(());
  }

  fn finalise(self) -> Result<Self::Output> {
    let entries = match self.entries {
      Some(e) => e,
      None => return Err(FebinError::CorruptRecord {
        section: self.kind.section(),
        offset: 0,
        reason: "matrix section has no header record".to_string()
      })
    };
    return Ok(SparseMatrix {
      kind: self.kind,
      symmetric: self.symmetric,
      entries
    });
  }
}

/// Which node and degree of freedom every matrix equation belongs to.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DofMap {
  /// Per equation, the node id and DOF.
  equations: Vec<(i32, Dof)>
}

impl DofMap {
  /// Returns the number of equations.
  pub fn len(&self) -> usize {
    return self.equations.len();
  }

  /// Checks whether there are no equations.
  pub fn is_empty(&self) -> bool {
    return self.equations.is_empty();
  }

  /// Returns the node and DOF of an equation.
  pub fn get(&self, equation: usize) -> Option<(i32, Dof)> {
    return self.equations.get(equation).copied();
  }

  /// Returns the equation of a node's DOF.
  pub fn equation_of(&self, node: i32, dof: Dof) -> Option<usize> {
    return self.equations.iter().position(|e| *e == (node, dof));
  }

  /// Groups the equations by node.
  pub fn by_node(&self) -> BTreeMap<i32, Vec<(Dof, usize)>> {
    let mut map: BTreeMap<i32, Vec<(Dof, usize)>> = BTreeMap::new();
    for (eq, (node, dof)) in self.equations.iter().enumerate() {
      map.entry(*node).or_default().push((*dof, eq));
    }
    return map;
  }
}

/// Decodes a DOF map section.
pub(crate) struct DofMapDecoder {
  /// The equations so far.
  equations: Vec<(i32, Dof)>
}

impl SectionDecoder for DofMapDecoder {
  type Output = DofMap;

  fn consume(&mut self, record: Record<'_>) -> Result<()> {
    record.expect_len(DOF_RECORD_BYTES)?;
    let mut cur = record.cursor();
    let node = cur.read_i32()?;
    let number = cur.read_u32()?;
    let equation = self.equations.len();
    let dof = Dof::try_from(number)
      .map_err(|_| FebinError::UnknownDof { equation, dof: number })?;
    self.equations.push((node, dof));
    return Ok(());
  }

  fn finalise(self) -> Result<Self::Output> {
    return Ok(DofMap { equations: self.equations });
  }
}

/// Every matrix in a matrix file.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MatrixSet {
  /// The matrices present, by kind.
  pub matrices: BTreeMap<MatrixKind, SparseMatrix>,
  /// The DOF map, if the file has one.
  pub dof_map: Option<DofMap>
}

impl MatrixSet {
  /// Returns a matrix.
  pub fn get(&self, kind: MatrixKind) -> Option<&SparseMatrix> {
    return self.matrices.get(&kind);
  }
}

/// Decodes one matrix of an open matrix file.
pub fn read_matrix(
  decoder: &Decoder<'_>,
  kind: MatrixKind
) -> Result<SparseMatrix> {
  decoder.expect_kind(FileKind::Matrix)?;
  let section = decoder.section(kind.section())?;
  let matrix = decode_section(MatrixDecoder::new(kind), section)?;
  info!(
    "Read {} matrix, dimension {} with {} stored entries.",
    kind,
    matrix.dimension(),
    matrix.nnz()
  );
  return Ok(matrix);
}

/// Decodes the DOF map of an open matrix file.
pub fn read_dof_map(decoder: &Decoder<'_>) -> Result<DofMap> {
  decoder.expect_kind(FileKind::Matrix)?;
  let section = decoder.section(SectionId::DofMap)?;
  let n = section.capacity_hint(DOF_RECORD_BYTES);
  return decode_section(
    DofMapDecoder { equations: Vec::with_capacity(n) },
    section
  );
}

/// Decodes every matrix of an open matrix file, plus the DOF map when there
/// is one. The DOF map must cover exactly the equations of every matrix.
pub fn read_matrices(decoder: &Decoder<'_>) -> Result<MatrixSet> {
  decoder.expect_kind(FileKind::Matrix)?;
  let mut set = MatrixSet::default();
  for kind in MatrixKind::all() {
    if decoder.has_section(kind.section()) {
      set.matrices.insert(*kind, read_matrix(decoder, *kind)?);
    }
  }
  if decoder.has_section(SectionId::DofMap) {
    let map = read_dof_map(decoder)?;
    let mismatch = set.matrices.values().find(|m| m.dimension() != map.len());
    if let Some(m) = mismatch {
      return Err(FebinError::CorruptRecord {
        section: SectionId::DofMap,
        offset: decoder.pointer(SectionId::DofMap).map_or(0, |p| p.offset),
        reason: format!(
          "maps {} equations but the {} matrix has {}",
          map.len(),
          m.kind,
          m.dimension()
        )
      });
    }
    set.dof_map = Some(map);
  }
  return Ok(set);
}
