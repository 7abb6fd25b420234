//! This module implements the path-level entry points. Each one reads the
//! whole file into memory, opens a decoder over it and hands it to the
//! matching parser; the buffer is dropped when the call returns, whatever
//! the outcome.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Serialize, Deserialize};

use crate::archive::read_archive;
use crate::decoder::Decoder;
use crate::error::Result;
use crate::flavour::{FileKind, ReadOptions};
use crate::matrix::*;
use crate::mesh::{assemble, Mesh};
use crate::results::*;
use crate::tables::{ElementTable, NodeTable};

/// What a parse produced.
#[derive(Clone, Debug, Serialize, Deserialize, derive_more::From)]
#[non_exhaustive]
pub enum Parsed {
  /// The tables of an archive file.
  Archive {
    /// The nodes.
    nodes: NodeTable,
    /// The elements.
    elements: ElementTable
  },
  /// Every result set of a result file.
  Results(MeshResults),
  /// Every matrix of a matrix file.
  Matrices(MatrixSet)
}

impl Parsed {
  /// Returns the kind of file this came from.
  pub fn kind(&self) -> FileKind {
    return match self {
      Self::Archive { .. } => FileKind::Archive,
      Self::Results(_) => FileKind::Result,
      Self::Matrices(_) => FileKind::Matrix,
    };
  }
}

/// Reads a whole file.
fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
  let buf = fs::read(path.as_ref())?;
  debug!("Read {} bytes from {}.", buf.len(), path.as_ref().display());
  return Ok(buf);
}

/// Parses an in-memory file as the requested kind. The header must agree.
pub fn parse_bytes(
  buf: &[u8],
  kind: FileKind,
  options: &ReadOptions
) -> Result<Parsed> {
  let decoder = Decoder::open(buf, options)?;
  decoder.expect_kind(kind)?;
  return match kind {
    FileKind::Archive => read_archive(&decoder).map(Parsed::from),
    FileKind::Result => read_all_results(&decoder).map(Parsed::from),
    FileKind::Matrix => read_matrices(&decoder).map(Parsed::from),
  };
}

/// Parses a file as the requested kind. The header must agree.
pub fn parse_file<P: AsRef<Path>>(
  path: P,
  kind: FileKind,
  options: &ReadOptions
) -> Result<Parsed> {
  let buf = read_file(&path)?;
  let parsed = parse_bytes(&buf, kind, options)?;
  info!("Parsed {} as {} file.", path.as_ref().display(), kind);
  return Ok(parsed);
}

/// Parses the node and element tables of an archive file.
pub fn parse_archive<P: AsRef<Path>>(
  path: P
) -> Result<(NodeTable, ElementTable)> {
  return parse_archive_with(path, &ReadOptions::default());
}

/// Parses the node and element tables of an archive file, with options.
pub fn parse_archive_with<P: AsRef<Path>>(
  path: P,
  options: &ReadOptions
) -> Result<(NodeTable, ElementTable)> {
  let buf = read_file(path)?;
  return read_archive(&Decoder::open(&buf, options)?);
}

/// Parses the requested result sets of a result file. Nothing is returned
/// unless every request can be met.
pub fn parse_results<P: AsRef<Path>>(
  path: P,
  requests: &[ResultRequest]
) -> Result<MeshResults> {
  return parse_results_with(path, requests, &ReadOptions::default());
}

/// Parses the requested result sets of a result file, with options.
pub fn parse_results_with<P: AsRef<Path>>(
  path: P,
  requests: &[ResultRequest],
  options: &ReadOptions
) -> Result<MeshResults> {
  let buf = read_file(path)?;
  return read_results(&Decoder::open(&buf, options)?, requests);
}

/// Parses the stiffness matrix of a matrix file.
pub fn parse_matrix<P: AsRef<Path>>(path: P) -> Result<SparseMatrix> {
  return parse_matrix_with(path, &ReadOptions::default());
}

/// Parses the stiffness matrix of a matrix file, with options.
pub fn parse_matrix_with<P: AsRef<Path>>(
  path: P,
  options: &ReadOptions
) -> Result<SparseMatrix> {
  return parse_matrix_kind_with(path, MatrixKind::Stiffness, options);
}

/// Parses one matrix of a matrix file.
pub fn parse_matrix_kind<P: AsRef<Path>>(
  path: P,
  kind: MatrixKind
) -> Result<SparseMatrix> {
  return parse_matrix_kind_with(path, kind, &ReadOptions::default());
}

/// Parses one matrix of a matrix file, with options.
pub fn parse_matrix_kind_with<P: AsRef<Path>>(
  path: P,
  kind: MatrixKind,
  options: &ReadOptions
) -> Result<SparseMatrix> {
  let buf = read_file(path)?;
  return read_matrix(&Decoder::open(&buf, options)?, kind);
}

/// Parses every matrix of a matrix file, with its DOF map.
pub fn parse_matrices<P: AsRef<Path>>(path: P) -> Result<MatrixSet> {
  return parse_matrices_with(path, &ReadOptions::default());
}

/// Parses every matrix of a matrix file, with options.
pub fn parse_matrices_with<P: AsRef<Path>>(
  path: P,
  options: &ReadOptions
) -> Result<MatrixSet> {
  let buf = read_file(path)?;
  return read_matrices(&Decoder::open(&buf, options)?);
}

/// Parses an archive and, optionally, every result set of a result file for
/// it, and assembles the lot into a mesh.
pub fn parse_mesh<P: AsRef<Path>, Q: AsRef<Path>>(
  archive: P,
  results: Option<Q>,
  options: &ReadOptions
) -> Result<Mesh> {
  let (nodes, elements) = parse_archive_with(archive, options)?;
  let results = match results {
    Some(path) => {
      let buf = read_file(path)?;
      Some(read_all_results(&Decoder::open(&buf, options)?)?)
    },
    None => None
  };
  return assemble(nodes, elements, results);
}
