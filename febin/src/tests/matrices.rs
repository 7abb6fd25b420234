//! Matrix parser tests.

use crate::decoder::*;
use crate::error::FebinError;
use crate::flavour::*;
use crate::geometry::Dof;
use crate::matrix::*;

use super::builder::FileBuilder;

/// Opens a buffer with default options.
fn open(buf: &[u8]) -> Decoder<'_> {
  return Decoder::open(buf, &ReadOptions::default()).unwrap();
}

/// A symmetric 3x3 stiffness matrix
/// ```text
/// [ 4 -1  0 ]
/// [-1  4 -1 ]
/// [ 0 -1  4 ]
/// ```
/// with a DOF map over two nodes.
fn tridiagonal(version: FormatVersion) -> Vec<u8> {
  let b = FileBuilder::new(version, FileKind::Matrix);
  let stiffness = vec![
    b.matrix_header(3, true),
    b.run(0, 0, &[4.0, -1.0]),
    b.run(1, 1, &[4.0, -1.0]),
    b.run(2, 2, &[4.0]),
  ];
  let mass = vec![
    b.matrix_header(3, false),
    b.run(0, 0, &[2.0]),
    b.run(1, 1, &[2.0]),
    b.run(2, 2, &[2.0]),
  ];
  let dofs = vec![b.dof(1, 1), b.dof(1, 2), b.dof(2, 6)];
  return b.section(30, stiffness)
    .section(31, mass)
    .section(33, dofs)
    .build();
}

#[test]
fn test_symmetric_matrix() {
  let buf = tridiagonal(FormatVersion::V2);
  let k = read_matrix(&open(&buf), MatrixKind::Stiffness).unwrap();
  assert!(k.symmetric);
  assert_eq!(k.dimension(), 3);
  assert_eq!(k.nnz(), 5);
  assert_eq!(k.mirrored().nnz(), 7);
  let csr = k.to_csr();
  let dense = nalgebra::DMatrix::from(&csr);
  assert_eq!(dense[(1, 0)], -1.0);
  assert_eq!(dense[(0, 1)], -1.0);
  assert_eq!(dense[(2, 0)], 0.0);
  assert_eq!(dense, dense.transpose());
  assert_eq!(k.diagonal().as_slice(), &[4.0, 4.0, 4.0]);
}

#[test]
fn test_matrix_set() {
  let buf = tridiagonal(FormatVersion::V1);
  let set = read_matrices(&open(&buf)).unwrap();
  assert_eq!(set.matrices.len(), 2);
  assert!(set.get(MatrixKind::Damping).is_none());
  let m = set.get(MatrixKind::Mass).unwrap();
  assert!(!m.symmetric);
  assert_eq!(m.diagonal().sum(), 6.0);
  let map = set.dof_map.unwrap();
  assert_eq!(map.len(), 3);
  assert_eq!(map.get(2), Some((2, Dof::all()[5])));
  assert_eq!(map.equation_of(1, Dof::all()[1]), Some(1));
  assert_eq!(map.by_node()[&1].len(), 2);
}

#[test]
fn test_out_of_range_row() {
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Matrix);
  let records = vec![
    b.matrix_header(100, false),
    b.run(150, 0, &[1.0]),
    b.run(0, 0, &[1.0]),
  ];
  let buf = b.section(30, records).build();
  let dec = open(&buf);
  assert!(matches!(
    read_matrix(&dec, MatrixKind::Stiffness),
    Err(FebinError::IndexOutOfRange { row: 150, col: 0, dimension: 100 })
  ));
  // nothing was accepted before the failure
  let mut decoder = MatrixDecoder::new(MatrixKind::Stiffness);
  let mut section = dec.section(SectionId::Stiffness).unwrap();
  let header = section.next_record().unwrap().unwrap();
  decoder.consume(header).unwrap();
  let run = section.next_record().unwrap().unwrap();
  assert!(decoder.consume(run).is_err());
  assert_eq!(decoder.accepted(), 0);
}

#[test]
fn test_run_overflowing_columns() {
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Matrix);
  let records = vec![
    b.matrix_header(4, false),
    b.run(0, 0, &[1.0]),
    b.run(1, 2, &[1.0, 2.0, 3.0]),
  ];
  let buf = b.section(30, records).build();
  assert!(matches!(
    read_matrix(&open(&buf), MatrixKind::Stiffness),
    Err(FebinError::IndexOutOfRange { row: 1, col: 4, dimension: 4 })
  ));
  // a long run reports where it first leaves the matrix
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Matrix);
  let records = vec![b.matrix_header(4, false), b.run(3, 1, &[1.0; 6])];
  let buf = b.section(30, records).build();
  assert!(matches!(
    read_matrix(&open(&buf), MatrixKind::Stiffness),
    Err(FebinError::IndexOutOfRange { row: 3, col: 4, dimension: 4 })
  ));
  // a bad row with an in-range run names the run start
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Matrix);
  let records = vec![b.matrix_header(4, false), b.run(-1, 1, &[1.0, 2.0])];
  let buf = b.section(30, records).build();
  assert!(matches!(
    read_matrix(&open(&buf), MatrixKind::Stiffness),
    Err(FebinError::IndexOutOfRange { row: -1, col: 1, dimension: 4 })
  ));
}

#[test]
fn test_lower_triangle_rejected() {
  let b = FileBuilder::new(FormatVersion::V2, FileKind::Matrix);
  let records = vec![b.matrix_header(3, true), b.run(2, 1, &[1.0, 1.0])];
  let buf = b.section(30, records).build();
  assert!(matches!(
    read_matrix(&open(&buf), MatrixKind::Stiffness),
    Err(FebinError::LowerTriangleEntry { row: 2, col: 1 })
  ));
}

#[test]
fn test_matrix_without_header() {
  let buf = FileBuilder::new(FormatVersion::V1, FileKind::Matrix)
    .section(32, vec![])
    .build();
  assert!(matches!(
    read_matrix(&open(&buf), MatrixKind::Damping),
    Err(FebinError::CorruptRecord { section: SectionId::Damping, .. })
  ));
}

#[test]
fn test_bad_dof_map() {
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Matrix);
  let dofs = vec![b.dof(1, 1), b.dof(1, 9)];
  let buf = b.section(33, dofs).build();
  assert!(matches!(
    read_dof_map(&open(&buf)),
    Err(FebinError::UnknownDof { equation: 1, dof: 9 })
  ));
  // a map that doesn't cover the matrix
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Matrix);
  let k = vec![b.matrix_header(2, false), b.run(0, 0, &[1.0, 2.0])];
  let dofs = vec![b.dof(1, 1)];
  let buf = b.section(30, k).section(33, dofs).build();
  assert!(matches!(
    read_matrices(&open(&buf)),
    Err(FebinError::CorruptRecord { section: SectionId::DofMap, .. })
  ));
}
