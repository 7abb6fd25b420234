//! Path-level parser and parse cache tests.

use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::NamedTempFile;

use crate::cache::ParseCache;
use crate::error::FebinError;
use crate::fields::*;
use crate::flavour::*;
use crate::matrix::MatrixKind;
use crate::parser::*;
use crate::results::ResultRequest;

use super::builder::*;
use super::results::two_step_results;

/// Writes bytes to a fresh temporary file.
fn temp_file(bytes: &[u8]) -> NamedTempFile {
  let mut file = NamedTempFile::new().unwrap();
  file.write_all(bytes).unwrap();
  file.flush().unwrap();
  return file;
}

/// The strip archive, on disk.
fn strip_file(version: FormatVersion) -> NamedTempFile {
  let (nodes, elements) = strip();
  return temp_file(&archive(version, &nodes, &elements));
}

#[test]
fn test_parse_file_kinds() {
  let file = strip_file(FormatVersion::V2);
  let options = ReadOptions::default();
  let parsed = parse_file(file.path(), FileKind::Archive, &options).unwrap();
  assert_eq!(parsed.kind(), FileKind::Archive);
  match parsed {
    Parsed::Archive { nodes, elements } => {
      assert_eq!(nodes.len(), 6);
      assert_eq!(elements.len(), 4);
    },
    other => panic!("expected an archive, got {:?}", other)
  }
  assert!(matches!(
    parse_file(file.path(), FileKind::Matrix, &ReadOptions::default()),
    Err(FebinError::WrongFileKind {
      expected: FileKind::Matrix,
      found: FileKind::Archive
    })
  ));
}

#[test]
fn test_parse_missing_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nope.bin");
  assert!(matches!(parse_archive(&path), Err(FebinError::Io(_))));
}

#[test]
fn test_parse_mesh_from_paths() {
  let archive = strip_file(FormatVersion::V1);
  let results = temp_file(&two_step_results(FormatVersion::V1));
  let mesh = parse_mesh(
    archive.path(),
    Some(results.path()),
    &ReadOptions::default()
  ).unwrap();
  assert_eq!(mesh.n_elements(), 4);
  assert_eq!(mesh.fields().len(), 3);
  let only = parse_results(
    results.path(),
    &[ResultRequest::all(ResultKind::Displacement)]
  ).unwrap();
  assert_eq!(only.len(), 2);
}

#[test]
fn test_parse_unstamped_with_hint() {
  let b = FileBuilder::new(FormatVersion::V2, FileKind::Archive).unstamped();
  let node = b.node(1, [1.0, 2.0, 3.0]);
  let file = temp_file(&b.section(10, vec![node]).section(11, vec![]).build());
  assert!(parse_archive(file.path()).is_err());
  let options = ReadOptions::default().with_version_hint(FormatVersion::V2);
  let (nodes, _) = parse_archive_with(file.path(), &options).unwrap();
  assert_eq!(nodes.get(0).unwrap().position.z, 3.0);
}

#[test]
fn test_parse_unstamped_results_and_matrices() {
  let hint = ReadOptions::default().with_version_hint(FormatVersion::V2);
  let b = FileBuilder::new(FormatVersion::V2, FileKind::Result).unstamped();
  let summary = vec![b.summary(ResultKind::Temperature, (1, 1), 1, 1000, 0.0)];
  let rows = vec![b.row(1, &[20.0]), b.row(2, &[25.0])];
  let file = temp_file(&b.section(20, summary).section(1000, rows).build());
  let requests = [ResultRequest::all(ResultKind::Temperature)];
  assert!(parse_results(file.path(), &requests).is_err());
  let res = parse_results_with(file.path(), &requests, &hint).unwrap();
  let temp = res.get(ResultKind::Temperature, LoadStep::new(1, 1)).unwrap();
  assert_eq!(temp.get(2, 0), Some(25.0));

  let b = FileBuilder::new(FormatVersion::V2, FileKind::Matrix).unstamped();
  let k = vec![b.matrix_header(2, false), b.run(0, 0, &[2.0, 1.0])];
  let m = vec![b.matrix_header(2, false), b.run(1, 1, &[3.0])];
  let file = temp_file(&b.section(30, k).section(31, m).build());
  assert!(parse_matrices(file.path()).is_err());
  assert_eq!(parse_matrix_with(file.path(), &hint).unwrap().nnz(), 2);
  let mass = parse_matrix_kind_with(file.path(), MatrixKind::Mass, &hint);
  assert_eq!(mass.unwrap().diagonal()[1], 3.0);
  let set = parse_matrices_with(file.path(), &hint).unwrap();
  assert_eq!(set.matrices.len(), 2);
}

#[test]
fn test_parse_matrices_from_path() {
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Matrix);
  let k = vec![b.matrix_header(2, true), b.run(0, 0, &[2.0, 1.0])];
  let m = vec![b.matrix_header(2, false), b.run(1, 1, &[3.0])];
  let file = temp_file(&b.section(30, k).section(31, m).build());
  assert_eq!(parse_matrix(file.path()).unwrap().nnz(), 2);
  let mass = parse_matrix_kind(file.path(), MatrixKind::Mass).unwrap();
  assert_eq!(mass.diagonal()[1], 3.0);
  assert!(matches!(
    parse_matrix_kind(file.path(), MatrixKind::Damping),
    Err(FebinError::MissingSection(_))
  ));
  let set = parse_matrices(file.path()).unwrap();
  assert_eq!(set.matrices.len(), 2);
  assert!(set.dof_map.is_none());
}

#[test]
fn test_cache_hits_and_invalidates() {
  let file = strip_file(FormatVersion::V1);
  let cache = ParseCache::new();
  let calls = AtomicUsize::new(0);
  let parse = |p: &std::path::Path| {
    calls.fetch_add(1, Ordering::SeqCst);
    return parse_archive(p);
  };
  let a = cache.get_or_parse(file.path(), parse).unwrap();
  let b = cache.clone().get_or_parse(file.path(), parse).unwrap();
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert!(std::sync::Arc::ptr_eq(&a, &b));
  assert_eq!(cache.len().unwrap(), 1);
  // rewrite the file with a different modification time
  let (nodes, elements) = strip();
  let bytes = archive(FormatVersion::V2, &nodes, &elements);
  let later = fs::metadata(file.path()).unwrap().modified().unwrap()
    + std::time::Duration::from_secs(5);
  fs::write(file.path(), bytes).unwrap();
  fs::File::options()
    .write(true)
    .open(file.path())
    .unwrap()
    .set_modified(later)
    .unwrap();
  let c = cache.get_or_parse(file.path(), parse).unwrap();
  assert_eq!(calls.load(Ordering::SeqCst), 2);
  assert_eq!(*a, *c);
  assert_eq!(cache.len().unwrap(), 1);
  cache.clear().unwrap();
  assert!(cache.is_empty().unwrap());
}

#[test]
fn test_cache_does_not_keep_failures() {
  let file = temp_file(b"not a binary solver file");
  let cache = ParseCache::new();
  let parse = |p: &std::path::Path| parse_archive(p);
  assert!(cache.get_or_parse(file.path(), parse).is_err());
  assert!(cache.is_empty().unwrap());
}
