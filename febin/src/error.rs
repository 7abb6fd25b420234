//! This module defines the errors that can come up while decoding binary
//! solver files and assembling meshes out of them.
//!
//! Structural problems (bad framing, out-of-range indices, dangling
//! references) always abort the whole parse call. Advisory problems, like an
//! element whose quality can't be scored, never become errors.

use std::io;

use thiserror::Error;

use crate::decoder::SectionId;
use crate::fields::{LoadStep, ResultKind};
use crate::flavour::FileKind;

/// The error type for everything in this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FebinError {
  /// The file couldn't be read.
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
  /// The buffer is shorter than the header or pointer table says it is.
  #[error("truncated file: needed {needed} bytes, only {available} exist")]
  Truncated {
    /// How many bytes were needed.
    needed: u64,
    /// How many bytes there are.
    available: u64
  },
  /// The magic or version marker isn't one we know.
  #[error("unsupported format marker {0:#010x}")]
  UnsupportedVersion(u32),
  /// The header's file kind code isn't one we know.
  #[error("unknown file kind code {0}")]
  UnknownFileKind(u32),
  /// The caller asked for one kind of file but the header says another.
  #[error("expected {expected} file, header says {found}")]
  WrongFileKind {
    /// What the caller asked for.
    expected: FileKind,
    /// What the header says.
    found: FileKind
  },
  /// A record's framing or layout is broken.
  #[error("corrupt record in section {section} at byte {offset}: {reason}")]
  CorruptRecord {
    /// The section the record lives in.
    section: SectionId,
    /// Absolute byte offset of the record within the file.
    offset: u64,
    /// What exactly is wrong with it.
    reason: String
  },
  /// A section holds a different number of records than its pointer says.
  #[error("section {section} declares {declared} records but holds {found}")]
  RecordCountMismatch {
    /// The section.
    section: SectionId,
    /// The count in the pointer table.
    declared: u32,
    /// The count actually framed.
    found: u32
  },
  /// The pointer table has no entry for a section.
  #[error("missing section {0}")]
  MissingSection(SectionId),
  /// The pointer table lists a section more than once.
  #[error("section {0} appears twice in the pointer table")]
  DuplicateSection(SectionId),
  /// An element record has a type tag we don't know.
  #[error("element {element_id} has unknown element type tag {tag}")]
  UnknownElementType {
    /// The offending element.
    element_id: i32,
    /// Its type tag.
    tag: u32
  },
  /// An element lists a different number of nodes than its type has.
  #[error("element {element_id} lists {found} nodes, its type has {expected}")]
  WrongNodeCount {
    /// The offending element.
    element_id: i32,
    /// How many nodes its type has.
    expected: usize,
    /// How many it lists.
    found: usize
  },
  /// Two nodes share an id.
  #[error("duplicate node id {0}")]
  DuplicateNodeId(i32),
  /// Two elements share an id.
  #[error("duplicate element id {0}")]
  DuplicateElementId(i32),
  /// An element references a node that isn't in the node table.
  #[error("element {element_id} references missing node {node_id}")]
  DanglingNodeReference {
    /// The element holding the reference.
    element_id: i32,
    /// The node that doesn't exist.
    node_id: i32
  },
  /// A field result has a row for a node/element that doesn't exist.
  #[error("{kind} result references missing id {id}")]
  DanglingResultReference {
    /// The result kind.
    kind: ResultKind,
    /// The id that doesn't exist.
    id: i32
  },
  /// A field result has two rows for the same id.
  #[error("{kind} result has two rows for id {id}")]
  DuplicateResultId {
    /// The result kind.
    kind: ResultKind,
    /// The repeated id.
    id: i32
  },
  /// A field result's values don't fill whole rows.
  #[error("{kind} result needs {expected} values, got {found}")]
  RaggedResult {
    /// The result kind.
    kind: ResultKind,
    /// Rows times width.
    expected: usize,
    /// How many values there are.
    found: usize
  },
  /// A requested result kind/step isn't in the solution summary.
  #[error(
    "{kind} results not available{}",
    step.map(|s| format!(" for {}", s)).unwrap_or_default()
  )]
  ResultNotAvailable {
    /// The requested kind.
    kind: ResultKind,
    /// The requested step, if the kind exists at all.
    step: Option<LoadStep>
  },
  /// The summary references a result kind code we don't know.
  #[error("unknown result kind code {0}")]
  UnknownResultKind(u32),
  /// A matrix entry lies outside the declared dimension.
  #[error("matrix entry ({row}, {col}) outside dimension {dimension}")]
  IndexOutOfRange {
    /// Row of the entry.
    row: i64,
    /// Column of the entry.
    col: i64,
    /// Declared dimension.
    dimension: usize
  },
  /// A symmetric matrix stores an entry below the diagonal.
  #[error("symmetric matrix stores lower-triangle entry ({row}, {col})")]
  LowerTriangleEntry {
    /// Row of the entry.
    row: i64,
    /// Column of the entry.
    col: i64
  },
  /// A DOF map entry has a DOF number outside 1-6.
  #[error("equation {equation} has unknown DOF number {dof}")]
  UnknownDof {
    /// The equation index.
    equation: usize,
    /// The DOF number.
    dof: u32
  },
  /// A read went past the end of the buffer.
  #[error(
    "read of {requested} bytes at offset {offset} out of bounds \
    ({available} available)"
  )]
  OutOfBounds {
    /// Absolute offset of the attempted read.
    offset: u64,
    /// Bytes requested.
    requested: u64,
    /// Bytes left from the offset.
    available: u64
  },
  /// A cache lock was poisoned by a panic in another thread.
  #[error("cache lock poisoned")]
  LockPoisoned
}

/// Shorthand result type.
pub type Result<T> = std::result::Result<T, FebinError>;
