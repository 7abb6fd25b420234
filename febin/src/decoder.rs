//! This module implements the record/pointer-table decoder.
//!
//! Every file starts with a fixed header followed by a pointer table that
//! tells where each section lives. Sections hold length-prefixed records. The
//! decoder reads the header once, keeps the pointer table as an explicit map,
//! and hands out independent cursors over single sections so the archive,
//! result and matrix parsers (and parallel workers) can share it.

use std::collections::BTreeMap;
use std::fmt::Display;

use log::{debug, trace};
use serde::{Serialize, Deserialize};

use crate::cursor::Cursor;
use crate::error::{FebinError, Result};
use crate::flavour::{Endianness, FileKind, FormatVersion, ReadOptions};

/// The first four bytes of every file.
pub const MAGIC: [u8; 4] = *b"FEBF";

/// Size of the fixed part of the header.
pub const HEADER_BYTES: usize = 16;

/// Size of one pointer table entry.
pub const POINTER_ENTRY_BYTES: usize = 24;

/// Section ids at or above this hold result data.
pub const FIRST_RESULT_SECTION: u32 = 1000;

/// Logical section identifiers.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
  Hash
)]
pub enum SectionId {
  /// Node coordinates.
  Nodes,
  /// Element definitions.
  Elements,
  /// The solution summary of a result file.
  Summary,
  /// Stiffness matrix.
  Stiffness,
  /// Mass matrix.
  Mass,
  /// Damping matrix.
  Damping,
  /// Equation to (node, DOF) map of a matrix file.
  DofMap,
  /// A result data section.
  Result(u32),
  /// Something we don't read.
  Other(u32)
}

impl SectionId {
  /// Returns the on-disk code.
  pub const fn code(&self) -> u32 {
    return match self {
      Self::Nodes => 10,
      Self::Elements => 11,
      Self::Summary => 20,
      Self::Stiffness => 30,
      Self::Mass => 31,
      Self::Damping => 32,
      Self::DofMap => 33,
      Self::Result(x) | Self::Other(x) => *x,
    };
  }
}

impl From<u32> for SectionId {
  fn from(code: u32) -> Self {
    return match code {
      10 => Self::Nodes,
      11 => Self::Elements,
      20 => Self::Summary,
      30 => Self::Stiffness,
      31 => Self::Mass,
      32 => Self::Damping,
      33 => Self::DofMap,
      x if x >= FIRST_RESULT_SECTION => Self::Result(x),
      x => Self::Other(x)
    };
  }
}

impl Display for SectionId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::Result(x) => write!(f, "RESULT#{}", x),
      Self::Other(x) => write!(f, "#{}", x),
      _ => write!(f, "{:?}", self)
    };
  }
}

/// Where a section lives.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointerEntry {
  /// Absolute byte offset.
  pub offset: u64,
  /// Length in bytes.
  pub length: u64,
  /// Number of records within.
  pub records: u32
}

/// An open file: its flavour and pointer table over the borrowed bytes.
#[derive(Clone, Debug)]
pub struct Decoder<'b> {
  /// The whole file.
  buf: &'b [u8],
  /// Detected format version.
  version: FormatVersion,
  /// What the header says the file holds.
  kind: FileKind,
  /// The pointer table.
  pointers: BTreeMap<SectionId, PointerEntry>
}

impl<'b> Decoder<'b> {
  /// Reads the header and pointer table. Every pointer is checked against
  /// the buffer here, so later section lookups can't run off the end.
  pub fn open(buf: &'b [u8], options: &ReadOptions) -> Result<Self> {
    if buf.len() < HEADER_BYTES {
      return Err(FebinError::Truncated {
        needed: HEADER_BYTES as u64,
        available: buf.len() as u64
      });
    }
    let mut head = Cursor::new(buf, Endianness::Little);
    let magic = head.read_bytes(MAGIC.len())?;
    if magic != &MAGIC[..] {
      let mut raw = [0u8; 4];
      raw.copy_from_slice(magic);
      return Err(FebinError::UnsupportedVersion(u32::from_be_bytes(raw)));
    }
    let version = FormatVersion::detect(
      head.read_bytes(4)?,
      options.version_hint
    )?;
    let mut cursor = Cursor::new(buf, version.endianness());
    cursor.seek(8)?;
    let kind = FileKind::try_from(cursor.read_u32()?)?;
    let count = cursor.read_u32()? as u64;
    let table_end = HEADER_BYTES as u64 + count * POINTER_ENTRY_BYTES as u64;
    if table_end > buf.len() as u64 {
      return Err(FebinError::Truncated {
        needed: table_end,
        available: buf.len() as u64
      });
    }
    let mut pointers = BTreeMap::new();
    for _ in 0..count {
      let id = SectionId::from(cursor.read_u32()?);
      let entry = PointerEntry {
        offset: cursor.read_u64()?,
        length: cursor.read_u64()?,
        records: cursor.read_u32()?
      };
      let end = entry.offset.checked_add(entry.length).unwrap_or(u64::MAX);
      if end > buf.len() as u64 {
        return Err(FebinError::Truncated {
          needed: end,
          available: buf.len() as u64
        });
      }
      if let SectionId::Other(code) = id {
        debug!("Ignoring unknown section code {}.", code);
      }
      if pointers.insert(id, entry).is_some() {
        return Err(FebinError::DuplicateSection(id));
      }
      trace!(
        "Section {} at {}+{} with {} records.",
        id,
        entry.offset,
        entry.length,
        entry.records
      );
    }
    debug!(
      "Opened {} {} file with {} sections.",
      version,
      kind,
      pointers.len()
    );
    return Ok(Self { buf, version, kind, pointers });
  }

  /// Returns the detected format version.
  pub fn version(&self) -> FormatVersion {
    return self.version;
  }

  /// Returns the file kind stored in the header.
  pub fn kind(&self) -> FileKind {
    return self.kind;
  }

  /// Fails unless the file is of the expected kind.
  pub fn expect_kind(&self, expected: FileKind) -> Result<()> {
    if self.kind != expected {
      return Err(FebinError::WrongFileKind { expected, found: self.kind });
    }
    return Ok(());
  }

  /// Checks whether a section is present.
  pub fn has_section(&self, id: SectionId) -> bool {
    return self.pointers.contains_key(&id);
  }

  /// Returns the ids of all sections present, sorted.
  pub fn section_ids(&self) -> impl Iterator<Item = SectionId> + '_ {
    return self.pointers.keys().copied();
  }

  /// Returns the pointer entry for a section.
  pub fn pointer(&self, id: SectionId) -> Option<PointerEntry> {
    return self.pointers.get(&id).copied();
  }

  /// Returns a fresh cursor over one section.
  pub fn section(&self, id: SectionId) -> Result<SectionCursor<'b>> {
    let entry = self.pointer(id).ok_or(FebinError::MissingSection(id))?;
    // pointers were bounds-checked at open time
    let start = entry.offset as usize;
    let bytes = &self.buf[start..start + entry.length as usize];
    return Ok(SectionCursor {
      id,
      declared: entry.records,
      seen: 0,
      failed: false,
      cursor: Cursor::with_base(bytes, self.version.endianness(), entry.offset)
    });
  }
}

/// One length-framed record.
#[derive(Clone, Debug)]
pub struct Record<'b> {
  /// The section it was read from.
  section: SectionId,
  /// Absolute offset of its length prefix.
  offset: u64,
  /// The payload.
  payload: &'b [u8],
  /// Byte order of the file.
  endianness: Endianness
}

impl<'b> Record<'b> {
  /// Returns the payload length in bytes.
  pub fn len(&self) -> usize {
    return self.payload.len();
  }

  /// Checks whether the payload is empty.
  pub fn is_empty(&self) -> bool {
    return self.payload.is_empty();
  }

  /// Returns the raw payload.
  pub fn payload(&self) -> &'b [u8] {
    return self.payload;
  }

  /// Returns the absolute offset of the record.
  pub fn offset(&self) -> u64 {
    return self.offset;
  }

  /// Returns the section the record belongs to.
  pub fn section(&self) -> SectionId {
    return self.section;
  }

  /// Returns a cursor confined to the payload.
  pub fn cursor(&self) -> Cursor<'b> {
    return Cursor::with_base(self.payload, self.endianness, self.offset + 4);
  }

  /// Builds a `CorruptRecord` error pointing at this record.
  pub fn corrupt<S: Into<String>>(&self, reason: S) -> FebinError {
    return FebinError::CorruptRecord {
      section: self.section,
      offset: self.offset,
      reason: reason.into()
    };
  }

  /// Fails unless the payload is exactly `expected` bytes long.
  pub fn expect_len(&self, expected: usize) -> Result<()> {
    if self.len() != expected {
      return Err(self.corrupt(format!(
        "expected {} payload bytes, found {}",
        expected,
        self.len()
      )));
    }
    return Ok(());
  }
}

/// Iterates the records of one section. Records can never reach past the
/// section's end.
#[derive(Clone, Debug)]
pub struct SectionCursor<'b> {
  /// Which section this is.
  id: SectionId,
  /// Record count from the pointer table.
  declared: u32,
  /// Records framed so far.
  seen: u32,
  /// Set once a framing error was returned.
  failed: bool,
  /// Cursor over the section bytes.
  cursor: Cursor<'b>
}

impl<'b> SectionCursor<'b> {
  /// Returns the section id.
  pub fn id(&self) -> SectionId {
    return self.id;
  }

  /// Returns the record count the pointer table declares.
  pub fn declared_records(&self) -> u32 {
    return self.declared;
  }

  /// Returns a preallocation size for records of at least `min_payload`
  /// bytes, never more than the section could actually hold.
  pub fn capacity_hint(&self, min_payload: usize) -> usize {
    let fit = self.cursor.remaining() / (4 + min_payload);
    return fit.min(self.declared as usize);
  }

  /// Frames the next record. `Ok(None)` means the section is exhausted.
  pub fn next_record(&mut self) -> Result<Option<Record<'b>>> {
    if self.cursor.remaining() == 0 {
      return Ok(None);
    }
    let start = self.cursor.position();
    let offset = self.cursor.offset();
    let section = self.id;
    let corrupt = |reason: String| FebinError::CorruptRecord {
      section,
      offset,
      reason
    };
    let declared = match self.cursor.read_u32() {
      Ok(n) => n as usize,
      Err(_) => return Err(corrupt(format!(
        "length prefix cut short, only {} bytes left",
        self.cursor.remaining()
      )))
    };
    if declared > self.cursor.remaining() {
      let available = self.cursor.remaining();
      self.cursor.seek(start)?;
      return Err(corrupt(format!(
        "declares {} bytes but the section has {} left",
        declared,
        available
      )));
    }
    let payload = self.cursor.read_bytes(declared)?;
    self.seen += 1;
    return Ok(Some(Record {
      section: self.id,
      offset,
      payload,
      endianness: self.cursor.endianness()
    }));
  }

  /// Checks that the section held exactly as many records as declared. Call
  /// this once the section is exhausted.
  pub fn finish(&self) -> Result<()> {
    if self.seen != self.declared {
      return Err(FebinError::RecordCountMismatch {
        section: self.id,
        declared: self.declared,
        found: self.seen
      });
    }
    return Ok(());
  }
}

impl<'b> Iterator for SectionCursor<'b> {
  type Item = Result<Record<'b>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.failed {
      return None;
    }
    let item = self.next_record().transpose();
    if matches!(item, Some(Err(_))) {
      self.failed = true;
    }
    return item;
  }
}

/// All section decoders implement this. Records are fed in order, then the
/// decoder is finalised into its output.
pub(crate) trait SectionDecoder {
  /// What the decoder produces.
  type Output;

  /// Consumes one record.
  fn consume(&mut self, record: Record<'_>) -> Result<()>;

  /// Turns the decoder into its output once the section is over.
  fn finalise(self) -> Result<Self::Output>;
}

/// Streams a whole section through a decoder.
pub(crate) fn decode_section<D: SectionDecoder>(
  mut decoder: D,
  mut section: SectionCursor<'_>
) -> Result<D::Output> {
  while let Some(record) = section.next_record()? {
    decoder.consume(record)?;
  }
  section.finish()?;
  return decoder.finalise();
}
