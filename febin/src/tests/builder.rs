//! Builds binary files in memory for the tests.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::decoder::{HEADER_BYTES, MAGIC, POINTER_ENTRY_BYTES};
use crate::elements::ElementType;
use crate::fields::ResultKind;
use crate::flavour::{Endianness, FileKind, FormatVersion};

/// Generates the typed write methods.
macro_rules! gen_writes {
  ($(($fname:ident, $wname:ident, $ty:ty),)*) => {
    $(
      pub(crate) fn $fname(mut self, x: $ty) -> Self {
        let written = match self.endianness {
          Endianness::Little => self.buf.$wname::<LittleEndian>(x),
          Endianness::Big => self.buf.$wname::<BigEndian>(x),
        };
        written.unwrap();
        return self;
      }
    )*
  };
}

/// Writes a record payload.
pub(crate) struct Writer {
  endianness: Endianness,
  buf: Vec<u8>
}

impl Writer {
  pub(crate) fn new(endianness: Endianness) -> Self {
    return Self { endianness, buf: Vec::new() };
  }

  gen_writes!(
    (i32, write_i32, i32),
    (u32, write_u32, u32),
    (u64, write_u64, u64),
    (f64, write_f64, f64),
  );

  pub(crate) fn bytes(mut self, b: &[u8]) -> Self {
    self.buf.extend_from_slice(b);
    return self;
  }

  pub(crate) fn finish(self) -> Vec<u8> {
    return self.buf;
  }
}

/// One section to be written.
struct SectionSpec {
  id: u32,
  bytes: Vec<u8>,
  records: u32
}

/// Builds a whole file: header, pointer table, sections.
pub(crate) struct FileBuilder {
  version: FormatVersion,
  stamped: bool,
  kind: u32,
  sections: Vec<SectionSpec>
}

impl FileBuilder {
  pub(crate) fn new(version: FormatVersion, kind: FileKind) -> Self {
    return Self {
      version,
      stamped: true,
      kind: kind.code(),
      sections: Vec::new()
    };
  }

  pub(crate) fn endianness(&self) -> Endianness {
    return self.version.endianness();
  }

  pub(crate) fn w(&self) -> Writer {
    return Writer::new(self.endianness());
  }

  /// Leaves the version word zeroed.
  pub(crate) fn unstamped(mut self) -> Self {
    self.stamped = false;
    return self;
  }

  /// Overrides the file kind code.
  pub(crate) fn kind_code(mut self, code: u32) -> Self {
    self.kind = code;
    return self;
  }

  /// Adds a section of framed records, declaring the real record count.
  pub(crate) fn section(self, id: u32, records: Vec<Vec<u8>>) -> Self {
    let n = records.len() as u32;
    return self.section_declaring(id, records, n);
  }

  /// Adds a section of framed records, declaring any record count.
  pub(crate) fn section_declaring(
    self,
    id: u32,
    records: Vec<Vec<u8>>,
    declared: u32
  ) -> Self {
    let mut bytes = Vec::new();
    for r in records {
      let prefix = self.w().u32(r.len() as u32).finish();
      bytes.extend(prefix);
      bytes.extend(r);
    }
    return self.raw_section(id, bytes, declared);
  }

  /// Adds a section of arbitrary bytes.
  pub(crate) fn raw_section(
    mut self,
    id: u32,
    bytes: Vec<u8>,
    records: u32
  ) -> Self {
    self.sections.push(SectionSpec { id, bytes, records });
    return self;
  }

  pub(crate) fn build(self) -> Vec<u8> {
    let word = if self.stamped { self.version.stamp() } else { [0; 4] };
    let mut out = self.w()
      .bytes(&MAGIC)
      .bytes(&word)
      .u32(self.kind)
      .u32(self.sections.len() as u32)
      .finish();
    let mut offset = (HEADER_BYTES
      + self.sections.len() * POINTER_ENTRY_BYTES) as u64;
    for s in &self.sections {
      out.extend(
        self.w()
          .u32(s.id)
          .u64(offset)
          .u64(s.bytes.len() as u64)
          .u32(s.records)
          .finish()
      );
      offset += s.bytes.len() as u64;
    }
    for s in &self.sections {
      out.extend_from_slice(&s.bytes);
    }
    return out;
  }

  /// A node record.
  pub(crate) fn node(&self, id: i32, p: [f64; 3]) -> Vec<u8> {
    return self.w().i32(id).f64(p[0]).f64(p[1]).f64(p[2]).finish();
  }

  /// An element record with attribute ids of 1.
  pub(crate) fn element(
    &self,
    id: i32,
    element_type: ElementType,
    nodes: &[i32]
  ) -> Vec<u8> {
    return self.element_tag(id, element_type.tag(), nodes);
  }

  /// An element record with a raw type tag.
  pub(crate) fn element_tag(
    &self,
    id: i32,
    tag: u32,
    nodes: &[i32]
  ) -> Vec<u8> {
    let mut w = self.w().i32(id).u32(tag).i32(1).i32(1).i32(1);
    for n in nodes {
      w = w.i32(*n);
    }
    return w.finish();
  }

  /// A summary record.
  pub(crate) fn summary(
    &self,
    kind: ResultKind,
    step: (u32, u32),
    width: u32,
    section: u32,
    time: f64
  ) -> Vec<u8> {
    return self.w()
      .u32(kind.code())
      .u32(step.0)
      .u32(step.1)
      .u32(width)
      .u32(section)
      .f64(time)
      .finish();
  }

  /// A result row.
  pub(crate) fn row(&self, id: i32, values: &[f64]) -> Vec<u8> {
    let mut w = self.w().i32(id);
    for v in values {
      w = w.f64(*v);
    }
    return w.finish();
  }

  /// A matrix header record.
  pub(crate) fn matrix_header(
    &self,
    dimension: u32,
    symmetric: bool
  ) -> Vec<u8> {
    return self.w().u32(dimension).u32(symmetric as u32).finish();
  }

  /// A matrix run record.
  pub(crate) fn run(&self, row: i32, first: i32, values: &[f64]) -> Vec<u8> {
    let mut w = self.w().i32(row).i32(first).u32(values.len() as u32);
    for v in values {
      w = w.f64(*v);
    }
    return w.finish();
  }

  /// A DOF map record.
  pub(crate) fn dof(&self, node: i32, dof: u32) -> Vec<u8> {
    return self.w().i32(node).u32(dof).finish();
  }
}

/// Node definitions, as written to an archive.
pub(crate) type NodeDefs = Vec<(i32, [f64; 3])>;

/// Element definitions, as written to an archive.
pub(crate) type ElementDefs = Vec<(i32, ElementType, Vec<i32>)>;

/// Builds an archive file.
pub(crate) fn archive(
  version: FormatVersion,
  nodes: &NodeDefs,
  elements: &ElementDefs
) -> Vec<u8> {
  let b = FileBuilder::new(version, FileKind::Archive);
  let nodes = nodes.iter().map(|(id, p)| b.node(*id, *p)).collect();
  let elements = elements.iter()
    .map(|(id, t, n)| b.element(*id, *t, n))
    .collect();
  return b.section(10, nodes).section(11, elements).build();
}

/// Six nodes, two triangles and two quads sharing them. Every element is a
/// perfect shape of its type.
pub(crate) fn strip() -> (NodeDefs, ElementDefs) {
  let h = 3f64.sqrt() / 2.0;
  let nodes = vec![
    (1, [0.0, 0.0, 0.0]),
    (2, [1.0, 0.0, 0.0]),
    (3, [1.0, 1.0, 0.0]),
    (4, [0.0, 1.0, 0.0]),
    (5, [2.0, 0.0, 0.0]),
    (6, [1.5, -h, 0.0]),
  ];
  let elements = vec![
    (1, ElementType::Quad4, vec![1, 2, 3, 4]),
    (2, ElementType::Tri3, vec![2, 6, 5]),
    (3, ElementType::Quad4, vec![4, 3, 2, 1]),
    (4, ElementType::Tri3, vec![5, 6, 2]),
  ];
  return (nodes, elements);
}
