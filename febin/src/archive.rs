//! This module implements the archive parser: it decodes the node and element
//! sections of an archive file into raw tables.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use nalgebra::Vector3;

use crate::decoder::*;
use crate::elements::ElementType;
use crate::error::{FebinError, Result};
use crate::flavour::FileKind;
use crate::geometry::Point;
use crate::tables::*;

/// Payload size of a node record without rotations.
pub const NODE_RECORD_BYTES: usize = 4 + 3 * 8;

/// Payload size of a node record with rotations.
pub const ROTATED_NODE_RECORD_BYTES: usize = NODE_RECORD_BYTES + 3 * 8;

/// Size of the fixed part of an element record.
pub const ELEMENT_HEADER_BYTES: usize = 5 * 4;

/// Decodes a node section.
pub(crate) struct NodeDecoder {
  /// The nodes so far.
  table: NodeTable,
  /// Ids seen so far, with their record offsets.
  seen: BTreeMap<i32, u64>
}

impl NodeDecoder {
  /// Creates a decoder with room for `n` nodes.
  pub(crate) fn new(n: usize) -> Self {
    return Self { table: NodeTable::with_capacity(n), seen: BTreeMap::new() };
  }
}

impl SectionDecoder for NodeDecoder {
  type Output = NodeTable;

  fn consume(&mut self, record: Record<'_>) -> Result<()> {
    let rotated = match record.len() {
      NODE_RECORD_BYTES => false,
      ROTATED_NODE_RECORD_BYTES => true,
      n => return Err(record.corrupt(format!(
        "node records are {} or {} bytes, found {}",
        NODE_RECORD_BYTES,
        ROTATED_NODE_RECORD_BYTES,
        n
      )))
    };
    let mut cur = record.cursor();
    let id = cur.read_i32()?;
    let position = Point::new(
      cur.read_f64()?,
      cur.read_f64()?,
      cur.read_f64()?
    );
    let rotation = if rotated {
      Some(Vector3::new(cur.read_f64()?, cur.read_f64()?, cur.read_f64()?))
    } else {
      None
    };
    if let Some(first) = self.seen.insert(id, record.offset()) {
      debug!(
        "Node {} defined at byte {} and again at byte {}.",
        id,
        first,
        record.offset()
      );
      return Err(FebinError::DuplicateNodeId(id));
    }
    self.table.push(Node { id, position, rotation });
    return Ok(());
  }

  fn finalise(self) -> Result<Self::Output> {
    return Ok(self.table);
  }
}

/// Decodes an element section.
pub(crate) struct ElementDecoder {
  /// The elements so far.
  table: ElementTable,
  /// Ids seen so far.
  seen: BTreeMap<i32, u64>
}

impl ElementDecoder {
  /// Creates a decoder with room for `n` elements.
  pub(crate) fn new(n: usize) -> Self {
    return Self {
      table: ElementTable::with_capacity(n),
      seen: BTreeMap::new()
    };
  }
}

impl SectionDecoder for ElementDecoder {
  type Output = ElementTable;

  fn consume(&mut self, record: Record<'_>) -> Result<()> {
    if record.len() < ELEMENT_HEADER_BYTES {
      return Err(record.corrupt(format!(
        "element record of {} bytes is shorter than its header",
        record.len()
      )));
    }
    let mut cur = record.cursor();
    let id = cur.read_i32()?;
    // the node count hangs off the type, so an unknown type means we can't
    // even tell where the record ends
    let element_type = ElementType::from_tag(cur.read_u32()?, id)?;
    let material = cur.read_i32()?;
    let real_constant = cur.read_i32()?;
    let section = cur.read_i32()?;
    record.expect_len(ELEMENT_HEADER_BYTES + 4 * element_type.n_nodes())?;
    let nodes = (0..element_type.n_nodes())
      .map(|_| cur.read_i32())
      .collect::<Result<Vec<_>>>()?;
    if self.seen.insert(id, record.offset()).is_some() {
      return Err(FebinError::DuplicateElementId(id));
    }
    self.table.push(Element {
      id,
      element_type,
      nodes,
      material,
      real_constant,
      section
    });
    return Ok(());
  }

  fn finalise(self) -> Result<Self::Output> {
    return Ok(self.table);
  }
}

/// Fails on the first element node reference missing from the node table.
pub(crate) fn check_references(
  nodes: &NodeTable,
  elements: &ElementTable
) -> Result<()> {
  let known = nodes.ids().collect::<BTreeSet<_>>();
  for element in elements {
    if let Some(missing) = element.nodes.iter().copied()
      .find(|n| !known.contains(n)) {
      return Err(FebinError::DanglingNodeReference {
        element_id: element.id,
        node_id: missing
      });
    }
  }
  return Ok(());
}

/// Decodes the node and element tables of an open archive. Both sections
/// must be present, though either may be empty.
pub fn read_archive(
  decoder: &Decoder<'_>
) -> Result<(NodeTable, ElementTable)> {
  decoder.expect_kind(FileKind::Archive)?;
  let section = decoder.section(SectionId::Nodes)?;
  let n = section.capacity_hint(NODE_RECORD_BYTES);
  let nodes = decode_section(NodeDecoder::new(n), section)?;
  debug!("Decoded {} nodes.", nodes.len());
  let section = decoder.section(SectionId::Elements)?;
  let n = section.capacity_hint(ELEMENT_HEADER_BYTES);
  let elements = decode_section(ElementDecoder::new(n), section)?;
  debug!("Decoded {} elements.", elements.len());
  check_references(&nodes, &elements)?;
  info!(
    "Read archive with {} nodes and {} elements.",
    nodes.len(),
    elements.len()
  );
  return Ok((nodes, elements));
}
