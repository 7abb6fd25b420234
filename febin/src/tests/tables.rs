//! Archive parser tests.

use crate::archive::read_archive;
use crate::decoder::Decoder;
use crate::elements::ElementType;
use crate::error::FebinError;
use crate::flavour::*;

use super::builder::*;

/// Opens a buffer with default options.
fn open(buf: &[u8]) -> Decoder<'_> {
  return Decoder::open(buf, &ReadOptions::default()).unwrap();
}

#[test]
fn test_read_strip() {
  let (nodes, elements) = strip();
  let buf = archive(FormatVersion::V1, &nodes, &elements);
  let (nt, et) = read_archive(&open(&buf)).unwrap();
  assert_eq!(nt.len(), 6);
  assert_eq!(et.len(), 4);
  assert_eq!(nt.ids().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
  let quad = et.get(0).unwrap();
  assert_eq!(quad.element_type, ElementType::Quad4);
  assert_eq!(quad.nodes, vec![1, 2, 3, 4]);
  assert_eq!(quad.material, 1);
  assert_eq!(nt.get(2).unwrap().position.y, 1.0);
  assert!(nt.get(0).unwrap().rotation.is_none());
}

#[test]
fn test_both_byte_orders_agree() {
  let (nodes, elements) = strip();
  let le = archive(FormatVersion::V1, &nodes, &elements);
  let be = archive(FormatVersion::V2, &nodes, &elements);
  assert_ne!(le, be);
  let a = read_archive(&open(&le)).unwrap();
  let b = read_archive(&open(&be)).unwrap();
  assert_eq!(a, b);
}

#[test]
fn test_empty_sections() {
  let buf = archive(FormatVersion::V2, &vec![], &vec![]);
  let (nt, et) = read_archive(&open(&buf)).unwrap();
  assert!(nt.is_empty());
  assert!(et.is_empty());
}

#[test]
fn test_missing_element_section() {
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Archive);
  let node = b.node(1, [0.0; 3]);
  let buf = b.section(10, vec![node]).build();
  assert!(matches!(
    read_archive(&open(&buf)),
    Err(FebinError::MissingSection(_))
  ));
}

#[test]
fn test_rotated_nodes() {
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Archive);
  let rotated = b.w()
    .i32(7)
    .f64(1.0).f64(2.0).f64(3.0)
    .f64(0.0).f64(90.0).f64(0.0)
    .finish();
  let buf = b.section(10, vec![rotated]).section(11, vec![]).build();
  let (nt, _) = read_archive(&open(&buf)).unwrap();
  let node = nt.get(0).unwrap();
  assert_eq!(node.id, 7);
  assert_eq!(node.rotation.unwrap().y, 90.0);
}

#[test]
fn test_bad_node_width() {
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Archive);
  let short = b.w().i32(1).f64(0.0).f64(0.0).finish();
  let buf = b.section(10, vec![short]).section(11, vec![]).build();
  assert!(matches!(
    read_archive(&open(&buf)),
    Err(FebinError::CorruptRecord { .. })
  ));
}

#[test]
fn test_unknown_element_type() {
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Archive);
  let node = b.node(1, [0.0; 3]);
  let element = b.element_tag(42, 99, &[1]);
  let buf = b.section(10, vec![node]).section(11, vec![element]).build();
  assert!(matches!(
    read_archive(&open(&buf)),
    Err(FebinError::UnknownElementType { element_id: 42, tag: 99 })
  ));
}

#[test]
fn test_element_node_count_must_match() {
  let b = FileBuilder::new(FormatVersion::V1, FileKind::Archive);
  let nodes = (1..=3).map(|i| b.node(i, [i as f64, 0.0, 0.0])).collect();
  // a QUAD4 with three nodes
  let element = b.element(1, ElementType::Quad4, &[1, 2, 3]);
  let buf = b.section(10, nodes).section(11, vec![element]).build();
  assert!(matches!(
    read_archive(&open(&buf)),
    Err(FebinError::CorruptRecord { .. })
  ));
}

#[test]
fn test_duplicate_ids() {
  let nodes = vec![(1, [0.0; 3]), (1, [1.0, 0.0, 0.0])];
  let buf = archive(FormatVersion::V1, &nodes, &vec![]);
  assert!(matches!(
    read_archive(&open(&buf)),
    Err(FebinError::DuplicateNodeId(1))
  ));
  let nodes = vec![(1, [0.0; 3]), (2, [1.0, 0.0, 0.0])];
  let elements = vec![
    (5, ElementType::Line2, vec![1, 2]),
    (5, ElementType::Line2, vec![2, 1]),
  ];
  let buf = archive(FormatVersion::V1, &nodes, &elements);
  assert!(matches!(
    read_archive(&open(&buf)),
    Err(FebinError::DuplicateElementId(5))
  ));
}

#[test]
fn test_dangling_node_reference() {
  let nodes = (1..=500).map(|i| (i, [i as f64, 0.0, 0.0])).collect();
  let elements = vec![
    (1, ElementType::Line2, vec![1, 2]),
    (2, ElementType::Line2, vec![499, 999]),
  ];
  let buf = archive(FormatVersion::V2, &nodes, &elements);
  assert!(matches!(
    read_archive(&open(&buf)),
    Err(FebinError::DanglingNodeReference { element_id: 2, node_id: 999 })
  ));
}

#[test]
fn test_wrong_kind() {
  let buf = FileBuilder::new(FormatVersion::V1, FileKind::Matrix).build();
  assert!(matches!(
    read_archive(&open(&buf)),
    Err(FebinError::WrongFileKind { expected: FileKind::Archive, .. })
  ));
}
