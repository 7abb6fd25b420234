//! This module defines the raw node and element tables an archive decodes
//! into. Tables keep file order, which defines the local index of every node
//! and element.

use serde::{Serialize, Deserialize};
use nalgebra::Vector3;

use crate::elements::ElementType;
use crate::geometry::Point;

/// A node definition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Node {
  /// The node id.
  pub id: i32,
  /// The node position.
  pub position: Point,
  /// Nodal coordinate system rotations (XY, YZ, ZX) in degrees, if stored.
  pub rotation: Option<Vector3<f64>>
}

impl Node {
  /// Creates a node with no rotation.
  pub fn new(id: i32, x: f64, y: f64, z: f64) -> Self {
    return Self { id, position: Point::new(x, y, z), rotation: None };
  }
}

/// An element definition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Element {
  /// The element id.
  pub id: i32,
  /// The element type.
  pub element_type: ElementType,
  /// Node ids in element order.
  pub nodes: Vec<i32>,
  /// Material id.
  pub material: i32,
  /// Real constant set id.
  pub real_constant: i32,
  /// Section id.
  pub section: i32
}

impl Element {
  /// Creates an element with all attribute ids set to 1.
  pub fn new(id: i32, element_type: ElementType, nodes: Vec<i32>) -> Self {
    return Self {
      id,
      element_type,
      nodes,
      material: 1,
      real_constant: 1,
      section: 1
    };
  }

  /// Returns the corner node ids.
  pub fn corners(&self) -> &[i32] {
    return &self.nodes[..self.element_type.n_corners()];
  }
}

/// Generates a simple ordered table type around a vector.
macro_rules! gen_table {
  ($desc:literal, $tname:ident, $item:ty) => {
    #[doc = $desc]
    #[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
    pub struct $tname {
      /// The rows, in file order.
      rows: Vec<$item>
    }

    impl $tname {
      /// Creates an empty table.
      pub fn new() -> Self {
        return Self::default();
      }

      /// Creates an empty table with room for some rows.
      pub fn with_capacity(n: usize) -> Self {
        return Self { rows: Vec::with_capacity(n) };
      }

      /// Appends a row.
      pub fn push(&mut self, row: $item) {
        self.rows.push(row);
      }

      /// Returns the number of rows.
      pub fn len(&self) -> usize {
        return self.rows.len();
      }

      /// Checks whether the table is empty.
      pub fn is_empty(&self) -> bool {
        return self.rows.is_empty();
      }

      /// Returns the row at a local index.
      pub fn get(&self, index: usize) -> Option<&$item> {
        return self.rows.get(index);
      }

      /// Iterates the rows in order.
      pub fn iter(&self) -> std::slice::Iter<'_, $item> {
        return self.rows.iter();
      }

      /// Returns the rows as a slice.
      pub fn as_slice(&self) -> &[$item] {
        return &self.rows;
      }

      /// Returns the ids in order.
      pub fn ids(&self) -> impl Iterator<Item = i32> + '_ {
        return self.rows.iter().map(|r| r.id);
      }
    }

    impl From<Vec<$item>> for $tname {
      fn from(rows: Vec<$item>) -> Self {
        return Self { rows };
      }
    }

    impl FromIterator<$item> for $tname {
      fn from_iter<I: IntoIterator<Item = $item>>(iter: I) -> Self {
        return Self { rows: iter.into_iter().collect() };
      }
    }

    impl<'t> IntoIterator for &'t $tname {
      type Item = &'t $item;
      type IntoIter = std::slice::Iter<'t, $item>;

      fn into_iter(self) -> Self::IntoIter {
        return self.rows.iter();
      }
    }
  };
}

gen_table!("An ordered table of nodes.", NodeTable, Node);
gen_table!("An ordered table of elements.", ElementTable, Element);

impl NodeTable {
  /// Moves a node. Only post-processors call this, on their own copy.
  pub(crate) fn set_position(&mut self, index: usize, position: Point) {
    self.rows[index].position = position;
  }
}
