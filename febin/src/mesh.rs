//! This module implements the mesh assembler. It merges node and element
//! tables with optional field results into a `Mesh`, checking that every
//! reference resolves, and builds the id-to-local-index lookups every
//! downstream consumer uses.

use std::collections::BTreeMap;

use log::debug;
use serde::{Serialize, Deserialize};

use crate::archive::check_references;
use crate::elements::ElementType;
use crate::error::{FebinError, Result};
use crate::fields::*;
use crate::geometry::Point;
use crate::results::{MeshResults, SolutionSummary};
use crate::tables::*;

/// Flat cell arrays in the layout unstructured-grid containers expect.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellArray {
  /// Start of each cell within `connectivity`, plus one final end offset.
  pub offsets: Vec<usize>,
  /// Local node indices of all cells, back to back.
  pub connectivity: Vec<usize>,
  /// VTK cell type of each cell.
  pub types: Vec<u8>
}

/// An assembled mesh. Only built through `assemble`, so every reference in it
/// is known to resolve.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mesh {
  /// The nodes.
  nodes: NodeTable,
  /// The elements.
  elements: ElementTable,
  /// Field results by kind and step.
  fields: BTreeMap<(ResultKind, LoadStep), FieldResult>,
  /// The summary of the result file, if there was one.
  summary: Option<SolutionSummary>,
  /// Node id to local index.
  node_index: BTreeMap<i32, usize>,
  /// Element id to local index.
  element_index: BTreeMap<i32, usize>,
  /// Start of each element within `connectivity`, plus the final end.
  offsets: Vec<usize>,
  /// Local node indices of all elements, back to back.
  connectivity: Vec<usize>
}

/// Builds an id to local index map, failing on the first repeated id.
fn index_ids<F>(
  ids: impl Iterator<Item = i32>,
  duplicate: F
) -> Result<BTreeMap<i32, usize>>
  where F: Fn(i32) -> FebinError {
  let mut index = BTreeMap::new();
  for (i, id) in ids.enumerate() {
    if index.insert(id, i).is_some() {
      return Err(duplicate(id));
    }
  }
  return Ok(index);
}

/// Assembles a mesh, cross-validating every element's node references and
/// every field result's ids against the matching table.
pub fn assemble(
  nodes: NodeTable,
  elements: ElementTable,
  results: Option<MeshResults>
) -> Result<Mesh> {
  let node_index = index_ids(nodes.ids(), FebinError::DuplicateNodeId)?;
  let element_index = index_ids(
    elements.ids(),
    FebinError::DuplicateElementId
  )?;
  let mut offsets = Vec::with_capacity(elements.len() + 1);
  let mut connectivity = Vec::new();
  offsets.push(0);
  for element in &elements {
    let expected = element.element_type.n_nodes();
    if element.nodes.len() != expected {
      return Err(FebinError::WrongNodeCount {
        element_id: element.id,
        expected,
        found: element.nodes.len()
      });
    }
    for node_id in &element.nodes {
      let local = node_index.get(node_id).ok_or(
        FebinError::DanglingNodeReference {
          element_id: element.id,
          node_id: *node_id
        }
      )?;
      connectivity.push(*local);
    }
    offsets.push(connectivity.len());
  }
  let (fields, summary) = match results {
    Some(r) => (r.fields, Some(r.summary)),
    None => (BTreeMap::new(), None)
  };
  for field in fields.values() {
    let domain = match field.location() {
      Location::Node => &node_index,
      Location::Element => &element_index,
    };
    if let Some(id) = field.ids().iter().find(|id| !domain.contains_key(id)) {
      return Err(FebinError::DanglingResultReference {
        kind: field.kind,
        id: *id
      });
    }
  }
  debug!(
    "Assembled mesh: {} nodes, {} elements, {} field results.",
    nodes.len(),
    elements.len(),
    fields.len()
  );
  return Ok(Mesh {
    nodes,
    elements,
    fields,
    summary,
    node_index,
    element_index,
    offsets,
    connectivity
  });
}

impl Mesh {
  /// Returns the node table.
  pub fn nodes(&self) -> &NodeTable {
    return &self.nodes;
  }

  /// Returns the element table.
  pub fn elements(&self) -> &ElementTable {
    return &self.elements;
  }

  /// Returns the number of nodes.
  pub fn n_nodes(&self) -> usize {
    return self.nodes.len();
  }

  /// Returns the number of elements.
  pub fn n_elements(&self) -> usize {
    return self.elements.len();
  }

  /// Returns the local index of a node id.
  pub fn node_index(&self, id: i32) -> Option<usize> {
    return self.node_index.get(&id).copied();
  }

  /// Returns the local index of an element id.
  pub fn element_index(&self, id: i32) -> Option<usize> {
    return self.element_index.get(&id).copied();
  }

  /// Returns the position of a node id.
  pub fn node_position(&self, id: i32) -> Option<&Point> {
    let i = self.node_index(id)?;
    return self.nodes.get(i).map(|n| &n.position);
  }

  /// Returns the local node indices of the element at a local index.
  pub fn element_nodes(&self, index: usize) -> &[usize] {
    return &self.connectivity[self.offsets[index]..self.offsets[index + 1]];
  }

  /// Returns the type of the element at a local index.
  pub fn element_type(&self, index: usize) -> ElementType {
    return self.elements.as_slice()[index].element_type;
  }

  /// Returns the node positions of the element at a local index, in element
  /// order.
  pub fn element_points(&self, index: usize) -> Vec<Point> {
    let nodes = self.nodes.as_slice();
    return self.element_nodes(index)
      .iter()
      .map(|&n| nodes[n].position)
      .collect();
  }

  /// Returns all field results.
  pub fn fields(&self) -> &BTreeMap<(ResultKind, LoadStep), FieldResult> {
    return &self.fields;
  }

  /// Returns one field result.
  pub fn field(
    &self,
    kind: ResultKind,
    step: LoadStep
  ) -> Option<&FieldResult> {
    return self.fields.get(&(kind, step));
  }

  /// Returns the summary of the result file the fields came from.
  pub fn summary(&self) -> Option<&SolutionSummary> {
    return self.summary.as_ref();
  }

  /// Iterates every element as its VTK cell type and local node indices.
  pub fn cells(&self) -> impl Iterator<Item = (u8, &[usize])> + '_ {
    return (0..self.n_elements()).map(|i| {
      (self.element_type(i).vtk_cell_type(), self.element_nodes(i))
    });
  }

  /// Returns the cells as flat arrays.
  pub fn cell_array(&self) -> CellArray {
    return CellArray {
      offsets: self.offsets.clone(),
      connectivity: self.connectivity.clone(),
      types: self.cells().map(|(t, _)| t).collect()
    };
  }

  /// Returns a field result as one row per node (or element) in local order,
  /// zero-filled where the result has no row. Handy for attaching point or
  /// cell data to a grid.
  pub fn field_by_local_index(
    &self,
    kind: ResultKind,
    step: LoadStep
  ) -> Option<Vec<Vec<f64>>> {
    let field = self.field(kind, step)?;
    let (n, index) = match field.location() {
      Location::Node => (self.n_nodes(), &self.node_index),
      Location::Element => (self.n_elements(), &self.element_index),
    };
    let mut rows = vec![vec![0.0; field.width()]; n];
    for (r, id) in field.ids().iter().enumerate() {
      // assembly checked every id
      let local = index[id];
      rows[local] = field.data().row(r).iter().copied().collect();
    }
    return Some(rows);
  }

  /// Rebuilds the mesh around a new node table, keeping the elements and
  /// results. The new table must still satisfy every reference.
  pub fn with_nodes(&self, nodes: NodeTable) -> Result<Mesh> {
    check_references(&nodes, &self.elements)?;
    let results = self.summary.clone().map(|summary| MeshResults {
      summary,
      fields: self.fields.clone()
    });
    return assemble(nodes, self.elements.clone(), results);
  }
}
