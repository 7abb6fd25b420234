//! This module implements midside node relaxation: the midside nodes of
//! quadratic elements are pulled toward the midpoint of the edge they sit on.
//! Corner nodes never move, so a relaxed mesh relaxes to itself.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Serialize, Deserialize};

use crate::geometry::midpoint;
use crate::mesh::Mesh;
use crate::tables::NodeTable;

/// Options for midside relaxation.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RelaxOptions {
  /// How far along the way to the edge midpoint each node moves, from 0.0
  /// (not at all) to 1.0 (all the way). Values outside are clamped.
  pub factor: f64
}

impl Default for RelaxOptions {
  fn default() -> Self {
    return Self { factor: 1.0 };
  }
}

impl RelaxOptions {
  /// Sets the relaxation factor.
  pub fn with_factor(self, factor: f64) -> Self {
    return Self { factor };
  }
}

/// The outcome of a relaxation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Relaxation {
  /// The new node table, in the original order.
  pub nodes: NodeTable,
  /// How many midside nodes moved.
  pub moved: usize,
  /// Ids of the elements left alone.
  pub skipped: Vec<i32>
}

/// Returns why a quadratic element can't be relaxed, if it can't.
fn reject_reason(
  mesh: &Mesh,
  index: usize,
  corners: &BTreeSet<usize>
) -> Option<String> {
  let element_type = mesh.element_type(index);
  let nodes = mesh.element_nodes(index);
  let midside = &nodes[element_type.n_corners()..];
  if let Some(n) = midside.iter().find(|n| corners.contains(*n)) {
    let id = mesh.nodes().as_slice()[*n].id;
    return Some(format!("midside slot holds corner node {}", id));
  }
  if let Some(n) = midside.iter().duplicates().next() {
    let id = mesh.nodes().as_slice()[*n].id;
    return Some(format!("midside node {} appears twice", id));
  }
  return None;
}

/// Relaxes the midside nodes of every quadratic element. Elements whose
/// midside slots are inconsistent are skipped, and a midside node shared by
/// two different edges stays where it is; both are logged as warnings.
pub fn relax_midside(mesh: &Mesh, options: &RelaxOptions) -> Relaxation {
  let factor = options.factor.clamp(0.0, 1.0);
  let corners = (0..mesh.n_elements())
    .flat_map(|i| {
      let n = mesh.element_type(i).n_corners();
      mesh.element_nodes(i)[..n].iter().copied()
    })
    .collect::<BTreeSet<usize>>();
  let mut skipped = Vec::new();
  // midside node -> the corner pair it sits between, or None on conflict
  let mut claims: BTreeMap<usize, Option<(usize, usize)>> = BTreeMap::new();
  for i in 0..mesh.n_elements() {
    let element_type = mesh.element_type(i);
    if !element_type.is_quadratic() {
      continue;
    }
    let element_id = mesh.elements().as_slice()[i].id;
    if let Some(reason) = reject_reason(mesh, i, &corners) {
      warn!("Skipping {} element {}: {}.", element_type, element_id, reason);
      skipped.push(element_id);
      continue;
    }
    let nodes = mesh.element_nodes(i);
    for [a, b, m] in element_type.midside_edges() {
      let (a, b) = (nodes[*a], nodes[*b]);
      let pair = (a.min(b), a.max(b));
      let claim = claims.entry(nodes[*m]).or_insert(Some(pair));
      if claim.is_some_and(|p| p != pair) {
        let id = mesh.nodes().as_slice()[nodes[*m]].id;
        warn!(
          "Midside node {} sits on two different edges, leaving it alone.",
          id
        );
        *claim = None;
      }
    }
  }
  let mut nodes = mesh.nodes().clone();
  let mut moved = 0;
  for (m, pair) in claims {
    let (a, b) = match pair {
      Some(p) => p,
      None => continue
    };
    let rows = mesh.nodes().as_slice();
    let old = rows[m].position;
    let target = midpoint(&rows[a].position, &rows[b].position);
    let new = if factor == 1.0 {
      target
    } else {
      old + (target - old) * factor
    };
    if new != old {
      moved += 1;
    }
    nodes.set_position(m, new);
  }
  debug!("{} quadratic elements skipped.", skipped.len());
  info!("Relaxed mesh, moved {} midside nodes.", moved);
  return Relaxation { nodes, moved, skipped };
}
