//! This module implements element quality scoring, as the minimum scaled
//! Jacobian over an element's corners.
//!
//! Every corner gets the determinant of its (unit) edge vectors, scaled so
//! the ideal shape of each type scores 1.0. Inverted corners score negative,
//! collapsed edges score zero. Quadratic types are scored on their corners.

use log::debug;
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::elements::{ElementCategory, ElementType};
use crate::geometry::{Point, planar_corner, solid_corner};
use crate::mesh::Mesh;

/// Corner stencils of a tetrahedron: each corner and its three neighbours,
/// ordered so an uninverted corner has a positive determinant.
const TET_CORNERS: &[[usize; 4]] = &[
  [0, 1, 2, 3], [1, 2, 0, 3], [2, 0, 1, 3], [3, 0, 2, 1]
];

/// Corner stencils of a hexahedron.
const HEX_CORNERS: &[[usize; 4]] = &[
  [0, 1, 3, 4], [1, 2, 0, 5], [2, 3, 1, 6], [3, 0, 2, 7],
  [4, 7, 5, 0], [5, 4, 6, 1], [6, 5, 7, 2], [7, 6, 4, 3]
];

/// Corner stencils of a wedge.
const WEDGE_CORNERS: &[[usize; 4]] = &[
  [0, 2, 1, 3], [1, 0, 2, 4], [2, 1, 0, 5],
  [3, 4, 5, 0], [4, 5, 3, 1], [5, 3, 4, 2]
];

/// Corner stencils of a pyramid. The apex is left out: its four edges don't
/// make a single determinant.
const PYRAMID_CORNERS: &[[usize; 4]] = &[
  [0, 1, 3, 4], [1, 2, 0, 4], [2, 3, 1, 4], [3, 0, 2, 4]
];

/// Corner stencils of a triangle.
const TRI_CORNERS: &[[usize; 3]] = &[[0, 1, 2], [1, 2, 0], [2, 0, 1]];

/// Corner stencils of a quadrilateral.
const QUAD_CORNERS: &[[usize; 3]] = &[
  [0, 1, 3], [1, 2, 0], [2, 3, 1], [3, 0, 2]
];

/// Per-element quality scores, in element order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct QualityTable {
  /// Element ids.
  pub element_ids: Vec<i32>,
  /// Scores, `None` where the type has no meaningful score.
  pub values: Vec<Option<f64>>
}

impl QualityTable {
  /// Returns the number of scored (or unscorable) elements.
  pub fn len(&self) -> usize {
    return self.values.len();
  }

  /// Checks whether the table is empty.
  pub fn is_empty(&self) -> bool {
    return self.values.is_empty();
  }

  /// Returns the score of an element id.
  pub fn get(&self, element_id: i32) -> Option<f64> {
    let i = self.element_ids.iter().position(|id| *id == element_id)?;
    return self.values[i];
  }

  /// Returns the worst score, if any element could be scored.
  pub fn min(&self) -> Option<f64> {
    return self.values.iter().flatten().copied().reduce(f64::min);
  }

  /// Returns the mean score over the elements that could be scored.
  pub fn mean(&self) -> Option<f64> {
    let scored = self.values.iter().flatten().collect::<Vec<_>>();
    if scored.is_empty() {
      return None;
    }
    return Some(scored.iter().copied().sum::<f64>() / scored.len() as f64);
  }

  /// Returns the ids of elements that couldn't be scored.
  pub fn not_computable(&self) -> Vec<i32> {
    return self.element_ids.iter()
      .zip(self.values.iter())
      .filter(|(_, v)| v.is_none())
      .map(|(id, _)| *id)
      .collect();
  }
}

/// Minimum over solid corner stencils.
fn solid_min(points: &[Point], stencils: &[[usize; 4]]) -> f64 {
  return stencils.iter()
    .map(|[o, a, b, c]| {
      solid_corner(&points[*o], &points[*a], &points[*b], &points[*c])
    })
    .fold(f64::INFINITY, f64::min);
}

/// Minimum over planar corner stencils, against a fixed element normal.
fn planar_min(
  points: &[Point],
  stencils: &[[usize; 3]],
  normal: &Vector3<f64>
) -> f64 {
  let normal = match normal.try_normalize(0.0) {
    Some(n) => n,
    None => return 0.0
  };
  return stencils.iter()
    .map(|[o, a, b]| {
      planar_corner(&points[*o], &points[*a], &points[*b], &normal)
    })
    .fold(f64::INFINITY, f64::min);
}

/// Scores one element from its node positions, in element order.
pub fn element_quality(
  element_type: ElementType,
  points: &[Point]
) -> Option<f64> {
  let p = points;
  let raw = match element_type.linear() {
    ElementType::Tet4 => solid_min(p, TET_CORNERS) * 2f64.sqrt(),
    ElementType::Hex8 => solid_min(p, HEX_CORNERS),
    ElementType::Wedge6 => solid_min(p, WEDGE_CORNERS) * 2.0 / 3f64.sqrt(),
    ElementType::Pyramid5 => solid_min(p, PYRAMID_CORNERS) * 2f64.sqrt(),
    ElementType::Tri3 => {
      let normal = (p[1] - p[0]).cross(&(p[2] - p[0]));
      planar_min(p, TRI_CORNERS, &normal) * 2.0 / 3f64.sqrt()
    },
    ElementType::Quad4 => {
      let normal = (p[2] - p[0]).cross(&(p[3] - p[1]));
      planar_min(p, QUAD_CORNERS, &normal)
    },
    _ => return None
  };
  return Some(raw.clamp(-1.0, 1.0));
}

/// Scores every element of a mesh. Point and line elements get `None`; the
/// batch as a whole never fails.
pub fn cell_quality(mesh: &Mesh) -> QualityTable {
  let values = (0..mesh.n_elements())
    .into_par_iter()
    .map(|i| {
      let element_type = mesh.element_type(i);
      return match element_type.category() {
        ElementCategory::Point | ElementCategory::Line => None,
        _ => element_quality(element_type, &mesh.element_points(i))
      };
    })
    .collect::<Vec<_>>();
  let element_ids = mesh.elements().ids().collect::<Vec<_>>();
  debug!(
    "Scored {} elements, {} not computable.",
    values.len(),
    values.iter().filter(|v| v.is_none()).count()
  );
  return QualityTable { element_ids, values };
}
