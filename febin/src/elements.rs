//! This module defines the element types that can be found in archive files,
//! along with everything that depends on the type alone: how many node
//! references a record carries, which of them are corners, where the midside
//! nodes sit, and which VTK cell shape a visualization layer should use.
//!
//! Quadratic types list their corners first, then their midside nodes in VTK
//! edge order.

use std::fmt::Display;
use core::str::FromStr;

use serde::{Serialize, Deserialize};
use clap::ValueEnum;

use crate::error::FebinError;

/// Broadly-defined element categories, by topological dimension.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ElementCategory {
  /// Zero-dimensional elements, like point masses.
  Point,
  /// One-dimensional elements, like beams and links.
  Line,
  /// Two-dimensional elements, like shells and planes.
  Surface,
  /// Three-dimensional solids.
  Volume
}

impl ElementCategory {
  /// Returns the topological dimension.
  pub const fn dimension(&self) -> usize {
    return match self {
      Self::Point => 0,
      Self::Line => 1,
      Self::Surface => 2,
      Self::Volume => 3,
    };
  }
}

/// Generates the ElementType enum.
macro_rules! gen_elems {
  (
    $(($vn:ident, $nm:literal, $tag:literal, $nodes:literal, $corners:literal,
      $cat:ident, $vtk:literal),)*
  ) => {
    /// Known element types.
    #[derive(
      Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash,
      ValueEnum
    )]
    #[clap(rename_all = "UPPER")]
    #[allow(missing_docs)]
    pub enum ElementType {
      $($vn,)*
    }

    impl ElementType {
      /// Returns the all-caps name of the element type.
      pub const fn name(&self) -> &'static str {
        return match self {
          $(Self::$vn => $nm,)*
        };
      }

      /// Returns the on-disk type tag.
      pub const fn tag(&self) -> u32 {
        return match self {
          $(Self::$vn => $tag,)*
        };
      }

      /// Returns how many node references an element of this type has.
      pub const fn n_nodes(&self) -> usize {
        return match self {
          $(Self::$vn => $nodes,)*
        };
      }

      /// Returns how many of those are corner nodes.
      pub const fn n_corners(&self) -> usize {
        return match self {
          $(Self::$vn => $corners,)*
        };
      }

      /// Returns the category of the element type.
      pub const fn category(&self) -> ElementCategory {
        return match self {
          $(Self::$vn => ElementCategory::$cat,)*
        };
      }

      /// Returns the VTK cell type id of the matching shape.
      pub const fn vtk_cell_type(&self) -> u8 {
        return match self {
          $(Self::$vn => $vtk,)*
        };
      }

      /// Returns a static slice with all known element types.
      pub const fn all() -> &'static [Self] {
        return &[
          $(Self::$vn,)*
        ];
      }
    }

    impl TryFrom<u32> for ElementType {
      type Error = u32;

      fn try_from(tag: u32) -> Result<Self, Self::Error> {
        return match tag {
          $($tag => Ok(Self::$vn),)*
          _ => Err(tag)
        };
      }
    }

    impl FromStr for ElementType {
      type Err = ();

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
          $(
            $nm => Ok(Self::$vn),
          )*
          _ => return Err(())
        };
      }
    }
  };
}

gen_elems!(
  // 0D
  (Point1, "POINT1", 1, 1, 1, Point, 1),
  // 1D
  (Line2, "LINE2", 2, 2, 2, Line, 3),
  (Line3, "LINE3", 3, 3, 2, Line, 21),
  // 2D
  (Tri3, "TRI3", 4, 3, 3, Surface, 5),
  (Tri6, "TRI6", 5, 6, 3, Surface, 22),
  (Quad4, "QUAD4", 6, 4, 4, Surface, 9),
  (Quad8, "QUAD8", 7, 8, 4, Surface, 23),
  // 3D
  (Tet4, "TET4", 8, 4, 4, Volume, 10),
  (Tet10, "TET10", 9, 10, 4, Volume, 24),
  (Pyramid5, "PYRAMID5", 10, 5, 5, Volume, 14),
  (Pyramid13, "PYRAMID13", 11, 13, 5, Volume, 27),
  (Wedge6, "WEDGE6", 12, 6, 6, Volume, 13),
  (Wedge15, "WEDGE15", 13, 15, 6, Volume, 26),
  (Hex8, "HEX8", 14, 8, 8, Volume, 12),
  (Hex20, "HEX20", 15, 20, 8, Volume, 25),
);

impl ElementType {
  /// Decodes an on-disk tag, naming the element if the tag is unknown.
  pub fn from_tag(tag: u32, element_id: i32) -> Result<Self, FebinError> {
    return Self::try_from(tag)
      .map_err(|tag| FebinError::UnknownElementType { element_id, tag });
  }

  /// Checks whether the type has midside nodes.
  pub const fn is_quadratic(&self) -> bool {
    return self.n_nodes() > self.n_corners();
  }

  /// Returns the linear type with the same shape.
  pub const fn linear(&self) -> Self {
    return match self {
      Self::Line3 => Self::Line2,
      Self::Tri6 => Self::Tri3,
      Self::Quad8 => Self::Quad4,
      Self::Tet10 => Self::Tet4,
      Self::Pyramid13 => Self::Pyramid5,
      Self::Wedge15 => Self::Wedge6,
      Self::Hex20 => Self::Hex8,
      other => *other
    };
  }

  /// Returns `[corner a, corner b, midside]` node positions for every edge
  /// of a quadratic type. Linear types have none.
  pub const fn midside_edges(&self) -> &'static [[usize; 3]] {
    return match self {
      Self::Line3 => &[[0, 1, 2]],
      Self::Tri6 => &[[0, 1, 3], [1, 2, 4], [2, 0, 5]],
      Self::Quad8 => &[[0, 1, 4], [1, 2, 5], [2, 3, 6], [3, 0, 7]],
      Self::Tet10 => &[
        [0, 1, 4], [1, 2, 5], [2, 0, 6], [0, 3, 7], [1, 3, 8], [2, 3, 9]
      ],
      Self::Pyramid13 => &[
        [0, 1, 5], [1, 2, 6], [2, 3, 7], [3, 0, 8],
        [0, 4, 9], [1, 4, 10], [2, 4, 11], [3, 4, 12]
      ],
      Self::Wedge15 => &[
        [0, 1, 6], [1, 2, 7], [2, 0, 8],
        [3, 4, 9], [4, 5, 10], [5, 3, 11],
        [0, 3, 12], [1, 4, 13], [2, 5, 14]
      ],
      Self::Hex20 => &[
        [0, 1, 8], [1, 2, 9], [2, 3, 10], [3, 0, 11],
        [4, 5, 12], [5, 6, 13], [6, 7, 14], [7, 4, 15],
        [0, 4, 16], [1, 5, 17], [2, 6, 18], [3, 7, 19]
      ],
      Self::Point1 | Self::Line2 | Self::Tri3 | Self::Quad4 | Self::Tet4
        | Self::Pyramid5 | Self::Wedge6 | Self::Hex8 => &[]
    };
  }
}

impl PartialOrd for ElementType {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for ElementType {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    return self.tag().cmp(&other.tag());
  }
}

impl Display for ElementType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.name());
  }
}
