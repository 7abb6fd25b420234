//! This module defines basic geometric concepts: the six nodal degrees of
//! freedom that matrix equations refer to, and the corner measures used to
//! score element shapes.

use std::fmt::Display;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Stupid constant so the code is more readable.
pub const SIXDOF: usize = 6;

/// A point in space.
pub type Point = Point3<f64>;

/// The two type of degree of freedom.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq
)]
pub enum DofType {
  /// Translational DOF.
  Translational,
  /// Rotational DOF.
  Rotational
}

impl DofType {
  /// Returns this DOF type uppercase letter.
  pub const fn letter(&self) -> char {
    return match self {
      DofType::Translational => 'T',
      DofType::Rotational => 'R',
    };
  }
}

/// The three axes.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq
)]
pub enum Axis {
  /// The X axis.
  X,
  /// The Y axis.
  Y,
  /// The Z axis.
  Z,
}

impl Axis {
  /// Returns this axis' lowercase letter.
  pub const fn letter(&self) -> char {
    return match self {
      Axis::X => 'x',
      Axis::Y => 'y',
      Axis::Z => 'z',
    };
  }
}

/// One of the six nodal degrees of freedom.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq
)]
pub struct Dof {
  /// The type of DOF (translational or rotational).
  pub dof_type: DofType,
  /// The axis of the DOF (X/Y/Z).
  pub axis: Axis
}

impl Dof {
  /// Returns all DOF in order.
  pub const fn all() -> &'static [Self; SIXDOF] {
    return &[
      Self { dof_type: DofType::Translational, axis: Axis::X },
      Self { dof_type: DofType::Translational, axis: Axis::Y },
      Self { dof_type: DofType::Translational, axis: Axis::Z },
      Self { dof_type: DofType::Rotational, axis: Axis::X },
      Self { dof_type: DofType::Rotational, axis: Axis::Y },
      Self { dof_type: DofType::Rotational, axis: Axis::Z },
    ];
  }

  /// Returns the DOF number as stored in files, 1 through 6.
  pub fn number(&self) -> u32 {
    let base = match self.axis {
      Axis::X => 1,
      Axis::Y => 2,
      Axis::Z => 3,
    };
    return match self.dof_type {
      DofType::Translational => base,
      DofType::Rotational => base + 3,
    };
  }
}

impl TryFrom<u32> for Dof {
  type Error = ();

  fn try_from(value: u32) -> Result<Self, Self::Error> {
    return match value {
      1..=6 => Ok(Self::all()[value as usize - 1]),
      _ => Err(())
    };
  }
}

impl Display for Dof {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}{}", self.dof_type.letter(), self.axis.letter());
  }
}

/// Returns the midpoint of two points.
pub fn midpoint(a: &Point, b: &Point) -> Point {
  return nalgebra::center(a, b);
}

/// Scaled Jacobian of a solid corner: the determinant of the three edge
/// vectors leaving `origin`, divided by the product of their lengths. 1.0 for
/// three mutually orthogonal edges, negative when the corner is inverted, and
/// 0.0 if any edge collapsed.
pub fn solid_corner(origin: &Point, a: &Point, b: &Point, c: &Point) -> f64 {
  let (ea, eb, ec) = (a - origin, b - origin, c - origin);
  let lengths = ea.norm() * eb.norm() * ec.norm();
  if lengths == 0.0 {
    return 0.0;
  }
  return ea.dot(&eb.cross(&ec)) / lengths;
}

/// Scaled Jacobian of a planar corner, signed against the element normal.
/// 1.0 for a right angle, negative when the corner folds over.
pub fn planar_corner(
  origin: &Point,
  a: &Point,
  b: &Point,
  normal: &Vector3<f64>
) -> f64 {
  let (ea, eb) = (a - origin, b - origin);
  let lengths = ea.norm() * eb.norm();
  if lengths == 0.0 {
    return 0.0;
  }
  return ea.cross(&eb).dot(normal) / lengths;
}
