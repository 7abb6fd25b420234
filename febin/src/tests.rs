//! Unit tests. Binary files are built in memory by `builder`.

mod builder;
mod caching;
mod matrices;
mod tables;

use crate::elements::ElementType;
use crate::geometry::Dof;

#[test]
fn test_element_type_tables() {
  for et in ElementType::all() {
    assert_eq!(ElementType::try_from(et.tag()), Ok(*et));
    assert_eq!(et.name().parse::<ElementType>(), Ok(*et));
    assert!(et.n_corners() <= et.n_nodes());
    assert_eq!(et.is_quadratic(), !et.midside_edges().is_empty());
    assert_eq!(et.linear().n_corners(), et.n_corners());
    assert!(!et.linear().is_quadratic());
    // every midside slot appears exactly once, after the corners
    let mut slots = et.midside_edges().iter().map(|e| e[2]).collect::<Vec<_>>();
    slots.sort();
    let expected = (et.n_corners()..et.n_nodes()).collect::<Vec<_>>();
    assert_eq!(slots, expected, "bad midside edges for {}", et);
    for [a, b, _] in et.midside_edges() {
      assert!(*a < et.n_corners() && *b < et.n_corners());
    }
  }
  assert_eq!(ElementType::try_from(0), Err(0));
  assert_eq!(ElementType::try_from(16), Err(16));
  assert_eq!(ElementType::Hex20.vtk_cell_type(), 25);
  assert_eq!(ElementType::Tet4.vtk_cell_type(), 10);
}

#[test]
fn test_dof_numbers() {
  for (i, dof) in Dof::all().iter().enumerate() {
    assert_eq!(dof.number(), i as u32 + 1);
    assert_eq!(Dof::try_from(dof.number()), Ok(*dof));
  }
  assert!(Dof::try_from(0).is_err());
  assert!(Dof::try_from(7).is_err());
  assert_eq!(Dof::all()[4].to_string(), "Ry");
}
