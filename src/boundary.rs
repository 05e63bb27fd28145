//! Boundary analysis for quadrilateral meshes.
//!
//! A side belongs to the boundary when exactly one element uses it. Sides are compared by
//! their vertex sets, so two elements sharing a side with opposite orientation are adjacent.
use crate::mesh::{QuadConnectivity, SideConnectivity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An element together with the local index of one of its sides.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SideComponent {
    pub element: usize,
    pub local_side: usize,
}

/// A side on the boundary along with the (single) element it belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySide {
    pub side: SideConnectivity,
    pub inside: SideComponent,
}

/// Groups every side of every element by its sorted vertex indices.
fn side_occurrences(connectivity: &[QuadConnectivity]) -> BTreeMap<[usize; 2], Vec<(SideConnectivity, SideComponent)>> {
    // BTreeMap gives a deterministic output order
    let mut occurrences: BTreeMap<_, Vec<_>> = BTreeMap::new();
    for (element, quad) in connectivity.iter().enumerate() {
        for (local_side, side) in quad.sides().enumerate() {
            occurrences
                .entry(side.sorted())
                .or_default()
                .push((side, SideComponent { element, local_side }));
        }
    }
    occurrences
}

/// Finds the sides used by exactly one element, ordered by their sorted vertex indices.
pub fn find_boundary_sides(connectivity: &[QuadConnectivity]) -> Vec<BoundarySide> {
    side_occurrences(connectivity)
        .into_values()
        .filter(|uses| uses.len() == 1)
        .map(|uses| {
            let (side, inside) = uses[0];
            BoundarySide { side, inside }
        })
        .collect()
}

/// Returns a sorted list of the vertices that belong to at least one boundary side.
pub fn find_boundary_vertices(connectivity: &[QuadConnectivity]) -> Vec<usize> {
    let mut vertices: Vec<_> = find_boundary_sides(connectivity)
        .iter()
        .flat_map(|boundary_side| boundary_side.side.0)
        .collect();
    vertices.sort_unstable();
    vertices.dedup();
    vertices
}

/// Finds the elements, other than `element` itself, which share the given local side of
/// `element`, along with the local index of the shared side in each of them.
///
/// # Panics
///
/// Panics if `element` or `local_side` is out of bounds.
pub fn adjacent_elements(connectivity: &[QuadConnectivity], element: usize, local_side: usize) -> Vec<SideComponent> {
    assert!(element < connectivity.len(), "element index out of bounds");
    let key = connectivity[element]
        .side(local_side)
        .expect("local side index out of bounds")
        .sorted();

    let mut adjacent = Vec::new();
    for (other, quad) in connectivity.iter().enumerate() {
        if other == element {
            continue;
        }
        adjacent.extend(
            quad.sides()
                .enumerate()
                .filter(|(_, side)| side.sorted() == key)
                .map(|(local_side, _)| SideComponent {
                    element: other,
                    local_side,
                }),
        );
    }
    adjacent
}
