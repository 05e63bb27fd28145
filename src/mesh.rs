//! A minimal quadrilateral mesh: a one-dimensional chain of quads sharing edges.
//!
//! ```text
//!   *-----*-----*-----*
//!  0|    2|    4|    6|
//!   | 0   | 1   | ne-1|
//!   |     |     |     |
//!   *-----*-----*-----*
//!  1     3     5     7
//! ```
//!
//! Node numbers are drawn to the lower left of each node, element numbers inside each quad.
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Connectivity of a side (edge) of a quadrilateral.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideConnectivity(pub [usize; 2]);

impl SideConnectivity {
    pub fn vertex_indices(&self) -> &[usize] {
        &self.0
    }

    /// Vertex indices in ascending order, identifying the side regardless of orientation.
    pub fn sorted(&self) -> [usize; 2] {
        let [a, b] = self.0;
        if a <= b {
            [a, b]
        } else {
            [b, a]
        }
    }
}

/// Connectivity of a bilinear quadrilateral, vertices in counter-clockwise order.
///
/// ```text
/// 3_______2
/// |       |
/// |       |
/// 0_______1
/// ```
///
/// Local side `s` connects vertex `s` to vertex `(s + 1) % 4`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuadConnectivity(pub [usize; 4]);

impl QuadConnectivity {
    pub const NUM_SIDES: usize = 4;

    pub fn vertex_indices(&self) -> &[usize] {
        &self.0
    }

    pub fn num_sides(&self) -> usize {
        Self::NUM_SIDES
    }

    pub fn side(&self, local_side: usize) -> Option<SideConnectivity> {
        (local_side < Self::NUM_SIDES).then(|| {
            let v = &self.0;
            SideConnectivity([v[local_side], v[(local_side + 1) % Self::NUM_SIDES]])
        })
    }

    pub fn sides(&self) -> impl '_ + Iterator<Item = SideConnectivity> {
        (0..Self::NUM_SIDES).filter_map(move |s| self.side(s))
    }
}

impl Deref for QuadConnectivity {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A chain of `num_elements` quadrilaterals, element `e` touching nodes `2e .. 2e + 4`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadChain {
    num_elements: usize,
}

impl QuadChain {
    pub const NODES_PER_ELEMENT: usize = 4;

    pub fn new(num_elements: usize) -> Self {
        Self { num_elements }
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Total number of nodes, `2 * num_elements + 2`.
    pub fn num_nodes(&self) -> usize {
        2 * self.num_elements + 2
    }

    /// The nodes of element `element` in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if the element index is out of bounds.
    pub fn element_nodes(&self, element: usize) -> [usize; Self::NODES_PER_ELEMENT] {
        assert!(element < self.num_elements, "element index out of bounds");
        let first = 2 * element;
        std::array::from_fn(|i| first + i)
    }

    /// Counter-clockwise connectivity of every element.
    pub fn connectivity(&self) -> Vec<QuadConnectivity> {
        (0..self.num_elements)
            .map(|e| {
                let [top_left, bottom_left, top_right, bottom_right] = self.element_nodes(e);
                QuadConnectivity([bottom_left, bottom_right, top_right, top_left])
            })
            .collect()
    }
}
