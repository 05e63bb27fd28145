use matrix_data::boundary::{adjacent_elements, find_boundary_sides, find_boundary_vertices, SideComponent};
use matrix_data::mesh::{QuadChain, QuadConnectivity};
use proptest::prelude::*;

/// A 2x2 grid of quads on a 3x3 grid of vertices, numbered row by row.
fn grid_2x2() -> Vec<QuadConnectivity> {
    vec![
        QuadConnectivity([0, 1, 4, 3]),
        QuadConnectivity([1, 2, 5, 4]),
        QuadConnectivity([3, 4, 7, 6]),
        QuadConnectivity([4, 5, 8, 7]),
    ]
}

#[test]
fn empty_mesh_has_no_boundary() {
    assert!(find_boundary_sides(&[]).is_empty());
    assert!(find_boundary_vertices(&[]).is_empty());
}

#[test]
fn single_quad_is_all_boundary() {
    let connectivity = vec![QuadConnectivity([0, 1, 2, 3])];
    let sides = find_boundary_sides(&connectivity);
    assert_eq!(sides.len(), 4);
    let mut local_sides: Vec<_> = sides.iter().map(|side| side.inside).collect();
    local_sides.sort();
    let expected: Vec<_> = (0..4)
        .map(|local_side| SideComponent { element: 0, local_side })
        .collect();
    assert_eq!(local_sides, expected);
    assert_eq!(find_boundary_vertices(&connectivity), vec![0, 1, 2, 3]);
}

#[test]
fn grid_interior_vertex_is_not_on_boundary() {
    let connectivity = grid_2x2();
    assert_eq!(find_boundary_sides(&connectivity).len(), 8);
    assert_eq!(find_boundary_vertices(&connectivity), vec![0, 1, 2, 3, 5, 6, 7, 8]);

    // Side 1 of element 0 is the side 1 -> 4, which is side 3 (4 -> 1) of element 1
    assert_eq!(
        adjacent_elements(&connectivity, 0, 1),
        vec![SideComponent {
            element: 1,
            local_side: 3
        }]
    );
    assert_eq!(
        adjacent_elements(&connectivity, 3, 0),
        vec![SideComponent {
            element: 1,
            local_side: 2
        }]
    );
    assert!(adjacent_elements(&connectivity, 0, 0).is_empty());
}

#[test]
fn chain_neighbors_share_one_side() {
    let connectivity = QuadChain::new(3).connectivity();
    let right = (0..4)
        .find(|&s| !adjacent_elements(&connectivity, 0, s).is_empty())
        .unwrap();
    let neighbors = adjacent_elements(&connectivity, 0, right);
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].element, 1);

    // The interior element touches both of its neighbors
    let touching: usize = (0..4)
        .map(|s| adjacent_elements(&connectivity, 1, s).len())
        .sum();
    assert_eq!(touching, 2);
}

#[test]
#[should_panic]
fn adjacent_elements_panics_for_invalid_side() {
    adjacent_elements(&grid_2x2(), 0, 4);
}

proptest! {
    #[test]
    fn chain_boundary_covers_every_vertex(num_elements in 1..20usize) {
        let chain = QuadChain::new(num_elements);
        let connectivity = chain.connectivity();

        let sides = find_boundary_sides(&connectivity);
        prop_assert_eq!(sides.len(), 2 * num_elements + 2);
        for boundary_side in &sides {
            let inside = boundary_side.inside;
            prop_assert_eq!(connectivity[inside.element].side(inside.local_side), Some(boundary_side.side));
        }

        let vertices = find_boundary_vertices(&connectivity);
        prop_assert_eq!(vertices, (0..chain.num_nodes()).collect::<Vec<_>>());
    }
}
