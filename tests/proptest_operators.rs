//! Property-based tests for the mesh operator builders.
//!
//! ## Invariants Tested
//!
//! - **Adjacency** - symmetric, 0/1 valued, `2E` non-zeros, row sums equal degrees
//! - **Incidence** - every edge row sums to zero
//! - **Laplacians** - uniform and cotangent rows sum to zero, cotangent is symmetric
//! - **Gradient** - linear fields have a constant gradient, constants have none
//! - **Formats** - every storage format assembles the same matrix

use meshwork::matrix::{
    mesh_adjacency_matrix, mesh_connectivity_matrix, mesh_degree_matrix, mesh_face_matrix,
    mesh_laplacian_matrix, trimesh_cotangent_laplacian_matrix, trimesh_gradient_matrix,
    MatrixFormat, OperatorOptions,
};
use meshwork::mesh::primitives::{grid, triangulated_grid};
use meshwork::mesh::HalfEdgeMesh;
use nalgebra::{DMatrix, DVector, Point3};
use proptest::prelude::*;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

const EPS: f64 = 1e-9;

fn grid_size() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=4, 1usize..=4)
}

fn matrix_format() -> impl Strategy<Value = MatrixFormat> {
    prop_oneof![
        Just(MatrixFormat::Dense),
        Just(MatrixFormat::Csr),
        Just(MatrixFormat::Csc),
        Just(MatrixFormat::Coo),
    ]
}

/// Triangulated grid with every vertex lifted by a small height offset.
fn bumpy_grid(n: usize, heights: &[f64]) -> HalfEdgeMesh {
    let mut mesh: HalfEdgeMesh = triangulated_grid(n, n, 1.0).unwrap();
    let keys: Vec<_> = mesh.vertex_keys().collect();
    for (v, h) in keys.into_iter().zip(heights.iter().cycle()) {
        let p = *mesh.position(v).unwrap();
        mesh.set_position(v, Point3::new(p.x, p.y, *h)).unwrap();
    }
    mesh
}

fn max_abs(values: &DVector<f64>) -> f64 {
    values.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

// =============================================================================
// ADJACENCY AND INCIDENCE
// =============================================================================

proptest! {
    #[test]
    fn prop_adjacency_is_symmetric_and_binary((nx, ny) in grid_size(), format in matrix_format()) {
        let mesh: HalfEdgeMesh = grid(nx, ny, 1.0).unwrap();
        let options = OperatorOptions::default().with_format(format);
        let a = mesh_adjacency_matrix(&mesh, &options).unwrap();
        let dense = a.to_dense();

        prop_assert_eq!(a.format(), format);
        prop_assert_eq!(dense.clone(), dense.transpose());
        prop_assert!(dense.iter().all(|&x| x == 0.0 || x == 1.0));
        prop_assert_eq!(dense.iter().filter(|&&x| x == 1.0).count(), 2 * mesh.num_edges());
        prop_assert!((0..dense.nrows()).all(|i| dense[(i, i)] == 0.0));

        let d = mesh_degree_matrix(&mesh, &options).unwrap().to_dense();
        let sums = a.row_sums();
        for i in 0..d.nrows() {
            prop_assert_eq!(d[(i, i)], sums[i]);
        }
    }

    #[test]
    fn prop_connectivity_rows_sum_to_zero((nx, ny) in grid_size()) {
        let mesh: HalfEdgeMesh = triangulated_grid(nx, ny, 1.0).unwrap();
        let c = mesh_connectivity_matrix(&mesh, &OperatorOptions::default()).unwrap();

        prop_assert_eq!(c.nrows(), mesh.num_edges());
        prop_assert_eq!(c.ncols(), mesh.num_vertices());
        prop_assert_eq!(max_abs(&c.row_sums()), 0.0);

        let dense = c.to_dense();
        for i in 0..dense.nrows() {
            let row = dense.row(i);
            prop_assert_eq!(row.iter().filter(|&&x| x == 1.0).count(), 1);
            prop_assert_eq!(row.iter().filter(|&&x| x == -1.0).count(), 1);
        }
    }

    #[test]
    fn prop_face_matrix_counts_loop_vertices((nx, ny) in grid_size()) {
        let mesh: HalfEdgeMesh = grid(nx, ny, 1.0).unwrap();
        let f = mesh_face_matrix(&mesh, &OperatorOptions::default()).unwrap();
        prop_assert_eq!(f.nrows(), mesh.num_faces());
        prop_assert!(f.row_sums().iter().all(|&s| s == 4.0));
    }
}

// =============================================================================
// LAPLACIANS
// =============================================================================

proptest! {
    #[test]
    fn prop_uniform_laplacian_rows_sum_to_zero((nx, ny) in grid_size(), format in matrix_format()) {
        let mesh: HalfEdgeMesh = grid(nx, ny, 1.0).unwrap();
        let options = OperatorOptions::default().with_format(format);
        let l = mesh_laplacian_matrix(&mesh, &options).unwrap();

        prop_assert!(max_abs(&l.row_sums()) < EPS);
        let dense = l.to_dense();
        prop_assert!((0..dense.nrows()).all(|i| dense[(i, i)] == 1.0));
    }

    #[test]
    fn prop_cotangent_laplacian_is_symmetric_with_zero_rows(
        n in 1usize..=4,
        heights in prop::collection::vec(-0.3f64..0.3, 1..8),
        parallel in any::<bool>(),
    ) {
        let mesh = bumpy_grid(n, &heights);
        let options = OperatorOptions::default().with_parallel(parallel);
        let l = trimesh_cotangent_laplacian_matrix(&mesh, &options).unwrap();
        let dense = l.to_dense();

        prop_assert!(max_abs(&l.row_sums()) < EPS);
        prop_assert!((&dense - dense.transpose()).amax() < EPS);
        prop_assert!((0..dense.nrows()).all(|i| dense[(i, i)] <= 0.0));
    }

    #[test]
    fn prop_cotangent_parallel_matches_sequential(
        n in 1usize..=4,
        heights in prop::collection::vec(-0.3f64..0.3, 1..8),
    ) {
        let mesh = bumpy_grid(n, &heights);
        let par = trimesh_cotangent_laplacian_matrix(&mesh, &OperatorOptions::default()).unwrap();
        let seq = trimesh_cotangent_laplacian_matrix(&mesh, &OperatorOptions::default().sequential())
            .unwrap();
        prop_assert!((par.to_dense() - seq.to_dense()).amax() < 1e-12);
    }
}

// =============================================================================
// GRADIENT
// =============================================================================

proptest! {
    #[test]
    fn prop_gradient_of_linear_field(
        n in 1usize..=4,
        a in -5.0f64..5.0,
        b in -5.0f64..5.0,
        c in -5.0f64..5.0,
    ) {
        let mesh: HalfEdgeMesh = triangulated_grid(n, n, 0.5).unwrap();
        let g = trimesh_gradient_matrix(&mesh, &OperatorOptions::default()).unwrap();
        let f = mesh.num_faces();
        prop_assert_eq!(g.nrows(), 3 * f);

        let field = DVector::from_iterator(
            mesh.num_vertices(),
            mesh.vertices().map(|(_, v)| a * v.position.x + b * v.position.y + c),
        );
        let result = g.mul_vec(&field).unwrap();
        for i in 0..f {
            prop_assert!((result[i] - a).abs() < 1e-9);
            prop_assert!((result[f + i] - b).abs() < 1e-9);
            prop_assert!(result[2 * f + i].abs() < 1e-9);
        }

        let constant = DVector::from_element(mesh.num_vertices(), c);
        prop_assert!(max_abs(&g.mul_vec(&constant).unwrap()) < 1e-9);
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn quad_grid_adjacency_matches_hand_computed() {
    // 3x3 vertices, row-major:
    //   6 7 8
    //   3 4 5
    //   0 1 2
    let mesh: HalfEdgeMesh = grid(2, 2, 1.0).unwrap();
    let a = mesh_adjacency_matrix(&mesh, &OperatorOptions::default()).unwrap();

    let edges = [
        (0, 1), (1, 2), (3, 4), (4, 5), (6, 7), (7, 8),
        (0, 3), (3, 6), (1, 4), (4, 7), (2, 5), (5, 8),
    ];
    let mut expected = DMatrix::zeros(9, 9);
    for &(u, v) in &edges {
        expected[(u, v)] = 1.0;
        expected[(v, u)] = 1.0;
    }

    assert_eq!(a.to_dense(), expected);
    assert_eq!(a.as_csr().unwrap().nnz(), 24);
}

#[test]
fn every_format_assembles_the_same_laplacian() {
    let mesh: HalfEdgeMesh = triangulated_grid(3, 2, 1.0).unwrap();
    let reference = mesh_laplacian_matrix(&mesh, &OperatorOptions::default())
        .unwrap()
        .to_dense();
    for format in [MatrixFormat::Dense, MatrixFormat::Csc, MatrixFormat::Coo] {
        let options = OperatorOptions::default().with_format(format);
        let m = mesh_laplacian_matrix(&mesh, &options).unwrap();
        assert_eq!(m.format(), format);
        assert_eq!(m.to_dense(), reference);
    }
}
