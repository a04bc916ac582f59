//! Matrix storage and mesh operators.
//!
//! - [`sparse`]: COO, CSR and CSC storage plus the [`Matrix`] wrapper
//! - [`operators`]: adjacency, degree, incidence, Laplacian, face and
//!   gradient operators
//!
//! Builders never cache a vertex numbering: each call derives it from the
//! mesh as it is at that moment.

pub mod operators;
pub mod sparse;

pub use operators::{
    adjacency_matrix, connectivity_matrix, degree_matrix, face_matrix, grad, laplacian_matrix,
    mesh_adjacency_matrix, mesh_connectivity_matrix, mesh_degree_matrix, mesh_face_matrix,
    mesh_laplacian_matrix, trimesh_cotangent_laplacian_matrix, trimesh_edge_cotangent,
    trimesh_edge_cotangents, trimesh_gradient_matrix, DegenerateHandling, OperatorOptions,
};
pub use sparse::{CooMatrix, CscMatrix, CsrMatrix, Matrix, MatrixFormat, Triplet};
