//! # Meshwork
//!
//! A half-edge surface mesh with a topological editor, connectivity analysis
//! and an operator builder that turns mesh topology into matrices for
//! numerical solvers.
//!
//! ## Features
//!
//! - **Half-edge index**: `halfedge[u][v]` maps every directed edge to the
//!   face on its left, with explicit boundary entries, kept in sync by every edit
//! - **Stable keys**: type-safe vertex and face keys that are never reused,
//!   over 16-bit, 32-bit or 64-bit integers
//! - **Attributes**: typed per-vertex and per-face values with mesh-wide defaults
//! - **Editing**: edge splits, triangle edge splits and face splits
//! - **Connectivity**: breadth-first traversal and connected components
//! - **Operators**: adjacency, degree, incidence, uniform and cotangent
//!   Laplacians, face and gradient matrices in dense, CSR, CSC or COO form
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use meshwork::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![vec![0, 1, 2, 3]];
//!
//! let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_edges(), 4);
//! assert!(mesh.is_vertex_on_boundary(VertexKey::new(0)));
//! ```
//!
//! ## Editing and Analysis
//!
//! ```
//! use meshwork::prelude::*;
//! use meshwork::algo::{split, traversal};
//! use meshwork::matrix::{mesh_adjacency_matrix, OperatorOptions};
//!
//! let mut mesh: HalfEdgeMesh = meshwork::mesh::primitives::triangulated_grid(2, 2, 1.0).unwrap();
//!
//! // Interior edges split, boundary edges are skipped
//! let w = split::trimesh_split_edge(&mut mesh, VertexKey::new(0), VertexKey::new(4), 0.5, false).unwrap();
//! assert!(w.is_some());
//! let skipped = split::trimesh_split_edge(&mut mesh, VertexKey::new(0), VertexKey::new(1), 0.5, false).unwrap();
//! assert!(skipped.is_none());
//!
//! assert!(traversal::is_connected(&mesh));
//! let a = mesh_adjacency_matrix(&mesh, &OperatorOptions::default()).unwrap();
//! assert_eq!(a.nrows(), mesh.num_vertices());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod matrix;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use meshwork::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::matrix::{Matrix, MatrixFormat, OperatorOptions};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, to_vertices_and_faces, AttributeValue,
        Attributes, Face, FaceKey, HalfEdgeMesh, MeshIndex, Vertex, VertexKey,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
