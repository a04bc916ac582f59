//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and related types
//! for representing and editing polygon meshes.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which stores vertices and faces in
//! key-ordered tables plus a half-edge index `halfedge[u][v] -> Option<FaceKey>`
//! derived from the face loops. A `None` entry marks a boundary half-edge.
//!
//! # Keys
//!
//! Mesh elements are identified by type-safe keys:
//! - [`VertexKey`] - Identifies a vertex
//! - [`FaceKey`] - Identifies a face
//!
//! Keys are generic over the underlying integer type ([`MeshIndex`] trait)
//! and are handed out by a [`KeyRegistry`] that never reuses a key.
//!
//! # Construction
//!
//! ```
//! use meshwork::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_halfedges(), 6);
//! ```

mod attributes;
mod builder;
mod halfedge;
mod index;
pub mod primitives;

pub use attributes::{attributes, AttributeValue, Attributes};
pub use builder::{
    build_from_polygons, build_from_triangles, to_vertices_and_faces, FaceData, MeshData,
    VertexData,
};
pub use halfedge::{Face, HalfEdgeMesh, Vertex};
pub use index::{FaceKey, KeyRegistry, MeshIndex, VertexKey};
