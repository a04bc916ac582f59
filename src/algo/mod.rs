//! Mesh algorithms.
//!
//! - **Editing** ([`split`]): edge splits, triangle edge splits, face splits
//!   and quad triangulation
//! - **Connectivity** ([`traversal`]): breadth-first traversal, connected
//!   components and connectedness over meshes and adjacency maps
//!
//! Operators that turn a mesh into matrices live in [`crate::matrix`].

pub mod split;
pub mod traversal;

pub use split::{quads_to_triangles, split_edge, split_face, trimesh_split_edge};
pub use traversal::{
    breadth_first_ordering, breadth_first_traverse, connected_components, is_connected,
    mesh_is_connected, Graph,
};
