//! Topological edits: edge and face splits.
//!
//! Every operation validates its preconditions before touching the mesh, so
//! an `Err` leaves the mesh exactly as it was.
//!
//! # Operations
//!
//! - [`split_edge`]: insert a vertex on an edge, splicing it into the
//!   adjacent face loops
//! - [`trimesh_split_edge`]: insert a vertex on an edge of a triangle mesh,
//!   retriangulating the adjacent faces
//! - [`split_face`]: cut a face in two along a new diagonal
//! - [`quads_to_triangles`]: split every quad along its first diagonal
//!
//! # Boundary edges
//!
//! The edge splits skip boundary edges unless `allow_boundary` is set. A
//! skipped split returns `Ok(None)` rather than an error, so callers can
//! sweep all edges of a mesh and only the interior ones will split.
//!
//! # Example
//!
//! ```
//! use meshwork::prelude::*;
//! use meshwork::algo::split::split_face;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
//!
//! let (f, g) = split_face(&mut mesh, FaceKey::new(0), VertexKey::new(0), VertexKey::new(2)).unwrap();
//! assert_eq!(mesh.num_faces(), 2);
//! assert_eq!(mesh.face_vertices(f).unwrap().len(), 3);
//! assert_eq!(mesh.face_vertices(g).unwrap().len(), 3);
//! ```

use std::collections::HashSet;

use log::debug;

use crate::error::{MeshError, Result};
use crate::mesh::{Attributes, FaceKey, HalfEdgeMesh, MeshIndex, VertexKey};

fn check_parameter(t: f64) -> Result<()> {
    if t > 0.0 && t < 1.0 {
        Ok(())
    } else {
        Err(MeshError::invalid_param(
            "t",
            t,
            "must lie strictly between 0 and 1",
        ))
    }
}

/// Both directions of an edge: the face left of `u -> v` and of `v -> u`.
fn edge_faces<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    u: VertexKey<I>,
    v: VertexKey<I>,
) -> Result<(Option<FaceKey<I>>, Option<FaceKey<I>>)> {
    match (mesh.halfedge(u, v), mesh.halfedge(v, u)) {
        (Some(uv), Some(vu)) => Ok((uv, vu)),
        _ => Err(MeshError::EdgeNotFound {
            u: u.index(),
            v: v.index(),
        }),
    }
}

/// Split the edge `(u, v)` by inserting a vertex at parameter `t`.
///
/// The new vertex `w` lies at `u + t * (v - u)`. It is inserted into the loop
/// of the face left of `u -> v` immediately before `v`, and into the loop of
/// the face left of `v -> u` immediately before `u`. No faces are created or
/// deleted, so a triangle adjacent to the edge becomes a quad.
///
/// Returns `Ok(None)` without touching the mesh if the edge is on the
/// boundary and `allow_boundary` is false.
///
/// # Errors
///
/// - [`MeshError::InvalidParameter`] if `t` is not in the open interval (0, 1)
/// - [`MeshError::EdgeNotFound`] if `u` and `v` are not connected
pub fn split_edge<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    u: VertexKey<I>,
    v: VertexKey<I>,
    t: f64,
    allow_boundary: bool,
) -> Result<Option<VertexKey<I>>> {
    check_parameter(t)?;
    let (fuv, fvu) = edge_faces(mesh, u, v)?;

    if (fuv.is_none() || fvu.is_none()) && !allow_boundary {
        debug!("split_edge: skipping boundary edge ({}, {})", u, v);
        return Ok(None);
    }

    let position = mesh.edge_point(u, v, t)?;
    let w = mesh.add_vertex(position, Attributes::new())?;

    mesh.remove_halfedge(u, v);
    mesh.remove_halfedge(v, u);
    mesh.set_halfedge(u, w, fuv);
    mesh.set_halfedge(w, v, fuv);
    mesh.set_halfedge(v, w, fvu);
    mesh.set_halfedge(w, u, fvu);

    for (face, before) in [(fuv, v), (fvu, u)] {
        let Some(face) = face.and_then(|f| mesh.face_mut(f)) else {
            continue;
        };
        if let Some(i) = face.position_of(before) {
            face.vertices.insert(i, w);
        }
    }

    debug!("split_edge: ({}, {}) at t = {} -> vertex {}", u, v, t, w);
    Ok(Some(w))
}

/// The triangle left of `a -> b` and its vertex opposite that half-edge.
fn opposite_corner<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    face: Option<FaceKey<I>>,
    a: VertexKey<I>,
) -> Result<Option<(FaceKey<I>, VertexKey<I>)>> {
    let Some(f) = face else {
        return Ok(None);
    };
    let face = mesh.face(f).ok_or(MeshError::FaceNotFound(f.index()))?;
    if face.len() != 3 {
        return Err(MeshError::topology(format!(
            "face {} has {} vertices; triangle split needs a triangle mesh",
            f,
            face.len()
        )));
    }
    let o = face
        .vertex_before(a)
        .ok_or_else(|| MeshError::topology(format!("vertex {} is not in face {}", a, f)))?;
    Ok(Some((f, o)))
}

/// Split the edge `(u, v)` of a triangle mesh by inserting a vertex at
/// parameter `t`.
///
/// Each triangle adjacent to the edge is replaced by two triangles that
/// share the new vertex `w` and the triangle's opposite vertex, with the
/// winding of the original. The new triangles carry the attributes of the
/// triangle they replace. A side of the edge without a face gets two
/// boundary half-edges `(u, w)`, `(w, v)` (or the reverse) instead.
///
/// Returns `Ok(None)` without touching the mesh if the edge is on the
/// boundary and `allow_boundary` is false.
///
/// # Errors
///
/// - [`MeshError::InvalidParameter`] if `t` is not in the open interval (0, 1)
/// - [`MeshError::EdgeNotFound`] if `u` and `v` are not connected
/// - [`MeshError::InvalidTopology`] if an adjacent face is not a triangle, or
///   both adjacent triangles share their opposite vertex
pub fn trimesh_split_edge<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    u: VertexKey<I>,
    v: VertexKey<I>,
    t: f64,
    allow_boundary: bool,
) -> Result<Option<VertexKey<I>>> {
    check_parameter(t)?;
    let (fuv, fvu) = edge_faces(mesh, u, v)?;

    if (fuv.is_none() || fvu.is_none()) && !allow_boundary {
        debug!("trimesh_split_edge: skipping boundary edge ({}, {})", u, v);
        return Ok(None);
    }

    let uv_side = opposite_corner(mesh, fuv, u)?;
    let vu_side = opposite_corner(mesh, fvu, v)?;
    if let (Some((_, o1)), Some((_, o2))) = (uv_side, vu_side) {
        if o1 == o2 {
            return Err(MeshError::topology(format!(
                "both faces of edge ({}, {}) share the opposite vertex {}",
                u, v, o1
            )));
        }
    }

    let position = mesh.edge_point(u, v, t)?;
    let w = mesh.add_vertex(position, Attributes::new())?;

    // Each side is rewired independently: (a, b) is the half-edge on that side.
    for (side, a, b) in [(uv_side, u, v), (vu_side, v, u)] {
        mesh.remove_halfedge(a, b);
        match side {
            Some((f, o)) => {
                let attributes = mesh
                    .take_face(f)
                    .map(|face| face.attributes)
                    .unwrap_or_default();
                mesh.insert_new_face(vec![a, w, o], attributes.clone())?;
                mesh.insert_new_face(vec![w, b, o], attributes)?;
            }
            None => {
                mesh.set_halfedge(a, w, None);
                mesh.set_halfedge(w, b, None);
            }
        }
    }

    debug!("trimesh_split_edge: ({}, {}) at t = {} -> vertex {}", u, v, t, w);
    Ok(Some(w))
}

/// Split a face into two by inserting the edge `(u, v)`.
///
/// The loop is cut at `u` and `v`; the first new face runs from `u` to `v`
/// along the loop, the second from `v` back to `u`. Both new faces carry the
/// attributes of the split face, which is removed.
///
/// # Errors
///
/// - [`MeshError::FaceNotFound`] if the face does not exist
/// - [`MeshError::InvalidParameter`] if `u` or `v` is not on the face, or
///   they are the same vertex or neighbours in the loop
/// - [`MeshError::InvalidTopology`] if `u` and `v` are already connected by
///   another face
pub fn split_face<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    f: FaceKey<I>,
    u: VertexKey<I>,
    v: VertexKey<I>,
) -> Result<(FaceKey<I>, FaceKey<I>)> {
    let face = mesh.face(f).ok_or(MeshError::FaceNotFound(f.index()))?;
    let (Some(i), Some(j)) = (face.position_of(u), face.position_of(v)) else {
        return Err(MeshError::invalid_param(
            "u, v",
            format!("({}, {})", u, v),
            "the split vertices do not belong to the face",
        ));
    };

    let n = face.len();
    if i == j || (i + 1) % n == j || (j + 1) % n == i {
        return Err(MeshError::invalid_param(
            "u, v",
            format!("({}, {})", u, v),
            "the split vertices are neighbours",
        ));
    }
    if mesh.has_edge(u, v) {
        return Err(MeshError::topology(format!(
            "vertices {} and {} are already connected",
            u, v
        )));
    }

    let loop_ = &face.vertices;
    let (first, second): (Vec<_>, Vec<_>) = if j > i {
        (
            loop_[i..=j].to_vec(),
            loop_[j..].iter().chain(&loop_[..=i]).copied().collect(),
        )
    } else {
        (
            loop_[i..].iter().chain(&loop_[..=j]).copied().collect(),
            loop_[j..=i].to_vec(),
        )
    };

    let attributes = mesh
        .take_face(f)
        .map(|face| face.attributes)
        .unwrap_or_default();
    let a = mesh.insert_new_face(first, attributes.clone())?;
    let b = mesh.insert_new_face(second, attributes)?;

    debug!("split_face: face {} along ({}, {}) -> faces {} and {}", f, u, v, a, b);
    Ok((a, b))
}

/// Split every quad along the diagonal from its first to its third vertex.
///
/// Faces with more or fewer than four vertices are left alone. Returns the
/// keys of the new triangles.
///
/// Every diagonal is checked before the first split: if one already exists
/// as an edge, or two quads share a diagonal, the mesh is left unchanged and
/// [`MeshError::InvalidTopology`] is returned.
pub fn quads_to_triangles<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<Vec<FaceKey<I>>> {
    let quads: Vec<(FaceKey<I>, VertexKey<I>, VertexKey<I>)> = mesh
        .faces()
        .filter(|(_, face)| face.len() == 4)
        .map(|(f, face)| (f, face.vertices[0], face.vertices[2]))
        .collect();

    let mut diagonals = HashSet::with_capacity(quads.len());
    for &(f, u, v) in &quads {
        if mesh.has_edge(u, v) || !diagonals.insert((u.min(v), u.max(v))) {
            return Err(MeshError::topology(format!(
                "cannot triangulate face {}: vertices {} and {} are already connected",
                f, u, v
            )));
        }
    }

    let mut triangles = Vec::with_capacity(quads.len() * 2);
    for (f, u, v) in quads {
        let (a, b) = split_face(mesh, f, u, v)?;
        triangles.push(a);
        triangles.push(b);
    }
    Ok(triangles)
}
