//! Mesh construction utilities.
//!
//! This module provides functions for building half-edge meshes from
//! face-vertex lists, converting them back, and taking serializable
//! snapshots that keep keys and attributes intact.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::attributes::Attributes;
use super::halfedge::HalfEdgeMesh;
use super::index::{MeshIndex, VertexKey};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertex positions and polygon loops.
///
/// Vertex keys follow the position order, so loop entries are both indices
/// into `vertices` and the keys of the resulting mesh.
///
/// # Example
/// ```
/// use meshwork::mesh::{build_from_polygons, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3]];
///
/// let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 4);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_polygons<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[Vec<usize>],
) -> Result<HalfEdgeMesh<I>> {
    let mut mesh = HalfEdgeMesh::new();

    let keys: Vec<VertexKey<I>> = vertices
        .iter()
        .map(|&pos| mesh.add_vertex(pos, Attributes::new()))
        .collect::<Result<_>>()?;

    for (fi, face) in faces.iter().enumerate() {
        let mut loop_ = Vec::with_capacity(face.len());
        for &vi in face {
            let key = keys.get(vi).copied().ok_or_else(|| {
                MeshError::topology(format!("face {} references invalid vertex index {}", fi, vi))
            })?;
            loop_.push(key);
        }
        mesh.add_face(&loop_, Attributes::new())?;
    }

    Ok(mesh)
}

/// Build a half-edge mesh from vertex positions and triangles.
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    let loops: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
    build_from_polygons(vertices, &loops)
}

/// Convert a half-edge mesh to positions and index loops.
///
/// Indices refer to the position list, which follows the mesh's vertex
/// iteration order (see [`HalfEdgeMesh::key_index`]).
pub fn to_vertices_and_faces<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let key_index = mesh.key_index();
    let vertices: Vec<Point3<f64>> = mesh.vertices().map(|(_, v)| v.position).collect();
    let faces: Vec<Vec<usize>> = mesh
        .faces()
        .map(|(_, f)| f.vertices.iter().map(|v| key_index[v]).collect())
        .collect();
    (vertices, faces)
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// See [`build_from_polygons`].
    pub fn from_vertices_and_faces(vertices: &[Point3<f64>], faces: &[Vec<usize>]) -> Result<Self> {
        build_from_polygons(vertices, faces)
    }

    /// See [`to_vertices_and_faces`].
    pub fn to_vertices_and_faces(&self) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
        to_vertices_and_faces(self)
    }

    /// Take a snapshot of the mesh, keys and attributes included.
    pub fn to_data(&self) -> MeshData {
        MeshData {
            vertices: self
                .vertices()
                .map(|(k, v)| VertexData {
                    key: k.index(),
                    position: [v.position.x, v.position.y, v.position.z],
                    attributes: v.attributes.clone(),
                })
                .collect(),
            faces: self
                .faces()
                .map(|(k, f)| FaceData {
                    key: k.index(),
                    vertices: f.vertices.iter().map(|v| v.index()).collect(),
                    attributes: f.attributes.clone(),
                })
                .collect(),
            default_vertex_attributes: self.default_vertex_attributes.clone(),
            default_face_attributes: self.default_face_attributes.clone(),
        }
    }

    /// Rebuild a mesh from a snapshot, keeping the original keys.
    pub fn from_data(data: &MeshData) -> Result<Self> {
        let mut mesh = Self::new();
        mesh.update_default_vertex_attributes(data.default_vertex_attributes.clone());
        mesh.update_default_face_attributes(data.default_face_attributes.clone());

        for v in &data.vertices {
            let [x, y, z] = v.position;
            mesh.add_vertex_with_key(v.key, Point3::new(x, y, z), v.attributes.clone())?;
        }
        for f in &data.faces {
            let loop_: Vec<VertexKey<I>> = f
                .vertices
                .iter()
                .map(|&k| VertexKey::try_new(k).ok_or(MeshError::VertexNotFound(k)))
                .collect::<Result<_>>()?;
            mesh.add_face_with_key(f.key, &loop_, f.attributes.clone())?;
        }
        Ok(mesh)
    }

    /// Encode a snapshot as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_data())?)
    }

    /// Decode a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: MeshData = serde_json::from_str(json)?;
        Self::from_data(&data)
    }
}

/// Serializable snapshot of a mesh.
///
/// This is the payload handed to collaborators that move meshes between
/// processes; it is independent of the index type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Vertices in key order.
    pub vertices: Vec<VertexData>,
    /// Faces in key order.
    pub faces: Vec<FaceData>,
    /// Default vertex attributes.
    #[serde(default)]
    pub default_vertex_attributes: Attributes,
    /// Default face attributes.
    #[serde(default)]
    pub default_face_attributes: Attributes,
}

/// A vertex record in a [`MeshData`] snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexData {
    /// The vertex key.
    pub key: usize,
    /// Position as `[x, y, z]`.
    pub position: [f64; 3],
    /// Attributes set on the vertex.
    #[serde(default)]
    pub attributes: Attributes,
}

/// A face record in a [`MeshData`] snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceData {
    /// The face key.
    pub key: usize,
    /// The face loop as vertex keys.
    pub vertices: Vec<usize>,
    /// Attributes set on the face.
    #[serde(default)]
    pub attributes: Attributes,
}
