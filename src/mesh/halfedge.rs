//! Half-edge mesh data structure.
//!
//! This module provides a half-edge representation for polygon meshes in
//! which half-edges are not stored as separate records. Instead the mesh keeps
//! an index `halfedge[u][v] -> Option<FaceKey>` derived from the face loops:
//!
//! - For every face loop `[v0, v1, ..., vk]` the half-edge `(vi, vi+1)` maps to
//!   that face
//! - The reverse direction of every loop half-edge is present as well, mapping
//!   to `None` when no face lies on that side (a **boundary** half-edge)
//! - An edge never has both directions mapped to `None`
//!
//! The index is kept in sync incrementally by every mutation, so adjacency
//! queries never rescan the face table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;
use nalgebra::{Point3, Vector3};

use super::attributes::{self, AttributeValue, Attributes};
use super::index::{FaceKey, KeyRegistry, MeshIndex, VertexKey};
use crate::error::{MeshError, Result};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Attributes set on this vertex. Missing names fall back to the mesh defaults.
    pub attributes: Attributes,
}

impl Vertex {
    /// Create a new vertex at the given position with no attributes.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            attributes: Attributes::new(),
        }
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Face<I: MeshIndex = u32> {
    /// The face loop: vertex keys in cyclic order.
    pub vertices: Vec<VertexKey<I>>,

    /// Attributes set on this face. Missing names fall back to the mesh defaults.
    pub attributes: Attributes,
}

impl<I: MeshIndex> Face<I> {
    /// Number of vertices in the loop.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the loop is empty (never true for a face stored in a mesh).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Position of `v` in the loop.
    pub fn position_of(&self, v: VertexKey<I>) -> Option<usize> {
        self.vertices.iter().position(|&x| x == v)
    }

    /// The loop vertex following `v`, wrapping around.
    pub fn vertex_after(&self, v: VertexKey<I>) -> Option<VertexKey<I>> {
        let n = self.vertices.len();
        self.position_of(v).map(|i| self.vertices[(i + 1) % n])
    }

    /// The loop vertex preceding `v`, wrapping around.
    pub fn vertex_before(&self, v: VertexKey<I>) -> Option<VertexKey<I>> {
        let n = self.vertices.len();
        self.position_of(v).map(|i| self.vertices[(i + n - 1) % n])
    }

    /// Iterate over the directed half-edges of the loop.
    pub fn halfedges(&self) -> impl Iterator<Item = (VertexKey<I>, VertexKey<I>)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

type HalfEdgeRow<I> = BTreeMap<VertexKey<I>, Option<FaceKey<I>>>;

/// A half-edge mesh for general polygon meshes.
///
/// Vertices and faces are stored in ordered maps, so iteration order is key
/// order. Since keys are allocated monotonically this is also insertion order.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    /// All vertices in the mesh.
    pub(crate) vertices: BTreeMap<VertexKey<I>, Vertex>,

    /// All faces in the mesh.
    pub(crate) faces: BTreeMap<FaceKey<I>, Face<I>>,

    /// The half-edge index: `halfedge[u][v]` is the face left of `u -> v`.
    pub(crate) halfedge: BTreeMap<VertexKey<I>, HalfEdgeRow<I>>,

    pub(crate) vertex_registry: KeyRegistry<I>,
    pub(crate) face_registry: KeyRegistry<I>,

    pub(crate) default_vertex_attributes: Attributes,
    pub(crate) default_face_attributes: Attributes,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: BTreeMap::new(),
            faces: BTreeMap::new(),
            halfedge: BTreeMap::new(),
            vertex_registry: KeyRegistry::new(),
            face_registry: KeyRegistry::new(),
            default_vertex_attributes: Attributes::new(),
            default_face_attributes: Attributes::new(),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get the number of directed half-edges, boundary half-edges included.
    pub fn num_halfedges(&self) -> usize {
        self.halfedge.values().map(|row| row.len()).sum()
    }

    /// Get the number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.edges().count()
    }

    /// Get a vertex by key.
    #[inline]
    pub fn vertex(&self, v: VertexKey<I>) -> Option<&Vertex> {
        self.vertices.get(&v)
    }

    /// Get a face by key.
    #[inline]
    pub fn face(&self, f: FaceKey<I>) -> Option<&Face<I>> {
        self.faces.get(&f)
    }

    /// Whether the vertex exists.
    #[inline]
    pub fn has_vertex(&self, v: VertexKey<I>) -> bool {
        self.vertices.contains_key(&v)
    }

    /// Whether the face exists.
    #[inline]
    pub fn has_face(&self, f: FaceKey<I>) -> bool {
        self.faces.contains_key(&f)
    }

    /// Get the position of a vertex.
    pub fn position(&self, v: VertexKey<I>) -> Result<&Point3<f64>> {
        self.vertices
            .get(&v)
            .map(|vertex| &vertex.position)
            .ok_or(MeshError::VertexNotFound(v.index()))
    }

    /// Set the position of a vertex.
    pub fn set_position(&mut self, v: VertexKey<I>, position: Point3<f64>) -> Result<()> {
        check_finite(&position)?;
        let vertex = self
            .vertices
            .get_mut(&v)
            .ok_or(MeshError::VertexNotFound(v.index()))?;
        vertex.position = position;
        Ok(())
    }

    /// Get the loop of a face.
    pub fn face_vertices(&self, f: FaceKey<I>) -> Result<&[VertexKey<I>]> {
        self.faces
            .get(&f)
            .map(|face| face.vertices.as_slice())
            .ok_or(MeshError::FaceNotFound(f.index()))
    }

    /// The directed half-edges of a face loop, in loop order.
    pub fn face_halfedges(&self, f: FaceKey<I>) -> Result<Vec<(VertexKey<I>, VertexKey<I>)>> {
        self.faces
            .get(&f)
            .map(|face| face.halfedges().collect())
            .ok_or(MeshError::FaceNotFound(f.index()))
    }

    /// The key the next call to [`add_vertex`](Self::add_vertex) will assign.
    pub fn next_vertex_key(&self) -> usize {
        self.vertex_registry.peek()
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex keys.
    pub fn vertex_keys(&self) -> impl Iterator<Item = VertexKey<I>> + '_ {
        self.vertices.keys().copied()
    }

    /// Iterate over all vertices with their keys.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey<I>, &Vertex)> + '_ {
        self.vertices.iter().map(|(&k, v)| (k, v))
    }

    /// Iterate over all face keys.
    pub fn face_keys(&self) -> impl Iterator<Item = FaceKey<I>> + '_ {
        self.faces.keys().copied()
    }

    /// Iterate over all faces with their keys.
    pub fn faces(&self) -> impl Iterator<Item = (FaceKey<I>, &Face<I>)> + '_ {
        self.faces.iter().map(|(&k, f)| (k, f))
    }

    /// Iterate over all directed half-edges with the face on their left.
    pub fn halfedges(
        &self,
    ) -> impl Iterator<Item = (VertexKey<I>, VertexKey<I>, Option<FaceKey<I>>)> + '_ {
        self.halfedge
            .iter()
            .flat_map(|(&u, row)| row.iter().map(move |(&v, &f)| (u, v, f)))
    }

    /// Iterate over undirected edges, each reported once.
    ///
    /// The index is scanned in key order and every edge is reported in the
    /// direction it is first seen. Since both directions of an edge are always
    /// indexed, that is `(u, v)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (VertexKey<I>, VertexKey<I>)> + '_ {
        self.halfedge.iter().flat_map(move |(&u, row)| {
            row.keys()
                .copied()
                .filter(move |&v| u < v || !self.has_halfedge(v, u))
                .map(move |v| (u, v))
        })
    }

    // ==================== Topology Queries ====================

    /// Look up a directed half-edge.
    ///
    /// Returns `None` if `(u, v)` is not in the index, `Some(None)` for a
    /// boundary half-edge and `Some(Some(f))` for a half-edge of face `f`.
    #[inline]
    pub fn halfedge(&self, u: VertexKey<I>, v: VertexKey<I>) -> Option<Option<FaceKey<I>>> {
        self.halfedge.get(&u).and_then(|row| row.get(&v)).copied()
    }

    /// The face left of `u -> v`, if any.
    #[inline]
    pub fn halfedge_face(&self, u: VertexKey<I>, v: VertexKey<I>) -> Option<FaceKey<I>> {
        self.halfedge(u, v).flatten()
    }

    /// Whether `(u, v)` is in the half-edge index.
    #[inline]
    pub fn has_halfedge(&self, u: VertexKey<I>, v: VertexKey<I>) -> bool {
        self.halfedge(u, v).is_some()
    }

    /// Whether `u` and `v` are connected by an edge in either direction.
    pub fn has_edge(&self, u: VertexKey<I>, v: VertexKey<I>) -> bool {
        self.has_halfedge(u, v) || self.has_halfedge(v, u)
    }

    /// Whether the vertex has an outgoing half-edge with no face.
    ///
    /// Isolated vertices have no outgoing half-edges and are not on the boundary.
    pub fn is_vertex_on_boundary(&self, v: VertexKey<I>) -> bool {
        self.halfedge
            .get(&v)
            .is_some_and(|row| row.values().any(|f| f.is_none()))
    }

    /// Whether either direction of the edge has no face.
    pub fn is_edge_on_boundary(&self, u: VertexKey<I>, v: VertexKey<I>) -> bool {
        self.halfedge_face(u, v).is_none() || self.halfedge_face(v, u).is_none()
    }

    /// All vertices on the boundary, in key order.
    pub fn vertices_on_boundary(&self) -> Vec<VertexKey<I>> {
        self.vertex_keys()
            .filter(|&v| self.is_vertex_on_boundary(v))
            .collect()
    }

    /// All edges on the boundary, in the orientation reported by [`edges`](Self::edges).
    pub fn edges_on_boundary(&self) -> Vec<(VertexKey<I>, VertexKey<I>)> {
        self.edges()
            .filter(|&(u, v)| self.is_edge_on_boundary(u, v))
            .collect()
    }

    /// The neighbours of a vertex in cyclic order.
    ///
    /// The walk starts at a neighbour across a boundary half-edge when there is
    /// one and rotates through the faces around the vertex. Neighbours the walk
    /// cannot reach (e.g. around a non-manifold vertex) are appended at the end.
    /// Unknown vertices have no neighbours.
    pub fn vertex_neighbors(&self, v: VertexKey<I>) -> Vec<VertexKey<I>> {
        let Some(row) = self.halfedge.get(&v) else {
            return Vec::new();
        };
        let all: Vec<VertexKey<I>> = row.keys().copied().collect();
        if all.len() <= 1 {
            return all;
        }

        let start = row
            .iter()
            .find(|(_, f)| f.is_none())
            .map(|(&nbr, _)| nbr)
            .unwrap_or(all[0]);

        let mut ordered = Vec::with_capacity(all.len());
        ordered.push(start);

        // Rotate: the face left of (nbr -> v) gives the next neighbour as the
        // loop vertex following v.
        let mut face = self.halfedge_face(start, v);
        while let Some(f) = face {
            if ordered.len() == all.len() {
                break;
            }
            let Some(nbr) = self.faces.get(&f).and_then(|face| face.vertex_after(v)) else {
                break;
            };
            if nbr == start || ordered.contains(&nbr) {
                break;
            }
            ordered.push(nbr);
            face = self.halfedge_face(nbr, v);
        }

        for nbr in all {
            if !ordered.contains(&nbr) {
                ordered.push(nbr);
            }
        }
        ordered
    }

    /// The number of neighbours of a vertex.
    pub fn vertex_degree(&self, v: VertexKey<I>) -> usize {
        self.halfedge.get(&v).map_or(0, |row| row.len())
    }

    /// The faces around a vertex, following the cyclic neighbour order.
    pub fn vertex_faces(&self, v: VertexKey<I>) -> Vec<FaceKey<I>> {
        let mut faces = Vec::new();
        for nbr in self.vertex_neighbors(v) {
            if let Some(f) = self.halfedge_face(v, nbr) {
                if !faces.contains(&f) {
                    faces.push(f);
                }
            }
        }
        faces
    }

    /// Build the adjacency map of the mesh: vertex to cyclically ordered neighbours.
    pub fn adjacency(&self) -> BTreeMap<VertexKey<I>, Vec<VertexKey<I>>> {
        self.vertex_keys()
            .map(|v| (v, self.vertex_neighbors(v)))
            .collect()
    }

    /// Whether every face is a triangle. False for a mesh without faces.
    pub fn is_triangle_mesh(&self) -> bool {
        !self.faces.is_empty() && self.faces.values().all(|f| f.len() == 3)
    }

    /// Map each vertex key to its 0-based position in iteration order.
    ///
    /// Computed on every call: the mapping changes whenever the vertex set does.
    pub fn key_index(&self) -> HashMap<VertexKey<I>, usize> {
        self.vertex_keys().enumerate().map(|(i, k)| (k, i)).collect()
    }

    /// The inverse of [`key_index`](Self::key_index).
    pub fn index_key(&self) -> Vec<VertexKey<I>> {
        self.vertex_keys().collect()
    }

    // ==================== Geometry ====================

    /// The point at parameter `t` along `u -> v`.
    pub fn edge_point(&self, u: VertexKey<I>, v: VertexKey<I>, t: f64) -> Result<Point3<f64>> {
        let a = self.position(u)?;
        let b = self.position(v)?;
        Ok(a + (b - a) * t)
    }

    /// The vector from `u` to `v`.
    pub fn edge_vector(&self, u: VertexKey<I>, v: VertexKey<I>) -> Result<Vector3<f64>> {
        Ok(self.position(v)? - self.position(u)?)
    }

    /// The length of the edge between `u` and `v`.
    pub fn edge_length(&self, u: VertexKey<I>, v: VertexKey<I>) -> Result<f64> {
        self.edge_vector(u, v).map(|e| e.norm())
    }

    /// The centroid (vertex average) of a face.
    pub fn face_centroid(&self, f: FaceKey<I>) -> Result<Point3<f64>> {
        let loop_ = self.face_vertices(f)?;
        let mut sum = Vector3::zeros();
        for &v in loop_ {
            sum += self.position(v)?.coords;
        }
        Ok(Point3::from(sum / loop_.len() as f64))
    }

    /// The unnormalized Newell normal of a face. Its length is twice the area.
    fn newell_normal(&self, f: FaceKey<I>) -> Result<Vector3<f64>> {
        let loop_ = self.face_vertices(f)?;
        let n = loop_.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let a = self.position(loop_[i])?;
            let b = self.position(loop_[(i + 1) % n])?;
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        Ok(normal)
    }

    /// The unit normal of a face, or the zero vector for a degenerate face.
    pub fn face_normal(&self, f: FaceKey<I>) -> Result<Vector3<f64>> {
        let normal = self.newell_normal(f)?;
        Ok(normal.try_normalize(1e-12).unwrap_or_else(Vector3::zeros))
    }

    /// The area of a (planar) face.
    pub fn face_area(&self, f: FaceKey<I>) -> Result<f64> {
        Ok(0.5 * self.newell_normal(f)?.norm())
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut iter = self.vertices.values();
        let first = iter.next()?.position;
        let mut min = first;
        let mut max = first;

        for v in iter {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    // ==================== Attributes ====================

    /// The default vertex attributes.
    pub fn default_vertex_attributes(&self) -> &Attributes {
        &self.default_vertex_attributes
    }

    /// The default face attributes.
    pub fn default_face_attributes(&self) -> &Attributes {
        &self.default_face_attributes
    }

    /// Add or overwrite default vertex attributes.
    pub fn update_default_vertex_attributes(&mut self, defaults: Attributes) {
        self.default_vertex_attributes.extend(defaults);
    }

    /// Add or overwrite default face attributes.
    pub fn update_default_face_attributes(&mut self, defaults: Attributes) {
        self.default_face_attributes.extend(defaults);
    }

    /// Look up a vertex attribute, falling back to the default.
    pub fn vertex_attribute(&self, v: VertexKey<I>, name: &str) -> Option<&AttributeValue> {
        let vertex = self.vertices.get(&v)?;
        attributes::lookup(&vertex.attributes, &self.default_vertex_attributes, name)
    }

    /// Set a vertex attribute.
    pub fn set_vertex_attribute(
        &mut self,
        v: VertexKey<I>,
        name: &str,
        value: AttributeValue,
    ) -> Result<()> {
        let vertex = self
            .vertices
            .get_mut(&v)
            .ok_or(MeshError::VertexNotFound(v.index()))?;
        vertex.attributes.insert(name.to_string(), value);
        Ok(())
    }

    /// Look up a face attribute, falling back to the default.
    pub fn face_attribute(&self, f: FaceKey<I>, name: &str) -> Option<&AttributeValue> {
        let face = self.faces.get(&f)?;
        attributes::lookup(&face.attributes, &self.default_face_attributes, name)
    }

    /// Set a face attribute.
    pub fn set_face_attribute(
        &mut self,
        f: FaceKey<I>,
        name: &str,
        value: AttributeValue,
    ) -> Result<()> {
        let face = self
            .faces
            .get_mut(&f)
            .ok_or(MeshError::FaceNotFound(f.index()))?;
        face.attributes.insert(name.to_string(), value);
        Ok(())
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its key.
    pub fn add_vertex(&mut self, position: Point3<f64>, attributes: Attributes) -> Result<VertexKey<I>> {
        check_finite(&position)?;
        let key = self.vertex_registry.allocate_vertex()?;
        self.insert_vertex(key, position, attributes);
        Ok(key)
    }

    /// Add a new vertex under a caller-chosen key.
    pub fn add_vertex_with_key(
        &mut self,
        key: usize,
        position: Point3<f64>,
        attributes: Attributes,
    ) -> Result<VertexKey<I>> {
        check_finite(&position)?;
        if VertexKey::<I>::try_new(key).is_some_and(|k| self.has_vertex(k)) {
            return Err(MeshError::topology(format!("vertex {} already exists", key)));
        }
        let key = self.vertex_registry.reserve_vertex(key)?;
        self.insert_vertex(key, position, attributes);
        Ok(key)
    }

    fn insert_vertex(&mut self, key: VertexKey<I>, position: Point3<f64>, attributes: Attributes) {
        self.vertices.insert(key, Vertex { position, attributes });
        self.halfedge.insert(key, BTreeMap::new());
    }

    /// Add a face from a loop of existing vertices and return its key.
    ///
    /// A closing vertex equal to the first one is dropped. The loop must have at
    /// least three distinct vertices, and none of its half-edges may already
    /// belong to another face.
    pub fn add_face(&mut self, vertices: &[VertexKey<I>], attributes: Attributes) -> Result<FaceKey<I>> {
        let loop_ = self.validate_face_loop(vertices)?;
        let key = self.face_registry.allocate_face()?;
        self.insert_face(key, loop_, attributes);
        Ok(key)
    }

    /// Add a face under a caller-chosen key.
    pub fn add_face_with_key(
        &mut self,
        key: usize,
        vertices: &[VertexKey<I>],
        attributes: Attributes,
    ) -> Result<FaceKey<I>> {
        if FaceKey::<I>::try_new(key).is_some_and(|k| self.has_face(k)) {
            return Err(MeshError::topology(format!("face {} already exists", key)));
        }
        let loop_ = self.validate_face_loop(vertices)?;
        let key = self.face_registry.reserve_face(key)?;
        self.insert_face(key, loop_, attributes);
        Ok(key)
    }

    fn validate_face_loop(&self, vertices: &[VertexKey<I>]) -> Result<Vec<VertexKey<I>>> {
        let mut loop_ = vertices.to_vec();
        if loop_.len() > 1 && loop_.first() == loop_.last() {
            loop_.pop();
        }
        if loop_.len() < 3 {
            return Err(MeshError::topology(format!(
                "a face needs at least 3 vertices, got {}",
                loop_.len()
            )));
        }

        let mut seen = BTreeSet::new();
        for &v in &loop_ {
            if !self.has_vertex(v) {
                return Err(MeshError::VertexNotFound(v.index()));
            }
            if !seen.insert(v) {
                return Err(MeshError::topology(format!(
                    "vertex {} appears more than once in the face loop",
                    v
                )));
            }
        }

        let n = loop_.len();
        for i in 0..n {
            let (u, v) = (loop_[i], loop_[(i + 1) % n]);
            if let Some(existing) = self.halfedge_face(u, v) {
                return Err(MeshError::topology(format!(
                    "half-edge ({}, {}) already belongs to face {}",
                    u, v, existing
                )));
            }
        }
        Ok(loop_)
    }

    /// Register a validated loop and populate its half-edges.
    pub(crate) fn insert_face(&mut self, key: FaceKey<I>, loop_: Vec<VertexKey<I>>, attributes: Attributes) {
        let n = loop_.len();
        for i in 0..n {
            let (u, v) = (loop_[i], loop_[(i + 1) % n]);
            self.set_halfedge(u, v, Some(key));
            self.halfedge.entry(v).or_default().entry(u).or_insert(None);
        }
        self.faces.insert(
            key,
            Face {
                vertices: loop_,
                attributes,
            },
        );
    }

    /// Allocate a fresh face key and insert a loop that is known to be valid.
    pub(crate) fn insert_new_face(
        &mut self,
        loop_: Vec<VertexKey<I>>,
        attributes: Attributes,
    ) -> Result<FaceKey<I>> {
        let key = self.face_registry.allocate_face()?;
        self.insert_face(key, loop_, attributes);
        Ok(key)
    }

    #[inline]
    pub(crate) fn set_halfedge(&mut self, u: VertexKey<I>, v: VertexKey<I>, face: Option<FaceKey<I>>) {
        self.halfedge.entry(u).or_default().insert(v, face);
    }

    #[inline]
    pub(crate) fn remove_halfedge(&mut self, u: VertexKey<I>, v: VertexKey<I>) {
        if let Some(row) = self.halfedge.get_mut(&u) {
            row.remove(&v);
        }
    }

    pub(crate) fn face_mut(&mut self, f: FaceKey<I>) -> Option<&mut Face<I>> {
        self.faces.get_mut(&f)
    }

    /// Remove a face record without touching the half-edge index.
    pub(crate) fn take_face(&mut self, f: FaceKey<I>) -> Option<Face<I>> {
        self.faces.remove(&f)
    }

    // ==================== Deletion ====================

    /// Delete a face.
    ///
    /// Each loop half-edge becomes a boundary half-edge; edges left with no
    /// face on either side are removed from the index entirely.
    pub fn delete_face(&mut self, f: FaceKey<I>) -> Result<Face<I>> {
        let face = self.faces.remove(&f).ok_or(MeshError::FaceNotFound(f.index()))?;
        for (u, v) in face.halfedges() {
            self.set_halfedge(u, v, None);
            if self.halfedge_face(v, u).is_none() {
                self.remove_halfedge(u, v);
                self.remove_halfedge(v, u);
            }
        }
        debug!("deleted face {:?} ({} vertices)", f, face.len());
        Ok(face)
    }

    /// Delete a vertex that no face references.
    ///
    /// Fails with [`MeshError::DependentData`] if a face still uses the vertex;
    /// use [`delete_vertex_cascade`](Self::delete_vertex_cascade) to remove
    /// those faces as well.
    pub fn delete_vertex(&mut self, v: VertexKey<I>) -> Result<Vertex> {
        if !self.has_vertex(v) {
            return Err(MeshError::VertexNotFound(v.index()));
        }
        let count = self.faces.values().filter(|f| f.position_of(v).is_some()).count();
        if count > 0 {
            return Err(MeshError::DependentData {
                what: format!("vertex {:?}", v),
                count,
            });
        }

        if let Some(row) = self.halfedge.remove(&v) {
            for nbr in row.keys() {
                self.remove_halfedge(*nbr, v);
            }
        }
        let vertex = self
            .vertices
            .remove(&v)
            .ok_or(MeshError::VertexNotFound(v.index()))?;
        debug!("deleted vertex {:?}", v);
        Ok(vertex)
    }

    /// Delete a vertex together with every face that references it.
    pub fn delete_vertex_cascade(&mut self, v: VertexKey<I>) -> Result<Vertex> {
        if !self.has_vertex(v) {
            return Err(MeshError::VertexNotFound(v.index()));
        }
        let incident: Vec<FaceKey<I>> = self
            .faces
            .iter()
            .filter(|(_, face)| face.position_of(v).is_some())
            .map(|(&f, _)| f)
            .collect();
        for f in incident {
            self.delete_face(f)?;
        }
        self.delete_vertex(v)
    }

    // ==================== Validation ====================

    /// Check that the half-edge index agrees with the face loops.
    pub fn is_valid(&self) -> bool {
        // Every vertex has a row and every row belongs to a vertex
        if self.halfedge.len() != self.vertices.len()
            || self.halfedge.keys().any(|v| !self.has_vertex(*v))
        {
            return false;
        }

        // Face loops
        for (&fk, face) in &self.faces {
            if face.len() < 3 {
                return false;
            }
            let distinct: BTreeSet<_> = face.vertices.iter().collect();
            if distinct.len() != face.len() {
                return false;
            }
            for (u, v) in face.halfedges() {
                if !self.has_vertex(u) || self.halfedge_face(u, v) != Some(fk) {
                    return false;
                }
            }
        }

        // Half-edge entries
        for (u, v, f) in self.halfedges() {
            if !self.has_vertex(v) || !self.has_halfedge(v, u) {
                return false;
            }
            match f {
                Some(fk) => match self.faces.get(&fk) {
                    Some(face) if face.vertex_after(u) == Some(v) => {}
                    _ => return false,
                },
                None => {
                    if self.halfedge_face(v, u).is_none() {
                        return false;
                    }
                }
            }
        }

        true
    }
}

fn check_finite(p: &Point3<f64>) -> Result<()> {
    if p.coords.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(MeshError::InvalidGeometry(format!(
            "vertex position ({}, {}, {}) is not finite",
            p.x, p.y, p.z
        )))
    }
}
