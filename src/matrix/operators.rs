//! Operator builders.
//!
//! Every builder translates topology (and, for the cotangent Laplacian and
//! the gradient, geometry) into a matrix in the format selected by
//! [`OperatorOptions::format`]. Mesh builders number vertices through
//! [`HalfEdgeMesh::key_index`], recomputed on every call, so row `i` belongs
//! to the `i`-th vertex in iteration order.
//!
//! # Builders
//!
//! | Operator | Index-level | Mesh |
//! |---|---|---|
//! | adjacency | [`adjacency_matrix`] | [`mesh_adjacency_matrix`] |
//! | degree | [`degree_matrix`] | [`mesh_degree_matrix`] |
//! | edge incidence | [`connectivity_matrix`] | [`mesh_connectivity_matrix`] |
//! | uniform Laplacian | [`laplacian_matrix`] | [`mesh_laplacian_matrix`] |
//! | face-vertex | [`face_matrix`] | [`mesh_face_matrix`] |
//! | cotangent Laplacian | | [`trimesh_cotangent_laplacian_matrix`] |
//! | gradient | [`grad`] | [`trimesh_gradient_matrix`] |
//!
//! # Example
//!
//! ```
//! use meshwork::prelude::*;
//! use meshwork::matrix::{mesh_laplacian_matrix, OperatorOptions, MatrixFormat};
//!
//! let mesh: HalfEdgeMesh = meshwork::mesh::primitives::grid(2, 2, 1.0).unwrap();
//! let options = OperatorOptions::default().with_format(MatrixFormat::Csr);
//! let l = mesh_laplacian_matrix(&mesh, &options).unwrap();
//!
//! assert_eq!(l.nrows(), 9);
//! assert!(l.row_sums().iter().all(|s| s.abs() < 1e-12));
//! ```

use log::{trace, warn};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use super::sparse::{CooMatrix, Matrix, MatrixFormat};
use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexKey};

/// A triangle corner whose sine falls below this is degenerate.
const DEGENERATE_EPSILON: f64 = 1e-10;

/// What to do when a formula meets a zero-area triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateHandling {
    /// Fail with [`MeshError::DegenerateGeometry`].
    #[default]
    Error,
    /// Use a zero weight and log a warning.
    Zero,
}

/// Options for operator assembly.
#[derive(Debug, Clone)]
pub struct OperatorOptions {
    /// Storage format of the result.
    pub format: MatrixFormat,

    /// Whether to compute per-edge weights in parallel (default: true).
    pub parallel: bool,

    /// Handling of degenerate triangles.
    pub degenerate: DegenerateHandling,

    /// Row-normalize the uniform Laplacian (default: true). When false the
    /// combinatorial form is built: degree on the diagonal, -1 per neighbour.
    pub normalize: bool,
}

impl Default for OperatorOptions {
    fn default() -> Self {
        Self {
            format: MatrixFormat::Csr,
            parallel: true,
            degenerate: DegenerateHandling::Error,
            normalize: true,
        }
    }
}

impl OperatorOptions {
    /// Set the storage format.
    pub fn with_format(mut self, format: MatrixFormat) -> Self {
        self.format = format;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the handling of degenerate triangles.
    pub fn with_degenerate(mut self, degenerate: DegenerateHandling) -> Self {
        self.degenerate = degenerate;
        self
    }

    /// Set whether the uniform Laplacian is row-normalized.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

// ==================== Index-level builders ====================

/// Vertex adjacency: entry `(i, j)` is 1 for every `j` in `adjacency[i]`.
pub fn adjacency_matrix(adjacency: &[Vec<usize>], options: &OperatorOptions) -> Result<Matrix> {
    let n = adjacency.len();
    let nnz = adjacency.iter().map(Vec::len).sum();
    let mut coo = CooMatrix::with_capacity(n, n, nnz);
    for (i, nbrs) in adjacency.iter().enumerate() {
        for &j in nbrs {
            coo.push(i, j, 1.0)?;
        }
    }
    Ok(options.format.assemble(coo))
}

/// Diagonal matrix of neighbour counts.
pub fn degree_matrix(adjacency: &[Vec<usize>], options: &OperatorOptions) -> Result<Matrix> {
    let n = adjacency.len();
    let mut coo = CooMatrix::with_capacity(n, n, n);
    for (i, nbrs) in adjacency.iter().enumerate() {
        coo.push(i, i, nbrs.len() as f64)?;
    }
    Ok(options.format.assemble(coo))
}

/// Edge incidence matrix: one row per edge `(u, v)` with +1 in column `u`
/// and -1 in column `v`.
pub fn connectivity_matrix(
    edges: &[(usize, usize)],
    num_vertices: usize,
    options: &OperatorOptions,
) -> Result<Matrix> {
    let mut coo = CooMatrix::with_capacity(edges.len(), num_vertices, 2 * edges.len());
    for (row, &(u, v)) in edges.iter().enumerate() {
        coo.push(row, u, 1.0)?;
        coo.push(row, v, -1.0)?;
    }
    Ok(options.format.assemble(coo))
}

/// Uniform-weight Laplacian.
///
/// With [`OperatorOptions::normalize`] set (the default) the diagonal is 1
/// and every neighbour gets `-1 / degree(i)`. Otherwise the combinatorial
/// Laplacian `D - A` is built: `degree(i)` on the diagonal and -1 for every
/// neighbour. Either way every row sums to zero, and the row of a vertex
/// without neighbours is empty.
pub fn laplacian_matrix(adjacency: &[Vec<usize>], options: &OperatorOptions) -> Result<Matrix> {
    let n = adjacency.len();
    let nnz = n + adjacency.iter().map(Vec::len).sum::<usize>();
    let mut coo = CooMatrix::with_capacity(n, n, nnz);
    for (i, nbrs) in adjacency.iter().enumerate() {
        if nbrs.is_empty() {
            continue;
        }
        let degree = nbrs.len() as f64;
        let (diagonal, w) = if options.normalize {
            (1.0, -1.0 / degree)
        } else {
            (degree, -1.0)
        };
        coo.push(i, i, diagonal)?;
        for &j in nbrs {
            coo.push(i, j, w)?;
        }
    }
    Ok(options.format.assemble(coo))
}

/// Face-vertex matrix: one row per face with 1 in the column of every loop
/// vertex.
pub fn face_matrix(
    faces: &[Vec<usize>],
    num_vertices: usize,
    options: &OperatorOptions,
) -> Result<Matrix> {
    let nnz = faces.iter().map(Vec::len).sum();
    let mut coo = CooMatrix::with_capacity(faces.len(), num_vertices, nnz);
    for (row, face) in faces.iter().enumerate() {
        for &v in face {
            coo.push(row, v, 1.0)?;
        }
    }
    Ok(options.format.assemble(coo))
}

/// The gradient operator of a triangle mesh.
///
/// The result has `3 * F` rows and `V` columns. Applied to a per-vertex
/// scalar field it yields the per-face gradient, stored blocked by
/// component: rows `0..F` hold the x components, `F..2F` the y components
/// and `2F..3F` the z components.
///
/// # Errors
///
/// - [`MeshError::InvalidTopology`] if a face references a missing vertex
/// - [`MeshError::DegenerateGeometry`] for a zero-area face, unless
///   [`DegenerateHandling::Zero`] is selected, in which case the face's
///   rows stay empty
pub fn grad(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
    options: &OperatorOptions,
) -> Result<Matrix> {
    let v = vertices.len();
    let f = faces.len();
    let mut coo = CooMatrix::with_capacity(3 * f, v, 12 * f);

    for (fi, &[f0, f1, f2]) in faces.iter().enumerate() {
        let corner = |i: usize| {
            vertices.get(i).ok_or_else(|| {
                MeshError::topology(format!("face {} references invalid vertex index {}", fi, i))
            })
        };
        let (p0, p1, p2) = (corner(f0)?, corner(f1)?, corner(f2)?);

        let e01 = p1 - p0;
        let e12 = p2 - p1;
        let e20 = p0 - p2;
        let n = e12.cross(&e20);
        let a2 = n.norm();
        if a2 <= DEGENERATE_EPSILON * e01.norm() * e20.norm() {
            match options.degenerate {
                DegenerateHandling::Error => {
                    return Err(MeshError::DegenerateGeometry(format!(
                        "face {} has zero area",
                        fi
                    )));
                }
                DegenerateHandling::Zero => {
                    warn!("grad: face {} has zero area, leaving its rows empty", fi);
                    continue;
                }
            }
        }

        let unit = n / a2;
        let e01_perp: Vector3<f64> = unit.cross(&e01) / a2;
        let e20_perp: Vector3<f64> = unit.cross(&e20) / a2;

        for k in 0..3 {
            let row = k * f + fi;
            coo.push(row, f1, e20_perp[k])?;
            coo.push(row, f0, -e20_perp[k])?;
            coo.push(row, f2, e01_perp[k])?;
            coo.push(row, f0, -e01_perp[k])?;
        }
    }

    Ok(options.format.assemble(coo))
}

// ==================== Mesh builders ====================

/// Neighbour lists by vertex index.
fn index_adjacency<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vec<usize>> {
    let key_index = mesh.key_index();
    mesh.vertex_keys()
        .map(|v| {
            mesh.vertex_neighbors(v)
                .into_iter()
                .map(|nbr| key_index[&nbr])
                .collect()
        })
        .collect()
}

/// See [`adjacency_matrix`].
pub fn mesh_adjacency_matrix<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &OperatorOptions,
) -> Result<Matrix> {
    adjacency_matrix(&index_adjacency(mesh), options)
}

/// See [`degree_matrix`].
pub fn mesh_degree_matrix<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &OperatorOptions,
) -> Result<Matrix> {
    degree_matrix(&index_adjacency(mesh), options)
}

/// See [`connectivity_matrix`]. Rows follow [`HalfEdgeMesh::edges`].
pub fn mesh_connectivity_matrix<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &OperatorOptions,
) -> Result<Matrix> {
    let key_index = mesh.key_index();
    let edges: Vec<(usize, usize)> = mesh
        .edges()
        .map(|(u, v)| (key_index[&u], key_index[&v]))
        .collect();
    connectivity_matrix(&edges, mesh.num_vertices(), options)
}

/// See [`laplacian_matrix`].
pub fn mesh_laplacian_matrix<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &OperatorOptions,
) -> Result<Matrix> {
    laplacian_matrix(&index_adjacency(mesh), options)
}

/// See [`face_matrix`]. Rows follow face iteration order.
pub fn mesh_face_matrix<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &OperatorOptions,
) -> Result<Matrix> {
    let (_, faces) = mesh.to_vertices_and_faces();
    face_matrix(&faces, mesh.num_vertices(), options)
}

/// See [`grad`]. Fails with [`MeshError::InvalidTopology`] on a face that is
/// not a triangle.
pub fn trimesh_gradient_matrix<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &OperatorOptions,
) -> Result<Matrix> {
    let (vertices, loops) = mesh.to_vertices_and_faces();
    let faces = loops
        .iter()
        .map(|face| match face.as_slice() {
            &[a, b, c] => Ok([a, b, c]),
            _ => Err(MeshError::topology(format!(
                "gradient needs a triangle mesh, found a face with {} vertices",
                face.len()
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    grad(&vertices, &faces, options)
}

// ==================== Cotangent Laplacian ====================

/// The cotangent of the angle opposite the half-edge `u -> v`.
///
/// The angle is taken at the vertex following `v` in the triangle left of
/// `u -> v`. A boundary half-edge has no opposite angle and yields 0.
///
/// # Errors
///
/// - [`MeshError::EdgeNotFound`] if `(u, v)` is not a half-edge
/// - [`MeshError::InvalidTopology`] if the face is not a triangle
/// - [`MeshError::DegenerateGeometry`] for a zero-area triangle with
///   [`DegenerateHandling::Error`]
pub fn trimesh_edge_cotangent<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    u: VertexKey<I>,
    v: VertexKey<I>,
    degenerate: DegenerateHandling,
) -> Result<f64> {
    let face = mesh.halfedge(u, v).ok_or(MeshError::EdgeNotFound {
        u: u.index(),
        v: v.index(),
    })?;
    let Some(f) = face else {
        return Ok(0.0);
    };

    let loop_ = mesh.face(f).ok_or(MeshError::FaceNotFound(f.index()))?;
    if loop_.len() != 3 {
        return Err(MeshError::topology(format!(
            "face {} has {} vertices; cotangent weights need a triangle mesh",
            f,
            loop_.len()
        )));
    }
    let w = loop_
        .vertex_after(v)
        .ok_or_else(|| MeshError::topology(format!("vertex {} is not in face {}", v, f)))?;

    let pw = mesh.position(w)?;
    let wu = mesh.position(u)? - pw;
    let wv = mesh.position(v)? - pw;
    let cross_norm = wu.cross(&wv).norm();

    if cross_norm <= DEGENERATE_EPSILON * wu.norm() * wv.norm() {
        return match degenerate {
            DegenerateHandling::Error => Err(MeshError::DegenerateGeometry(format!(
                "face {} is degenerate opposite edge ({}, {})",
                f, u, v
            ))),
            DegenerateHandling::Zero => {
                warn!("face {} is degenerate opposite edge ({}, {}); using weight 0", f, u, v);
                Ok(0.0)
            }
        };
    }

    Ok(wu.dot(&wv) / cross_norm)
}

/// The cotangents opposite `u -> v` and `v -> u`.
pub fn trimesh_edge_cotangents<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    u: VertexKey<I>,
    v: VertexKey<I>,
    degenerate: DegenerateHandling,
) -> Result<(f64, f64)> {
    Ok((
        trimesh_edge_cotangent(mesh, u, v, degenerate)?,
        trimesh_edge_cotangent(mesh, v, u, degenerate)?,
    ))
}

/// The Laplacian of a triangle mesh with cotangent weights.
///
/// For every edge `(u, v)` both off-diagonal entries hold half the sum of
/// the cotangents opposite the edge (one of them is 0 on the boundary). The
/// diagonal holds the negated sum of the row's off-diagonal entries, so
/// every row sums to zero.
///
/// # Errors
///
/// - [`MeshError::InvalidTopology`] if any face is not a triangle
/// - [`MeshError::DegenerateGeometry`] for a zero-area triangle with
///   [`DegenerateHandling::Error`]
pub fn trimesh_cotangent_laplacian_matrix<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &OperatorOptions,
) -> Result<Matrix> {
    if let Some((f, face)) = mesh.faces().find(|(_, face)| face.len() != 3) {
        return Err(MeshError::topology(format!(
            "face {} has {} vertices; cotangent Laplacian needs a triangle mesh",
            f,
            face.len()
        )));
    }

    let key_index = mesh.key_index();
    let edges: Vec<(VertexKey<I>, VertexKey<I>)> = mesh.edges().collect();

    let cotangents: Vec<(f64, f64)> = if options.parallel {
        edges
            .par_iter()
            .map(|&(u, v)| trimesh_edge_cotangents(mesh, u, v, options.degenerate))
            .collect::<Result<_>>()?
    } else {
        edges
            .iter()
            .map(|&(u, v)| trimesh_edge_cotangents(mesh, u, v, options.degenerate))
            .collect::<Result<_>>()?
    };

    let n = mesh.num_vertices();
    let mut diagonal = vec![0.0; n];
    let mut coo = CooMatrix::with_capacity(n, n, 2 * edges.len() + n);

    for (&(u, v), &(a, b)) in edges.iter().zip(&cotangents) {
        let (i, j) = (key_index[&u], key_index[&v]);
        let weight = 0.5 * (a + b);
        trace!("cotangent weight ({}, {}) = {}", u, v, weight);
        coo.push(i, j, weight)?;
        coo.push(j, i, weight)?;
        diagonal[i] -= weight;
        diagonal[j] -= weight;
    }
    for (i, d) in diagonal.into_iter().enumerate() {
        coo.push(i, i, d)?;
    }

    Ok(options.format.assemble(coo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, primitives, Attributes};
    use nalgebra::DVector;

    fn vk(i: usize) -> VertexKey {
        VertexKey::new(i)
    }

    /// Unit square cut along (0, 3): faces [0, 1, 3] and [0, 3, 2].
    fn split_square() -> HalfEdgeMesh {
        primitives::triangulated_grid(1, 1, 1.0).unwrap()
    }

    #[test]
    fn test_adjacency_and_degree() {
        let mesh = split_square();
        let options = OperatorOptions::default().with_format(MatrixFormat::Dense);
        let a = mesh_adjacency_matrix(&mesh, &options).unwrap().to_dense();
        let d = mesh_degree_matrix(&mesh, &options).unwrap().to_dense();

        assert_eq!(a, a.transpose());
        assert_eq!(a.sum(), 2.0 * mesh.num_edges() as f64);
        assert_eq!(a[(0, 3)], 1.0);
        assert_eq!(a[(1, 2)], 0.0);
        for i in 0..4 {
            assert_eq!(d[(i, i)], a.row(i).sum());
        }
    }

    #[test]
    fn test_connectivity_matrix() {
        let mesh = split_square();
        let c = mesh_connectivity_matrix(&mesh, &OperatorOptions::default()).unwrap();
        assert_eq!(c.nrows(), 5);
        assert_eq!(c.ncols(), 4);
        // Each row is an edge: +1 and -1
        assert!(c.row_sums().iter().all(|s| *s == 0.0));
        let dense = c.to_dense();
        for row in dense.row_iter() {
            assert_eq!(row.iter().filter(|x| **x == 1.0).count(), 1);
            assert_eq!(row.iter().filter(|x| **x == -1.0).count(), 1);
        }
    }

    #[test]
    fn test_uniform_laplacian_rows() {
        let mesh: HalfEdgeMesh = primitives::grid(2, 2, 1.0).unwrap();
        let l = mesh_laplacian_matrix(&mesh, &OperatorOptions::default()).unwrap();
        for s in l.row_sums().iter() {
            assert!(s.abs() < 1e-12);
        }
        // Centre vertex 4 has four neighbours
        assert_eq!(l.get(4, 4), 1.0);
        assert!((l.get(4, 1) + 0.25).abs() < 1e-12);
        // Corner vertex 0 has two
        assert!((l.get(0, 1) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_combinatorial_laplacian() {
        let mesh: HalfEdgeMesh = primitives::grid(2, 2, 1.0).unwrap();
        let options = OperatorOptions::default().with_normalize(false);
        let l = mesh_laplacian_matrix(&mesh, &options).unwrap().to_dense();
        let a = mesh_adjacency_matrix(&mesh, &options).unwrap().to_dense();
        let d = mesh_degree_matrix(&mesh, &options).unwrap().to_dense();

        assert_eq!(l, &d - &a);
        assert_eq!(l, l.transpose());
        assert_eq!(l[(4, 4)], 4.0);
        assert_eq!(l[(0, 0)], 2.0);
        assert_eq!(l[(0, 1)], -1.0);
        for i in 0..9 {
            assert_eq!(l.row(i).sum(), 0.0);
        }
    }

    #[test]
    fn test_laplacian_forms_share_pattern() {
        let adjacency = vec![vec![1, 2], vec![0], vec![0], vec![]];
        let normalized = laplacian_matrix(&adjacency, &OperatorOptions::default()).unwrap();
        let combinatorial =
            laplacian_matrix(&adjacency, &OperatorOptions::default().with_normalize(false))
                .unwrap();

        assert_eq!(normalized.get(0, 0), 1.0);
        assert_eq!(normalized.get(0, 1), -0.5);
        assert_eq!(combinatorial.get(0, 0), 2.0);
        assert_eq!(combinatorial.get(0, 1), -1.0);
        for m in [&normalized, &combinatorial] {
            assert!(m.row_sums().iter().all(|s| s.abs() < 1e-12));
            assert_eq!(m.get(3, 3), 0.0);
        }
    }

    #[test]
    fn test_uniform_laplacian_isolated_vertex() {
        let mut mesh = split_square();
        mesh.add_vertex(Point3::new(5.0, 5.0, 0.0), Attributes::new())
            .unwrap();
        let l = mesh_laplacian_matrix(&mesh, &OperatorOptions::default())
            .unwrap()
            .to_dense();
        assert_eq!(l.nrows(), 5);
        assert!(l.row(4).iter().all(|x| *x == 0.0));
        assert!(l.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_index_builders_reject_bad_indices() {
        let adjacency = vec![vec![1], vec![2]];
        assert!(adjacency_matrix(&adjacency, &OperatorOptions::default()).is_err());
        assert!(face_matrix(&[vec![0, 1, 3]], 3, &OperatorOptions::default()).is_err());
    }

    #[test]
    fn test_face_matrix_centroids() {
        let mesh: HalfEdgeMesh = primitives::grid(2, 1, 1.0).unwrap();
        let f = mesh_face_matrix(&mesh, &OperatorOptions::default()).unwrap();
        assert_eq!((f.nrows(), f.ncols()), (2, 6));

        let x = DVector::from_iterator(6, mesh.vertices().map(|(_, v)| v.position.x));
        let sums = f.mul_vec(&x).unwrap();
        let counts = f.row_sums();
        assert!((sums[0] / counts[0] - 0.5).abs() < 1e-12);
        assert!((sums[1] / counts[1] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_edge_cotangents() {
        let mesh = split_square();
        let deg = DegenerateHandling::Error;
        // Right angles opposite the diagonal
        let (a, b) = trimesh_edge_cotangents(&mesh, vk(0), vk(3), deg).unwrap();
        assert!(a.abs() < 1e-12 && b.abs() < 1e-12);
        // 45 degrees opposite a boundary edge, nothing on the outside
        assert!((trimesh_edge_cotangent(&mesh, vk(0), vk(1), deg).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(trimesh_edge_cotangent(&mesh, vk(1), vk(0), deg).unwrap(), 0.0);
        assert!(matches!(
            trimesh_edge_cotangent(&mesh, vk(1), vk(2), deg),
            Err(MeshError::EdgeNotFound { .. })
        ));
    }

    #[test]
    fn test_cotangent_laplacian_square() {
        let mesh = split_square();
        for parallel in [true, false] {
            let options = OperatorOptions::default()
                .with_parallel(parallel)
                .with_format(MatrixFormat::Dense);
            let l = trimesh_cotangent_laplacian_matrix(&mesh, &options)
                .unwrap()
                .to_dense();

            assert!((&l - l.transpose()).norm() < 1e-12);
            assert!((l[(0, 1)] - 0.5).abs() < 1e-12);
            assert!(l[(0, 3)].abs() < 1e-12);
            assert!((l[(0, 0)] + 1.0).abs() < 1e-12);
            for i in 0..4 {
                assert!(l.row(i).sum().abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_small_scale_mesh_is_not_degenerate() {
        let mesh: HalfEdgeMesh = primitives::triangulated_grid(2, 2, 1e-6).unwrap();
        let unit: HalfEdgeMesh = primitives::triangulated_grid(2, 2, 1.0).unwrap();
        let options = OperatorOptions::default().with_format(MatrixFormat::Dense);

        // Cotangents are scale invariant
        let l = trimesh_cotangent_laplacian_matrix(&mesh, &options).unwrap().to_dense();
        let expected = trimesh_cotangent_laplacian_matrix(&unit, &options)
            .unwrap()
            .to_dense();
        assert!((l - expected).amax() < 1e-9);

        let g = trimesh_gradient_matrix(&mesh, &options).unwrap();
        let field = DVector::from_iterator(
            mesh.num_vertices(),
            mesh.vertices().map(|(_, v)| 2.0 * v.position.x),
        );
        let gradient = g.mul_vec(&field).unwrap();
        let f = mesh.num_faces();
        for fi in 0..f {
            assert!((gradient[fi] - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cotangent_laplacian_rejects_quads() {
        let mesh: HalfEdgeMesh = primitives::grid(1, 1, 1.0).unwrap();
        let result = trimesh_cotangent_laplacian_matrix(&mesh, &OperatorOptions::default());
        assert!(matches!(result, Err(MeshError::InvalidTopology(_))));
    }

    #[test]
    fn test_cotangent_laplacian_degenerate() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        let result = trimesh_cotangent_laplacian_matrix(&mesh, &OperatorOptions::default());
        assert!(matches!(result, Err(MeshError::DegenerateGeometry(_))));

        let options = OperatorOptions::default().with_degenerate(DegenerateHandling::Zero);
        let l = trimesh_cotangent_laplacian_matrix(&mesh, &options).unwrap();
        assert!(l.to_dense().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_grad_of_linear_field() {
        let mesh = split_square();
        let g = trimesh_gradient_matrix(&mesh, &OperatorOptions::default()).unwrap();
        let f = mesh.num_faces();
        assert_eq!((g.nrows(), g.ncols()), (3 * f, 4));

        // f(x, y) = 2x + 3y has gradient (2, 3, 0) on every face
        let field = DVector::from_iterator(
            4,
            mesh.vertices()
                .map(|(_, v)| 2.0 * v.position.x + 3.0 * v.position.y),
        );
        let gradient = g.mul_vec(&field).unwrap();
        for fi in 0..f {
            assert!((gradient[fi] - 2.0).abs() < 1e-12);
            assert!((gradient[f + fi] - 3.0).abs() < 1e-12);
            assert!(gradient[2 * f + fi].abs() < 1e-12);
        }
    }

    #[test]
    fn test_grad_degenerate_face() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        ];
        let faces = [[0, 1, 2]];
        assert!(matches!(
            grad(&vertices, &faces, &OperatorOptions::default()),
            Err(MeshError::DegenerateGeometry(_))
        ));
        let options = OperatorOptions::default().with_degenerate(DegenerateHandling::Zero);
        let g = grad(&vertices, &faces, &options).unwrap();
        assert_eq!((g.nrows(), g.ncols()), (3, 3));
        assert!(g.to_dense().iter().all(|x| *x == 0.0));
        assert!(grad(&vertices, &[[0, 1, 7]], &options).is_err());
    }
}
