//! Procedural meshes for tests, benchmarks and the CLI.

use nalgebra::Point3;

use super::builder::build_from_polygons;
use super::halfedge::HalfEdgeMesh;
use super::index::MeshIndex;
use crate::error::{MeshError, Result};

/// A planar grid of `nx` by `ny` quads in the XY plane.
///
/// Vertices are numbered row by row, so the vertex at column `i` and row `j`
/// has key `j * (nx + 1) + i`. Faces are counter-clockwise seen from +Z.
pub fn grid<I: MeshIndex>(nx: usize, ny: usize, spacing: f64) -> Result<HalfEdgeMesh<I>> {
    let vertices = grid_vertices(nx, ny, spacing)?;
    let mut faces = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let [v00, v10, v11, v01] = cell(nx, i, j);
            faces.push(vec![v00, v10, v11, v01]);
        }
    }
    build_from_polygons(&vertices, &faces)
}

/// Like [`grid`], with each quad cut into two triangles along its
/// `(i, j) -> (i + 1, j + 1)` diagonal.
pub fn triangulated_grid<I: MeshIndex>(nx: usize, ny: usize, spacing: f64) -> Result<HalfEdgeMesh<I>> {
    let vertices = grid_vertices(nx, ny, spacing)?;
    let mut faces = Vec::with_capacity(nx * ny * 2);
    for j in 0..ny {
        for i in 0..nx {
            let [v00, v10, v11, v01] = cell(nx, i, j);
            faces.push(vec![v00, v10, v11]);
            faces.push(vec![v00, v11, v01]);
        }
    }
    build_from_polygons(&vertices, &faces)
}

fn grid_vertices(nx: usize, ny: usize, spacing: f64) -> Result<Vec<Point3<f64>>> {
    if nx == 0 {
        return Err(MeshError::invalid_param("nx", nx, "must be at least 1"));
    }
    if ny == 0 {
        return Err(MeshError::invalid_param("ny", ny, "must be at least 1"));
    }
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(MeshError::invalid_param("spacing", spacing, "must be positive and finite"));
    }

    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
        }
    }
    Ok(vertices)
}

#[inline]
fn cell(nx: usize, i: usize, j: usize) -> [usize; 4] {
    let v00 = j * (nx + 1) + i;
    let v10 = v00 + 1;
    let v01 = v00 + (nx + 1);
    let v11 = v01 + 1;
    [v00, v10, v11, v01]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_counts() {
        let mesh: HalfEdgeMesh = grid(2, 2, 1.0).unwrap();
        assert_eq!(mesh.num_vertices(), 9);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_edges(), 12);
        assert!(mesh.is_valid());
        assert!(!mesh.is_triangle_mesh());
    }

    #[test]
    fn test_triangulated_grid_counts() {
        let mesh: HalfEdgeMesh = triangulated_grid(3, 2, 0.5).unwrap();
        assert_eq!(mesh.num_vertices(), 12);
        assert_eq!(mesh.num_faces(), 12);
        assert!(mesh.is_triangle_mesh());
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_grid_rejects_bad_parameters() {
        assert!(grid::<u32>(0, 2, 1.0).is_err());
        assert!(grid::<u32>(2, 2, 0.0).is_err());
        assert!(grid::<u32>(2, 2, f64::INFINITY).is_err());
    }
}
