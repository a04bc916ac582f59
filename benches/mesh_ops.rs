//! Benchmarks for mesh operations.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use meshwork::algo::{split, traversal};
use meshwork::matrix::{
    mesh_adjacency_matrix, mesh_laplacian_matrix, trimesh_cotangent_laplacian_matrix,
    OperatorOptions,
};
use meshwork::mesh::primitives::triangulated_grid;
use meshwork::prelude::*;
use nalgebra::Point3;

fn create_grid_mesh(n: usize) -> HalfEdgeMesh {
    triangulated_grid(n, n, 1.0).unwrap()
}

fn bench_mesh_construction(c: &mut Criterion) {
    c.bench_function("build_grid_10x10", |b| {
        let n = 10;
        let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
        let mut faces = Vec::with_capacity(n * n * 2);

        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }

        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + (n + 1);
                let v11 = v01 + 1;

                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        b.iter(|| {
            let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
            mesh
        });
    });
}

fn bench_mesh_traversal(c: &mut Criterion) {
    let mesh = create_grid_mesh(50);

    c.bench_function("vertex_neighbors_all", |b| {
        b.iter(|| {
            let mut count = 0;
            for v in mesh.vertex_keys() {
                count += mesh.vertex_neighbors(v).len();
            }
            count
        });
    });

    c.bench_function("connected_components_50x50", |b| {
        b.iter(|| traversal::connected_components(&mesh).len());
    });
}

fn bench_split(c: &mut Criterion) {
    let mesh = create_grid_mesh(20);
    let interior: Vec<_> = mesh
        .edges()
        .filter(|&(u, v)| !mesh.is_edge_on_boundary(u, v))
        .take(100)
        .collect();

    c.bench_function("trimesh_split_edge_100", |b| {
        b.iter(|| {
            let mut m = mesh.clone();
            for &(u, v) in &interior {
                split::trimesh_split_edge(&mut m, u, v, 0.5, false).unwrap();
            }
            m
        });
    });
}

fn bench_operators(c: &mut Criterion) {
    let mut group = c.benchmark_group("operators");

    for n in [20, 50] {
        let mesh = create_grid_mesh(n);
        let parallel = OperatorOptions::default();
        let sequential = OperatorOptions::default().sequential();

        group.bench_with_input(BenchmarkId::new("adjacency", n), &mesh, |b, m| {
            b.iter(|| mesh_adjacency_matrix(m, &parallel).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("laplacian", n), &mesh, |b, m| {
            b.iter(|| mesh_laplacian_matrix(m, &parallel).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("cotangent_parallel", n), &mesh, |b, m| {
            b.iter(|| trimesh_cotangent_laplacian_matrix(m, &parallel).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("cotangent_sequential", n), &mesh, |b, m| {
            b.iter(|| trimesh_cotangent_laplacian_matrix(m, &sequential).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_mesh_construction,
    bench_mesh_traversal,
    bench_split,
    bench_operators
);
criterion_main!(benches);
