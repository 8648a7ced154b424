//! Writer throughput for the formats the viewer ingests.
//!
//! Run with: cargo bench -p cad-io

use std::hint::black_box;

use cad_io::{read_stl, write_glb, write_stl};
use cad_types::{IndexedMesh, Vertex};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};

/// Flat grid of `n * n` quads, two triangles each.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn grid(n: u32) -> IndexedMesh {
    let mut mesh = IndexedMesh::with_capacity(((n + 1) * (n + 1)) as usize, (2 * n * n) as usize);
    for y in 0..=n {
        for x in 0..=n {
            mesh.vertices
                .push(Vertex::from_coords(f64::from(x), f64::from(y), 0.0));
        }
    }
    let row = n + 1;
    for y in 0..n {
        for x in 0..n {
            let i = y * row + x;
            mesh.faces.push([i, i + 1, i + row + 1]);
            mesh.faces.push([i, i + row + 1, i + row]);
        }
    }
    mesh
}

fn bench_writers(c: &mut Criterion) {
    let mut mesh = grid(200);
    mesh.compute_vertex_normals();
    let mut group = c.benchmark_group("write");
    group.throughput(Throughput::Elements(mesh.faces.len() as u64));

    group.bench_function("glb", |b| {
        b.iter(|| {
            let mut buf = Vec::new();
            write_glb(black_box(&mesh), &mut buf).ok();
            buf
        });
    });
    group.bench_function("stl_binary", |b| {
        b.iter(|| {
            let mut buf = Vec::new();
            write_stl(black_box(&mesh), &mut buf, true).ok();
            buf
        });
    });
    group.finish();
}

fn bench_stl_read(c: &mut Criterion) {
    let mesh = grid(200);
    let mut bytes = Vec::new();
    write_stl(&mesh, &mut bytes, true).ok();

    c.bench_function("read_stl_binary", |b| {
        b.iter(|| read_stl(black_box(bytes.as_slice())).ok());
    });
}

criterion_group!(benches, bench_writers, bench_stl_read);
criterion_main!(benches);
