//! STL (stereolithography) reading and writing.
//!
//! # Binary layout
//!
//! ```text
//! UINT8[80]    header, free text
//! UINT32       triangle count
//! per triangle
//!     REAL32[3] facet normal (ignored on read)
//!     REAL32[3] vertex 1
//!     REAL32[3] vertex 2
//!     REAL32[3] vertex 3
//!     UINT16    attribute byte count
//! ```
//!
//! # ASCII layout
//!
//! ```text
//! solid name
//!   facet normal nx ny nz
//!     outer loop
//!       vertex x y z
//!       vertex x y z
//!       vertex x y z
//!     endloop
//!   endfacet
//! endsolid name
//! ```
//!
//! Many CAD exporters write binary files whose header begins with `solid`,
//! so the header alone does not decide the variant. A file whose length
//! matches `84 + 50 * count` exactly is treated as binary.
//!
//! Loaded meshes are triangle soup: every facet gets three new vertices.
//! Weld them (see `cad-analysis`) before topology queries.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use cad_types::{IndexedMesh, MeshTopology, Triangle, Vertex};
use tracing::debug;

use crate::error::{IoError, IoResult};

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;
const HEADER_TEXT: &[u8] = b"binary STL written by cadview";

/// Load an STL file, detecting ASCII or binary.
///
/// ```no_run
/// let mesh = cad_io::load_stl("bracket.stl").unwrap();
/// println!("{} facets", mesh.faces.len());
/// ```
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::from_open(path, e))?;
    read_stl(file)
}

/// Read STL data from any reader.
pub fn read_stl<R: Read>(mut reader: R) -> IoResult<IndexedMesh> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_stl(&bytes)
}

fn parse_stl(bytes: &[u8]) -> IoResult<IndexedMesh> {
    if is_ascii_stl(bytes) {
        debug!(len = bytes.len(), "parsing ASCII STL");
        parse_ascii(bytes)
    } else {
        debug!(len = bytes.len(), "parsing binary STL");
        parse_binary(bytes)
    }
}

fn is_ascii_stl(bytes: &[u8]) -> bool {
    let starts_with_solid = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .is_some_and(|start| bytes[start..].starts_with(b"solid"));
    if !starts_with_solid {
        return false;
    }
    if bytes.len() >= HEADER_SIZE + 4 {
        if binary_size_matches(bytes) {
            return false;
        }
        if bytes[..HEADER_SIZE].contains(&0) {
            return false;
        }
    }
    true
}

fn binary_size_matches(bytes: &[u8]) -> bool {
    face_count(bytes).is_some_and(|count| {
        (count as usize)
            .checked_mul(TRIANGLE_SIZE)
            .and_then(|body| body.checked_add(HEADER_SIZE + 4))
            == Some(bytes.len())
    })
}

fn face_count(bytes: &[u8]) -> Option<u32> {
    let raw = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn parse_binary(bytes: &[u8]) -> IoResult<IndexedMesh> {
    let count = face_count(bytes).ok_or(IoError::InvalidHeader {
        expected: HEADER_SIZE + 4,
        got: bytes.len(),
    })?;

    let body = &bytes[HEADER_SIZE + 4..];
    let available = body.len() / TRIANGLE_SIZE;
    if available < count as usize {
        return Err(IoError::InvalidFaceCount {
            expected: count,
            got: u32::try_from(available).unwrap_or(u32::MAX),
        });
    }

    let mut mesh = IndexedMesh::with_capacity(count as usize * 3, count as usize);
    for record in body.chunks_exact(TRIANGLE_SIZE).take(count as usize) {
        #[allow(clippy::cast_possible_truncation)]
        let base = mesh.vertices.len() as u32;
        mesh.vertices.push(read_vertex(&record[12..24]));
        mesh.vertices.push(read_vertex(&record[24..36]));
        mesh.vertices.push(read_vertex(&record[36..48]));
        mesh.faces.push([base, base + 1, base + 2]);
    }
    Ok(mesh)
}

fn read_vertex(buf: &[u8]) -> Vertex {
    let f = |i: usize| f64::from(f32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]));
    Vertex::from_coords(f(0), f(4), f(8))
}

fn parse_ascii(bytes: &[u8]) -> IoResult<IndexedMesh> {
    let text = String::from_utf8_lossy(bytes);
    let mut mesh = IndexedMesh::new();
    let mut corners: Vec<Vertex> = Vec::with_capacity(3);
    let mut in_loop = false;

    for (line_no, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };
        match keyword.to_ascii_lowercase().as_str() {
            "outer" => {
                in_loop = true;
                corners.clear();
            }
            "vertex" if in_loop => {
                let mut coord = || -> IoResult<f64> {
                    parts
                        .next()
                        .ok_or_else(|| {
                            IoError::invalid_content(format!(
                                "line {}: vertex needs three coordinates",
                                line_no + 1
                            ))
                        })?
                        .parse::<f64>()
                        .map_err(IoError::from)
                };
                let (x, y, z) = (coord()?, coord()?, coord()?);
                corners.push(Vertex::from_coords(x, y, z));
            }
            "endloop" => in_loop = false,
            "endfacet" => {
                if corners.len() == 3 {
                    #[allow(clippy::cast_possible_truncation)]
                    let base = mesh.vertices.len() as u32;
                    mesh.vertices.append(&mut corners);
                    mesh.faces.push([base, base + 1, base + 2]);
                } else {
                    debug!(line = line_no + 1, corners = corners.len(), "skipping non-triangular facet");
                    corners.clear();
                }
            }
            "endsolid" => break,
            _ => {}
        }
    }
    Ok(mesh)
}

/// Write a mesh as binary (`binary = true`) or ASCII STL.
pub fn save_stl<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, binary: bool) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_stl(mesh, &mut writer, binary)?;
    writer.flush()?;
    Ok(())
}

/// Write STL to any writer.
pub fn write_stl<W: Write>(mesh: &IndexedMesh, writer: W, binary: bool) -> IoResult<()> {
    if binary {
        write_binary(mesh, writer)
    } else {
        write_ascii(mesh, writer)
    }
}

fn facet_normal(tri: &Triangle) -> [f64; 3] {
    tri.normal().map_or([0.0; 3], |n| [n.x, n.y, n.z])
}

fn write_binary<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    let mut header = [b' '; HEADER_SIZE];
    header[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT);
    writer.write_all(&header)?;

    let triangles: Vec<Triangle> = mesh.triangles().collect();
    let count = u32::try_from(triangles.len())
        .map_err(|_| IoError::invalid_content("too many faces for binary STL"))?;
    writer.write_all(&count.to_le_bytes())?;

    for tri in &triangles {
        write_f32x3(&mut writer, facet_normal(tri))?;
        for p in [tri.v0, tri.v1, tri.v2] {
            write_f32x3(&mut writer, [p.x, p.y, p.z])?;
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn write_f32x3<W: Write>(writer: &mut W, v: [f64; 3]) -> IoResult<()> {
    for c in v {
        writer.write_all(&(c as f32).to_le_bytes())?;
    }
    Ok(())
}

fn write_ascii<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    writeln!(writer, "solid cadview")?;
    for tri in mesh.triangles() {
        let [nx, ny, nz] = facet_normal(&tri);
        writeln!(writer, "  facet normal {nx:.6e} {ny:.6e} {nz:.6e}")?;
        writeln!(writer, "    outer loop")?;
        for p in [tri.v0, tri.v1, tri.v2] {
            writeln!(writer, "      vertex {:.6e} {:.6e} {:.6e}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid cadview")?;
    Ok(())
}
