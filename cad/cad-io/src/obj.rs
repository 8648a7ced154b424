//! Wavefront OBJ reading and writing.
//!
//! Only geometry is handled: `v`, `vn` and `f` records. Texture coordinates,
//! groups, and material libraries are skipped on read and never written.
//! Polygons with more than three corners are fan-triangulated.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use cad_types::{IndexedMesh, Vertex};

use crate::error::{IoError, IoResult};

/// Load an OBJ file.
pub fn load_obj<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::from_open(path, e))?;
    read_obj(file)
}

/// Read OBJ data from any reader.
pub fn read_obj<R: Read>(reader: R) -> IoResult<IndexedMesh> {
    let mut mesh = IndexedMesh::new();

    for (line_no, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let coords = parts
                    .take(3)
                    .map(str::parse::<f64>)
                    .collect::<Result<Vec<_>, _>>()?;
                let [x, y, z] = coords.as_slice() else {
                    return Err(IoError::invalid_content(format!(
                        "line {}: vertex needs three coordinates",
                        line_no + 1
                    )));
                };
                mesh.vertices.push(Vertex::from_coords(*x, *y, *z));
            }
            Some("f") => {
                let corners = parts
                    .map(|token| resolve_index(token, mesh.vertices.len(), line_no))
                    .collect::<IoResult<Vec<u32>>>()?;
                if corners.len() < 3 {
                    return Err(IoError::invalid_content(format!(
                        "line {}: face needs at least three vertices",
                        line_no + 1
                    )));
                }
                for pair in corners[1..].windows(2) {
                    mesh.faces.push([corners[0], pair[0], pair[1]]);
                }
            }
            _ => {}
        }
    }

    if let Some(bad) = mesh.first_invalid_index() {
        return Err(IoError::invalid_content(format!(
            "face references vertex {} but only {} are defined",
            u64::from(bad) + 1,
            mesh.vertices.len()
        )));
    }
    Ok(mesh)
}

/// Turn one `f` token (`i`, `i/t`, `i//n`, `i/t/n`) into a zero-based index.
///
/// Negative indices count back from the most recent vertex.
fn resolve_index(token: &str, defined: usize, line_no: usize) -> IoResult<u32> {
    let raw: i64 = token.split('/').next().unwrap_or_default().parse()?;
    let defined = i64::try_from(defined).unwrap_or(i64::MAX);
    let zero_based = match raw {
        0 => None,
        r if r > 0 => Some(r - 1),
        r => Some(defined + r),
    };
    zero_based
        .filter(|&i| i >= 0)
        .and_then(|i| u32::try_from(i).ok())
        .ok_or_else(|| IoError::invalid_content(format!("line {}: bad face index {token}", line_no + 1)))
}

/// Write a mesh as OBJ.
pub fn save_obj<P: AsRef<Path>>(mesh: &IndexedMesh, path: P) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_obj(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write OBJ to any writer.
///
/// Normals are emitted only when every vertex has one, paired 1:1 with
/// positions so faces can use `i//i`.
pub fn write_obj<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    writeln!(writer, "# written by cadview")?;
    writeln!(
        writer,
        "# {} vertices, {} faces",
        mesh.vertices.len(),
        mesh.faces.len()
    )?;

    for v in &mesh.vertices {
        let p = v.position;
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    let with_normals = !mesh.vertices.is_empty() && mesh.vertices.iter().all(|v| v.normal.is_some());
    if with_normals {
        for n in mesh.vertices.iter().filter_map(|v| v.normal) {
            writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
        }
    }

    for &[a, b, c] in &mesh.faces {
        let (a, b, c) = (u64::from(a) + 1, u64::from(b) + 1, u64::from(c) + 1);
        if with_normals {
            writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
        } else {
            writeln!(writer, "f {a} {b} {c}")?;
        }
    }
    Ok(())
}
