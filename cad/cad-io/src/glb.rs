//! GLB (binary glTF 2.0) reading and writing.
//!
//! The writer emits the smallest document a web viewer needs: one scene with
//! one node referencing one mesh with a single indexed triangle primitive.
//!
//! ```text
//! header   magic "glTF" | version 2 | total length        (3 x u32 LE)
//! chunk 0  length | "JSON" | document, space padded to 4
//! chunk 1  length | "BIN\0" | POSITION f32x3 | NORMAL f32x3 | indices u32
//! ```
//!
//! The reader accepts files from other exporters as long as the geometry sits
//! in the embedded BIN chunk: it takes the first primitive of the first mesh,
//! honours `byteStride`, and accepts u8/u16/u32 indices. Sparse accessors,
//! external buffers, and non-triangle modes are rejected.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use cad_types::{IndexedMesh, MeshTopology, Vector3, Vertex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IoError, IoResult};

const MAGIC: u32 = 0x4654_6C67;
const VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
const MODE_TRIANGLES: u32 = 4;

const GENERATOR: &str = concat!("cadview ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    asset: Asset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scene: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    scenes: Vec<Scene>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    nodes: Vec<Node>,
    #[serde(default)]
    meshes: Vec<Mesh>,
    #[serde(default)]
    accessors: Vec<Accessor>,
    #[serde(default)]
    buffer_views: Vec<BufferView>,
    #[serde(default)]
    buffers: Vec<Buffer>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Asset {
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    generator: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Scene {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mesh: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Mesh {
    primitives: Vec<Primitive>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Primitive {
    attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    indices: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Attributes {
    #[serde(rename = "POSITION")]
    position: usize,
    #[serde(rename = "NORMAL", default, skip_serializing_if = "Option::is_none")]
    normal: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    buffer_view: Option<usize>,
    #[serde(default, skip_serializing_if = "is_zero")]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<Vec<f32>>,
    #[serde(default, skip_serializing)]
    sparse: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
    buffer: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    byte_offset: usize,
    byte_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    byte_stride: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Buffer {
    byte_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(v: &usize) -> bool {
    *v == 0
}

/// Write a mesh as GLB.
///
/// Vertex normals are included only when every vertex carries one; call
/// [`IndexedMesh::compute_vertex_normals`] first for smooth shading.
///
/// ```no_run
/// let mut mesh = cad_io::load_stl("part.stl").unwrap();
/// mesh.compute_vertex_normals();
/// cad_io::save_glb(&mesh, "part.glb").unwrap();
/// ```
pub fn save_glb<P: AsRef<Path>>(mesh: &IndexedMesh, path: P) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_glb(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write GLB to any writer.
pub fn write_glb<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    if mesh.is_empty() {
        return Err(IoError::invalid_content("cannot write an empty mesh to GLB"));
    }
    if let Some(bad) = mesh.first_invalid_index() {
        return Err(IoError::invalid_content(format!(
            "face index {bad} out of range for {} vertices",
            mesh.vertex_count()
        )));
    }

    let with_normals = mesh.vertices.iter().all(|v| v.normal.is_some());
    let vertex_count = mesh.vertex_count();
    let index_count = mesh.face_count() * 3;

    let mut bin = Vec::with_capacity(vertex_count * 24 + index_count * 4);
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for v in &mesh.vertices {
        let p = v.position_f32();
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
        push_f32s(&mut bin, p);
    }
    let positions_len = bin.len();

    let normals_len = if with_normals {
        for n in mesh.vertices.iter().filter_map(|v| v.normal) {
            push_f32s(&mut bin, narrow(n));
        }
        bin.len() - positions_len
    } else {
        0
    };

    let indices_offset = bin.len();
    for idx in mesh.faces.iter().flatten() {
        bin.extend_from_slice(&idx.to_le_bytes());
    }
    let indices_len = bin.len() - indices_offset;

    let mut doc = Document {
        asset: Asset {
            version: "2.0".to_owned(),
            generator: Some(GENERATOR.to_owned()),
        },
        scene: Some(0),
        scenes: vec![Scene { nodes: vec![0] }],
        nodes: vec![Node { mesh: Some(0) }],
        buffers: vec![Buffer {
            byte_length: bin.len(),
            uri: None,
        }],
        ..Document::default()
    };

    doc.buffer_views.push(array_view(0, positions_len, TARGET_ARRAY_BUFFER));
    doc.accessors.push(Accessor {
        buffer_view: Some(0),
        byte_offset: 0,
        component_type: COMPONENT_F32,
        count: vertex_count,
        kind: "VEC3".to_owned(),
        min: Some(min.to_vec()),
        max: Some(max.to_vec()),
        sparse: None,
    });

    let normal = with_normals.then(|| {
        doc.buffer_views
            .push(array_view(positions_len, normals_len, TARGET_ARRAY_BUFFER));
        doc.accessors.push(Accessor {
            buffer_view: Some(doc.buffer_views.len() - 1),
            byte_offset: 0,
            component_type: COMPONENT_F32,
            count: vertex_count,
            kind: "VEC3".to_owned(),
            min: None,
            max: None,
            sparse: None,
        });
        doc.accessors.len() - 1
    });

    doc.buffer_views.push(array_view(
        indices_offset,
        indices_len,
        TARGET_ELEMENT_ARRAY_BUFFER,
    ));
    doc.accessors.push(Accessor {
        buffer_view: Some(doc.buffer_views.len() - 1),
        byte_offset: 0,
        component_type: COMPONENT_U32,
        count: index_count,
        kind: "SCALAR".to_owned(),
        min: None,
        max: None,
        sparse: None,
    });

    doc.meshes.push(Mesh {
        primitives: vec![Primitive {
            attributes: Attributes {
                position: 0,
                normal,
            },
            indices: Some(doc.accessors.len() - 1),
            mode: Some(MODE_TRIANGLES),
        }],
    });

    let mut json = serde_json::to_vec(&doc)?;
    pad_to_four(&mut json, b' ');
    pad_to_four(&mut bin, 0);

    let total = HEADER_LEN + CHUNK_HEADER_LEN * 2 + json.len() + bin.len();
    writer.write_all(&MAGIC.to_le_bytes())?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&chunk_len(total)?.to_le_bytes())?;
    write_chunk(&mut writer, CHUNK_JSON, &json)?;
    write_chunk(&mut writer, CHUNK_BIN, &bin)?;

    debug!(
        vertices = vertex_count,
        faces = mesh.face_count(),
        normals = with_normals,
        bytes = total,
        "wrote GLB"
    );
    Ok(())
}

const fn array_view(byte_offset: usize, byte_length: usize, target: u32) -> BufferView {
    BufferView {
        buffer: 0,
        byte_offset,
        byte_length,
        byte_stride: None,
        target: Some(target),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn narrow(v: Vector3<f64>) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

fn push_f32s(buf: &mut Vec<u8>, values: [f32; 3]) {
    for c in values {
        buf.extend_from_slice(&c.to_le_bytes());
    }
}

fn pad_to_four(buf: &mut Vec<u8>, fill: u8) {
    while buf.len() % 4 != 0 {
        buf.push(fill);
    }
}

fn chunk_len(len: usize) -> IoResult<u32> {
    u32::try_from(len).map_err(|_| IoError::invalid_content("GLB exceeds 4 GiB"))
}

fn write_chunk<W: Write>(writer: &mut W, kind: u32, data: &[u8]) -> IoResult<()> {
    writer.write_all(&chunk_len(data.len())?.to_le_bytes())?;
    writer.write_all(&kind.to_le_bytes())?;
    writer.write_all(data)?;
    Ok(())
}

/// Load a GLB file.
pub fn load_glb<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::from_open(path, e))?;
    read_glb(file)
}

/// Read GLB data from any reader.
pub fn read_glb<R: Read>(mut reader: R) -> IoResult<IndexedMesh> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_glb(&bytes)
}

fn read_u32(bytes: &[u8], at: usize) -> IoResult<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| IoError::invalid_content(format!("GLB truncated at byte {at}")))
}

fn parse_glb(bytes: &[u8]) -> IoResult<IndexedMesh> {
    if bytes.len() < HEADER_LEN {
        return Err(IoError::InvalidHeader {
            expected: HEADER_LEN,
            got: bytes.len(),
        });
    }
    if read_u32(bytes, 0)? != MAGIC {
        return Err(IoError::invalid_content("missing glTF magic"));
    }
    let version = read_u32(bytes, 4)?;
    if version != VERSION {
        return Err(IoError::invalid_content(format!(
            "unsupported glTF container version {version}"
        )));
    }
    let declared = read_u32(bytes, 8)? as usize;
    if declared > bytes.len() {
        return Err(IoError::invalid_content(format!(
            "GLB header declares {declared} bytes, file has {}",
            bytes.len()
        )));
    }
    let bytes = &bytes[..declared];

    let mut json: Option<&[u8]> = None;
    let mut bin: Option<&[u8]> = None;
    let mut at = HEADER_LEN;
    while at + CHUNK_HEADER_LEN <= bytes.len() {
        let len = read_u32(bytes, at)? as usize;
        let kind = read_u32(bytes, at + 4)?;
        let start = at + CHUNK_HEADER_LEN;
        let data = bytes
            .get(start..start + len)
            .ok_or_else(|| IoError::invalid_content("GLB chunk runs past end of file"))?;
        match kind {
            CHUNK_JSON if json.is_none() => json = Some(data),
            CHUNK_BIN if bin.is_none() => bin = Some(data),
            _ => debug!(kind, len, "skipping GLB chunk"),
        }
        at = start + len;
    }

    let json = json.ok_or_else(|| IoError::invalid_content("GLB has no JSON chunk"))?;
    let doc: Document = serde_json::from_slice(json)?;
    let bin = bin.unwrap_or_default();
    if doc.buffers.first().is_some_and(|b| b.uri.is_some()) {
        return Err(IoError::UnsupportedOperation {
            format: "GLB with external buffers",
            operation: "read",
        });
    }

    let primitive = doc
        .meshes
        .first()
        .and_then(|m| m.primitives.first())
        .ok_or_else(|| IoError::invalid_content("glTF document has no mesh primitive"))?;
    if primitive.mode.is_some_and(|m| m != MODE_TRIANGLES) {
        return Err(IoError::UnsupportedOperation {
            format: "non-triangle glTF primitives",
            operation: "read",
        });
    }

    let positions = read_vec3(&doc, bin, primitive.attributes.position)?;
    let normals = primitive
        .attributes
        .normal
        .map(|a| read_vec3(&doc, bin, a))
        .transpose()?
        .filter(|n| n.len() == positions.len());

    let indices = match primitive.indices {
        Some(a) => read_indices(&doc, bin, a)?,
        None => {
            let n = u32::try_from(positions.len())
                .map_err(|_| IoError::invalid_content("too many vertices"))?;
            (0..n).collect()
        }
    };
    if indices.len() % 3 != 0 {
        return Err(IoError::invalid_content(format!(
            "index count {} is not a multiple of 3",
            indices.len()
        )));
    }

    let vertices = match normals {
        Some(normals) => positions
            .iter()
            .zip(normals)
            .map(|(p, n)| Vertex::with_normal(vec3_point(*p), to_f64(n)))
            .collect(),
        None => positions.iter().map(|p| Vertex::new(vec3_point(*p))).collect(),
    };
    let faces = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
    let mesh = IndexedMesh::from_parts(vertices, faces);

    if let Some(bad) = mesh.first_invalid_index() {
        return Err(IoError::invalid_content(format!(
            "index {bad} out of range for {} vertices",
            mesh.vertex_count()
        )));
    }
    Ok(mesh)
}

fn to_f64(v: [f32; 3]) -> Vector3<f64> {
    Vector3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2]))
}

fn vec3_point(v: [f32; 3]) -> cad_types::Point3<f64> {
    cad_types::Point3::from(to_f64(v))
}

/// Bytes covered by accessor `index` and the distance between elements.
fn accessor_bytes<'a>(
    doc: &Document,
    bin: &'a [u8],
    index: usize,
    element_size: usize,
) -> IoResult<(&'a [u8], usize)> {
    let accessor = doc
        .accessors
        .get(index)
        .ok_or_else(|| IoError::invalid_content(format!("accessor {index} does not exist")))?;
    if accessor.sparse.is_some() {
        return Err(IoError::UnsupportedOperation {
            format: "sparse glTF accessors",
            operation: "read",
        });
    }
    let view_index = accessor
        .buffer_view
        .ok_or_else(|| IoError::invalid_content(format!("accessor {index} has no buffer view")))?;
    let view = doc
        .buffer_views
        .get(view_index)
        .ok_or_else(|| IoError::invalid_content(format!("buffer view {view_index} does not exist")))?;
    if view.buffer != 0 {
        return Err(IoError::invalid_content("only the embedded buffer 0 is supported"));
    }

    let stride = view.byte_stride.unwrap_or(element_size);
    if stride < element_size {
        return Err(IoError::invalid_content(format!(
            "buffer view {view_index} stride {stride} is shorter than a {element_size}-byte element"
        )));
    }
    let past_end =
        || IoError::invalid_content(format!("accessor {index} reads past the end of its buffer"));

    let view_end = view
        .byte_offset
        .checked_add(view.byte_length)
        .filter(|&end| end <= bin.len())
        .ok_or_else(past_end)?;
    let start = view
        .byte_offset
        .checked_add(accessor.byte_offset)
        .ok_or_else(past_end)?;
    let needed = match accessor.count {
        0 => 0,
        n => (n - 1)
            .checked_mul(stride)
            .and_then(|span| span.checked_add(element_size))
            .ok_or_else(past_end)?,
    };
    let end = start
        .checked_add(needed)
        .filter(|&end| end <= view_end)
        .ok_or_else(past_end)?;
    Ok((&bin[start..end], stride))
}

fn read_vec3(doc: &Document, bin: &[u8], index: usize) -> IoResult<Vec<[f32; 3]>> {
    let accessor = doc
        .accessors
        .get(index)
        .ok_or_else(|| IoError::invalid_content(format!("accessor {index} does not exist")))?;
    if accessor.component_type != COMPONENT_F32 || accessor.kind != "VEC3" {
        return Err(IoError::invalid_content(format!(
            "accessor {index} is not a float VEC3"
        )));
    }
    let (data, stride) = accessor_bytes(doc, bin, index, 12)?;
    Ok((0..accessor.count)
        .map(|i| {
            let at = i * stride;
            let f = |k: usize| {
                let b = &data[at + k * 4..at + k * 4 + 4];
                f32::from_le_bytes([b[0], b[1], b[2], b[3]])
            };
            [f(0), f(1), f(2)]
        })
        .collect())
}

fn read_indices(doc: &Document, bin: &[u8], index: usize) -> IoResult<Vec<u32>> {
    let accessor = doc
        .accessors
        .get(index)
        .ok_or_else(|| IoError::invalid_content(format!("accessor {index} does not exist")))?;
    let size = match accessor.component_type {
        COMPONENT_U8 => 1,
        COMPONENT_U16 => 2,
        COMPONENT_U32 => 4,
        other => {
            return Err(IoError::invalid_content(format!(
                "unsupported index component type {other}"
            )));
        }
    };
    let (data, stride) = accessor_bytes(doc, bin, index, size)?;
    Ok((0..accessor.count)
        .map(|i| {
            let b = &data[i * stride..i * stride + size];
            match size {
                1 => u32::from(b[0]),
                2 => u32::from(u16::from_le_bytes([b[0], b[1]])),
                _ => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            }
        })
        .collect())
}
