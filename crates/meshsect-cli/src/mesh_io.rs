//! Mesh file readers: binary STL, ASCII STL and JSON buffers.

use std::collections::HashMap;
use std::path::Path;

use meshsect::TriangleMesh;
use thiserror::Error;

/// Errors from decoding a mesh file.
#[derive(Error, Debug)]
pub enum MeshFormat {
    /// Binary STL shorter than its triangle count says.
    #[error("binary STL declares {triangles} triangles ({expected} bytes) but has {actual} bytes")]
    TruncatedStl {
        /// Declared triangle count.
        triangles: u32,
        /// Byte length implied by the count.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },

    /// Malformed ASCII STL.
    #[error("ASCII STL line {line}: {message}")]
    AsciiStl {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Malformed JSON mesh.
    #[error("JSON mesh: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension we cannot read.
    #[error("unsupported mesh extension {0:?} (expected .stl or .json)")]
    UnsupportedExtension(String),
}

const STL_HEADER_LEN: usize = 80;
const STL_TRIANGLE_LEN: usize = 50;

/// Read a mesh, choosing the decoder from the file extension.
pub fn read_mesh(path: &Path) -> anyhow::Result<TriangleMesh> {
    use anyhow::Context;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let mesh = match ext.as_str() {
        "stl" => parse_stl(&bytes),
        "json" => parse_json(&bytes),
        other => Err(MeshFormat::UnsupportedExtension(other.to_string())),
    }
    .with_context(|| format!("decoding {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        vertices = mesh.num_vertices(),
        triangles = mesh.num_triangles(),
        "loaded mesh"
    );
    Ok(mesh)
}

/// Decode an STL file, binary or ASCII.
///
/// Files starting with `solid` are ASCII unless their length matches the
/// binary layout exactly; some exporters write `solid` into binary headers.
pub fn parse_stl(bytes: &[u8]) -> Result<TriangleMesh, MeshFormat> {
    if bytes.starts_with(b"solid") && !binary_length_matches(bytes) {
        let text = String::from_utf8_lossy(bytes);
        parse_ascii_stl(&text)
    } else {
        parse_binary_stl(bytes)
    }
}

fn binary_length_matches(bytes: &[u8]) -> bool {
    declared_triangles(bytes)
        .is_some_and(|n| bytes.len() == STL_HEADER_LEN + 4 + n as usize * STL_TRIANGLE_LEN)
}

fn declared_triangles(bytes: &[u8]) -> Option<u32> {
    let count = bytes.get(STL_HEADER_LEN..STL_HEADER_LEN + 4)?;
    Some(u32::from_le_bytes([count[0], count[1], count[2], count[3]]))
}

/// Decode a binary STL.
pub fn parse_binary_stl(bytes: &[u8]) -> Result<TriangleMesh, MeshFormat> {
    let triangles = declared_triangles(bytes).ok_or(MeshFormat::TruncatedStl {
        triangles: 0,
        expected: STL_HEADER_LEN + 4,
        actual: bytes.len(),
    })?;
    let expected = STL_HEADER_LEN + 4 + triangles as usize * STL_TRIANGLE_LEN;
    if bytes.len() < expected {
        return Err(MeshFormat::TruncatedStl {
            triangles,
            expected,
            actual: bytes.len(),
        });
    }

    let mut welder = Welder::default();
    for record in bytes[STL_HEADER_LEN + 4..expected].chunks_exact(STL_TRIANGLE_LEN) {
        // Skip the facet normal; positions are 3 × 3 f32 after it
        for corner in record[12..48].chunks_exact(12) {
            let f = |k: usize| {
                f32::from_le_bytes([corner[k], corner[k + 1], corner[k + 2], corner[k + 3]]) as f64
            };
            welder.push([f(0), f(4), f(8)]);
        }
    }

    Ok(welder.finish())
}

/// Decode an ASCII STL.
pub fn parse_ascii_stl(text: &str) -> Result<TriangleMesh, MeshFormat> {
    let mut welder = Welder::default();
    let mut corners = 0usize;

    for (n, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("vertex") {
            continue;
        }

        let mut xyz = [0.0; 3];
        for value in &mut xyz {
            let token = tokens.next().ok_or_else(|| MeshFormat::AsciiStl {
                line: n + 1,
                message: "vertex needs three coordinates".into(),
            })?;
            *value = token.parse().map_err(|_| MeshFormat::AsciiStl {
                line: n + 1,
                message: format!("bad coordinate {token:?}"),
            })?;
        }
        welder.push(xyz);
        corners += 1;
    }

    if corners % 3 != 0 {
        return Err(MeshFormat::AsciiStl {
            line: text.lines().count(),
            message: format!("{corners} vertices do not make whole triangles"),
        });
    }

    Ok(welder.finish())
}

/// Decode a JSON `{ "vertices": [...], "indices": [...] }` mesh.
pub fn parse_json(bytes: &[u8]) -> Result<TriangleMesh, MeshFormat> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Builds an indexed mesh from a triangle soup, sharing vertices whose
/// coordinates are bit-identical.
#[derive(Default)]
struct Welder {
    lookup: HashMap<[u64; 3], u32>,
    mesh: TriangleMesh,
}

impl Welder {
    fn push(&mut self, p: [f64; 3]) {
        // -0.0 and 0.0 are the same position
        let key = p.map(|c| if c == 0.0 { 0u64 } else { c.to_bits() });
        let next = self.lookup.len() as u32;
        let index = *self.lookup.entry(key).or_insert_with(|| {
            self.mesh.vertices.extend_from_slice(&p);
            next
        });
        self.mesh.indices.push(index);
    }

    fn finish(self) -> TriangleMesh {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_stl(triangles: &[[[f32; 3]; 3]], header: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; STL_HEADER_LEN];
        data[..header.len()].copy_from_slice(header);
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for tri in triangles {
            data.extend_from_slice(&[0u8; 12]);
            for v in tri {
                for c in v {
                    data.extend_from_slice(&c.to_le_bytes());
                }
            }
            data.extend_from_slice(&0u16.to_le_bytes());
        }
        data
    }

    const QUAD: [[[f32; 3]; 3]; 2] = [
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
        [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
    ];

    #[test]
    fn test_binary_stl_welds_shared_corners() {
        let mesh = parse_stl(&binary_stl(&QUAD, b"meshsect test")).unwrap();
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        mesh.validate().unwrap();
    }

    #[test]
    fn test_binary_stl_with_solid_header() {
        let mesh = parse_stl(&binary_stl(&QUAD, b"solid but actually binary")).unwrap();
        assert_eq!(mesh.num_triangles(), 2);
    }

    #[test]
    fn test_truncated_binary_stl() {
        let mut data = binary_stl(&QUAD, b"");
        data.truncate(data.len() - 10);
        let err = parse_binary_stl(&data).unwrap_err();
        assert!(matches!(err, MeshFormat::TruncatedStl { triangles: 2, .. }));

        assert!(parse_binary_stl(&[0u8; 20]).is_err());
    }

    #[test]
    fn test_ascii_stl() {
        let text = "solid quad
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 1 1 0
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 1 0
      vertex -0 1 0
    endloop
  endfacet
endsolid quad
";
        let mesh = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.vertex(3).y, 1.0);
    }

    #[test]
    fn test_ascii_stl_errors() {
        let err = parse_ascii_stl("solid x\nvertex 0 0\n").unwrap_err();
        assert!(matches!(err, MeshFormat::AsciiStl { line: 2, .. }));

        let err = parse_ascii_stl("solid x\nvertex 0 zero 0\n").unwrap_err();
        assert!(err.to_string().contains("zero"));

        let err = parse_ascii_stl("solid x\nvertex 0 0 0\nvertex 1 0 0\nendsolid x\n").unwrap_err();
        assert!(matches!(err, MeshFormat::AsciiStl { .. }));
    }

    #[test]
    fn test_json_mesh() {
        let mesh = parse_json(br#"{ "vertices": [0, 0, -1, 1, 0, 1, 0, 1, 1], "indices": [0, 1, 2] }"#).unwrap();
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.vertex(1).x, 1.0);

        assert!(matches!(parse_json(b"{ \"vertices\": 3 }"), Err(MeshFormat::Json(_))));
    }
}
