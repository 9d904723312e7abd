//! Wavefront OBJ loading on top of `tobj`.
//!
//! Only textured, lit meshes are accepted: every face corner must reference a
//! position, a texture coordinate and a normal (`f v/vt/vn ...`). A corner without
//! `vt` or `vn` is a fatal error rather than a silently zeroed attribute.
//!
//! Faces with more than three corners are split as a triangle fan, so corners
//! `0 1 2 3` become triangles `(0 1 2) (0 2 3)`. Point and line elements are skipped.
//!
//! The output is a flat, de-indexed buffer in [`VertexLayout::Textured`] order
//! (`x y z s t nx ny nz`), ready to upload. All objects and groups in the file are
//! concatenated.
//!
//! [`VertexLayout::Textured`]: crate::VertexLayout::Textured

use std::fmt;
use std::path::Path;

/// Floats per emitted vertex.
pub const FLOATS_PER_VERTEX: usize = 8;

/// Errors raised while reading an OBJ mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjError {
    /// The file could not be opened or parsed, or a face index pointed past the data.
    Load(tobj::LoadError),
    /// A face corner in `mesh` has no texture coordinate.
    MissingTexCoords { mesh: String },
    /// A face corner in `mesh` has no normal.
    MissingNormals { mesh: String },
    /// A resolved index fell outside its attribute array.
    IndexOutOfRange {
        mesh: String,
        kind: &'static str,
        index: u32,
    },
}

impl fmt::Display for ObjError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjError::Load(e) => write!(f, "{}", e),
            ObjError::MissingTexCoords { mesh } => {
                write!(f, "mesh '{}' has faces without texture coordinates", mesh)
            }
            ObjError::MissingNormals { mesh } => {
                write!(f, "mesh '{}' has faces without normals", mesh)
            }
            ObjError::IndexOutOfRange { mesh, kind, index } => {
                write!(f, "mesh '{}': {} index {} is out of range", mesh, kind, index)
            }
        }
    }
}

impl std::error::Error for ObjError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ObjError::Load(e) => Some(e),
            _ => None,
        }
    }
}

impl From<tobj::LoadError> for ObjError {
    fn from(e: tobj::LoadError) -> Self {
        ObjError::Load(e)
    }
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Reads an OBJ file into a flat `x y z s t nx ny nz` buffer.
///
/// Material libraries are not read.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<f32>, ObjError> {
    let (models, _materials) = tobj::load_obj(path.as_ref(), &load_options())?;
    flatten(&models)
}

/// Parses OBJ text held in memory.
pub fn parse(source: &str) -> Result<Vec<f32>, ObjError> {
    let (models, _materials) = tobj::load_obj_buf(&mut source.as_bytes(), &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })?;
    flatten(&models)
}

fn flatten(models: &[tobj::Model]) -> Result<Vec<f32>, ObjError> {
    let mut vertices = Vec::new();

    for model in models {
        let mesh = &model.mesh;
        let corners = mesh.indices.len();
        if mesh.texcoord_indices.len() != corners {
            return Err(ObjError::MissingTexCoords {
                mesh: model.name.clone(),
            });
        }
        if mesh.normal_indices.len() != corners {
            return Err(ObjError::MissingNormals {
                mesh: model.name.clone(),
            });
        }

        vertices.reserve(corners * FLOATS_PER_VERTEX);
        for k in 0..corners {
            let out_of_range = |kind, index| ObjError::IndexOutOfRange {
                mesh: model.name.clone(),
                kind,
                index,
            };
            let (v, vt, vn) = (
                mesh.indices[k],
                mesh.texcoord_indices[k],
                mesh.normal_indices[k],
            );
            let position = attribute::<3>(&mesh.positions, v).ok_or_else(|| out_of_range("position", v))?;
            let uv = attribute::<2>(&mesh.texcoords, vt).ok_or_else(|| out_of_range("texture", vt))?;
            let normal = attribute::<3>(&mesh.normals, vn).ok_or_else(|| out_of_range("normal", vn))?;

            vertices.extend_from_slice(position);
            vertices.extend_from_slice(uv);
            vertices.extend_from_slice(normal);
        }
    }

    Ok(vertices)
}

/// The `index`-th group of `N` floats.
fn attribute<const N: usize>(data: &[f32], index: u32) -> Option<&[f32]> {
    let start = (index as usize).checked_mul(N)?;
    data.get(start..start.checked_add(N)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# a unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    fn corner(data: &[f32], i: usize) -> &[f32] {
        &data[i * FLOATS_PER_VERTEX..(i + 1) * FLOATS_PER_VERTEX]
    }

    #[test]
    fn quad_is_split_as_fan() {
        let data = parse(QUAD).unwrap();
        assert_eq!(data.len(), 6 * FLOATS_PER_VERTEX);

        // Corner order 0 1 2, 0 2 3.
        let expected_positions = [0, 1, 2, 0, 2, 3];
        let positions: [[f32; 3]; 4] = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        for (i, &p) in expected_positions.iter().enumerate() {
            assert_eq!(&corner(&data, i)[0..3], &positions[p]);
        }
    }

    #[test]
    fn vertex_is_position_uv_normal() {
        let data = parse(QUAD).unwrap();
        assert_eq!(corner(&data, 2), &[1.0f32, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn pentagon_yields_three_triangles() {
        let src = "\
v 0 0 0
v 1 0 0
v 2 1 0
v 1 2 0
v 0 1 0
vt 0 0
vn 0 0 1
f 1/1/1 2/1/1 3/1/1 4/1/1 5/1/1
";
        let data = parse(src).unwrap();
        assert_eq!(data.len() / FLOATS_PER_VERTEX, 9);
    }

    #[test]
    fn out_of_range_index_is_fatal() {
        let src = "v 0 0 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 1/1/1\n";
        assert!(matches!(
            parse(src).unwrap_err(),
            ObjError::Load(_) | ObjError::IndexOutOfRange { .. }
        ));
    }

    #[test]
    fn missing_texture_coordinates_are_fatal() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        assert!(matches!(
            parse(src).unwrap_err(),
            ObjError::MissingTexCoords { .. } | ObjError::Load(_)
        ));
    }

    #[test]
    fn missing_normals_are_fatal() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/1 3/1\n";
        assert!(matches!(
            parse(src).unwrap_err(),
            ObjError::MissingNormals { .. } | ObjError::Load(_)
        ));
    }

    #[test]
    fn bad_number_is_fatal() {
        assert!(matches!(
            parse("v 0 0 0\nv 1 x 0\n").unwrap_err(),
            ObjError::Load(_)
        ));
    }

    #[test]
    fn crlf_and_unknown_lines_are_tolerated() {
        let src = "o thing\r\nv 0 0 0\r\nv 1 0 0\r\nv 0 1 0\r\nvt 0 0\r\nvn 0 0 1\r\ns off\r\nf 1/1/1 2/1/1 3/1/1\r\n";
        assert_eq!(parse(src).unwrap().len(), 3 * FLOATS_PER_VERTEX);
    }

    #[test]
    fn line_elements_are_skipped() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\nl 1 2\n";
        assert_eq!(parse(src).unwrap().len(), 3 * FLOATS_PER_VERTEX);
    }

    #[test]
    fn attribute_lookup_is_bounded() {
        let data = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(attribute::<3>(&data, 1), Some(&data[3..6]));
        assert_eq!(attribute::<3>(&data, 2), None);
        assert_eq!(attribute::<3>(&data, u32::MAX), None);
    }
}
