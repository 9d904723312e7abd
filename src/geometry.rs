//! Mesh data before upload: loading, primitives and simple fix-ups.
//!
//! [`MeshData`] is a flat, de-indexed vertex buffer tagged with its
//! [`VertexLayout`]. It comes from one of three places:
//!
//! - a mesh file, via [`MeshData::load`] (`.obj` or `.stl`, picked by extension)
//! - [`MeshData::textured_cube`], a unit cube with texture coordinates and normals
//! - [`MeshData::colored_cube`], a unit cube with a single vertex color
//!
//! ```no_run
//! use lantern::MeshData;
//!
//! let mesh = MeshData::load("models/backpack.obj")
//!     .unwrap()
//!     .centered()
//!     .normalized();
//! println!("{} vertices", mesh.vertex_count());
//! ```
//!
//! All primitives are centred on the origin, span -0.5..0.5 on every axis and use
//! counter-clockwise front faces.

use std::fmt;
use std::path::Path;

use glam::Vec3;

use crate::backend::VertexLayout;
use crate::obj::ObjError;

/// Errors that can occur when loading geometry.
#[derive(Debug)]
pub enum GeometryError {
    /// File could not be read.
    Io(std::io::Error),
    /// File format could not be determined from extension.
    UnknownFormat(String),
    /// The OBJ text was malformed.
    Obj(ObjError),
    /// The STL data was invalid or corrupt.
    Stl(String),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::Io(e) => write!(f, "IO error: {}", e),
            GeometryError::UnknownFormat(ext) => {
                write!(f, "Unknown geometry format: '{}'", ext)
            }
            GeometryError::Obj(e) => write!(f, "OBJ parse error: {}", e),
            GeometryError::Stl(msg) => write!(f, "STL parse error: {}", msg),
        }
    }
}

impl std::error::Error for GeometryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeometryError::Io(e) => Some(e),
            GeometryError::Obj(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GeometryError {
    fn from(e: std::io::Error) -> Self {
        GeometryError::Io(e)
    }
}

impl From<ObjError> for GeometryError {
    fn from(e: ObjError) -> Self {
        GeometryError::Obj(e)
    }
}

/// Interleaved vertex data ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub layout: VertexLayout,
    pub vertices: Vec<f32>,
}

/// Outward normal plus the in-face `u` and `v` axes, with `u × v = normal`.
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
];

/// Face corners as `(u, v)` signs, two CCW triangles.
const FACE_CORNERS: [(f32, f32); 6] = [
    (-1.0, -1.0),
    (1.0, -1.0),
    (1.0, 1.0),
    (-1.0, -1.0),
    (1.0, 1.0),
    (-1.0, 1.0),
];

impl MeshData {
    pub fn new(layout: VertexLayout, vertices: Vec<f32>) -> Self {
        Self { layout, vertices }
    }

    /// Loads a mesh file, detecting the format from its extension.
    ///
    /// Supported: `.obj` (triangle-fan faces) and `.stl` (binary or ASCII, no UVs).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        let mesh = match ext.as_str() {
            "obj" => Self::new(VertexLayout::Textured, crate::obj::load(path)?),
            "stl" => Self::load_stl(path)?,
            _ => return Err(GeometryError::UnknownFormat(ext)),
        };

        log::info!(
            "loaded mesh '{}' ({} vertices)",
            path.display(),
            mesh.vertex_count()
        );
        Ok(mesh)
    }

    /// A unit cube with per-face normals and full `[0, 1]` texture coordinates.
    pub fn textured_cube() -> Self {
        let mut vertices = Vec::with_capacity(36 * 8);
        for (normal, u, v) in CUBE_FACES {
            let (n, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
            for (su, sv) in FACE_CORNERS {
                let p = (n + u * su + v * sv) * 0.5;
                vertices.extend_from_slice(&p.to_array());
                vertices.extend_from_slice(&[(su + 1.0) * 0.5, (sv + 1.0) * 0.5]);
                vertices.extend_from_slice(&normal);
            }
        }
        Self::new(VertexLayout::Textured, vertices)
    }

    /// A unit cube with every vertex set to `color`.
    pub fn colored_cube(color: Vec3) -> Self {
        let mut vertices = Vec::with_capacity(36 * 6);
        for (normal, u, v) in CUBE_FACES {
            let (n, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
            for (su, sv) in FACE_CORNERS {
                let p = (n + u * su + v * sv) * 0.5;
                vertices.extend_from_slice(&p.to_array());
                vertices.extend_from_slice(&color.to_array());
            }
        }
        Self::new(VertexLayout::Colored, vertices)
    }

    pub fn vertex_count(&self) -> u32 {
        self.layout.vertex_count(&self.vertices)
    }

    fn stride(&self) -> usize {
        self.layout.floats_per_vertex()
    }

    fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices
            .chunks_exact(self.stride())
            .map(|v| Vec3::new(v[0], v[1], v[2]))
    }

    /// Computes the axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for p in self.positions() {
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    /// Returns the center of the bounding box.
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Translates all positions by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        let stride = self.stride();
        for v in self.vertices.chunks_exact_mut(stride) {
            v[0] += offset.x;
            v[1] += offset.y;
            v[2] += offset.z;
        }
    }

    /// Scales all positions uniformly around the origin.
    pub fn scale(&mut self, factor: f32) {
        let stride = self.stride();
        for v in self.vertices.chunks_exact_mut(stride) {
            v[0] *= factor;
            v[1] *= factor;
            v[2] *= factor;
        }
    }

    /// Moves the bounding box center to the origin.
    pub fn centered(mut self) -> Self {
        if self.vertex_count() > 0 {
            let center = self.center();
            self.translate(-center);
        }
        self
    }

    /// Scales the mesh so its largest extent is 1.
    pub fn normalized(mut self) -> Self {
        if self.vertex_count() > 0 {
            let (min, max) = self.bounds();
            let size = max - min;
            let max_dim = size.x.max(size.y).max(size.z);
            if max_dim > 0.0 {
                self.scale(1.0 / max_dim);
            }
        }
        self
    }

    fn load_stl(path: &Path) -> Result<Self, GeometryError> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        Self::parse_stl(&mut reader)
    }

    fn parse_stl<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<Self, GeometryError> {
        let stl = stl_io::read_stl(reader).map_err(|e| GeometryError::Stl(e.to_string()))?;

        let mut vertices = Vec::with_capacity(stl.faces.len() * 3 * 8);
        for face in &stl.faces {
            let normal: [f32; 3] = face.normal.into();
            for &vertex_idx in &face.vertices {
                let position: [f32; 3] = stl.vertices[vertex_idx].into();
                vertices.extend_from_slice(&position);
                // STL has no UVs
                vertices.extend_from_slice(&[0.0, 0.0]);
                vertices.extend_from_slice(&normal);
            }
        }

        Ok(Self::new(VertexLayout::Textured, vertices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangles(mesh: &MeshData) -> Vec<[Vec3; 3]> {
        let stride = mesh.layout.floats_per_vertex();
        mesh.vertices
            .chunks_exact(stride * 3)
            .map(|t| {
                let p = |i: usize| Vec3::new(t[i * stride], t[i * stride + 1], t[i * stride + 2]);
                [p(0), p(1), p(2)]
            })
            .collect()
    }

    #[test]
    fn cubes_have_36_vertices() {
        assert_eq!(MeshData::textured_cube().vertex_count(), 36);
        assert_eq!(MeshData::colored_cube(Vec3::ONE).vertex_count(), 36);
    }

    #[test]
    fn cube_spans_unit_box() {
        let (min, max) = MeshData::textured_cube().bounds();
        assert_eq!(min, Vec3::splat(-0.5));
        assert_eq!(max, Vec3::splat(0.5));
    }

    #[test]
    fn cube_faces_wind_counter_clockwise_from_outside() {
        for [a, b, c] in triangles(&MeshData::textured_cube()) {
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn cube_normals_point_outward() {
        let mesh = MeshData::textured_cube();
        for v in mesh.vertices.chunks_exact(8) {
            let p = Vec3::new(v[0], v[1], v[2]);
            let n = Vec3::new(v[5], v[6], v[7]);
            assert!((p.dot(n) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn colored_cube_carries_color() {
        let mesh = MeshData::colored_cube(Vec3::new(1.0, 0.0, 0.5));
        for v in mesh.vertices.chunks_exact(6) {
            assert_eq!(&v[3..6], &[1.0, 0.0, 0.5]);
        }
    }

    #[test]
    fn center_and_normalize() {
        let mut mesh = MeshData::textured_cube();
        mesh.scale(4.0);
        mesh.translate(Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(mesh.center(), Vec3::new(2.0, 4.0, 6.0));

        let mesh = mesh.centered().normalized();
        let (min, max) = mesh.bounds();
        assert!((min - Vec3::splat(-0.5)).length() < 1e-5);
        assert!((max - Vec3::splat(0.5)).length() < 1e-5);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = MeshData::load("model.fbx").unwrap_err();
        assert!(matches!(err, GeometryError::UnknownFormat(ext) if ext == "fbx"));
    }

    #[test]
    fn obj_file_round_trip_through_loader() {
        let dir = std::env::temp_dir().join("lantern-geometry-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n")
            .unwrap();

        let mesh = MeshData::load(&path).unwrap();
        assert_eq!(mesh.layout, VertexLayout::Textured);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn malformed_obj_is_fatal() {
        let dir = std::env::temp_dir().join("lantern-geometry-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.obj");
        std::fs::write(&path, "v 0 0 0\nf 1/1/1 1/1/1 1/1/1\n").unwrap();

        assert!(matches!(
            MeshData::load(&path).unwrap_err(),
            GeometryError::Obj(_)
        ));
    }
}
