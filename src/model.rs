//! Uploaded meshes that know how to draw themselves.
//!
//! Anything an [`Entity`](crate::Entity) can show implements [`Drawable`]: it draws
//! with a given model matrix and can release its GPU resources. Two implementations
//! are provided:
//!
//! - [`Model`]: a vertex array drawn with one shader. Used for the unlit, vertex-colored
//!   point light markers.
//! - [`TexturedModel`]: a [`Model`] plus a [`Material`] whose textures are bound
//!   before every draw. Used for the lit textured cube and OBJ meshes.

use std::cell::Cell;
use std::path::Path;

use glam::{Mat4, Vec3};

use crate::backend::{GraphicsBackend, VertexArrayId};
use crate::geometry::{GeometryError, MeshData};
use crate::material::Material;
use crate::shader::Shader;

/// The draw/destroy capability.
pub trait Drawable {
    /// Draws with `transform` as the `model` uniform.
    fn draw(&self, gfx: &mut dyn GraphicsBackend, transform: &Mat4);

    /// Releases the GPU resources behind this drawable. Only the first call releases
    /// anything, so entities sharing one drawable can each destroy it.
    fn destroy(&self, gfx: &mut dyn GraphicsBackend);
}

/// A vertex array bound to a shader.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    shader: Shader,
    vertex_array: VertexArrayId,
    vertex_count: u32,
    released: Cell<bool>,
}

impl Model {
    /// Uploads `mesh` and pairs it with `shader`.
    pub fn new(gfx: &mut dyn GraphicsBackend, mesh: &MeshData, shader: Shader) -> Self {
        let vertex_array = gfx.create_vertex_array(mesh.layout, &mesh.vertices);
        Self {
            shader,
            vertex_array,
            vertex_count: mesh.vertex_count(),
            released: Cell::new(false),
        }
    }

    /// A unit cube filled with a single color.
    pub fn colored_cube(gfx: &mut dyn GraphicsBackend, color: Vec3, shader: Shader) -> Self {
        Self::new(gfx, &MeshData::colored_cube(color), shader)
    }

    pub fn shader(&self) -> Shader {
        self.shader
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

impl Drawable for Model {
    fn draw(&self, gfx: &mut dyn GraphicsBackend, transform: &Mat4) {
        self.shader.activate(gfx);
        self.shader.set_mat4(gfx, "model", *transform);
        gfx.draw_triangles(self.vertex_array, self.vertex_count);
    }

    fn destroy(&self, gfx: &mut dyn GraphicsBackend) {
        if self.released.replace(true) {
            return;
        }
        gfx.release_vertex_array(self.vertex_array);
    }
}

/// A [`Model`] drawn with a [`Material`].
#[derive(Clone, Debug, PartialEq)]
pub struct TexturedModel {
    model: Model,
    material: Material,
}

impl TexturedModel {
    pub fn new(model: Model, material: Material) -> Self {
        Self { model, material }
    }

    /// A unit cube with texture coordinates and normals.
    pub fn cube(gfx: &mut dyn GraphicsBackend, material: Material, shader: Shader) -> Self {
        let model = Model::new(gfx, &MeshData::textured_cube(), shader);
        Self::new(model, material)
    }

    /// Loads a mesh file (`.obj` or `.stl`).
    ///
    /// When `fit` is set, the mesh is centred and scaled to a unit box before upload.
    pub fn from_file(
        gfx: &mut dyn GraphicsBackend,
        path: impl AsRef<Path>,
        material: Material,
        shader: Shader,
        fit: bool,
    ) -> Result<Self, GeometryError> {
        let mut mesh = MeshData::load(path)?;
        if fit {
            mesh = mesh.centered().normalized();
        }
        let model = Model::new(gfx, &mesh, shader);
        Ok(Self::new(model, material))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn material(&self) -> &Material {
        &self.material
    }
}

impl Drawable for TexturedModel {
    fn draw(&self, gfx: &mut dyn GraphicsBackend, transform: &Mat4) {
        self.material.use_textures(gfx);
        self.model.draw(gfx, transform);
    }

    fn destroy(&self, gfx: &mut dyn GraphicsBackend) {
        if self.model.released.get() {
            return;
        }
        self.material.destroy(gfx);
        self.model.destroy(gfx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Command, Recorder, UniformValue};

    #[test]
    fn draw_activates_then_sets_model_then_draws() {
        let mut gfx = Recorder::new();
        let shader = Shader::from_source(&mut gfx, "unlit", "").unwrap();
        let cube = Model::colored_cube(&mut gfx, Vec3::X, shader);
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

        gfx.clear();
        cube.draw(&mut gfx, &transform);

        let commands = gfx.commands();
        assert_eq!(commands[0], Command::UseProgram(shader.id()));
        assert_eq!(
            commands[1],
            Command::SetUniform {
                program: Some(shader.id()),
                name: "model".into(),
                value: UniformValue::Mat4(transform),
            }
        );
        assert!(matches!(
            commands[2],
            Command::Draw {
                vertex_count: 36,
                ..
            }
        ));
    }

    #[test]
    fn textured_model_binds_material_first_and_releases_everything() {
        let mut gfx = Recorder::new();
        let shader = Shader::from_source(&mut gfx, "lit", "").unwrap();
        let material = Material::from_rgba(&mut gfx, "white", &[255; 4], 1, 1).unwrap();
        let texture = material.textures()[0];
        let cube = TexturedModel::cube(&mut gfx, material, shader);

        gfx.clear();
        cube.draw(&mut gfx, &Mat4::IDENTITY);
        assert_eq!(gfx.commands()[0], Command::BindTexture { unit: 0, texture });

        gfx.clear();
        cube.destroy(&mut gfx);
        assert!(gfx.commands().contains(&Command::ReleaseTexture(texture)));
        assert!(
            gfx.commands()
                .iter()
                .any(|c| matches!(c, Command::ReleaseVertexArray(_)))
        );
    }

    #[test]
    fn repeated_destroy_releases_once() {
        let mut gfx = Recorder::new();
        let shader = Shader::from_source(&mut gfx, "lit", "").unwrap();
        let material = Material::from_rgba(&mut gfx, "white", &[255; 4], 1, 1).unwrap();
        let textures = material.textures().len();
        let cube = TexturedModel::cube(&mut gfx, material, shader);

        gfx.clear();
        cube.destroy(&mut gfx);
        cube.destroy(&mut gfx);
        assert_eq!(gfx.commands().len(), textures + 1);
    }
}
