//! The rendering capability the scene core talks to.
//!
//! Scene objects never touch wgpu directly. They drive a [`GraphicsBackend`]: a small,
//! GL-shaped interface with an active program, name-keyed uniforms, vertex arrays and
//! texture units. All of this state lives in the backend value that is passed to every
//! operation, so there is no ambient global render state.
//!
//! Two implementations ship with the crate:
//!
//! - [`WgpuBackend`](crate::WgpuBackend) renders through wgpu.
//! - [`Recorder`] keeps a log of every call and renders nothing. It is used by the
//!   tests and is handy for inspecting what a frame sends to the GPU.
//!
//! # Uniform contract
//!
//! Uniform writes always target the program made active by the most recent
//! [`GraphicsBackend::use_program`]. Callers must activate a program before writing to
//! it; a previous activation is never assumed to persist. Unknown names are ignored.

use std::fmt;

use glam::{Mat4, Vec3};

/// Handle to a compiled shader program owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderId(pub(crate) u32);

/// Handle to an uploaded vertex buffer and its attribute layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub(crate) u32);

/// Handle to a 2D texture owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) u32);

/// A value written to a named uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

/// Interleaved vertex formats understood by the backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// `x y z s t nx ny nz`, 8 floats per vertex.
    Textured,
    /// `x y z r g b`, 6 floats per vertex.
    Colored,
}

impl VertexLayout {
    /// Number of `f32` components per vertex.
    pub fn floats_per_vertex(self) -> usize {
        match self {
            VertexLayout::Textured => 8,
            VertexLayout::Colored => 6,
        }
    }

    /// Vertex count for a flat buffer in this layout.
    pub fn vertex_count(self, data: &[f32]) -> u32 {
        (data.len() / self.floats_per_vertex()) as u32
    }
}

/// Errors reported by a backend while creating resources.
#[derive(Debug)]
pub enum BackendError {
    /// The shader source was rejected by the compiler.
    ShaderCompile { label: String, message: String },
    /// Texture data did not match the declared dimensions.
    TextureSize {
        label: String,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ShaderCompile { label, message } => {
                write!(f, "failed to compile shader '{}': {}", label, message)
            }
            BackendError::TextureSize {
                label,
                expected,
                actual,
            } => write!(
                f,
                "texture '{}' expects {} bytes of RGBA data, got {}",
                label, expected, actual
            ),
        }
    }
}

impl std::error::Error for BackendError {}

/// The GPU capability required by scene objects.
///
/// Resource handles are only meaningful to the backend that created them. Releasing a
/// handle twice, or drawing with a zero vertex count, is a silent no-op.
pub trait GraphicsBackend {
    /// Compiles a program from source. Fails fast on compile errors.
    fn compile_program(&mut self, label: &str, source: &str) -> Result<ShaderId, BackendError>;

    /// Makes `program` the target of subsequent uniform writes and draws.
    fn use_program(&mut self, program: ShaderId);

    /// Writes a named uniform on the active program.
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    /// Uploads interleaved vertex data.
    fn create_vertex_array(&mut self, layout: VertexLayout, data: &[f32]) -> VertexArrayId;

    fn release_vertex_array(&mut self, vertex_array: VertexArrayId);

    /// Uploads a tightly packed RGBA8 image.
    fn create_texture(
        &mut self,
        label: &str,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<TextureId, BackendError>;

    /// Binds `texture` to texture unit `unit`.
    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    fn release_texture(&mut self, texture: TextureId);

    /// Enables or disables back-face culling for subsequent draws.
    fn set_face_culling(&mut self, enabled: bool);

    /// Draws `vertex_count` vertices of `vertex_array` as a triangle list using the
    /// active program.
    fn draw_triangles(&mut self, vertex_array: VertexArrayId, vertex_count: u32);
}

/// One call captured by a [`Recorder`].
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    CompileProgram { program: ShaderId, label: String },
    UseProgram(ShaderId),
    SetUniform {
        program: Option<ShaderId>,
        name: String,
        value: UniformValue,
    },
    CreateVertexArray {
        vertex_array: VertexArrayId,
        layout: VertexLayout,
        vertex_count: u32,
    },
    ReleaseVertexArray(VertexArrayId),
    CreateTexture {
        texture: TextureId,
        width: u32,
        height: u32,
    },
    BindTexture { unit: u32, texture: TextureId },
    ReleaseTexture(TextureId),
    SetFaceCulling(bool),
    Draw {
        program: Option<ShaderId>,
        vertex_array: VertexArrayId,
        vertex_count: u32,
        culling: bool,
    },
}

/// A headless backend that records every call it receives.
#[derive(Debug, Default)]
pub struct Recorder {
    commands: Vec<Command>,
    active: Option<ShaderId>,
    culling: bool,
    next_id: u32,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls, oldest first.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drops the recorded calls but keeps the active program and culling state.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// The currently active program, if any.
    pub fn active_program(&self) -> Option<ShaderId> {
        self.active
    }

    /// Names of all uniforms written so far, in order.
    pub fn uniform_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The last value written to `name` on `program`.
    pub fn last_uniform(&self, program: ShaderId, name: &str) -> Option<UniformValue> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::SetUniform {
                program: Some(p),
                name: n,
                value,
            } if *p == program && n == name => Some(*value),
            _ => None,
        })
    }

    /// All recorded draw calls.
    pub fn draws(&self) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. }))
            .collect()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsBackend for Recorder {
    fn compile_program(&mut self, label: &str, _source: &str) -> Result<ShaderId, BackendError> {
        let program = ShaderId(self.next());
        self.commands.push(Command::CompileProgram {
            program,
            label: label.to_string(),
        });
        Ok(program)
    }

    fn use_program(&mut self, program: ShaderId) {
        self.active = Some(program);
        self.commands.push(Command::UseProgram(program));
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.commands.push(Command::SetUniform {
            program: self.active,
            name: name.to_string(),
            value,
        });
    }

    fn create_vertex_array(&mut self, layout: VertexLayout, data: &[f32]) -> VertexArrayId {
        let vertex_array = VertexArrayId(self.next());
        self.commands.push(Command::CreateVertexArray {
            vertex_array,
            layout,
            vertex_count: layout.vertex_count(data),
        });
        vertex_array
    }

    fn release_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.commands.push(Command::ReleaseVertexArray(vertex_array));
    }

    fn create_texture(
        &mut self,
        label: &str,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<TextureId, BackendError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(BackendError::TextureSize {
                label: label.to_string(),
                expected,
                actual: rgba.len(),
            });
        }
        let texture = TextureId(self.next());
        self.commands.push(Command::CreateTexture {
            texture,
            width,
            height,
        });
        Ok(texture)
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.commands.push(Command::BindTexture { unit, texture });
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.commands.push(Command::ReleaseTexture(texture));
    }

    fn set_face_culling(&mut self, enabled: bool) {
        self.culling = enabled;
        self.commands.push(Command::SetFaceCulling(enabled));
    }

    fn draw_triangles(&mut self, vertex_array: VertexArrayId, vertex_count: u32) {
        if vertex_count == 0 {
            return;
        }
        self.commands.push(Command::Draw {
            program: self.active,
            vertex_array,
            vertex_count,
            culling: self.culling,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_follow_active_program() {
        let mut gfx = Recorder::new();
        let a = gfx.compile_program("a", "").unwrap();
        let b = gfx.compile_program("b", "").unwrap();

        gfx.use_program(a);
        gfx.set_uniform("x", UniformValue::Float(1.0));
        gfx.use_program(b);
        gfx.set_uniform("x", UniformValue::Float(2.0));

        assert_eq!(gfx.last_uniform(a, "x"), Some(UniformValue::Float(1.0)));
        assert_eq!(gfx.last_uniform(b, "x"), Some(UniformValue::Float(2.0)));
    }

    #[test]
    fn zero_vertex_draw_is_skipped() {
        let mut gfx = Recorder::new();
        let vao = gfx.create_vertex_array(VertexLayout::Colored, &[]);
        gfx.draw_triangles(vao, 0);
        assert!(gfx.draws().is_empty());
    }

    #[test]
    fn texture_size_is_checked() {
        let mut gfx = Recorder::new();
        let err = gfx.create_texture("bad", &[0; 8], 2, 2).unwrap_err();
        assert!(matches!(err, BackendError::TextureSize { expected: 16, .. }));
    }

    #[test]
    fn layout_vertex_counts() {
        assert_eq!(VertexLayout::Textured.vertex_count(&[0.0; 24]), 3);
        assert_eq!(VertexLayout::Colored.vertex_count(&[0.0; 24]), 4);
    }
}
