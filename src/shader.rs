//! Shader program handles.
//!
//! A [`Shader`] is a cheap, copyable reference to a program owned by the backend. Many
//! scene objects may hold the same shader; the camera and the lights, for example, all
//! write to the lit program.
//!
//! Setters write to whichever program is currently active. Call [`Shader::activate`]
//! first, every time:
//!
//! ```
//! use lantern::{Recorder, Shader, Vec3};
//!
//! let mut gfx = Recorder::new();
//! let shader = Shader::from_source(&mut gfx, "lit", "/* wgsl */").unwrap();
//!
//! shader.activate(&mut gfx);
//! shader.set_vec3(&mut gfx, "viewPos", Vec3::new(0.0, 0.0, 5.0));
//! ```

use std::fmt;
use std::path::Path;

use glam::{Mat4, Vec3};

use crate::backend::{BackendError, GraphicsBackend, ShaderId, UniformValue};

/// Errors that can occur while building a shader program.
#[derive(Debug)]
pub enum ShaderError {
    /// The source file could not be read.
    Io {
        path: String,
        source: std::io::Error,
    },
    /// The backend rejected the program.
    Compile(BackendError),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Io { path, source } => {
                write!(f, "failed to read shader '{}': {}", path, source)
            }
            ShaderError::Compile(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShaderError::Io { source, .. } => Some(source),
            ShaderError::Compile(e) => Some(e),
        }
    }
}

impl From<BackendError> for ShaderError {
    fn from(e: BackendError) -> Self {
        ShaderError::Compile(e)
    }
}

/// A compiled shader program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shader {
    id: ShaderId,
}

impl Shader {
    /// Compiles a program from WGSL source.
    pub fn from_source(
        gfx: &mut dyn GraphicsBackend,
        label: &str,
        source: &str,
    ) -> Result<Self, ShaderError> {
        let id = gfx.compile_program(label, source)?;
        log::info!("compiled shader '{}'", label);
        Ok(Self { id })
    }

    /// Reads and compiles a WGSL file.
    pub fn from_file(
        gfx: &mut dyn GraphicsBackend,
        path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_source(gfx, &path.display().to_string(), &source)
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }

    /// Makes this program the target of subsequent uniform writes and draws.
    pub fn activate(&self, gfx: &mut dyn GraphicsBackend) {
        gfx.use_program(self.id);
    }

    pub fn set_int(&self, gfx: &mut dyn GraphicsBackend, name: &str, value: i32) {
        gfx.set_uniform(name, UniformValue::Int(value));
    }

    pub fn set_float(&self, gfx: &mut dyn GraphicsBackend, name: &str, value: f32) {
        gfx.set_uniform(name, UniformValue::Float(value));
    }

    pub fn set_vec3(&self, gfx: &mut dyn GraphicsBackend, name: &str, value: Vec3) {
        gfx.set_uniform(name, UniformValue::Vec3(value));
    }

    pub fn set_mat4(&self, gfx: &mut dyn GraphicsBackend, name: &str, value: Mat4) {
        gfx.set_uniform(name, UniformValue::Mat4(value));
    }
}
