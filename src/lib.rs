//! # Lantern
//!
//! **A small real-time 3D scene core on wgpu.**
//!
//! Lantern renders textured meshes lit by one directional light and a handful of
//! colored point lights, seen through a first-person camera. Scene objects never touch
//! wgpu directly: they talk to a [`GraphicsBackend`] with GL-style named uniforms, which
//! [`WgpuBackend`] maps onto real pipelines and [`Recorder`] captures for tests.
//!
//! ## Frame order
//!
//! Each [`Scene::frame`] runs, in this order:
//!
//! 1. camera uniforms (`projView`, `viewPos`) on every shader target
//! 2. directional light uniforms
//! 3. point light uniforms
//! 4. entity behaviors, then entity transforms
//! 5. light markers with culling off, then entities with culling on
//!
//! ## Example
//!
//! ```
//! use lantern::{Entity, MeshData, Model, Pose, Recorder, Shader, Vec3};
//! use std::rc::Rc;
//!
//! let mut gfx = Recorder::new();
//! let unlit = Shader::from_source(&mut gfx, "unlit", "").unwrap();
//! let cube = Model::new(&mut gfx, &MeshData::colored_cube(Vec3::X), unlit);
//!
//! let entity = Entity::new(Rc::new(cube), Pose::new().position([0.0, 1.0, 0.0]));
//! entity.draw(&mut gfx);
//! assert_eq!(gfx.draws().len(), 1);
//! ```

mod app;
mod backend;
mod camera;
mod config;
mod entity;
mod geometry;
mod gpu;
mod input;
mod light;
mod logging;
mod material;
mod model;
mod obj;
mod renderer;
mod scene;
mod shader;
mod timer;
mod transform;

pub use app::{AppError, run};
pub use backend::{
    BackendError, Command, GraphicsBackend, Recorder, ShaderId, TextureId, UniformValue,
    VertexArrayId, VertexLayout,
};
pub use camera::{Camera, FpsCamera};
pub use config::{AppConfig, ConfigError};
pub use entity::{Behavior, Entity, Spin, Updatable};
pub use geometry::{GeometryError, MeshData};
pub use gpu::{GpuContext, GpuError};
pub use input::Input;
pub use light::{Attenuation, DirLight, MAX_POINT_LIGHTS, PointLight, point_light_uniform};
pub use logging::{LoggingConfig, init_logging};
pub use material::{Material, MaterialError, checkerboard};
pub use model::{Drawable, Model, TexturedModel};
pub use obj::ObjError;
pub use renderer::WgpuBackend;
pub use scene::{Scene, SceneBuilder, SceneError};
pub use shader::{Shader, ShaderError};
pub use timer::FrameTimer;
pub use transform::{Pose, compose_model_transform, compose_rotation};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3};

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
