//! The interactive demo: a window, a lit scene and first-person controls.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::error::{EventLoopError, OsError};
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

use crate::backend::GraphicsBackend;
use crate::camera::FpsCamera;
use crate::config::AppConfig;
use crate::entity::{Entity, Spin};
use crate::geometry::GeometryError;
use crate::gpu::{GpuContext, GpuError};
use crate::input::Input;
use crate::light::DirLight;
use crate::material::{Material, MaterialError, checkerboard};
use crate::model::{Drawable, TexturedModel};
use crate::renderer::WgpuBackend;
use crate::scene::{Scene, SceneError};
use crate::shader::{Shader, ShaderError};
use crate::timer::FrameTimer;
use crate::transform::Pose;

const PHONG_SHADER: &str = include_str!("shaders/phong.wgsl");
const UNLIT_SHADER: &str = include_str!("shaders/unlit.wgsl");

const SHININESS: f32 = 32.0;
const CHECKER_SIZE: u32 = 256;

/// Point lights of the demo as `(position, color)`.
const POINT_LIGHTS: [(Vec3, Vec3); 3] = [
    (Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 0.0, 0.0)),
    (Vec3::new(1.0, 1.0, -1.0), Vec3::new(0.0, 1.0, 0.0)),
    (Vec3::new(-1.0, 1.0, 1.0), Vec3::new(0.0, 0.0, 1.0)),
];

/// Something that stopped the demo from starting.
#[derive(Debug)]
pub enum AppError {
    EventLoop(EventLoopError),
    Window(OsError),
    Gpu(GpuError),
    Shader(ShaderError),
    Material(MaterialError),
    Geometry(GeometryError),
    Scene(SceneError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EventLoop(e) => write!(f, "event loop error: {}", e),
            AppError::Window(e) => write!(f, "failed to create window: {}", e),
            AppError::Gpu(e) => write!(f, "{}", e),
            AppError::Shader(e) => write!(f, "{}", e),
            AppError::Material(e) => write!(f, "{}", e),
            AppError::Geometry(e) => write!(f, "{}", e),
            AppError::Scene(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Gpu(e) => Some(e),
            AppError::Shader(e) => Some(e),
            AppError::Material(e) => Some(e),
            AppError::Geometry(e) => Some(e),
            AppError::Scene(e) => Some(e),
        }
    }
}

impl From<EventLoopError> for AppError {
    fn from(e: EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}

impl From<OsError> for AppError {
    fn from(e: OsError) -> Self {
        AppError::Window(e)
    }
}

impl From<GpuError> for AppError {
    fn from(e: GpuError) -> Self {
        AppError::Gpu(e)
    }
}

impl From<ShaderError> for AppError {
    fn from(e: ShaderError) -> Self {
        AppError::Shader(e)
    }
}

impl From<MaterialError> for AppError {
    fn from(e: MaterialError) -> Self {
        AppError::Material(e)
    }
}

impl From<GeometryError> for AppError {
    fn from(e: GeometryError) -> Self {
        AppError::Geometry(e)
    }
}

impl From<SceneError> for AppError {
    fn from(e: SceneError) -> Self {
        AppError::Scene(e)
    }
}

/// Runs the demo until the window is closed or Escape is pressed.
///
/// Setup failures close the window and are returned here.
pub fn run(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = LanternApp::Pending { config };
    event_loop.run_app(&mut app)?;

    match app {
        LanternApp::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

enum LanternApp {
    Pending { config: AppConfig },
    Running(Box<Running>),
    Failed(AppError),
    Finished,
}

struct Running {
    config: AppConfig,
    window: Arc<Window>,
    backend: WgpuBackend,
    scene: Scene,
    input: Input,
    timer: FrameTimer,
}

impl ApplicationHandler for LanternApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let LanternApp::Pending { config } = self else {
            return;
        };

        match Running::new(event_loop, config.clone()) {
            Ok(running) => *self = LanternApp::Running(Box::new(running)),
            Err(e) => {
                log::error!("setup failed: {}", e);
                *self = LanternApp::Failed(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let LanternApp::Running(running) = self else {
            return;
        };

        running.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => running.backend.resize(size.width, size.height),
            WindowEvent::Focused(true) => {
                grab_cursor(&running.window);
                running.timer.reset();
            }
            WindowEvent::RedrawRequested => {
                if running.input.key_pressed(KeyCode::Escape) {
                    self.shutdown(event_loop);
                    return;
                }
                if !running.frame() {
                    log::error!("out of memory while presenting, exiting");
                    self.shutdown(event_loop);
                    return;
                }
                running.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let LanternApp::Running(running) = self {
            running.input.handle_device_event(&event);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let LanternApp::Running(running) = self {
            running.window.request_redraw();
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.shutdown(event_loop);
    }
}

impl LanternApp {
    /// Tears the scene down once and stops the loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let LanternApp::Running(running) = self {
            running.scene.destroy(&mut running.backend);
            log::info!("shut down after {} frames", running.timer.frame_index());
            *self = LanternApp::Finished;
        }
        event_loop.exit();
    }
}

impl Running {
    fn new(event_loop: &ActiveEventLoop, config: AppConfig) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        grab_cursor(&window);

        let gpu = GpuContext::new(window.clone())?;
        let mut backend = WgpuBackend::new(gpu);
        let scene = build_scene(&mut backend, &config)?;

        let mut timer = FrameTimer::new();
        if let Some(fps) = config.frame_cap {
            timer = timer.with_frame_cap(fps);
        }

        Ok(Self {
            config,
            window,
            backend,
            scene,
            input: Input::new(),
            timer,
        })
    }

    /// Runs one frame. Returns `false` when rendering cannot continue.
    fn frame(&mut self) -> bool {
        let dt = self.timer.tick();
        self.apply_controls(dt);
        self.input.begin_frame();

        self.backend.begin_frame();
        self.scene.frame(&mut self.backend, dt);
        match self.backend.end_frame(self.config.clear_color) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                self.backend.gpu().reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return false,
            Err(e) => log::warn!("skipping frame: {}", e),
        }

        if self.timer.frame_index() % 30 == 0 {
            self.window.set_title(&format!(
                "{} - {:.0} fps",
                self.config.title,
                self.timer.fps()
            ));
        }
        true
    }

    fn apply_controls(&mut self, dt: f32) {
        let look = self.input.mouse_delta() * self.config.mouse_sensitivity;
        let axes = self.input.movement_axes() * self.config.move_speed * dt;

        let camera = self.scene.camera_mut();
        camera.rotate(-look.x, -look.y);
        camera.move_by(axes.x, axes.y, axes.z);
    }
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        log::warn!("could not grab cursor: {}", e);
    }
    window.set_cursor_visible(false);
}

/// Compiles the shaders and assembles the demo scene.
fn build_scene(gfx: &mut dyn GraphicsBackend, config: &AppConfig) -> Result<Scene, AppError> {
    let phong = Shader::from_source(gfx, "phong", PHONG_SHADER)?;
    let unlit = Shader::from_source(gfx, "unlit", UNLIT_SHADER)?;

    phong.activate(gfx);
    phong.set_int(gfx, "material.diffuse", 0);
    phong.set_int(gfx, "material.specular", 1);
    phong.set_float(gfx, "material.shininess", SHININESS);

    let camera = FpsCamera::new(
        config.camera_position,
        config.fov_radians(),
        config.aspect(),
        config.near,
        config.far,
    );
    let dir_light = DirLight::new(
        phong,
        Vec3::new(0.5, -1.0, -0.5),
        Vec3::splat(0.2),
        Vec3::ONE,
        Vec3::ONE,
    );

    let mut builder = Scene::builder(camera, dir_light).shader_target(unlit);
    for (position, color) in POINT_LIGHTS {
        builder = builder.point_light(gfx, position, color, phong, unlit)?;
    }

    let model = load_model(gfx, config, phong)?;
    let mut entity = Entity::new(model, Pose::new());
    if config.spin != 0.0 {
        entity = entity.with_behavior(Spin::yaw(config.spin));
        log::info!("spinning at {} degrees per second", config.spin);
    }

    Ok(builder.dynamic_entity(entity).build())
}

/// The mesh from the command line, or a checkered cube.
fn load_model(
    gfx: &mut dyn GraphicsBackend,
    config: &AppConfig,
    shader: Shader,
) -> Result<Rc<dyn Drawable>, AppError> {
    let material = load_material(gfx, config)?;
    let model = match &config.model {
        Some(path) => match TexturedModel::from_file(gfx, path, material.clone(), shader, true) {
            Ok(model) => model,
            Err(e) => {
                material.destroy(gfx);
                return Err(e.into());
            }
        },
        None => TexturedModel::cube(gfx, material, shader),
    };
    Ok(Rc::new(model))
}

/// Diffuse and specular maps from the command line, with generated stand-ins.
fn load_material(gfx: &mut dyn GraphicsBackend, config: &AppConfig) -> Result<Material, AppError> {
    let diffuse = match &config.diffuse {
        Some(path) => Material::from_files(gfx, &[path])?,
        None => {
            let pixels = checkerboard(CHECKER_SIZE, 8, [230, 230, 230, 255], [60, 60, 70, 255]);
            Material::from_rgba(gfx, "checker diffuse", &pixels, CHECKER_SIZE, CHECKER_SIZE)?
        }
    };
    let specular = match &config.specular {
        Some(path) => Material::from_files(gfx, &[path]),
        None => Material::from_rgba(gfx, "plain specular", &[128, 128, 128, 255], 1, 1),
    };
    let specular = match specular {
        Ok(specular) => specular,
        Err(e) => {
            diffuse.destroy(gfx);
            return Err(e.into());
        }
    };

    let mut textures = diffuse.textures().to_vec();
    textures.extend_from_slice(specular.textures());
    Ok(Material::from_textures(textures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Command, Recorder};
    use crate::light::point_light_uniform;

    #[test]
    fn demo_scene_layout() {
        let mut gfx = Recorder::new();
        let scene = build_scene(&mut gfx, &AppConfig::default()).unwrap();

        assert_eq!(scene.point_lights().len(), 3);
        assert_eq!(scene.targets().len(), 2);
        assert_eq!(scene.dynamic_entities().len(), 1);
        assert_eq!(scene.camera().position(), Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn material_units_set_at_setup() {
        let mut gfx = Recorder::new();
        let scene = build_scene(&mut gfx, &AppConfig::default()).unwrap();
        let phong = scene.dir_light().shader().id();

        assert_eq!(
            gfx.last_uniform(phong, "material.specular"),
            Some(crate::backend::UniformValue::Int(1))
        );
        assert_eq!(
            gfx.last_uniform(phong, "material.shininess"),
            Some(crate::backend::UniformValue::Float(SHININESS))
        );
    }

    #[test]
    fn frame_lights_and_draws_everything() {
        let mut gfx = Recorder::new();
        let mut scene = build_scene(&mut gfx, &AppConfig::default()).unwrap();
        gfx.clear();

        scene.frame(&mut gfx, 0.016);

        let names = gfx.uniform_names();
        assert!(names.contains(&point_light_uniform(2, "diffuse").as_str()));
        assert!(!names.contains(&point_light_uniform(3, "diffuse").as_str()));
        // Three markers and the cube.
        assert_eq!(gfx.draws().len(), 4);
    }

    #[test]
    fn cube_textures_are_released_on_shutdown() {
        let mut gfx = Recorder::new();
        let mut scene = build_scene(&mut gfx, &AppConfig::default()).unwrap();
        gfx.clear();

        scene.destroy(&mut gfx);

        let released = gfx
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::ReleaseTexture(_)))
            .count();
        assert_eq!(released, 2);
    }

    #[test]
    fn missing_mesh_is_an_error() {
        let mut gfx = Recorder::new();
        let config = AppConfig::default().model("does/not/exist.obj", None, None);
        assert!(matches!(
            build_scene(&mut gfx, &config),
            Err(AppError::Geometry(_))
        ));
    }
}
