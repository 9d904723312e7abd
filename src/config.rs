//! Demo configuration.
//!
//! [`AppConfig`] collects everything the demo needs before the window opens. Start from
//! the defaults and override with the builder methods, or read the command line with
//! [`AppConfig::from_args`]:
//!
//! ```text
//! lantern [OPTIONS] [MODEL [DIFFUSE [SPECULAR]]]
//!
//!   MODEL             .obj or .stl mesh to show instead of the textured cube
//!   DIFFUSE SPECULAR  texture files for the mesh
//!   --spin DEG        spin the mesh by DEG degrees per second
//!   --fps-cap FPS     limit the frame rate
//! ```

use std::fmt;
use std::path::PathBuf;

use glam::Vec3;

/// A command line that could not be understood.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingValue(String),
    InvalidNumber { option: String, value: String },
    UnknownOption(String),
    TooManyArguments(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingValue(option) => write!(f, "{} needs a value", option),
            ConfigError::InvalidNumber { option, value } => {
                write!(f, "{} expects a number, got '{}'", option, value)
            }
            ConfigError::UnknownOption(option) => write!(f, "unknown option '{}'", option),
            ConfigError::TooManyArguments(arg) => write!(f, "unexpected argument '{}'", arg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Window, camera and control settings for the demo.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: Vec3,
    /// Degrees of rotation per unit of mouse motion.
    pub mouse_sensitivity: f32,
    /// Movement speed in units per second.
    pub move_speed: f32,
    pub clear_color: wgpu::Color,
    /// Mesh shown instead of the textured cube.
    pub model: Option<PathBuf>,
    pub diffuse: Option<PathBuf>,
    pub specular: Option<PathBuf>,
    /// Yaw speed of the shown mesh in degrees per second.
    pub spin: f32,
    pub frame_cap: Option<f32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "lantern".to_string(),
            width: 1200,
            height: 800,
            fov: 45.0,
            near: 0.3,
            far: 30.0,
            camera_position: Vec3::new(0.0, 0.0, 5.0),
            mouse_sensitivity: 0.1,
            move_speed: 5.0,
            clear_color: wgpu::Color::BLACK,
            model: None,
            diffuse: None,
            specular: None,
            spin: 0.0,
            frame_cap: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the field of view in degrees.
    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees;
        self
    }

    /// Set near and far clipping planes.
    pub fn clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn camera_position(mut self, position: impl Into<Vec3>) -> Self {
        self.camera_position = position.into();
        self
    }

    pub fn mouse_sensitivity(mut self, sensitivity: f32) -> Self {
        self.mouse_sensitivity = sensitivity;
        self
    }

    pub fn move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Show a mesh file, optionally with diffuse and specular textures.
    pub fn model(
        mut self,
        path: impl Into<PathBuf>,
        diffuse: Option<PathBuf>,
        specular: Option<PathBuf>,
    ) -> Self {
        self.model = Some(path.into());
        self.diffuse = diffuse;
        self.specular = specular;
        self
    }

    pub fn spin(mut self, degrees_per_second: f32) -> Self {
        self.spin = degrees_per_second;
        self
    }

    pub fn frame_cap(mut self, fps: f32) -> Self {
        self.frame_cap = Some(fps);
        self
    }

    /// Projection aspect ratio from the initial window size.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Field of view in radians.
    pub fn fov_radians(&self) -> f32 {
        self.fov.to_radians()
    }

    /// Reads the process arguments, skipping the program name.
    pub fn from_args() -> Result<Self, ConfigError> {
        Self::parse_args(std::env::args().skip(1))
    }

    /// Applies command line arguments to the defaults.
    pub fn parse_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        let mut paths = Vec::new();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--spin" => config.spin = number(&arg, args.next())?,
                "--fps-cap" => config.frame_cap = Some(number(&arg, args.next())?),
                _ if arg.starts_with("--") => return Err(ConfigError::UnknownOption(arg)),
                _ if paths.len() == 3 => return Err(ConfigError::TooManyArguments(arg)),
                _ => paths.push(PathBuf::from(arg)),
            }
        }

        let mut paths = paths.into_iter();
        config.model = paths.next();
        config.diffuse = paths.next();
        config.specular = paths.next();
        Ok(config)
    }
}

fn number(option: &str, value: Option<String>) -> Result<f32, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingValue(option.to_string()))?;
    match value.parse::<f32>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(ConfigError::InvalidNumber {
            option: option.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo() {
        let config = AppConfig::default();
        assert_eq!((config.width, config.height), (1200, 800));
        assert!((config.aspect() - 1.5).abs() < 1e-6);
        assert!((config.fov_radians() - 45f32.to_radians()).abs() < 1e-6);
        assert_eq!(config.camera_position, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn positional_paths() {
        let config = AppConfig::parse_args(["bag.obj", "d.png"]).unwrap();
        assert_eq!(config.model, Some(PathBuf::from("bag.obj")));
        assert_eq!(config.diffuse, Some(PathBuf::from("d.png")));
        assert_eq!(config.specular, None);
    }

    #[test]
    fn options_and_paths_mix() {
        let config = AppConfig::parse_args(["--spin", "50", "m.stl", "--fps-cap", "60"]).unwrap();
        assert_eq!(config.spin, 50.0);
        assert_eq!(config.frame_cap, Some(60.0));
        assert_eq!(config.model, Some(PathBuf::from("m.stl")));
    }

    #[test]
    fn bad_arguments() {
        assert_eq!(
            AppConfig::parse_args(["--spin"]).unwrap_err(),
            ConfigError::MissingValue("--spin".into())
        );
        assert!(matches!(
            AppConfig::parse_args(["--spin", "fast"]).unwrap_err(),
            ConfigError::InvalidNumber { .. }
        ));
        assert!(matches!(
            AppConfig::parse_args(["--wireframe"]).unwrap_err(),
            ConfigError::UnknownOption(_)
        ));
        assert!(matches!(
            AppConfig::parse_args(["a", "b", "c", "d"]).unwrap_err(),
            ConfigError::TooManyArguments(_)
        ));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for value in ["NaN", "inf", "-inf", "1e39"] {
            assert!(matches!(
                AppConfig::parse_args(["--spin", value]).unwrap_err(),
                ConfigError::InvalidNumber { .. }
            ));
        }
        assert!(AppConfig::parse_args(["--fps-cap", "1e-39"]).is_ok());
    }
}
