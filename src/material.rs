//! Texture sets bound to consecutive texture units.
//!
//! A [`Material`] is an ordered list of textures. Using it binds texture `i` to unit
//! `i`, so a lit material is built from `[diffuse, specular]` and the lit shader's
//! `material.diffuse` / `material.specular` samplers are pointed at units 0 and 1.

use std::fmt;
use std::path::Path;

use crate::backend::{BackendError, GraphicsBackend, TextureId};

/// Errors that can occur while loading a material.
#[derive(Debug)]
pub enum MaterialError {
    /// The image file could not be opened or decoded.
    Image {
        path: String,
        source: image::ImageError,
    },
    /// The backend refused the texture data.
    Backend(BackendError),
}

impl fmt::Display for MaterialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialError::Image { path, source } => {
                write!(f, "failed to load texture '{}': {}", path, source)
            }
            MaterialError::Backend(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for MaterialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MaterialError::Image { source, .. } => Some(source),
            MaterialError::Backend(e) => Some(e),
        }
    }
}

impl From<BackendError> for MaterialError {
    fn from(e: BackendError) -> Self {
        MaterialError::Backend(e)
    }
}

/// An ordered set of textures.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    textures: Vec<TextureId>,
}

impl Material {
    /// Loads one texture per path, in order.
    ///
    /// Images are converted to RGBA8. Any unreadable file aborts the whole load and
    /// releases the textures created so far.
    pub fn from_files<P: AsRef<Path>>(
        gfx: &mut dyn GraphicsBackend,
        paths: &[P],
    ) -> Result<Self, MaterialError> {
        let mut textures = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::load_texture(gfx, path.as_ref()) {
                Ok(texture) => textures.push(texture),
                Err(e) => {
                    for texture in textures {
                        gfx.release_texture(texture);
                    }
                    return Err(e);
                }
            }
        }
        Ok(Self { textures })
    }

    /// Builds a single-texture material from raw RGBA8 data.
    pub fn from_rgba(
        gfx: &mut dyn GraphicsBackend,
        label: &str,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Self, MaterialError> {
        let texture = gfx.create_texture(label, rgba, width, height)?;
        Ok(Self {
            textures: vec![texture],
        })
    }

    /// Wraps textures that were already uploaded.
    pub fn from_textures(textures: Vec<TextureId>) -> Self {
        Self { textures }
    }

    pub fn textures(&self) -> &[TextureId] {
        &self.textures
    }

    /// Binds texture `i` to texture unit `i`.
    pub fn use_textures(&self, gfx: &mut dyn GraphicsBackend) {
        for (unit, texture) in self.textures.iter().enumerate() {
            gfx.bind_texture(unit as u32, *texture);
        }
    }

    /// Releases every texture of this material.
    pub fn destroy(&self, gfx: &mut dyn GraphicsBackend) {
        for texture in &self.textures {
            gfx.release_texture(*texture);
        }
    }

    fn load_texture(gfx: &mut dyn GraphicsBackend, path: &Path) -> Result<TextureId, MaterialError> {
        let label = path.display().to_string();
        let img = image::open(path)
            .map_err(|source| MaterialError::Image {
                path: label.clone(),
                source,
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        log::info!("loaded texture '{}' ({}x{})", label, width, height);
        Ok(gfx.create_texture(&label, &img, width, height)?)
    }
}

/// Generates a two-tone checkerboard as RGBA8 data.
///
/// Used by the demo when no texture files are given.
pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Vec<u8> {
    let cell = (size / cells.max(1)).max(1);
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let color = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
            data.extend_from_slice(&color);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Command, Recorder};

    #[test]
    fn textures_bind_to_consecutive_units() {
        let mut gfx = Recorder::new();
        let white = [255u8; 4];
        let diffuse = gfx.create_texture("d", &white, 1, 1).unwrap();
        let specular = gfx.create_texture("s", &white, 1, 1).unwrap();
        let material = Material::from_textures(vec![diffuse, specular]);

        gfx.clear();
        material.use_textures(&mut gfx);

        assert_eq!(
            gfx.commands(),
            &[
                Command::BindTexture {
                    unit: 0,
                    texture: diffuse
                },
                Command::BindTexture {
                    unit: 1,
                    texture: specular
                },
            ]
        );
    }

    #[test]
    fn missing_image_releases_earlier_textures() {
        let dir = std::env::temp_dir().join("lantern-material-test");
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]))
            .save(&good)
            .unwrap();
        let missing = dir.join("missing.png");

        let mut gfx = Recorder::new();
        let err = Material::from_files(&mut gfx, &[good, missing]).unwrap_err();

        assert!(matches!(err, MaterialError::Image { .. }));
        assert!(
            gfx.commands()
                .iter()
                .any(|c| matches!(c, Command::ReleaseTexture(_)))
        );
    }

    #[test]
    fn checkerboard_alternates() {
        let data = checkerboard(4, 2, [0, 0, 0, 255], [255, 255, 255, 255]);
        assert_eq!(data.len(), 4 * 4 * 4);
        assert_eq!(&data[0..4], &[0, 0, 0, 255]);
        // Pixel (2, 0) is in the second cell.
        assert_eq!(&data[8..12], &[255, 255, 255, 255]);
    }
}
