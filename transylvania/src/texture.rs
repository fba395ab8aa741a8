use std::path::Path;

use crate::error::SpriteError;

/// Flat tangent-space normal `(0, 0, 1)` encoded as RGBA8.
pub const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];

/// The two maps every sprite carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Color,
    Normal,
}

impl TextureKind {
    /// Texture unit the map is bound to.
    pub fn unit(self) -> u32 {
        match self {
            TextureKind::Color => 0,
            TextureKind::Normal => 1,
        }
    }

    /// File name inside a sprite directory.
    pub fn file_name(self) -> &'static str {
        match self {
            TextureKind::Color => "color.png",
            TextureKind::Normal => "normal.png",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextureKind::Color => "color",
            TextureKind::Normal => "normal",
        }
    }
}

/// Decoded RGBA8 pixels, rows top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct TextureData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureData {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, SpriteError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(SpriteError::PixelLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_png_bytes(bytes: &[u8], origin: &Path) -> Result<Self, SpriteError> {
        let image = image::load_from_memory(bytes)
            .map_err(|source| SpriteError::Image {
                path: origin.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SpriteError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SpriteError::MissingFile(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|source| SpriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_png_bytes(&bytes, path)
    }

    /// A normal map where every texel faces the viewer.
    pub fn flat_normal(width: u32, height: u32) -> Self {
        let pixels = FLAT_NORMAL.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl std::fmt::Debug for TextureData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_are_distinct() {
        assert_eq!(TextureKind::Color.unit(), 0);
        assert_eq!(TextureKind::Normal.unit(), 1);
    }

    #[test]
    fn flat_normal_fills_every_texel() {
        let tex = TextureData::flat_normal(3, 2);
        assert_eq!(tex.size(), (3, 2));
        assert_eq!(tex.pixels().len(), 24);
        assert!(tex.pixels().chunks(4).all(|px| px == FLAT_NORMAL));
    }

    #[test]
    fn rgba_length_is_checked() {
        assert!(TextureData::from_rgba(2, 2, vec![0; 16]).is_ok());
        match TextureData::from_rgba(2, 2, vec![0; 15]) {
            Err(SpriteError::PixelLength { expected, actual }) => {
                assert_eq!((expected, actual), (16, 15));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn decodes_png_to_rgba() {
        let mut img = image::RgbImage::new(2, 1);
        img.put_pixel(1, 0, image::Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageOutputFormat::Png,
            )
            .unwrap();

        let tex = TextureData::from_png_bytes(&bytes, Path::new("mem.png")).unwrap();
        assert_eq!(tex.size(), (2, 1));
        assert_eq!(&tex.pixels()[4..8], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = TextureData::from_png_bytes(b"not a png", Path::new("bad.png")).unwrap_err();
        assert!(matches!(err, SpriteError::Image { .. }));
    }
}
