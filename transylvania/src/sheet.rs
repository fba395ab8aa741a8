//! Sprite sheets: frame metadata plus color and normal maps.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SpriteError;
use crate::frame::FrameData;
use crate::texture::{TextureData, TextureKind};

static NEXT_SHEET_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a loaded sheet. The renderer keys its GPU textures by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SheetId(u64);

impl SheetId {
    fn next() -> Self {
        Self(NEXT_SHEET_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn to_u64(self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(id: u64) -> Self {
        Self(id)
    }
}

/// Everything needed to draw one sprite sheet.
#[derive(Debug)]
pub struct SpriteSheet {
    id: SheetId,
    width: u32,
    height: u32,
    frame: FrameData,
    color: TextureData,
    normal: TextureData,
}

impl SpriteSheet {
    /// Assemble a sheet from decoded parts. Without a normal map a flat one is used.
    pub fn from_parts(
        frame: FrameData,
        color: TextureData,
        normal: Option<TextureData>,
    ) -> Result<Self, SpriteError> {
        let (width, height) = color.size();
        let normal = match normal {
            Some(normal) if normal.size() != color.size() => {
                return Err(SpriteError::SizeMismatch {
                    kind: TextureKind::Normal.name(),
                    expected: color.size(),
                    actual: normal.size(),
                });
            }
            Some(normal) => normal,
            None => TextureData::flat_normal(width, height),
        };

        Ok(Self {
            id: SheetId::next(),
            width,
            height,
            frame,
            color,
            normal,
        })
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    /// Pixel width of the whole sheet.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height of the whole sheet.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame(&self) -> &FrameData {
        &self.frame
    }

    pub fn texture(&self, kind: TextureKind) -> &TextureData {
        match kind {
            TextureKind::Color => &self.color,
            TextureKind::Normal => &self.normal,
        }
    }
}

/// Reads a sprite directory (`data.json`, `color.png`, optional `normal.png`).
pub struct SpriteBuilder;

impl SpriteBuilder {
    pub fn build(dir: impl AsRef<Path>) -> Result<SpriteSheet, SpriteError> {
        let dir = dir.as_ref();

        let frame = FrameData::load(dir.join("data.json"))?;
        let color = TextureData::load(dir.join(TextureKind::Color.file_name()))?;

        let normal_path = dir.join(TextureKind::Normal.file_name());
        let normal = if normal_path.is_file() {
            Some(TextureData::load(&normal_path)?)
        } else {
            log::debug!(
                "{} has no normal map, using a flat one",
                dir.display()
            );
            None
        };

        let sheet = SpriteSheet::from_parts(frame, color, normal)?;
        log::info!(
            "loaded sprite {} ({}x{}, {} frames)",
            dir.display(),
            sheet.width(),
            sheet.height(),
            sheet.frame().frame_count()
        );
        Ok(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::FLAT_NORMAL;

    fn frame() -> FrameData {
        FrameData::new(16.0, 16.0, 2, 1).unwrap()
    }

    #[test]
    fn missing_normal_defaults_to_flat() {
        let color = TextureData::from_rgba(2, 2, vec![255; 16]).unwrap();
        let sheet = SpriteSheet::from_parts(frame(), color, None).unwrap();
        assert_eq!((sheet.width(), sheet.height()), (2, 2));
        let normal = sheet.texture(TextureKind::Normal);
        assert_eq!(normal.size(), (2, 2));
        assert!(normal.pixels().chunks(4).all(|px| px == FLAT_NORMAL));
    }

    #[test]
    fn normal_must_match_color_size() {
        let color = TextureData::from_rgba(2, 2, vec![255; 16]).unwrap();
        let normal = TextureData::flat_normal(4, 4);
        match SpriteSheet::from_parts(frame(), color, Some(normal)) {
            Err(SpriteError::SizeMismatch {
                kind,
                expected,
                actual,
            }) => {
                assert_eq!(kind, "normal");
                assert_eq!(expected, (2, 2));
                assert_eq!(actual, (4, 4));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn every_sheet_gets_its_own_id() {
        let a = SpriteSheet::from_parts(frame(), TextureData::flat_normal(1, 1), None).unwrap();
        let b = SpriteSheet::from_parts(frame(), TextureData::flat_normal(1, 1), None).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
