//! Frame metadata stored next to each sprite sheet as `data.json`.
//!
//! ```json
//! { "frame": { "size": { "width": 32, "height": 32 }, "count": { "x": 4, "y": 2 } } }
//! ```
//!
//! `size` is the on-screen size of one cell and `count` the grid dimensions of the sheet.

use std::fs;
use std::path::Path;

use glam::Mat3;
use serde::{Deserialize, Serialize};

use crate::error::SpriteError;
use crate::math::transform_3x3;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct FrameSize {
    width: f32,
    height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCount {
    pub x: u32,
    pub y: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct FrameLayout {
    size: FrameSize,
    count: FrameCount,
}

/// `data.json` as written on disk, before validation.
#[derive(Deserialize)]
struct RawFrameData {
    frame: FrameLayout,
}

/// Parsed and validated contents of `data.json`.
///
/// Every constructor validates, deserializing included, so the cell size is
/// positive and the grid has at least one cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrameData")]
pub struct FrameData {
    frame: FrameLayout,
}

impl TryFrom<RawFrameData> for FrameData {
    type Error = SpriteError;

    fn try_from(raw: RawFrameData) -> Result<Self, Self::Error> {
        let data = Self { frame: raw.frame };
        data.validate()?;
        Ok(data)
    }
}

impl FrameData {
    pub fn new(width: f32, height: f32, count_x: u32, count_y: u32) -> Result<Self, SpriteError> {
        Self::try_from(RawFrameData {
            frame: FrameLayout {
                size: FrameSize { width, height },
                count: FrameCount {
                    x: count_x,
                    y: count_y,
                },
            },
        })
    }

    /// Parse metadata held in memory. Errors name `data.json` as their source.
    pub fn from_json(json: &str) -> Result<Self, SpriteError> {
        Self::parse(json, Path::new("data.json"))
    }

    fn parse(json: &str, origin: &Path) -> Result<Self, SpriteError> {
        let raw: RawFrameData =
            serde_json::from_str(json).map_err(|source| SpriteError::Metadata {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::try_from(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SpriteError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SpriteError::MissingFile(path.to_path_buf()));
        }
        let json = fs::read_to_string(path).map_err(|source| SpriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&json, path)
    }

    fn validate(&self) -> Result<(), SpriteError> {
        let FrameLayout { size, count } = self.frame;
        if !(size.width.is_finite() && size.height.is_finite())
            || size.width <= 0.0
            || size.height <= 0.0
        {
            return Err(SpriteError::InvalidFrame(format!(
                "frame size must be positive, got {}x{}",
                size.width, size.height
            )));
        }
        if count.x == 0 || count.y == 0 {
            return Err(SpriteError::InvalidFrame(format!(
                "frame count must be at least 1x1, got {}x{}",
                count.x, count.y
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> f32 {
        self.frame.size.width
    }

    pub fn height(&self) -> f32 {
        self.frame.size.height
    }

    pub fn count(&self) -> FrameCount {
        self.frame.count
    }

    /// Total number of cells in the sheet.
    pub fn frame_count(&self) -> usize {
        self.frame.count.x as usize * self.frame.count.y as usize
    }

    /// Grid cell of a row-major frame index. Indices past the end wrap around.
    pub fn cell(&self, index: usize) -> (u32, u32) {
        let index = index % self.frame_count();
        let cols = self.frame.count.x as usize;
        ((index % cols) as u32, (index / cols) as u32)
    }

    /// Texture matrix selecting cell `(frame_x, frame_y)` of the sheet.
    pub fn tex_matrix(&self, frame_x: u32, frame_y: u32) -> Mat3 {
        let scale_x = 1.0 / self.frame.count.x as f32;
        let scale_y = 1.0 / self.frame.count.y as f32;
        transform_3x3(
            scale_x,
            scale_y,
            frame_x as f32 * scale_x,
            frame_y as f32 * scale_y,
        )
    }
}
