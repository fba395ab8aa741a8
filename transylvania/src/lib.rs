//! Transylvania - sprite sheets for a 2D game framework.
//!
//! A sprite directory holds `data.json` (frame metadata), `color.png` and an
//! optional `normal.png`. [`SpriteManager`] loads those once, [`Renderer`]
//! draws them with a model/view/projection transform and an optional light,
//! and [`Sprite`] is the lifecycle interface game objects implement.

pub mod animation;
pub mod assets;
pub mod error;
pub mod frame;
pub mod logging;
pub mod math;
pub mod render;
pub mod sheet;
pub mod sprite;
pub mod texture;

pub use crate::animation::{AnimatedSprite, FrameAnimation};
pub use crate::assets::SpriteManager;
pub use crate::error::{ShaderError, SpriteError};
pub use crate::frame::FrameData;
pub use crate::logging::{init_logging, LoggingConfig};
pub use crate::math::{Camera2D, Vec2};
pub use crate::render::{DrawParams, Frame, Light, Renderer, RendererConfig};
pub use crate::sheet::{SheetId, SpriteBuilder, SpriteSheet};
pub use crate::sprite::{GroupId, Membership, NullSprite, Sprite};
pub use crate::texture::{TextureData, TextureKind};
