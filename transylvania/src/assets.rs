use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::SpriteError;
use crate::sheet::{SpriteBuilder, SpriteSheet};

/// Loads sprite directories once and hands out the cached sheets.
///
/// Each sprite lives in `<sprite_dir>/<name>/` and is addressed by `name`.
pub struct SpriteManager {
    sprite_dir: PathBuf,
    sprites: HashMap<String, SpriteSheet>,
}

impl SpriteManager {
    /// Create a manager rooted at `sprite_dir` with nothing loaded.
    pub fn new(sprite_dir: impl Into<PathBuf>) -> Self {
        Self {
            sprite_dir: sprite_dir.into(),
            sprites: HashMap::new(),
        }
    }

    pub fn sprite_dir(&self) -> &Path {
        &self.sprite_dir
    }

    /// Load every named sprite that is not cached yet.
    ///
    /// Stops at the first sprite that fails to load. Sprites loaded before the
    /// failure stay cached.
    pub fn load<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), SpriteError> {
        for name in names {
            let name = name.as_ref();
            if self.sprites.contains_key(name) {
                log::debug!("sprite {name} already loaded");
                continue;
            }
            if !is_plain_name(name) {
                return Err(SpriteError::InvalidName(name.to_string()));
            }

            let sheet = SpriteBuilder::build(self.sprite_dir.join(name))?;
            self.sprites.insert(name.to_string(), sheet);
        }
        Ok(())
    }

    /// Get a loaded sprite by name.
    pub fn get_sprite(&self, name: &str) -> Option<&SpriteSheet> {
        self.sprites.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sprites.contains_key(name)
    }

    /// Drop a sprite from the cache, returning it so the caller can release its GPU textures.
    pub fn unload(&mut self, name: &str) -> Option<SpriteSheet> {
        self.sprites.remove(name)
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sprites.keys().map(String::as_str)
    }
}

/// A name that stays inside the sprite directory: one normal path component.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_single_directory_names_are_plain() {
        assert!(is_plain_name("hero"));
        assert!(is_plain_name("hero.v2"));
        assert!(!is_plain_name(""));
        assert!(!is_plain_name(".."));
        assert!(!is_plain_name("."));
        assert!(!is_plain_name("../secret"));
        assert!(!is_plain_name("enemies/bat"));
        assert!(!is_plain_name("/etc"));
    }

    #[test]
    fn escaping_names_are_rejected_before_touching_disk() {
        let mut manager = SpriteManager::new("sprites");
        for name in ["../outside", "/abs/path", ".."] {
            match manager.load(&[name]) {
                Err(SpriteError::InvalidName(rejected)) => assert_eq!(rejected, name),
                other => panic!("unexpected result for {name}: {other:?}"),
            }
        }
        assert!(manager.is_empty());
    }
}
