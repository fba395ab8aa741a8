use std::path::PathBuf;

/// Errors raised while reading sprite resources from disk or memory.
#[derive(Debug, thiserror::Error)]
pub enum SpriteError {
    #[error("file {0} does not exist.")]
    MissingFile(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed frame metadata in {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid frame metadata: {0}")]
    InvalidFrame(String),

    #[error("failed to decode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{kind} map is {actual:?} but the sprite is {expected:?}")]
    SizeMismatch {
        kind: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("sprite name {0:?} must be a single directory name")]
    InvalidName(String),

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    PixelLength { expected: usize, actual: usize },
}

/// Errors raised while building the sprite shader program.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("sprite shader failed to build:\n{0}")]
    Compile(String),
}
