/// Configuration values for the sprite renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub vsync: bool,
    /// Color used when a frame ends without an explicit clear.
    pub clear_color: [f32; 4],
    /// Upper bound on draws queued in one frame. Sizes the uniform buffer.
    pub max_sprites_per_frame: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            max_sprites_per_frame: 2048,
        }
    }
}

impl RendererConfig {
    /// Enable or disable vertical sync.
    #[must_use]
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    #[must_use]
    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    /// Zero is bumped to one.
    #[must_use]
    pub fn with_max_sprites_per_frame(mut self, max: usize) -> Self {
        self.max_sprites_per_frame = max.max(1);
        self
    }
}
