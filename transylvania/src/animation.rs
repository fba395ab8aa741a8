use glam::Mat4;

use crate::frame::FrameData;
use crate::math::Vec2;
use crate::render::{DrawParams, Light};
use crate::sprite::{GroupId, Membership, Sprite};

/// Steps through the cells of a sprite sheet at a fixed rate.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameAnimation {
    /// First frame index (row-major) of the sequence.
    first: usize,
    /// Number of frames in the sequence, at least one.
    frames: usize,
    /// How long each frame lasts in seconds.
    frame_duration: f32,
    pub looping: bool,
    pub playing: bool,
    pub speed: f32,
    pub loop_count: usize,
    current: usize,
    timer: f32,
}

impl FrameAnimation {
    /// Animation over every cell of the sheet.
    pub fn from_frames(frame: &FrameData, frame_duration: f32) -> Self {
        Self::range(0, frame.frame_count(), frame_duration)
    }

    /// Animation over `len` frames starting at `first`.
    pub fn range(first: usize, len: usize, frame_duration: f32) -> Self {
        Self {
            first,
            frames: len.max(1),
            frame_duration,
            looping: true,
            playing: true,
            speed: 1.0,
            loop_count: 0,
            current: 0,
            timer: 0.0,
        }
    }

    pub fn once(mut self) -> Self {
        self.looping = false;
        self
    }

    pub fn update(&mut self, dt: f32) {
        let advance = dt * self.speed;
        if !self.playing
            || !advance.is_finite()
            || !self.frame_duration.is_finite()
            || self.frame_duration <= 0.0
        {
            return;
        }

        self.timer += advance;
        if self.timer < self.frame_duration {
            return;
        }

        // Float to int casts saturate, so a huge step count cannot wrap.
        let steps = (self.timer / self.frame_duration).floor() as usize;
        self.timer %= self.frame_duration;
        let target = self.current.saturating_add(steps);

        if target < self.frames {
            self.current = target;
        } else if self.looping {
            self.loop_count = self.loop_count.saturating_add(target / self.frames);
            self.current = target % self.frames;
        } else {
            self.current = self.frames - 1;
            self.playing = false;
            self.timer = 0.0;
        }
    }

    /// Number of frames in the sequence.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn frame_duration(&self) -> f32 {
        self.frame_duration
    }

    /// Row-major index of the frame currently shown.
    pub fn current_frame(&self) -> usize {
        self.first + self.current
    }

    /// Reset animation to start.
    pub fn reset(&mut self) {
        self.current = 0;
        self.timer = 0.0;
        self.loop_count = 0;
        self.playing = true;
    }
}

/// A positioned, animated sprite taking part in group membership.
#[derive(Clone, Debug)]
pub struct AnimatedSprite {
    /// Name of the sheet in the sprite manager.
    pub sheet: String,
    pub frame: FrameData,
    pub position: Vec2,
    pub layer: f32,
    pub animation: FrameAnimation,
    membership: Membership,
}

impl AnimatedSprite {
    pub fn new(sheet: impl Into<String>, frame: FrameData, animation: FrameAnimation) -> Self {
        Self {
            sheet: sheet.into(),
            frame,
            position: Vec2::ZERO,
            layer: 0.0,
            animation,
            membership: Membership::new(),
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_layer(mut self, layer: f32) -> Self {
        self.layer = layer;
        self
    }

    /// Grid cell of the current frame.
    pub fn cell(&self) -> (u32, u32) {
        self.frame.cell(self.animation.current_frame())
    }

    pub fn draw_params(&self, proj: Mat4, view: Mat4, light: Option<Light>) -> DrawParams {
        let (frame_x, frame_y) = self.cell();
        let mut params = DrawParams::new(proj, view)
            .at(self.position.x, self.position.y)
            .with_layer(self.layer)
            .with_frame(frame_x, frame_y);
        params.light = light;
        params
    }
}

impl Sprite for AnimatedSprite {
    fn update(&mut self, dt: f32) {
        self.animation.update(dt);
    }

    fn add(&mut self, groups: &[GroupId]) {
        self.membership.add(groups);
    }

    fn remove(&mut self, groups: &[GroupId]) {
        self.membership.remove(groups);
    }

    fn kill(&mut self) {
        self.membership.kill();
    }

    fn alive(&self) -> bool {
        self.membership.alive()
    }

    fn groups(&self) -> &[GroupId] {
        self.membership.groups()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> FrameData {
        FrameData::new(16.0, 16.0, 3, 2).unwrap()
    }

    #[test]
    fn loops_through_all_frames() {
        let mut anim = FrameAnimation::from_frames(&sheet(), 0.5);
        assert_eq!(anim.frames(), 6);
        for expected in [1, 2, 3, 4, 5, 0] {
            anim.update(0.5);
            assert_eq!(anim.current_frame(), expected);
        }
        assert_eq!(anim.loop_count, 1);
    }

    #[test]
    fn large_step_skips_frames() {
        let mut anim = FrameAnimation::range(0, 4, 0.25);
        anim.update(0.75);
        assert_eq!(anim.current_frame(), 3);
    }

    #[test]
    fn one_shot_stops_on_last_frame() {
        let mut anim = FrameAnimation::range(2, 3, 1.0).once();
        anim.update(10.0);
        assert_eq!(anim.current_frame(), 4);
        assert!(!anim.playing);

        anim.reset();
        assert_eq!(anim.current_frame(), 2);
        assert!(anim.playing);
    }

    #[test]
    fn tiny_durations_and_long_pauses_finish() {
        let mut anim = FrameAnimation::range(0, 4, 1e-10);
        anim.update(0.016);
        assert!(anim.current_frame() < 4);
        assert!(anim.loop_count > 0);

        let mut anim = FrameAnimation::range(0, 4, 0.1);
        anim.update(2.0e7);
        assert!(anim.current_frame() < 4);
        assert!(anim.timer < anim.frame_duration());

        let mut anim = FrameAnimation::range(0, 4, 0.1).once();
        anim.update(2.0e7);
        assert_eq!(anim.current_frame(), 3);
        assert!(!anim.playing);
    }

    #[test]
    fn empty_range_still_has_one_frame() {
        let mut anim = FrameAnimation::range(5, 0, 0.1).once();
        assert_eq!(anim.frames(), 1);
        anim.update(1.0);
        assert_eq!(anim.current_frame(), 5);
    }

    #[test]
    fn paused_or_bad_input_does_nothing() {
        let mut anim = FrameAnimation::range(0, 4, 0.1);
        anim.update(f32::NAN);
        anim.update(f32::INFINITY);
        assert_eq!(anim.current_frame(), 0);

        anim.playing = false;
        anim.update(1.0);
        assert_eq!(anim.current_frame(), 0);
    }

    #[test]
    fn sprite_update_drives_the_cell() {
        let mut sprite = AnimatedSprite::new("bat", sheet(), FrameAnimation::from_frames(&sheet(), 0.1))
            .with_position(Vec2::new(4.0, 8.0))
            .with_layer(1.0);
        assert_eq!(sprite.cell(), (0, 0));

        for _ in 0..4 {
            sprite.update(0.1);
        }
        assert_eq!(sprite.cell(), (1, 1));

        let params = sprite.draw_params(Mat4::IDENTITY, Mat4::IDENTITY, None);
        assert_eq!((params.frame_x, params.frame_y), (1, 1));
        assert_eq!(params.position, Vec2::new(4.0, 8.0));
        assert_eq!(params.layer, 1.0);
        assert_eq!(params.light, None);
    }

    #[test]
    fn sprite_delegates_group_membership() {
        let mut sprite = AnimatedSprite::new("bat", sheet(), FrameAnimation::range(0, 1, 1.0));
        assert!(!sprite.alive());
        sprite.add(&[GroupId(1), GroupId(2)]);
        assert!(sprite.alive());
        sprite.remove(&[GroupId(1)]);
        assert_eq!(sprite.groups(), &[GroupId(2)]);
        sprite.kill();
        assert!(!sprite.alive());
    }
}
