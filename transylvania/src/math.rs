use glam::{Mat3, Mat4, Vec3};

/// 2D vector used for sprite positions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from(value: (f32, f32)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Div<f32> for Vec2 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

/// Scale then translate in 2D homogeneous coordinates.
///
/// Used for texture coordinates: `(u, v, 1)` maps to `(u * sx + tx, v * sy + ty, 1)`.
pub fn transform_3x3(scale_x: f32, scale_y: f32, trans_x: f32, trans_y: f32) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(scale_x, 0.0, 0.0),
        Vec3::new(0.0, scale_y, 0.0),
        Vec3::new(trans_x, trans_y, 1.0),
    )
}

/// Scale in x/y then translate in 3D. Z is left unscaled so it can carry the layer.
pub fn transform_4x4(scale_x: f32, scale_y: f32, trans_x: f32, trans_y: f32, trans_z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(trans_x, trans_y, trans_z))
        * Mat4::from_scale(Vec3::new(scale_x, scale_y, 1.0))
}

/// Camera producing the view and projection matrices handed to sprite draws.
///
/// World space is y-up with the origin at the bottom-left of the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    /// Layers outside `min_layer..=max_layer` are clipped.
    pub min_layer: f32,
    pub max_layer: f32,
}

impl Camera2D {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn view(&self) -> Mat4 {
        let zoom = Mat4::from_scale(Vec3::new(self.zoom, self.zoom, 1.0));
        let translation =
            Mat4::from_translation(Vec3::new(-self.position.x, -self.position.y, 0.0));
        zoom * translation
    }

    pub fn projection(&self, width: u32, height: u32) -> Mat4 {
        // orthographic_rh looks down -z, so higher layers map to smaller depth.
        Mat4::orthographic_rh(
            0.0,
            width as f32,
            0.0,
            height as f32,
            -self.max_layer,
            -self.min_layer,
        )
    }

    pub fn view_projection(&self, width: u32, height: u32) -> Mat4 {
        self.projection(width, height) * self.view()
    }

    /// Converts window coordinates (origin top-left, y-down) to world coordinates.
    pub fn screen_to_world(&self, screen_pos: Vec2, _screen_width: u32, screen_height: u32) -> Vec2 {
        let flipped = Vec2::new(screen_pos.x, screen_height as f32 - screen_pos.y);
        flipped / self.zoom + self.position
    }

    /// Converts world coordinates to window coordinates (origin top-left, y-down).
    pub fn world_to_screen(&self, world_pos: Vec2, _screen_width: u32, screen_height: u32) -> Vec2 {
        let view = (world_pos - self.position) * self.zoom;
        Vec2::new(view.x, screen_height as f32 - view.y)
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            min_layer: -1000.0,
            max_layer: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn tex_transform_scales_then_offsets() {
        let m = transform_3x3(0.25, 0.5, 0.75, 0.5);
        let uv = m * Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(uv, Vec3::new(1.0, 1.0, 1.0));
        let uv = m * Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(uv, Vec3::new(0.75, 0.5, 1.0));
    }

    #[test]
    fn model_transform_keeps_layer_in_z() {
        let m = transform_4x4(32.0, 16.0, 10.0, 20.0, 3.0);
        let corner = m * Vec4::new(1.0, 1.0, 0.0, 1.0);
        assert_eq!(corner, Vec4::new(42.0, 36.0, 3.0, 1.0));
        let origin = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(origin, Vec4::new(10.0, 20.0, 3.0, 1.0));
    }

    #[test]
    fn projection_maps_viewport_to_clip_space() {
        let camera = Camera2D::default();
        let vp = camera.view_projection(800, 600);
        let bottom_left = vp * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let top_right = vp * Vec4::new(800.0, 600.0, 0.0, 1.0);
        assert!((bottom_left.x + 1.0).abs() < 1e-6);
        assert!((bottom_left.y + 1.0).abs() < 1e-6);
        assert!((top_right.x - 1.0).abs() < 1e-6);
        assert!((top_right.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn layers_inside_range_are_visible() {
        let camera = Camera2D::default();
        let proj = camera.projection(100, 100);
        for layer in [-999.0, 0.0, 999.0] {
            let z = (proj * Vec4::new(0.0, 0.0, layer, 1.0)).z;
            assert!((0.0..=1.0).contains(&z), "layer {layer} mapped to depth {z}");
        }
    }

    #[test]
    fn screen_world_round_trip() {
        let camera = Camera2D {
            position: Vec2::new(50.0, 25.0),
            zoom: 2.0,
            ..Camera2D::default()
        };
        let world = camera.screen_to_world(Vec2::new(100.0, 100.0), 800, 600);
        assert_eq!(world, Vec2::new(100.0, 275.0));
        let screen = camera.world_to_screen(world, 800, 600);
        assert_eq!(screen, Vec2::new(100.0, 100.0));
    }
}
