use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

use crate::frame::FrameData;
use crate::math::{transform_4x4, Vec2};
use crate::render::light::Light;

/// Per-draw inputs: camera matrices, placement, sheet cell and optional light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawParams {
    pub proj: Mat4,
    pub view: Mat4,
    /// World position of the sprite's bottom-left corner.
    pub position: Vec2,
    pub layer: f32,
    pub frame_x: u32,
    pub frame_y: u32,
    pub light: Option<Light>,
}

impl DrawParams {
    pub fn new(proj: Mat4, view: Mat4) -> Self {
        Self {
            proj,
            view,
            position: Vec2::ZERO,
            layer: 0.0,
            frame_x: 0,
            frame_y: 0,
            light: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn with_layer(mut self, layer: f32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_frame(mut self, frame_x: u32, frame_y: u32) -> Self {
        self.frame_x = frame_x;
        self.frame_y = frame_y;
        self
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.light = Some(light);
        self
    }

    /// Light the draw with the first of `lights`. The rest are ignored.
    pub fn with_lights(mut self, lights: &[Light]) -> Self {
        if lights.len() > 1 {
            log::warn!(
                "{} lights given, only the first one is used",
                lights.len()
            );
        }
        self.light = lights.first().copied();
        self
    }
}

/// Uniform block of `sprite.wgsl`. Field order and padding follow WGSL uniform layout.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct SpriteUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    /// mat3x3 columns, each padded to a vec4
    pub tex: [[f32; 4]; 3],
    pub light_position: [f32; 3],
    pub light_power: f32,
    pub light_color: [f32; 3],
    pub light_enabled: f32,
}

impl SpriteUniforms {
    pub fn new(frame: &FrameData, params: &DrawParams) -> Self {
        let model = transform_4x4(
            frame.width(),
            frame.height(),
            params.position.x,
            params.position.y,
            params.layer,
        );
        let tex = frame.tex_matrix(params.frame_x, params.frame_y);

        let (light_position, light_color, light_power, light_enabled) = match params.light {
            Some(light) => (light.position.to_array(), light.color, light.power, 1.0),
            None => ([0.0; 3], [0.0; 3], 0.0, 0.0),
        };

        Self {
            model: model.to_cols_array_2d(),
            view: params.view.to_cols_array_2d(),
            proj: params.proj.to_cols_array_2d(),
            tex: pad_mat3(tex),
            light_position,
            light_power,
            light_color,
            light_enabled,
        }
    }
}

fn pad_mat3(m: Mat3) -> [[f32; 4]; 3] {
    [
        m.x_axis.extend(0.0).to_array(),
        m.y_axis.extend(0.0).to_array(),
        m.z_axis.extend(0.0).to_array(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn frame() -> FrameData {
        FrameData::new(32.0, 16.0, 4, 2).unwrap()
    }

    #[test]
    fn uniform_block_matches_shader_size() {
        assert_eq!(std::mem::size_of::<SpriteUniforms>(), 272);
    }

    #[test]
    fn model_matrix_scales_to_frame_size() {
        let params = DrawParams::new(Mat4::IDENTITY, Mat4::IDENTITY)
            .at(5.0, 7.0)
            .with_layer(2.0);
        let u = SpriteUniforms::new(&frame(), &params);
        let model = Mat4::from_cols_array_2d(&u.model);
        assert_eq!(model, transform_4x4(32.0, 16.0, 5.0, 7.0, 2.0));
        assert_eq!(u.view, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn tex_matrix_is_padded_per_column() {
        let params = DrawParams::new(Mat4::IDENTITY, Mat4::IDENTITY).with_frame(1, 1);
        let u = SpriteUniforms::new(&frame(), &params);
        assert_eq!(u.tex[0], [0.25, 0.0, 0.0, 0.0]);
        assert_eq!(u.tex[1], [0.0, 0.5, 0.0, 0.0]);
        assert_eq!(u.tex[2], [0.25, 0.5, 1.0, 0.0]);
    }

    #[test]
    fn unlit_draw_disables_light() {
        let params = DrawParams::new(Mat4::IDENTITY, Mat4::IDENTITY);
        let u = SpriteUniforms::new(&frame(), &params);
        assert_eq!(u.light_enabled, 0.0);
        assert_eq!(u.light_power, 0.0);
    }

    #[test]
    fn only_first_light_is_used() {
        let first = Light::new(Vec3::new(1.0, 2.0, 3.0), [1.0, 0.5, 0.25], 2.0);
        let second = Light::default();
        let params = DrawParams::new(Mat4::IDENTITY, Mat4::IDENTITY).with_lights(&[first, second]);
        assert_eq!(params.light, Some(first));

        let u = SpriteUniforms::new(&frame(), &params);
        assert_eq!(u.light_enabled, 1.0);
        assert_eq!(u.light_position, [1.0, 2.0, 3.0]);
        assert_eq!(u.light_color, [1.0, 0.5, 0.25]);
        assert_eq!(u.light_power, 2.0);
    }

    #[test]
    fn empty_light_list_means_unlit() {
        let params = DrawParams::new(Mat4::IDENTITY, Mat4::IDENTITY)
            .with_light(Light::default())
            .with_lights(&[]);
        assert_eq!(params.light, None);
    }
}
