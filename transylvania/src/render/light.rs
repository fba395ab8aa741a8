use glam::Vec3;

/// A point light shading normal-mapped sprites.
///
/// Only one light affects a draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    /// Position in world coordinates. `z` is the height above the sprite plane.
    pub position: Vec3,
    /// Color of the light (RGB, typically 0.0-1.0)
    pub color: [f32; 3],
    /// Brightness multiplier (0.0 = off)
    pub power: f32,
}

impl Light {
    pub fn new(position: Vec3, color: [f32; 3], power: f32) -> Self {
        Self {
            position,
            color,
            power,
        }
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn with_power(mut self, power: f32) -> Self {
        self.power = power;
        self
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 100.0),
            color: [1.0, 1.0, 1.0],
            power: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let light = Light::default().with_color([1.0, 0.5, 0.0]).with_power(2.5);
        assert_eq!(light.position, Vec3::new(0.0, 0.0, 100.0));
        assert_eq!(light.color, [1.0, 0.5, 0.0]);
        assert_eq!(light.power, 2.5);
        assert_eq!(light, Light::new(Vec3::new(0.0, 0.0, 100.0), [1.0, 0.5, 0.0], 2.5));
    }
}
