//! Unit quad drawn for every sprite, one array per vertex attribute.

/// Shader locations of the quad attributes.
pub(crate) const LOC_VERTEX: u32 = 0;
pub(crate) const LOC_NORMAL: u32 = 1;
pub(crate) const LOC_TANGENT: u32 = 2;
pub(crate) const LOC_TEX_COORD: u32 = 3;

pub(crate) const VERTEX_COUNT: u32 = 6;

pub(crate) const POSITIONS: [[f32; 4]; 6] = [
    [0.0, 0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0, 1.0],
];

pub(crate) const NORMALS: [[f32; 3]; 6] = [[0.0, 0.0, 1.0]; 6];

pub(crate) const TANGENTS: [[f32; 3]; 6] = [[1.0, 0.0, 0.0]; 6];

// v runs top to bottom in the texture, so the bottom edge of the quad samples v = 1.
pub(crate) const TEX_COORDS: [[f32; 3]; 6] = [
    [0.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 0.0, 1.0],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tex_coords_follow_positions() {
        for (pos, uv) in POSITIONS.iter().zip(TEX_COORDS.iter()) {
            assert_eq!(uv[0], pos[0]);
            assert_eq!(uv[1], 1.0 - pos[1]);
            assert_eq!(uv[2], 1.0);
        }
        assert_eq!(POSITIONS.len() as u32, VERTEX_COUNT);
    }
}
