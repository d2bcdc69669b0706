// Math types without direct glam equivalents.
// Vector fields use glam's `Vec2` / `Vec3`; colours get their own struct with
// conversions to and from `Vec4`.

use glam::Vec4;

/// Linear colour (float RGBA, 0.0–1.0 range). Storage type of `Color` fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const RED: Color = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const GREEN: Color = Color { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };
    pub const BLUE: Color = Color { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// Build from 8-bit channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        let f = |c: u8| c as f32 / 255.0;
        Color { r: f(r), g: f(g), b: f(b), a: f(a) }
    }

    /// Quantize to 8-bit channels (clamped).
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl From<Color> for Vec4 {
    fn from(c: Color) -> Vec4 {
        Vec4::new(c.r, c.g, c.b, c.a)
    }
}

impl From<Vec4> for Color {
    fn from(v: Vec4) -> Color {
        Color { r: v.x, g: v.y, b: v.z, a: v.w }
    }
}
