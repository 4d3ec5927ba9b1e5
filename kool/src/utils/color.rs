use nalgebra::{Vector3, Vector4};

/// Linear RGBA color, uploaded as a `vec4` uniform.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color::new(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Color { a, ..self }
    }

    pub fn to_vec4(self) -> Vector4<f32> {
        Vector4::new(self.r, self.g, self.b, self.a)
    }

    pub fn to_vec3(self) -> Vector3<f32> {
        Vector3::new(self.r, self.g, self.b)
    }
}

impl From<Vector4<f32>> for Color {
    fn from(v: Vector4<f32>) -> Self {
        Color::new(v.x, v.y, v.z, v.w)
    }
}

impl From<Color> for Vector4<f32> {
    fn from(c: Color) -> Self {
        c.to_vec4()
    }
}
