use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::POINTER_COLOR_SCALE;

/// Additive splat colour. Components are unbounded above; values past 1.0
/// overdrive the dye field and the bloom pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.r * k, self.g * k, self.b * k)
    }

    /// Convert 0–255 channel values to 0–1.
    pub fn normalized(self) -> Self {
        self.scale(1.0 / 255.0)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Hue, saturation and value all in `[0, 1]`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    match (i as i32).rem_euclid(6) {
        0 => Rgb::new(v, t, p),
        1 => Rgb::new(q, v, p),
        2 => Rgb::new(p, v, t),
        3 => Rgb::new(p, q, v),
        4 => Rgb::new(t, p, v),
        _ => Rgb::new(v, p, q),
    }
}

/// Random hue at the given saturation and value.
pub fn random_color(rng: &mut impl Rng, s: f32, v: f32) -> Rgb {
    hsv_to_rgb(rng.gen::<f32>(), s, v)
}

/// Dim random colour used for pointer trails.
pub fn pointer_color(rng: &mut impl Rng) -> Rgb {
    random_color(rng, 1.0, 1.0).scale(POINTER_COLOR_SCALE)
}
