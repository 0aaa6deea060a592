//! Decomposed component transformations
//!
//! The host edits component placement as separate translate, rotate,
//! scale and skew values. Glyphs 3 stores the same decomposition, Glyphs 2
//! stores a raw matrix, so both directions go through [`kurbo::Affine`].

use kurbo::Affine;
use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecomposedTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    /// Degrees, counter-clockwise
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Degrees
    pub skew_x: f64,
    /// Degrees
    pub skew_y: f64,
    pub t_center_x: f64,
    pub t_center_y: f64,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            t_center_x: 0.0,
            t_center_y: 0.0,
        }
    }
}

impl DecomposedTransform {
    pub fn translation(x: f64, y: f64) -> Self {
        Self {
            translate_x: x,
            translate_y: y,
            ..Self::default()
        }
    }

    /// Compose into a matrix: translate, rotate, scale, skew, in that
    /// order, around the transformation center.
    pub fn to_affine(&self) -> Affine {
        let skew = Affine::new([
            1.0,
            self.skew_y.to_radians().tan(),
            self.skew_x.to_radians().tan(),
            1.0,
            0.0,
            0.0,
        ]);
        Affine::translate((
            self.translate_x + self.t_center_x,
            self.translate_y + self.t_center_y,
        )) * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * skew
            * Affine::translate((-self.t_center_x, -self.t_center_y))
    }

    /// Decompose a matrix. The result has no skew on the y axis and a
    /// zero transformation center.
    pub fn from_affine(affine: Affine) -> Self {
        let [mut a, mut b, c, d, x, y] = affine.as_coeffs();
        let sign = if a < 0.0 { -1.0 } else { 1.0 };
        a *= sign;
        b *= sign;
        let delta = a * d - b * c;

        let (mut rotation, mut scale_x, mut scale_y, mut skew_x, mut skew_y) =
            (0.0, 0.0, 0.0, 0.0, 0.0);
        if a != 0.0 || b != 0.0 {
            let r = a.hypot(b);
            rotation = if b >= 0.0 { (a / r).acos() } else { -(a / r).acos() };
            scale_x = r;
            scale_y = delta / r;
            skew_x = ((a * c + b * d) / (r * r)).atan();
        } else if c != 0.0 || d != 0.0 {
            let s = c.hypot(d);
            rotation = std::f64::consts::FRAC_PI_2
                - if d >= 0.0 { (-c / s).acos() } else { -(c / s).acos() };
            scale_x = delta / s;
            scale_y = s;
            skew_y = ((a * c + b * d) / (s * s)).atan();
        }

        Self {
            translate_x: x,
            translate_y: y,
            rotation: rotation.to_degrees(),
            scale_x: scale_x * sign,
            scale_y,
            skew_x: skew_x.to_degrees() * sign,
            skew_y: skew_y.to_degrees(),
            t_center_x: 0.0,
            t_center_y: 0.0,
        }
    }

    pub fn has_skew(&self) -> bool {
        self.skew_x.abs() > EPSILON || self.skew_y.abs() > EPSILON
    }

    pub fn has_center(&self) -> bool {
        self.t_center_x.abs() > EPSILON || self.t_center_y.abs() > EPSILON
    }

    /// Same transformation expressed without a transformation center
    pub fn without_center(&self) -> Self {
        if self.has_center() {
            Self::from_affine(self.to_affine())
        } else {
            *self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    fn assert_coeffs_close(a: Affine, b: Affine) {
        for (x, y) in a.as_coeffs().iter().zip(b.as_coeffs().iter()) {
            assert_close(*x, *y);
        }
    }

    #[test]
    fn test_identity() {
        assert_coeffs_close(DecomposedTransform::default().to_affine(), Affine::IDENTITY);
        assert_eq!(
            DecomposedTransform::from_affine(Affine::IDENTITY),
            DecomposedTransform::default()
        );
    }

    #[test]
    fn test_translate_scale_round_trip() {
        let affine = Affine::new([0.8, 0.0, 0.0, 0.8, 50.0, 25.0]);
        let decomposed = DecomposedTransform::from_affine(affine);
        assert_close(decomposed.scale_x, 0.8);
        assert_close(decomposed.scale_y, 0.8);
        assert_close(decomposed.translate_x, 50.0);
        assert_close(decomposed.rotation, 0.0);
        assert_coeffs_close(decomposed.to_affine(), affine);
    }

    #[test]
    fn test_rotation_and_flip() {
        let rotated = DecomposedTransform {
            rotation: 90.0,
            ..DecomposedTransform::default()
        };
        let back = DecomposedTransform::from_affine(rotated.to_affine());
        assert_close(back.rotation, 90.0);
        assert_close(back.scale_x, 1.0);

        let flipped = Affine::new([-1.0, 0.0, 0.0, 1.0, 500.0, 0.0]);
        let decomposed = DecomposedTransform::from_affine(flipped);
        assert_close(decomposed.scale_x, -1.0);
        assert_coeffs_close(decomposed.to_affine(), flipped);
    }

    #[test]
    fn test_center_is_folded_into_translation() {
        let centered = DecomposedTransform {
            rotation: 180.0,
            t_center_x: 100.0,
            t_center_y: 100.0,
            ..DecomposedTransform::default()
        };
        let plain = centered.without_center();
        assert!(!plain.has_center());
        assert_close(plain.translate_x, 200.0);
        assert_close(plain.translate_y, 200.0);
        assert_coeffs_close(plain.to_affine(), centered.to_affine());
    }

    #[test]
    fn test_skew_detection() {
        let skewed = DecomposedTransform::from_affine(Affine::new([1.0, 0.0, 0.2, 1.0, 0.0, 0.0]));
        assert!(skewed.has_skew());
        assert!(!DecomposedTransform::translation(10.0, 0.0).has_skew());
    }
}
