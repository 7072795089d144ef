//! 2-D vector arithmetic shared by every crate in this workspace.

use nalgebra::Vector2;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// An immutable pair of finite 64-bit floats.
///
/// Arithmetic is delegated to `nalgebra::Vector2` so the rest of the
/// workspace gets the same vector algebra it already uses for drivetrain
/// kinematics; the public surface here is the plain `{x, y}` pair the wire
/// format (§6) requires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2(Vector2<f64>);

impl Vec2 {
    pub const ZERO: Vec2 = Vec2(Vector2::new(0.0, 0.0));

    pub fn new(x: f64, y: f64) -> Self {
        Vec2(Vector2::new(x, y))
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn dot(&self, other: Vec2) -> f64 {
        self.0.dot(&other.0)
    }

    pub fn norm_squared(&self) -> f64 {
        self.0.norm_squared()
    }

    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    pub fn is_finite(&self) -> bool {
        self.0.x.is_finite() && self.0.y.is_finite()
    }

    /// Returns `self` scaled to unit length, or `fallback` if `self` is the
    /// zero vector (or otherwise too small to normalize safely).
    pub fn normalize_or(&self, fallback: Vec2) -> Vec2 {
        let n = self.norm();
        if n <= f64::EPSILON {
            fallback
        } else {
            Vec2(self.0 / n)
        }
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Vec2::ZERO
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2(self.0 + rhs.0)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2(self.0 - rhs.0)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2(-self.0)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2(self.0 * rhs)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f64) -> Vec2 {
        Vec2(self.0 / rhs)
    }
}

impl Serialize for Vec2 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("Vec2", 2)?;
        s.serialize_field("x", &self.0.x)?;
        s.serialize_field("y", &self.0.y)?;
        s.end()
    }
}

impl<'de> Deserialize<'de> for Vec2 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(field_identifier, rename_all = "lowercase")]
        enum Field {
            X,
            Y,
        }

        struct Vec2Visitor;

        impl<'de> Visitor<'de> for Vec2Visitor {
            type Value = Vec2;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a struct with x and y fields")
            }

            fn visit_map<V>(self, mut map: V) -> Result<Vec2, V::Error>
            where
                V: MapAccess<'de>,
            {
                let mut x: Option<f64> = None;
                let mut y: Option<f64> = None;
                while let Some(key) = map.next_key()? {
                    match key {
                        Field::X => x = Some(map.next_value()?),
                        Field::Y => y = Some(map.next_value()?),
                    }
                }
                let x = x.ok_or_else(|| de::Error::missing_field("x"))?;
                let y = y.ok_or_else(|| de::Error::missing_field("y"))?;
                Ok(Vec2::new(x, y))
            }
        }

        deserializer.deserialize_struct("Vec2", &["x", "y"], Vec2Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_scale() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);
        assert_eq!(a + b, Vec2::new(4.0, 1.0));
        assert_eq!(a - b, Vec2::new(-2.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(b / 2.0, Vec2::new(1.5, -0.5));
    }

    #[test]
    fn dot_and_norm() {
        let a = Vec2::new(3.0, 4.0);
        assert!((a.norm() - 5.0).abs() < 1e-12);
        assert!((a.norm_squared() - 25.0).abs() < 1e-12);
        assert!((a.dot(Vec2::new(1.0, 0.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn finiteness() {
        assert!(Vec2::new(1.0, 2.0).is_finite());
        assert!(!Vec2::new(f64::NAN, 0.0).is_finite());
        assert!(!Vec2::new(f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn normalize_or_fallback() {
        let zero = Vec2::ZERO;
        assert_eq!(zero.normalize_or(Vec2::new(1.0, 0.0)), Vec2::new(1.0, 0.0));
        let v = Vec2::new(0.0, 5.0);
        assert_eq!(v.normalize_or(Vec2::ZERO), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn json_round_trip() {
        let v = Vec2::new(1.5, -2.25);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"x":1.5,"y":-2.25}"#);
        let back: Vec2 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
