//! 语速系数

use serde::{Deserialize, Serialize};
use std::fmt;

/// 语速系数，范围 [0.1, 2.0]，默认 1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeedFactor(f32);

impl SpeedFactor {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 2.0;
    pub const NORMAL: SpeedFactor = SpeedFactor(1.0);

    /// 裁剪到合法范围；非有限值退回默认值
    pub fn new(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(Self::MIN, Self::MAX))
        } else {
            Self::NORMAL
        }
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn is_normal(&self) -> bool {
        (self.0 - 1.0).abs() < f32::EPSILON
    }
}

impl Default for SpeedFactor {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for SpeedFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}x", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_clamped() {
        assert_eq!(SpeedFactor::new(5.0).value(), 2.0);
        assert_eq!(SpeedFactor::new(0.0).value(), 0.1);
        assert_eq!(SpeedFactor::new(f32::INFINITY), SpeedFactor::NORMAL);
        assert!(SpeedFactor::default().is_normal());
    }
}
