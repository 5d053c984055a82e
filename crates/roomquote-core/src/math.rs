//! 基础数学类型
//!
//! 画布坐标系：X 向右，Y 向下，单位为画布像素（与厘米一比一）。

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type Point2 = nalgebra::Point2<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;

/// 通用浮点容差
pub const EPSILON: f64 = 1e-9;

/// 检查所有数值是否有限（非 NaN、非无穷）
pub fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// 保留两位小数（用于路径字符串输出）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 点的 `{x, y}` 线上格式
#[derive(Serialize, Deserialize)]
struct XY {
    x: f64,
    y: f64,
}

/// 以 `{x, y}` 对象序列化单个点
pub mod xy {
    use super::*;

    pub fn serialize<S: Serializer>(p: &Point2, s: S) -> Result<S::Ok, S::Error> {
        XY { x: p.x, y: p.y }.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Point2, D::Error> {
        let v = XY::deserialize(d)?;
        Ok(Point2::new(v.x, v.y))
    }
}

/// 以 `[{x, y}, ...]` 序列化点列表
pub mod xy_vec {
    use super::*;

    pub fn serialize<S: Serializer>(points: &[Point2], s: S) -> Result<S::Ok, S::Error> {
        let wire: Vec<XY> = points.iter().map(|p| XY { x: p.x, y: p.y }).collect();
        wire.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Point2>, D::Error> {
        let wire = Vec::<XY>::deserialize(d)?;
        Ok(wire.into_iter().map(|v| Point2::new(v.x, v.y)).collect())
    }
}
