//! 几何内核
//!
//! 提供旋转、有向矩形顶点、分离轴投影以及多边形基础运算。
//! 所有角度参数均为角度制（与画布的 `rotationDeg` 一致）。

use crate::math::{Point2, Vector2, EPSILON};
use serde::{Deserialize, Serialize};

/// 绕 (cx, cy) 旋转点 (x, y)
pub fn rotate_point(x: f64, y: f64, cx: f64, cy: f64, angle_deg: f64) -> Point2 {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let dx = x - cx;
    let dy = y - cy;
    Point2::new(cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
}

/// 旋转向量（绕原点）
pub fn rotate_vector(v: Vector2, angle_deg: f64) -> Vector2 {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    Vector2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// 有向矩形：左上角 + 尺寸 + 绕自身中心的旋转
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_deg: f64,
}

impl OrientedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64, rotation_deg: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation_deg,
        }
    }

    pub fn center(&self) -> Point2 {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// 四个角点（左上、右上、右下、左下），已绕中心旋转
    pub fn vertices(&self) -> [Point2; 4] {
        let c = self.center();
        let corners = [
            (self.x, self.y),
            (self.x + self.width, self.y),
            (self.x + self.width, self.y + self.height),
            (self.x, self.y + self.height),
        ];
        corners.map(|(x, y)| rotate_point(x, y, c.x, c.y, self.rotation_deg))
    }

    /// 点是否落在矩形内部（含边界）
    pub fn contains_point(&self, p: &Point2) -> bool {
        let c = self.center();
        // 把点转到矩形的局部坐标系
        let local = rotate_point(p.x, p.y, c.x, c.y, -self.rotation_deg);
        local.x >= self.x
            && local.x <= self.x + self.width
            && local.y >= self.y
            && local.y <= self.y + self.height
    }
}

/// 多边形各边的单位法向量
///
/// 对于画布坐标系中顺时针排列的顶点，法向量指向外侧。
pub fn axes(vertices: &[Point2]) -> Vec<Vector2> {
    let n = vertices.len();
    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let edge = vertices[(i + 1) % n] - vertices[i];
        let normal = Vector2::new(edge.y, -edge.x);
        let len = normal.norm();
        if len > EPSILON {
            result.push(normal / len);
        }
    }
    result
}

/// 投影区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub min: f64,
    pub max: f64,
}

impl Projection {
    /// 两个区间是否互相超出对方 `epsilon` 以上（贴边不算重叠）
    pub fn overlaps(&self, other: &Projection, epsilon: f64) -> bool {
        self.max > other.min + epsilon && other.max > self.min + epsilon
    }

    /// 沿轴把 `self` 移出 `other` 所需的最短有向位移
    ///
    /// 取向正、向负两侧中较近的一侧；一个区间包含另一个时同样成立。
    pub fn separation(&self, other: &Projection) -> f64 {
        let forward = other.max - self.min;
        let backward = self.max - other.min;
        if forward <= backward {
            forward
        } else {
            -backward
        }
    }
}

/// 将顶点投影到轴上
pub fn project(vertices: &[Point2], axis: &Vector2) -> Projection {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in vertices {
        let d = v.coords.dot(axis);
        min = min.min(d);
        max = max.max(d);
    }
    Projection { min, max }
}

/// 鞋带公式求有向面积
///
/// 在 Y 向下的画布中，正值表示视觉上的顺时针。
pub fn polygon_signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

pub fn polygon_area(points: &[Point2]) -> f64 {
    polygon_signed_area(points).abs()
}

/// 闭合多边形周长
pub fn polygon_perimeter(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| (points[(i + 1) % n] - points[i]).norm())
        .sum()
}

/// 两条无限长直线的交点，平行时返回 `None`
pub fn line_intersection(a1: Point2, a2: Point2, b1: Point2, b2: Point2) -> Option<Point2> {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let cross = d1.x * d2.y - d1.y * d2.x;

    // 平行
    if cross.abs() < EPSILON {
        return None;
    }

    let d = b1 - a1;
    let t = (d.x * d2.y - d.y * d2.x) / cross;
    Some(a1 + d1 * t)
}

fn orientation(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point2, b: Point2, p: Point2) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// 两条线段是否相交（包括端点接触与共线重叠）
pub fn segments_intersect(a1: Point2, a2: Point2, b1: Point2, b2: Point2) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);

    let sign = |v: f64| {
        if v.abs() < EPSILON {
            0
        } else if v > 0.0 {
            1
        } else {
            -1
        }
    };
    let (s1, s2, s3, s4) = (sign(o1), sign(o2), sign(o3), sign(o4));

    if s1 * s2 < 0 && s3 * s4 < 0 {
        return true;
    }

    (s1 == 0 && on_segment(a1, a2, b1))
        || (s2 == 0 && on_segment(a1, a2, b2))
        || (s3 == 0 && on_segment(b1, b2, a1))
        || (s4 == 0 && on_segment(b1, b2, a2))
}

/// 查找闭合多边形中第一对相交的非相邻边
pub fn find_self_intersection(points: &[Point2]) -> Option<(usize, usize)> {
    let n = points.len();
    if n < 4 {
        return None;
    }
    for i in 0..n {
        let a1 = points[i];
        let a2 = points[(i + 1) % n];
        for j in (i + 2)..n {
            // 首尾两条边共享顶点 0
            if i == 0 && j == n - 1 {
                continue;
            }
            let b1 = points[j];
            let b2 = points[(j + 1) % n];
            if segments_intersect(a1, a2, b1, b2) {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_point() {
        let p = rotate_point(10.0, 0.0, 0.0, 0.0, 90.0);
        assert!(p.x.abs() < EPSILON);
        assert!((p.y - 10.0).abs() < EPSILON);

        let p = rotate_point(5.0, 5.0, 5.0, 5.0, 37.0);
        assert!((p.x - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_vertices_rotated_about_center() {
        let rect = OrientedRect::new(0.0, 0.0, 100.0, 50.0, 90.0);
        let v = rect.vertices();
        // 中心 (50, 25)，旋转 90° 后左上角落到 (75, -25)
        assert!((v[0].x - 75.0).abs() < 1e-9);
        assert!((v[0].y + 25.0).abs() < 1e-9);
        for corner in &v {
            let d = (corner - rect.center()).norm();
            assert!((d - (50.0f64.powi(2) + 25.0f64.powi(2)).sqrt()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_axes_are_outward_unit_normals() {
        let rect = OrientedRect::new(0.0, 0.0, 10.0, 10.0, 0.0);
        let axes = axes(&rect.vertices());
        assert_eq!(axes.len(), 4);
        // 上边的法向量朝上（Y 负方向）
        assert!((axes[0].y + 1.0).abs() < EPSILON);
        // 右边的法向量朝右
        assert!((axes[1].x - 1.0).abs() < EPSILON);
        for a in &axes {
            assert!((a.norm() - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_projection_touching_is_not_overlap() {
        let a = Projection { min: 0.0, max: 10.0 };
        let b = Projection { min: 10.0, max: 20.0 };
        assert!(!a.overlaps(&b, 0.01));

        let c = Projection { min: 9.5, max: 20.0 };
        assert!(a.overlaps(&c, 0.01));
        // c 在右侧，a 向左退 0.5
        assert!((a.separation(&c) + 0.5).abs() < EPSILON);

        // 只重叠了容差以内
        let d = Projection { min: 9.995, max: 20.0 };
        assert!(!a.overlaps(&d, 0.01));
    }

    #[test]
    fn test_separation_when_contained() {
        let inner = Projection { min: 20.0, max: 30.0 };
        let outer = Projection { min: 0.0, max: 100.0 };
        // 从左侧退出更近
        assert!((inner.separation(&outer) + 30.0).abs() < EPSILON);

        let inner = Projection { min: 80.0, max: 90.0 };
        assert!((inner.separation(&outer) - 20.0).abs() < EPSILON);

        // 大区间包住小区间时也按较近一侧推开
        let small = Projection { min: 10.0, max: 20.0 };
        assert!((outer.separation(&small) - 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_shoelace_square() {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(100.0, 100.0),
            Point2::new(0.0, 100.0),
        ];
        assert!((polygon_signed_area(&square) - 10000.0).abs() < EPSILON);
        let reversed: Vec<Point2> = square.iter().rev().cloned().collect();
        assert!((polygon_signed_area(&reversed) + 10000.0).abs() < EPSILON);
        assert!((polygon_perimeter(&square) - 400.0).abs() < EPSILON);
    }

    #[test]
    fn test_line_intersection() {
        let p = line_intersection(
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
            Point2::new(10.0, 0.0),
        )
        .unwrap();
        assert!((p.x - 5.0).abs() < EPSILON);
        assert!((p.y - 5.0).abs() < EPSILON);

        // 延长线上的交点也算
        let p = line_intersection(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(5.0, -1.0),
            Point2::new(5.0, 1.0),
        )
        .unwrap();
        assert!((p.x - 5.0).abs() < EPSILON);

        assert!(line_intersection(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn test_bowtie_is_self_intersecting() {
        let bowtie = [
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 100.0),
            Point2::new(100.0, 0.0),
            Point2::new(0.0, 100.0),
        ];
        assert_eq!(find_self_intersection(&bowtie), Some((0, 2)));

        let l_shape = [
            Point2::new(0.0, 0.0),
            Point2::new(200.0, 0.0),
            Point2::new(200.0, 100.0),
            Point2::new(100.0, 100.0),
            Point2::new(100.0, 200.0),
            Point2::new(0.0, 200.0),
        ];
        assert_eq!(find_self_intersection(&l_shape), None);
    }

    #[test]
    fn test_contains_point_rotated() {
        let rect = OrientedRect::new(0.0, 0.0, 100.0, 20.0, 90.0);
        // 旋转后是竖长条，中心 (50, 10)
        assert!(rect.contains_point(&Point2::new(50.0, 50.0)));
        assert!(!rect.contains_point(&Point2::new(90.0, 10.0)));
    }
}
