//! 区域绘制与墙体外扩
//!
//! 绘制流程：`Idle → Drawing → Idle(提交 / 取消)`。
//! - 每次点击追加一个顶点
//! - 候选点距起点 20px 内时吸附到起点并闭合，否则相对上一个顶点正交锁定
//! - 地板 / 天花板按鞋带公式计算坪数
//! - 墙体沿外法线偏移厚度得到外环，外环 + 原始内环以 evenodd 填充成空心带

use crate::config::LayoutConfig;
use crate::error::{LayoutError, LayoutResult};
use crate::geometry::{find_self_intersection, line_intersection, polygon_area, polygon_signed_area};
use crate::math::{all_finite, round2, Point2, Vector2, EPSILON};
use crate::model::{EntityId, LayoutDocument, Region, RegionKind};
use std::fmt::Write;

/// 候选顶点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub point: Point2,
    /// 是否吸附到起点（点击即闭合）
    pub closes: bool,
}

/// 一次点击的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStep {
    /// 追加了新顶点
    Added,
    /// 与上一个顶点重合，忽略
    Ignored,
    /// 点在起点上，应当完成绘制
    Close,
}

/// 正在绘制的区域
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDraft {
    pub kind: RegionKind,
    pub points: Vec<Point2>,
    /// 墙体厚度（仅墙体使用）
    pub thickness: f64,
}

impl RegionDraft {
    pub fn new(kind: RegionKind, config: &LayoutConfig) -> Self {
        Self {
            kind,
            points: Vec::new(),
            thickness: config.default_wall_thickness,
        }
    }

    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    /// 计算指针位置对应的候选顶点
    pub fn candidate(&self, raw: Point2, suppress_lock: bool, config: &LayoutConfig) -> Candidate {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return Candidate {
                point: raw,
                closes: false,
            };
        };

        if self.points.len() >= 3 && (raw - first).norm() <= config.close_snap_distance {
            return Candidate {
                point: *first,
                closes: true,
            };
        }

        if suppress_lock {
            return Candidate {
                point: raw,
                closes: false,
            };
        }

        // 正交锁定：保留位移较大的轴
        let d = raw - last;
        let point = if d.x.abs() >= d.y.abs() {
            Point2::new(raw.x, last.y)
        } else {
            Point2::new(last.x, raw.y)
        };
        Candidate {
            point,
            closes: false,
        }
    }

    /// 处理一次点击
    pub fn click(&mut self, raw: Point2, suppress_lock: bool, config: &LayoutConfig) -> DraftStep {
        let candidate = self.candidate(raw, suppress_lock, config);
        if candidate.closes {
            return DraftStep::Close;
        }
        if let Some(last) = self.points.last() {
            if (candidate.point - last).norm() < 1e-6 {
                return DraftStep::Ignored;
            }
        }
        self.points.push(candidate.point);
        DraftStep::Added
    }

    /// 撤回最后一个顶点
    pub fn undo_last(&mut self) -> Option<Point2> {
        self.points.pop()
    }

    /// 完成绘制，返回待插入文档的区域（ID由文档分配）
    pub fn finalize(self, config: &LayoutConfig) -> LayoutResult<Region> {
        let thickness = (self.kind == RegionKind::Wall).then_some(self.thickness);
        build_region(self.kind, self.points, thickness, config)
    }
}

/// 墙体闭合：最后一个顶点在各轴 `snap` 范围内对齐起点，完全重合的闭合点删除
pub fn snap_wall_closure(points: &mut Vec<Point2>, snap: f64) {
    if points.len() < 2 {
        return;
    }
    let first = points[0];
    let last_index = points.len() - 1;
    let last = &mut points[last_index];
    if (last.x - first.x).abs() <= snap {
        last.x = first.x;
    }
    if (last.y - first.y).abs() <= snap {
        last.y = first.y;
    }
    drop_closing_duplicate(points);
}

fn drop_closing_duplicate(points: &mut Vec<Point2>) {
    if points.len() >= 2 && points[0] == points[points.len() - 1] {
        points.pop();
    }
}

/// 校验顶点数量、有限性、非零面积与简单多边形
pub fn validate_polygon(points: &[Point2]) -> LayoutResult<()> {
    if points.len() < 3 {
        return Err(LayoutError::TooFewVertices(points.len()));
    }
    if !points.iter().all(|p| all_finite(&[p.x, p.y])) {
        return Err(LayoutError::NonFinite("polygon vertex"));
    }
    if polygon_area(points) <= EPSILON {
        return Err(LayoutError::ZeroArea);
    }
    if let Some((i, j)) = find_self_intersection(points) {
        return Err(LayoutError::SelfIntersecting(i, j));
    }
    Ok(())
}

/// 原始坪数：面积 / 换算系数，向上取整
pub fn raw_ping(points: &[Point2], config: &LayoutConfig) -> f64 {
    (polygon_area(points) / config.ping_divisor).ceil()
}

/// 区域的计价坪数；地板额外计入损耗并进位到 0.5
pub fn billed_ping(kind: RegionKind, points: &[Point2], config: &LayoutConfig) -> f64 {
    let ping = raw_ping(points, config);
    match kind {
        RegionKind::Floor => (ping * config.floor_loss_factor * 2.0).ceil() / 2.0,
        _ => ping,
    }
}

/// 多边形外扩
///
/// 按绕向决定外法线方向，每条边平移 `thickness`，相邻平移边求交得到外环顶点；
/// 相邻边平行时退回到平移边自身的起点。
pub fn offset_polygon(points: &[Point2], thickness: f64) -> LayoutResult<Vec<Point2>> {
    let n = points.len();
    if n < 3 {
        return Err(LayoutError::TooFewVertices(n));
    }

    // 鞋带面积为正时 (dy, -dx) 即为外法线
    let sign = if polygon_signed_area(points) >= 0.0 { 1.0 } else { -1.0 };

    let mut edges: Vec<(Point2, Point2)> = Vec::with_capacity(n);
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let d = b - a;
        let len = d.norm();
        if len < EPSILON {
            return Err(LayoutError::NonFinite("zero-length wall edge"));
        }
        let normal = Vector2::new(d.y, -d.x) / len * sign;
        let shift = normal * thickness;
        edges.push((a + shift, b + shift));
    }

    let mut outer = Vec::with_capacity(n);
    for i in 0..n {
        let prev = edges[(i + n - 1) % n];
        let curr = edges[i];
        let vertex = match line_intersection(prev.0, prev.1, curr.0, curr.1) {
            Some(p) => p,
            None => {
                tracing::debug!("Parallel wall edges at vertex {}, using edge start", i);
                curr.0
            }
        };
        if !all_finite(&[vertex.x, vertex.y]) {
            return Err(LayoutError::NonFinite("wall offset"));
        }
        outer.push(vertex);
    }
    Ok(outer)
}

fn write_ring(out: &mut String, ring: &[Point2]) {
    for (i, p) in ring.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{} {} {}", cmd, round2(p.x), round2(p.y));
    }
    out.push_str(" Z");
}

/// 墙体路径：外环 + 内环，需以 `fill-rule="evenodd"` 渲染
pub fn wall_path_data(inner: &[Point2], thickness: f64) -> LayoutResult<String> {
    let outer = offset_polygon(inner, thickness)?;
    let mut path = String::new();
    write_ring(&mut path, &outer);
    write_ring(&mut path, inner);
    Ok(path)
}

/// 由顶点构建区域并计算派生数据
pub fn build_region(
    kind: RegionKind,
    mut points: Vec<Point2>,
    thickness: Option<f64>,
    config: &LayoutConfig,
) -> LayoutResult<Region> {
    if kind == RegionKind::Wall {
        snap_wall_closure(&mut points, config.wall_close_snap);
    } else {
        drop_closing_duplicate(&mut points);
    }

    let mut region = Region::new(EntityId(0), kind, points);
    if kind == RegionKind::Wall {
        region.thickness = Some(thickness.unwrap_or(config.default_wall_thickness));
    }
    refresh_derived(&mut region, config)?;
    Ok(region)
}

/// 重新计算区域的派生数据（墙体路径或坪数）
pub fn refresh_derived(region: &mut Region, config: &LayoutConfig) -> LayoutResult<()> {
    validate_polygon(&region.points)?;
    match region.kind {
        RegionKind::Wall => {
            let thickness = region.thickness.unwrap_or(config.default_wall_thickness);
            if !thickness.is_finite() || thickness <= 0.0 {
                return Err(LayoutError::InvalidDimension(format!("thickness = {thickness}")));
            }
            region.path_data = Some(wall_path_data(&region.points, thickness)?);
            region.area_in_ping = None;
        }
        RegionKind::Floor | RegionKind::Ceiling => {
            let ping = billed_ping(region.kind, &region.points, config);
            if !ping.is_finite() {
                return Err(LayoutError::NonFinite("area"));
            }
            region.area_in_ping = Some(ping);
            region.path_data = None;
        }
    }
    Ok(())
}

/// 拖动区域顶点；结果非法时保持原状
pub fn move_vertex(
    doc: &mut LayoutDocument,
    region_id: EntityId,
    index: usize,
    point: Point2,
    config: &LayoutConfig,
) -> LayoutResult<()> {
    if !all_finite(&[point.x, point.y]) {
        return Err(LayoutError::NonFinite("vertex position"));
    }
    let region = doc
        .region_mut(region_id)
        .ok_or(LayoutError::EntityNotFound(region_id))?;
    if index >= region.points.len() {
        return Err(LayoutError::VertexOutOfRange {
            region: region_id,
            index,
        });
    }

    let mut updated = region.clone();
    updated.points[index] = point;
    refresh_derived(&mut updated, config)?;
    *region = updated;
    Ok(())
}

/// 修改墙体厚度
pub fn set_wall_thickness(
    doc: &mut LayoutDocument,
    region_id: EntityId,
    thickness: f64,
    config: &LayoutConfig,
) -> LayoutResult<()> {
    let region = doc
        .region_mut(region_id)
        .ok_or(LayoutError::EntityNotFound(region_id))?;
    if region.kind != RegionKind::Wall {
        return Err(LayoutError::InvalidState(format!(
            "region {} is not a wall",
            region_id
        )));
    }
    let mut updated = region.clone();
    updated.thickness = Some(thickness);
    refresh_derived(&mut updated, config)?;
    *region = updated;
    Ok(())
}
