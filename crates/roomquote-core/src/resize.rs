//! 旋转感知的尺寸调整
//!
//! 拖动某条边的手柄时，对边在全局坐标中保持不动：
//! 1. 指针位移转换到物件局部坐标（逆旋转）
//! 2. 激活轴上的尺寸按局部位移增减，不小于最小边长
//! 3. 中心沿激活轴平移尺寸变化量的一半，再旋转回全局
//! 4. 新的左上角 = 中心 − 尺寸 / 2

use crate::config::LayoutConfig;
use crate::error::{LayoutError, LayoutResult};
use crate::geometry::{rotate_vector, OrientedRect};
use crate::math::{all_finite, Point2, Vector2};
use crate::model::{EntityId, LayoutDocument, PlacedItem};
use serde::{Deserialize, Serialize};

/// 缩放手柄方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeDirection {
    N,
    S,
    E,
    W,
}

impl ResizeDirection {
    /// 是否作用于宽度轴
    pub fn is_horizontal(&self) -> bool {
        matches!(self, ResizeDirection::E | ResizeDirection::W)
    }

    /// 沿局部轴的正负号（E/S 为正）
    fn sign(&self) -> f64 {
        match self {
            ResizeDirection::E | ResizeDirection::S => 1.0,
            ResizeDirection::W | ResizeDirection::N => -1.0,
        }
    }

    pub const ALL: [ResizeDirection; 4] = [
        ResizeDirection::N,
        ResizeDirection::S,
        ResizeDirection::E,
        ResizeDirection::W,
    ];

    /// 手柄在全局坐标中的位置（对应边的中点）
    pub fn handle_position(&self, rect: &OrientedRect) -> Point2 {
        let local = if self.is_horizontal() {
            Vector2::new(self.sign() * rect.width / 2.0, 0.0)
        } else {
            Vector2::new(0.0, self.sign() * rect.height / 2.0)
        };
        rect.center() + rotate_vector(local, rect.rotation_deg)
    }
}

/// 物件的几何状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ItemFrame {
    fn of(item: &PlacedItem) -> Self {
        Self {
            x: item.x,
            y: item.y,
            width: item.current_w,
            height: item.current_h,
        }
    }

    fn center(&self) -> Point2 {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn write_to(&self, item: &mut PlacedItem) {
        item.x = self.x;
        item.y = self.y;
        item.current_w = self.width;
        item.current_h = self.height;
    }
}

/// 一次缩放手势的起始状态
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub item_id: EntityId,
    pub direction: ResizeDirection,
    pub start_pointer: Point2,
    start: ItemFrame,
    rotation_deg: f64,
    allows_width: bool,
    allows_depth: bool,
}

impl ResizeSession {
    /// 开始缩放
    pub fn start(
        doc: &LayoutDocument,
        id: EntityId,
        direction: ResizeDirection,
        pointer: Point2,
    ) -> LayoutResult<Self> {
        let item = doc.item(id).ok_or(LayoutError::EntityNotFound(id))?;
        Ok(Self {
            item_id: id,
            direction,
            start_pointer: pointer,
            start: ItemFrame::of(item),
            rotation_deg: item.rotation_deg,
            allows_width: item.data.adjustable.allows_width(),
            allows_depth: item.data.adjustable.allows_depth(),
        })
    }

    /// 根据当前指针位置计算新的几何状态（不修改文档）
    pub fn compute(&self, pointer: Point2, min_size: f64) -> ItemFrame {
        let horizontal = self.direction.is_horizontal();
        let vetoed = if horizontal {
            !self.allows_width
        } else {
            !self.allows_depth
        };
        if vetoed {
            return self.start;
        }

        let delta = pointer - self.start_pointer;
        let local = rotate_vector(delta, -self.rotation_deg);
        let sign = self.direction.sign();

        let mut frame = self.start;
        let shift = if horizontal {
            frame.width = (self.start.width + sign * local.x).max(min_size);
            Vector2::new(sign * (frame.width - self.start.width) / 2.0, 0.0)
        } else {
            frame.height = (self.start.height + sign * local.y).max(min_size);
            Vector2::new(0.0, sign * (frame.height - self.start.height) / 2.0)
        };

        let center = self.start.center() + rotate_vector(shift, self.rotation_deg);
        frame.x = center.x - frame.width / 2.0;
        frame.y = center.y - frame.height / 2.0;
        frame
    }

    /// 应用到文档；结果含 NaN 时保持原状
    pub fn apply(
        &self,
        doc: &mut LayoutDocument,
        pointer: Point2,
        config: &LayoutConfig,
    ) -> LayoutResult<ItemFrame> {
        if !all_finite(&[pointer.x, pointer.y]) {
            return Err(LayoutError::NonFinite("resize pointer"));
        }
        let frame = self.compute(pointer, config.min_item_size);
        if !all_finite(&[frame.x, frame.y, frame.width, frame.height]) {
            return Err(LayoutError::NonFinite("resize"));
        }
        let item = doc
            .item_mut(self.item_id)
            .ok_or(LayoutError::EntityNotFound(self.item_id))?;
        frame.write_to(item);
        Ok(frame)
    }
}

/// 数值输入尺寸，中心保持不动
///
/// 不允许调整的轴保持原值；非数值或 ≤0 的输入整体拒绝。
pub fn set_dimensions(
    doc: &mut LayoutDocument,
    id: EntityId,
    width: f64,
    height: f64,
    config: &LayoutConfig,
) -> LayoutResult<ItemFrame> {
    for (label, value) in [("width", width), ("height", height)] {
        if !value.is_finite() || value <= 0.0 {
            tracing::warn!("Rejected {} input {} for item {}", label, value, id);
            return Err(LayoutError::InvalidDimension(format!("{label} = {value}")));
        }
    }

    let item = doc.item_mut(id).ok_or(LayoutError::EntityNotFound(id))?;
    let mut frame = ItemFrame::of(item);
    let center = frame.center();

    if item.data.adjustable.allows_width() {
        frame.width = width.max(config.min_item_size);
    }
    if item.data.adjustable.allows_depth() {
        frame.height = height.max(config.min_item_size);
    }
    frame.x = center.x - frame.width / 2.0;
    frame.y = center.y - frame.height / 2.0;

    frame.write_to(item);
    Ok(frame)
}

/// 设置绝对旋转角度，归一化到 [0, 360)
pub fn set_rotation(doc: &mut LayoutDocument, id: EntityId, angle_deg: f64) -> LayoutResult<f64> {
    if !angle_deg.is_finite() {
        return Err(LayoutError::NonFinite("rotation"));
    }
    let item = doc.item_mut(id).ok_or(LayoutError::EntityNotFound(id))?;
    item.rotation_deg = angle_deg.rem_euclid(360.0);
    Ok(item.rotation_deg)
}

/// 在当前角度上累加旋转
pub fn rotate_by(doc: &mut LayoutDocument, id: EntityId, step_deg: f64) -> LayoutResult<f64> {
    let current = doc
        .item(id)
        .ok_or(LayoutError::EntityNotFound(id))?
        .rotation_deg;
    set_rotation(doc, id, current + step_deg)
}

/// 切换镜像
pub fn toggle_mirror(doc: &mut LayoutDocument, id: EntityId) -> LayoutResult<bool> {
    let item = doc.item_mut(id).ok_or(LayoutError::EntityNotFound(id))?;
    item.mirrored = !item.mirrored;
    Ok(item.mirrored)
}

pub fn set_opacity(doc: &mut LayoutDocument, id: EntityId, opacity: f64) -> LayoutResult<f64> {
    if !opacity.is_finite() {
        return Err(LayoutError::NonFinite("opacity"));
    }
    let item = doc.item_mut(id).ok_or(LayoutError::EntityNotFound(id))?;
    item.opacity = opacity.clamp(0.0, 1.0);
    Ok(item.opacity)
}
