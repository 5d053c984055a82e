//! 布局文档模型
//!
//! `LayoutDocument` 持有画布上的全部物件、区域与标注。
//! 所有引擎操作都以它为输入，不存在模块级全局状态。

use crate::catalog::{CatalogEntry, CustomAddon, PricingType};
use crate::config::LayoutConfig;
use crate::geometry::OrientedRect;
use crate::math::{self, Point2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 实体ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 当前选中对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Item(EntityId),
    Region(EntityId),
    Annotation(EntityId),
}

fn default_opacity() -> f64 {
    1.0
}

/// 放置在画布上的柜体 / 设备
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedItem {
    pub id: EntityId,
    /// 目录条目拷贝
    pub data: CatalogEntry,
    /// 左上角（未旋转时）
    pub x: f64,
    pub y: f64,
    pub current_w: f64,
    pub current_h: f64,
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default)]
    pub mirrored: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub cai_qty: f64,
    /// 与 `data.addons_config` 一一对应的数量
    #[serde(default)]
    pub addons: Vec<f64>,
    #[serde(default)]
    pub custom_addons: Vec<CustomAddon>,
}

impl PlacedItem {
    pub fn new(id: EntityId, data: CatalogEntry, x: f64, y: f64, min_size: f64) -> Self {
        let current_w = data.width.max(min_size);
        let current_h = data.depth.max(min_size);
        let addons = vec![0.0; data.addons_config.len()];
        Self {
            id,
            x,
            y,
            current_w,
            current_h,
            rotation_deg: 0.0,
            mirrored: false,
            opacity: data.default_opacity,
            note: data.note.clone(),
            cai_qty: 0.0,
            addons,
            custom_addons: Vec::new(),
            data,
        }
    }

    pub fn rect(&self) -> OrientedRect {
        OrientedRect::new(
            self.x,
            self.y,
            self.current_w,
            self.current_h,
            self.rotation_deg,
        )
    }

    pub fn center(&self) -> Point2 {
        self.rect().center()
    }

    pub fn allow_overlap(&self) -> bool {
        self.data.allow_overlap
    }

    /// 设置加购数量，越界时自动补齐
    pub fn set_addon_qty(&mut self, index: usize, qty: f64) {
        if self.addons.len() <= index {
            self.addons.resize(index + 1, 0.0);
        }
        self.addons[index] = qty;
    }
}

/// 区域类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Floor,
    Ceiling,
    Wall,
}

impl RegionKind {
    pub fn name(&self) -> &'static str {
        match self {
            RegionKind::Floor => "地板",
            RegionKind::Ceiling => "天花板",
            RegionKind::Wall => "牆面",
        }
    }

    /// 区域计价单位
    pub fn unit_label(&self) -> &'static str {
        match self {
            RegionKind::Floor | RegionKind::Ceiling => "坪",
            RegionKind::Wall => "尺",
        }
    }
}

/// 区域关联的计价项目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedComponent {
    pub name: String,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub addons_config: Vec<crate::catalog::AddonConfig>,
}

impl LinkedComponent {
    pub fn new(name: impl Into<String>, unit_price: f64, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit_price,
            group: group.into(),
            unit: None,
            addons_config: Vec::new(),
        }
    }
}

/// 手绘区域（地板 / 天花板 / 墙体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: RegionKind,
    /// 隐式闭合的顶点环
    #[serde(with = "math::xy_vec")]
    pub points: Vec<Point2>,
    /// 墙体厚度
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    /// 墙体 SVG 路径（外环 + 内环，evenodd 填充）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_data: Option<String>,
    /// 地板 / 天花板计价坪数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_in_ping: Option<f64>,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_component: Option<LinkedComponent>,
    #[serde(default)]
    pub addons: Vec<f64>,
    #[serde(default)]
    pub custom_addons: Vec<CustomAddon>,
}

impl Region {
    pub fn new(id: EntityId, kind: RegionKind, points: Vec<Point2>) -> Self {
        Self {
            id,
            kind,
            points,
            thickness: None,
            path_data: None,
            area_in_ping: None,
            note: String::new(),
            linked_component: None,
            addons: Vec::new(),
            custom_addons: Vec::new(),
        }
    }
}

/// 标注内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationData {
    pub name: String,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub pricing_type: PricingType,
    #[serde(default)]
    pub group: String,
}

/// 引线标注
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: EntityId,
    /// 文字框位置
    pub x: f64,
    pub y: f64,
    /// 引线箭头位置
    pub target_x: f64,
    pub target_y: f64,
    pub data: AnnotationData,
    #[serde(default)]
    pub note: String,
    /// 第 0 项是标注本身的计价行
    #[serde(default)]
    pub custom_addons: Vec<CustomAddon>,
}

/// 底图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    #[serde(with = "math::xy")]
    pub position: Point2,
    pub scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            position: Point2::origin(),
            scale: 1.0,
            src: None,
        }
    }
}

/// 可撤销的文档内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelState {
    pub placed_items: Vec<PlacedItem>,
    pub regions: Vec<Region>,
    pub annotations: Vec<Annotation>,
    pub background: Background,
}

/// 布局文档
#[derive(Debug, Clone, Default)]
pub struct LayoutDocument {
    pub items: Vec<PlacedItem>,
    pub regions: Vec<Region>,
    pub annotations: Vec<Annotation>,
    pub background: Background,
    /// 施工面积（坪），不参与撤销
    pub construction_area: f64,
    /// 下一个可用ID，撤销时不回退
    next_id: u64,
}

impl LayoutDocument {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    /// 确保后续分配的ID不与现有实体冲突（加载快照后调用）
    pub fn reserve_ids(&mut self) {
        let max = self
            .items
            .iter()
            .map(|i| i.id.0)
            .chain(self.regions.iter().map(|r| r.id.0))
            .chain(self.annotations.iter().map(|a| a.id.0))
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(max + 1);
    }

    pub fn entity_count(&self) -> usize {
        self.items.len() + self.regions.len() + self.annotations.len()
    }

    // ========== 物件 ==========

    /// 按目录条目新增物件，返回新ID
    pub fn add_item(&mut self, entry: CatalogEntry, x: f64, y: f64, config: &LayoutConfig) -> EntityId {
        let id = self.allocate_id();
        let item = PlacedItem::new(id, entry, x, y, config.min_item_size);
        tracing::debug!("Placed item {} '{}' at ({}, {})", id, item.data.name, x, y);
        self.items.push(item);
        id
    }

    /// 复制物件，偏移 `(dx, dy)`
    pub fn duplicate_item(&mut self, id: EntityId, dx: f64, dy: f64) -> Option<EntityId> {
        let mut copy = self.item(id)?.clone();
        let new_id = self.allocate_id();
        copy.id = new_id;
        copy.x += dx;
        copy.y += dy;
        self.items.push(copy);
        Some(new_id)
    }

    pub fn item(&self, id: EntityId) -> Option<&PlacedItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: EntityId) -> Option<&mut PlacedItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn remove_item(&mut self, id: EntityId) -> Option<PlacedItem> {
        let index = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(index))
    }

    // ========== 区域 ==========

    /// 插入已完成计算的区域，分配ID
    pub fn add_region(&mut self, mut region: Region) -> EntityId {
        let id = self.allocate_id();
        region.id = id;
        self.regions.push(region);
        id
    }

    pub fn region(&self, id: EntityId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn region_mut(&mut self, id: EntityId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    pub fn remove_region(&mut self, id: EntityId) -> Option<Region> {
        let index = self.regions.iter().position(|r| r.id == id)?;
        Some(self.regions.remove(index))
    }

    // ========== 标注 ==========

    pub fn add_annotation(
        &mut self,
        data: AnnotationData,
        label: Point2,
        target: Point2,
    ) -> EntityId {
        let id = self.allocate_id();
        // 第 0 项默认为标注本身的计价行
        let primary = CustomAddon::new(
            data.name.clone(),
            data.pricing_type.unit_label(),
            data.unit_price,
            1.0,
        );
        self.annotations.push(Annotation {
            id,
            x: label.x,
            y: label.y,
            target_x: target.x,
            target_y: target.y,
            data,
            note: String::new(),
            custom_addons: vec![primary],
        });
        id
    }

    pub fn annotation(&self, id: EntityId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn annotation_mut(&mut self, id: EntityId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    pub fn remove_annotation(&mut self, id: EntityId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(index))
    }

    /// 删除选中对象，返回是否删除成功
    pub fn remove(&mut self, selection: Selection) -> bool {
        match selection {
            Selection::None => false,
            Selection::Item(id) => self.remove_item(id).is_some(),
            Selection::Region(id) => self.remove_region(id).is_some(),
            Selection::Annotation(id) => self.remove_annotation(id).is_some(),
        }
    }

    /// 命中测试：标注 > 物件（后放置的在上层）> 区域
    pub fn hit_test(&self, p: &Point2, tolerance: f64) -> Selection {
        for a in self.annotations.iter().rev() {
            let label = Point2::new(a.x, a.y);
            let tip = Point2::new(a.target_x, a.target_y);
            if (label - p).norm() <= tolerance || (tip - p).norm() <= tolerance {
                return Selection::Annotation(a.id);
            }
        }
        for item in self.items.iter().rev() {
            if item.rect().contains_point(p) {
                return Selection::Item(item.id);
            }
        }
        for region in self.regions.iter().rev() {
            if point_in_polygon(p, &region.points) {
                return Selection::Region(region.id);
            }
        }
        Selection::None
    }

    // ========== 快照 ==========

    /// 深拷贝可撤销部分
    pub fn state(&self) -> ModelState {
        ModelState {
            placed_items: self.items.clone(),
            regions: self.regions.clone(),
            annotations: self.annotations.clone(),
            background: self.background.clone(),
        }
    }

    /// 用快照替换可撤销部分（ID分配器不回退）
    pub fn restore(&mut self, state: ModelState) {
        self.items = state.placed_items;
        self.regions = state.regions;
        self.annotations = state.annotations;
        self.background = state.background;
        self.reserve_ids();
    }
}

/// 射线法判断点是否在多边形内
fn point_in_polygon(p: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y)
            && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cabinet() -> CatalogEntry {
        CatalogEntry::new("衣櫃", 120.0, 60.0, 8000.0).with_addon("抽屜", "個", 900.0)
    }

    #[test]
    fn test_add_item_clamps_min_size() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        let id = doc.add_item(CatalogEntry::new("踢腳板", 5.0, 1.0, 100.0), 0.0, 0.0, &cfg);
        let item = doc.item(id).unwrap();
        assert_eq!(item.current_w, 20.0);
        assert_eq!(item.current_h, 20.0);
    }

    #[test]
    fn test_addons_parallel_to_config() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        let id = doc.add_item(cabinet(), 10.0, 10.0, &cfg);
        assert_eq!(doc.item(id).unwrap().addons, vec![0.0]);
    }

    #[test]
    fn test_ids_survive_restore() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        let before = doc.state();
        let a = doc.add_item(cabinet(), 0.0, 0.0, &cfg);
        doc.restore(before);
        let b = doc.add_item(cabinet(), 0.0, 0.0, &cfg);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hit_test() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        let id = doc.add_item(cabinet(), 0.0, 0.0, &cfg);
        assert_eq!(doc.hit_test(&Point2::new(60.0, 30.0), 5.0), Selection::Item(id));
        assert_eq!(doc.hit_test(&Point2::new(500.0, 500.0), 5.0), Selection::None);

        let rid = doc.add_region(Region::new(
            EntityId(0),
            RegionKind::Floor,
            vec![
                Point2::new(200.0, 0.0),
                Point2::new(300.0, 0.0),
                Point2::new(300.0, 100.0),
                Point2::new(200.0, 100.0),
            ],
        ));
        assert_eq!(doc.hit_test(&Point2::new(250.0, 50.0), 5.0), Selection::Region(rid));
    }

    #[test]
    fn test_region_json_uses_type_key() {
        let region = Region::new(
            EntityId(7),
            RegionKind::Wall,
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)],
        );
        let json = serde_json::to_value(&region).unwrap();
        assert_eq!(json["type"], "wall");
        assert_eq!(json["id"], 7);
        assert_eq!(json["points"][1]["x"], 1.0);
    }
}
