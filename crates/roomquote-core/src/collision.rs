//! 有向矩形碰撞检测与推离
//!
//! 基于分离轴定理（SAT）：
//! - 收集两个矩形全部边的法向量作为候选轴
//! - 任一轴上投影不重叠即无碰撞
//! - 否则重叠最小的轴给出最小平移向量（MTV）
//!
//! 拖动时每次移动只应用一次 MTV（取模最大者），不做多体迭代求解。

use crate::config::LayoutConfig;
use crate::error::{LayoutError, LayoutResult};
use crate::geometry::{axes, project, OrientedRect};
use crate::math::{all_finite, Vector2};
use crate::model::{EntityId, LayoutDocument, PlacedItem};

/// 两个有向矩形内部是否重叠（贴边不算）
pub fn rects_collide(a: &OrientedRect, b: &OrientedRect, epsilon: f64) -> bool {
    let va = a.vertices();
    let vb = b.vertices();
    axes(&va)
        .iter()
        .chain(axes(&vb).iter())
        .all(|axis| project(&va, axis).overlaps(&project(&vb, axis), epsilon))
}

/// 把 `a` 推离 `b` 的最小平移向量，不碰撞时返回 `None`
pub fn get_mtv(a: &OrientedRect, b: &OrientedRect, epsilon: f64) -> Option<Vector2> {
    let va = a.vertices();
    let vb = b.vertices();

    let mut best: Option<Vector2> = None;
    let mut best_distance = f64::INFINITY;

    for axis in axes(&va).iter().chain(axes(&vb).iter()) {
        let pa = project(&va, axis);
        let pb = project(&vb, axis);
        if !pa.overlaps(&pb, epsilon) {
            return None;
        }
        // 包含关系下也要移到 b 的外侧，而不只是重叠长度
        let shift = pa.separation(&pb);
        if shift.abs() < best_distance {
            best_distance = shift.abs();
            best = Some(*axis * shift);
        }
    }

    best
}

/// 两个物件是否碰撞；任一方允许重叠时直接跳过
pub fn items_collide(a: &PlacedItem, b: &PlacedItem, epsilon: f64) -> bool {
    if a.allow_overlap() || b.allow_overlap() {
        return false;
    }
    rects_collide(&a.rect(), &b.rect(), epsilon)
}

/// 候选物件是否与文档中其他物件碰撞
pub fn check_collision(
    doc: &LayoutDocument,
    candidate: &PlacedItem,
    exclude: Option<EntityId>,
    config: &LayoutConfig,
) -> bool {
    if candidate.allow_overlap() {
        return false;
    }
    colliders(doc, candidate, exclude, config).next().is_some()
}

/// 与候选物件碰撞的其他物件
fn colliders<'a>(
    doc: &'a LayoutDocument,
    candidate: &'a PlacedItem,
    exclude: Option<EntityId>,
    config: &'a LayoutConfig,
) -> impl Iterator<Item = &'a PlacedItem> + 'a {
    doc.items.iter().filter(move |other| {
        Some(other.id) != exclude
            && other.id != candidate.id
            && items_collide(candidate, other, config.overlap_epsilon)
    })
}

/// 一次拖动移动的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOutcome {
    pub x: f64,
    pub y: f64,
    /// 是否应用了推离修正
    pub corrected: bool,
    /// 修正后仍有残余重叠（仅作视觉提示）
    pub warning: bool,
}

/// 计算候选物件的落点，必要时用最大的 MTV 推离一次
///
/// 不修改文档；候选位置、尺寸或推离结果出现 NaN 时返回错误。
pub fn resolve_placement(
    doc: &LayoutDocument,
    candidate: &PlacedItem,
    config: &LayoutConfig,
) -> LayoutResult<DragOutcome> {
    let geometry = [
        candidate.x,
        candidate.y,
        candidate.current_w,
        candidate.current_h,
        candidate.rotation_deg,
    ];
    if !all_finite(&geometry) {
        return Err(LayoutError::NonFinite("item placement"));
    }

    let mut placed = candidate.clone();
    let mut corrected = false;
    if !placed.allow_overlap() {
        let rect = placed.rect();
        let strongest = colliders(doc, &placed, None, config)
            .filter_map(|other| get_mtv(&rect, &other.rect(), config.overlap_epsilon))
            .max_by(|a, b| a.norm().total_cmp(&b.norm()));

        if let Some(mtv) = strongest {
            placed.x += mtv.x;
            placed.y += mtv.y;
            corrected = true;
        }
    }

    if !all_finite(&[placed.x, placed.y]) {
        return Err(LayoutError::NonFinite("collision push-out"));
    }

    let warning = check_collision(doc, &placed, None, config);
    if warning {
        tracing::warn!("Item {} still overlaps after push-out", placed.id);
    }

    Ok(DragOutcome {
        x: placed.x,
        y: placed.y,
        corrected,
        warning,
    })
}

/// 拖动物件到 `(x, y)` 并写回推离后的位置
///
/// 出错时不修改文档。
pub fn resolve_drag(
    doc: &mut LayoutDocument,
    id: EntityId,
    x: f64,
    y: f64,
    config: &LayoutConfig,
) -> LayoutResult<DragOutcome> {
    if !all_finite(&[x, y]) {
        return Err(LayoutError::NonFinite("drag position"));
    }

    let mut candidate = doc.item(id).ok_or(LayoutError::EntityNotFound(id))?.clone();
    candidate.x = x;
    candidate.y = y;

    let outcome = resolve_placement(doc, &candidate, config)?;
    if let Some(item) = doc.item_mut(id) {
        item.x = outcome.x;
        item.y = outcome.y;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    const EPS: f64 = 0.01;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> OrientedRect {
        OrientedRect::new(x, y, w, h, 0.0)
    }

    #[test]
    fn test_disjoint_rects_do_not_collide() {
        let a = rect(0.0, 0.0, 50.0, 50.0);
        assert!(!rects_collide(&a, &rect(60.0, 0.0, 50.0, 50.0), EPS));
        assert!(!rects_collide(&a, &rect(0.0, 60.0, 50.0, 50.0), EPS));
        // 贴边
        assert!(!rects_collide(&a, &rect(50.0, 0.0, 50.0, 50.0), EPS));
    }

    #[test]
    fn test_overlapping_rects_collide() {
        let a = rect(0.0, 0.0, 50.0, 50.0);
        assert!(rects_collide(&a, &rect(40.0, 40.0, 50.0, 50.0), EPS));
        assert!(rects_collide(&a, &rect(10.0, 10.0, 10.0, 10.0), EPS));
    }

    #[test]
    fn test_rotated_rect_diamond() {
        // 45° 旋转后的方块角点伸入另一块
        let a = rect(0.0, 0.0, 50.0, 50.0);
        let b = OrientedRect::new(55.0, 0.0, 50.0, 50.0, 45.0);
        assert!(rects_collide(&a, &b, EPS));
        let far = OrientedRect::new(70.0, 0.0, 50.0, 50.0, 45.0);
        assert!(!rects_collide(&a, &far, EPS));
    }

    #[test]
    fn test_mtv_separates() {
        let mut a = rect(40.0, 5.0, 50.0, 50.0);
        let b = rect(0.0, 0.0, 50.0, 50.0);
        let mtv = get_mtv(&a, &b, EPS).unwrap();
        // 最小重叠在 X 轴（10），a 在右侧应被向右推
        assert!((mtv.x - 10.0).abs() < 1e-9);
        assert!(mtv.y.abs() < 1e-9);

        a.x += mtv.x;
        a.y += mtv.y;
        assert!(!rects_collide(&a, &b, EPS));
    }

    #[test]
    fn test_mtv_separates_contained() {
        let mut a = rect(20.0, 45.0, 10.0, 10.0);
        let b = rect(0.0, 0.0, 100.0, 100.0);
        let mtv = get_mtv(&a, &b, EPS).unwrap();
        // 左侧出口最近：向左移 30
        assert!((mtv.x + 30.0).abs() < 1e-9);
        assert!(mtv.y.abs() < 1e-9);

        a.x += mtv.x;
        a.y += mtv.y;
        assert!(!rects_collide(&a, &b, EPS));

        // 反过来，大矩形包住小矩形时也能推开
        let mut big = b;
        let small = rect(20.0, 45.0, 10.0, 10.0);
        let mtv = get_mtv(&big, &small, EPS).unwrap();
        big.x += mtv.x;
        big.y += mtv.y;
        assert!(!rects_collide(&big, &small, EPS));
    }

    #[test]
    fn test_mtv_separates_rotated() {
        let mut a = OrientedRect::new(30.0, 20.0, 60.0, 30.0, 30.0);
        let b = OrientedRect::new(0.0, 0.0, 50.0, 50.0, -15.0);
        let mtv = get_mtv(&a, &b, EPS).unwrap();
        a.x += mtv.x;
        a.y += mtv.y;
        assert!(!rects_collide(&a, &b, EPS));
    }

    #[test]
    fn test_mtv_none_when_apart() {
        assert!(get_mtv(&rect(0.0, 0.0, 10.0, 10.0), &rect(20.0, 0.0, 10.0, 10.0), EPS).is_none());
    }

    #[test]
    fn test_allow_overlap_skips_pair() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        let rug = CatalogEntry::new("地毯", 200.0, 200.0, 0.0).with_overlap(true);
        doc.add_item(rug, 0.0, 0.0, &cfg);
        let sofa = doc.add_item(CatalogEntry::new("沙發", 100.0, 50.0, 0.0), 300.0, 300.0, &cfg);

        let outcome = resolve_drag(&mut doc, sofa, 50.0, 50.0, &cfg).unwrap();
        assert!(!outcome.corrected);
        assert!(!outcome.warning);
        assert_eq!(doc.item(sofa).unwrap().x, 50.0);
    }

    #[test]
    fn test_drag_pushes_out() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        let wall_cab = doc.add_item(CatalogEntry::new("高櫃", 100.0, 60.0, 0.0), 0.0, 0.0, &cfg);
        let desk = doc.add_item(CatalogEntry::new("書桌", 80.0, 60.0, 0.0), 300.0, 0.0, &cfg);

        // 拖到与高櫃重叠 10 的位置
        let outcome = resolve_drag(&mut doc, desk, 90.0, 0.0, &cfg).unwrap();
        assert!(outcome.corrected);
        assert!(!outcome.warning);
        assert!((outcome.x - 100.0).abs() < 1e-9);

        let a = doc.item(desk).unwrap().clone();
        let b = doc.item(wall_cab).unwrap();
        assert!(!items_collide(&a, b, cfg.overlap_epsilon));
    }

    #[test]
    fn test_drag_onto_larger_item_clears_overlap() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        doc.add_item(CatalogEntry::new("衣櫃", 200.0, 200.0, 0.0), 0.0, 0.0, &cfg);
        let stool = doc.add_item(CatalogEntry::new("椅凳", 40.0, 40.0, 0.0), 400.0, 0.0, &cfg);

        let outcome = resolve_drag(&mut doc, stool, 60.0, 80.0, &cfg).unwrap();
        assert!(outcome.corrected);
        assert!(!outcome.warning);
        // 左侧出口最近：x 从 60 推到 -40
        assert!((outcome.x + 40.0).abs() < 1e-9);
        assert!((outcome.y - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_candidate_allow_overlap_skips_collision() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        doc.add_item(CatalogEntry::new("沙發", 200.0, 100.0, 0.0), 0.0, 0.0, &cfg);
        let rug = doc.add_item(
            CatalogEntry::new("地毯", 150.0, 150.0, 0.0).with_overlap(true),
            400.0,
            0.0,
            &cfg,
        );

        let outcome = resolve_drag(&mut doc, rug, 20.0, 20.0, &cfg).unwrap();
        assert!(!outcome.corrected);
        assert!(!outcome.warning);
        let placed = doc.item(rug).unwrap().clone();
        assert_eq!((placed.x, placed.y), (20.0, 20.0));
        assert!(!check_collision(&doc, &placed, None, &cfg));
    }

    #[test]
    fn test_drag_rejects_nan() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        let id = doc.add_item(CatalogEntry::new("椅子", 40.0, 40.0, 0.0), 0.0, 0.0, &cfg);
        assert!(resolve_drag(&mut doc, id, f64::NAN, 0.0, &cfg).is_err());
        assert_eq!(doc.item(id).unwrap().x, 0.0);
    }

    #[test]
    fn test_placement_rejects_non_finite_size() {
        let cfg = LayoutConfig::default();
        let doc = LayoutDocument::new();
        let broken = PlacedItem::new(
            EntityId(9),
            CatalogEntry::new("壞資料", f64::INFINITY, 50.0, 0.0),
            0.0,
            0.0,
            cfg.min_item_size,
        );
        assert_eq!(
            resolve_placement(&doc, &broken, &cfg),
            Err(LayoutError::NonFinite("item placement"))
        );
    }

    #[test]
    fn test_three_body_leaves_warning() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        // 左右两侧的柜子之间只剩 40 的缝，放不下 60 宽的物件
        doc.add_item(CatalogEntry::new("左櫃", 100.0, 100.0, 0.0), 0.0, 0.0, &cfg);
        doc.add_item(CatalogEntry::new("右櫃", 100.0, 100.0, 0.0), 140.0, 0.0, &cfg);
        let mover = doc.add_item(CatalogEntry::new("邊几", 60.0, 100.0, 0.0), 0.0, 400.0, &cfg);

        let outcome = resolve_drag(&mut doc, mover, 90.0, 0.0, &cfg).unwrap();
        assert!(outcome.corrected);
        assert!(outcome.warning);
    }
}
