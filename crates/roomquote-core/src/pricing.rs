//! 报价引擎
//!
//! 纯函数：文档 → 分组报价单。
//!
//! 流程：
//! 1. 归一化：物件 / 区域 / 标注统一映射为 [`PriceRecord`]
//! 2. 合并：名称、单价、备注、加购签名完全相同的记录合并，数量与金额累加
//! 3. 过滤：基础金额 + 加购金额恰好为 0 的行丢弃
//! 4. 分组：按工种分组，优先工种在前，其余按字母序

use crate::catalog::{AddonConfig, CustomAddon, PricingType};
use crate::config::LayoutConfig;
use crate::geometry::polygon_perimeter;
use crate::model::{Annotation, LayoutDocument, PlacedItem, Region, RegionKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// 厘米换算为尺（1 尺 = 30 cm），向上进位到 0.5
pub fn feet(cm: f64) -> f64 {
    ((cm / 30.0) * 2.0).ceil() / 2.0
}

/// 计价数量所需的输入
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantityInputs {
    pub width: f64,
    pub height: f64,
    pub cai_qty: f64,
}

/// 按计价方式求数量
pub fn resolve_quantity(pricing_type: PricingType, inputs: QuantityInputs) -> f64 {
    match pricing_type {
        PricingType::Fixed | PricingType::Number => 1.0,
        PricingType::Width => feet(inputs.width),
        PricingType::Depth => feet(inputs.height),
        PricingType::Area => feet(inputs.width) * feet(inputs.height),
        PricingType::Cai => inputs.cai_qty,
        PricingType::Cm => inputs.width,
        PricingType::None => 0.0,
    }
}

/// 加购行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonLine {
    pub name: String,
    pub unit: String,
    pub price: f64,
    pub qty: f64,
}

impl From<&CustomAddon> for AddonLine {
    fn from(a: &CustomAddon) -> Self {
        Self {
            name: a.name.clone(),
            unit: a.unit.clone(),
            price: a.price,
            qty: a.qty,
        }
    }
}

/// 归一化后的计价记录
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub name: String,
    pub group: String,
    pub unit: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub addons: Vec<AddonLine>,
    pub note: String,
}

fn group_or_default(group: &str, config: &LayoutConfig) -> String {
    if group.trim().is_empty() {
        config.default_group.clone()
    } else {
        group.to_string()
    }
}

/// 目录加购项与数量数组配对，忽略数量为 0 的项
fn collect_addons(configs: &[AddonConfig], qtys: &[f64], custom: &[CustomAddon]) -> Vec<AddonLine> {
    let mut lines: Vec<AddonLine> = configs
        .iter()
        .zip(qtys.iter())
        .filter(|(_, qty)| **qty != 0.0)
        .map(|(cfg, qty)| AddonLine {
            name: cfg.name.clone(),
            unit: cfg.unit.clone(),
            price: cfg.price,
            qty: *qty,
        })
        .collect();
    lines.extend(custom.iter().filter(|a| a.qty != 0.0).map(AddonLine::from));
    lines
}

pub fn normalize_item(item: &PlacedItem, config: &LayoutConfig) -> PriceRecord {
    let quantity = resolve_quantity(
        item.data.pricing_type,
        QuantityInputs {
            width: item.current_w,
            height: item.current_h,
            cai_qty: item.cai_qty,
        },
    );
    PriceRecord {
        name: item.data.name.clone(),
        group: group_or_default(&item.data.group, config),
        unit: item.data.unit_label(),
        unit_price: item.data.unit_price,
        quantity,
        addons: collect_addons(&item.data.addons_config, &item.addons, &item.custom_addons),
        note: item.note.clone(),
    }
}

/// 区域计价；未关联计价项目的区域不计价
pub fn normalize_region(region: &Region, config: &LayoutConfig) -> Option<PriceRecord> {
    let linked = region.linked_component.as_ref()?;
    let quantity = match region.kind {
        RegionKind::Floor | RegionKind::Ceiling => region.area_in_ping.unwrap_or(0.0),
        RegionKind::Wall => feet(polygon_perimeter(&region.points)),
    };
    Some(PriceRecord {
        name: linked.name.clone(),
        group: group_or_default(&linked.group, config),
        unit: linked
            .unit
            .clone()
            .unwrap_or_else(|| region.kind.unit_label().to_string()),
        unit_price: linked.unit_price,
        quantity,
        addons: collect_addons(&linked.addons_config, &region.addons, &region.custom_addons),
        note: region.note.clone(),
    })
}

/// 标注计价：`custom_addons[0]` 是标注本身的计价行
pub fn normalize_annotation(annotation: &Annotation, config: &LayoutConfig) -> PriceRecord {
    let data = &annotation.data;
    let mut record = PriceRecord {
        name: data.name.clone(),
        group: group_or_default(&data.group, config),
        unit: data.pricing_type.unit_label().to_string(),
        unit_price: data.unit_price,
        quantity: resolve_quantity(data.pricing_type, QuantityInputs::default()),
        addons: Vec::new(),
        note: annotation.note.clone(),
    };

    if let Some((primary, rest)) = annotation.custom_addons.split_first() {
        record.unit_price = primary.price;
        record.quantity = primary.qty;
        if !primary.unit.is_empty() {
            record.unit = primary.unit.clone();
        }
        record.addons = collect_addons(&[], &[], rest);
    }
    record
}

/// 文档中全部计价记录
pub fn normalize_all(doc: &LayoutDocument, config: &LayoutConfig) -> Vec<PriceRecord> {
    let mut records: Vec<PriceRecord> = doc
        .items
        .iter()
        .map(|i| normalize_item(i, config))
        .collect();
    records.extend(doc.regions.iter().filter_map(|r| normalize_region(r, config)));
    records.extend(doc.annotations.iter().map(|a| normalize_annotation(a, config)));
    records
}

/// 合并后的加购行
#[derive(Debug, Clone, PartialEq)]
pub struct MergedAddon {
    pub name: String,
    pub unit: String,
    pub price: f64,
    pub qty: f64,
    pub total: f64,
}

/// 合并后的报价行
#[derive(Debug, Clone, PartialEq)]
pub struct MergedLine {
    pub name: String,
    pub group: String,
    pub unit: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub total: f64,
    pub note: String,
    pub addons: Vec<MergedAddon>,
}

impl MergedLine {
    /// 基础金额 + 加购金额
    pub fn combined_total(&self) -> f64 {
        self.total + self.addons.iter().map(|a| a.total).sum::<f64>()
    }

    fn absorb_addon(&mut self, addon: &AddonLine) {
        let total = addon.price * addon.qty;
        match self
            .addons
            .iter_mut()
            .find(|m| m.name == addon.name && m.unit == addon.unit && m.price == addon.price)
        {
            Some(existing) => {
                existing.qty += addon.qty;
                existing.total += total;
            }
            None => self.addons.push(MergedAddon {
                name: addon.name.clone(),
                unit: addon.unit.clone(),
                price: addon.price,
                qty: addon.qty,
                total,
            }),
        }
    }
}

/// 加购签名：不含数量，排序后序列化
fn addon_signature(addons: &[AddonLine]) -> Vec<(String, String, f64)> {
    let mut sig: Vec<(String, String, f64)> = addons
        .iter()
        .map(|a| (a.name.clone(), a.unit.clone(), a.price))
        .collect();
    sig.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.total_cmp(&b.2))
    });
    sig.dedup();
    sig
}

fn merge_key(record: &PriceRecord) -> String {
    let key = (
        &record.name,
        record.unit_price,
        &record.note,
        addon_signature(&record.addons),
    );
    // 元组序列化不会失败；退化时用 Debug 形式兜底
    serde_json::to_string(&key).unwrap_or_else(|_| format!("{key:?}"))
}

/// 合并相同记录，保持首次出现的顺序
pub fn aggregate(records: &[PriceRecord]) -> Vec<MergedLine> {
    let mut lines: Vec<MergedLine> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = merge_key(record);
        let total = record.unit_price * record.quantity;
        let slot = match index.get(&key) {
            Some(&i) => {
                let line = &mut lines[i];
                line.quantity += record.quantity;
                line.total += total;
                i
            }
            None => {
                lines.push(MergedLine {
                    name: record.name.clone(),
                    group: record.group.clone(),
                    unit: record.unit.clone(),
                    unit_price: record.unit_price,
                    quantity: record.quantity,
                    total,
                    note: record.note.clone(),
                    addons: Vec::new(),
                });
                index.insert(key, lines.len() - 1);
                lines.len() - 1
            }
        };
        for addon in &record.addons {
            lines[slot].absorb_addon(addon);
        }
    }

    lines.retain(|l| l.combined_total() != 0.0);
    lines
}

/// 报价单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationLineItem {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_header: bool,
    /// 属于上一条基础行的加购
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_addon: bool,
    pub name: String,
    pub group: String,
    pub unit: String,
    pub quantity: f64,
    pub total_price: f64,
    pub note: String,
}

/// 完整报价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub line_items: Vec<QuotationLineItem>,
    pub grand_total: f64,
}

/// 分组排序：优先工种按配置顺序，其余按不区分大小写的字母序
///
/// 未列出的分组比较的是小写后的 Unicode 码点，不做区域化排序。
/// 中文工种名的码点顺序与笔画 / 注音排序不同，需要固定顺序的工种应写进 `trade_order`。
pub fn compare_groups(a: &str, b: &str, trade_order: &[String]) -> Ordering {
    let rank = |g: &str| trade_order.iter().position(|t| t == g);
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

/// 计算完整报价
pub fn calculate_full_quotation(doc: &LayoutDocument, config: &LayoutConfig) -> Quotation {
    let merged = aggregate(&normalize_all(doc, config));

    let mut groups: Vec<&str> = Vec::new();
    for line in &merged {
        if !groups.contains(&line.group.as_str()) {
            groups.push(&line.group);
        }
    }
    groups.sort_by(|a, b| compare_groups(a, b, &config.trade_order));

    let mut quotation = Quotation::default();
    for group in groups {
        let members: Vec<&MergedLine> = merged.iter().filter(|l| l.group == group).collect();
        let subtotal: f64 = members.iter().map(|l| l.combined_total()).sum();

        quotation.line_items.push(QuotationLineItem {
            is_header: true,
            is_addon: false,
            name: group.to_string(),
            group: group.to_string(),
            unit: String::new(),
            quantity: 0.0,
            total_price: subtotal,
            note: String::new(),
        });

        for line in members {
            quotation.line_items.push(QuotationLineItem {
                is_header: false,
                is_addon: false,
                name: line.name.clone(),
                group: line.group.clone(),
                unit: line.unit.clone(),
                quantity: line.quantity,
                total_price: line.total,
                note: line.note.clone(),
            });
            for addon in &line.addons {
                quotation.line_items.push(QuotationLineItem {
                    is_header: false,
                    is_addon: true,
                    name: addon.name.clone(),
                    group: line.group.clone(),
                    unit: addon.unit.clone(),
                    quantity: addon.qty,
                    total_price: addon.total,
                    note: String::new(),
                });
            }
        }
        quotation.grand_total += subtotal;
    }

    tracing::debug!(
        "Quotation: {} lines, total {}",
        quotation.line_items.len(),
        quotation.grand_total
    );
    quotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::math::Point2;
    use crate::model::{AnnotationData, LinkedComponent};
    use crate::region::build_region;

    fn record(name: &str, price: f64, qty: f64) -> PriceRecord {
        PriceRecord {
            name: name.to_string(),
            group: "木作工程".to_string(),
            unit: "才".to_string(),
            unit_price: price,
            quantity: qty,
            addons: Vec::new(),
            note: String::new(),
        }
    }

    #[test]
    fn test_feet() {
        assert_eq!(feet(44.0), 1.5);
        assert_eq!(feet(90.0), 3.0);
        assert_eq!(feet(30.0), 1.0);
        assert_eq!(feet(31.0), 1.5);
        assert_eq!(feet(0.0), 0.0);
    }

    #[test]
    fn test_quantity_per_pricing_type() {
        let inputs = QuantityInputs {
            width: 90.0,
            height: 44.0,
            cai_qty: 7.0,
        };
        assert_eq!(resolve_quantity(PricingType::Fixed, inputs), 1.0);
        assert_eq!(resolve_quantity(PricingType::Number, inputs), 1.0);
        assert_eq!(resolve_quantity(PricingType::Width, inputs), 3.0);
        assert_eq!(resolve_quantity(PricingType::Depth, inputs), 1.5);
        assert_eq!(resolve_quantity(PricingType::Area, inputs), 4.5);
        assert_eq!(resolve_quantity(PricingType::Cai, inputs), 7.0);
        assert_eq!(resolve_quantity(PricingType::Cm, inputs), 90.0);
        assert_eq!(resolve_quantity(PricingType::None, inputs), 0.0);
    }

    #[test]
    fn test_identical_records_merge() {
        let merged = aggregate(&[record("系統櫃", 1000.0, 2.0), record("系統櫃", 1000.0, 3.0)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 5.0);
        assert_eq!(merged[0].total, 5000.0);
    }

    #[test]
    fn test_different_price_or_note_not_merged() {
        let mut noted = record("系統櫃", 1000.0, 1.0);
        noted.note = "白色".to_string();
        let merged = aggregate(&[
            record("系統櫃", 1000.0, 1.0),
            record("系統櫃", 1200.0, 1.0),
            noted,
        ]);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_addons_merged_within_parent() {
        let mut a = record("衣櫃", 500.0, 1.0);
        a.addons.push(AddonLine {
            name: "抽屜".into(),
            unit: "個".into(),
            price: 800.0,
            qty: 2.0,
        });
        let mut b = a.clone();
        b.addons[0].qty = 1.0;

        let merged = aggregate(&[a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].addons.len(), 1);
        assert_eq!(merged[0].addons[0].qty, 3.0);
        assert_eq!(merged[0].addons[0].total, 2400.0);
        assert_eq!(merged[0].combined_total(), 3400.0);
    }

    #[test]
    fn test_zero_total_dropped() {
        let mut free_with_addon = record("贈品", 0.0, 1.0);
        free_with_addon.addons.push(AddonLine {
            name: "安裝".into(),
            unit: "式".into(),
            price: 300.0,
            qty: 1.0,
        });
        let merged = aggregate(&[record("空白", 0.0, 3.0), free_with_addon]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "贈品");
    }

    #[test]
    fn test_annotation_primary_line_overrides() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        let id = doc.add_annotation(
            AnnotationData {
                name: "牆面補土".into(),
                unit_price: 100.0,
                pricing_type: PricingType::Fixed,
                group: "油漆工程".into(),
            },
            Point2::new(0.0, 0.0),
            Point2::new(50.0, 50.0),
        );
        {
            let a = doc.annotation_mut(id).unwrap();
            a.custom_addons[0] = CustomAddon::new("牆面補土", "坪", 1200.0, 4.0);
            a.custom_addons.push(CustomAddon::new("批土", "式", 500.0, 1.0));
        }
        let record = normalize_annotation(doc.annotation(id).unwrap(), &cfg);
        assert_eq!(record.unit_price, 1200.0);
        assert_eq!(record.quantity, 4.0);
        assert_eq!(record.unit, "坪");
        assert_eq!(record.addons.len(), 1);
        assert_eq!(record.addons[0].name, "批土");
    }

    #[test]
    fn test_compare_groups() {
        let order = vec!["水電工程".to_string(), "木作工程".to_string()];
        let mut groups = vec!["zeta", "木作工程", "Alpha", "水電工程", "beta"];
        groups.sort_by(|a, b| compare_groups(a, b, &order));
        assert_eq!(groups, vec!["水電工程", "木作工程", "Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_unlisted_cjk_groups_use_code_point_order() {
        let mut groups = vec!["系統櫃", "泥作工程", "油漆工程"];
        groups.sort_by(|a, b| compare_groups(a, b, &[]));
        assert_eq!(groups, vec!["油漆工程", "泥作工程", "系統櫃"]);

        // 写进工种顺序后按配置排列
        let order = vec!["系統櫃".to_string()];
        groups.sort_by(|a, b| compare_groups(a, b, &order));
        assert_eq!(groups, vec!["系統櫃", "油漆工程", "泥作工程"]);
    }

    #[test]
    fn test_full_quotation() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();

        let shelf = CatalogEntry::new("上櫃", 90.0, 35.0, 3000.0)
            .with_pricing(PricingType::Width)
            .with_group("系統櫃")
            .with_addon("玻璃門", "片", 1500.0);
        let a = doc.add_item(shelf.clone(), 0.0, 0.0, &cfg);
        let b = doc.add_item(shelf, 200.0, 0.0, &cfg);
        doc.item_mut(a).unwrap().set_addon_qty(0, 1.0);
        doc.item_mut(b).unwrap().set_addon_qty(0, 2.0);
        doc.add_item(
            CatalogEntry::new("拆除", 20.0, 20.0, 8000.0).with_group("拆除工程"),
            500.0,
            500.0,
            &cfg,
        );

        let mut floor = build_region(
            RegionKind::Floor,
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(100.0, 0.0),
                Point2::new(100.0, 100.0),
                Point2::new(0.0, 100.0),
            ],
            None,
            &cfg,
        )
        .unwrap();
        floor.linked_component = Some(LinkedComponent::new("超耐磨地板", 4000.0, "地板工程"));
        doc.add_region(floor);

        let q = calculate_full_quotation(&doc, &cfg);

        let headers: Vec<&str> = q
            .line_items
            .iter()
            .filter(|l| l.is_header)
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(headers, vec!["拆除工程", "地板工程", "系統櫃"]);

        let shelf_line = q.line_items.iter().find(|l| l.name == "上櫃").unwrap();
        assert_eq!(shelf_line.quantity, 6.0);
        assert_eq!(shelf_line.total_price, 18000.0);
        let door = q.line_items.iter().find(|l| l.name == "玻璃門").unwrap();
        assert!(door.is_addon);
        assert_eq!(door.quantity, 3.0);

        let floor_line = q.line_items.iter().find(|l| l.name == "超耐磨地板").unwrap();
        assert_eq!(floor_line.quantity, 1.5);
        assert_eq!(floor_line.unit, "坪");

        assert_eq!(q.grand_total, 18000.0 + 4500.0 + 8000.0 + 6000.0);
    }

    #[test]
    fn test_unlinked_region_not_priced() {
        let cfg = LayoutConfig::default();
        let mut doc = LayoutDocument::new();
        let wall = build_region(
            RegionKind::Wall,
            vec![Point2::new(0.0, 0.0), Point2::new(300.0, 0.0), Point2::new(300.0, 300.0)],
            Some(10.0),
            &cfg,
        )
        .unwrap();
        let id = doc.add_region(wall);
        assert!(calculate_full_quotation(&doc, &cfg).line_items.is_empty());

        doc.region_mut(id).unwrap().linked_component =
            Some(LinkedComponent::new("隔間牆", 100.0, "泥作工程"));
        let q = calculate_full_quotation(&doc, &cfg);
        let line = q.line_items.iter().find(|l| !l.is_header).unwrap();
        // 周长 300 + 300 + 424.26 = 1024.26 cm → 34.5 尺
        assert_eq!(line.quantity, 34.5);
        assert_eq!(line.unit, "尺");
    }
}
