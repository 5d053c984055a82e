//! 项目快照（JSON 导入 / 导出）
//!
//! 扁平 JSON 结构：
//! `{version, timestamp, placedCabinets, drawnAreas, placedAnnotations, background, constructionArea}`
//!
//! 导入时重新计算所有派生数据（墙体路径、坪数），不信任文件中的旧值。

use crate::error::FileError;
use chrono::{DateTime, Utc};
use roomquote_core::config::LayoutConfig;
use roomquote_core::model::{Annotation, Background, LayoutDocument, PlacedItem, Region};
use roomquote_core::region::refresh_derived;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 当前快照格式版本
pub const SNAPSHOT_VERSION: u32 = 1;

/// 可序列化的项目快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub placed_cabinets: Vec<PlacedItem>,
    #[serde(default)]
    pub drawn_areas: Vec<Region>,
    #[serde(default)]
    pub placed_annotations: Vec<Annotation>,
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub construction_area: f64,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl ProjectSnapshot {
    /// 从文档生成快照
    pub fn capture(doc: &LayoutDocument) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            timestamp: Some(Utc::now()),
            placed_cabinets: doc.items.clone(),
            drawn_areas: doc.regions.clone(),
            placed_annotations: doc.annotations.clone(),
            background: doc.background.clone(),
            construction_area: doc.construction_area,
        }
    }

    /// 还原为文档
    ///
    /// 物件尺寸钳制到最小边长；几何非法的区域会被丢弃并记录警告。
    pub fn into_document(self, config: &LayoutConfig) -> Result<LayoutDocument, FileError> {
        if self.version > SNAPSHOT_VERSION {
            return Err(FileError::UnsupportedVersion(format!(
                "Snapshot version {} is newer than supported version {}",
                self.version, SNAPSHOT_VERSION
            )));
        }

        let mut doc = LayoutDocument::new();

        for mut item in self.placed_cabinets {
            let values = [item.x, item.y, item.current_w, item.current_h, item.rotation_deg];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(FileError::InvalidFormat(format!(
                    "Item {} has non-numeric geometry",
                    item.id
                )));
            }
            item.current_w = item.current_w.max(config.min_item_size);
            item.current_h = item.current_h.max(config.min_item_size);
            item.addons.resize(item.data.addons_config.len(), 0.0);
            doc.items.push(item);
        }

        for mut region in self.drawn_areas {
            match refresh_derived(&mut region, config) {
                Ok(()) => doc.regions.push(region),
                Err(e) => tracing::warn!("Dropped region {} on import: {}", region.id, e),
            }
        }

        doc.annotations = self.placed_annotations;
        doc.background = self.background;
        doc.construction_area = self.construction_area;
        doc.reserve_ids();
        Ok(doc)
    }
}

/// 导出为 JSON 字符串
pub fn to_json(doc: &LayoutDocument) -> Result<String, FileError> {
    Ok(serde_json::to_string_pretty(&ProjectSnapshot::capture(doc))?)
}

/// 从 JSON 字符串导入
pub fn from_json(json: &str, config: &LayoutConfig) -> Result<LayoutDocument, FileError> {
    let snapshot: ProjectSnapshot = serde_json::from_str(json)?;
    snapshot.into_document(config)
}

/// 保存 JSON 快照到文件
pub fn save(doc: &LayoutDocument, path: &Path) -> Result<(), FileError> {
    let json = to_json(doc)?;
    std::fs::write(path, json)?;
    tracing::info!(
        "Exported {} entities to {}",
        doc.entity_count(),
        path.display()
    );
    Ok(())
}

/// 从文件加载 JSON 快照
pub fn load(path: &Path, config: &LayoutConfig) -> Result<LayoutDocument, FileError> {
    let json = std::fs::read_to_string(path)?;
    let doc = from_json(&json, config)?;
    tracing::info!(
        "Imported {} items, {} regions, {} annotations from {}",
        doc.items.len(),
        doc.regions.len(),
        doc.annotations.len(),
        path.display()
    );
    Ok(doc)
}
