//! RoomQuote 核心引擎
//!
//! 室内配置编辑器的几何、碰撞、缩放、区域与报价计算。
//!
//! # 架构设计
//!
//! - `LayoutDocument`: 唯一的文档状态，所有引擎以它为输入
//! - 几何内核 → 碰撞 / 缩放 / 区域引擎 → 文档 → 报价 / 历史
//!
//! # 示例
//!
//! ```rust
//! use roomquote_core::prelude::*;
//!
//! let config = LayoutConfig::default();
//! let mut doc = LayoutDocument::new();
//! let entry = CatalogEntry::new("衣櫃", 120.0, 60.0, 9000.0);
//! doc.add_item(entry, 0.0, 0.0, &config);
//!
//! let quotation = calculate_full_quotation(&doc, &config);
//! assert_eq!(quotation.grand_total, 9000.0);
//! ```

pub mod catalog;
pub mod collision;
pub mod config;
pub mod error;
pub mod geometry;
pub mod history;
pub mod math;
pub mod model;
pub mod pricing;
pub mod region;
pub mod resize;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::catalog::{AddonConfig, Adjustable, CatalogEntry, CustomAddon, PricingType};
    pub use crate::collision::{check_collision, get_mtv, resolve_drag, resolve_placement, DragOutcome};
    pub use crate::config::LayoutConfig;
    pub use crate::error::{LayoutError, LayoutResult};
    pub use crate::geometry::{rotate_point, OrientedRect, Projection};
    pub use crate::history::SnapshotHistory;
    pub use crate::math::{Point2, Vector2};
    pub use crate::model::{
        Annotation, AnnotationData, Background, EntityId, LayoutDocument, LinkedComponent,
        ModelState, PlacedItem, Region, RegionKind, Selection,
    };
    pub use crate::pricing::{calculate_full_quotation, feet, Quotation, QuotationLineItem};
    pub use crate::region::{DraftStep, RegionDraft};
    pub use crate::resize::{ResizeDirection, ResizeSession};
}
