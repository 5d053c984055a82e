//! 产品目录条目
//!
//! 目录由外部加载（表格、JSON 文件），放置到画布上的物件持有条目的一份拷贝。

use serde::{Deserialize, Serialize};

/// 计价方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PricingType {
    /// 一式
    #[default]
    Fixed,
    /// 按件
    Number,
    /// 按宽度（尺）
    Width,
    /// 按深度（尺）
    Depth,
    /// 宽 × 深（才）
    Area,
    /// 手动输入才数
    Cai,
    /// 按宽度厘米
    Cm,
    /// 不计价
    None,
}

impl PricingType {
    /// 默认单位
    pub fn unit_label(&self) -> &'static str {
        match self {
            PricingType::Fixed => "式",
            PricingType::Number => "組",
            PricingType::Width | PricingType::Depth => "尺",
            PricingType::Area | PricingType::Cai => "才",
            PricingType::Cm => "cm",
            PricingType::None => "",
        }
    }
}

/// 允许调整的尺寸轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Adjustable {
    Width,
    Depth,
    #[default]
    Both,
    None,
    /// 宽深可选规格，两个轴都可以拖动
    WidthDepthSelect,
}

impl Adjustable {
    pub fn allows_width(&self) -> bool {
        matches!(
            self,
            Adjustable::Width | Adjustable::Both | Adjustable::WidthDepthSelect
        )
    }

    pub fn allows_depth(&self) -> bool {
        matches!(
            self,
            Adjustable::Depth | Adjustable::Both | Adjustable::WidthDepthSelect
        )
    }
}

/// 目录定义的加购项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonConfig {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub price: f64,
}

/// 用户自定义加购项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAddon {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub qty: f64,
}

impl CustomAddon {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, price: f64, qty: f64) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            price,
            qty,
        }
    }
}

fn default_opacity() -> f64 {
    1.0
}

/// 目录条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub depth: f64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub pricing_type: PricingType,
    #[serde(default)]
    pub adjustable: Adjustable,
    #[serde(default)]
    pub allow_overlap: bool,
    #[serde(default)]
    pub addons_config: Vec<AddonConfig>,
    #[serde(default = "default_opacity")]
    pub default_opacity: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub group: String,
    /// 覆盖计价方式的默认单位
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, width: f64, depth: f64, unit_price: f64) -> Self {
        Self {
            name: name.into(),
            width,
            depth,
            unit_price,
            pricing_type: PricingType::Fixed,
            adjustable: Adjustable::Both,
            allow_overlap: false,
            addons_config: Vec::new(),
            default_opacity: 1.0,
            note: String::new(),
            group: String::new(),
            unit: None,
        }
    }

    pub fn with_pricing(mut self, pricing_type: PricingType) -> Self {
        self.pricing_type = pricing_type;
        self
    }

    pub fn with_adjustable(mut self, adjustable: Adjustable) -> Self {
        self.adjustable = adjustable;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_overlap(mut self, allow_overlap: bool) -> Self {
        self.allow_overlap = allow_overlap;
        self
    }

    pub fn with_addon(mut self, name: impl Into<String>, unit: impl Into<String>, price: f64) -> Self {
        self.addons_config.push(AddonConfig {
            name: name.into(),
            unit: unit.into(),
            price,
        });
        self
    }

    /// 报价单使用的单位
    pub fn unit_label(&self) -> String {
        self.unit
            .clone()
            .unwrap_or_else(|| self.pricing_type.unit_label().to_string())
    }
}
