//! 编辑器配置
//!
//! 所有阈值与常量集中在这里，宿主可以从 JSON 覆盖部分字段。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// 物件最小边长
    pub min_item_size: f64,
    /// 投影重叠判定容差（贴边不算碰撞）
    pub overlap_epsilon: f64,
    /// 绘制区域时自动闭合的吸附距离（像素）
    pub close_snap_distance: f64,
    /// 墙体闭合时逐轴吸附到起点的距离（像素）
    pub wall_close_snap: f64,
    /// 每坪对应的画布面积
    pub ping_divisor: f64,
    /// 地板损耗系数
    pub floor_loss_factor: f64,
    /// 新建墙体的默认厚度
    pub default_wall_thickness: f64,
    /// 撤销栈最大深度
    pub history_limit: usize,
    /// 报价分组的优先工种顺序
    pub trade_order: Vec<String>,
    /// 未设置分组时使用的名称
    pub default_group: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_item_size: 20.0,
            overlap_epsilon: 0.01,
            close_snap_distance: 20.0,
            wall_close_snap: 10.0,
            ping_divisor: 30000.0,
            floor_loss_factor: 1.2,
            default_wall_thickness: 10.0,
            history_limit: 50,
            trade_order: [
                "保護工程",
                "拆除工程",
                "水電工程",
                "泥作工程",
                "木作工程",
                "天花板工程",
                "地板工程",
                "系統櫃",
                "油漆工程",
                "燈具工程",
                "窗簾工程",
                "清潔工程",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            default_group: "其他".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let cfg: LayoutConfig =
            serde_json::from_str(r#"{"historyLimit": 10, "floorLossFactor": 1.1}"#).unwrap();
        assert_eq!(cfg.history_limit, 10);
        assert!((cfg.floor_loss_factor - 1.1).abs() < 1e-12);
        // 未出现的字段保持默认值
        assert_eq!(cfg.min_item_size, 20.0);
        assert!(!cfg.trade_order.is_empty());
    }
}
