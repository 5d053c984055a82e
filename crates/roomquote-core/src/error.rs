//! 核心引擎错误定义

use crate::model::EntityId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// 多边形顶点不足
    #[error("A region needs at least 3 points, got {0}")]
    TooFewVertices(usize),

    /// 尺寸输入非数值或不为正
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    /// 多边形自相交
    #[error("Polygon edges {0} and {1} intersect")]
    SelfIntersecting(usize, usize),

    /// 多边形面积为零（例如全部顶点共线）
    #[error("Polygon has zero area")]
    ZeroArea,

    /// 计算结果出现 NaN / 无穷
    #[error("Non-finite result while computing {0}")]
    NonFinite(&'static str),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Vertex index {index} out of range for region {region}")]
    VertexOutOfRange { region: EntityId, index: usize },

    /// 当前交互状态不允许该操作
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl LayoutError {
    /// 是否属于需要提示用户的校验错误
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LayoutError::TooFewVertices(_)
                | LayoutError::InvalidDimension(_)
                | LayoutError::SelfIntersecting(_, _)
                | LayoutError::ZeroArea
        )
    }
}

pub type LayoutResult<T> = Result<T, LayoutError>;
