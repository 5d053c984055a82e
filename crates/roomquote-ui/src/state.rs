//! 交互状态

use roomquote_core::math::Vector2;
use roomquote_core::model::{EntityId, RegionKind};
use roomquote_core::region::RegionDraft;
use roomquote_core::resize::ResizeSession;
use serde::{Deserialize, Serialize};

/// 当前工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Select,
    Floor,
    Ceiling,
    Wall,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Floor => "Floor",
            Tool::Ceiling => "Ceiling",
            Tool::Wall => "Wall",
        }
    }

    /// 对应的绘制区域类型
    pub fn region_kind(&self) -> Option<RegionKind> {
        match self {
            Tool::Select => None,
            Tool::Floor => Some(RegionKind::Floor),
            Tool::Ceiling => Some(RegionKind::Ceiling),
            Tool::Wall => Some(RegionKind::Wall),
        }
    }
}

/// 标注上可拖动的端点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationHandle {
    /// 文字框
    Label,
    /// 引线箭头
    Tip,
}

/// 交互状态机
///
/// 每个手势从 `Idle` 开始，指针抬起（或绘制完成 / 取消）后回到 `Idle`。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging {
        item_id: EntityId,
        /// 指针相对物件左上角的偏移
        grab_offset: Vector2,
        moved: bool,
    },
    Resizing {
        session: ResizeSession,
        moved: bool,
    },
    DrawingRegion(RegionDraft),
    DraggingVertex {
        region_id: EntityId,
        index: usize,
        moved: bool,
    },
    DraggingAnnotation {
        id: EntityId,
        handle: AnnotationHandle,
        grab_offset: Vector2,
        moved: bool,
    },
}

impl Interaction {
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Idle => "Idle",
            Interaction::Dragging { .. } => "Dragging",
            Interaction::Resizing { .. } => "Resizing",
            Interaction::DrawingRegion(_) => "DrawingRegion",
            Interaction::DraggingVertex { .. } => "DraggingVertex",
            Interaction::DraggingAnnotation { .. } => "DraggingAnnotation",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    /// 手势过程中是否产生了修改
    pub fn has_moved(&self) -> bool {
        match self {
            Interaction::Dragging { moved, .. }
            | Interaction::Resizing { moved, .. }
            | Interaction::DraggingVertex { moved, .. }
            | Interaction::DraggingAnnotation { moved, .. } => *moved,
            Interaction::Idle | Interaction::DrawingRegion(_) => false,
        }
    }
}

/// 键盘输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Backspace,
    Delete,
    Undo,
    Redo,
}

/// 指针修饰键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// 按住时取消正交锁定
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { shift: false };
    pub const SHIFT: Self = Self { shift: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// 给用户的临时提示
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_region_kind() {
        assert_eq!(Tool::Select.region_kind(), None);
        assert_eq!(Tool::Wall.region_kind(), Some(RegionKind::Wall));
    }

    #[test]
    fn test_moved_flag() {
        let pending = Interaction::DraggingVertex {
            region_id: EntityId(1),
            index: 0,
            moved: false,
        };
        assert!(!pending.has_moved());

        let moved = Interaction::DraggingVertex {
            region_id: EntityId(1),
            index: 0,
            moved: true,
        };
        assert!(moved.has_moved());
        assert!(!Interaction::Idle.has_moved());
    }
}
