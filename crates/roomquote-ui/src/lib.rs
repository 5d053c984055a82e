//! RoomQuote 交互层
//!
//! 不依赖具体的渲染框架，宿主把指针 / 键盘事件交给 [`Editor`]，
//! 再根据文档、选择与提示自行绘制。

pub mod editor;
pub mod state;

pub use editor::{Editor, HANDLE_TOLERANCE};
pub use state::{AnnotationHandle, Interaction, Key, Modifiers, Notice, NoticeLevel, Tool};
