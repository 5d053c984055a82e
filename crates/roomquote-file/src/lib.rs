//! RoomQuote 文件格式处理
//!
//! 支持：
//! - JSON 项目快照导入 / 导出
//! - `.rqa` 压缩自动存档（MessagePack + Zstd）
//! - 目录 JSON 加载

pub mod catalog;
pub mod error;
pub mod native;
pub mod snapshot;

pub use catalog::{load_catalog, parse_catalog};
pub use error::FileError;
pub use snapshot::{ProjectSnapshot, SNAPSHOT_VERSION};
