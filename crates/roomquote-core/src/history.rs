//! 快照式撤销 / 重做
//!
//! 每个离散手势结束后保存一份 [`ModelState`] 深拷贝。
//! 与当前快照序列化结果相同的保存请求会被忽略。

use crate::model::ModelState;

/// 快照历史栈
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    /// (快照, 序列化形式)
    entries: Vec<(ModelState, String)>,
    /// 当前快照下标；栈为空时无意义
    index: usize,
    limit: usize,
}

impl SnapshotHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            limit: limit.max(1),
        }
    }

    /// 保存快照，返回是否真正入栈
    pub fn save_state(&mut self, state: &ModelState) -> bool {
        let serialized = match serde_json::to_string(state) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to serialize snapshot: {}", e);
                return false;
            }
        };

        if let Some((_, current)) = self.entries.get(self.index) {
            if *current == serialized {
                return false;
            }
        }

        // 截断 redo 历史
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push((state.clone(), serialized));

        if self.entries.len() > self.limit {
            let overflow = self.entries.len() - self.limit;
            self.entries.drain(..overflow);
        }
        self.index = self.entries.len() - 1;

        tracing::debug!("Saved snapshot {}/{}", self.index + 1, self.entries.len());
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// 后退一步，返回应载入的快照深拷贝
    pub fn undo(&mut self) -> Option<ModelState> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].0.clone())
    }

    /// 前进一步
    pub fn redo(&mut self) -> Option<ModelState> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].0.clone())
    }
}
