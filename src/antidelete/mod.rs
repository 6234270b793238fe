//! # 防撤回 / Anti-Delete
//!
//! 远端删除消息前的本地快照、已删除标记与编辑历史
//! Local snapshots of remotely deleted messages, deleted markers and edit history
//!
//! ## 组成 / Parts
//!
//! - `DeletedArchive`: 已删除消息归档，按全局编号去重 / Archive deduplicated by global id
//! - `DeletedIdSet`: 已删除 (会话, 消息) 集合 / Set of deleted (peer, message) pairs
//! - `EditHistoryStore`: 每条消息的历史文本 / Prior texts per message
//!
//! 三个存储各自持有一把锁，彼此之间没有事务保证：
//! 调用方先归档再标记删除是两个独立步骤，崩溃可能只留下其中之一。
//! Each store owns its own lock and there is no transaction across them:
//! archiving and marking a message deleted are two independent steps, and a crash
//! in between may leave only one of them persisted.

pub mod archive;
pub mod deleted_ids;
pub mod edit_history;
pub mod settings;

pub use archive::{ArchivedMessage, DeletedArchive};
pub use deleted_ids::{DeletedIdSet, LEGACY_DELETED_MARKER};
pub use edit_history::{EditHistoryStore, EditRecord};
pub use settings::AntiDeleteSettings;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 消息复合键 `<peerId>_<messageId>` / Composite message key `<peerId>_<messageId>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageKey {
    pub peer_id: i64,
    pub message_id: i32,
}

impl MessageKey {
    pub fn new(peer_id: i64, message_id: i32) -> Self {
        Self {
            peer_id,
            message_id,
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.peer_id, self.message_id)
    }
}

/// 复合键解析错误 / Composite key parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("无效的消息键 / Invalid message key: {0}")]
pub struct InvalidMessageKey(pub String);

impl FromStr for MessageKey {
    type Err = InvalidMessageKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 会话编号可能为负，取最后一个分隔符 / Peer ids may be negative; split on the last `_`
        let (peer, message) = s
            .rsplit_once('_')
            .ok_or_else(|| InvalidMessageKey(s.to_string()))?;
        let peer_id = peer
            .parse()
            .map_err(|_| InvalidMessageKey(s.to_string()))?;
        let message_id = message
            .parse()
            .map_err(|_| InvalidMessageKey(s.to_string()))?;
        Ok(Self::new(peer_id, message_id))
    }
}
