//! # 已删除消息归档 / Deleted-Message Archive
//!
//! 远端删除前由宿主调用 `archive()` 保存快照；整个列表作为一个 JSON 数组持久化
//! The host calls `archive()` right before a remote deletion is applied; the whole
//! list is persisted as one JSON array

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{AntiDeleteSettings, MessageKey};
use crate::error::describe_error;
use crate::kv::KvStore;

/// 归档存储键 / Archive storage key
pub const ARCHIVE_KEY: &str = "antiDelete.archive";

// ============================================================================
// 数据结构 / Data Structures
// ============================================================================

/// 已删除消息快照 / Snapshot of a deleted message
///
/// 去重只看 `global_id`，不比较内容
/// Deduplication looks at `global_id` only, never at content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedMessage {
    pub global_id: i32,
    pub peer_id: i64,
    pub message_id: i32,
    /// 原始发送时间（秒）/ Original send time, seconds
    pub timestamp: i32,
    /// 捕获时间（秒）/ Capture time, seconds
    pub deleted_at: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_author_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_description: Option<String>,
}

impl ArchivedMessage {
    /// 以当前时间作为删除时间创建快照
    /// Build a snapshot stamped with the current time as `deleted_at`
    pub fn captured_now(
        global_id: i32,
        peer_id: i64,
        message_id: i32,
        timestamp: i32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            global_id,
            peer_id,
            message_id,
            timestamp,
            deleted_at: now_secs(),
            author_id: None,
            text: text.into(),
            forward_author_id: None,
            media_description: None,
        }
    }

    pub fn with_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn with_forward_author(mut self, forward_author_id: i64) -> Self {
        self.forward_author_id = Some(forward_author_id);
        self
    }

    pub fn with_media_description(mut self, description: impl Into<String>) -> Self {
        self.media_description = Some(description.into());
        self
    }

    pub fn with_deleted_at(mut self, deleted_at: i32) -> Self {
        self.deleted_at = deleted_at;
        self
    }

    pub fn key(&self) -> MessageKey {
        MessageKey::new(self.peer_id, self.message_id)
    }
}

fn now_secs() -> i32 {
    i32::try_from(chrono::Utc::now().timestamp()).unwrap_or(i32::MAX)
}

// ============================================================================
// 归档存储 / Archive Store
// ============================================================================

/// 已删除消息归档 / Deleted-message archive
///
/// 所有读写都经过同一把锁，持久化在锁内同步完成
/// Every read and write goes through one lock; persistence runs synchronously
/// inside it
pub struct DeletedArchive {
    kv: Arc<dyn KvStore>,
    settings: AntiDeleteSettings,
    messages: Mutex<Vec<ArchivedMessage>>,
}

impl DeletedArchive {
    /// 创建归档并加载已持久化的内容 / Create the archive and load persisted state
    ///
    /// 损坏或不可读的数据视为空归档
    /// Corrupt or unreadable data yields an empty archive
    pub fn new(kv: Arc<dyn KvStore>, settings: AntiDeleteSettings) -> Self {
        let messages = Self::load(kv.as_ref());
        info!(
            "🗃️  已加载删除归档 / Loaded deleted-message archive: {} records",
            messages.len()
        );
        Self {
            kv,
            settings,
            messages: Mutex::new(messages),
        }
    }

    /// 归档一条消息 / Archive a message
    ///
    /// 功能关闭时什么都不做；同一 `global_id` 只保留第一次写入
    /// Does nothing while the feature is off; the first write per `global_id` wins
    ///
    /// # 返回 / Returns
    /// - `true` 表示新增了记录 / `true` when a record was added
    pub fn archive(&self, message: ArchivedMessage) -> bool {
        if !self.settings.is_enabled() {
            return false;
        }

        let mut messages = self.messages.lock();
        if messages.iter().any(|m| m.global_id == message.global_id) {
            debug!(
                "🔁 已归档，忽略 / Already archived, ignoring global id {}",
                message.global_id
            );
            return false;
        }

        debug!(
            "💾 归档消息 / Archiving message {} (global id {})",
            message.key(),
            message.global_id
        );
        messages.push(message);
        self.persist(&messages);
        true
    }

    /// 全部归档，按删除时间倒序 / Every record, most recently deleted first
    pub fn all_archived(&self) -> Vec<ArchivedMessage> {
        let mut snapshot = self.messages.lock().clone();
        sort_newest_first(&mut snapshot);
        snapshot
    }

    /// 某个会话的归档，排序同上 / One chat's records, same ordering
    pub fn archived_for_peer(&self, peer_id: i64) -> Vec<ArchivedMessage> {
        let mut snapshot: Vec<ArchivedMessage> = self
            .messages
            .lock()
            .iter()
            .filter(|m| m.peer_id == peer_id)
            .cloned()
            .collect();
        sort_newest_first(&mut snapshot);
        snapshot
    }

    pub fn get(&self, global_id: i32) -> Option<ArchivedMessage> {
        self.messages
            .lock()
            .iter()
            .find(|m| m.global_id == global_id)
            .cloned()
    }

    /// 删除一条记录，不存在时不报错 / Remove a record; absent is fine
    pub fn remove(&self, global_id: i32) -> bool {
        let mut messages = self.messages.lock();
        let before = messages.len();
        messages.retain(|m| m.global_id != global_id);
        let removed = messages.len() != before;
        if removed {
            self.persist(&messages);
        }
        removed
    }

    /// 清空归档 / Empty the archive
    pub fn clear(&self) {
        let mut messages = self.messages.lock();
        messages.clear();
        self.persist(&messages);
        info!("🧹 已清空删除归档 / Deleted-message archive cleared");
    }

    pub fn count(&self) -> usize {
        self.messages.lock().len()
    }

    /// 归档记录对应的 (会话, 消息) / (peer, message) pairs behind the archive
    pub fn export_references(&self) -> Vec<MessageKey> {
        self.messages
            .lock()
            .iter()
            .map(ArchivedMessage::key)
            .collect()
    }

    // ------------------------------------------------------------------
    // 持久化 / Persistence
    // ------------------------------------------------------------------

    /// 调用方必须持有锁 / Caller must hold the lock
    fn persist(&self, messages: &[ArchivedMessage]) {
        let bytes = match serde_json::to_vec(messages) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("❌ 序列化归档失败 / Failed to serialize archive: {}", e);
                return;
            }
        };
        if let Err(e) = self.kv.set(ARCHIVE_KEY, &bytes) {
            error!(
                "❌ 保存归档失败 / Failed to save archive: {}",
                describe_error(&e)
            );
        }
    }

    fn load(kv: &dyn KvStore) -> Vec<ArchivedMessage> {
        let bytes = match kv.get(ARCHIVE_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(
                    "⚠️  读取归档失败 / Failed to read archive: {}",
                    describe_error(&e)
                );
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<ArchivedMessage>>(&bytes) {
            Ok(mut messages) => {
                // 保证每个 global_id 至多一条 / At most one record per global id
                let mut seen = HashSet::new();
                messages.retain(|m| seen.insert(m.global_id));
                messages
            }
            Err(e) => {
                warn!("⚠️  归档数据损坏，已丢弃 / Archive data corrupt, discarded: {}", e);
                Vec::new()
            }
        }
    }
}

/// 稳定排序，删除时间相同的保持插入顺序
/// Stable sort; equal `deleted_at` keeps insertion order
fn sort_newest_first(messages: &mut [ArchivedMessage]) {
    messages.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use crate::notify::ChangeNotifier;

    fn archive_over(kv: Arc<dyn KvStore>) -> (DeletedArchive, AntiDeleteSettings) {
        let settings = AntiDeleteSettings::new(Arc::clone(&kv), ChangeNotifier::new());
        (DeletedArchive::new(kv, settings.clone()), settings)
    }

    fn msg(global_id: i32, peer_id: i64, message_id: i32, deleted_at: i32) -> ArchivedMessage {
        ArchivedMessage::captured_now(global_id, peer_id, message_id, 100, "text")
            .with_deleted_at(deleted_at)
    }

    #[test]
    fn first_write_wins() {
        let (archive, _) = archive_over(Arc::new(MemoryKv::new()));
        let first = ArchivedMessage::captured_now(1, 100, 5, 10, "hello").with_deleted_at(1000);
        let second =
            ArchivedMessage::captured_now(1, 100, 5, 10, "DIFFERENT").with_deleted_at(2000);

        assert!(archive.archive(first));
        assert!(!archive.archive(second));
        assert_eq!(archive.count(), 1);
        assert_eq!(archive.get(1).unwrap().text, "hello");
    }

    #[test]
    fn disabled_archive_is_a_no_op() {
        let (archive, settings) = archive_over(Arc::new(MemoryKv::new()));
        settings.set_enabled(false);
        assert!(!archive.archive(msg(1, 1, 1, 1)));
        assert_eq!(archive.count(), 0);
    }

    #[test]
    fn ordering_and_peer_filter() {
        let (archive, _) = archive_over(Arc::new(MemoryKv::new()));
        archive.archive(msg(1, 10, 1, 300));
        archive.archive(msg(2, 20, 2, 500));
        archive.archive(msg(3, 10, 3, 400));

        let all: Vec<i32> = archive.all_archived().iter().map(|m| m.global_id).collect();
        assert_eq!(all, vec![2, 3, 1]);

        let peer: Vec<i32> = archive
            .archived_for_peer(10)
            .iter()
            .map(|m| m.global_id)
            .collect();
        assert_eq!(peer, vec![3, 1]);
    }

    #[test]
    fn remove_then_reinsert() {
        let (archive, _) = archive_over(Arc::new(MemoryKv::new()));
        archive.archive(msg(9, 1, 1, 1));
        assert!(archive.remove(9));
        assert!(!archive.remove(9));
        assert!(archive.archive(msg(9, 1, 1, 2)));
        assert_eq!(archive.get(9).unwrap().deleted_at, 2);
    }

    #[test]
    fn export_references_lists_pairs() {
        let (archive, _) = archive_over(Arc::new(MemoryKv::new()));
        archive.archive(msg(1, -100, 7, 1));
        assert_eq!(archive.export_references(), vec![MessageKey::new(-100, 7)]);
        archive.clear();
        assert!(archive.export_references().is_empty());
    }

    #[test]
    fn persisted_blob_uses_camel_case_and_omits_none() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        let (archive, _) = archive_over(Arc::clone(&kv));
        archive.archive(msg(1, 2, 3, 4).with_author(55));

        let raw = kv.get(ARCHIVE_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json[0]["globalId"], 1);
        assert_eq!(json[0]["authorId"], 55);
        assert!(json[0].get("forwardAuthorId").is_none());
    }

    #[test]
    fn duplicate_ids_in_blob_are_collapsed_on_load() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        let blob = serde_json::to_vec(&vec![msg(1, 1, 1, 1), msg(1, 1, 1, 2)]).unwrap();
        kv.set(ARCHIVE_KEY, &blob).unwrap();

        let (archive, _) = archive_over(kv);
        assert_eq!(archive.count(), 1);
        assert_eq!(archive.get(1).unwrap().deleted_at, 1);
    }
}
