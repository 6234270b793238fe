//! # 已删除标记集合 / Deleted-Id Set
//!
//! 与归档独立：即使没有保存内容，也能判断某条消息是否被对方删除
//! Independent of the archive: answers "was this deleted by someone else" even when
//! no content was captured

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{AntiDeleteSettings, MessageKey};
use crate::error::describe_error;
use crate::kv::{KvStore, KvStoreExt};

/// 集合存储键 / Set storage key
pub const DELETED_IDS_KEY: &str = "antiDelete.deletedIds";

/// 旧版本写入正文的删除标记 / Marker older builds prefixed onto deleted texts
pub const LEGACY_DELETED_MARKER: &str = "🗑️ ";

/// 已删除 (会话, 消息) 集合 / Set of deleted (peer, message) pairs
///
/// 不支持单条移除，只会增长
/// Members are never removed individually; the set only grows
pub struct DeletedIdSet {
    kv: Arc<dyn KvStore>,
    settings: AntiDeleteSettings,
    ids: Mutex<HashSet<MessageKey>>,
}

impl DeletedIdSet {
    pub fn new(kv: Arc<dyn KvStore>, settings: AntiDeleteSettings) -> Self {
        let ids = Self::load(kv.as_ref());
        info!(
            "🏷️  已加载删除标记 / Loaded deleted markers: {} entries",
            ids.len()
        );
        Self {
            kv,
            settings,
            ids: Mutex::new(ids),
        }
    }

    /// 标记为已删除（不受开关影响）/ Mark as deleted (not gated by the toggle)
    pub fn mark_deleted(&self, peer_id: i64, message_id: i32) {
        let key = MessageKey::new(peer_id, message_id);
        let mut ids = self.ids.lock();
        if ids.insert(key) {
            debug!("🏷️  标记已删除 / Marked deleted: {}", key);
            self.persist(&ids);
        }
    }

    /// 开关关闭时恒为 false；关闭不会清空集合
    /// Always false while disabled; disabling never erases the set
    pub fn is_deleted(&self, peer_id: i64, message_id: i32) -> bool {
        if !self.settings.is_enabled() {
            return false;
        }
        self.ids
            .lock()
            .contains(&MessageKey::new(peer_id, message_id))
    }

    /// 旧格式兼容：按正文前缀近似判断，不读写集合
    /// Legacy check by text prefix; approximate, never touches the set
    pub fn is_deleted_text(&self, text: &str) -> bool {
        self.settings.is_enabled() && text.starts_with(LEGACY_DELETED_MARKER)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }

    /// 调用方必须持有锁 / Caller must hold the lock
    fn persist(&self, ids: &HashSet<MessageKey>) {
        let mut flat: Vec<String> = ids.iter().map(MessageKey::to_string).collect();
        flat.sort();
        if let Err(e) = self.kv.set_json(DELETED_IDS_KEY, &flat) {
            error!(
                "❌ 保存删除标记失败 / Failed to save deleted markers: {}",
                describe_error(&e)
            );
        }
    }

    fn load(kv: &dyn KvStore) -> HashSet<MessageKey> {
        let flat: Vec<String> = match kv.get_json(DELETED_IDS_KEY) {
            Ok(Some(flat)) => flat,
            Ok(None) => return HashSet::new(),
            Err(e) => {
                warn!(
                    "⚠️  读取删除标记失败 / Failed to read deleted markers: {}",
                    describe_error(&e)
                );
                return HashSet::new();
            }
        };

        flat.iter()
            .filter_map(|s| match s.parse::<MessageKey>() {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!("⚠️  跳过无效标记 / Skipping invalid marker: {}", e);
                    None
                }
            })
            .collect()
    }
}
