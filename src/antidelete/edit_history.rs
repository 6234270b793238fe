//! 编辑历史 / Edit History
//!
//! 在新文本写入前保存原文，整个映射作为一个 JSON 对象持久化
//! Keeps the previous text before each edit; the whole mapping persists as one
//! JSON object keyed by `<peerId>_<messageId>`

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::MessageKey;
use crate::error::describe_error;
use crate::kv::KvStore;

/// 历史存储键 / History storage key
pub const EDIT_HISTORY_KEY: &str = "ghostgram_edit_history";

/// 一个历史版本 / One prior version of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord {
    pub text: String,
    /// 编辑时间（秒）/ Edit time, seconds
    pub edit_date: i32,
}

/// 编辑历史存储 / Edit history store
pub struct EditHistoryStore {
    kv: Arc<dyn KvStore>,
    history: Mutex<HashMap<MessageKey, Vec<EditRecord>>>,
}

impl EditHistoryStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        let history = Self::load(kv.as_ref());
        Self {
            kv,
            history: Mutex::new(history),
        }
    }

    /// 在编辑生效前保存原文 / Save the original text before an edit lands
    ///
    /// 空文本或与最近一条相同的文本不会被保存
    /// Empty text, or text equal to the latest record, is not saved
    pub fn record_original(
        &self,
        peer_id: i64,
        message_id: i32,
        original_text: &str,
        edit_date: i32,
    ) -> bool {
        if original_text.is_empty() {
            return false;
        }

        let key = MessageKey::new(peer_id, message_id);
        let mut history = self.history.lock();
        let records = history.entry(key).or_default();
        if records.last().is_some_and(|r| r.text == original_text) {
            return false;
        }

        records.push(EditRecord {
            text: original_text.to_string(),
            edit_date,
        });
        debug!(
            "📝 记录编辑历史 / Recorded edit for {} ({} versions)",
            key,
            records.len()
        );
        self.persist(&history);
        true
    }

    /// 按时间正序的历史 / History, oldest first
    pub fn history(&self, peer_id: i64, message_id: i32) -> Vec<EditRecord> {
        self.history
            .lock()
            .get(&MessageKey::new(peer_id, message_id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_history(&self, peer_id: i64, message_id: i32) -> bool {
        self.history
            .lock()
            .get(&MessageKey::new(peer_id, message_id))
            .is_some_and(|records| !records.is_empty())
    }

    pub fn clear(&self, peer_id: i64, message_id: i32) {
        let mut history = self.history.lock();
        history.remove(&MessageKey::new(peer_id, message_id));
        self.persist(&history);
    }

    pub fn clear_all(&self) {
        let mut history = self.history.lock();
        history.clear();
        self.persist(&history);
    }

    /// 有历史的消息数 / Number of messages with history
    pub fn message_count(&self) -> usize {
        self.history
            .lock()
            .values()
            .filter(|records| !records.is_empty())
            .count()
    }

    /// 调用方必须持有锁 / Caller must hold the lock
    fn persist(&self, history: &HashMap<MessageKey, Vec<EditRecord>>) {
        let flat: BTreeMap<String, &Vec<EditRecord>> = history
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(key, records)| (key.to_string(), records))
            .collect();

        let bytes = match serde_json::to_vec(&flat) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("❌ 序列化编辑历史失败 / Failed to serialize edit history: {}", e);
                return;
            }
        };
        if let Err(e) = self.kv.set(EDIT_HISTORY_KEY, &bytes) {
            error!(
                "❌ 保存编辑历史失败 / Failed to save edit history: {}",
                describe_error(&e)
            );
        }
    }

    fn load(kv: &dyn KvStore) -> HashMap<MessageKey, Vec<EditRecord>> {
        let bytes = match kv.get(EDIT_HISTORY_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return HashMap::new(),
            Err(e) => {
                warn!(
                    "⚠️  读取编辑历史失败 / Failed to read edit history: {}",
                    describe_error(&e)
                );
                return HashMap::new();
            }
        };

        let flat: HashMap<String, Vec<EditRecord>> = match serde_json::from_slice(&bytes) {
            Ok(flat) => flat,
            Err(e) => {
                warn!("⚠️  编辑历史损坏，已丢弃 / Edit history corrupt, discarded: {}", e);
                return HashMap::new();
            }
        };

        flat.into_iter()
            .filter_map(|(key, records)| match key.parse::<MessageKey>() {
                Ok(key) => Some((key, records)),
                Err(e) => {
                    warn!("⚠️  跳过无效历史键 / Skipping invalid history key: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    #[test]
    fn immediate_repeats_are_suppressed() {
        let store = EditHistoryStore::new(Arc::new(MemoryKv::new()));
        assert!(store.record_original(1, 1, "draft", 10));
        assert!(!store.record_original(1, 1, "draft", 11));
        assert_eq!(store.history(1, 1).len(), 1);
    }

    #[test]
    fn only_consecutive_duplicates_are_suppressed() {
        let store = EditHistoryStore::new(Arc::new(MemoryKv::new()));
        store.record_original(1, 1, "a", 1);
        store.record_original(1, 1, "b", 2);
        store.record_original(1, 1, "a", 3);

        let texts: Vec<String> = store.history(1, 1).into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["a", "b", "a"]);
    }

    #[test]
    fn empty_text_is_ignored() {
        let store = EditHistoryStore::new(Arc::new(MemoryKv::new()));
        assert!(!store.record_original(1, 1, "", 1));
        assert!(!store.has_history(1, 1));
        assert_eq!(store.message_count(), 0);
    }

    #[test]
    fn clear_one_and_all() {
        let store = EditHistoryStore::new(Arc::new(MemoryKv::new()));
        store.record_original(1, 1, "x", 1);
        store.record_original(2, 2, "y", 1);

        store.clear(1, 1);
        assert!(!store.has_history(1, 1));
        assert!(store.has_history(2, 2));

        store.clear_all();
        assert_eq!(store.message_count(), 0);
        assert!(store.history(2, 2).is_empty());
    }

    #[test]
    fn persisted_as_nested_mapping() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        let store = EditHistoryStore::new(Arc::clone(&kv));
        store.record_original(-100, 3, "before", 1700000000);

        let raw = kv.get(EDIT_HISTORY_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["-100_3"][0]["text"], "before");
        assert_eq!(json["-100_3"][0]["editDate"], 1700000000);
    }
}
