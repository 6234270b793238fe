//! 用户备注 / User Notes
//!
//! 仅保存在本机的用户备注，从不同步到服务器
//! Personal notes about users, stored on this device only

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::warn;

use crate::error::describe_error;
use crate::kv::{KvStore, KvStoreExt};
use crate::notify::{ChangeNotifier, SettingsEvent, SettingsScope};

const NOTE_PREFIX: &str = "UserNotes.note.";
const UPDATED_AT_PREFIX: &str = "UserNotes.updatedAt.";

/// 用户备注存储 / User notes store
#[derive(Clone)]
pub struct UserNotes {
    kv: Arc<dyn KvStore>,
    notifier: ChangeNotifier,
}

impl UserNotes {
    pub fn new(kv: Arc<dyn KvStore>, notifier: ChangeNotifier) -> Self {
        Self { kv, notifier }
    }

    #[inline]
    fn note_key(peer_id: i64) -> String {
        format!("{}{}", NOTE_PREFIX, peer_id)
    }

    #[inline]
    fn updated_at_key(peer_id: i64) -> String {
        format!("{}{}", UPDATED_AT_PREFIX, peer_id)
    }

    pub fn note(&self, peer_id: i64) -> Option<String> {
        self.kv
            .get_string(&Self::note_key(peer_id))
            .unwrap_or_else(|e| {
                warn!("⚠️  读取备注失败 / Read note failed: {}", describe_error(&e));
                None
            })
    }

    /// 设置备注；`None` 或空字符串表示删除
    /// Set a note; `None` or an empty string deletes it
    pub fn set_note(&self, peer_id: i64, note: Option<&str>) {
        let result = match note.filter(|n| !n.is_empty()) {
            Some(text) => self
                .kv
                .set_string(&Self::note_key(peer_id), text)
                .and_then(|_| {
                    self.kv
                        .set_i64(&Self::updated_at_key(peer_id), Utc::now().timestamp())
                }),
            None => self.remove_keys(peer_id),
        };
        if let Err(e) = result {
            warn!("⚠️  保存备注失败 / Save note failed: {}", describe_error(&e));
        }

        self.notifier
            .publish(SettingsEvent::new(SettingsScope::UserNotes, "note").with_peer(peer_id));
    }

    pub fn has_note(&self, peer_id: i64) -> bool {
        self.note(peer_id).is_some_and(|n| !n.is_empty())
    }

    /// 最后修改时间 / Last update time
    pub fn updated_at(&self, peer_id: i64) -> Option<DateTime<Utc>> {
        let secs = self
            .kv
            .get_i64(&Self::updated_at_key(peer_id))
            .ok()
            .flatten()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// 所有有备注的会话 / Every peer with a note
    pub fn all_noted_peer_ids(&self) -> Vec<i64> {
        match self.kv.keys_with_prefix(NOTE_PREFIX) {
            Ok(keys) => keys
                .iter()
                .filter_map(|k| k.strip_prefix(NOTE_PREFIX))
                .filter_map(|id| id.parse::<i64>().ok())
                .collect(),
            Err(e) => {
                warn!("⚠️  列出备注失败 / List notes failed: {}", describe_error(&e));
                Vec::new()
            }
        }
    }

    /// 删除全部备注 / Delete every note
    pub fn delete_all(&self) {
        for peer_id in self.all_noted_peer_ids() {
            if let Err(e) = self.remove_keys(peer_id) {
                warn!("⚠️  删除备注失败 / Delete note failed: {}", describe_error(&e));
            }
        }
        self.notifier
            .publish(SettingsEvent::new(SettingsScope::UserNotes, "all"));
    }

    pub fn count(&self) -> usize {
        self.all_noted_peer_ids().len()
    }

    fn remove_keys(&self, peer_id: i64) -> crate::error::KvResult<()> {
        self.kv.remove(&Self::note_key(peer_id))?;
        self.kv.remove(&Self::updated_at_key(peer_id))
    }
}
