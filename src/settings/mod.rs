//! # 功能开关 / Feature Flag Stores
//!
//! 每个功能区一个设置持有者，逐字段持久化并在修改后广播变更
//! One settings holder per feature area; each field persists on its own key and
//! every mutation is broadcast
//!
//! ## 持有者 / Holders
//!
//! - `GhostModeSettings`: 隐身模式 / Ghost mode
//! - `MiscSettings`: 杂项绕过 / Misc bypasses
//! - `DeviceSpoofSettings`: 设备伪装 / Device spoofing
//! - `VoiceMorpherSettings`: 变声预设 / Voice morph presets
//! - `UserNotes`: 本地用户备注 / Local notes about users

pub mod device_spoof;
pub mod ghost_mode;
pub mod misc;
pub mod user_notes;
pub mod voice_morpher;

pub use device_spoof::{DeviceProfile, DeviceSpoofSettings};
pub use ghost_mode::GhostModeSettings;
pub use misc::MiscSettings;
pub use user_notes::UserNotes;
pub use voice_morpher::{VoiceMorpherSettings, VoicePreset};

use std::sync::Arc;
use tracing::warn;

use crate::error::describe_error;
use crate::kv::{KvStore, KvStoreExt};
use crate::notify::{ChangeNotifier, SettingsEvent, SettingsScope};

// ============================================================================
// 通用开关存储 / Generic Flag Store
// ============================================================================

/// 单个功能区的字段读写助手 / Field access helper for one feature area
///
/// 读取失败返回默认值，写入失败记录日志后吞掉
/// Read failures yield the default; write failures are logged and swallowed
#[derive(Clone)]
pub struct FlagStore {
    kv: Arc<dyn KvStore>,
    notifier: ChangeNotifier,
    scope: SettingsScope,
}

impl FlagStore {
    pub fn new(kv: Arc<dyn KvStore>, notifier: ChangeNotifier, scope: SettingsScope) -> Self {
        Self {
            kv,
            notifier,
            scope,
        }
    }

    pub fn bool(&self, key: &str) -> bool {
        self.kv.get_bool(key).unwrap_or_else(|e| {
            warn!("⚠️  读取 {} 失败 / Read failed: {}", key, describe_error(&e));
            None
        })
        .unwrap_or(false)
    }

    pub fn i64(&self, key: &str) -> i64 {
        self.kv.get_i64(key).unwrap_or_else(|e| {
            warn!("⚠️  读取 {} 失败 / Read failed: {}", key, describe_error(&e));
            None
        })
        .unwrap_or(0)
    }

    pub fn string(&self, key: &str) -> String {
        self.kv.get_string(key).unwrap_or_else(|e| {
            warn!("⚠️  读取 {} 失败 / Read failed: {}", key, describe_error(&e));
            None
        })
        .unwrap_or_default()
    }

    /// 键是否已写入过 / Whether the key was ever written
    pub fn is_set(&self, key: &str) -> bool {
        self.kv.contains(key).unwrap_or(false)
    }

    pub fn set_bool(&self, key: &str, field: &str, value: bool) {
        if let Err(e) = self.kv.set_bool(key, value) {
            warn!("⚠️  写入 {} 失败 / Write failed: {}", key, describe_error(&e));
        }
        self.notify(field);
    }

    pub fn set_i64(&self, key: &str, field: &str, value: i64) {
        if let Err(e) = self.kv.set_i64(key, value) {
            warn!("⚠️  写入 {} 失败 / Write failed: {}", key, describe_error(&e));
        }
        self.notify(field);
    }

    pub fn set_string(&self, key: &str, field: &str, value: &str) {
        if let Err(e) = self.kv.set_string(key, value) {
            warn!("⚠️  写入 {} 失败 / Write failed: {}", key, describe_error(&e));
        }
        self.notify(field);
    }

    /// 写入首次启动默认值（不广播）/ Write a first-run default without broadcasting
    pub fn seed_bool(&self, key: &str, value: bool) {
        if let Err(e) = self.kv.set_bool(key, value) {
            warn!("⚠️  写入默认值 {} 失败 / Seeding failed: {}", key, describe_error(&e));
        }
    }

    pub fn notify(&self, field: &str) {
        self.notifier.publish(SettingsEvent::new(self.scope, field));
    }
}
