use std::sync::Arc;

use crate::kv::KvStore;
use crate::notify::{ChangeNotifier, SettingsScope};
use crate::settings::FlagStore;

mod keys {
    pub const ENABLED: &str = "antiDelete.enabled";
    pub const ARCHIVE_MEDIA: &str = "antiDelete.archiveMedia";
}

/// 防撤回开关 / Anti-delete toggles
///
/// 两个开关在首次创建时若不存在均默认开启
/// Both toggles default to on when absent at first construction
#[derive(Clone)]
pub struct AntiDeleteSettings {
    flags: FlagStore,
}

impl AntiDeleteSettings {
    pub fn new(kv: Arc<dyn KvStore>, notifier: ChangeNotifier) -> Self {
        let flags = FlagStore::new(kv, notifier, SettingsScope::AntiDelete);
        if !flags.is_set(keys::ENABLED) {
            flags.seed_bool(keys::ENABLED, true);
        }
        if !flags.is_set(keys::ARCHIVE_MEDIA) {
            flags.seed_bool(keys::ARCHIVE_MEDIA, true);
        }
        Self { flags }
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.bool(keys::ENABLED)
    }

    pub fn set_enabled(&self, value: bool) {
        self.flags.set_bool(keys::ENABLED, "enabled", value);
    }

    /// 是否同时保存媒体 / Whether media content is archived too
    pub fn archive_media(&self) -> bool {
        self.flags.bool(keys::ARCHIVE_MEDIA)
    }

    pub fn set_archive_media(&self, value: bool) {
        self.flags.set_bool(keys::ARCHIVE_MEDIA, "archive_media", value);
    }
}
