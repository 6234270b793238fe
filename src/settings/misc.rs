//! 杂项设置 / Misc Settings
//!
//! 转发保护绕过、阅后即焚保留、截图保护绕过、屏蔽广告、保持在线
//! Copy-protection bypass, view-once persistence, screenshot bypass, ad blocking,
//! always online

use std::sync::Arc;
use tracing::info;

use super::FlagStore;
use crate::kv::KvStore;
use crate::notify::{ChangeNotifier, SettingsScope};

mod keys {
    pub const INITIALIZED: &str = "MiscSettings.initialized";
    pub const IS_ENABLED: &str = "MiscSettings.isEnabled";
    pub const BYPASS_COPY_PROTECTION: &str = "MiscSettings.bypassCopyProtection";
    pub const DISABLE_VIEW_ONCE_AUTO_DELETE: &str = "MiscSettings.disableViewOnceAutoDelete";
    pub const BYPASS_SCREENSHOT_PROTECTION: &str = "MiscSettings.bypassScreenshotProtection";
    pub const BLOCK_ADS: &str = "MiscSettings.blockAds";
    pub const ALWAYS_ONLINE: &str = "MiscSettings.alwaysOnline";
}

/// 杂项设置 / Misc settings
#[derive(Clone)]
pub struct MiscSettings {
    flags: FlagStore,
}

impl MiscSettings {
    pub const TOTAL_FEATURE_COUNT: usize = 5;

    pub fn new(kv: Arc<dyn KvStore>, notifier: ChangeNotifier) -> Self {
        let flags = FlagStore::new(kv, notifier, SettingsScope::Misc);
        if !flags.bool(keys::INITIALIZED) {
            info!("🧰 写入杂项默认值 / Seeding misc defaults");
            flags.seed_bool(keys::INITIALIZED, true);
            flags.seed_bool(keys::IS_ENABLED, false);
            flags.seed_bool(keys::BYPASS_COPY_PROTECTION, true);
            flags.seed_bool(keys::DISABLE_VIEW_ONCE_AUTO_DELETE, true);
            flags.seed_bool(keys::BYPASS_SCREENSHOT_PROTECTION, true);
            flags.seed_bool(keys::BLOCK_ADS, true);
        }
        Self { flags }
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.bool(keys::IS_ENABLED)
    }

    pub fn set_enabled(&self, value: bool) {
        self.flags.set_bool(keys::IS_ENABLED, "is_enabled", value);
    }

    /// 允许从受保护会话转发/复制 / Allow forwarding/copying from protected chats
    pub fn bypass_copy_protection(&self) -> bool {
        self.flags.bool(keys::BYPASS_COPY_PROTECTION)
    }

    pub fn set_bypass_copy_protection(&self, value: bool) {
        self.flags
            .set_bool(keys::BYPASS_COPY_PROTECTION, "bypass_copy_protection", value);
    }

    /// 阅后即焚媒体查看后不删除 / Keep view-once media after viewing
    pub fn disable_view_once_auto_delete(&self) -> bool {
        self.flags.bool(keys::DISABLE_VIEW_ONCE_AUTO_DELETE)
    }

    pub fn set_disable_view_once_auto_delete(&self, value: bool) {
        self.flags.set_bool(
            keys::DISABLE_VIEW_ONCE_AUTO_DELETE,
            "disable_view_once_auto_delete",
            value,
        );
    }

    /// 允许在受保护内容中截图 / Allow screenshots of protected content
    pub fn bypass_screenshot_protection(&self) -> bool {
        self.flags.bool(keys::BYPASS_SCREENSHOT_PROTECTION)
    }

    pub fn set_bypass_screenshot_protection(&self, value: bool) {
        self.flags.set_bool(
            keys::BYPASS_SCREENSHOT_PROTECTION,
            "bypass_screenshot_protection",
            value,
        );
    }

    /// 屏蔽频道赞助消息 / Block sponsored messages
    pub fn block_ads(&self) -> bool {
        self.flags.bool(keys::BLOCK_ADS)
    }

    pub fn set_block_ads(&self, value: bool) {
        self.flags.set_bool(keys::BLOCK_ADS, "block_ads", value);
    }

    /// 保持在线状态 / Keep online status active
    pub fn always_online(&self) -> bool {
        self.flags.bool(keys::ALWAYS_ONLINE)
    }

    pub fn set_always_online(&self, value: bool) {
        self.flags.set_bool(keys::ALWAYS_ONLINE, "always_online", value);
    }

    pub fn should_bypass_copy_protection(&self) -> bool {
        self.is_enabled() && self.bypass_copy_protection()
    }

    pub fn should_disable_view_once_auto_delete(&self) -> bool {
        self.is_enabled() && self.disable_view_once_auto_delete()
    }

    pub fn should_bypass_screenshot_protection(&self) -> bool {
        self.is_enabled() && self.bypass_screenshot_protection()
    }

    pub fn should_block_ads(&self) -> bool {
        self.is_enabled() && self.block_ads()
    }

    pub fn should_always_be_online(&self) -> bool {
        self.is_enabled() && self.always_online()
    }

    pub fn active_feature_count(&self) -> usize {
        [
            self.bypass_copy_protection(),
            self.disable_view_once_auto_delete(),
            self.bypass_screenshot_protection(),
            self.block_ads(),
            self.always_online(),
        ]
        .into_iter()
        .filter(|on| *on)
        .count()
    }

    /// 打开全部子功能（不动总开关）/ Turn every feature on, master untouched
    pub fn enable_all(&self) {
        self.set_all(true);
    }

    /// 关闭全部子功能（不动总开关）/ Turn every feature off, master untouched
    pub fn disable_all(&self) {
        self.set_all(false);
    }

    fn set_all(&self, value: bool) {
        self.set_bypass_copy_protection(value);
        self.set_disable_view_once_auto_delete(value);
        self.set_bypass_screenshot_protection(value);
        self.set_block_ads(value);
        self.set_always_online(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    fn settings() -> MiscSettings {
        MiscSettings::new(Arc::new(MemoryKv::new()), ChangeNotifier::new())
    }

    #[test]
    fn first_run_leaves_always_online_off() {
        let misc = settings();
        assert!(!misc.is_enabled());
        assert!(misc.block_ads());
        assert!(!misc.always_online());
        assert_eq!(misc.active_feature_count(), 4);
    }

    #[test]
    fn bulk_toggles_leave_master_alone() {
        let misc = settings();
        misc.set_enabled(true);
        misc.disable_all();
        assert!(misc.is_enabled());
        assert_eq!(misc.active_feature_count(), 0);
        assert!(!misc.should_block_ads());

        misc.enable_all();
        assert!(misc.should_always_be_online());
        assert_eq!(misc.active_feature_count(), MiscSettings::TOTAL_FEATURE_COUNT);
    }

    #[test]
    fn bulk_toggle_publishes_per_field() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.channel();
        let misc = MiscSettings::new(Arc::new(MemoryKv::new()), notifier);
        misc.enable_all();

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event.key);
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[3], "block_ads");
    }
}
