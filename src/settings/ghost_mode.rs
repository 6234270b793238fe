//! 隐身模式设置 / Ghost Mode Settings
//!
//! 隐藏已读回执、输入状态、在线状态与故事浏览
//! Hides read receipts, typing indicator, online status and story views

use std::sync::Arc;
use tracing::info;

use super::FlagStore;
use crate::kv::KvStore;
use crate::notify::{ChangeNotifier, SettingsScope};

/// 存储键 / Storage keys
mod keys {
    pub const INITIALIZED: &str = "GhostMode.initialized";
    pub const IS_ENABLED: &str = "GhostMode.isEnabled";
    pub const HIDE_READ_RECEIPTS: &str = "GhostMode.hideReadReceipts";
    pub const HIDE_STORY_VIEWS: &str = "GhostMode.hideStoryViews";
    pub const HIDE_ONLINE_STATUS: &str = "GhostMode.hideOnlineStatus";
    pub const HIDE_TYPING_INDICATOR: &str = "GhostMode.hideTypingIndicator";
    pub const FORCE_OFFLINE: &str = "GhostMode.forceOffline";
}

/// 隐身模式设置 / Ghost mode settings
#[derive(Clone)]
pub struct GhostModeSettings {
    flags: FlagStore,
}

impl GhostModeSettings {
    /// 功能总数 / Number of individual features
    pub const TOTAL_FEATURE_COUNT: usize = 5;

    /// 创建设置；首次使用时写入默认值
    /// Create the settings, seeding defaults on first use
    pub fn new(kv: Arc<dyn KvStore>, notifier: ChangeNotifier) -> Self {
        let flags = FlagStore::new(kv, notifier, SettingsScope::GhostMode);
        if !flags.bool(keys::INITIALIZED) {
            info!("👻 写入隐身模式默认值 / Seeding ghost mode defaults");
            flags.seed_bool(keys::INITIALIZED, true);
            // 子功能默认全开，总开关默认关闭 / Features on, master switch off
            flags.seed_bool(keys::HIDE_READ_RECEIPTS, true);
            flags.seed_bool(keys::HIDE_STORY_VIEWS, true);
            flags.seed_bool(keys::HIDE_ONLINE_STATUS, true);
            flags.seed_bool(keys::HIDE_TYPING_INDICATOR, true);
            flags.seed_bool(keys::FORCE_OFFLINE, true);
            flags.seed_bool(keys::IS_ENABLED, false);
        }
        Self { flags }
    }

    // ------------------------------------------------------------------
    // 字段 / Fields
    // ------------------------------------------------------------------

    /// 总开关 / Master toggle
    pub fn is_enabled(&self) -> bool {
        self.flags.bool(keys::IS_ENABLED)
    }

    pub fn set_enabled(&self, value: bool) {
        self.flags.set_bool(keys::IS_ENABLED, "is_enabled", value);
    }

    /// 不发送已读回执 / Don't send read receipts
    pub fn hide_read_receipts(&self) -> bool {
        self.flags.bool(keys::HIDE_READ_RECEIPTS)
    }

    pub fn set_hide_read_receipts(&self, value: bool) {
        self.flags
            .set_bool(keys::HIDE_READ_RECEIPTS, "hide_read_receipts", value);
    }

    /// 不发送故事浏览记录 / Don't send story views
    pub fn hide_story_views(&self) -> bool {
        self.flags.bool(keys::HIDE_STORY_VIEWS)
    }

    pub fn set_hide_story_views(&self, value: bool) {
        self.flags
            .set_bool(keys::HIDE_STORY_VIEWS, "hide_story_views", value);
    }

    /// 不发送在线状态 / Don't send online status
    pub fn hide_online_status(&self) -> bool {
        self.flags.bool(keys::HIDE_ONLINE_STATUS)
    }

    pub fn set_hide_online_status(&self, value: bool) {
        self.flags
            .set_bool(keys::HIDE_ONLINE_STATUS, "hide_online_status", value);
    }

    /// 不发送输入状态 / Don't send typing indicator
    pub fn hide_typing_indicator(&self) -> bool {
        self.flags.bool(keys::HIDE_TYPING_INDICATOR)
    }

    pub fn set_hide_typing_indicator(&self, value: bool) {
        self.flags
            .set_bool(keys::HIDE_TYPING_INDICATOR, "hide_typing_indicator", value);
    }

    /// 始终显示离线 / Always appear offline
    pub fn force_offline(&self) -> bool {
        self.flags.bool(keys::FORCE_OFFLINE)
    }

    pub fn set_force_offline(&self, value: bool) {
        self.flags.set_bool(keys::FORCE_OFFLINE, "force_offline", value);
    }

    // ------------------------------------------------------------------
    // 生效判断（总开关 && 子功能）/ Effective checks (master && feature)
    // ------------------------------------------------------------------

    pub fn should_hide_read_receipts(&self) -> bool {
        self.is_enabled() && self.hide_read_receipts()
    }

    pub fn should_hide_story_views(&self) -> bool {
        self.is_enabled() && self.hide_story_views()
    }

    pub fn should_hide_online_status(&self) -> bool {
        self.is_enabled() && self.hide_online_status()
    }

    pub fn should_hide_typing_indicator(&self) -> bool {
        self.is_enabled() && self.hide_typing_indicator()
    }

    pub fn should_force_offline(&self) -> bool {
        self.is_enabled() && self.force_offline()
    }

    /// 已开启的子功能数量（不看总开关），如 "5/5"
    /// Number of features switched on, regardless of the master toggle
    pub fn active_feature_count(&self) -> usize {
        [
            self.hide_read_receipts(),
            self.hide_story_views(),
            self.hide_online_status(),
            self.hide_typing_indicator(),
            self.force_offline(),
        ]
        .into_iter()
        .filter(|on| *on)
        .count()
    }

    /// 打开全部功能与总开关 / Turn every feature and the master toggle on
    pub fn enable_all(&self) {
        self.set_hide_read_receipts(true);
        self.set_hide_story_views(true);
        self.set_hide_online_status(true);
        self.set_hide_typing_indicator(true);
        self.set_force_offline(true);
        self.set_enabled(true);
    }

    /// 只关闭总开关 / Turn only the master toggle off
    pub fn disable_all(&self) {
        self.set_enabled(false);
    }
}
