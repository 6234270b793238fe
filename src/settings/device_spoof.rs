//! 设备伪装设置 / Device Spoof Settings
//!
//! 修改上报给服务器的设备型号与系统版本
//! Changes the device model and system version reported to the server

use serde::Serialize;
use std::sync::Arc;

use super::FlagStore;
use crate::kv::KvStore;
use crate::notify::{ChangeNotifier, SettingsScope};

mod keys {
    pub const IS_ENABLED: &str = "DeviceSpoof.isEnabled";
    pub const SELECTED_PROFILE_ID: &str = "DeviceSpoof.selectedProfileId";
    pub const CUSTOM_DEVICE_MODEL: &str = "DeviceSpoof.customDeviceModel";
    pub const CUSTOM_SYSTEM_VERSION: &str = "DeviceSpoof.customSystemVersion";
}

/// 设备预设 / Device preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    pub id: i64,
    pub name: &'static str,
    pub device_model: &'static str,
    pub system_version: &'static str,
}

const fn profile(
    id: i64,
    name: &'static str,
    device_model: &'static str,
    system_version: &'static str,
) -> DeviceProfile {
    DeviceProfile {
        id,
        name,
        device_model,
        system_version,
    }
}

/// 真实设备 / Real device
pub const REAL_DEVICE_PROFILE_ID: i64 = 0;
/// 自定义设备 / Custom device
pub const CUSTOM_PROFILE_ID: i64 = 100;

/// 预设列表 / Preset table
pub const PROFILES: &[DeviceProfile] = &[
    profile(REAL_DEVICE_PROFILE_ID, "Real device", "", ""),
    profile(1, "iPhone 14 Pro", "iPhone 14 Pro", "iOS 17.2"),
    profile(2, "iPhone 15 Pro Max", "iPhone 15 Pro Max", "iOS 17.4"),
    profile(3, "Samsung Galaxy S23", "Samsung SM-S918B", "Android 14"),
    profile(4, "Google Pixel 8", "Google Pixel 8 Pro", "Android 14"),
    profile(5, "Desktop Windows", "PC 64bit", "Windows 11"),
    profile(6, "Desktop macOS", "MacBook Pro", "macOS 14.3"),
    profile(7, "Telegram Web", "Web", "Chrome 121"),
    profile(8, "Huawei P60 Pro", "HUAWEI MNA-LX9", "HarmonyOS 4.0"),
    profile(9, "Xiaomi 14", "Xiaomi 2311DRK48G", "Android 14"),
    profile(CUSTOM_PROFILE_ID, "Custom device", "", ""),
];

/// 设备伪装设置 / Device spoof settings
#[derive(Clone)]
pub struct DeviceSpoofSettings {
    flags: FlagStore,
}

impl DeviceSpoofSettings {
    pub fn new(kv: Arc<dyn KvStore>, notifier: ChangeNotifier) -> Self {
        Self {
            flags: FlagStore::new(kv, notifier, SettingsScope::DeviceSpoof),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.bool(keys::IS_ENABLED)
    }

    pub fn set_enabled(&self, value: bool) {
        self.flags.set_bool(keys::IS_ENABLED, "is_enabled", value);
    }

    /// 选中的预设（0 = 真实设备，100 = 自定义）
    /// Selected preset (0 = real device, 100 = custom)
    pub fn selected_profile_id(&self) -> i64 {
        self.flags.i64(keys::SELECTED_PROFILE_ID)
    }

    pub fn set_selected_profile_id(&self, id: i64) {
        self.flags
            .set_i64(keys::SELECTED_PROFILE_ID, "selected_profile_id", id);
    }

    pub fn custom_device_model(&self) -> String {
        self.flags.string(keys::CUSTOM_DEVICE_MODEL)
    }

    pub fn set_custom_device_model(&self, value: &str) {
        self.flags
            .set_string(keys::CUSTOM_DEVICE_MODEL, "custom_device_model", value);
    }

    pub fn custom_system_version(&self) -> String {
        self.flags.string(keys::CUSTOM_SYSTEM_VERSION)
    }

    pub fn set_custom_system_version(&self, value: &str) {
        self.flags
            .set_string(keys::CUSTOM_SYSTEM_VERSION, "custom_system_version", value);
    }

    pub fn selected_profile(&self) -> Option<&'static DeviceProfile> {
        let id = self.selected_profile_id();
        PROFILES.iter().find(|p| p.id == id)
    }

    /// 当前生效的设备型号 / Currently effective device model
    pub fn effective_device_model(&self) -> Option<String> {
        self.effective(|p| p.device_model, Self::custom_device_model)
    }

    /// 当前生效的系统版本 / Currently effective system version
    pub fn effective_system_version(&self) -> Option<String> {
        self.effective(|p| p.system_version, Self::custom_system_version)
    }

    fn effective(
        &self,
        preset_field: fn(&DeviceProfile) -> &'static str,
        custom_field: fn(&Self) -> String,
    ) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }

        if self.selected_profile_id() == CUSTOM_PROFILE_ID {
            let custom = custom_field(self);
            let custom = custom.trim();
            return (!custom.is_empty()).then(|| custom.to_string());
        }

        self.selected_profile()
            .filter(|p| p.id != REAL_DEVICE_PROFILE_ID)
            .map(preset_field)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}
