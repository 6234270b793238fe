//! 变声设置 / Voice Morpher Settings

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::FlagStore;
use crate::kv::KvStore;
use crate::notify::{ChangeNotifier, SettingsScope};

mod keys {
    pub const IS_ENABLED: &str = "VoiceMorpher.isEnabled";
    pub const SELECTED_PRESET: &str = "VoiceMorpher.selectedPreset";
}

/// 变声预设 / Voice preset
///
/// 数值与原生处理库的枚举保持一致
/// Discriminants match the native processor's enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoicePreset {
    Disabled = 0,
    Anonymous = 1,
    Female = 2,
    Male = 3,
    Child = 4,
    Robot = 5,
}

impl VoicePreset {
    pub const ALL: [VoicePreset; 6] = [
        VoicePreset::Disabled,
        VoicePreset::Anonymous,
        VoicePreset::Female,
        VoicePreset::Male,
        VoicePreset::Child,
        VoicePreset::Robot,
    ];

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn name(self) -> &'static str {
        match self {
            VoicePreset::Disabled => "Off",
            VoicePreset::Anonymous => "Anonymous",
            VoicePreset::Female => "Female",
            VoicePreset::Male => "Male",
            VoicePreset::Child => "Child",
            VoicePreset::Robot => "Robot",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            VoicePreset::Disabled => "Voice unchanged",
            VoicePreset::Anonymous => "Distorted voice, like a news interview",
            VoicePreset::Female => "Raised pitch and formants",
            VoicePreset::Male => "Lowered pitch and formants",
            VoicePreset::Child => "High child-like voice",
            VoicePreset::Robot => "Metallic effect",
        }
    }

    /// 音高偏移（音分）/ Pitch shift in cents
    pub fn pitch_shift(self) -> f32 {
        match self {
            VoicePreset::Disabled | VoicePreset::Robot => 0.0,
            VoicePreset::Anonymous => -200.0,
            VoicePreset::Female | VoicePreset::Child => 600.0,
            VoicePreset::Male => -300.0,
        }
    }

    /// 语速倍率 / Playback rate multiplier
    pub fn rate(self) -> f32 {
        match self {
            VoicePreset::Disabled | VoicePreset::Robot => 1.0,
            VoicePreset::Anonymous | VoicePreset::Male => 0.95,
            VoicePreset::Female => 1.08,
            VoicePreset::Child => 1.1,
        }
    }

    pub fn use_distortion(self) -> bool {
        matches!(self, VoicePreset::Robot | VoicePreset::Anonymous)
    }

    /// 混响量（0-100）/ Reverb amount (0-100)
    pub fn reverb_amount(self) -> f32 {
        match self {
            VoicePreset::Anonymous => 20.0,
            VoicePreset::Robot => 30.0,
            _ => 0.0,
        }
    }
}

/// 变声设置 / Voice morpher settings
#[derive(Clone)]
pub struct VoiceMorpherSettings {
    flags: FlagStore,
}

impl VoiceMorpherSettings {
    pub fn new(kv: Arc<dyn KvStore>, notifier: ChangeNotifier) -> Self {
        Self {
            flags: FlagStore::new(kv, notifier, SettingsScope::VoiceMorpher),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.bool(keys::IS_ENABLED)
    }

    pub fn set_enabled(&self, value: bool) {
        self.flags.set_bool(keys::IS_ENABLED, "is_enabled", value);
    }

    pub fn selected_preset_id(&self) -> i64 {
        self.flags.i64(keys::SELECTED_PRESET)
    }

    pub fn set_selected_preset_id(&self, id: i64) {
        self.flags.set_i64(keys::SELECTED_PRESET, "selected_preset", id);
    }

    pub fn set_selected_preset(&self, preset: VoicePreset) {
        self.set_selected_preset_id(preset.id());
    }

    /// 未知编号按关闭处理 / Unknown ids read as `Disabled`
    pub fn selected_preset(&self) -> VoicePreset {
        VoicePreset::from_id(self.selected_preset_id()).unwrap_or(VoicePreset::Disabled)
    }

    /// 未启用时始终为关闭 / `Disabled` whenever the feature is off
    pub fn effective_preset(&self) -> VoicePreset {
        if !self.is_enabled() {
            return VoicePreset::Disabled;
        }
        self.selected_preset()
    }
}
