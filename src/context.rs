//! # 组合根 / Composition Root
//!
//! 在一个共享的键值存储和通知器之上构建所有设置与归档，
//! 由宿主显式持有并传递，没有全局单例
//! Builds every settings holder and archive over one shared key-value store and
//! notifier; the host owns and passes it around explicitly, no global singletons

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::antidelete::{AntiDeleteSettings, DeletedArchive, DeletedIdSet, EditHistoryStore};
use crate::comm::config::{StorageBackend, StorageConfig};
use crate::error::GhostError;
use crate::kv::{KvStore, MemoryKv, SledKv};
use crate::notify::ChangeNotifier;
use crate::settings::{
    DeviceSpoofSettings, GhostModeSettings, MiscSettings, UserNotes, VoiceMorpherSettings,
};
use crate::voice::{VoiceMorpherEngine, VoiceProcessor};

/// 应用上下文 / Application context
pub struct Ghostgram {
    kv: Arc<dyn KvStore>,
    notifier: ChangeNotifier,

    pub ghost_mode: GhostModeSettings,
    pub misc: MiscSettings,
    pub device_spoof: DeviceSpoofSettings,
    pub voice_morpher: VoiceMorpherSettings,
    pub user_notes: UserNotes,

    pub anti_delete: AntiDeleteSettings,
    pub archive: DeletedArchive,
    pub deleted_ids: DeletedIdSet,
    pub edit_history: EditHistoryStore,
}

impl Ghostgram {
    /// 在给定存储上构建 / Build over the given store
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        let notifier = ChangeNotifier::new();
        let anti_delete = AntiDeleteSettings::new(Arc::clone(&kv), notifier.clone());

        Self {
            ghost_mode: GhostModeSettings::new(Arc::clone(&kv), notifier.clone()),
            misc: MiscSettings::new(Arc::clone(&kv), notifier.clone()),
            device_spoof: DeviceSpoofSettings::new(Arc::clone(&kv), notifier.clone()),
            voice_morpher: VoiceMorpherSettings::new(Arc::clone(&kv), notifier.clone()),
            user_notes: UserNotes::new(Arc::clone(&kv), notifier.clone()),
            archive: DeletedArchive::new(Arc::clone(&kv), anti_delete.clone()),
            deleted_ids: DeletedIdSet::new(Arc::clone(&kv), anti_delete.clone()),
            edit_history: EditHistoryStore::new(Arc::clone(&kv)),
            anti_delete,
            kv,
            notifier,
        }
    }

    /// 纯内存实例 / In-memory instance
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKv::new()))
    }

    /// 按存储配置打开 / Open according to the storage configuration
    pub fn open(config: &StorageConfig) -> Result<Self, GhostError> {
        config.validate()?;
        let kv: Arc<dyn KvStore> = match config.backend {
            StorageBackend::Sled => Arc::new(SledKv::open(&config.path, config.flush_on_write)?),
            StorageBackend::Memory => Arc::new(MemoryKv::new()),
        };
        info!("👻 Ghostgram 已就绪 / Ghostgram ready ({:?} backend)", config.backend);
        Ok(Self::new(kv))
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn kv(&self) -> &Arc<dyn KvStore> {
        &self.kv
    }

    /// 基于当前变声设置的引擎 / Engine over the current voice settings
    pub fn voice_engine(&self, processor: Arc<dyn VoiceProcessor>) -> VoiceMorpherEngine {
        VoiceMorpherEngine::new(self.voice_morpher.clone(), processor)
    }

    /// 确保写入落盘 / Make sure writes reach disk
    pub fn flush(&self) -> Result<(), GhostError> {
        self.kv.flush()?;
        Ok(())
    }

    /// 状态快照 / Status snapshot
    pub fn status(&self) -> StatusReport {
        StatusReport {
            ghost_mode: FeatureStatus {
                enabled: self.ghost_mode.is_enabled(),
                active_features: self.ghost_mode.active_feature_count(),
                total_features: GhostModeSettings::TOTAL_FEATURE_COUNT,
            },
            misc: FeatureStatus {
                enabled: self.misc.is_enabled(),
                active_features: self.misc.active_feature_count(),
                total_features: MiscSettings::TOTAL_FEATURE_COUNT,
            },
            device_spoof_enabled: self.device_spoof.is_enabled(),
            device_profile: self.device_spoof.selected_profile().map(|p| p.name),
            voice_preset: self.voice_morpher.effective_preset().name(),
            anti_delete_enabled: self.anti_delete.is_enabled(),
            archived_messages: self.archive.count(),
            deleted_markers: self.deleted_ids.len(),
            edited_messages: self.edit_history.message_count(),
            user_notes: self.user_notes.count(),
        }
    }
}

/// 功能区状态 / Feature area status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureStatus {
    pub enabled: bool,
    pub active_features: usize,
    pub total_features: usize,
}

/// 状态报告 / Status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub ghost_mode: FeatureStatus,
    pub misc: FeatureStatus,
    pub device_spoof_enabled: bool,
    pub device_profile: Option<&'static str>,
    pub voice_preset: &'static str,
    pub anti_delete_enabled: bool,
    pub archived_messages: usize,
    pub deleted_markers: usize,
    pub edited_messages: usize,
    pub user_notes: usize,
}
