//! # Ghostgram
//!
//! 消息客户端的本地隐私开关、防撤回归档与编辑历史
//! Local privacy toggles, deleted-message archive and edit history for a
//! messaging client
//!
//! 所有存储通过 [`context::Ghostgram`] 在同一个 [`kv::KvStore`] 上组装
//! Every store is assembled over one [`kv::KvStore`] by [`context::Ghostgram`]

pub mod antidelete;
pub mod cli;
pub mod comm;
pub mod context;
pub mod error;
pub mod kv;
pub mod notify;
pub mod settings;
pub mod voice;

pub use antidelete::{
    AntiDeleteSettings, ArchivedMessage, DeletedArchive, DeletedIdSet, EditHistoryStore,
    EditRecord, MessageKey,
};
pub use context::{Ghostgram, StatusReport};
pub use error::{GhostError, KvError, KvResult};
pub use kv::{KvStore, KvStoreExt, MemoryKv, SledKv};
pub use notify::{ChangeNotifier, SettingsEvent, SettingsListener, SettingsScope, SubscriptionId};
pub use settings::{
    DeviceProfile, DeviceSpoofSettings, GhostModeSettings, MiscSettings, UserNotes,
    VoiceMorpherSettings, VoicePreset,
};
pub use voice::{VoiceError, VoiceMorpherEngine, VoiceProcessor};
