//! 变声引擎 / Voice Morpher Engine
//!
//! 实际的音频处理由外部原生库完成，这里只负责选择预设并在关闭时直通
//! Audio processing lives in an external native library; this layer picks the
//! preset and passes audio through untouched when morphing is off

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::{VoiceMorpherSettings, VoicePreset};

/// 语音处理错误 / Voice processing error
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("不支持的音频格式 / Unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("处理器失败 / Processor failed: {0}")]
    Processor(String),
}

/// 外部音频处理器 / External audio processor
pub trait VoiceProcessor: Send + Sync {
    fn process(&self, input: &[u8], preset: VoicePreset) -> Result<Vec<u8>, VoiceError>;
}

/// 变声引擎 / Voice morpher engine
pub struct VoiceMorpherEngine {
    settings: VoiceMorpherSettings,
    processor: Arc<dyn VoiceProcessor>,
}

impl VoiceMorpherEngine {
    pub fn new(settings: VoiceMorpherSettings, processor: Arc<dyn VoiceProcessor>) -> Self {
        Self {
            settings,
            processor,
        }
    }

    pub fn settings(&self) -> &VoiceMorpherSettings {
        &self.settings
    }

    /// 按当前生效预设处理 / Process with the effective preset
    pub fn process(&self, input: &[u8]) -> Result<Vec<u8>, VoiceError> {
        let preset = self.settings.effective_preset();
        if preset == VoicePreset::Disabled {
            return Ok(input.to_vec());
        }

        debug!(
            "🎙️ 变声处理 / Morphing {} bytes with preset {}",
            input.len(),
            preset.name()
        );
        self.processor.process(input, preset)
    }

    /// 失败时返回原始音频 / Falls back to the original audio on failure
    pub fn process_or_passthrough(&self, input: &[u8]) -> Vec<u8> {
        match self.process(input) {
            Ok(output) => output,
            Err(e) => {
                warn!("⚠️  变声失败，使用原始音频 / Morphing failed, passing through: {}", e);
                input.to_vec()
            }
        }
    }
}
