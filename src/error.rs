use thiserror::Error;

/// 键值存储结果类型 / Key-value store result type
pub type KvResult<T> = std::result::Result<T, KvError>;

/// 键值存储错误 / Key-value store error
#[derive(Debug, Error)]
pub enum KvError {
    #[error("Sled 错误 / Sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("序列化错误 / Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("存储后端错误 / Backend error: {0}")]
    Backend(String),
}

/// 统一的库错误类型 / Unified library error type
#[derive(Debug, Error)]
pub enum GhostError {
    #[error("存储错误: {0}")]
    Kv(#[from] KvError),

    #[error("配置错误: {message}")]
    Config { message: String },

    #[error("语音处理错误: {0}")]
    Voice(#[from] crate::voice::VoiceError),
}

impl GhostError {
    /// 创建配置错误 / Build a configuration error
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 获取错误代码 / Numeric error code
    pub fn error_code(&self) -> i32 {
        match self {
            GhostError::Kv(_) => 2001,
            GhostError::Config { .. } => 2002,
            GhostError::Voice(_) => 2003,
        }
    }
}

/// 获取详细错误描述（中英文） / Get detailed error description (CN/EN)
pub fn describe_error(e: &KvError) -> String {
    match e {
        KvError::Sled(err) => format!("Sled 错误 / Sled error: {}", err),
        KvError::Serde(err) => format!("序列化错误 / Serialization error: {}", err),
        KvError::Backend(msg) => format!("存储后端错误 / Backend error: {}", msg),
    }
}
