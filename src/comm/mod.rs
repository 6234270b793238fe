/// 通用基础模块：配置与日志
/// Common infrastructure: configuration and logging

pub mod config;
pub mod tracing;

// 重新导出主要的公共接口
pub use config::{ConfigManager, ConfigSource, GhostConfig, StorageBackend, StorageConfig};
pub use self::tracing::init_tracing;
