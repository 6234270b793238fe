//! # 键值存储 / Key-Value Storage
//!
//! 所有设置与归档共用的持久化接口
//! Persistence seam shared by every settings holder and archive
//!
//! - `KvStore`: 原始字节读写，按单键原子写入 / Raw byte access, atomic per key
//! - `KvStoreExt`: JSON 编码的类型化读写 / JSON-encoded typed access
//! - `MemoryKv` / `SledKv`: 内存与 Sled 后端 / In-memory and Sled backends

mod memory;
mod sled_kv;

pub use memory::MemoryKv;
pub use sled_kv::SledKv;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::KvResult;

// ============================================================================
// 存储 Trait / Storage Trait
// ============================================================================

/// 键值存储 trait / Key-value store trait
///
/// 实现必须保证单个键的写入是原子的
/// Implementations must make a write to a single key all-or-nothing
pub trait KvStore: Send + Sync {
    /// 读取原始值 / Read a raw value
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>>;

    /// 写入原始值 / Write a raw value
    fn set(&self, key: &str, value: &[u8]) -> KvResult<()>;

    /// 删除键（不存在时不报错）/ Remove a key (absent is not an error)
    fn remove(&self, key: &str) -> KvResult<()>;

    /// 列出以指定前缀开头的所有键 / List every key starting with `prefix`
    fn keys_with_prefix(&self, prefix: &str) -> KvResult<Vec<String>>;

    /// 刷新到持久介质 / Flush to durable media
    fn flush(&self) -> KvResult<()> {
        Ok(())
    }

    /// 键是否存在 / Whether the key exists
    fn contains(&self, key: &str) -> KvResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

// ============================================================================
// 类型化扩展 / Typed Extension
// ============================================================================

/// 类型化读写扩展 / Typed read/write extension
///
/// 值统一使用 JSON 编码；无法解码的值视为不存在
/// Values are JSON-encoded; a value that fails to decode reads as absent
pub trait KvStoreExt: KvStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> KvResult<Option<T>> {
        let Some(bytes) = self.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("⚠️  无法解码键 / Undecodable value at key {}: {}", key, e);
                Ok(None)
            }
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> KvResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, &bytes)
    }

    fn get_bool(&self, key: &str) -> KvResult<Option<bool>> {
        self.get_json(key)
    }

    fn set_bool(&self, key: &str, value: bool) -> KvResult<()> {
        self.set_json(key, &value)
    }

    fn get_i64(&self, key: &str) -> KvResult<Option<i64>> {
        self.get_json(key)
    }

    fn set_i64(&self, key: &str, value: i64) -> KvResult<()> {
        self.set_json(key, &value)
    }

    fn get_string(&self, key: &str) -> KvResult<Option<String>> {
        self.get_json(key)
    }

    fn set_string(&self, key: &str, value: &str) -> KvResult<()> {
        self.set_json(key, value)
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}
