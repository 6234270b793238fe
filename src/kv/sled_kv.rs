//! # Sled 键值存储 / Sled Key-Value Store
//!
//! 基于 Sled 嵌入式数据库的持久化后端
//! Durable backend based on the Sled embedded database

use std::path::Path;
use tracing::{debug, info};

use super::KvStore;
use crate::error::{KvError, KvResult};

/// 设置树名称 / Settings tree name
const SETTINGS_TREE: &str = "settings";

/// Sled 键值存储 / Sled key-value store
pub struct SledKv {
    /// Sled 数据库实例 / Sled database instance
    db: sled::Db,

    /// 设置树 / Settings tree
    tree: sled::Tree,

    /// 每次写入后是否刷盘 / Flush after every write
    flush_on_write: bool,
}

impl SledKv {
    /// 打开（或创建）数据库 / Open (or create) the database
    ///
    /// # 参数 / Parameters
    /// - `path`: 数据库目录 / Database directory
    /// - `flush_on_write`: 每次写入后刷盘 / Flush after each write
    pub fn open<P: AsRef<Path>>(path: P, flush_on_write: bool) -> KvResult<Self> {
        let path = path.as_ref();
        info!("🗄️  打开 Sled 存储 / Opening Sled store: {}", path.display());

        let db = sled::open(path)?;
        let tree = open_settings_tree(&db)?;

        Ok(Self {
            db,
            tree,
            flush_on_write,
        })
    }

    /// 临时数据库（测试用）/ Temporary database for tests
    pub fn temporary() -> KvResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let tree = open_settings_tree(&db)?;
        Ok(Self {
            db,
            tree,
            flush_on_write: false,
        })
    }

    /// 数据库磁盘占用 / Size on disk
    pub fn size_on_disk(&self) -> u64 {
        self.db.size_on_disk().unwrap_or(0)
    }

    #[inline]
    fn maybe_flush(&self) -> KvResult<()> {
        if self.flush_on_write {
            self.tree.flush()?;
        }
        Ok(())
    }
}

fn open_settings_tree(db: &sled::Db) -> KvResult<sled::Tree> {
    db.open_tree(SETTINGS_TREE).map_err(|e| {
        KvError::Backend(format!(
            "无法打开设置树 / Failed to open settings tree: {}",
            e
        ))
    })
}

impl KvStore for SledKv {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        Ok(self.tree.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        debug!("💾 写入 / Writing {} ({} bytes)", key, value.len());
        self.tree.insert(key.as_bytes(), value)?;
        self.maybe_flush()
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        if self.tree.remove(key.as_bytes())?.is_some() {
            self.maybe_flush()?;
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> KvResult<Vec<String>> {
        let mut keys = Vec::new();
        for item in self.tree.scan_prefix(prefix.as_bytes()) {
            let (k, _) = item?;
            if let Ok(key) = String::from_utf8(k.to_vec()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn flush(&self) -> KvResult<()> {
        self.tree.flush()?;
        Ok(())
    }
}
