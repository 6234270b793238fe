//! 防撤回存储集成测试 / Anti-delete store integration tests

use anyhow::Result;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use ghostgram::antidelete::archive::ARCHIVE_KEY;
use ghostgram::antidelete::deleted_ids::DELETED_IDS_KEY;
use ghostgram::antidelete::edit_history::EDIT_HISTORY_KEY;
use ghostgram::{
    ArchivedMessage, Ghostgram, KvError, KvResult, KvStore, MemoryKv, MessageKey, SledKv,
};

fn snapshot(global_id: i32, peer_id: i64, message_id: i32, deleted_at: i32) -> ArchivedMessage {
    ArchivedMessage::captured_now(
        global_id,
        peer_id,
        message_id,
        deleted_at - 10,
        format!("message {}", global_id),
    )
    .with_deleted_at(deleted_at)
}

fn open_sled(dir: &tempfile::TempDir) -> Result<Ghostgram> {
    let kv: Arc<dyn KvStore> = Arc::new(SledKv::open(dir.path().join("store"), true)?);
    Ok(Ghostgram::new(kv))
}

#[cfg(test)]
mod archive_tests {
    use super::*;

    /// 先写者胜 / First write wins
    #[test]
    fn test_first_write_wins_scenario() {
        let app = Ghostgram::in_memory();
        let first = ArchivedMessage::captured_now(1, 100, 5, 900, "hello").with_deleted_at(1000);
        let second =
            ArchivedMessage::captured_now(1, 100, 5, 900, "DIFFERENT").with_deleted_at(2000);

        app.archive.archive(first);
        app.archive.archive(second);

        assert_eq!(app.archive.count(), 1);
        assert_eq!(app.archive.all_archived()[0].text, "hello");
        assert_eq!(app.archive.all_archived()[0].deleted_at, 1000);
    }

    /// 计数只反映唯一 global id / Count reflects unique global ids only
    #[test]
    fn test_count_matches_unique_ids() {
        let app = Ghostgram::in_memory();
        let ids = [3, 1, 3, 2, 1, 1, 4];
        for (i, id) in ids.iter().enumerate() {
            app.archive.archive(snapshot(*id, 1, *id, i as i32));
        }
        let unique: HashSet<i32> = ids.iter().copied().collect();
        assert_eq!(app.archive.count(), unique.len());
    }

    /// 排序与会话过滤 / Ordering and peer filter
    #[test]
    fn test_peer_view_is_ordered_subset() {
        let app = Ghostgram::in_memory();
        let rows = [(1, 10, 50), (2, 20, 70), (3, 10, 90), (4, 10, 60), (5, 20, 10)];
        for (gid, peer, at) in rows {
            app.archive.archive(snapshot(gid, peer, gid, at));
        }

        let all = app.archive.all_archived();
        assert!(all.windows(2).all(|w| w[0].deleted_at >= w[1].deleted_at));

        let expected: Vec<i32> = all
            .iter()
            .filter(|m| m.peer_id == 10)
            .map(|m| m.global_id)
            .collect();
        let peer: Vec<i32> = app
            .archive
            .archived_for_peer(10)
            .iter()
            .map(|m| m.global_id)
            .collect();
        assert_eq!(peer, expected);
        assert_eq!(peer, vec![3, 4, 1]);
    }

    /// 删除后可以重新归档 / Re-archiving after removal is allowed
    #[test]
    fn test_reinsert_after_remove() {
        let app = Ghostgram::in_memory();
        app.archive.archive(snapshot(7, 1, 1, 100));
        app.archive.remove(7);
        app.archive.remove(7);
        assert_eq!(app.archive.count(), 0);

        app.archive.archive(snapshot(7, 1, 1, 200));
        assert_eq!(app.archive.get(7).map(|m| m.deleted_at), Some(200));
    }

    /// 关闭时归档完全不生效 / Archiving is inert while disabled
    #[test]
    fn test_disabled_archive_ignores_writes() {
        let app = Ghostgram::in_memory();
        app.anti_delete.set_enabled(false);
        app.archive.archive(snapshot(1, 1, 1, 1));
        assert_eq!(app.archive.count(), 0);
        assert!(app.kv().get(ARCHIVE_KEY).unwrap().is_none());
    }

    /// Sled 重启后内容一致 / Content survives a Sled reopen
    #[test]
    fn test_round_trip_through_sled() -> Result<()> {
        println!("🧪 测试归档持久化 / Testing archive persistence");
        let dir = tempfile::tempdir()?;

        let mut expected = Vec::new();
        {
            let app = open_sled(&dir)?;
            for gid in 0..25 {
                let mut m = snapshot(gid, i64::from(gid % 3) - 1, gid * 2, 1000 + gid);
                if gid % 2 == 0 {
                    m = m.with_author(500 + i64::from(gid));
                }
                if gid % 5 == 0 {
                    m = m.with_media_description("photo").with_forward_author(9);
                }
                app.archive.archive(m.clone());
                expected.push(m);
            }
            app.flush()?;
        }

        let app = open_sled(&dir)?;
        let mut loaded = app.archive.all_archived();
        loaded.sort_by_key(|m| m.global_id);
        assert_eq!(loaded, expected);
        println!("✅ 测试通过 / Test passed");
        Ok(())
    }

    /// 空归档也能往返 / An empty archive round-trips too
    #[test]
    fn test_empty_archive_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        {
            let app = open_sled(&dir)?;
            app.archive.archive(snapshot(1, 1, 1, 1));
            app.archive.clear();
        }
        let app = open_sled(&dir)?;
        assert_eq!(app.archive.count(), 0);
        Ok(())
    }

    /// 损坏的数据视为空 / Corrupt data loads as empty
    #[test]
    fn test_corrupt_blobs_load_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        {
            let kv = SledKv::open(dir.path().join("store"), true)?;
            kv.set(ARCHIVE_KEY, b"[{\"globalId\": 1, oops")?;
            kv.set(DELETED_IDS_KEY, b"{\"not\": \"a list\"}")?;
            kv.set(EDIT_HISTORY_KEY, &[0xff, 0xfe, 0x00])?;
        }

        let app = open_sled(&dir)?;
        assert_eq!(app.archive.count(), 0);
        assert!(app.deleted_ids.is_empty());
        assert_eq!(app.edit_history.message_count(), 0);

        // 之后的写入覆盖损坏数据 / Later writes replace the corrupt data
        app.archive.archive(snapshot(2, 2, 2, 2));
        drop(app);
        let app = open_sled(&dir)?;
        assert_eq!(app.archive.count(), 1);
        Ok(())
    }

    /// 导出引用 / Exported references
    #[test]
    fn test_export_references() {
        let app = Ghostgram::in_memory();
        app.archive.archive(snapshot(1, -1001, 5, 1));
        app.archive.archive(snapshot(2, 42, 6, 2));

        let refs: HashSet<MessageKey> = app.archive.export_references().into_iter().collect();
        assert_eq!(
            refs,
            HashSet::from([MessageKey::new(-1001, 5), MessageKey::new(42, 6)])
        );
    }

    /// 并发归档同一 id 只有一次成功 / Concurrent archiving of one id succeeds once
    #[test]
    fn test_concurrent_archive_is_deduplicated() {
        let app = Arc::new(Ghostgram::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let app = Arc::clone(&app);
                thread::spawn(move || {
                    (0..50)
                        .filter(|gid| app.archive.archive(snapshot(*gid, t, *gid, t as i32)))
                        .count()
                })
            })
            .collect();

        let added: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(added, 50);
        assert_eq!(app.archive.count(), 50);
    }
}

#[cfg(test)]
mod deleted_id_tests {
    use super::*;

    /// 关闭只屏蔽读取，不清空集合 / Disabling gates reads, never erases
    #[test]
    fn test_toggle_scenario() {
        let app = Ghostgram::in_memory();
        app.deleted_ids.mark_deleted(7, 9);
        assert!(app.deleted_ids.is_deleted(7, 9));

        app.anti_delete.set_enabled(false);
        assert!(!app.deleted_ids.is_deleted(7, 9));

        app.anti_delete.set_enabled(true);
        assert!(app.deleted_ids.is_deleted(7, 9));
    }

    /// 未标记的键始终为 false / Unmarked keys are never deleted
    #[test]
    fn test_unmarked_keys() {
        let app = Ghostgram::in_memory();
        app.deleted_ids.mark_deleted(1, 1);
        assert!(!app.deleted_ids.is_deleted(1, 2));
        assert!(!app.deleted_ids.is_deleted(2, 1));
        assert!(!app.deleted_ids.is_deleted(11, 1));
    }

    /// 开关设置在重启后保留 / The toggle persists across reopen
    #[test]
    fn test_disabled_state_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        {
            let app = open_sled(&dir)?;
            app.deleted_ids.mark_deleted(-5, 3);
            app.anti_delete.set_enabled(false);
        }
        let app = open_sled(&dir)?;
        assert!(!app.deleted_ids.is_deleted(-5, 3));
        app.anti_delete.set_enabled(true);
        assert!(app.deleted_ids.is_deleted(-5, 3));
        assert_eq!(app.deleted_ids.len(), 1);
        Ok(())
    }

    /// 两步协议可能只留下一半 / The two-step protocol may leave half of it
    #[test]
    fn test_archive_and_mark_are_independent() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        {
            let app = Ghostgram::new(Arc::clone(&kv));
            app.archive.archive(snapshot(1, 10, 20, 5));
            // 标记前"崩溃" / "crash" before marking
        }
        let app = Ghostgram::new(kv);
        assert_eq!(app.archive.count(), 1);
        assert!(!app.deleted_ids.is_deleted(10, 20));

        app.deleted_ids.mark_deleted(10, 20);
        assert!(app.deleted_ids.is_deleted(10, 20));
    }
}

#[cfg(test)]
mod edit_history_tests {
    use super::*;

    /// 连续相同文本只保存一次 / Identical consecutive texts are stored once
    #[test]
    fn test_duplicate_suppression() {
        let app = Ghostgram::in_memory();
        app.edit_history.record_original(1, 1, "draft", 1);
        app.edit_history.record_original(1, 1, "draft", 2);
        assert_eq!(app.edit_history.history(1, 1).len(), 1);

        app.edit_history.record_original(1, 1, "second", 3);
        app.edit_history.record_original(1, 1, "third", 4);
        let texts: Vec<String> = app
            .edit_history
            .history(1, 1)
            .into_iter()
            .map(|r| r.text)
            .collect();
        assert_eq!(texts, vec!["draft", "second", "third"]);
    }

    /// 历史在重启后保留 / History survives reopen
    #[test]
    fn test_history_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        {
            let app = open_sled(&dir)?;
            app.edit_history.record_original(-100, 7, "v1", 10);
            app.edit_history.record_original(-100, 7, "v2", 20);
            app.edit_history.record_original(3, 1, "other", 30);
            app.edit_history.clear(3, 1);
        }

        let app = open_sled(&dir)?;
        let history = app.edit_history.history(-100, 7);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "v1");
        assert_eq!(history[1].edit_date, 20);
        assert!(!app.edit_history.has_history(3, 1));
        Ok(())
    }

    #[test]
    fn test_unknown_message_has_empty_history() {
        let app = Ghostgram::in_memory();
        assert!(app.edit_history.history(9, 9).is_empty());
        assert!(!app.edit_history.has_history(9, 9));
    }
}

/// 可切换为只读的存储，写入时返回后端错误
/// Store that can be switched to reject every write with a backend error
#[derive(Default)]
struct ReadOnlyAfterStart {
    inner: MemoryKv,
    reject_writes: AtomicBool,
}

impl ReadOnlyAfterStart {
    fn start_rejecting(&self) {
        self.reject_writes.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> KvResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(KvError::Backend("disk full".to_string()));
        }
        Ok(())
    }
}

impl KvStore for ReadOnlyAfterStart {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        self.check()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        self.check()?;
        self.inner.remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> KvResult<Vec<String>> {
        self.inner.keys_with_prefix(prefix)
    }
}

#[cfg(test)]
mod write_failure_tests {
    use super::*;

    fn failing_app() -> (Arc<ReadOnlyAfterStart>, Ghostgram) {
        let kv = Arc::new(ReadOnlyAfterStart::default());
        let app = Ghostgram::new(kv.clone());
        kv.start_rejecting();
        (kv, app)
    }

    /// 写入失败时内存状态仍然有效 / In-memory state stays valid when writes fail
    #[test]
    fn test_failed_writes_keep_memory_state() {
        println!("🧪 测试写入失败 / Testing failed writes");
        let (kv, app) = failing_app();
        assert!(app.anti_delete.is_enabled());

        assert!(app.archive.archive(snapshot(1, 10, 20, 100)));
        assert_eq!(app.archive.count(), 1);
        assert_eq!(app.archive.all_archived()[0].global_id, 1);
        assert!(!app.archive.archive(snapshot(1, 10, 20, 200)));

        app.deleted_ids.mark_deleted(10, 20);
        assert!(app.deleted_ids.is_deleted(10, 20));

        assert!(app.edit_history.record_original(10, 21, "before edit", 50));
        assert_eq!(app.edit_history.history(10, 21).len(), 1);

        // 什么都没有落到存储里 / Nothing reached the store
        assert!(kv.get(ARCHIVE_KEY).unwrap().is_none());
        assert!(kv.get(DELETED_IDS_KEY).unwrap().is_none());
        assert!(kv.get(EDIT_HISTORY_KEY).unwrap().is_none());
        println!("✅ 测试通过 / Test passed");
    }

    /// 删除与清空在写入失败时同样生效 / Remove and clear still apply when writes fail
    #[test]
    fn test_failed_writes_on_remove_and_clear() {
        let (_kv, app) = failing_app();
        app.archive.archive(snapshot(1, 1, 1, 1));
        app.archive.archive(snapshot(2, 1, 2, 2));

        assert!(app.archive.remove(1));
        assert_eq!(app.archive.count(), 1);
        app.archive.clear();
        assert_eq!(app.archive.count(), 0);

        app.edit_history.record_original(1, 1, "x", 1);
        app.edit_history.clear_all();
        assert_eq!(app.edit_history.message_count(), 0);
    }
}
