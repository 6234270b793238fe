//! 设置变更订阅/发布 / Settings Change Subscription/Publication
//!
//! 每个设置存储持有同一个通知器的克隆，变更后同步通知订阅者
//! Every settings holder owns a clone of one notifier and synchronously notifies
//! subscribers after each mutation

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// 广播通道容量 / Broadcast channel capacity
const CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// 事件定义 / Event Definitions
// ============================================================================

/// 变更来源 / Origin of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsScope {
    GhostMode,
    Misc,
    DeviceSpoof,
    VoiceMorpher,
    UserNotes,
    AntiDelete,
}

impl SettingsScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsScope::GhostMode => "ghost_mode",
            SettingsScope::Misc => "misc",
            SettingsScope::DeviceSpoof => "device_spoof",
            SettingsScope::VoiceMorpher => "voice_morpher",
            SettingsScope::UserNotes => "user_notes",
            SettingsScope::AntiDelete => "anti_delete",
        }
    }
}

impl fmt::Display for SettingsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 设置变更事件 / Settings change event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsEvent {
    /// 来源 / Origin scope
    pub scope: SettingsScope,
    /// 被修改的字段 / Changed field
    pub key: String,
    /// 关联的会话（仅用户备注）/ Related peer (user notes only)
    pub peer_id: Option<i64>,
    /// 时间戳（毫秒）/ Timestamp in milliseconds
    pub at: i64,
}

impl SettingsEvent {
    pub fn new(scope: SettingsScope, key: impl Into<String>) -> Self {
        Self {
            scope,
            key: key.into(),
            peer_id: None,
            at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_peer(mut self, peer_id: i64) -> Self {
        self.peer_id = Some(peer_id);
        self
    }

    /// 事件类型，如 `ghost_mode.hide_read_receipts`
    /// Event type, e.g. `ghost_mode.hide_read_receipts`
    pub fn event_type(&self) -> String {
        format!("{}.{}", self.scope, self.key)
    }
}

// ============================================================================
// 订阅者 / Subscribers
// ============================================================================

/// 设置变更监听器 / Settings change listener
pub trait SettingsListener: Send + Sync {
    fn on_settings_changed(&self, event: &SettingsEvent);
}

impl<F> SettingsListener for F
where
    F: Fn(&SettingsEvent) + Send + Sync,
{
    fn on_settings_changed(&self, event: &SettingsEvent) {
        self(event)
    }
}

/// 订阅句柄 / Subscription handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    subscriber: String,
    event_pattern: String,
    priority: i32,
    listener: Arc<dyn SettingsListener>,
}

struct NotifierInner {
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
    sender: broadcast::Sender<SettingsEvent>,
}

// ============================================================================
// 通知器 / Notifier
// ============================================================================

/// 设置变更通知器 / Settings change notifier
///
/// 克隆共享同一组订阅 / Clones share one subscription list
#[derive(Clone)]
pub struct ChangeNotifier {
    inner: Arc<NotifierInner>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscriptions", &self.inner.subscriptions.read().len())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(NotifierInner {
                subscriptions: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                sender,
            }),
        }
    }

    /// 订阅事件 / Subscribe to events
    ///
    /// # 参数 / Parameters
    /// - `subscriber`: 订阅者名称（日志用）/ Subscriber name, for logs
    /// - `event_pattern`: `*`、完整事件类型或 `scope.*` / `*`, an exact event type, or `scope.*`
    /// - `priority`: 数值越大越先被通知 / Higher value is notified first
    pub fn subscribe<L>(
        &self,
        subscriber: &str,
        event_pattern: &str,
        priority: i32,
        listener: L,
    ) -> SubscriptionId
    where
        L: SettingsListener + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(
            "📝 订阅设置事件 / Subscribe: {} -> {} (priority: {})",
            subscriber, event_pattern, priority
        );

        let mut subs = self.inner.subscriptions.write();
        subs.push(Subscription {
            id,
            subscriber: subscriber.to_string(),
            event_pattern: event_pattern.to_string(),
            priority,
            listener: Arc::new(listener),
        });
        // 稳定排序，同优先级按订阅顺序 / Stable sort keeps subscription order on ties
        subs.sort_by(|a, b| b.priority.cmp(&a.priority));
        id
    }

    /// 取消订阅 / Unsubscribe
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.inner.subscriptions.write();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        before != subs.len()
    }

    /// 获取异步接收端 / Get an async receiver
    pub fn channel(&self) -> broadcast::Receiver<SettingsEvent> {
        self.inner.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriptions.read().len()
    }

    /// 发布事件 / Publish an event
    ///
    /// 返回被通知的监听器数量 / Returns how many listeners were notified
    pub fn publish(&self, event: SettingsEvent) -> usize {
        let event_type = event.event_type();

        // 先复制匹配的监听器再回调，避免回调中订阅造成死锁
        // Collect matches before calling back so listeners may (un)subscribe
        let matched: Vec<(String, Arc<dyn SettingsListener>)> = self
            .inner
            .subscriptions
            .read()
            .iter()
            .filter(|s| matches_pattern(&event_type, &s.event_pattern))
            .map(|s| (s.subscriber.clone(), Arc::clone(&s.listener)))
            .collect();

        for (subscriber, listener) in &matched {
            trace!("🎯 通知 / Notify {} of {}", subscriber, event_type);
            listener.on_settings_changed(&event);
        }

        // 没有接收端时发送失败是正常的 / No receivers is not an error
        let _ = self.inner.sender.send(event);
        matched.len()
    }
}

/// 匹配事件模式 / Match event pattern
///
/// 支持通配符 `*` 与 `scope.*`
/// Supports `*` and `scope.*`
fn matches_pattern(event_type: &str, pattern: &str) -> bool {
    if pattern == "*" || pattern == event_type {
        return true;
    }

    // 例如: "misc.*" 匹配 "misc.block_ads"，不匹配 "misc.a.b"
    // e.g. "misc.*" matches "misc.block_ads" but not "misc.a.b"
    if let Some(prefix) = pattern.strip_suffix(".*") {
        if let Some(rest) = event_type.strip_prefix(prefix) {
            return rest.len() > 1 && rest.starts_with('.') && !rest[1..].contains('.');
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_pattern_matching() {
        assert!(matches_pattern("misc.block_ads", "*"));
        assert!(matches_pattern("misc.block_ads", "misc.block_ads"));
        assert!(matches_pattern("misc.block_ads", "misc.*"));
        assert!(!matches_pattern("misc.block_ads", "ghost_mode.*"));
        assert!(!matches_pattern("misc.a.b", "misc.*"));
        assert!(!matches_pattern("miscellaneous.x", "misc.*"));
    }

    #[test]
    fn listeners_run_in_priority_order() {
        let notifier = ChangeNotifier::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        notifier.subscribe("low", "*", 1, move |_: &SettingsEvent| o.lock().push("low"));
        let o = Arc::clone(&order);
        notifier.subscribe("high", "misc.*", 10, move |_: &SettingsEvent| {
            o.lock().push("high")
        });
        let o = Arc::clone(&order);
        notifier.subscribe("other", "ghost_mode.*", 50, move |_: &SettingsEvent| {
            o.lock().push("other")
        });

        let notified = notifier.publish(SettingsEvent::new(SettingsScope::Misc, "block_ads"));
        assert_eq!(notified, 2);
        assert_eq!(*order.lock(), vec!["high", "low"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let notifier = ChangeNotifier::new();
        let hits = Arc::new(AtomicU64::new(0));
        let h = Arc::clone(&hits);
        let id = notifier.subscribe("ui", "*", 0, move |_: &SettingsEvent| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        notifier.publish(SettingsEvent::new(SettingsScope::GhostMode, "is_enabled"));
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.publish(SettingsEvent::new(SettingsScope::GhostMode, "is_enabled"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn channel_receives_published_events() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.channel();
        notifier.publish(SettingsEvent::new(SettingsScope::UserNotes, "note").with_peer(7));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "user_notes.note");
        assert_eq!(event.peer_id, Some(7));
    }
}
