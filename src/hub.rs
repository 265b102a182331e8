use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

use crate::config::HubConfig;
use crate::notification::{NotificationId, NotificationRecord, Severity};

/// Change events published to hub subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    Notified(NotificationRecord),
    Dismissed(NotificationId),
    Expired(NotificationId),
    Purged { pattern: String, removed: usize },
}

#[derive(Default)]
struct HubState {
    active: Vec<NotificationRecord>,
    history: Vec<NotificationRecord>,
    expiries: HashMap<NotificationId, JoinHandle<()>>,
    last_id: u64,
}

impl HubState {
    fn allocate_id(&mut self) -> NotificationId {
        self.last_id += 1;
        NotificationId::new(self.last_id)
    }

    fn remove_active(&mut self, id: NotificationId) -> bool {
        match self.active.iter().position(|n| n.id == id) {
            Some(index) => {
                self.active.remove(index);
                true
            }
            None => false,
        }
    }
}

struct HubInner {
    state: RwLock<HubState>,
    visibility_window: Duration,
    event_sender: broadcast::Sender<HubEvent>,
}

impl HubInner {
    fn publish(&self, event: HubEvent) {
        if let Err(e) = self.event_sender.send(event) {
            debug!("No active hub subscribers: {}", e);
        }
    }

    async fn expire(&self, id: NotificationId) {
        let mut state = self.state.write().await;
        state.expiries.remove(&id);

        if state.remove_active(id) {
            debug!("Notification {} expired from active set", id);
            self.publish(HubEvent::Expired(id));
        }
    }
}

impl Drop for HubInner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for (_, handle) in state.expiries.drain() {
            handle.abort();
        }
        debug!("NotificationHub dropped");
    }
}

/// Process-wide notification store: an append-only history plus the
/// subset still inside its visibility window.
///
/// Cloning yields another handle to the same hub.
#[derive(Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    pub fn new(config: &HubConfig) -> Self {
        let (event_sender, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            inner: Arc::new(HubInner {
                state: RwLock::new(HubState::default()),
                visibility_window: config.visibility_window(),
                event_sender,
            }),
        }
    }

    pub fn visibility_window(&self) -> Duration {
        self.inner.visibility_window
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.inner.event_sender.subscribe()
    }

    pub async fn notify(
        &self,
        message: impl Into<String>,
        severity: Option<Severity>,
    ) -> NotificationId {
        self.notify_with_details(message, severity, None).await
    }

    /// Like [`notify`](Self::notify) for untyped severities; unknown values map to `info`.
    pub async fn notify_str(&self, message: impl Into<String>, severity: &str) -> NotificationId {
        self.notify(message, Some(Severity::parse(severity))).await
    }

    pub async fn notify_with_details(
        &self,
        message: impl Into<String>,
        severity: Option<Severity>,
        details: Option<serde_json::Value>,
    ) -> NotificationId {
        let message = message.into();
        let mut state = self.inner.state.write().await;

        // Id, timestamp and history position are all fixed under the same lock.
        let id = state.allocate_id();
        let record = NotificationRecord::new(id, message, severity.unwrap_or_default())
            .with_details(details);
        state.history.push(record.clone());
        state.active.push(record.clone());

        // Registered under the write lock, so the task cannot run ahead of its handle.
        let handle = self.schedule_expiry(id);
        state.expiries.insert(id, handle);

        debug!(
            "Notification {} [{}]: {}",
            id, record.severity, record.message
        );
        // Published before unlocking so `Notified` always precedes `Expired`.
        self.inner.publish(HubEvent::Notified(record));

        id
    }

    fn schedule_expiry(&self, id: NotificationId) -> JoinHandle<()> {
        let hub: Weak<HubInner> = Arc::downgrade(&self.inner);
        let window = self.inner.visibility_window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(inner) = hub.upgrade() {
                inner.expire(id).await;
            }
        })
    }

    /// Removes `id` from the active set and cancels its expiry. Unknown ids are ignored.
    pub async fn dismiss(&self, id: NotificationId) {
        let mut state = self.inner.state.write().await;

        if let Some(handle) = state.expiries.remove(&id) {
            handle.abort();
        }

        if state.remove_active(id) {
            debug!("Notification {} dismissed", id);
            self.inner.publish(HubEvent::Dismissed(id));
        }
    }

    /// Drops every history record whose message contains `pattern`
    /// (case-sensitive). The active set is left alone.
    pub async fn purge_history_by_text(&self, pattern: &str) -> usize {
        let mut state = self.inner.state.write().await;

        let before = state.history.len();
        state.history.retain(|n| !n.mentions(pattern));
        let removed = before - state.history.len();

        if removed > 0 {
            info!("Purged {} notification(s) matching '{}'", removed, pattern);
        }
        self.inner.publish(HubEvent::Purged {
            pattern: pattern.to_string(),
            removed,
        });

        removed
    }

    pub async fn list_active(&self) -> Vec<NotificationRecord> {
        self.inner.state.read().await.active.clone()
    }

    pub async fn list_history(&self) -> Vec<NotificationRecord> {
        self.inner.state.read().await.history.clone()
    }

    /// There is no read flag; the badge mirrors the history size.
    pub async fn unread_count(&self) -> usize {
        self.inner.state.read().await.history.len()
    }

    pub async fn get(&self, id: NotificationId) -> Option<NotificationRecord> {
        self.inner
            .state
            .read()
            .await
            .history
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    pub async fn pending_expiries(&self) -> usize {
        self.inner.state.read().await.expiries.len()
    }

    /// Cancels all pending expiry tasks. Records stay where they are.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.write().await;
        let pending = state.expiries.len();
        for (_, handle) in state.expiries.drain() {
            handle.abort();
        }
        info!("Notification hub stopped, {} pending expiries cancelled", pending);
    }
}
