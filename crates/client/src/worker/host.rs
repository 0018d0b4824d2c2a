//! Host capabilities the worker hooks call into.
//!
//! A browser gives a service worker `skipWaiting`, `clients.claim`,
//! `showNotification` and the window-client API. [`ClientHost`] is that
//! surface as a trait; [`LocalHost`] is an in-memory implementation that keeps
//! track of open pages and displayed notifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::same_document;

pub type ClientId = u64;
pub type NotificationId = u64;

/// A system notification as requested by the push hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    /// Page opened or focused when the notification is clicked.
    pub url: String,
}

/// An open page controlled (or controllable) by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WindowClient {
    pub id: ClientId,
    pub url: String,
    pub focused: bool,
    pub controlled: bool,
}

#[async_trait::async_trait]
pub trait ClientHost: Send + Sync {
    /// Let the installing worker take over without waiting for pages to close.
    async fn skip_waiting(&self);

    /// Take control of every open page.
    async fn claim_clients(&self);

    async fn show_notification(&self, notification: Notification) -> NotificationId;

    async fn notification(&self, id: NotificationId) -> Option<Notification>;

    async fn close_notification(&self, id: NotificationId);

    /// Whether `open_window` is available at all.
    fn can_open_windows(&self) -> bool;

    async fn window_clients(&self) -> Vec<WindowClient>;

    /// Focus a page. Returns false if it is gone.
    async fn focus(&self, id: ClientId) -> bool;

    /// Open a new page. Returns `None` if the host refused.
    async fn open_window(&self, url: &Url) -> Option<ClientId>;
}

#[derive(Debug, Default)]
struct HostState {
    clients: BTreeMap<ClientId, WindowClient>,
    notifications: BTreeMap<NotificationId, Notification>,
    next_client: ClientId,
    next_notification: NotificationId,
    skip_waiting_requested: bool,
    claims: u32,
}

/// In-memory host: open pages and notifications live in a map behind a
/// tokio `RwLock`.
#[derive(Debug)]
pub struct LocalHost {
    state: RwLock<HostState>,
    can_open_windows: bool,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHost {
    pub fn new() -> Self {
        Self { state: RwLock::new(HostState::default()), can_open_windows: true }
    }

    /// A host without `clients.openWindow`.
    pub fn without_windows() -> Self {
        Self { can_open_windows: false, ..Self::new() }
    }

    /// Register an open page.
    pub async fn open_client(&self, url: &Url) -> ClientId {
        let mut state = self.state.write().await;
        state.next_client += 1;
        let id = state.next_client;
        state
            .clients
            .insert(id, WindowClient { id, url: url.to_string(), focused: false, controlled: false });
        id
    }

    /// Remove a page. Returns false if it was not open.
    pub async fn close_client(&self, id: ClientId) -> bool {
        self.state.write().await.clients.remove(&id).is_some()
    }

    /// Notifications currently displayed, by id.
    pub async fn notifications(&self) -> Vec<(NotificationId, Notification)> {
        let state = self.state.read().await;
        state
            .notifications
            .iter()
            .map(|(id, n)| (*id, n.clone()))
            .collect()
    }

    /// Whether `skip_waiting` has been called since the last check, clearing the flag.
    pub async fn take_skip_waiting(&self) -> bool {
        std::mem::take(&mut self.state.write().await.skip_waiting_requested)
    }

    /// How many times clients were claimed.
    pub async fn claims(&self) -> u32 {
        self.state.read().await.claims
    }
}

#[async_trait::async_trait]
impl ClientHost for LocalHost {
    async fn skip_waiting(&self) {
        self.state.write().await.skip_waiting_requested = true;
    }

    async fn claim_clients(&self) {
        let mut state = self.state.write().await;
        state.claims += 1;
        for client in state.clients.values_mut() {
            client.controlled = true;
        }
        tracing::debug!(clients = state.clients.len(), "claimed clients");
    }

    async fn show_notification(&self, notification: Notification) -> NotificationId {
        let mut state = self.state.write().await;
        state.next_notification += 1;
        let id = state.next_notification;
        state.notifications.insert(id, notification);
        id
    }

    async fn notification(&self, id: NotificationId) -> Option<Notification> {
        self.state.read().await.notifications.get(&id).cloned()
    }

    async fn close_notification(&self, id: NotificationId) {
        self.state.write().await.notifications.remove(&id);
    }

    fn can_open_windows(&self) -> bool {
        self.can_open_windows
    }

    async fn window_clients(&self) -> Vec<WindowClient> {
        self.state.read().await.clients.values().cloned().collect()
    }

    async fn focus(&self, id: ClientId) -> bool {
        let mut state = self.state.write().await;
        if !state.clients.contains_key(&id) {
            return false;
        }
        for client in state.clients.values_mut() {
            client.focused = client.id == id;
        }
        true
    }

    async fn open_window(&self, url: &Url) -> Option<ClientId> {
        if !self.can_open_windows {
            return None;
        }
        let id = self.open_client(url).await;
        self.focus(id).await;
        Some(id)
    }
}

/// Find an open page showing `target`, ignoring fragments.
pub fn find_client<'a>(clients: &'a [WindowClient], target: &Url) -> Option<&'a WindowClient> {
    clients
        .iter()
        .find(|c| Url::parse(&c.url).is_ok_and(|url| same_document(&url, target)))
}
