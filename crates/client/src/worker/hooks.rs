//! Control hooks: message, background sync, push and notification click.
//!
//! None of these touch the cache store. Malformed input is never an error:
//! unknown messages are ignored and missing push fields fall back to the
//! configured defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::host::{ClientHost, ClientId, Notification, NotificationId, find_client};
use super::manager::CacheManager;
use crate::fetch::{Fetcher, resolve};

/// Message `type` that asks a waiting worker to take over.
pub const SKIP_WAITING: &str = "SKIP_WAITING";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MessageOutcome {
    SkipWaiting,
    Ignored,
}

/// A notification shown for a push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PushOutcome {
    pub id: NotificationId,
    pub notification: Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", content = "client", rename_all = "kebab-case")]
pub enum ClickOutcome {
    /// An open page already showed the target and was focused.
    Focused(ClientId),
    /// A new page was opened at the target.
    Opened(ClientId),
    /// The host cannot open windows; the notification was only closed.
    Unsupported,
    /// The host refused to open a window.
    OpenFailed,
    /// No notification with that id is displayed.
    Missing,
}

impl<F: Fetcher> CacheManager<F> {
    /// Handle a message posted by a page.
    pub async fn on_message(&self, host: &dyn ClientHost, data: &Value) -> MessageOutcome {
        match data.get("type").and_then(Value::as_str) {
            Some(SKIP_WAITING) => {
                tracing::info!("skip waiting requested by page");
                host.skip_waiting().await;
                MessageOutcome::SkipWaiting
            }
            other => {
                tracing::debug!(message_type = ?other, "ignored message");
                MessageOutcome::Ignored
            }
        }
    }

    /// Background sync has no retry queue; the event is only recorded.
    pub async fn on_sync(&self, tag: &str) {
        tracing::info!(tag, "background sync");
    }

    /// Show a notification for a push payload.
    pub async fn on_push(&self, host: &dyn ClientHost, payload: Option<&[u8]>) -> PushOutcome {
        let notification = self.notification_from_payload(payload);
        let id = host.show_notification(notification.clone()).await;
        tracing::info!(id, title = %notification.title, "push notification shown");
        PushOutcome { id, notification }
    }

    /// Close the notification, then focus a page already showing its target or
    /// open a new one.
    pub async fn on_notification_click(&self, host: &dyn ClientHost, id: NotificationId) -> ClickOutcome {
        let Some(notification) = host.notification(id).await else {
            tracing::debug!(id, "clicked notification is gone");
            return ClickOutcome::Missing;
        };
        host.close_notification(id).await;

        if !host.can_open_windows() {
            return ClickOutcome::Unsupported;
        }

        let target = resolve(&self.config().origin, &notification.url).unwrap_or_else(|e| {
            tracing::warn!(url = %notification.url, error = %e, "bad notification url; using root document");
            self.config().root_document.clone()
        });

        let clients = host.window_clients().await;
        if let Some(client) = find_client(&clients, &target) {
            if host.focus(client.id).await {
                return ClickOutcome::Focused(client.id);
            }
        }

        match host.open_window(&target).await {
            Some(client) => ClickOutcome::Opened(client),
            None => {
                tracing::warn!(url = %target, "host refused to open window");
                ClickOutcome::OpenFailed
            }
        }
    }

    fn notification_from_payload(&self, payload: Option<&[u8]>) -> Notification {
        let defaults = &self.config().notification;
        let data = payload
            .filter(|bytes| !bytes.is_empty())
            .and_then(|bytes| match serde_json::from_slice::<Value>(bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(error = %e, "push payload is not JSON; using defaults");
                    None
                }
            })
            .unwrap_or(Value::Null);

        let field = |name: &str, fallback: &str| {
            data.get(name)
                .and_then(Value::as_str)
                .map_or_else(|| fallback.to_string(), str::to_string)
        };

        Notification {
            title: field("title", &defaults.default_title),
            body: field("body", &defaults.default_body),
            url: field("url", &defaults.default_url),
            icon: defaults.icon.clone(),
            badge: defaults.badge.clone(),
            vibrate: defaults.vibrate.clone(),
        }
    }
}
