//! Offline cache worker: the cache manager, its event hooks and the
//! lifecycle runtime that delivers events to them.

pub mod config;
pub mod hooks;
pub mod host;
pub mod lifecycle;
pub mod manager;
pub mod runtime;

#[cfg(test)]
pub(crate) mod testing;

pub use config::WorkerConfig;
pub use hooks::{ClickOutcome, MessageOutcome, PushOutcome, SKIP_WAITING};
pub use host::{ClientHost, ClientId, LocalHost, Notification, NotificationId, WindowClient, find_client};
pub use lifecycle::{Registration, RegistrationStatus, Worker, WorkerState};
pub use manager::{ActivateReport, BypassReason, CacheManager, InstallReport, Intercept, ResponseSource};
pub use runtime::{InstallOutcome, MessageReport, WorkerRuntime};
