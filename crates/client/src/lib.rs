//! Client code for swcache.
//!
//! This crate provides the HTTP fetch pipeline and the offline cache worker
//! (install, activate and fetch hooks plus the message, sync, push and
//! notification-click hooks) shared by the server.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Fetcher, UrlError};

pub use worker::{
    ActivateReport, BypassReason, CacheManager, ClickOutcome, ClientHost, InstallOutcome, InstallReport, Intercept,
    LocalHost, MessageOutcome, MessageReport, Notification, PushOutcome, RegistrationStatus, ResponseSource,
    WorkerConfig, WorkerRuntime,
};
