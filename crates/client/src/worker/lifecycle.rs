//! Worker registration state machine.
//!
//! ## Lifecycle
//! 1. **Install**: a new worker enters the `installing` slot and caches the manifest
//! 2. **Waiting**: an installed worker waits until it may take over
//! 3. **Activate**: the waiting worker replaces the active one, which becomes redundant

use chrono::Utc;
use serde::{Deserialize, Serialize};
use swcache_core::Error;

/// Worker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// One version of the worker, bound to the store it installed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Worker {
    pub id: u64,
    pub store_name: String,
    pub state: WorkerState,
    /// RFC 3339 timestamp of a completed install.
    pub installed_at: Option<String>,
}

/// The installing, waiting and active slots of a scope.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    scope: String,
    installing: Option<Worker>,
    waiting: Option<Worker>,
    active: Option<Worker>,
    next_id: u64,
}

/// Serializable snapshot of a [`Registration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RegistrationStatus {
    pub scope: String,
    pub installing: Option<Worker>,
    pub waiting: Option<Worker>,
    pub active: Option<Worker>,
}

impl Registration {
    pub fn new(scope: impl Into<String>) -> Self {
        Self { scope: scope.into(), ..Default::default() }
    }

    pub fn active(&self) -> Option<&Worker> {
        self.active.as_ref()
    }

    pub fn waiting(&self) -> Option<&Worker> {
        self.waiting.as_ref()
    }

    pub fn installing(&self) -> Option<&Worker> {
        self.installing.as_ref()
    }

    /// Create a worker in the `installing` slot and return its id.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if another install is in progress.
    pub fn begin_install(&mut self, store_name: &str) -> Result<u64, Error> {
        if let Some(current) = &self.installing {
            return Err(Error::InvalidState(format!("worker {} is already installing", current.id)));
        }

        self.next_id += 1;
        let id = self.next_id;
        self.installing =
            Some(Worker { id, store_name: store_name.to_string(), state: WorkerState::Installing, installed_at: None });
        Ok(id)
    }

    /// Discard the installing worker after a failed install.
    pub fn fail_install(&mut self) {
        if let Some(mut worker) = self.installing.take() {
            worker.state = WorkerState::Redundant;
            tracing::debug!(worker = worker.id, "install failed; worker is redundant");
        }
    }

    /// Move the installing worker to `waiting`, replacing any older waiting worker.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if nothing is installing.
    pub fn complete_install(&mut self) -> Result<&Worker, Error> {
        let mut worker = self
            .installing
            .take()
            .ok_or_else(|| Error::InvalidState("no worker is installing".into()))?;

        worker.state = WorkerState::Installed;
        worker.installed_at = Some(Utc::now().to_rfc3339());

        if let Some(old) = self.waiting.replace(worker) {
            tracing::debug!(worker = old.id, "superseded waiting worker");
        }

        self.waiting
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no worker is waiting".into()))
    }

    /// Mark the waiting worker as activating.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if nothing is waiting.
    pub fn begin_activate(&mut self) -> Result<&Worker, Error> {
        let worker = self
            .waiting
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no worker is waiting to activate".into()))?;
        worker.state = WorkerState::Activating;
        Ok(&*worker)
    }

    /// Promote the activating worker to `active`. The previous active worker is
    /// returned in its redundant state.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if no worker is activating.
    pub fn complete_activate(&mut self) -> Result<Option<Worker>, Error> {
        match &self.waiting {
            Some(w) if w.state == WorkerState::Activating => {}
            _ => return Err(Error::InvalidState("no worker is activating".into())),
        }

        let mut worker = self
            .waiting
            .take()
            .ok_or_else(|| Error::InvalidState("no worker is activating".into()))?;
        worker.state = WorkerState::Activated;

        let previous = self.active.replace(worker).map(|mut old| {
            old.state = WorkerState::Redundant;
            old
        });
        Ok(previous)
    }

    /// Put an activating worker back into the waiting state.
    pub fn abort_activate(&mut self) {
        if let Some(worker) = self.waiting.as_mut() {
            if worker.state == WorkerState::Activating {
                worker.state = WorkerState::Installed;
            }
        }
    }

    pub fn status(&self) -> RegistrationStatus {
        RegistrationStatus {
            scope: self.scope.clone(),
            installing: self.installing.clone(),
            waiting: self.waiting.clone(),
            active: self.active.clone(),
        }
    }
}
