//! Confirmation flow for destructive or editing actions.
//!
//! At most one action is pending at a time; the state is a single tagged
//! value, so a pending delete and a pending update can never coexist.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use transport_gateway::{Record, RecordId, RecordPatch};

use crate::error::{Result, StateError};
use crate::store::RecordStore;

/// Whether edits go through a confirmation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Submit updates straight to the store
    Immediate,
    /// Hold updates until confirmed
    #[default]
    Confirm,
}

/// The action awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Pending {
    #[default]
    Idle,
    Delete {
        id: RecordId,
        name: String,
    },
    Update {
        id: Option<RecordId>,
        patch: RecordPatch,
    },
}

impl Pending {
    fn kind(&self) -> &'static str {
        match self {
            Pending::Idle => "idle",
            Pending::Delete { .. } => "delete",
            Pending::Update { .. } => "update",
        }
    }
}

/// Result of a confirmed action.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmed {
    Deleted(RecordId),
    Updated(Option<Record>),
}

/// Result of submitting an update under the configured policy.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateRequest {
    Applied(Option<Record>),
    AwaitingConfirmation,
}

/// State machine coordinating pending delete/update confirmations.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationFlow {
    pending: Pending,
    policy: UpdatePolicy,
}

impl ConfirmationFlow {
    pub fn new(policy: UpdatePolicy) -> Self {
        Self {
            pending: Pending::Idle,
            policy,
        }
    }

    pub fn policy(&self) -> UpdatePolicy {
        self.policy
    }

    pub fn pending(&self) -> &Pending {
        &self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending == Pending::Idle
    }

    /// Ask for confirmation before deleting `record`.
    ///
    /// Replaces an earlier pending delete; rejected while an update waits.
    pub fn request_delete(&mut self, record: &Record) -> std::result::Result<(), StateError> {
        if let Pending::Update { .. } = self.pending {
            return Err(StateError::ConfirmationBusy("update"));
        }
        debug!(id = %record.id, "Delete awaiting confirmation");
        self.pending = Pending::Delete {
            id: record.id.clone(),
            name: record.name.clone(),
        };
        Ok(())
    }

    /// Ask for confirmation before applying `patch`.
    ///
    /// Replaces an earlier pending update; rejected while a delete waits.
    pub fn request_update(
        &mut self,
        id: Option<RecordId>,
        patch: RecordPatch,
    ) -> std::result::Result<(), StateError> {
        if let Pending::Delete { .. } = self.pending {
            return Err(StateError::ConfirmationBusy("delete"));
        }
        debug!(id = ?id, "Update awaiting confirmation");
        self.pending = Pending::Update { id, patch };
        Ok(())
    }

    /// Submit an update, applying it now or parking it per the policy.
    pub async fn submit_update(
        &mut self,
        store: &RecordStore,
        id: Option<RecordId>,
        patch: RecordPatch,
    ) -> Result<UpdateRequest> {
        match self.policy {
            UpdatePolicy::Immediate => {
                let updated = store.update(id.as_ref(), patch).await?;
                Ok(UpdateRequest::Applied(updated))
            }
            UpdatePolicy::Confirm => {
                self.request_update(id, patch)?;
                Ok(UpdateRequest::AwaitingConfirmation)
            }
        }
    }

    /// Drop the pending action without running it. Returns what was dropped.
    pub fn cancel(&mut self) -> Pending {
        let cancelled = std::mem::take(&mut self.pending);
        if cancelled != Pending::Idle {
            debug!(kind = cancelled.kind(), "Confirmation cancelled");
        }
        cancelled
    }

    /// Run the pending action against the store.
    ///
    /// The flow returns to idle whether or not the store call succeeds; a
    /// failed action has to be requested again.
    pub async fn confirm(&mut self, store: &RecordStore) -> Result<Confirmed> {
        match std::mem::take(&mut self.pending) {
            Pending::Idle => Err(StateError::NothingPending.into()),
            Pending::Delete { id, name } => {
                store.delete(&id).await?;
                info!(id = %id, name = %name, "Delete confirmed");
                Ok(Confirmed::Deleted(id))
            }
            Pending::Update { id, patch } => {
                let updated = store.update(id.as_ref(), patch).await?;
                info!(id = ?id, "Update confirmed");
                Ok(Confirmed::Updated(updated))
            }
        }
    }
}
