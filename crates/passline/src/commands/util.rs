//! Shared helpers for command handlers.

use std::sync::Arc;
use std::time::Duration;

use passline_core::{Entity, EntityStore, Snapshot};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Subscribe, wait for the first materialized snapshot, and detach.
pub async fn load<T: Entity>(
    store: &EntityStore<T>,
    timeout: Duration,
) -> Result<Arc<Snapshot<T>>, CliError> {
    let mut handle = store.subscribe();
    let primed = tokio::time::timeout(timeout, store.wait_primed()).await;
    let snapshot = store.snapshot();
    handle.unsubscribe();
    primed.map_err(|_| CliError::Timeout {
        seconds: timeout.as_secs(),
        collection: T::COLLECTION.to_string(),
    })?;
    Ok(snapshot)
}
