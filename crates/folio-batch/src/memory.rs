//! In-memory idempotency store for tests, local demos, and embedding.

use std::collections::HashMap;
use std::sync::RwLock;

use folio_types::{EntryId, UserId};

use crate::error::{BatchError, Result};
use crate::idempotency::{IdempotencyStore, Reservation};

/// In-memory [`IdempotencyStore`] behind one `RwLock`.
pub struct InMemoryIdempotency {
    inner: RwLock<IdemState>,
}

#[derive(Default)]
struct IdemState {
    batches: HashMap<String, Slot>,
    entry_keys: HashMap<(UserId, String), EntryId>,
}

enum Slot {
    Pending { body_hash: [u8; 32] },
    Done { body_hash: [u8; 32], outcome: String },
}

impl InMemoryIdempotency {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(IdemState::default()),
        }
    }
}

impl Default for InMemoryIdempotency {
    fn default() -> Self {
        Self::new()
    }
}

impl IdempotencyStore for InMemoryIdempotency {
    fn reserve(&self, key: &str, body_hash: [u8; 32]) -> Result<Reservation> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| BatchError::Store("idempotency state lock poisoned".into()))?;

        match state.batches.get(key) {
            None => {
                state
                    .batches
                    .insert(key.to_string(), Slot::Pending { body_hash });
                Ok(Reservation::Fresh)
            }
            Some(Slot::Pending { body_hash: stored }) => {
                if *stored == body_hash {
                    Ok(Reservation::InFlight)
                } else {
                    Ok(Reservation::Mismatch)
                }
            }
            Some(Slot::Done {
                body_hash: stored,
                outcome,
            }) => {
                if *stored == body_hash {
                    Ok(Reservation::Replay(outcome.clone()))
                } else {
                    Ok(Reservation::Mismatch)
                }
            }
        }
    }

    fn complete(&self, key: &str, outcome: String) -> Result<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| BatchError::Store("idempotency state lock poisoned".into()))?;

        match state.batches.get(key) {
            Some(Slot::Pending { body_hash }) => {
                let body_hash = *body_hash;
                state
                    .batches
                    .insert(key.to_string(), Slot::Done { body_hash, outcome });
                Ok(())
            }
            _ => Err(BatchError::Store("idempotency key not reserved".into())),
        }
    }

    fn abort(&self, key: &str) -> Result<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| BatchError::Store("idempotency state lock poisoned".into()))?;

        if matches!(state.batches.get(key), Some(Slot::Pending { .. })) {
            state.batches.remove(key);
        }
        Ok(())
    }

    fn entry_for_key(&self, user_id: UserId, key: &str) -> Result<Option<EntryId>> {
        let state = self
            .inner
            .read()
            .map_err(|_| BatchError::Store("idempotency state lock poisoned".into()))?;

        Ok(state.entry_keys.get(&(user_id, key.to_string())).copied())
    }

    fn save_entry_key(&self, user_id: UserId, key: &str, entry_id: EntryId) -> Result<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| BatchError::Store("idempotency state lock poisoned".into()))?;

        state
            .entry_keys
            .entry((user_id, key.to_string()))
            .or_insert(entry_id);
        Ok(())
    }
}
