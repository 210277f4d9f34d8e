//! Drop accounting — per `(reason, category)` counters for lost events.
//!
//! Recording must never fail and must keep working while the client is
//! disabled, so the counters sit behind their own lock and recover from
//! poisoning instead of propagating it.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use emberline_core::report::{ClientReport, DataCategory, DiscardedEvent, DropReason};

/// Counters of everything the client dropped instead of delivering.
#[derive(Default)]
pub struct DropAccounting {
    counts: Mutex<BTreeMap<(DropReason, DataCategory), u32>>,
}

impl DropAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` to the counter for `(reason, category)`.
    pub fn record(&self, reason: DropReason, category: DataCategory, quantity: u32) {
        let mut counts = self
            .counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *counts.entry((reason, category)).or_insert(0) += quantity;
    }

    /// Current counter values.
    pub fn snapshot(&self) -> BTreeMap<(DropReason, DataCategory), u32> {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Count for one `(reason, category)` pair.
    pub fn count(&self, reason: DropReason, category: DataCategory) -> u32 {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(reason, category))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Drain the counters into a client report; `None` when nothing was
    /// dropped since the last drain.
    pub fn take_client_report(&self) -> Option<ClientReport> {
        let counts = std::mem::take(
            &mut *self
                .counts
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if counts.is_empty() {
            return None;
        }
        let discarded_events = counts
            .into_iter()
            .map(|((reason, category), quantity)| DiscardedEvent {
                reason,
                category,
                quantity,
            })
            .collect();
        Some(ClientReport::new(discarded_events))
    }
}

impl std::fmt::Debug for DropAccounting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropAccounting")
            .field("counts", &self.snapshot())
            .finish()
    }
}
