// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded in-memory processing history.
//
// Entries are appended as files complete and evicted oldest-first once the
// ledger is full. The lock is only ever held for the duration of a single
// method call, never across an await.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use docwerk_core::error::{DocwerkError, Result};
use docwerk_core::types::HistoryEntry;
use tracing::{debug, instrument};

struct Inner {
    /// `(insertion sequence, entry)`, oldest at the front.
    entries: VecDeque<(u64, HistoryEntry)>,
    next_seq: u64,
}

/// Thread-safe FIFO ledger of processed files.
pub struct HistoryLedger {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl HistoryLedger {
    /// Create an empty ledger holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DocwerkError::InvalidArgument(
                "history capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity),
                next_seq: 0,
            }),
            capacity,
        })
    }

    // A panicking holder cannot leave the deque half-updated, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `entry`, evicting the oldest entries beyond capacity.
    #[instrument(skip_all, fields(file = %entry.file_name, success = entry.success))]
    pub fn append(&self, entry: HistoryEntry) {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.push_back((seq, entry));
        while inner.entries.len() > self.capacity {
            inner.entries.pop_front();
        }
        debug!(len = inner.entries.len(), "History entry recorded");
    }

    /// Up to `n` entries, newest first. Entries with equal timestamps are
    /// ordered newest insertion first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let inner = self.lock();
        let mut entries: Vec<&(u64, HistoryEntry)> = inner.entries.iter().collect();
        entries.sort_by(|(seq_a, a), (seq_b, b)| {
            b.processed_at
                .cmp(&a.processed_at)
                .then_with(|| seq_b.cmp(seq_a))
        });
        entries
            .into_iter()
            .take(n)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
        debug!("History cleared");
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
