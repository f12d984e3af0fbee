// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docwerk batch engine: document triage, the single-document operation
// runner, bounded-concurrency batch orchestration, and the processing history.
// Everything here talks to documents through the `docwerk-core` collaborator
// traits, so it never depends on a particular PDF or DOCX library.

pub mod estimate;
pub mod history;
pub mod orchestrator;
pub mod output;
pub mod runner;
pub mod service;
pub mod triage;

#[cfg(test)]
mod testing;

pub use history::HistoryLedger;
pub use orchestrator::{BatchOrchestrator, FileOutcome, ProgressObserver, effective_concurrency};
pub use runner::{OperationRunner, PAGES_PER_CHUNK};
pub use service::DocumentService;
