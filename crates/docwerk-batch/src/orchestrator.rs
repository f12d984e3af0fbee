// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded-concurrency batch orchestrator.
//
// Three roles cooperate over one batch:
//
// - the admission task walks the input list in order and hands each file to a
//   worker once a semaphore permit is free. It stops admitting as soon as the
//   batch is cancelled.
// - workers run metadata reading and the operation on the blocking pool and
//   send a `FileOutcome` to the collector. A panic fails that file only.
// - the collector (the caller's task) owns the counters, builds a new
//   `BatchRun` snapshot per completion and notifies the observer.
//
// Observers run on the collector, so a slow observer delays snapshots but
// never admission.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use docwerk_core::CancelSignal;
use docwerk_core::error::ErrorKind;
use docwerk_core::traits::DocumentToolkit;
use docwerk_core::types::{
    BatchRun, Operation, OperationRequest, OperationResult, file_name_of,
};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info, warn};

use crate::estimate::throughput_mb_per_sec;
use crate::runner::OperationRunner;

/// One finished file, as seen by the collector.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// Position in the batch's input list.
    pub index: usize,
    pub path: PathBuf,
    /// Input size, when it could be read.
    pub file_size: Option<u64>,
    pub result: OperationResult,
    /// Wall time from admission to completion.
    pub elapsed: Duration,
}

/// Receives batch progress. Called from the collector, one call at a time.
pub trait ProgressObserver: Send + Sync {
    /// A file finished. Fired before the matching `on_progress`.
    fn on_file_completed(&self, _outcome: &FileOutcome) {}

    /// A new snapshot was published.
    fn on_progress(&self, run: &BatchRun);
}

impl<F> ProgressObserver for F
where
    F: Fn(&BatchRun) + Send + Sync,
{
    fn on_progress(&self, run: &BatchRun) {
        self(run)
    }
}

/// Clamp a requested limit to `1..=available_parallelism`.
pub fn effective_concurrency(requested: usize) -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested.min(available).max(1)
}

/// Runs a batch of files through an [`OperationRunner`].
pub struct BatchOrchestrator<T: ?Sized> {
    runner: Arc<OperationRunner<T>>,
}

impl<T> BatchOrchestrator<T>
where
    T: DocumentToolkit + ?Sized + 'static,
{
    pub fn new(runner: Arc<OperationRunner<T>>) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &Arc<OperationRunner<T>> {
        &self.runner
    }

    /// Process `paths` with at most `concurrency` files in flight.
    ///
    /// Returns the terminal snapshot. Per-file failures only show up in the
    /// counters and in the observer's `FileOutcome`s.
    pub async fn run_batch(
        &self,
        paths: Vec<PathBuf>,
        operation: Operation,
        concurrency: usize,
        observer: &dyn ProgressObserver,
        cancel: &CancelSignal,
    ) -> BatchRun {
        let limit = effective_concurrency(concurrency);
        let mut run = BatchRun::new(paths, operation.kind());
        let total = run.total_files();
        info!(
            batch = %run.id,
            operation = %run.operation,
            total,
            limit,
            "Batch started"
        );

        let started = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let admission = tokio::spawn(admit(
            Arc::clone(&self.runner),
            Arc::clone(&run.file_paths),
            operation,
            limit,
            tx,
            cancel.clone(),
        ));

        let mut successful = 0;
        let mut failed = 0;
        let mut busy_time = Duration::ZERO;
        let mut bytes_processed = 0u64;

        // Ends once the admission task and every worker dropped their sender.
        while let Some(outcome) = rx.recv().await {
            if outcome.result.success() {
                successful += 1;
            } else {
                failed += 1;
            }
            busy_time += outcome.elapsed;
            bytes_processed += outcome.file_size.unwrap_or(0);

            let processed = successful + failed;
            let remaining = total.saturating_sub(processed);
            let eta = (remaining > 0).then(|| {
                let mean = busy_time.as_secs_f64() / processed as f64;
                Duration::from_secs_f64(mean * remaining as f64 / limit as f64)
            });

            run = run.with_progress(successful, failed, eta);
            debug!(
                index = outcome.index,
                success = outcome.result.success(),
                processed,
                total,
                "File completed"
            );
            observer.on_file_completed(&outcome);
            observer.on_progress(&run);
        }

        let admitted = match admission.await {
            Ok(admitted) => admitted,
            Err(err) => {
                error!(%err, "Admission task failed");
                successful + failed
            }
        };
        let cancelled = admitted < total;
        run = run.completed(cancelled);
        observer.on_progress(&run);

        let elapsed = started.elapsed();
        info!(
            batch = %run.id,
            successful,
            failed,
            cancelled,
            elapsed_ms = elapsed.as_millis() as u64,
            throughput_mb_per_sec = throughput_mb_per_sec(bytes_processed, elapsed),
            "Batch finished"
        );
        run
    }
}

/// Admit files in input order. Returns how many were admitted.
async fn admit<T>(
    runner: Arc<OperationRunner<T>>,
    paths: Arc<[PathBuf]>,
    operation: Operation,
    limit: usize,
    tx: mpsc::UnboundedSender<FileOutcome>,
    cancel: CancelSignal,
) -> usize
where
    T: DocumentToolkit + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut admitted = 0;

    for (index, path) in paths.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        let permit = tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        admitted += 1;

        let runner = Arc::clone(&runner);
        let operation = operation.clone();
        let cancel = cancel.clone();
        let tx = tx.clone();
        let path = path.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let kind = operation.kind();
            let worker_path = path.clone();
            let joined = tokio::task::spawn_blocking(move || {
                process_file(&runner, &worker_path, operation, cancel)
            })
            .await;

            let (result, file_size) = match joined {
                Ok(done) => done,
                Err(err) => {
                    error!(path = %path.display(), %err, "Worker panicked");
                    let result = OperationResult::failed(
                        kind,
                        ErrorKind::Unknown,
                        format!("Processing {} panicked", file_name_of(&path)),
                    )
                    .with_duration(started.elapsed());
                    (result, None)
                }
            };

            // Free the slot before reporting so admission can move on.
            drop(permit);
            let outcome = FileOutcome {
                index,
                path,
                file_size,
                result,
                elapsed: started.elapsed(),
            };
            if tx.send(outcome).is_err() {
                warn!("Collector gone, dropping file outcome");
            }
        });
    }

    if admitted < paths.len() {
        info!(admitted, total = paths.len(), "Admission stopped by cancellation");
    }
    admitted
}

/// Read metadata, then run the operation. Blocking.
pub(crate) fn process_file<T>(
    runner: &OperationRunner<T>,
    path: &Path,
    operation: Operation,
    cancel: CancelSignal,
) -> (OperationResult, Option<u64>)
where
    T: DocumentToolkit + ?Sized,
{
    let started = Instant::now();
    let kind = operation.kind();

    match runner.toolkit().read_metadata(path) {
        Ok(document) => {
            let size = document.size_bytes;
            let request = OperationRequest {
                operation,
                document,
                cancel,
            };
            (runner.run(&request), Some(size))
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "Could not read metadata");
            let result = OperationResult::failed(
                kind,
                err.kind(),
                format!("Could not read metadata for {}: {err}", path.display()),
            )
            .with_duration(started.elapsed());
            let size = std::fs::metadata(path).ok().map(|meta| meta.len());
            (result, size)
        }
    }
}
