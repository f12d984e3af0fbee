// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docwerk: headless batch PDF-to-Word conversion and PDF compression.
//
// Entry point. Initialises logging, loads the config, runs one batch over
// the local toolkit and prints a summary. Exit code 0 when every file
// succeeded, 1 otherwise, 2 on a usage error.

mod cli;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

use clap::Parser;
use docwerk_batch::{DocumentService, FileOutcome, ProgressObserver};
use docwerk_core::error::{ErrorKind, Result};
use docwerk_core::human_errors::{humanize, humanize_error};
use docwerk_core::types::{BatchRun, file_name_of};
use docwerk_core::{AppConfig, CancelSignal};
use docwerk_document::LocalToolkit;
use tracing::{error, info, warn};

use services::config_store::ConfigStore;
use services::data_dir;

/// A failed file, kept for the summary.
struct Failure {
    path: PathBuf,
    kind: ErrorKind,
    message: String,
}

/// Logs progress and remembers failures.
#[derive(Default)]
struct ConsoleProgress {
    failures: Mutex<Vec<Failure>>,
}

impl ProgressObserver for ConsoleProgress {
    fn on_file_completed(&self, outcome: &FileOutcome) {
        let (Some(kind), Some(message)) =
            (outcome.result.error_kind(), outcome.result.error_message())
        else {
            return;
        };
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Failure {
                path: outcome.path.clone(),
                kind,
                message: message.to_string(),
            });
    }

    fn on_progress(&self, run: &BatchRun) {
        info!(
            percent = run.progress_percentage().round() as u64,
            processed = run.processed_files(),
            total = run.total_files(),
            eta_secs = run.estimated_time_remaining.map(|eta| eta.as_secs()),
            "Progress"
        );
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Usage errors exit with status 2 from inside clap.
    let command = cli::Cli::parse().into_command();

    match run(command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(%err, "docwerk failed");
            let human = humanize_error(&err);
            eprintln!("docwerk: {}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> AppConfig {
    let loaded = data_dir::data_dir().and_then(|dir| ConfigStore::new(&dir).load_or_init());
    match loaded {
        Ok(config) => config,
        Err(err) => {
            warn!(%err, "Could not load config, using defaults");
            AppConfig::default()
        }
    }
}

/// Run the batch. `Ok(true)` when every file succeeded.
async fn run(command: cli::Command) -> Result<bool> {
    let config = load_config();
    let toolkit = Arc::new(LocalToolkit::new().with_ocr_model_dir(config.ocr_model_dir.clone()));
    let service = DocumentService::new(toolkit, config)?;
    let operation = service.default_operation(command.kind);

    let estimate = service.estimate_processing_time(&command.paths);
    info!(
        files = command.paths.len(),
        operation = %command.kind,
        estimate_secs = estimate.as_secs(),
        "docwerk starting"
    );

    let cancel = CancelSignal::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing files already in progress");
            on_interrupt.cancel();
        }
    });

    let progress = ConsoleProgress::default();
    let run = service
        .run_batch(command.paths, operation, &progress, &cancel)
        .await?;

    println!(
        "Processed {} of {} files successfully",
        run.successful_files(),
        run.total_files()
    );
    if run.is_cancelled {
        println!(
            "Cancelled: {} files were not started",
            run.total_files() - run.processed_files()
        );
    }

    let failures = progress
        .failures
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    for failure in &failures {
        let human = humanize(failure.kind, &failure.message);
        println!("  ✗ {}: {human}", file_name_of(&failure.path));
        info!(path = %failure.path.display(), detail = %failure.message, "Failure detail");
    }

    Ok(run.successful_files() == run.total_files())
}
