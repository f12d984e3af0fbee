// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document service facade.
//
// Owns the toolkit, the orchestrator and the history ledger, and applies the
// application config. Front ends (the CLI, tests) only talk to this type.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use docwerk_core::CancelSignal;
use docwerk_core::config::AppConfig;
use docwerk_core::error::{DocwerkError, ErrorKind, Result};
use docwerk_core::traits::DocumentToolkit;
use docwerk_core::types::{
    BatchRun, CompressionOptions, ConversionOptions, DocumentMetadata, HistoryEntry, Operation,
    OperationKind, OperationResult, TriageReport, TriageSignals, file_name_of,
};
use tracing::{info, instrument, warn};

use crate::estimate;
use crate::history::HistoryLedger;
use crate::orchestrator::{BatchOrchestrator, FileOutcome, ProgressObserver, process_file};
use crate::runner::OperationRunner;
use crate::triage;

/// Records every completed file in the ledger, then forwards to the caller's
/// observer.
struct HistoryRecorder<'a> {
    history: &'a HistoryLedger,
    inner: &'a dyn ProgressObserver,
}

impl ProgressObserver for HistoryRecorder<'_> {
    fn on_file_completed(&self, outcome: &FileOutcome) {
        self.history.append(HistoryEntry::from_result(
            &outcome.path,
            &outcome.result,
            outcome.file_size,
        ));
        self.inner.on_file_completed(outcome);
    }

    fn on_progress(&self, run: &BatchRun) {
        self.inner.on_progress(run);
    }
}

pub struct DocumentService<T: ?Sized> {
    toolkit: Arc<T>,
    orchestrator: BatchOrchestrator<T>,
    history: Arc<HistoryLedger>,
    config: AppConfig,
}

impl<T> DocumentService<T>
where
    T: DocumentToolkit + ?Sized + 'static,
{
    /// Build a service over `toolkit`. Fails only on an invalid config.
    pub fn new(toolkit: Arc<T>, config: AppConfig) -> Result<Self> {
        let history = Arc::new(HistoryLedger::new(config.history_capacity)?);
        let runner = Arc::new(OperationRunner::new(
            Arc::clone(&toolkit),
            config.min_text_chars,
        ));
        info!(
            toolkit = toolkit.toolkit_name(),
            max_concurrency = config.max_concurrency,
            "Document service ready"
        );
        Ok(Self {
            toolkit,
            orchestrator: BatchOrchestrator::new(runner),
            history,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn history(&self) -> &Arc<HistoryLedger> {
        &self.history
    }

    /// The operation `kind` with options taken from the config.
    pub fn default_operation(&self, kind: OperationKind) -> Operation {
        let output_directory = self.config.output_directory.clone();
        match kind {
            OperationKind::Convert => Operation::Convert(ConversionOptions {
                allow_ocr_fallback: self.config.allow_ocr_fallback,
                output_directory,
                ..ConversionOptions::default()
            }),
            OperationKind::Compress => Operation::Compress(CompressionOptions {
                output_directory,
                ..CompressionOptions::for_level(self.config.default_compression)
            }),
        }
    }

    // -- Batch ----------------------------------------------------------------

    /// Run `operation` over `paths` with the configured concurrency.
    ///
    /// Every completed file lands in the history ledger. Errors only for
    /// contract violations, checked before any file is touched.
    pub async fn run_batch(
        &self,
        paths: Vec<PathBuf>,
        operation: Operation,
        observer: &dyn ProgressObserver,
        cancel: &CancelSignal,
    ) -> Result<BatchRun> {
        if paths.len() > self.config.max_batch_size {
            return Err(DocwerkError::InvalidArgument(format!(
                "batch of {} files exceeds the limit of {}",
                paths.len(),
                self.config.max_batch_size
            )));
        }
        if let Some(index) = paths.iter().position(|path| path.as_os_str().is_empty()) {
            return Err(DocwerkError::InvalidArgument(format!(
                "empty path at position {index}"
            )));
        }

        let recorder = HistoryRecorder {
            history: &self.history,
            inner: observer,
        };
        Ok(self
            .orchestrator
            .run_batch(paths, operation, self.config.max_concurrency, &recorder, cancel)
            .await)
    }

    /// Run `operation` on one file and record it in the history.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn run_single(
        &self,
        path: &Path,
        operation: Operation,
        cancel: &CancelSignal,
    ) -> Result<OperationResult> {
        require_path(path)?;
        let kind = operation.kind();
        let runner = Arc::clone(self.orchestrator.runner());
        let worker_path = path.to_path_buf();
        let cancel = cancel.clone();

        let joined = tokio::task::spawn_blocking(move || {
            process_file(&runner, &worker_path, operation, cancel)
        })
        .await;
        let (result, file_size) = match joined {
            Ok(done) => done,
            Err(err) => {
                warn!(%err, "Worker panicked");
                let result = OperationResult::failed(
                    kind,
                    ErrorKind::Unknown,
                    format!("Processing {} panicked", file_name_of(path)),
                );
                (result, None)
            }
        };

        self.history
            .append(HistoryEntry::from_result(path, &result, file_size));
        Ok(result)
    }

    // -- History --------------------------------------------------------------

    /// Up to `n` entries, newest first.
    pub fn get_history(&self, n: usize) -> Vec<HistoryEntry> {
        self.history.recent(n)
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    // -- Inspection -----------------------------------------------------------

    /// Run `f` against the toolkit on the blocking pool.
    async fn blocking<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&T) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let toolkit = Arc::clone(&self.toolkit);
        tokio::task::spawn_blocking(move || f(&toolkit))
            .await
            .map_err(|err| DocwerkError::Backend {
                tool: "worker".into(),
                detail: err.to_string(),
            })?
    }

    pub async fn read_metadata(&self, path: &Path) -> Result<DocumentMetadata> {
        require_path(path)?;
        let path = path.to_path_buf();
        self.blocking(move |toolkit| toolkit.read_metadata(&path))
            .await
    }

    /// True when the file exists and parses into a processable document.
    pub async fn validate_document(&self, path: &Path) -> bool {
        match self.read_metadata(path).await {
            Ok(metadata) => metadata.can_process(),
            Err(_) => false,
        }
    }

    /// Triage `path`. The four raw signals are gathered concurrently; a
    /// signal that fails to read counts as absent.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn analyze_document(&self, path: &Path) -> Result<TriageReport> {
        require_path(path)?;
        if !path.exists() {
            return Err(DocwerkError::NotFound(path.to_path_buf()));
        }
        let metadata = self.read_metadata(path).await?;

        let (text_path, image_path, font_path, structure_path) = (
            path.to_path_buf(),
            path.to_path_buf(),
            path.to_path_buf(),
            path.to_path_buf(),
        );
        let (text, images, fonts, structure) = tokio::join!(
            self.blocking(move |toolkit| toolkit.extract_primary_text(&text_path, None)),
            self.blocking(move |toolkit| toolkit.detect_images(&image_path)),
            self.blocking(move |toolkit| toolkit.list_fonts(&font_path)),
            self.blocking(move |toolkit| {
                let attachments = toolkit.list_attachments(&structure_path)?;
                let tagged = toolkit.is_tagged(&structure_path)?;
                Ok((attachments, tagged))
            }),
        );
        let (attachments, tagged) = match structure {
            Ok((attachments, tagged)) => (Some(attachments), tagged),
            Err(_) => (None, None),
        };

        let signals = TriageSignals {
            extracted_text: text.ok(),
            has_images: images.ok(),
            fonts: fonts.ok(),
            attachments,
            tagged,
            pdf_version: None,
        };
        let report = triage::analyze(&metadata, &signals, self.config.min_text_chars);
        info!(recommendation = %report.recommendation, issues = report.issues.len(), "Document analysed");
        Ok(report)
    }

    /// Rough wall time for `paths` at the configured throughput.
    pub fn estimate_processing_time(&self, paths: &[PathBuf]) -> Duration {
        estimate::estimate_processing_time(paths, self.config.throughput_mb_per_sec)
    }
}

fn require_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        Err(DocwerkError::InvalidArgument("path must not be empty".into()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDocument, FakeToolkit};
    use docwerk_core::types::{BatchStatus, FontInfo, Recommendation};

    fn service(fake: FakeToolkit, config: AppConfig) -> DocumentService<FakeToolkit> {
        DocumentService::new(Arc::new(fake), config).expect("service")
    }

    #[tokio::test]
    async fn valid_missing_and_encrypted_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out");
        let mut fake = FakeToolkit::new();
        let a = fake.add(dir.path(), "a.pdf", FakeDocument::text(3));
        let b = dir.path().join("b.pdf");
        let c = fake.add(dir.path(), "c.pdf", FakeDocument::encrypted());
        let config = AppConfig {
            max_concurrency: 2,
            output_directory: Some(out.clone()),
            ..AppConfig::default()
        };
        let service = service(fake, config);
        let operation = service.default_operation(OperationKind::Convert);

        let run = service
            .run_batch(vec![a, b, c], operation, &|_: &BatchRun| {}, &CancelSignal::new())
            .await
            .expect("batch");

        assert_eq!(run.total_files(), 3);
        assert_eq!(run.successful_files(), 1);
        assert_eq!(run.failed_files(), 2);
        assert_eq!(run.status(), BatchStatus::Completed);

        let history = service.get_history(10);
        assert_eq!(history.len(), 3);
        let by_name = |name: &str| {
            history
                .iter()
                .find(|entry| entry.file_name == name)
                .expect("history entry")
                .clone()
        };
        assert!(by_name("a.pdf").success);
        assert!(
            by_name("b.pdf")
                .error_message
                .expect("message")
                .contains("b.pdf")
        );
        assert!(!by_name("c.pdf").success);
        assert_eq!(by_name("a.pdf").status_symbol(), "✓");

        let produced: Vec<String> = std::fs::read_dir(&out)
            .expect("read out dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(produced, vec!["a.docx".to_string()]);
    }

    #[tokio::test]
    async fn oversized_or_malformed_batches_fail_before_processing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut fake = FakeToolkit::new();
        let paths: Vec<_> = (0..3)
            .map(|i| fake.add(dir.path(), &format!("{i}.pdf"), FakeDocument::text(1)))
            .collect();
        let service = service(fake, AppConfig {
            max_batch_size: 2,
            ..AppConfig::default()
        });
        let operation = service.default_operation(OperationKind::Compress);
        let cancel = CancelSignal::new();

        let err = service
            .run_batch(paths.clone(), operation.clone(), &|_: &BatchRun| {}, &cancel)
            .await
            .expect_err("too many files");
        assert!(matches!(err, DocwerkError::InvalidArgument(_)));

        let err = service
            .run_batch(
                vec![paths[0].clone(), PathBuf::new()],
                operation,
                &|_: &BatchRun| {},
                &cancel,
            )
            .await
            .expect_err("empty path");
        assert!(err.to_string().contains("position 1"));
        assert!(service.get_history(10).is_empty());
    }

    #[tokio::test]
    async fn run_single_records_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut fake = FakeToolkit::new();
        let path = fake.add(dir.path(), "single.pdf", FakeDocument::text(1));
        let service = service(fake, AppConfig::default());

        let result = service
            .run_single(
                &path,
                Operation::Compress(CompressionOptions::balanced()),
                &CancelSignal::new(),
            )
            .await
            .expect("run");

        assert!(result.success());
        let history = service.get_history(1);
        assert_eq!(history[0].file_name, "single.pdf");
        assert_eq!(history[0].operation, "COMPRESS");
        assert_eq!(history[0].file_size_bytes, Some(2048));

        service.clear_history();
        assert!(service.get_history(1).is_empty());
    }

    #[tokio::test]
    async fn analysis_gathers_every_signal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut fake = FakeToolkit::new();
        let scanned = fake.add(dir.path(), "scan.pdf", FakeDocument::scanned(2));
        let fonts = fake.add(
            dir.path(),
            "fonts.pdf",
            FakeDocument {
                fonts: vec![FontInfo {
                    name: "Garamond".into(),
                    font_type: "Type1".into(),
                    embedded: false,
                    subset: false,
                }],
                tagged: Some(false),
                ..FakeDocument::text(1)
            },
        );
        let service = service(fake, AppConfig::default());

        let report = service.analyze_document(&scanned).await.expect("scan report");
        assert!(report.is_scanned);
        assert_eq!(report.recommendation, Recommendation::UseOcrFallback);
        assert_eq!(report.page_count, 2);

        let report = service.analyze_document(&fonts).await.expect("font report");
        assert_eq!(report.recommendation, Recommendation::FontRisk);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.pdf_version.as_deref(), Some("1.7"));

        let err = service
            .analyze_document(&dir.path().join("nope.pdf"))
            .await
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn validation_and_estimates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut fake = FakeToolkit::new();
        let good = fake.add(dir.path(), "good.pdf", FakeDocument::text(1));
        let empty = fake.add(dir.path(), "empty.pdf", FakeDocument::text(0));
        let service = service(fake, AppConfig::default());

        assert!(service.validate_document(&good).await);
        assert!(!service.validate_document(&empty).await);
        assert!(!service.validate_document(&dir.path().join("gone.pdf")).await);
        assert!(service.estimate_processing_time(&[good]) > Duration::ZERO);
    }

    #[tokio::test]
    async fn works_behind_a_trait_object() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut fake = FakeToolkit::new();
        let path = fake.add(dir.path(), "dyn.pdf", FakeDocument::text(1));
        let toolkit: Arc<dyn DocumentToolkit> = Arc::new(fake);
        let service = DocumentService::new(toolkit, AppConfig::default()).expect("service");

        let operation = service.default_operation(OperationKind::Convert);
        let result = service
            .run_single(&path, operation, &CancelSignal::new())
            .await
            .expect("run");
        assert!(result.success());
        assert!(dir.path().join("dyn.docx").exists());
    }

    #[tokio::test]
    async fn short_text_pdf_converts_with_the_local_toolkit() {
        use crate::testing::write_text_pdf;
        use docwerk_document::LocalToolkit;

        let dir = tempfile::tempdir().expect("tempdir");
        let models = tempfile::tempdir().expect("model dir");
        let pdf = dir.path().join("memo.pdf");
        write_text_pdf(&pdf, "Meeting moved to 3pm on Friday.");
        let toolkit =
            LocalToolkit::new().with_ocr_model_dir(Some(models.path().to_path_buf()));
        let service =
            DocumentService::new(Arc::new(toolkit), AppConfig::default()).expect("service");
        let cancel = CancelSignal::new();

        let first = service
            .run_single(&pdf, service.default_operation(OperationKind::Convert), &cancel)
            .await
            .expect("first run");
        assert!(first.success(), "{:?}", first.error_message());
        assert_eq!(first.metrics["UsedFallback"], serde_json::json!(false));
        assert_eq!(first.output_path(), Some(dir.path().join("memo.docx").as_path()));

        let second = service
            .run_single(&pdf, service.default_operation(OperationKind::Convert), &cancel)
            .await
            .expect("second run");
        assert!(second.success(), "{:?}", second.error_message());
        assert_eq!(second.output_path(), Some(dir.path().join("memo_1.docx").as_path()));

        let history = service.get_history(10);
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|entry| entry.success));
    }

    #[test]
    fn zero_history_capacity_is_rejected() {
        let err = DocumentService::new(
            Arc::new(FakeToolkit::new()),
            AppConfig {
                history_capacity: 0,
                ..AppConfig::default()
            },
        )
        .err()
        .expect("invalid config");
        assert!(matches!(err, DocwerkError::InvalidArgument(_)));
    }
}
