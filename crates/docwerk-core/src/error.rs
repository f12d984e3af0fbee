// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docwerk.
//
// Every error classifies into an `ErrorKind`. The kind is what per-file
// failure results and the history ledger carry; the error itself never
// crosses the batch boundary.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all docwerk operations.
#[derive(Debug, Error)]
pub enum DocwerkError {
    // -- Input errors --
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("document is unreadable: {0}")]
    Unreadable(String),

    #[error("document is encrypted: {}", .0.display())]
    Encrypted(PathBuf),

    // -- Collaborator errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("DOCX writing failed: {0}")]
    Docx(String),

    #[error("{tool} failed: {detail}")]
    Backend { tool: String, detail: String },

    // -- Control flow --
    #[error("operation was cancelled")]
    Cancelled,

    /// Caller broke an API contract (empty path, oversized batch, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocwerkError>;

/// Failure taxonomy recorded on every failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The path does not exist.
    NotFound,
    /// Metadata or content could not be parsed (corrupted, truncated, ...).
    Unreadable,
    /// Password-protected; processing was not attempted.
    Encrypted,
    /// A collaborator (extractor, writer, compressor, OCR) failed.
    BackendFailure,
    /// Abandoned on request.
    Cancelled,
    /// Anything else, including a panicking worker.
    Unknown,
}

impl ErrorKind {
    /// Short stable label for logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Unreadable => "unreadable",
            Self::Encrypted => "encrypted",
            Self::BackendFailure => "backend-failure",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl DocwerkError {
    /// Classify this error for failure results.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unreadable(_) => ErrorKind::Unreadable,
            Self::Encrypted(_) => ErrorKind::Encrypted,

            Self::Pdf(_)
            | Self::Image(_)
            | Self::Ocr(_)
            | Self::Docx(_)
            | Self::Backend { .. } => ErrorKind::BackendFailure,

            Self::Cancelled => ErrorKind::Cancelled,

            Self::InvalidArgument(_) => ErrorKind::Unknown,
            Self::Serialization(_) => ErrorKind::Unknown,

            // IO errors depend on the kind
            Self::Io(io_err) => match io_err.kind() {
                std::io::ErrorKind::NotFound => ErrorKind::NotFound,
                std::io::ErrorKind::PermissionDenied
                | std::io::ErrorKind::InvalidData
                | std::io::ErrorKind::UnexpectedEof => ErrorKind::Unreadable,
                _ => ErrorKind::BackendFailure,
            },
        }
    }
}
