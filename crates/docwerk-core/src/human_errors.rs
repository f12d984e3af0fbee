// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable failure messages for batch summaries.
//
// Every failure kind is mapped to plain English with a clear suggestion. The
// severity tells the caller whether running the file again could help.

use crate::error::{DocwerkError, ErrorKind};

/// Severity of a failure from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth running again as-is (cancelled, interrupted I/O).
    Transient,
    /// The user must do something first (decrypt, restore the file).
    ActionRequired,
    /// The file itself is the problem.
    Permanent,
}

/// A human-readable failure with a plain English message and suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a recorded failure (kind + technical detail) into a `HumanError`.
pub fn humanize(kind: ErrorKind, detail: &str) -> HumanError {
    match kind {
        ErrorKind::NotFound => HumanError {
            message: "The file couldn't be found.".into(),
            suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
            severity: Severity::ActionRequired,
        },

        ErrorKind::Unreadable => HumanError {
            message: "This file couldn't be read as a PDF.".into(),
            suggestion: "The file may be damaged or empty. Try opening it in a PDF viewer first, or re-export it.".into(),
            severity: Severity::Permanent,
        },

        ErrorKind::Encrypted => HumanError {
            message: "This PDF is password-protected.".into(),
            suggestion: "Remove the password (save an unprotected copy) and process that copy instead.".into(),
            severity: Severity::ActionRequired,
        },

        ErrorKind::BackendFailure => humanize_backend_failure(detail),

        ErrorKind::Cancelled => HumanError {
            message: "Processing was stopped before this file finished.".into(),
            suggestion: "Run the batch again to process the remaining files.".into(),
            severity: Severity::Transient,
        },

        ErrorKind::Unknown => HumanError {
            message: "Something unexpected went wrong with this file.".into(),
            suggestion: format!("Try again. If this keeps happening, please report it. (Detail: {detail})"),
            severity: Severity::Transient,
        },
    }
}

/// Convenience wrapper over [`humanize`] for a live error.
pub fn humanize_error(err: &DocwerkError) -> HumanError {
    humanize(err.kind(), &err.to_string())
}

/// Backend failures share one kind; the detail string says which tool broke.
fn humanize_backend_failure(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("ocr") {
        HumanError {
            message: "Text recognition didn't work on this scan.".into(),
            suggestion: "The scan may be too faint or low resolution, or OCR models are not installed. Try a clearer scan.".into(),
            severity: Severity::Permanent,
        }
    } else if lower.contains("docx") {
        HumanError {
            message: "The Word document couldn't be written.".into(),
            suggestion: "Check there is free disk space and that the output folder is writable.".into(),
            severity: Severity::Transient,
        }
    } else if lower.contains("no space") || lower.contains("disk full") {
        HumanError {
            message: "The disk is full.".into(),
            suggestion: "Free up some space, then run the batch again.".into(),
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("image") {
        HumanError {
            message: "An image inside this PDF couldn't be processed.".into(),
            suggestion: "Try a lower compression level, which leaves images untouched.".into(),
            severity: Severity::Permanent,
        }
    } else {
        HumanError {
            message: "The PDF tools had a problem with this file.".into(),
            suggestion: format!("The file may use features we don't support. (Detail: {detail})"),
            severity: Severity::Permanent,
        }
    }
}
