// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX module: editable word-processing output.

pub mod writer;

pub use writer::{DocxWriter, sanitize_text};
