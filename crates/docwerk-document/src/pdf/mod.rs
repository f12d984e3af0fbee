// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: inspection, text extraction, and size compression.

pub mod compress;
pub mod reader;

pub use compress::{CompressionStats, PdfCompressor};
pub use reader::{PdfReader, read_metadata};
