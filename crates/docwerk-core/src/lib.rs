// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docwerk core: types, error taxonomy, and collaborator traits shared across
// all crates.

pub mod cancel;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod traits;
pub mod types;

pub use cancel::CancelSignal;
pub use config::AppConfig;
pub use error::{DocwerkError, ErrorKind};
pub use types::*;
