// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host services for the command-line runner: where docwerk keeps its files
// and how the config is persisted between runs.

pub mod config_store;
pub mod data_dir;
