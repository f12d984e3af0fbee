// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

use docwerk_core::error::Result;

const APP_DIR: &str = "docwerk";

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> Result<PathBuf> {
    let dir = resolve(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    );
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// `$XDG_DATA_HOME/docwerk`, then `$HOME/.local/share/docwerk`, then the
/// system temp directory.
fn resolve(xdg_data_home: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    let base = xdg_data_home
        .filter(|dir| dir.is_absolute())
        .or_else(|| home.map(|home| home.join(".local").join("share")))
        .unwrap_or_else(std::env::temp_dir);
    base.join(APP_DIR)
}
