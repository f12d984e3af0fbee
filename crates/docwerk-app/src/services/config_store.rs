// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON config persistence.

use std::path::{Path, PathBuf};

use docwerk_core::AppConfig;
use docwerk_core::error::Result;
use tracing::{info, warn};

const CONFIG_FILE: &str = "config.json";

/// `config.json` inside the data directory.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CONFIG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored config. A missing file is created with the defaults;
    /// an unparsable one is left alone and the defaults are used.
    pub fn load_or_init(&self) -> Result<AppConfig> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let config = AppConfig::default();
                self.save(&config)?;
                info!(path = %self.path.display(), "Default config written");
                return Ok(config);
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&data) {
            Ok(config) => Ok(config),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "Config unreadable, using defaults");
                Ok(AppConfig::default())
            }
        }
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
