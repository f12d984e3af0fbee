// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output path allocation.
//
// Names are reserved by creating the file with `create_new`, so two workers
// can never pick the same name and an existing output is never overwritten.
// A reservation deletes its file on drop unless the operation keeps it.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use docwerk_core::error::{DocwerkError, Result};
use tracing::{debug, warn};

/// Give up after this many taken names.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// An empty output file claimed for one operation.
#[derive(Debug)]
pub struct ReservedOutput {
    path: PathBuf,
    keep: bool,
}

impl ReservedOutput {
    /// Claim `<stem><suffix>.<extension>` next to `input` (or in
    /// `output_directory`), falling back to `<stem><suffix>_1.<extension>`,
    /// `_2`, ... while names are taken.
    pub fn reserve(
        input: &Path,
        output_directory: Option<&Path>,
        suffix: &str,
        extension: &str,
    ) -> Result<Self> {
        let directory = match output_directory {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir.to_path_buf()
            }
            None => input
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = directory.join(candidate_name(&stem, suffix, extension, attempt));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(_) => {
                    debug!(path = %candidate.display(), "Output path reserved");
                    return Ok(Self {
                        path: candidate,
                        keep: false,
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Err(DocwerkError::Backend {
            tool: "output".into(),
            detail: format!(
                "no free name for {stem}{suffix}.{extension} in {} after {MAX_NAME_ATTEMPTS} attempts",
                directory.display()
            ),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file and hand back its path.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ReservedOutput {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Partial output removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), %err, "Could not remove partial output"),
        }
    }
}

fn candidate_name(stem: &str, suffix: &str, extension: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{stem}{suffix}.{extension}")
    } else {
        format!("{stem}{suffix}_{attempt}.{extension}")
    }
}
