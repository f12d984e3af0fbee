// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line parsing: `docwerk <convert|compress> <paths...>`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docwerk_core::types::OperationKind;

#[derive(Parser, Debug)]
#[command(name = "docwerk")]
#[command(about = "Batch PDF-to-Word conversion and PDF compression")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert PDFs into editable Word documents
    Convert {
        /// PDF files to convert
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Rewrite PDFs to reduce their size
    Compress {
        /// PDF files to compress
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

/// One parsed invocation.
#[derive(Debug, PartialEq)]
pub struct Command {
    pub kind: OperationKind,
    pub paths: Vec<PathBuf>,
}

impl Cli {
    pub fn into_command(self) -> Command {
        match self.command {
            Commands::Convert { paths } => Command {
                kind: OperationKind::Convert,
                paths,
            },
            Commands::Compress { paths } => Command {
                kind: OperationKind::Compress,
                paths,
            },
        }
    }
}
