//! Command-line argument definitions for the Trazo CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, notation and format
//! selection, configuration file selection, and logging verbosity.

use std::path::{Path, PathBuf};

use clap::Parser;

use trazo::{Notation, OutputFormat};

/// Command-line arguments for the Trazo diagram compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input diagram source
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output image. Defaults to the input name with the
    /// format's extension
    #[arg(short, long)]
    pub output: Option<String>,

    /// Input notation (infra, er, data). Inferred from the input extension
    /// when omitted
    #[arg(short, long)]
    pub notation: Option<Notation>,

    /// Output format (svg, png, pdf). Inferred from the output extension
    /// when omitted
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// The notation given on the command line, or the one implied by the
    /// input extension: `.json` is data, `.er` is ER, anything else infra.
    pub fn resolved_notation(&self) -> Notation {
        if let Some(notation) = self.notation {
            return notation;
        }
        let extension = Path::new(&self.input)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Notation::Data,
            Some("er") => Notation::Er,
            _ => Notation::Infra,
        }
    }

    /// The output format: explicit, else from the output extension, else SVG.
    pub fn resolved_format(&self) -> OutputFormat {
        self.format
            .or_else(|| {
                self.output
                    .as_deref()
                    .and_then(|output| OutputFormat::from_path(Path::new(output)))
            })
            .unwrap_or_default()
    }

    /// The output path: explicit, else the input path with the format's
    /// extension.
    pub fn resolved_output(&self) -> PathBuf {
        match &self.output {
            Some(output) => PathBuf::from(output),
            None => Path::new(&self.input).with_extension(self.resolved_format().extension()),
        }
    }
}
