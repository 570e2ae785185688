//! CLI logic for the Trazo diagram compiler.
//!
//! Reads a source file, compiles it with [`trazo::Compiler`] and writes the
//! encoded image.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use trazo::{Compiler, ErrorKind, SourceDocument, TrazoError};

/// Run the Trazo CLI application
///
/// The input notation and output format are taken from `args`, or inferred
/// from the file extensions.
///
/// # Errors
///
/// Returns `TrazoError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Syntax and semantic errors in the source
/// - Empty or oversized diagrams
/// - Layout and rendering errors
pub fn run(args: &Args) -> Result<(), TrazoError> {
    let notation = args.resolved_notation();
    let format = args.resolved_format();
    let output = args.resolved_output();
    info!(
        input_path = args.input,
        output_path = output.display().to_string(),
        notation = notation.as_str(),
        format = format.as_str();
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let text = fs::read_to_string(&args.input)?;
    let doc = SourceDocument::new(notation, text);

    let compiler = Compiler::new(app_config);
    let diagram = compiler.compile(&doc)?;
    let bytes = diagram.encode(format)?;

    fs::write(&output, &bytes)?;

    info!(
        output_file = output.display().to_string(),
        bytes = bytes.len(),
        nodes = diagram.node_count(),
        edges = diagram.edge_count();
        "Diagram exported successfully"
    );

    Ok(())
}

/// Process exit status for a failed run.
///
/// Problems in the diagram source exit with 1 and everything else with 3.
/// Status 2 stays with clap for usage errors.
pub fn exit_code(err: &TrazoError) -> u8 {
    match err.kind() {
        ErrorKind::Syntax | ErrorKind::Semantic | ErrorKind::Empty | ErrorKind::TooLarge => 1,
        ErrorKind::Internal => 3,
    }
}
