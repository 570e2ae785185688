//! End-to-end tests for the CLI run loop.

use std::{fs, path::PathBuf};

use clap::Parser;
use tempfile::TempDir;

use trazo::{ErrorKind, TrazoError};
use trazo_cli::{Args, error_adapter::to_reportables};

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .display()
        .to_string()
}

fn args(argv: &[&str]) -> Args {
    Args::parse_from(std::iter::once("trazo").chain(argv.iter().copied()))
}

#[test]
fn test_infra_to_svg() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("web.svg");
    let input = fixture("web_service.py");

    trazo_cli::run(&args(&[&input, "-o", output.to_str().unwrap()])).unwrap();

    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Web Service"));
    assert!(svg.contains("Workers"));
    assert!(svg.contains("worker2"));
}

#[test]
fn test_er_to_pdf_by_extension() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("blog.pdf");
    let input = fixture("blog.er");

    trazo_cli::run(&args(&[&input, "-o", output.to_str().unwrap()])).unwrap();

    let pdf = fs::read(&output).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(pdf.ends_with(b"%%EOF"));
}

#[test]
fn test_explicit_format_and_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[style]\nbackground_color = \"#fafafa\"\n").unwrap();
    let output = dir.path().join("tags");
    let input = fixture("blog.er");

    trazo_cli::run(&args(&[
        &input,
        "-o",
        output.to_str().unwrap(),
        "-f",
        "png",
        "-c",
        config.to_str().unwrap(),
    ]))
    .unwrap();

    let png = fs::read(&output).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_syntax_error_is_reported_with_source() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("broken.svg");
    let input = fixture("broken.json");

    let err = trazo_cli::run(&args(&[&input, "-o", output.to_str().unwrap()])).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(trazo_cli::exit_code(&err), 1);
    assert!(!output.exists());
    let reportables = to_reportables(&err);
    assert!(!reportables.is_empty());
    assert!(miette::Diagnostic::source_code(&reportables[0]).is_some());
}

#[test]
fn test_notation_override() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("payload.txt");
    fs::write(&input, r#"{"a": [1, 2]}"#).unwrap();
    let output = dir.path().join("payload.svg");

    let as_infra = trazo_cli::run(&args(&[
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]));
    assert!(as_infra.is_err());

    trazo_cli::run(&args(&[
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-n",
        "data",
    ]))
    .unwrap();
    assert!(fs::read_to_string(&output).unwrap().contains("<svg"));
}

#[test]
fn test_missing_input() {
    let err = trazo_cli::run(&args(&["no/such/diagram.py", "-o", "unused.svg"])).unwrap_err();
    assert!(matches!(err, TrazoError::Io(_)));
    assert_eq!(trazo_cli::exit_code(&err), 3);
}
