use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use nexparse::parser::Parser;
use nexparse::report;

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut json_output = false;
    let mut input_path: Option<String> = None;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json_output = true,
            _ if arg.starts_with('-') => bail!("Unknown option '{arg}'"),
            _ => {
                if input_path.is_some() {
                    bail!("Only one input file is supported");
                }
                input_path = Some(arg);
            }
        }
    }

    let Some(path) = input_path else {
        bail!("Usage: nexparse <source_file> [--json]");
    };
    let source = fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?;

    let mut parser = Parser::new(&source);
    let program = parser.parse();

    if json_output {
        let report = report::json_report(&parser, program.as_ref());
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report::text_summary(&parser));
    }

    Ok(if parser.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
