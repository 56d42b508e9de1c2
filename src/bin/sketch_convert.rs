//! Convert a plan between formats, or report what format a file is.
//!
//! ```text
//! sketch_convert --detect <file>
//! sketch_convert <input> <output> [--report <report.json>]
//! ```
//!
//! The output format follows the output file extension. `RUST_LOG` controls
//! log verbosity.

use anyhow::{bail, Context};
use std::path::Path;

use sketchport::{detect_format, export, import, ExportOptions, ImportConfiguration, TargetFormat};

fn init_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn detect(input: &Path) -> anyhow::Result<()> {
    let content = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let detection = detect_format(&content, Some(&file_name(input)));
    println!("{}", serde_json::to_string_pretty(&detection)?);
    Ok(())
}

fn convert(input: &Path, output: &Path, report_path: Option<&Path>) -> anyhow::Result<()> {
    let target = TargetFormat::from_file_name(&file_name(output))
        .with_context(|| format!("no export format for {}", output.display()))?;
    let content = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;

    let result = import(&content, &file_name(input), &ImportConfiguration::default())?;
    let report = &result.report;
    eprintln!(
        "{}: {} converted, {} skipped ({}%)",
        report.file_name, report.total_converted, report.total_skipped, report.conversion_rate
    );
    for item in &report.items {
        eprintln!("  [{:?}] {}", item.severity, item.message);
    }

    let mut options = ExportOptions::default();
    if let Some(stem) = output.file_stem() {
        options.file_stem = stem.to_string_lossy().into_owned();
    }
    let payload = export(&result.plan, target, &options)?;
    std::fs::write(output, &payload.data)
        .with_context(|| format!("writing {}", output.display()))?;
    if let Some(companion) = &payload.companion {
        let library = output.with_extension("mtl");
        std::fs::write(&library, companion)
            .with_context(|| format!("writing {}", library.display()))?;
    }

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [flag, input] if flag == "--detect" => detect(Path::new(input)),
        [input, output] => convert(Path::new(input), Path::new(output), None),
        [input, output, flag, report] if flag == "--report" => {
            convert(Path::new(input), Path::new(output), Some(Path::new(report)))
        }
        _ => bail!(
            "usage: sketch_convert --detect <file>\n       sketch_convert <input> <output> [--report <report.json>]"
        ),
    }
}
