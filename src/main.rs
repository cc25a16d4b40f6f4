//! # poster-engine CLI
//!
//! Renders one template against one or more data files into a PDF.
//!
//! ```bash
//! poster-engine --template promo.json --data item1.json --data item2.json --out promo.pdf
//! RUST_LOG=debug poster-engine --template promo.json --data item.json --mode preview
//! ```

use clap::Parser;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use poster_engine::{
    pdf, render, DataContext, DefaultAssetLoader, Diagnostic, DiagnosticKind, Diagnostics, Document,
    EngineConfig, EngineError, RenderMode, Template,
};

/// Render poster templates to PDF
#[derive(Parser, Debug)]
#[command(name = "poster-engine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Template JSON file
    #[arg(long, value_name = "FILE")]
    template: PathBuf,

    /// Data context JSON file; one page is rendered per file
    #[arg(long, value_name = "FILE", required = true)]
    data: Vec<PathBuf>,

    /// Engine configuration JSON file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Text policy: print (static) or preview (autofit)
    #[arg(long, value_parser = ["print", "preview"])]
    mode: Option<String>,

    /// Output PDF path
    #[arg(long, value_name = "FILE", default_value = "poster.pdf")]
    out: PathBuf,

    /// Write collected diagnostics as JSON
    #[arg(long, value_name = "FILE")]
    diagnostics: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| EngineError::Usage(format!("{}: {}", path.display(), e)))
}

fn run() -> Result<(), EngineError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    match cli.mode.as_deref() {
        Some("preview") => config.mode = RenderMode::Preview,
        Some("print") => config.mode = RenderMode::Print,
        _ => {}
    }

    let template: Template = read_json(&cli.template)?;
    let data = cli
        .data
        .iter()
        .map(|path| read_json::<DataContext>(path))
        .collect::<Result<Vec<_>, _>>()?;

    // Nothing is drawn unless every page can be.
    for context in &data {
        render::validate(&template, context, &config)?;
    }

    let loader = DefaultAssetLoader::new(Duration::from_millis(config.asset_timeout_ms));
    log::info!(
        "rendering {} page(s) from {}",
        data.len(),
        cli.template.display()
    );

    let results = data
        .par_iter()
        .enumerate()
        .map(|(index, context)| -> Result<_, EngineError> {
            let mut diag = Diagnostics::new();
            diag.set_page(index);
            let page = render::render_page(&template, context, &config, &loader, &mut diag)?;
            Ok((page, diag))
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    let mut document = Document::new();
    let mut diagnostics = Diagnostics::new();
    for (page, diag) in results {
        document.push(page);
        diagnostics.absorb(diag);
    }

    let title = template.id.as_deref().unwrap_or("poster");
    let bytes = pdf::write_pdf(&document, title)?;
    fs::write(&cli.out, &bytes)?;
    println!("Wrote {} page(s) to {} ({} bytes)", document.len(), cli.out.display(), bytes.len());

    print_summary(diagnostics.entries());
    if let Some(path) = &cli.diagnostics {
        fs::write(path, serde_json::to_string_pretty(diagnostics.entries())?)?;
    }
    Ok(())
}

fn print_summary(entries: &[Diagnostic]) {
    if entries.is_empty() {
        return;
    }
    println!("{} diagnostic(s):", entries.len());
    for kind in [
        DiagnosticKind::DataResolution,
        DiagnosticKind::Expression,
        DiagnosticKind::Asset,
        DiagnosticKind::Render,
    ] {
        let count = entries.iter().filter(|d| d.kind == kind).count();
        if count > 0 {
            println!("  {:<16} {}", kind.to_string(), count);
        }
    }
}
