//! Report Renderer
//!
//! Generates a report from a data directory and a request JSON.
//! Requests carrying a `payload` key take the ad-hoc path.
//!
//! The data directory holds:
//!   config.json                service settings (`pdf_font` names a TrueType file)
//!   descriptors.json           template descriptors
//!   layouts/<handle>.json      compiled layouts, one per locale variant
//!   images/<id>.png|.jpg       pre-loaded images (optional)
//!   messages_<locale>.properties  label catalogs (optional)
//!
//! Usage:
//!   cargo run --example render_report -- <data-dir> <request.json> [format] [output-dir]
//!
//! Examples:
//!   cargo run --example render_report -- demos/data demos/data/invoice_request.json
//!   cargo run --example render_report -- demos/data demos/data/adhoc_request.json csv
//!   RUST_LOG=debug cargo run --example render_report -- demos/data demos/data/invoice_request.json json

use anyhow::{bail, Context, Result};
use label_text::MessageCatalog;
use report_export::{ExportFormat, LayoutDispatcher};
use report_service::{AdHocRequest, BufferedResponse, ReportRequest, ReportingService, ServiceConfig};
use report_template::{InMemoryImageStore, InMemoryRepository};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Files in `dir` whose stem is a numeric id
fn numbered_files(dir: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse().ok());
        if let Some(id) = id {
            files.push((id, path));
        }
    }
    files.sort();
    Ok(files)
}

fn build_service(data_dir: &Path) -> Result<ReportingService> {
    let config = ServiceConfig::from_file(data_dir.join("config.json"))?;

    let repository = InMemoryRepository::from_file(data_dir.join("descriptors.json"))?;
    info!(reports = repository.len(), "Loaded descriptors");

    let mut dispatcher = LayoutDispatcher::new().with_title_parameter(&config.title_parameter);
    if let Some(font) = config.load_pdf_font(data_dir)? {
        info!(font = font.name(), "Embedding PDF font");
        dispatcher = dispatcher.with_font(font);
    }
    for (handle, path) in numbered_files(&data_dir.join("layouts"))? {
        dispatcher
            .register_file(handle, &path)
            .with_context(|| format!("loading layout {}", path.display()))?;
    }
    info!(layouts = dispatcher.len(), "Loaded layouts");

    let mut images = InMemoryImageStore::new();
    for (id, path) in numbered_files(&data_dir.join("images"))? {
        images.insert_file(id, &path)?;
    }

    let catalog = MessageCatalog::from_dir(data_dir, "messages")?;
    let gateway = config.translation_gateway()?;

    Ok(ReportingService::new(Arc::new(repository), Arc::new(images), Arc::new(dispatcher))
        .with_catalog(Arc::new(catalog))
        .with_gateway(gateway)
        .with_config(config))
}

fn run(args: &[String]) -> Result<()> {
    let data_dir = Path::new(&args[1]);
    let request_path = &args[2];
    let format: ExportFormat = match args.get(3) {
        Some(tag) => tag.parse()?,
        None => ExportFormat::Pdf,
    };
    let output_dir = PathBuf::from(args.get(4).map(String::as_str).unwrap_or("output"));

    let service = build_service(data_dir)?;

    let request_json = std::fs::read_to_string(request_path)
        .with_context(|| format!("reading {request_path}"))?;
    let request: serde_json::Value = serde_json::from_str(&request_json)?;

    let mut response = BufferedResponse::new();
    let file_name = if request.get("payload").is_some() {
        let request = AdHocRequest::from_json(&request_json)?;
        service.generate_adhoc_report(&request, format, &mut response)?
    } else {
        let request = ReportRequest::from_json(&request_json)?;
        service.generate_report(&request, format, &mut response)?
    };

    if response.body.is_empty() {
        bail!("renderer produced an empty document");
    }

    std::fs::create_dir_all(&output_dir)?;
    let output_path = output_dir.join(&file_name);
    std::fs::write(&output_path, &response.body)?;

    println!("Rendered {} ({} bytes)", output_path.display(), response.body.len());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <data-dir> <request.json> [format] [output-dir]",
            args[0]
        );
        eprintln!();
        eprintln!("Formats: PDF (default), CSV, JSON");
        std::process::exit(1);
    }

    if let Err(e) = run(&args) {
        error!(?e, "report generation failed");
        std::process::exit(1);
    }
}
