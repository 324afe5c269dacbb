use crate::args::EngineArgs;
use crate::disk::DiskDocuments;
use crate::view::{self, OutputFormat};
use alphabeta_core::AnnotationEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub async fn run(files: Vec<PathBuf>, args: EngineArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.annotation_config()?;
    let host = Arc::new(DiskDocuments::new(files)?);
    let root = std::env::current_dir()?;
    let oracles = args.spawn_oracles(&root).await?;

    let engine = AnnotationEngine::builder(host.clone(), oracles.combined.clone())
        .with_config(config)
        .build();

    info!("Scanning {} files...", host.files().len());
    let report = engine.scan_once().await;
    info!(
        "Scan complete: {} published, {} failed, {} annotations",
        report.published, report.failed, report.annotations
    );

    println!("{}", view::render(&engine.current_index(), &root, format)?);
    oracles.shutdown().await;

    if report.failed > 0 && report.published == 0 {
        return Err(format!("all {} files failed to scan", report.failed).into());
    }
    Ok(())
}
