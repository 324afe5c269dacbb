use crate::args::EngineArgs;
use crate::disk::DiskDocuments;
use crate::view;
use alphabeta_core::AnnotationEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub async fn run(files: Vec<PathBuf>, args: EngineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.annotation_config()?;
    let interval = config.refresh_interval();
    let host = Arc::new(DiskDocuments::new(files)?);
    let root = std::env::current_dir()?;
    let oracles = args.spawn_oracles(&root).await?;

    let engine = AnnotationEngine::builder(host.clone(), oracles.combined.clone())
        .with_config(config)
        .build();

    let summary_root = root.clone();
    engine.subscribe(move |index| {
        println!("{}", view::summary(&index, &summary_root));
        Ok(())
    });

    engine.start();
    info!("Watching {} files every {:?}. Press Ctrl+C to stop.", host.files().len(), interval);

    tokio::signal::ctrl_c().await?;
    engine.shutdown().await;
    oracles.shutdown().await;
    info!("Watcher stopped.");
    Ok(())
}
