//! Annotations rendered as LSP diagnostics.

use crate::documents::OpenDocuments;
use crate::util;
use alphabeta_api::{AnnotatedRange, AnnotationIndex, Phase};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_lsp::Client;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, DiagnosticTag, NumberOrString, Url};

pub const SOURCE: &str = "alphabeta";

pub fn to_diagnostic(annotated: &AnnotatedRange) -> Diagnostic {
    let (severity, tags) = match annotated.phase {
        Phase::Internal => (DiagnosticSeverity::WARNING, None),
        Phase::Alpha | Phase::Beta => (DiagnosticSeverity::INFORMATION, None),
        Phase::Deprecated => (DiagnosticSeverity::HINT, Some(vec![DiagnosticTag::DEPRECATED])),
    };
    Diagnostic {
        range: util::to_lsp_range(annotated.range),
        severity: Some(severity),
        code: Some(NumberOrString::String(annotated.phase.as_str().to_string())),
        source: Some(SOURCE.to_string()),
        message: format!("'{}' is marked @{}", annotated.name, annotated.phase),
        tags,
        ..Default::default()
    }
}

/// Diagnostics to publish for every file that is open or was published before.
/// Files that dropped out of the index get an empty list.
pub fn plan(
    index: &AnnotationIndex,
    documents: &OpenDocuments,
    previously: &HashSet<PathBuf>,
) -> Vec<(PathBuf, Vec<Diagnostic>)> {
    let mut paths: Vec<PathBuf> = index
        .paths()
        .filter(|p| documents.contains(p))
        .cloned()
        .collect();
    paths.extend(previously.iter().filter(|p| !index.contains(p)).cloned());
    paths.sort();
    paths.dedup();

    paths
        .into_iter()
        .map(|path| {
            let diagnostics = index
                .get(&path)
                .map(|set| set.annotations().map(to_diagnostic).collect())
                .unwrap_or_default();
            (path, diagnostics)
        })
        .collect()
}

/// Forward index snapshots to the editor until cancelled.
pub fn spawn_publisher(
    client: Client,
    documents: Arc<OpenDocuments>,
    mut snapshots: mpsc::UnboundedReceiver<Arc<AnnotationIndex>>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let mut published: HashSet<PathBuf> = HashSet::new();
        loop {
            let mut index = tokio::select! {
                _ = cancel.cancelled() => break,
                index = snapshots.recv() => match index {
                    Some(index) => index,
                    None => break,
                },
            };
            // Only the newest snapshot matters
            while let Ok(newer) = snapshots.try_recv() {
                index = newer;
            }

            for (path, diagnostics) in plan(&index, &documents, &published) {
                let Ok(uri) = Url::from_file_path(&path) else {
                    continue;
                };
                if diagnostics.is_empty() {
                    published.remove(&path);
                } else {
                    published.insert(path);
                }
                client.publish_diagnostics(uri, diagnostics, None).await;
            }
        }
        tracing::debug!("diagnostics publisher stopped");
    });
}
