//! `workspace/executeCommand` handlers.

use crate::util;
use alphabeta_api::Range;
use alphabeta_core::AnnotationEngine;
use alphabeta_core::presentation::{AnnotationTree, DecorationPlan, StatusCounter};
use serde_json::{Value, json};
use std::path::PathBuf;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::Url;

pub const NAVIGATE: &str = "alphabeta.navigate";
pub const SHOW_PRERELEASE_COUNT: &str = "alphabeta.showPrereleaseCount";
pub const ANNOTATION_TREE: &str = "alphabeta.annotationTree";
pub const DECORATIONS: &str = "alphabeta.decorations";

pub const ALL: &[&str] = &[NAVIGATE, SHOW_PRERELEASE_COUNT, ANNOTATION_TREE, DECORATIONS];

pub async fn execute(engine: &AnnotationEngine, command: &str, arguments: &[Value]) -> Result<Option<Value>> {
    match command {
        NAVIGATE => {
            let path = path_arg(arguments, 0)?.ok_or_else(|| Error::invalid_params("missing document uri"))?;
            let range: tower_lsp::lsp_types::Range = arguments
                .get(1)
                .cloned()
                .ok_or_else(|| Error::invalid_params("missing range"))
                .and_then(|v| serde_json::from_value(v).map_err(|e| Error::invalid_params(e.to_string())))?;
            let range: Range = util::from_lsp_range(range);
            engine.navigate_to(&path, range).await;
            Ok(None)
        }
        SHOW_PRERELEASE_COUNT => {
            let path = path_arg(arguments, 0)?.ok_or_else(|| Error::invalid_params("missing document uri"))?;
            let counter = StatusCounter::for_file(&engine.current_index(), &path, &engine.config());
            Ok(Some(json!({
                "count": counter.count,
                "visible": counter.visible,
                "text": counter.text(),
            })))
        }
        ANNOTATION_TREE => {
            let index = engine.current_index();
            let tree = match path_arg(arguments, 0)? {
                Some(path) => AnnotationTree::for_file(&index, &path),
                None => AnnotationTree::for_index(&index),
            };
            serde_json::to_value(tree)
                .map(Some)
                .map_err(|e| Error::invalid_params(e.to_string()))
        }
        DECORATIONS => {
            let path = path_arg(arguments, 0)?.ok_or_else(|| Error::invalid_params("missing document uri"))?;
            let plan = DecorationPlan::for_file(&engine.current_index(), &path, &engine.config());
            Ok(Some(decorations_json(&plan)))
        }
        other => Err(Error::invalid_params(format!("unknown command '{}'", other))),
    }
}

/// One entry per phase with LSP ranges, so clients can paint without converting.
fn decorations_json(plan: &DecorationPlan) -> Value {
    Value::Array(
        plan.layers
            .iter()
            .map(|(phase, style, ranges)| {
                json!({
                    "phase": phase,
                    "style": style,
                    "ranges": ranges.iter().map(|r| util::to_lsp_range(*r)).collect::<Vec<_>>(),
                })
            })
            .collect(),
    )
}

fn path_arg(arguments: &[Value], index: usize) -> Result<Option<PathBuf>> {
    let Some(value) = arguments.get(index).filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let uri = value
        .as_str()
        .and_then(|s| Url::parse(s).ok())
        .ok_or_else(|| Error::invalid_params(format!("argument {} is not a uri", index)))?;
    util::uri_to_path(&uri)
        .map(Some)
        .ok_or_else(|| Error::invalid_params(format!("not a file uri: {}", uri)))
}
