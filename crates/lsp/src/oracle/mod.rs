//! Hover oracle backed by an external language server.

pub mod client;
pub mod error;
pub mod transport;

pub use client::RpcClient;
pub use error::ClientError;

use crate::util;
use alphabeta_api::{ApiError, ApiResult, Document, HoverContent, HoverOracle, Position, SourceKind};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tower_lsp::lsp_types::{
    ClientCapabilities, DidChangeTextDocumentParams, DidOpenTextDocumentParams, Hover,
    HoverClientCapabilities, HoverContents, HoverParams, InitializeParams, MarkedString, MarkupKind,
    TextDocumentClientCapabilities, TextDocumentContentChangeEvent, TextDocumentIdentifier,
    TextDocumentItem, TextDocumentPositionParams, TextDocumentSyncClientCapabilities, Url,
    VersionedTextDocumentIdentifier, WorkspaceFolder,
};

pub const DEFAULT_HOVER_TIMEOUT: Duration = Duration::from_secs(5);
const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct LspHoverOracle {
    name: String,
    client: RpcClient,
    hover_timeout: Duration,
    /// Last version sent for each open document.
    synced: DashMap<PathBuf, i32>,
    _child: Option<Child>,
}

impl LspHoverOracle {
    /// Spawn `command` (program plus arguments) and complete the LSP handshake.
    pub async fn spawn(command: &[String], root: Option<&Path>, hover_timeout: Duration) -> Result<Self, ClientError> {
        let (program, args) = command.split_first().ok_or_else(|| ClientError::Spawn {
            command: String::new(),
            reason: "empty command".into(),
        })?;
        let command_line = command.join(" ");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClientError::Spawn {
                command: command_line.clone(),
                reason: e.to_string(),
            })?;

        let missing = |stream: &str| ClientError::Spawn {
            command: command_line.clone(),
            reason: format!("{} not captured", stream),
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        if let Some(stderr) = child.stderr.take() {
            let name = program.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(server = %name, "stderr: {}", line);
                }
            });
        }

        let mut oracle = Self::new(program.clone(), RpcClient::connect(stdout, stdin), hover_timeout);
        oracle._child = Some(child);
        oracle.initialize(root).await?;
        tracing::info!(server = %command_line, "language server ready");
        Ok(oracle)
    }

    /// Wrap an already connected client. Call [`Self::initialize`] before hovering.
    pub fn new(name: impl Into<String>, client: RpcClient, hover_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            client,
            hover_timeout,
            synced: DashMap::new(),
            _child: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn initialize(&self, root: Option<&Path>) -> Result<(), ClientError> {
        let root_uri = root.and_then(|r| Url::from_directory_path(r).ok());
        let workspace_folders = root_uri.clone().map(|uri| {
            vec![WorkspaceFolder {
                name: root
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "workspace".into()),
                uri,
            }]
        });

        #[allow(deprecated)]
        let params = InitializeParams {
            process_id: Some(std::process::id()),
            root_uri,
            workspace_folders,
            capabilities: ClientCapabilities {
                text_document: Some(TextDocumentClientCapabilities {
                    synchronization: Some(TextDocumentSyncClientCapabilities::default()),
                    hover: Some(HoverClientCapabilities {
                        dynamic_registration: Some(false),
                        content_format: Some(vec![MarkupKind::Markdown, MarkupKind::PlainText]),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        self.client
            .request("initialize", serde_json::to_value(params)?, INITIALIZE_TIMEOUT)
            .await?;
        self.client.notify("initialized", json!({}))
    }

    /// Polite shutdown; the process is killed on drop regardless.
    pub async fn shutdown(&self) {
        if self.client.is_closed() {
            return;
        }
        if let Err(e) = self.client.request("shutdown", Value::Null, self.hover_timeout).await {
            tracing::debug!(server = %self.name, "shutdown request failed: {}", e);
        }
        let _ = self.client.notify("exit", Value::Null);
    }

    /// Make sure the server has seen this version of the document.
    fn sync(&self, document: &Document, uri: &Url) -> Result<(), ClientError> {
        match self.synced.entry(document.path().to_path_buf()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() == document.version() {
                    return Ok(());
                }
                entry.insert(document.version());
                let params = DidChangeTextDocumentParams {
                    text_document: VersionedTextDocumentIdentifier::new(uri.clone(), document.version()),
                    content_changes: vec![TextDocumentContentChangeEvent {
                        range: None,
                        range_length: None,
                        text: document.text().to_string(),
                    }],
                };
                self.client
                    .notify("textDocument/didChange", serde_json::to_value(params)?)
            }
            Entry::Vacant(entry) => {
                entry.insert(document.version());
                let params = DidOpenTextDocumentParams {
                    text_document: TextDocumentItem::new(
                        uri.clone(),
                        SourceKind::language_id(document.path()).to_string(),
                        document.version(),
                        document.text().to_string(),
                    ),
                };
                self.client
                    .notify("textDocument/didOpen", serde_json::to_value(params)?)
            }
        }
    }

    async fn request_hover(&self, document: &Document, position: Position) -> Result<Vec<HoverContent>, ClientError> {
        let uri = Url::from_file_path(document.path())
            .map_err(|_| ClientError::Protocol(format!("not an absolute path: {}", document.path().display())))?;
        self.sync(document, &uri)?;

        let params = HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier::new(uri),
                position: util::to_lsp_position(position),
            },
            work_done_progress_params: Default::default(),
        };
        let result = self
            .client
            .request("textDocument/hover", serde_json::to_value(params)?, self.hover_timeout)
            .await?;

        if result.is_null() {
            return Ok(Vec::new());
        }
        let hover: Hover = serde_json::from_value(result)?;
        Ok(vec![hover_content(hover)])
    }
}

#[async_trait]
impl HoverOracle for LspHoverOracle {
    async fn hover(&self, document: &Document, position: Position) -> ApiResult<Vec<HoverContent>> {
        self.request_hover(document, position).await.map_err(ApiError::from)
    }
}

/// Flatten an LSP hover into plain content blocks.
pub fn hover_content(hover: Hover) -> HoverContent {
    let contents = match hover.contents {
        HoverContents::Scalar(marked) => vec![marked_text(marked)],
        HoverContents::Array(marked) => marked.into_iter().map(marked_text).collect(),
        HoverContents::Markup(markup) => vec![markup.value],
    };
    HoverContent::new(contents, hover.range.map(util::from_lsp_range))
}

fn marked_text(marked: MarkedString) -> String {
    match marked {
        MarkedString::String(text) => text,
        MarkedString::LanguageString(block) => block.value,
    }
}
