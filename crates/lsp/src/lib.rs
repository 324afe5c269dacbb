pub mod capabilities;
pub mod commands;
pub mod diagnostics;
pub mod documents;
pub mod oracle;
pub mod util;

use crate::documents::OpenDocuments;
use alphabeta_api::HoverOracle;
use alphabeta_core::{AnnotationConfig, AnnotationEngine};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

pub use oracle::{ClientError, LspHoverOracle, RpcClient};

/// Language server that paints lifecycle annotations in the connected editor.
pub struct AlphabetaServer {
    client: Client,
    engine: Arc<AnnotationEngine>,
    documents: Arc<OpenDocuments>,
    cancel_token: CancellationToken,
}

impl AlphabetaServer {
    pub fn new(client: Client, oracle: Arc<dyn HoverOracle>, config: AnnotationConfig) -> Self {
        let documents = Arc::new(OpenDocuments::new(Some(client.clone())));
        let engine = Arc::new(
            AnnotationEngine::builder(documents.clone(), oracle)
                .with_config(config)
                .build(),
        );
        let cancel_token = CancellationToken::new();

        let (tx, rx) = mpsc::unbounded_channel();
        engine.subscribe(move |index| Ok(tx.send(index)?));
        diagnostics::spawn_publisher(client.clone(), documents.clone(), rx, cancel_token.clone());

        Self {
            client,
            engine,
            documents,
            cancel_token,
        }
    }

    pub fn engine(&self) -> &Arc<AnnotationEngine> {
        &self.engine
    }

    async fn apply_settings(&self, settings: &Value) {
        match AnnotationConfig::from_settings(settings) {
            Ok(config) => self.engine.update_config(config),
            Err(e) => {
                self.client
                    .log_message(MessageType::WARNING, format!("Ignoring settings: {}", e))
                    .await
            }
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for AlphabetaServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = params.initialization_options.as_ref() {
            self.apply_settings(options).await;
        }

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "alphabeta".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: capabilities::server_capabilities(),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.engine.start();
        self.client
            .log_message(MessageType::INFO, "alphabeta annotation engine started")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.engine.shutdown().await;
        self.cancel_token.cancel();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        if self
            .documents
            .open(&document.uri, document.text, document.version)
            .is_none()
        {
            tracing::debug!(uri = %document.uri, "ignoring non-file document");
            return;
        }
        self.engine.trigger_rescan();
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(path) = util::uri_to_path(&params.text_document.uri) else {
            return;
        };
        let Some(current) = self.documents.get(&path) else {
            return;
        };
        let next = util::apply_changes(&current, &params.content_changes, params.text_document.version);
        self.documents.update(&path, next);
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if let (Some(text), Some(path)) = (params.text, util::uri_to_path(&params.text_document.uri)) {
            if let Some(current) = self.documents.get(&path) {
                self.documents.update(
                    &path,
                    alphabeta_api::Document::new(path.clone(), text, current.version()),
                );
            }
        }
        self.engine.trigger_rescan();
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(path) = self.documents.close(&uri) {
            self.engine.document_closed(path);
        }
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.apply_settings(&params.settings).await;
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        self.client
            .log_message(
                MessageType::LOG,
                format!("LSP Request: workspace/executeCommand {}", params.command),
            )
            .await;
        commands::execute(&self.engine, &params.command, &params.arguments).await
    }
}

impl Drop for AlphabetaServer {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Serve LSP on stdio until the client disconnects.
pub async fn run_server(
    oracle: Arc<dyn HoverOracle>,
    config: AnnotationConfig,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        tower_lsp::LspService::new(move |client| AlphabetaServer::new(client, oracle.clone(), config.clone()));
    tower_lsp::Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
