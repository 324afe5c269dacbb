//! Minimal JSON-RPC client for a downstream language server.
//!
//! One task owns the writer and drains an outbound queue, so messages go out in
//! the order they were queued. Another owns the reader and routes responses to
//! waiting requests by id.

use super::error::{ClientError, Result};
use super::transport::{read_message, write_message};
use dashmap::DashMap;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

type Pending = Arc<DashMap<i64, oneshot::Sender<Result<Value>>>>;

pub struct RpcClient {
    outbound: mpsc::UnboundedSender<Value>,
    pending: Pending,
    next_id: AtomicI64,
    closed: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl RpcClient {
    pub fn connect<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let pending: Pending = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        tokio::spawn(write_loop(writer, outbound_rx, cancel.clone()));
        tokio::spawn(read_loop(
            BufReader::new(reader),
            pending.clone(),
            outbound.clone(),
            closed.clone(),
            cancel.clone(),
        ));

        Self {
            outbound,
            pending,
            next_id: AtomicI64::new(1),
            closed,
            cancel,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn notify(&self, method: &str, params: Value) -> Result<()> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        self.outbound
            .send(json!({ "jsonrpc": "2.0", "method": method, "params": params }))
            .map_err(|_| ClientError::Closed)
    }

    /// Send a request and wait for its result. On timeout the request is
    /// cancelled with `$/cancelRequest`.
    pub async fn request(&self, method: &str, params: Value, timeout: Duration) -> Result<Value> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let message = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        if self.outbound.send(message).is_err() {
            self.pending.remove(&id);
            return Err(ClientError::Closed);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => {
                self.pending.remove(&id);
                let _ = self.notify("$/cancelRequest", json!({ "id": id }));
                Err(ClientError::Timeout {
                    method: method.to_string(),
                    timeout,
                })
            }
        }
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn write_loop<W>(mut writer: W, mut outbound: mpsc::UnboundedReceiver<Value>, cancel: CancellationToken)
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            message = outbound.recv() => {
                let Some(message) = message else { break };
                if let Err(e) = write_message(&mut writer, &message).await {
                    tracing::error!("write to language server failed: {}", e);
                    break;
                }
            }
        }
    }
}

async fn read_loop<R>(
    mut reader: BufReader<R>,
    pending: Pending,
    outbound: mpsc::UnboundedSender<Value>,
    closed: Arc<AtomicBool>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = read_message(&mut reader) => message,
        };
        match message {
            Ok(Some(message)) => handle_inbound(message, &pending, &outbound),
            Ok(None) => {
                tracing::info!("language server closed its output");
                break;
            }
            Err(e) => {
                tracing::error!("read from language server failed: {}", e);
                break;
            }
        }
    }

    closed.store(true, Ordering::Release);
    let ids: Vec<i64> = pending.iter().map(|entry| *entry.key()).collect();
    for id in ids {
        if let Some((_, tx)) = pending.remove(&id) {
            let _ = tx.send(Err(ClientError::Closed));
        }
    }
}

fn handle_inbound(message: Value, pending: &Pending, outbound: &mpsc::UnboundedSender<Value>) {
    let method = message.get("method").and_then(Value::as_str);
    let id = message.get("id");

    match (method, id) {
        // Response to one of our requests
        (None, Some(id)) => {
            let Some(id) = id.as_i64() else {
                tracing::warn!("response with foreign id {}", id);
                return;
            };
            let Some((_, tx)) = pending.remove(&id) else {
                tracing::trace!(id, "response for abandoned request");
                return;
            };
            let result = match message.get("error") {
                Some(error) => Err(ClientError::Server {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                }),
                None => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
            };
            let _ = tx.send(result);
        }
        // Server → client request; we expose no client features, so answer with nulls.
        (Some(method), Some(id)) => {
            let result = match method {
                "workspace/configuration" => {
                    let items = message
                        .pointer("/params/items")
                        .and_then(Value::as_array)
                        .map(Vec::len)
                        .unwrap_or(0);
                    Value::Array(vec![Value::Null; items])
                }
                _ => Value::Null,
            };
            tracing::trace!(method, "answering server request");
            let _ = outbound.send(json!({ "jsonrpc": "2.0", "id": id, "result": result }));
        }
        (Some(method), None) => {
            if method == "window/logMessage" {
                if let Some(text) = message.pointer("/params/message").and_then(Value::as_str) {
                    tracing::debug!(target: "alphabeta_lsp::downstream", "{}", text);
                }
            } else {
                tracing::trace!(method, "ignoring notification");
            }
        }
        (None, None) => tracing::warn!("malformed message from language server"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

    struct FakeServer {
        reader: BufReader<ReadHalf<DuplexStream>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl FakeServer {
        async fn recv(&mut self) -> Value {
            read_message(&mut self.reader).await.unwrap().unwrap()
        }

        async fn send(&mut self, message: Value) {
            write_message(&mut self.writer, &message).await.unwrap();
        }
    }

    fn pair() -> (RpcClient, FakeServer) {
        let (ours, theirs) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(ours);
        let (server_reader, server_writer) = tokio::io::split(theirs);
        (
            RpcClient::connect(reader, writer),
            FakeServer {
                reader: BufReader::new(server_reader),
                writer: server_writer,
            },
        )
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn responses_are_routed_by_id() {
        let (client, mut server) = pair();

        let server_task = tokio::spawn(async move {
            let first = server.recv().await;
            let second = server.recv().await;
            // Answer out of order
            server.send(json!({"jsonrpc": "2.0", "id": second["id"], "result": "two"})).await;
            server.send(json!({"jsonrpc": "2.0", "id": first["id"], "result": "one"})).await;
            server
        });

        let (a, b) = tokio::join!(
            client.request("a", json!({}), WAIT),
            client.request("b", json!({}), WAIT)
        );
        assert_eq!(a.unwrap(), json!("one"));
        assert_eq!(b.unwrap(), json!("two"));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn server_errors_surface_as_errors() {
        let (client, mut server) = pair();
        tokio::spawn(async move {
            let request = server.recv().await;
            server
                .send(json!({"jsonrpc": "2.0", "id": request["id"], "error": {"code": -32601, "message": "nope"}}))
                .await;
            server
        });

        let err = client.request("unknown", json!(null), WAIT).await.unwrap_err();
        assert!(matches!(err, ClientError::Server { code: -32601, .. }));
    }

    #[tokio::test]
    async fn server_requests_are_answered() {
        let (client, mut server) = pair();
        server
            .send(json!({"jsonrpc": "2.0", "id": 99, "method": "workspace/configuration", "params": {"items": [{}, {}]}}))
            .await;

        let reply = server.recv().await;
        assert_eq!(reply["id"], 99);
        assert_eq!(reply["result"], json!([null, null]));
        drop(client);
    }

    #[tokio::test]
    async fn eof_fails_pending_requests() {
        let (client, mut server) = pair();
        tokio::spawn(async move {
            let _ = server.recv().await;
            drop(server);
        });

        let err = client.request("hover", json!({}), WAIT).await.unwrap_err();
        assert!(matches!(err, ClientError::Closed));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(client.is_closed());
        assert!(matches!(client.notify("x", json!(null)), Err(ClientError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_requests_time_out_and_are_cancelled() {
        let (client, mut server) = pair();
        let server_task = tokio::spawn(async move {
            let request = server.recv().await;
            let cancel = server.recv().await;
            (request, cancel)
        });

        let err = client
            .request("textDocument/hover", json!({}), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout { .. }));

        let (request, cancel) = server_task.await.unwrap();
        assert_eq!(cancel["method"], "$/cancelRequest");
        assert_eq!(cancel["params"]["id"], request["id"]);
    }
}
