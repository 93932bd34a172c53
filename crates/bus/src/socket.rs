// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-delimited JSON transport over Unix sockets.
//!
//! Every service owns one socket at `<dir>/<service>.sock`. Inbound method
//! calls arrive as `{"id", "method", "payload", "caller", "callerPid"}`
//! lines; replies echo the caller's `id`. Outbound calls connect to the peer
//! service's socket and pump reply lines back onto the engine event channel.

use crate::client::{parse_uri, BusClient, BusError, InboundRequest};
use crate::subscription::SubscriptionRegistry;
use async_trait::async_trait;
use parking_lot::Mutex;
use sam_core::{BusToken, Event};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const WATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct WireRequest {
    id: u64,
    method: String,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    caller: String,
    #[serde(default, rename = "callerPid")]
    caller_pid: String,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    id: u64,
    #[serde(default)]
    payload: Value,
}

struct SocketBusInner {
    socket_dir: PathBuf,
    service_name: Mutex<String>,
    categories: Mutex<HashMap<String, Vec<String>>>,
    next_token: AtomicU64,
    next_conn: AtomicU64,
    event_tx: mpsc::Sender<Event>,
    requests_tx: mpsc::Sender<InboundRequest>,
    subs: SubscriptionRegistry,
    /// Line writers for live inbound connections.
    conn_writers: Mutex<HashMap<u64, mpsc::UnboundedSender<String>>>,
    /// Inbound token → (connection, caller's message id).
    inbound: Mutex<HashMap<BusToken, (u64, u64)>>,
    /// Outbound token → reader task, aborted on cancel.
    outbound: Mutex<HashMap<BusToken, JoinHandle<()>>>,
}

/// Unix-socket implementation of [`BusClient`].
#[derive(Clone)]
pub struct SocketBus {
    inner: Arc<SocketBusInner>,
}

impl SocketBus {
    /// Create the bus client. The returned receiver yields inbound method
    /// calls for the service dispatcher.
    pub fn new(
        socket_dir: impl Into<PathBuf>,
        event_tx: mpsc::Sender<Event>,
    ) -> (Self, mpsc::Receiver<InboundRequest>) {
        let (requests_tx, requests_rx) = mpsc::channel(256);
        let bus = Self {
            inner: Arc::new(SocketBusInner {
                socket_dir: socket_dir.into(),
                service_name: Mutex::new(String::new()),
                categories: Mutex::new(HashMap::new()),
                next_token: AtomicU64::new(1),
                next_conn: AtomicU64::new(1),
                event_tx,
                requests_tx,
                subs: SubscriptionRegistry::new(),
                conn_writers: Mutex::new(HashMap::new()),
                inbound: Mutex::new(HashMap::new()),
                outbound: Mutex::new(HashMap::new()),
            }),
        };
        (bus, requests_rx)
    }

    fn alloc_token(&self) -> BusToken {
        BusToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed))
    }

    fn socket_path(&self, service: &str) -> PathBuf {
        self.inner.socket_dir.join(format!("{service}.sock"))
    }

    fn method_known(&self, method: &str) -> bool {
        let categories = self.inner.categories.lock();
        categories.iter().any(|(category, methods)| {
            method
                .strip_prefix(category.as_str())
                .and_then(|rest| rest.strip_prefix('/').or(Some(rest)))
                .is_some_and(|name| methods.iter().any(|m| m == name))
        })
    }

    /// Bind the service socket and accept connections until the task is
    /// dropped. Must be called after `register_service`.
    pub async fn serve(&self) -> Result<(), BusError> {
        let name = self.inner.service_name.lock().clone();
        if name.is_empty() {
            return Err(BusError::BadUri("service name not registered".to_string()));
        }
        let path = self.socket_path(&name);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        std::fs::create_dir_all(&self.inner.socket_dir)?;
        let listener = UnixListener::bind(&path)?;
        info!(socket = %path.display(), "bus socket listening");

        loop {
            let (stream, _) = listener.accept().await?;
            let conn_id = self.inner.next_conn.fetch_add(1, Ordering::Relaxed);
            let bus = self.clone();
            tokio::spawn(async move {
                bus.handle_connection(conn_id, stream).await;
            });
        }
    }

    async fn handle_connection(&self, conn_id: u64, stream: UnixStream) {
        let (read_half, mut write_half) = stream.into_split();
        let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<String>();
        self.inner.conn_writers.lock().insert(conn_id, writer_tx);

        let writer_task = tokio::spawn(async move {
            while let Some(line) = writer_rx.recv().await {
                if write_half.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if write_half.write_all(b"\n").await.is_err() {
                    break;
                }
            }
        });

        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => self.handle_inbound_line(conn_id, &line).await,
                Ok(None) => break,
                Err(e) => {
                    debug!(conn_id, error = %e, "inbound read failed");
                    break;
                }
            }
        }

        // Connection gone: drop its writer and every token it owned.
        self.inner.conn_writers.lock().remove(&conn_id);
        let dead_tokens: Vec<BusToken> = {
            let mut inbound = self.inner.inbound.lock();
            let dead: Vec<BusToken> =
                inbound.iter().filter(|(_, (c, _))| *c == conn_id).map(|(t, _)| *t).collect();
            for token in &dead {
                inbound.remove(token);
            }
            dead
        };
        for token in dead_tokens {
            self.inner.subs.remove_everywhere(token);
        }
        writer_task.abort();
        debug!(conn_id, "bus connection closed");
    }

    async fn handle_inbound_line(&self, conn_id: u64, line: &str) {
        let request: WireRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(conn_id, error = %e, "dropping malformed bus message");
                return;
            }
        };

        let token = self.alloc_token();
        self.inner.inbound.lock().insert(token, (conn_id, request.id));

        if !self.method_known(&request.method) {
            let payload = json!({
                "returnValue": false,
                "errorCode": -1,
                "errorText": format!("Unknown method \"{}\"", request.method),
            });
            if let Err(e) = self.respond(token, payload).await {
                debug!(conn_id, error = %e, "unknown-method reply failed");
            }
            return;
        }

        let inbound = InboundRequest {
            method: request.method,
            payload: request.payload,
            token,
            caller_id: request.caller,
            caller_pid: request.caller_pid,
        };
        if self.inner.requests_tx.send(inbound).await.is_err() {
            error!("request dispatcher is gone; dropping inbound call");
        }
    }

    fn write_to_token(&self, token: BusToken, payload: &Value) -> Result<(), BusError> {
        let (conn_id, msg_id) = {
            let inbound = self.inner.inbound.lock();
            match inbound.get(&token) {
                Some(entry) => *entry,
                None => return Err(BusError::UnknownToken(token)),
            }
        };
        let line = serde_json::to_string(&json!({ "id": msg_id, "payload": payload }))?;
        let writers = self.inner.conn_writers.lock();
        match writers.get(&conn_id) {
            Some(writer) if writer.send(line).is_ok() => Ok(()),
            _ => Err(BusError::UnknownToken(token)),
        }
    }

    async fn open_call(
        &self,
        uri: &str,
        payload: Value,
        multi: bool,
    ) -> Result<BusToken, BusError> {
        let (service, method) = parse_uri(uri)?;
        let path = self.socket_path(service);
        let mut stream = UnixStream::connect(&path)
            .await
            .map_err(|_| BusError::ServiceUnreachable(service.to_string()))?;

        let token = self.alloc_token();
        let line = serde_json::to_string(&json!({
            "id": token.0,
            "method": method,
            "payload": payload,
            "caller": self.inner.service_name.lock().clone(),
        }))?;
        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\n").await?;

        let event_tx = self.inner.event_tx.clone();
        let inner = Arc::clone(&self.inner);
        let reader_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    _ => break,
                };
                let payload = match serde_json::from_str::<WireReply>(&line) {
                    Ok(reply) => reply.payload,
                    Err(e) => {
                        warn!(token = token.0, error = %e, "malformed bus reply");
                        continue;
                    }
                };
                if event_tx.send(Event::BusReply { token, payload }).await.is_err() {
                    break;
                }
                if !multi {
                    break;
                }
            }
            inner.outbound.lock().remove(&token);
        });
        self.inner.outbound.lock().insert(token, reader_task);
        Ok(token)
    }
}

#[async_trait]
impl BusClient for SocketBus {
    async fn register_service(&self, name: &str, compat_names: &[String]) -> Result<(), BusError> {
        *self.inner.service_name.lock() = name.to_string();
        if !compat_names.is_empty() {
            debug!(name, compat = ?compat_names, "service registered with compat names");
        }
        Ok(())
    }

    async fn register_category(&self, category: &str, methods: &[String]) -> Result<(), BusError> {
        self.inner.categories.lock().insert(category.to_string(), methods.to_vec());
        Ok(())
    }

    async fn call_one_reply(&self, uri: &str, payload: Value) -> Result<BusToken, BusError> {
        self.open_call(uri, payload, false).await
    }

    async fn call_multi_reply(&self, uri: &str, payload: Value) -> Result<BusToken, BusError> {
        self.open_call(uri, payload, true).await
    }

    async fn cancel(&self, token: BusToken) -> Result<(), BusError> {
        if let Some(task) = self.inner.outbound.lock().remove(&token) {
            task.abort();
        }
        Ok(())
    }

    async fn respond(&self, token: BusToken, payload: Value) -> Result<(), BusError> {
        self.write_to_token(token, &payload)
    }

    fn subscription_add(&self, key: &str, token: BusToken) -> bool {
        if !self.inner.inbound.lock().contains_key(&token) {
            return false;
        }
        self.inner.subs.add(key, token);
        true
    }

    fn subscriber_count(&self, key: &str) -> usize {
        self.inner.subs.count(key)
    }

    fn subscription_reply(&self, key: &str, payload: Value) {
        for token in self.inner.subs.subscribers(key) {
            if let Err(e) = self.write_to_token(token, &payload) {
                warn!(key, token = token.0, error = %e, "subscriber gone, dropping");
                self.inner.subs.remove(key, token);
            }
        }
    }

    async fn watch_server_status(&self, service: &str) -> Result<(), BusError> {
        let path = self.socket_path(service);
        let service = service.to_string();
        let event_tx = self.inner.event_tx.clone();
        tokio::spawn(async move {
            let mut last: Option<bool> = None;
            loop {
                let connected = UnixStream::connect(&path).await.is_ok();
                if last != Some(connected) {
                    last = Some(connected);
                    let event =
                        Event::ServiceStatus { service: service.clone(), connected };
                    if event_tx.send(event).await.is_err() {
                        break;
                    }
                }
                tokio::time::sleep(WATCH_POLL_INTERVAL).await;
            }
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
