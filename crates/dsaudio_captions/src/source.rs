// SPDX-License-Identifier: MIT OR Apache-2.0
//! Caption document sources and the asynchronous loader.
//!
//! A [`CueSource`] resolves a textual reference to a JSON value. The
//! [`CaptionLoader`] runs fetches on its own worker runtime and hands completed
//! results back tagged with the [`LoadTicket`] they were requested under, so
//! the scheduler can drop results that arrive after a newer request.

use crate::document::CaptionDocument;
use crate::error::{CaptionError, CaptionResult};
use crate::scheduler::LoadTicket;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Something that can fetch a caption document as JSON
pub trait CueSource: Send + Sync {
    /// Fetch the JSON value behind `reference`
    fn fetch_json<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, CaptionResult<serde_json::Value>>;
}

/// Derive the caption document reference for a media source by swapping the
/// media file's extension for `extension` (appending it when there is none).
pub fn caption_reference_for(media_src: &str, extension: &str) -> String {
    let name_start = media_src.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let stem = match media_src[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &media_src[..name_start + dot],
        _ => media_src,
    };
    format!("{stem}.{extension}")
}

/// Reads caption documents from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FileCueSource {
    root: Option<PathBuf>,
}

impl FileCueSource {
    /// Resolve references as given
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative references against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Path a reference resolves to
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference.strip_prefix("file://").unwrap_or(reference));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl CueSource for FileCueSource {
    fn fetch_json<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, CaptionResult<serde_json::Value>> {
        async move {
            let path = self.resolve(reference);
            let data = tokio::fs::read(&path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptionError::NotFound(path.display().to_string())
                } else {
                    CaptionError::Fetch(format!("{}: {}", path.display(), e))
                }
            })?;
            Ok(serde_json::from_slice(&data)?)
        }
        .boxed()
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: serde_json::Value,
    latency: Duration,
}

/// In-memory caption documents, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryCueSource {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl MemoryCueSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `value` for `reference`
    pub fn insert(&self, reference: impl Into<String>, value: serde_json::Value) {
        self.insert_delayed(reference, value, Duration::ZERO);
    }

    /// Serve `value` for `reference` after a simulated latency
    pub fn insert_delayed(
        &self,
        reference: impl Into<String>,
        value: serde_json::Value,
        latency: Duration,
    ) {
        self.entries
            .write()
            .insert(reference.into(), MemoryEntry { value, latency });
    }

    /// Stop serving `reference`
    pub fn remove(&self, reference: &str) -> bool {
        self.entries.write().remove(reference).is_some()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no document is stored
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CueSource for MemoryCueSource {
    fn fetch_json<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, CaptionResult<serde_json::Value>> {
        let entry = self.entries.read().get(reference).cloned();
        async move {
            let entry = entry.ok_or_else(|| CaptionError::NotFound(reference.to_string()))?;
            if !entry.latency.is_zero() {
                tokio::time::sleep(entry.latency).await;
            }
            Ok(entry.value)
        }
        .boxed()
    }
}

/// Fetches caption documents over HTTP
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpCueSource {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpCueSource {
    /// Create a source with a default client
    pub fn new() -> CaptionResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dsaudio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CaptionError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    /// Create a source around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
impl CueSource for HttpCueSource {
    fn fetch_json<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, CaptionResult<serde_json::Value>> {
        async move {
            tracing::debug!(url = %reference, "Fetching caption document");
            let response = self
                .client
                .get(reference)
                .send()
                .await
                .map_err(|e| CaptionError::Fetch(e.to_string()))?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(CaptionError::NotFound(reference.to_string()));
            }
            if !status.is_success() {
                return Err(CaptionError::Fetch(format!("{reference}: HTTP {status}")));
            }

            response
                .json()
                .await
                .map_err(|e| CaptionError::Malformed(e.to_string()))
        }
        .boxed()
    }
}

/// A finished fetch, tagged with the request it answers
#[derive(Debug)]
pub struct LoadOutcome {
    /// Ticket the fetch was requested under
    pub ticket: LoadTicket,
    /// Reference that was fetched
    pub reference: String,
    /// Parsed document, or why there is none
    pub result: CaptionResult<CaptionDocument>,
}

/// A fetch waiting to be picked up by the loader worker
#[derive(Debug)]
struct LoadRequest {
    ticket: LoadTicket,
    reference: String,
}

/// Runs caption fetches in the background.
///
/// Fetches run on a dedicated worker thread with its own tokio runtime, so
/// requests can be issued from any context, async or not.
pub struct CaptionLoader<S: CueSource + ?Sized> {
    source: Arc<S>,
    request_tx: Option<mpsc::UnboundedSender<LoadRequest>>,
    result_tx: mpsc::UnboundedSender<LoadOutcome>,
    result_rx: mpsc::UnboundedReceiver<LoadOutcome>,
    in_flight: usize,
}

impl<S: CueSource + ?Sized + 'static> CaptionLoader<S> {
    /// Create a loader fetching from `source`
    pub fn new(source: Arc<S>) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        let worker_source = Arc::clone(&source);
        let worker_tx = result_tx.clone();
        let spawned = std::thread::Builder::new()
            .name("caption-loader".to_string())
            .spawn(move || loader_worker(worker_source, request_rx, worker_tx));
        let request_tx = match spawned {
            Ok(_) => Some(request_tx),
            Err(err) => {
                tracing::warn!("Caption loader worker unavailable: {}", err);
                None
            }
        };

        Self {
            source,
            request_tx,
            result_tx,
            result_rx,
            in_flight: 0,
        }
    }

    /// Source documents are fetched from
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Start fetching `reference` on behalf of `ticket`.
    ///
    /// If the worker is gone the request completes at once with
    /// [`CaptionError::Fetch`].
    pub fn request(&mut self, ticket: LoadTicket, reference: impl Into<String>) {
        let reference = reference.into();
        self.in_flight += 1;
        tracing::debug!("Requesting caption document {} (load {})", reference, ticket.generation());

        let request = LoadRequest { ticket, reference };
        let unsent = match &self.request_tx {
            Some(tx) => tx.send(request).err().map(|e| e.0),
            None => Some(request),
        };
        if let Some(request) = unsent {
            // Receiver is owned by self, so this send cannot fail
            let _ = self.result_tx.send(LoadOutcome {
                ticket: request.ticket,
                result: Err(CaptionError::Fetch(format!(
                    "{}: caption loader worker is not running",
                    request.reference
                ))),
                reference: request.reference,
            });
        }
    }

    /// Take a finished fetch without waiting
    pub fn try_next(&mut self) -> Option<LoadOutcome> {
        let outcome = self.result_rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    /// Wait for the next finished fetch; `None` when nothing is in flight
    pub async fn next(&mut self) -> Option<LoadOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.result_rx.recv().await?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    /// Number of fetches not yet collected
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

/// Worker thread that processes caption fetch requests
fn loader_worker<S: CueSource + ?Sized + 'static>(
    source: Arc<S>,
    mut request_rx: mpsc::UnboundedReceiver<LoadRequest>,
    result_tx: mpsc::UnboundedSender<LoadOutcome>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            tracing::warn!("Failed to create caption loader runtime: {}", err);
            while let Some(request) = request_rx.blocking_recv() {
                let outcome = LoadOutcome {
                    ticket: request.ticket,
                    result: Err(CaptionError::Fetch(err.to_string())),
                    reference: request.reference,
                };
                if result_tx.send(outcome).is_err() {
                    break;
                }
            }
            return;
        }
    };

    rt.block_on(async {
        while let Some(LoadRequest { ticket, reference }) = request_rx.recv().await {
            let source = Arc::clone(&source);
            let result_tx = result_tx.clone();
            // Fetches overlap so a slow document never holds up a newer one
            tokio::spawn(async move {
                let result = source
                    .fetch_json(&reference)
                    .await
                    .and_then(CaptionDocument::from_value);
                // Receiver gone means the loader was dropped
                let _ = result_tx.send(LoadOutcome {
                    ticket,
                    reference,
                    result,
                });
            });
        }
    });
}
