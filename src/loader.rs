//! Sources of seed records and the background loader used by the TUI.
//!
//! A [`UserSource`] yields the whole list in one fetch. [`BackgroundLoader`]
//! runs that fetch on the tokio runtime and hands the result back over a
//! channel so the event loop can apply it to the store between frames.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::LoadError;
use crate::store::{LoadOutcome, LoadTicket, User, UserStore};

pub type FetchResult = Result<Option<Vec<User>>, LoadError>;

/// Something that can produce the full list of users.
///
/// `Ok(None)` means the source had nothing to give; the store treats it as an
/// empty list.
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn fetch(&self) -> FetchResult;

    /// Short human-readable name used in logs and the status bar.
    fn describe(&self) -> String;
}

/// Reads a JSON array of users (or `null`) from a file.
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl UserSource for JsonFileSource {
    async fn fetch(&self) -> FetchResult {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                path: self.path.clone(),
                source,
            })?;
        let users: Option<Vec<User>> =
            serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse {
                path: Some(self.path.clone()),
                source,
            })?;
        Ok(users)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A fixed in-memory list. Each fetch returns a copy.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    users: Vec<User>,
}

impl StaticSource {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserSource for StaticSource {
    async fn fetch(&self) -> FetchResult {
        Ok(Some(self.users.clone()))
    }

    fn describe(&self) -> String {
        format!("{} built-in records", self.users.len())
    }
}

/// Runs fetches off the event loop and delivers results back to it.
///
/// The store's load guard still applies: [`request`](Self::request) does
/// nothing while a load is in flight.
pub struct BackgroundLoader {
    source: Arc<dyn UserSource>,
    runtime: Handle,
    tx: mpsc::UnboundedSender<(LoadTicket, FetchResult)>,
    rx: mpsc::UnboundedReceiver<(LoadTicket, FetchResult)>,
}

impl BackgroundLoader {
    pub fn new(source: Arc<dyn UserSource>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            runtime,
            tx,
            rx,
        }
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    /// Start a fetch. Returns `false` if the store already has one in flight.
    pub fn request(&self, store: &mut UserStore) -> bool {
        let Some(ticket) = store.begin_load() else {
            return false;
        };
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        debug!(source = %source.describe(), "spawning load");
        self.runtime.spawn(async move {
            let result = source.fetch().await;
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send((ticket, result));
        });
        true
    }

    /// Apply a finished fetch, if one is waiting. Never blocks.
    pub fn poll(&mut self, store: &mut UserStore) -> Option<LoadOutcome> {
        let (ticket, result) = self.rx.try_recv().ok()?;
        Some(store.finish_load(ticket, result))
    }

    /// Wait for the next finished fetch and apply it.
    pub async fn wait(&mut self, store: &mut UserStore) -> Option<LoadOutcome> {
        let (ticket, result) = self.rx.recv().await?;
        Some(store.finish_load(ticket, result))
    }
}
