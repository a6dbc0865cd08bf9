use std::{
    collections::HashMap,
    error::Error,
    future::Future,
    io,
    path::{Path, PathBuf},
};

use log::trace;
use thiserror::Error;

/// Fetches external resources referenced by relative or `file:` URIs.
///
/// Fetches of one parse run concurrently, so implementations should not
/// block when they can avoid it.
pub trait ResourceFetcher {
    type Error: Error + Send + Sync + 'static;

    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, Self::Error>>;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource {0} not found")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolves resources against a base directory.
///
/// Files are read with blocking `std::fs` calls, so fetches joined on one
/// task run one after another. Use a fetcher backed by an async runtime when
/// reads have to overlap.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    base: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl ResourceFetcher for DirectoryFetcher {
    type Error = FetchError;

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.base.join(path);
        trace!("Fetching {}", path.display());
        std::fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
            _ => FetchError::Io { path, source },
        })
    }
}

/// Serves resources from memory, keyed by the path they are referenced with.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, data: Vec<u8>) {
        self.files.insert(path.into(), data);
    }

    pub fn with(mut self, path: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert(path, data);
        self
    }
}

impl ResourceFetcher for MemoryFetcher {
    type Error = FetchError;

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}
