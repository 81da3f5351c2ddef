//! Narrow interfaces to the outside world: inference, rendering, storage.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::RenderConfig;
use crate::data::model::{ForecastRequest, ForecastResult};
use crate::error::{ForecastError, Result};
use crate::plot::ChartSpec;
use crate::wire;

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Runs a forecast request against some model.
pub trait InferenceClient {
    fn invoke(&self, request: &ForecastRequest) -> Result<ForecastResult>;
}

/// Turns a chart specification into image bytes.
pub trait ChartRenderer {
    fn render(&self, chart: &ChartSpec, config: &RenderConfig) -> Result<Vec<u8>>;
}

/// Persists an image and returns a stable reference to it.
pub trait ArtifactStore {
    fn store(&self, image: &[u8]) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Inference from a file
// ---------------------------------------------------------------------------

/// Answers every request with a result document read from disk.
#[derive(Debug, Clone)]
pub struct JsonFileClient {
    path: PathBuf,
}

impl JsonFileClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InferenceClient for JsonFileClient {
    fn invoke(&self, request: &ForecastRequest) -> Result<ForecastResult> {
        log::info!(
            "answering request for {} series (horizon {}) from {}",
            request.records.len(),
            request.horizon,
            self.path.display()
        );
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| ForecastError::Inference(format!("{}: {e}", self.path.display())))?;
        wire::result_from_json(&text)
    }
}

// ---------------------------------------------------------------------------
// Artifact stores
// ---------------------------------------------------------------------------

/// Writes images under a root directory as `<16 hex>/<8 hex>.png`.
///
/// The returned reference is `{public_base}/{key}` when a public base URL
/// is configured, otherwise a `file://` URI of the written file.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    public_base: Option<String>,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base: None,
        }
    }

    pub fn with_public_base(mut self, base: impl Into<String>) -> Self {
        self.public_base = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn new_key() -> String {
        let dir = uuid::Uuid::new_v4().simple().to_string();
        let file = uuid::Uuid::new_v4().simple().to_string();
        format!("{}/{}.png", &dir[..16], &file[..8])
    }
}

impl ArtifactStore for DirectoryStore {
    fn store(&self, image: &[u8]) -> Result<String> {
        let key = Self::new_key();
        let path = self.root.join(&key);
        let store_err =
            |e: std::io::Error| ForecastError::Store(format!("{}: {e}", path.display()));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(store_err)?;
        }
        std::fs::write(&path, image).map_err(store_err)?;
        log::debug!("stored {} bytes at {}", image.len(), path.display());

        match &self.public_base {
            Some(base) => Ok(format!("{base}/{key}")),
            None => {
                let abs = path.canonicalize().map_err(store_err)?;
                Ok(format!("file://{}", abs.display()))
            }
        }
    }
}

/// Keeps images in memory; references are `memory://<index>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    images: Mutex<Vec<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of everything stored so far, in order.
    pub fn images(&self) -> Vec<Vec<u8>> {
        self.images
            .lock()
            .map(|images| images.clone())
            .unwrap_or_default()
    }
}

impl ArtifactStore for MemoryStore {
    fn store(&self, image: &[u8]) -> Result<String> {
        let mut images = self
            .images
            .lock()
            .map_err(|_| ForecastError::Store("memory store lock poisoned".to_string()))?;
        images.push(image.to_vec());
        Ok(format!("memory://{}", images.len() - 1))
    }
}
