// PropVal - app/store.rs
//
// Process-wide dataset store. The dataset is loaded exactly once, on a
// background thread, then shared read-only by every estimation request.
//
// Architecture:
//   - `DatasetStore` wraps a `OnceLock`: it is pending until the loader
//     installs either the parsed dataset or the load failure.
//   - The installed dataset lives behind an `Arc`; requests clone the `Arc`
//     and never mutate it, so no further locking is needed.
//   - A request arriving before the load completes gets `NotReady` instead
//     of waiting. Only the front end blocks, through `wait`.

use crate::core::model::Dataset;
use crate::core::parser;
use crate::platform::fs;
use crate::util::error::{DataFormatError, RequestError};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread::JoinHandle;
use std::time::Instant;

/// Load state as seen by consumers.
#[derive(Debug, Clone)]
pub enum LoadState {
    Pending,
    Ready(Arc<Dataset>),
    Failed(String),
}

/// One-shot holder for the transaction dataset.
#[derive(Debug, Default)]
pub struct DatasetStore {
    state: OnceLock<Result<Arc<Dataset>, String>>,
    /// Set to true (and notified) once a result is installed.
    settled: Mutex<bool>,
    settled_cv: Condvar,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the load result. Returns false (and changes nothing) if a
    /// result was already installed.
    pub fn install(&self, result: Result<Dataset, DataFormatError>) -> bool {
        let value = result.map(Arc::new).map_err(|e| e.to_string());
        let installed = self.state.set(value).is_ok();
        if !installed {
            tracing::warn!("Dataset already installed; ignoring second load result");
            return false;
        }
        let mut settled = self.settled.lock().unwrap_or_else(|e| e.into_inner());
        *settled = true;
        self.settled_cv.notify_all();
        true
    }

    /// True once a dataset is available to requests.
    pub fn is_ready(&self) -> bool {
        matches!(self.state.get(), Some(Ok(_)))
    }

    pub fn state(&self) -> LoadState {
        match self.state.get() {
            None => LoadState::Pending,
            Some(Ok(ds)) => LoadState::Ready(Arc::clone(ds)),
            Some(Err(msg)) => LoadState::Failed(msg.clone()),
        }
    }

    /// Block until the load has finished, then report its outcome.
    pub fn wait(&self) -> LoadState {
        let mut settled = self.settled.lock().unwrap_or_else(|e| e.into_inner());
        while !*settled {
            settled = self
                .settled_cv
                .wait(settled)
                .unwrap_or_else(|e| e.into_inner());
        }
        drop(settled);
        self.state()
    }

    /// Shared handle to the dataset, or `NotReady` if it is still loading
    /// or failed to load.
    pub fn dataset(&self) -> Result<Arc<Dataset>, RequestError> {
        match self.state.get() {
            Some(Ok(ds)) => Ok(Arc::clone(ds)),
            _ => Err(RequestError::NotReady),
        }
    }
}

/// Read and parse a dataset file.
pub fn load_dataset(path: &Path) -> Result<Dataset, DataFormatError> {
    let started = Instant::now();
    let bytes = fs::read_bytes(path).map_err(|source| DataFormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut dataset = parser::parse_dataset(&bytes)?;
    dataset.source = Some(path.to_path_buf());

    tracing::info!(
        path = %path.display(),
        rows = dataset.len(),
        encoding = %dataset.encoding,
        delimiter = %char::from(dataset.delimiter),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Load `path` on a background thread and install the result into `store`.
///
/// Callers block with [`DatasetStore::wait`] or poll
/// [`DatasetStore::is_ready`].
pub fn spawn_load(store: Arc<DatasetStore>, path: PathBuf) -> JoinHandle<()> {
    tracing::info!(path = %path.display(), "Dataset load started");
    std::thread::spawn(move || {
        let result = load_dataset(&path);
        if let Err(ref e) = result {
            tracing::error!(path = %path.display(), error = %e, "Dataset load failed");
        }
        store.install(result);
    })
}
