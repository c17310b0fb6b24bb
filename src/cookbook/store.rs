use crate::cookbook::{Cookbook, LoadReport};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Shared handle to the current cookbook.
///
/// Readers take a cheap snapshot; a reload builds a complete new cookbook off
/// the async runtime and swaps it in, so requests never see a half-loaded
/// corpus.
#[derive(Debug, Clone)]
pub struct CookbookStore {
    folder: PathBuf,
    current: Arc<RwLock<Arc<Cookbook>>>,
}

impl CookbookStore {
    /// Load the folder and wrap it in a store
    pub async fn open(folder: impl Into<PathBuf>) -> Result<(Self, LoadReport)> {
        let folder = folder.into();
        let (book, report) = load_blocking(folder.clone()).await?;

        Ok((
            Self {
                folder,
                current: Arc::new(RwLock::new(Arc::new(book))),
            },
            report,
        ))
    }

    /// Wrap an already built cookbook
    pub fn from_cookbook(book: Cookbook) -> Self {
        Self {
            folder: book.folder().to_path_buf(),
            current: Arc::new(RwLock::new(Arc::new(book))),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub async fn snapshot(&self) -> Arc<Cookbook> {
        Arc::clone(&*self.current.read().await)
    }

    /// Reload the folder and replace the current cookbook.
    ///
    /// On failure the previous cookbook stays in place.
    pub async fn reload(&self) -> Result<LoadReport> {
        let (book, report) = match load_blocking(self.folder.clone()).await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Cookbook reload failed, keeping previous recipes: {}", e.log_safe());
                return Err(e);
            }
        };

        let count = book.len();
        *self.current.write().await = Arc::new(book);
        info!("Cookbook reloaded: {} recipes", count);

        Ok(report)
    }
}

async fn load_blocking(folder: PathBuf) -> Result<(Cookbook, LoadReport)> {
    tokio::task::spawn_blocking(move || Cookbook::load_folder(folder))
        .await
        .map_err(|e| Error::Internal(format!("Cookbook loader task failed: {e}")))?
}
