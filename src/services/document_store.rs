use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::fs as async_fs;
use tokio::sync::RwLock;
use crate::models::errors::AppError;
use crate::models::inventory::Inventory;
use crate::models::user::User;

/// A record that can live in a [`Collection`]
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name, also used as the file stem on disk
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Inventory {
    const COLLECTION: &'static str = "inventories";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// Read/write counters for a collection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionStats {
    pub documents: usize,
    pub reads: usize,
    pub writes: usize,
}

/// Insertion-ordered set of documents, optionally mirrored to a JSON file.
///
/// Every mutation builds the new document list, persists it, and only then
/// swaps it in, so a failed write leaves memory and disk in agreement.
#[derive(Clone)]
pub struct Collection<T: Document> {
    docs: Arc<RwLock<Vec<T>>>,
    file_path: Option<PathBuf>,
    counters: Arc<Counters>,
}

impl<T: Document> Collection<T> {
    pub fn in_memory() -> Self {
        Self {
            docs: Arc::new(RwLock::new(Vec::new())),
            file_path: None,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Opens `<dir>/<collection>.json`, loading whatever is already there
    pub async fn open(dir: &Path) -> Result<Self, AppError> {
        let file_path = dir.join(format!("{}.json", T::COLLECTION));

        let docs = match async_fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<T>>(&bytes).map_err(|e| {
                AppError::storage_failed(format!(
                    "Failed to parse {}: {}",
                    file_path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(AppError::storage_failed(format!(
                    "Failed to read {}: {}",
                    file_path.display(),
                    e
                )))
            }
        };

        tracing::info!("Loaded {} documents into '{}'", docs.len(), T::COLLECTION);

        Ok(Self {
            docs: Arc::new(RwLock::new(docs)),
            file_path: Some(file_path),
            counters: Arc::new(Counters::default()),
        })
    }

    pub async fn find_all(&self) -> Vec<T> {
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        self.docs.read().await.clone()
    }

    pub async fn find_by_id(&self, id: &str) -> Option<T> {
        self.find_one(|doc| doc.id() == id).await
    }

    pub async fn find_one<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        let docs = self.docs.read().await;
        docs.iter().find(|&doc| predicate(doc)).cloned()
    }

    /// Appends a document. Ids are generated by the models, so a clash is a bug.
    pub async fn insert(&self, doc: T) -> Result<T, AppError> {
        let mut docs = self.docs.write().await;

        if docs.iter().any(|existing| existing.id() == doc.id()) {
            return Err(AppError::internal_error(format!(
                "Duplicate id '{}' in '{}'",
                doc.id(),
                T::COLLECTION
            )));
        }

        let mut next = docs.clone();
        next.push(doc.clone());
        self.commit(&mut docs, next).await?;

        tracing::debug!("Inserted {} into '{}'", doc.id(), T::COLLECTION);
        Ok(doc)
    }

    /// Replaces the document with the same id. Returns `None` when it does not exist.
    pub async fn replace(&self, doc: T) -> Result<Option<T>, AppError> {
        let mut docs = self.docs.write().await;

        let Some(index) = docs.iter().position(|existing| existing.id() == doc.id()) else {
            return Ok(None);
        };

        let mut next = docs.clone();
        next[index] = doc.clone();
        self.commit(&mut docs, next).await?;

        tracing::debug!("Replaced {} in '{}'", doc.id(), T::COLLECTION);
        Ok(Some(doc))
    }

    /// Removes and returns the document, or `None` when it does not exist
    pub async fn delete(&self, id: &str) -> Result<Option<T>, AppError> {
        let mut docs = self.docs.write().await;

        let Some(index) = docs.iter().position(|existing| existing.id() == id) else {
            return Ok(None);
        };

        let mut next = docs.clone();
        let removed = next.remove(index);
        self.commit(&mut docs, next).await?;

        tracing::debug!("Deleted {} from '{}'", id, T::COLLECTION);
        Ok(Some(removed))
    }

    pub async fn count(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn stats(&self) -> CollectionStats {
        CollectionStats {
            documents: self.count().await,
            reads: self.counters.reads.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
        }
    }

    async fn commit(&self, docs: &mut Vec<T>, next: Vec<T>) -> Result<(), AppError> {
        if let Some(path) = &self.file_path {
            write_atomically(path, &next).await?;
        }
        *docs = next;
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

async fn write_atomically<T: Serialize>(path: &Path, docs: &[T]) -> Result<(), AppError> {
    let bytes = serde_json::to_vec_pretty(docs)
        .map_err(|e| AppError::storage_failed(format!("Failed to serialize documents: {}", e)))?;

    let tmp_path = path.with_extension("json.tmp");

    async_fs::write(&tmp_path, &bytes)
        .await
        .map_err(|e| AppError::storage_failed(format!("Failed to write {}: {}", tmp_path.display(), e)))?;

    async_fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AppError::storage_failed(format!("Failed to replace {}: {}", path.display(), e)))
}

/// The application's collections
#[derive(Clone)]
pub struct DocumentStore {
    pub users: Collection<User>,
    pub inventories: Collection<Inventory>,
}

impl DocumentStore {
    pub fn in_memory() -> Self {
        Self {
            users: Collection::in_memory(),
            inventories: Collection::in_memory(),
        }
    }

    /// Opens (creating if needed) a store persisted under `data_dir`
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let data_dir = data_dir.into();

        async_fs::create_dir_all(&data_dir).await.map_err(|e| {
            AppError::storage_failed(format!("Failed to create data directory: {}", e))
        })?;

        Ok(Self {
            users: Collection::open(&data_dir).await?,
            inventories: Collection::open(&data_dir).await?,
        })
    }
}
