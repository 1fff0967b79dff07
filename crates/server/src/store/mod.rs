//! JSON document storage.
//!
//! # Data directory
//!
//! Each entity collection lives in its own document, a single JSON object
//! with one array field:
//!
//! - `users.json` - `{"users": [...]}`
//! - `sales.json` - `{"sales": [...]}`
//! - `products.json` - `{"products": [...]}`
//!
//! A missing file reads as an empty collection. Writes go to a temporary
//! sibling that is renamed over the target, so a reader never sees half a
//! document.
//!
//! # Writers
//!
//! Repositories only offer whole-collection `get_all`/`persist`. Any handler
//! that loads, mutates and persists must hold [`JsonStore::write_lock`] for
//! the entire cycle; the gate makes the data directory single-writer so two
//! concurrent checkouts cannot overwrite each other's stock changes.
//!
//! Operations that change sales and stock together write both documents
//! through [`persist_pair`], which puts the first one back if the second
//! write fails.

pub mod products;
pub mod sales;
pub mod users;

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, MutexGuard};

use stockroom_core::{ADMIN_USERNAME, User};

pub use products::{ProductRepository, Products};
pub use sales::{SaleRepository, Sales};
pub use users::{UserRepository, Users};

/// Errors from reading or writing JSON documents.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid JSON or does not match the expected shape.
    #[error("data corruption in {path}: {message}")]
    DataCorruption { path: PathBuf, message: String },

    /// A uniqueness rule would be broken (e.g. duplicate username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Guard returned by [`JsonStore::write_lock`].
pub type WriteGuard<'a> = MutexGuard<'a, ()>;

/// A directory of JSON documents.
#[derive(Debug)]
pub struct JsonStore {
    dir: PathBuf,
    writer: Mutex<()>,
}

impl JsonStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            writer: Mutex::new(()),
        }
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a named document.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Acquire the single-writer gate.
    pub async fn write_lock(&self) -> WriteGuard<'_> {
        self.writer.lock().await
    }

    /// Whether a named document exists on disk.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the filesystem cannot be queried.
    pub async fn exists(&self, name: &str) -> Result<bool, RepositoryError> {
        let path = self.path(name);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| RepositoryError::Io { path, source })
    }

    /// Load a named document. A missing or blank file yields an empty object.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the file cannot be read, or
    /// `RepositoryError::DataCorruption` if it is not a JSON object.
    pub async fn load(&self, name: &str) -> Result<Map<String, Value>, RepositoryError> {
        let path = self.path(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => return Err(RepositoryError::Io { path, source }),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(RepositoryError::DataCorruption {
                path,
                message: "top-level value is not an object".to_string(),
            }),
            Err(e) => Err(RepositoryError::DataCorruption {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Replace a named document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the directory or file cannot be written.
    pub async fn save(&self, name: &str, document: &Map<String, Value>) -> Result<(), RepositoryError> {
        let path = self.path(name);
        let bytes = serde_json::to_vec_pretty(document).map_err(|e| RepositoryError::DataCorruption {
            path: path.clone(),
            message: e.to_string(),
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| RepositoryError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let tmp = self.dir.join(format!(".{name}.tmp"));
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| RepositoryError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| RepositoryError::Io { path, source })
    }

    /// Create any missing document with its default contents.
    ///
    /// `users.json` is seeded with the admin account; sales and products
    /// start empty. Existing documents are never touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a document cannot be checked or written.
    pub async fn bootstrap(&self, admin_password: &SecretString) -> Result<Vec<&'static str>, RepositoryError> {
        let _guard = self.write_lock().await;
        let mut created = Vec::new();

        if !self.exists(Users::FILE_NAME).await? {
            let admin = User {
                username: ADMIN_USERNAME.to_string(),
                password: admin_password.expose_secret().to_owned(),
                name: "Administrator".to_string(),
                email: String::new(),
                phone: String::new(),
            };
            UserRepository::new(self).persist(&[admin]).await?;
            created.push(Users::FILE_NAME);
        }
        if !self.exists(Sales::FILE_NAME).await? {
            SaleRepository::new(self).persist(&[]).await?;
            created.push(Sales::FILE_NAME);
        }
        if !self.exists(Products::FILE_NAME).await? {
            ProductRepository::new(self).persist(&[]).await?;
            created.push(Products::FILE_NAME);
        }

        for name in &created {
            tracing::info!(document = %name, dir = %self.dir.display(), "Created data document");
        }
        Ok(created)
    }
}

/// A collection stored as the array field of one document.
pub trait Collection {
    /// Document file name inside the data directory.
    const FILE_NAME: &'static str;
    /// Top-level key holding the array.
    const KEY: &'static str;
    /// Record type.
    type Item: Serialize + DeserializeOwned;
}

/// Whole-collection accessor over one document.
pub struct Repository<'a, C> {
    store: &'a JsonStore,
    collection: PhantomData<C>,
}

impl<'a, C: Collection> Repository<'a, C> {
    /// Create a new repository over `store`.
    #[must_use]
    pub const fn new(store: &'a JsonStore) -> Self {
        Self {
            store,
            collection: PhantomData,
        }
    }

    /// Load every record. Missing file or key yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the file cannot be read, or
    /// `RepositoryError::DataCorruption` if a record does not parse.
    pub async fn get_all(&self) -> Result<Vec<C::Item>, RepositoryError> {
        let mut document = self.store.load(C::FILE_NAME).await?;
        match document.remove(C::KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(items) => serde_json::from_value(items).map_err(|e| RepositoryError::DataCorruption {
                path: self.store.path(C::FILE_NAME),
                message: format!("{}: {e}", C::KEY),
            }),
        }
    }

    /// Overwrite the document with `items`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the records cannot be encoded or written.
    pub async fn persist(&self, items: &[C::Item]) -> Result<(), RepositoryError> {
        let items = serde_json::to_value(items).map_err(|e| RepositoryError::DataCorruption {
            path: self.store.path(C::FILE_NAME),
            message: e.to_string(),
        })?;

        let mut document = Map::new();
        document.insert(C::KEY.to_string(), items);
        self.store.save(C::FILE_NAME, &document).await
    }
}

/// Persist two collections that must change together.
///
/// `first` is written, then `second`. If the second write fails, `first` is
/// rewritten with `first_before` so the documents still agree with each
/// other, and the second write's error is returned. Each single write is
/// atomic, so a failed write leaves its own document untouched.
///
/// The caller must hold the store's write lock.
///
/// # Errors
///
/// Returns the `RepositoryError` of whichever write failed.
pub async fn persist_pair<A: Collection, B: Collection>(
    first: &Repository<'_, A>,
    first_items: &[A::Item],
    first_before: &[A::Item],
    second: &Repository<'_, B>,
    second_items: &[B::Item],
) -> Result<(), RepositoryError> {
    first.persist(first_items).await?;

    if let Err(e) = second.persist(second_items).await {
        tracing::error!(
            error = %e,
            restoring = A::FILE_NAME,
            "Second write failed, restoring first document"
        );
        if let Err(restore) = first.persist(first_before).await {
            tracing::error!(
                error = %restore,
                document = A::FILE_NAME,
                "Failed to restore document, data directory is inconsistent"
            );
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_missing_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        assert!(store.load("products.json").await.unwrap().is_empty());
        assert!(ProductRepository::new(&store).get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("sales.json"), "{}").await.unwrap();
        let store = JsonStore::new(dir.path());

        assert!(SaleRepository::new(&store).get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested"));

        let mut document = Map::new();
        document.insert("users".to_string(), json!([{"username": "ñandú"}]));
        store.save("users.json", &document).await.unwrap();

        let raw = tokio::fs::read_to_string(dir.path().join("nested/users.json")).await.unwrap();
        assert!(raw.contains("ñandú"), "non-ASCII text is written as UTF-8");
        assert_eq!(store.load("users.json").await.unwrap(), document);
        assert!(!store.exists(".users.json.tmp").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("sales.json"), "[1, 2").await.unwrap();
        let store = JsonStore::new(dir.path());

        let err = store.load("sales.json").await.unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption { .. }));
    }

    #[tokio::test]
    async fn test_non_object_root_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("sales.json"), "[]").await.unwrap();
        let store = JsonStore::new(dir.path());

        assert!(store.load("sales.json").await.is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let password = SecretString::from("letmein");

        let created = store.bootstrap(&password).await.unwrap();
        assert_eq!(created, vec!["users.json", "sales.json", "products.json"]);

        let users = UserRepository::new(&store).get_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "admin");
        assert_eq!(users[0].password, "letmein");

        assert!(store.bootstrap(&password).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_keeps_existing_documents() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("users.json"),
            r#"{"users": [{"username": "maria", "password": "pw"}]}"#,
        )
        .await
        .unwrap();
        let store = JsonStore::new(dir.path());

        let created = store.bootstrap(&SecretString::from("x")).await.unwrap();
        assert_eq!(created, vec!["sales.json", "products.json"]);

        let users = UserRepository::new(&store).get_all().await.unwrap();
        assert_eq!(users[0].username, "maria");
    }

    #[tokio::test]
    async fn test_persist_pair_restores_first_when_second_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store.bootstrap(&SecretString::from("x")).await.unwrap();

        let products = ProductRepository::new(&store);
        let sales = SaleRepository::new(&store);
        let before = vec![stockroom_core::Product::new("Widget", "W-1", 10.0, 5)];
        products.persist(&before).await.unwrap();

        let mut after = before.clone();
        after[0].stock = 3;

        // A directory squatting on the temp path makes the sales write fail.
        std::fs::create_dir(dir.path().join(".sales.json.tmp")).unwrap();
        let result = persist_pair(&products, &after, &before, &sales, &[]).await;

        assert!(matches!(result, Err(RepositoryError::Io { .. })));
        assert_eq!(products.get_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_persist_pair_writes_both() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let products = ProductRepository::new(&store);
        let sales = SaleRepository::new(&store);
        let items = vec![stockroom_core::Product::new("Widget", "W-1", 10.0, 5)];

        persist_pair(&products, &items, &[], &sales, &[]).await.unwrap();
        assert_eq!(products.get_all().await.unwrap(), items);
        assert!(store.exists("sales.json").await.unwrap());
    }
}
