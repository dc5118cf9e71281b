//! Persistence for extracted documents, keyed by filename.

use crate::document::Document;
use nucrag_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Stores extraction output so a setup run can reload what it read.
///
/// Saving a document under an existing filename replaces it.
pub trait DocumentStore: Send + Sync {
    fn save(&self, document: &Document) -> AppResult<()>;

    fn load(&self, filename: &str) -> AppResult<Option<Document>>;

    /// All stored documents, ordered by filename.
    fn load_all(&self) -> AppResult<Vec<Document>>;

    fn clear(&self) -> AppResult<()>;
}

/// SQLite-backed store holding one JSON document per filename.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Open (or create) the store at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Document(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Document(format!("Failed to open document store: {}", e)))?;
        Self::init(conn)
    }

    /// In-memory SQLite store.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Document(format!("Failed to open document store: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                filename TEXT PRIMARY KEY,
                link TEXT NOT NULL,
                body TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Document(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Document("Document store lock poisoned".to_string()))
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn save(&self, document: &Document) -> AppResult<()> {
        let body = serde_json::to_string(document)?;
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO documents (filename, link, body) VALUES (?1, ?2, ?3)",
                params![document.filename, document.link, body],
            )
            .map_err(|e| AppError::Document(format!("Failed to save {}: {}", document.filename, e)))?;

        tracing::debug!("Stored document {}", document.filename);
        Ok(())
    }

    fn load(&self, filename: &str) -> AppResult<Option<Document>> {
        let body: Option<String> = self
            .conn()?
            .query_row(
                "SELECT body FROM documents WHERE filename = ?1",
                params![filename],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::Document(format!("Failed to load {}: {}", filename, e)))?;

        body.map(|b| serde_json::from_str(&b).map_err(AppError::from))
            .transpose()
    }

    fn load_all(&self) -> AppResult<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT body FROM documents ORDER BY filename")
            .map_err(|e| AppError::Document(format!("Failed to prepare query: {}", e)))?;

        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| AppError::Document(format!("Failed to query documents: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Document(format!("Failed to read documents: {}", e)))?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(AppError::from))
            .collect()
    }

    fn clear(&self) -> AppResult<()> {
        self.conn()?
            .execute("DELETE FROM documents", [])
            .map_err(|e| AppError::Document(format!("Failed to clear documents: {}", e)))?;
        Ok(())
    }
}

/// Process-local store, used by tests and one-shot runs.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<String, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> AppResult<MutexGuard<'_, BTreeMap<String, Document>>> {
        self.documents
            .lock()
            .map_err(|_| AppError::Document("Document store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn save(&self, document: &Document) -> AppResult<()> {
        self.documents()?
            .insert(document.filename.clone(), document.clone());
        Ok(())
    }

    fn load(&self, filename: &str) -> AppResult<Option<Document>> {
        Ok(self.documents()?.get(filename).cloned())
    }

    fn load_all(&self) -> AppResult<Vec<Document>> {
        Ok(self.documents()?.values().cloned().collect())
    }

    fn clear(&self) -> AppResult<()> {
        self.documents()?.clear();
        Ok(())
    }
}
