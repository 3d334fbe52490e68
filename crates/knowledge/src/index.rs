//! SQLite-backed vector index.
//!
//! The store directory holds a single `store.sqlite` database. Vectors are
//! stored as little-endian `f32` blobs and searched exhaustively.

use crate::types::{Document, Metadata, RetrievalResult};
use crate::vector_index::VectorIndex;
use chrono::{DateTime, Utc};
use consult_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Database file name inside the store directory.
pub const STORE_FILE: &str = "store.sqlite";

const DIMENSION_KEY: &str = "dimension";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    metadata TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

fn store_err(context: &'static str) -> impl Fn(rusqlite::Error) -> AppError {
    move |e| AppError::StoreUnavailable(format!("{}: {}", context, e))
}

/// Exact cosine-similarity index over a SQLite table.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteIndex {
    /// Open (or create) the store in `dir`.
    pub fn open(dir: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(dir).map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to create store directory {:?}: {}", dir, e))
        })?;

        let db_path = dir.join(STORE_FILE);
        let conn = Connection::open(&db_path).map_err(store_err("Failed to open store"))?;
        Self::init(conn, Some(db_path))
    }

    /// Volatile store, used by tests.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(store_err("Failed to open store"))?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> AppResult<Self> {
        // Fails here, not on first query, if the file is not a database
        conn.execute_batch(SCHEMA)
            .map_err(store_err("Failed to initialize store schema"))?;

        tracing::debug!("Initialized SQLite store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Size of the database file in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::StoreUnavailable("Store lock poisoned".to_string()))
    }
}

fn read_dimension(conn: &Connection) -> AppResult<Option<usize>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = ?1",
            params![DIMENSION_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(store_err("Failed to read store dimension"))?;

    value
        .map(|v| {
            v.parse::<usize>().map_err(|_| {
                AppError::StoreUnavailable(format!("Corrupted store dimension: {}", v))
            })
        })
        .transpose()
}

/// Record the dimension on first write; reject mismatches after that.
fn ensure_dimension(tx: &Transaction<'_>, dimension: usize) -> AppResult<()> {
    match read_dimension(tx)? {
        Some(stored) if stored != dimension => Err(AppError::InvalidArgument(format!(
            "Embedding dimension {} does not match store dimension {}",
            dimension, stored
        ))),
        Some(_) => Ok(()),
        None => {
            tx.execute(
                "INSERT INTO store_meta (key, value) VALUES (?1, ?2)",
                params![DIMENSION_KEY, dimension.to_string()],
            )
            .map_err(store_err("Failed to record store dimension"))?;
            Ok(())
        }
    }
}

fn id_exists(conn: &Connection, id: &str) -> AppResult<bool> {
    conn.query_row(
        "SELECT 1 FROM documents WHERE id = ?1",
        params![id],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(store_err("Failed to look up document"))
}

/// Raw row, decoded outside the rusqlite closure so errors keep their type.
struct Row {
    id: String,
    text: String,
    embedding: Vec<u8>,
    metadata: String,
    stored_at: String,
}

impl Row {
    fn decode(self) -> AppResult<Document> {
        let metadata: Metadata = serde_json::from_str(&self.metadata).map_err(|e| {
            AppError::StoreUnavailable(format!("Corrupted metadata for '{}': {}", self.id, e))
        })?;
        let stored_at = DateTime::parse_from_rfc3339(&self.stored_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Corrupted timestamp for '{}': {}", self.id, e))
            })?;

        Ok(Document {
            embedding: bytes_to_embedding(&self.embedding)?,
            id: self.id,
            text: self.text,
            metadata,
            stored_at,
        })
    }
}

const SELECT_ROWS: &str =
    "SELECT id, text, embedding, metadata, stored_at FROM documents ORDER BY seq";

fn load_rows(conn: &Connection) -> AppResult<Vec<Row>> {
    let mut stmt = conn
        .prepare(SELECT_ROWS)
        .map_err(store_err("Failed to prepare query"))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Row {
                id: row.get(0)?,
                text: row.get(1)?,
                embedding: row.get(2)?,
                metadata: row.get(3)?,
                stored_at: row.get(4)?,
            })
        })
        .map_err(store_err("Failed to query documents"))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(store_err("Failed to read document row"))?;

    Ok(rows)
}

fn metadata_json(document: &Document) -> AppResult<String> {
    serde_json::to_string(&document.metadata).map_err(AppError::from)
}

impl VectorIndex for SqliteIndex {
    fn insert_batch(&self, documents: &[Document]) -> AppResult<usize> {
        let Some(first) = documents.first() else {
            return Ok(0);
        };
        let dimension = first.embedding.len();
        if documents.iter().any(|d| d.embedding.len() != dimension) {
            return Err(AppError::InvalidArgument(
                "Documents in one batch have different embedding dimensions".to_string(),
            ));
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(store_err("Failed to begin transaction"))?;

        ensure_dimension(&tx, dimension)?;

        for document in documents {
            if id_exists(&tx, &document.id)? {
                return Err(AppError::InvalidArgument(format!(
                    "Document id '{}' already exists",
                    document.id
                )));
            }

            tx.execute(
                "INSERT INTO documents (id, text, embedding, metadata, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    document.id,
                    document.text,
                    embedding_to_bytes(&document.embedding),
                    metadata_json(document)?,
                    document.stored_at.to_rfc3339(),
                ],
            )
            .map_err(store_err("Failed to insert document"))?;
        }

        // Dropping `tx` on an early return rolls the whole batch back
        tx.commit().map_err(store_err("Failed to commit documents"))?;

        Ok(documents.len())
    }

    fn upsert(&self, document: &Document) -> AppResult<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(store_err("Failed to begin transaction"))?;

        ensure_dimension(&tx, document.embedding.len())?;

        tx.execute(
            "INSERT INTO documents (id, text, embedding, metadata, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                text = excluded.text,
                embedding = excluded.embedding,
                metadata = excluded.metadata,
                stored_at = excluded.stored_at",
            params![
                document.id,
                document.text,
                embedding_to_bytes(&document.embedding),
                metadata_json(document)?,
                document.stored_at.to_rfc3339(),
            ],
        )
        .map_err(store_err("Failed to upsert document"))?;

        tx.commit().map_err(store_err("Failed to commit upsert"))?;
        Ok(())
    }

    fn delete(&self, id: &str) -> AppResult<bool> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id])
            .map_err(store_err("Failed to delete document"))?;
        Ok(removed > 0)
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<RetrievalResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let rows = {
            let conn = self.lock()?;
            match read_dimension(&conn)? {
                None => return Ok(Vec::new()),
                Some(stored) if stored != query_embedding.len() => {
                    return Err(AppError::InvalidArgument(format!(
                        "Query dimension {} does not match store dimension {}",
                        query_embedding.len(),
                        stored
                    )))
                }
                Some(_) => load_rows(&conn)?,
            }
        };

        let mut results = rows
            .into_iter()
            .map(|row| {
                let document = row.decode()?;
                Ok(RetrievalResult {
                    score: cosine_similarity(query_embedding, &document.embedding),
                    document_id: document.id,
                    text: document.text,
                    metadata: document.metadata,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        // Stable sort keeps insertion order among equal scores
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        tracing::debug!(
            "Retrieved {} documents (requested top-{})",
            results.len(),
            top_k
        );

        Ok(results)
    }

    fn list_all(&self) -> AppResult<Vec<Document>> {
        let rows = {
            let conn = self.lock()?;
            load_rows(&conn)?
        };
        rows.into_iter().map(Row::decode).collect()
    }

    fn get(&self, id: &str) -> AppResult<Option<Document>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, text, embedding, metadata, stored_at FROM documents WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Row {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        embedding: row.get(2)?,
                        metadata: row.get(3)?,
                        stored_at: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(store_err("Failed to read document"))?;

        row.map(Row::decode).transpose()
    }

    fn count(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .map_err(store_err("Failed to count documents"))
    }

    fn dimension(&self) -> AppResult<Option<usize>> {
        let conn = self.lock()?;
        read_dimension(&conn)
    }

    fn reset(&self) -> AppResult<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(store_err("Failed to begin transaction"))?;
        tx.execute("DELETE FROM documents", [])
            .map_err(store_err("Failed to delete documents"))?;
        tx.execute("DELETE FROM store_meta", [])
            .map_err(store_err("Failed to clear store metadata"))?;
        tx.commit().map_err(store_err("Failed to commit reset"))?;

        tracing::info!("Reset vector store");
        Ok(())
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::StoreUnavailable(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::default_metadata;
    use tempfile::TempDir;

    fn doc(id: &str, text: &str, embedding: Vec<f32>) -> Document {
        Document {
            id: id.to_string(),
            text: text.to_string(),
            embedding,
            metadata: default_metadata(),
            stored_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_creates_database_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested/store");
        let index = SqliteIndex::open(&dir).unwrap();

        assert!(dir.join(STORE_FILE).exists());
        assert_eq!(index.count().unwrap(), 0);
    }

    #[test]
    fn test_empty_store_search() {
        let index = SqliteIndex::open_in_memory().unwrap();
        assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_insert_and_search_ordering() {
        let index = SqliteIndex::open_in_memory().unwrap();
        index
            .insert_batch(&[
                doc("far", "far", vec![0.0, 1.0, 0.0]),
                doc("near", "near", vec![1.0, 0.1, 0.0]),
                doc("mid", "mid", vec![1.0, 1.0, 0.0]),
            ])
            .unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 10).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = SqliteIndex::open_in_memory().unwrap();
        index
            .insert_batch(&[
                doc("b", "b", vec![1.0, 0.0]),
                doc("a", "a", vec![1.0, 0.0]),
                doc("c", "c", vec![1.0, 0.0]),
            ])
            .unwrap();

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_top_k_bounds() {
        let index = SqliteIndex::open_in_memory().unwrap();
        index
            .insert_batch(&[doc("1", "one", vec![1.0, 0.0]), doc("2", "two", vec![0.0, 1.0])])
            .unwrap();

        assert_eq!(index.search(&[1.0, 0.0], 10).unwrap().len(), 2);
        assert_eq!(index.search(&[1.0, 0.0], 1).unwrap().len(), 1);
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_id_rolls_back_batch() {
        let index = SqliteIndex::open_in_memory().unwrap();
        index.insert_batch(&[doc("x", "x", vec![1.0])]).unwrap();

        let result = index.insert_batch(&[doc("y", "y", vec![1.0]), doc("x", "x2", vec![1.0])]);
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
        assert_eq!(index.count().unwrap(), 1);
        assert!(index.get("y").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_and_keeps_rank() {
        let index = SqliteIndex::open_in_memory().unwrap();
        index
            .insert_batch(&[doc("first", "old", vec![1.0, 0.0]), doc("second", "s", vec![1.0, 0.0])])
            .unwrap();

        index.upsert(&doc("first", "new", vec![1.0, 0.0])).unwrap();
        index.upsert(&doc("first", "newer", vec![1.0, 0.0])).unwrap();

        assert_eq!(index.count().unwrap(), 2);
        let all = index.list_all().unwrap();
        assert_eq!(all[0].id, "first");
        assert_eq!(all[0].text, "newer");

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].document_id, "first");
    }

    #[test]
    fn test_dimension_is_enforced() {
        let index = SqliteIndex::open_in_memory().unwrap();
        index.insert_batch(&[doc("a", "a", vec![1.0, 0.0])]).unwrap();
        assert_eq!(index.dimension().unwrap(), Some(2));

        let write = index.upsert(&doc("b", "b", vec![1.0, 0.0, 0.0]));
        assert!(matches!(write, Err(AppError::InvalidArgument(_))));

        let search = index.search(&[1.0], 1);
        assert!(matches!(search, Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_delete_and_reset() {
        let index = SqliteIndex::open_in_memory().unwrap();
        index.insert_batch(&[doc("a", "a", vec![1.0]), doc("b", "b", vec![1.0])]).unwrap();

        assert!(index.delete("a").unwrap());
        assert!(!index.delete("a").unwrap());
        assert_eq!(index.count().unwrap(), 1);

        index.reset().unwrap();
        assert_eq!(index.count().unwrap(), 0);
        assert_eq!(index.dimension().unwrap(), None);
        index.insert_batch(&[doc("c", "c", vec![1.0, 2.0, 3.0])]).unwrap();
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let index = SqliteIndex::open(temp.path()).unwrap();
            index.insert_batch(&[doc("kept", "kept text", vec![0.5, 0.5])]).unwrap();
        }

        let index = SqliteIndex::open(temp.path()).unwrap();
        let document = index.get("kept").unwrap().unwrap();
        assert_eq!(document.text, "kept text");
        assert_eq!(document.embedding, vec![0.5, 0.5]);
        assert_eq!(document.metadata, default_metadata());
    }

    #[test]
    fn test_corrupted_file_is_store_unavailable() {
        let temp = TempDir::new().unwrap();
        let garbage = "not a sqlite database\n".repeat(200);
        std::fs::write(temp.path().join(STORE_FILE), garbage).unwrap();

        let result = SqliteIndex::open(temp.path());
        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
