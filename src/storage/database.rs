//! SQLite candidate store with migrations

use crate::candidate::Candidate;
use crate::error::{ColetaError, Result};
use crate::storage::CandidateRepository;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};
use std::path::Path;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

const CANDIDATE_COLUMNS: &str =
    "id, kind, description, city, district, street, stock, image_refs, active";

/// Database manager with migration support
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database at `db_path` and bring the schema up to date
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ColetaError::Io {
                source: e,
                context: format!("Failed to create database directory: {:?}", parent),
            })?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA busy_timeout = 5000;
                ",
            )
        });

        let pool = Pool::builder().max_size(8).build(manager)?;

        let db = Self { pool };
        db.migrate()?;

        Ok(db)
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )?;

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);

                conn.execute_batch(migration)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Insert or replace a batch of candidates in one transaction
    pub fn import_candidates(&self, candidates: &[Candidate]) -> Result<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        for candidate in candidates {
            insert_candidate(&tx, candidate)?;
        }
        tx.commit()?;

        tracing::info!("Imported {} candidates", candidates.len());
        Ok(candidates.len())
    }

    /// Every candidate, active or not, optionally restricted to one city
    pub fn list_candidates(&self, city: Option<&str>) -> Result<Vec<Candidate>> {
        let candidates = self.query_candidates(&format!(
            "SELECT {} FROM candidates ORDER BY id",
            CANDIDATE_COLUMNS
        ))?;

        // SQLite's lower() only folds ASCII, so city matching happens here
        Ok(match city {
            Some(city) => candidates.into_iter().filter(|c| c.in_city(city)).collect(),
            None => candidates,
        })
    }

    pub fn get_candidate(&self, id: i64) -> Result<Option<Candidate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM candidates WHERE id = ?1",
            CANDIDATE_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], candidate_from_row)?;
        Ok(rows.next().transpose()?)
    }

    /// Open or close a collection point; returns false if `id` is unknown
    pub fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE candidates SET active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Ok(changed > 0)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.get_conn()?;

        let candidate_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM candidates", [], |row| row.get(0))?;

        let active_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM candidates WHERE active = 1",
            [],
            |row| row.get(0),
        )?;

        let city_count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT city) FROM candidates",
            [],
            |row| row.get(0),
        )?;

        Ok(DbStats {
            candidate_count: candidate_count as usize,
            active_count: active_count as usize,
            city_count: city_count as usize,
        })
    }

    fn query_candidates(&self, sql: &str) -> Result<Vec<Candidate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let candidates = stmt
            .query_map([], candidate_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(candidates)
    }
}

impl CandidateRepository for Database {
    fn active_candidates(&self) -> Result<Vec<Candidate>> {
        self.query_candidates(&format!(
            "SELECT {} FROM candidates WHERE active = 1 ORDER BY id",
            CANDIDATE_COLUMNS
        ))
    }
}

fn insert_candidate(conn: &rusqlite::Connection, candidate: &Candidate) -> Result<()> {
    let image_refs = serde_json::to_string(&candidate.image_refs).map_err(|e| ColetaError::Json {
        source: e,
        context: format!("Failed to encode image refs of candidate {}", candidate.id),
    })?;

    conn.execute(
        "INSERT OR REPLACE INTO candidates
            (id, kind, description, city, district, street, stock, image_refs, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            candidate.id,
            candidate.kind,
            candidate.description,
            candidate.city,
            candidate.district,
            candidate.street,
            candidate.stock,
            image_refs,
            candidate.active,
        ],
    )?;
    Ok(())
}

fn candidate_from_row(row: &Row<'_>) -> rusqlite::Result<Candidate> {
    let image_refs: String = row.get(7)?;
    let image_refs: Vec<String> = serde_json::from_str(&image_refs).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Candidate {
        id: row.get(0)?,
        kind: row.get(1)?,
        description: row.get(2)?,
        city: row.get(3)?,
        district: row.get(4)?,
        street: row.get(5)?,
        stock: row.get(6)?,
        image_refs,
        active: row.get(8)?,
    })
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStats {
    pub candidate_count: usize,
    pub active_count: usize,
    pub city_count: usize,
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: collection-point candidates
    r#"
    CREATE TABLE candidates (
        id INTEGER PRIMARY KEY,
        kind TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        city TEXT NOT NULL,
        district TEXT NOT NULL DEFAULT '',
        street TEXT NOT NULL DEFAULT '',
        stock TEXT NOT NULL DEFAULT '',
        image_refs TEXT NOT NULL DEFAULT '[]',
        active INTEGER NOT NULL DEFAULT 1
    );

    CREATE INDEX idx_candidates_active ON candidates(active);
    "#,
];

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("data").join("test.db")).unwrap();
        (temp_dir, db)
    }

    #[test]
    fn test_migrations() {
        let (_temp, db) = open();
        let conn = db.get_conn().unwrap();
        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM _migrations", [], |row| row.get(0))
            .unwrap();

        assert_eq!(version, MIGRATIONS.len() as i32);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.db");
        {
            let db = Database::new(&path).unwrap();
            db.import_candidates(&[Candidate::new(1, "Alimentos", "Recife", "arroz")])
                .unwrap();
        }

        let db = Database::new(&path).unwrap();
        assert_eq!(db.stats().unwrap().candidate_count, 1);
    }

    #[test]
    fn test_candidate_fields_survive() {
        let (_temp, db) = open();
        let mut candidate = Candidate::new(4, "Água Potável", "São Paulo", "galão, garrafinha")
            .with_description("Ponto na escola")
            .with_address("Centro", "Rua A, 10");
        candidate.image_refs = vec!["a.jpg".to_string(), "b.jpg".to_string()];

        db.import_candidates(std::slice::from_ref(&candidate)).unwrap();
        assert_eq!(db.get_candidate(4).unwrap(), Some(candidate));
        assert_eq!(db.get_candidate(5).unwrap(), None);
    }

    #[test]
    fn test_active_candidates_ordered_by_id() {
        let (_temp, db) = open();
        db.import_candidates(&[
            Candidate::new(3, "Roupas", "Recife", "casaco"),
            Candidate::new(1, "Alimentos", "Recife", "arroz"),
            Candidate::new(2, "Medicamentos", "Olinda", "gaze"),
        ])
        .unwrap();
        assert!(db.set_active(2, false).unwrap());
        assert!(!db.set_active(99, false).unwrap());

        let ids: Vec<i64> = db
            .active_candidates()
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);

        let stats = db.stats().unwrap();
        assert_eq!(stats.candidate_count, 3);
        assert_eq!(stats.active_count, 2);
        assert_eq!(stats.city_count, 2);
    }

    #[test]
    fn test_list_by_city_folds_unicode() {
        let (_temp, db) = open();
        db.import_candidates(&[
            Candidate::new(1, "Alimentos", "São Paulo", "arroz"),
            Candidate::new(2, "Alimentos", "Recife", "arroz"),
        ])
        .unwrap();

        let listed = db.list_candidates(Some("SÃO PAULO")).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 1);
    }
}
