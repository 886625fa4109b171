//! SQLite Project/Message Store
//!
//! Projects and their append-only conversation logs, behind an r2d2
//! connection pool.

use std::path::{Path, PathBuf};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use crate::models::message::{StoredMessage, StoredRole};
use crate::models::project::Project;
use crate::services::llm::types::MessageContent;
use crate::utils::error::{AppError, AppResult};

#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (or create) the database file at the given path
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        Self::from_manager(manager, 8)
    }

    /// In-memory database for tests
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        // A shared cache is not needed; one connection keeps the memory db alive
        Self::from_manager(manager, 1)
    }

    fn from_manager(manager: SqliteConnectionManager, max_size: u32) -> AppResult<Self> {
        let pool = Pool::builder()
            .max_size(max_size)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {e}")))?;
        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn get_connection(&self) -> AppResult<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {e}")))
    }

    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS projects (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                root_path   TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id          TEXT PRIMARY KEY,
                project_id  TEXT NOT NULL,
                role        TEXT NOT NULL,
                content     TEXT NOT NULL,
                ordinal     INTEGER NOT NULL,
                created_at  TEXT NOT NULL,
                UNIQUE (project_id, ordinal),
                FOREIGN KEY (project_id) REFERENCES projects (id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_messages_project_ordinal
                ON messages (project_id, ordinal);",
        )?;
        Ok(())
    }

    /// Check if the database is reachable
    pub fn is_healthy(&self) -> bool {
        self.get_connection()
            .and_then(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                    .map_err(AppError::from)
            })
            .is_ok()
    }

    // ----- Projects -----

    /// Create a project. The root path must be an existing absolute directory.
    pub fn create_project(&self, name: &str, root_path: &Path) -> AppResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Project name must not be empty"));
        }
        if !root_path.is_absolute() {
            return Err(AppError::invalid_path(format!(
                "Project root must be absolute: {}",
                root_path.display()
            )));
        }
        if !root_path.is_dir() {
            return Err(AppError::invalid_path(format!(
                "Project root is not an existing directory: {}",
                root_path.display()
            )));
        }

        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            root_path: root_path.to_path_buf(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let conn = self.get_connection()?;
        let result = conn.execute(
            "INSERT INTO projects (id, name, root_path, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                project.id,
                project.name,
                project.root_path.to_string_lossy(),
                project.created_at
            ],
        );
        match result {
            Ok(_) => Ok(project),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(AppError::duplicate_name(name))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List all projects in creation order
    pub fn list_projects(&self) -> AppResult<Vec<Project>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, root_path, created_at FROM projects ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map([], Self::row_to_project)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
    }

    pub fn get_project(&self, id: &str) -> AppResult<Project> {
        let conn = self.get_connection()?;
        conn.query_row(
            "SELECT id, name, root_path, created_at FROM projects WHERE id = ?1",
            params![id],
            Self::row_to_project,
        )
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Project {id}")))
    }

    /// Delete a project and, via the FK cascade, its messages
    pub fn delete_project(&self, id: &str) -> AppResult<()> {
        let conn = self.get_connection()?;
        let affected = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(AppError::not_found(format!("Project {id}")));
        }
        Ok(())
    }

    fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            root_path: PathBuf::from(row.get::<_, String>(2)?),
            created_at: row.get(3)?,
        })
    }

    // ----- Messages -----

    /// Append a message, assigning the next ordinal inside one transaction
    pub fn append_message(
        &self,
        project_id: &str,
        role: StoredRole,
        blocks: &[MessageContent],
    ) -> AppResult<StoredMessage> {
        let content = serde_json::to_string(blocks)?;
        let mut conn = self.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: i64 = tx.query_row(
            "SELECT COUNT(*) FROM projects WHERE id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(AppError::not_found(format!("Project {project_id}")));
        }

        let ordinal: i64 = tx.query_row(
            "SELECT COALESCE(MAX(ordinal), 0) + 1 FROM messages WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;

        let message = StoredMessage {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            role,
            content,
            ordinal,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        tx.execute(
            "INSERT INTO messages (id, project_id, role, content, ordinal, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id,
                message.project_id,
                message.role.as_str(),
                message.content,
                message.ordinal,
                message.created_at
            ],
        )?;
        tx.commit()?;
        Ok(message)
    }

    /// Full conversation for a project, ordered by ordinal ascending
    pub fn get_history(&self, project_id: &str) -> AppResult<Vec<StoredMessage>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, role, content, ordinal, created_at
             FROM messages WHERE project_id = ?1 ORDER BY ordinal ASC",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (id, project_id, role, content, ordinal, created_at) = row?;
            let role = StoredRole::parse(&role)
                .ok_or_else(|| AppError::database(format!("Unknown message role: {role}")))?;
            messages.push(StoredMessage {
                id,
                project_id,
                role,
                content,
                ordinal,
                created_at,
            });
        }
        Ok(messages)
    }

    /// Delete all messages for a project; idempotent. Returns rows removed.
    pub fn clear_history(&self, project_id: &str) -> AppResult<usize> {
        let conn = self.get_connection()?;
        let affected = conn.execute(
            "DELETE FROM messages WHERE project_id = ?1",
            params![project_id],
        )?;
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn text(s: &str) -> Vec<MessageContent> {
        vec![MessageContent::Text {
            text: s.to_string(),
        }]
    }

    #[test]
    fn test_create_and_get_project() {
        let db = Database::new_in_memory().unwrap();
        let root = TempDir::new().unwrap();

        let project = db.create_project("demo", root.path()).unwrap();
        let fetched = db.get_project(&project.id).unwrap();
        assert_eq!(fetched, project);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = Database::new_in_memory().unwrap();
        let root = TempDir::new().unwrap();

        db.create_project("demo", root.path()).unwrap();
        let err = db.create_project("demo", root.path()).unwrap_err();
        assert!(matches!(err, AppError::DuplicateName(_)));
    }

    #[test]
    fn test_missing_root_rejected() {
        let db = Database::new_in_memory().unwrap();
        let err = db
            .create_project("demo", Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)));
    }

    #[test]
    fn test_ordinals_increase_per_project() {
        let db = Database::new_in_memory().unwrap();
        let root = TempDir::new().unwrap();
        let a = db.create_project("a", root.path()).unwrap();
        let b = db.create_project("b", root.path()).unwrap();

        for i in 0..3 {
            db.append_message(&a.id, StoredRole::User, &text(&format!("a{i}")))
                .unwrap();
        }
        db.append_message(&b.id, StoredRole::User, &text("b0"))
            .unwrap();

        let history = db.get_history(&a.id).unwrap();
        assert_eq!(
            history.iter().map(|m| m.ordinal).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(db.get_history(&b.id).unwrap()[0].ordinal, 1);
    }

    #[test]
    fn test_append_to_unknown_project() {
        let db = Database::new_in_memory().unwrap();
        let err = db
            .append_message("nope", StoredRole::User, &text("hi"))
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_delete_project_cascades() {
        let db = Database::new_in_memory().unwrap();
        let root = TempDir::new().unwrap();
        let project = db.create_project("demo", root.path()).unwrap();
        db.append_message(&project.id, StoredRole::User, &text("hi"))
            .unwrap();

        db.delete_project(&project.id).unwrap();
        assert!(matches!(
            db.get_project(&project.id),
            Err(AppError::NotFound(_))
        ));
        assert!(db.get_history(&project.id).unwrap().is_empty());
    }

    #[test]
    fn test_clear_history_idempotent() {
        let db = Database::new_in_memory().unwrap();
        let root = TempDir::new().unwrap();
        let project = db.create_project("demo", root.path()).unwrap();
        db.append_message(&project.id, StoredRole::User, &text("hi"))
            .unwrap();

        assert_eq!(db.clear_history(&project.id).unwrap(), 1);
        assert_eq!(db.clear_history(&project.id).unwrap(), 0);
        assert!(db.get_history(&project.id).unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("data.db");
        let root = TempDir::new().unwrap();

        let id = {
            let db = Database::new(&db_path).unwrap();
            db.create_project("demo", root.path()).unwrap().id
        };
        let db = Database::new(&db_path).unwrap();
        assert_eq!(db.get_project(&id).unwrap().name, "demo");
    }
}
