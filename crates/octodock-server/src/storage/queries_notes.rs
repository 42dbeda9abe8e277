//! Note queries for the Octodock server.

use octodock_core::db::{DatabaseError, unix_timestamp};

use super::db::ServerDatabase;
use super::models::Note;

/// Partial update of a note; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl ServerDatabase {
    pub async fn create_note(
        &self,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<Note, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO notes (id, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_note(id).await
    }

    pub async fn get_note(&self, id: &str) -> Result<Note, DatabaseError> {
        sqlx::query_as::<_, Note>(
            "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Note {id}")))
    }

    /// List all notes in creation order.
    pub async fn list_notes(&self) -> Result<Vec<Note>, DatabaseError> {
        let notes = sqlx::query_as::<_, Note>(
            "SELECT id, title, content, created_at, updated_at FROM notes ORDER BY seq ASC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(notes)
    }

    /// Apply `changes` to a note and refresh `updated_at`.
    pub async fn update_note(&self, id: &str, changes: &NoteChanges) -> Result<Note, DatabaseError> {
        let result = sqlx::query(
            "UPDATE notes SET title = COALESCE(?, title), content = COALESCE(?, content), updated_at = ? WHERE id = ?",
        )
        .bind(changes.title.as_deref())
        .bind(changes.content.as_deref())
        .bind(unix_timestamp())
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Note {id}")));
        }
        self.get_note(id).await
    }

    /// Delete a note. Returns `false` when no note had that ID.
    pub async fn delete_note(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
