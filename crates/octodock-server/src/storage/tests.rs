//! Storage layer tests for the Octodock server.

use super::db::ServerDatabase;
use super::models::MediaRow;
use super::queries_notes::NoteChanges;
use octodock_core::db::DatabaseError;

async fn test_db() -> ServerDatabase {
    ServerDatabase::open_in_memory().await.unwrap()
}

fn media_row(id: &str) -> MediaRow {
    MediaRow {
        id: id.to_string(),
        stored_file_name: format!("{id}.txt"),
        original_name: "note.txt".to_string(),
        mime_type: "text/plain".to_string(),
        size_bytes: 5,
        storage_path: format!("/tmp/uploads/{id}.txt"),
        created_at: 1_700_000_000,
    }
}

// === User tests ===

#[tokio::test]
async fn create_and_get_user() {
    let db = test_db().await;
    let user = db
        .create_user("u1", "Alice", "alice@example.com", "hash123")
        .await
        .unwrap();

    assert_eq!(user.id, "u1");
    assert_eq!(user.name, "Alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(db.get_user("u1").await.unwrap().password_hash, "hash123");
}

#[tokio::test]
async fn get_user_by_email() {
    let db = test_db().await;
    db.create_user("u1", "Alice", "alice@example.com", "hash123")
        .await
        .unwrap();

    let user = db.get_user_by_email("alice@example.com").await.unwrap();
    assert_eq!(user.map(|u| u.id).as_deref(), Some("u1"));
    assert!(db.get_user_by_email("bob@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let db = test_db().await;
    db.create_user("u1", "Alice", "alice@example.com", "h")
        .await
        .unwrap();

    let err = db
        .create_user("u2", "Other Alice", "alice@example.com", "h")
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let db = test_db().await;
    assert!(matches!(
        db.get_user("nope").await,
        Err(DatabaseError::NotFound(_))
    ));
}

// === Note tests ===

#[tokio::test]
async fn notes_list_in_creation_order() {
    let db = test_db().await;
    db.create_note("n2", "Second id, first note", "a").await.unwrap();
    db.create_note("n1", "First id, second note", "b").await.unwrap();

    let ids: Vec<String> = db.list_notes().await.unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["n2", "n1"]);
}

#[tokio::test]
async fn partial_note_update_keeps_other_fields() {
    let db = test_db().await;
    db.create_note("n1", "Title", "Body").await.unwrap();

    let updated = db
        .update_note(
            "n1",
            &NoteChanges {
                title: Some("Renamed".into()),
                content: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.content, "Body");
}

#[tokio::test]
async fn update_missing_note_is_not_found() {
    let db = test_db().await;
    let err = db
        .update_note("ghost", &NoteChanges::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound(_)));
}

#[tokio::test]
async fn delete_note_reports_presence() {
    let db = test_db().await;
    db.create_note("n1", "Title", "Body").await.unwrap();

    assert!(db.delete_note("n1").await.unwrap());
    assert!(!db.delete_note("n1").await.unwrap());
    assert!(db.get_note("n1").await.is_err());
}

// === Media catalog tests ===

#[tokio::test]
async fn media_insert_get_delete() {
    let db = test_db().await;
    db.put_media(&media_row("m1")).await.unwrap();

    let row = db.get_media("m1").await.unwrap().unwrap();
    assert_eq!(row.original_name, "note.txt");
    assert_eq!(row.size_bytes, 5);

    let removed = db.delete_media("m1").await.unwrap();
    assert_eq!(removed.map(|r| r.id).as_deref(), Some("m1"));
    assert!(db.get_media("m1").await.unwrap().is_none());
    assert!(db.delete_media("m1").await.unwrap().is_none());
}

#[tokio::test]
async fn media_put_overwrites_in_place() {
    let db = test_db().await;
    db.put_media(&media_row("a")).await.unwrap();
    db.put_media(&media_row("b")).await.unwrap();

    let mut changed = media_row("a");
    changed.size_bytes = 42;
    db.put_media(&changed).await.unwrap();

    let rows = db.list_media(10, 0).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "a");
    assert_eq!(rows[0].size_bytes, 42);
}

#[tokio::test]
async fn media_list_pages_in_insertion_order() {
    let db = test_db().await;
    for id in ["c", "a", "b"] {
        db.put_media(&media_row(id)).await.unwrap();
    }

    let first: Vec<String> = db
        .list_media(2, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    let second: Vec<String> = db
        .list_media(2, 2)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(first, vec!["c", "a"]);
    assert_eq!(second, vec!["b"]);
    assert!(db.list_media(2, 4).await.unwrap().is_empty());
}
