//! `SQLite` storage for the Octodock server.
//!
//! Provides persistence for users, notes, and the durable media catalog.

mod db;
mod models;
mod queries;
mod queries_media;
mod queries_notes;

#[cfg(test)]
mod tests;

pub use db::ServerDatabase;
pub use models::*;
pub use octodock_core::db::DatabaseError;
pub use queries_notes::NoteChanges;
