//! Octodock Server Library
//!
//! Core functionality for the Octodock server:
//! - SQLite storage for users, notes and the media catalog
//! - JWT authentication and password hashing
//! - Media storage service with pluggable metadata index
//! - WebSocket broadcast with heartbeat eviction
//! - axum HTTP surface with per-IP rate limiting

pub mod auth;
pub mod broadcast;
pub mod media;
pub mod server;
pub mod storage;
