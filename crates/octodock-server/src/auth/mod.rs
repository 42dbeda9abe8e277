//! Authentication module for the Octodock server.
//!
//! Provides JWT token management and password hashing.

pub mod claims;
pub mod error;
pub mod jwt;
pub mod password;

pub use claims::Claims;
pub use error::AuthError;
pub use jwt::JwtManager;
