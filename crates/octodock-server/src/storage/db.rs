//! `SQLite` database handle for the Octodock server.

octodock_core::define_database!(ServerDatabase, "Server database migrations complete");
