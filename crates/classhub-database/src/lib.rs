//! # classhub-database
//!
//! PostgreSQL connection management, the migration runner, and repository
//! implementations for every ClassHub entity. Repositories expose the
//! capability traits the service layer consumes, so tests can substitute
//! in-memory implementations.

pub mod connection;
pub mod migration;
pub mod repositories;
