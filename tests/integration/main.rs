//! Transport-level integration tests.
//!
//! These exercise the router, extractors, and validation boundary without
//! a live database: the pool is lazily constructed and every asserted
//! path rejects before a query runs.

mod helpers;
mod member_bulk_test;
mod roster_import_test;
