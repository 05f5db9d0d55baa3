//! School (tenant) domain entities.

pub mod model;

pub use model::School;
