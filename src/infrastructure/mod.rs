//! Infrastructure layer: concrete storage adapters.

pub mod persistence;
