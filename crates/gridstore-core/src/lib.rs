//! Core types and the storage contract for gridstore backends.
//!
//! This crate defines the abstractions shared between the local-file and
//! remote-worksheet implementations:
//! - `TableStore`: the backend contract (ensure/read/append/replace/update)
//! - `Value`, `Row`, `TableData`: the tabular data model
//! - `SchemaRegistry`: declared table layouts and schema-shaped empty results
//! - `StoreError`: the error taxonomy shared by all backends

mod error;
mod row;
mod schema;
mod store;
mod value;

pub use error::StoreError;
pub use row::{Row, TableData};
pub use schema::SchemaRegistry;
pub use store::{RowPredicate, RowTransform, TableStore};
pub use value::Value;
