//! # folio-pg
//!
//! The data layer for the folio catalog: entities, the `Repository` trait
//! consumed by the query layer, and its Postgres implementation.
//!
//! The repository exposes two kinds of reads. Single-entity and list
//! operations back the top-level query surface directly. The
//! `*_by_*_ids` bulk reads back the relation loaders: each takes the full
//! key list of one dispatched batch and answers it with a single SQL
//! statement, returning rows tagged with the foreign key they were matched
//! on so the caller can regroup them per key.

pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use models::{Agent, AgentByAuthorRow, Author, AuthorByBookRow, Book, BookByAuthorRow};
pub use postgres::PgRepository;
pub use repository::{
    CreateAgentParams, CreateAuthorParams, CreateBookParams, Repository, UpdateAgentParams,
    UpdateAuthorParams, UpdateBookParams,
};
