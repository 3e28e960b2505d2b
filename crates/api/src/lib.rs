//! # folio-api
//!
//! The query layer of the folio catalog: relation loaders, per-request scope
//! binding, and the resolver surface an executor drives.
//!
//! Resolving a page of books and then each book's authors would normally
//! issue one query per book. Here every relation edge goes through a
//! [`Loaders`] registry instead: concurrent resolutions of the same edge
//! type coalesce into one bulk repository read per batch window.
//!
//! The registry is request-scoped. A [`ScopeBinder`] is created once per
//! process and asked for a fresh [`RequestScope`] at the start of every
//! inbound request, ahead of any traversal logic; resolvers take that scope
//! as an explicit parameter, so results batched or memoized for one request
//! can never bleed into another.
//!
//! Query-language parsing, schema validation, and transport belong to the
//! executor driving [`Resolvers`]; this crate is the in-process coordination
//! layer between that executor and the data store.

pub mod error;
pub mod loaders;
pub mod resolvers;
pub mod scope;

#[cfg(test)]
mod tests;

pub use error::{ApiError, ApiResult};
pub use loaders::Loaders;
pub use resolvers::{AgentInput, AuthorInput, BookInput, Resolvers};
pub use scope::{RequestScope, ScopeBinder};
