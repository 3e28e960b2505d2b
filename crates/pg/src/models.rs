//! Catalog entities and the row shapes returned by the bulk relation reads.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A literary agent. Represents one or more authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// An author. Belongs to exactly one agent; may have written many books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub website: Option<String>,
    pub agent_id: i64,
}

/// A book. Linked to its authors through the `book_authors` join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub cover: String,
}

/// Row from the agents-by-author bulk read. Carries the author key the row
/// was matched on so the relation adapter can align output with input keys.
#[derive(Debug, Clone, FromRow)]
pub struct AgentByAuthorRow {
    pub author_id: i64,
    #[sqlx(flatten)]
    pub agent: Agent,
}

/// Row from the books-by-author bulk read.
#[derive(Debug, Clone, FromRow)]
pub struct BookByAuthorRow {
    pub author_id: i64,
    #[sqlx(flatten)]
    pub book: Book,
}

/// Row from the authors-by-book bulk read.
#[derive(Debug, Clone, FromRow)]
pub struct AuthorByBookRow {
    pub book_id: i64,
    #[sqlx(flatten)]
    pub author: Author,
}
