//! The application's data-layer functionality.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::models::{Agent, AgentByAuthorRow, Author, AuthorByBookRow, Book, BookByAuthorRow};

/// Parameters for creating an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAgentParams {
    pub name: String,
    pub email: String,
}

/// Parameters for updating an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAgentParams {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Parameters for creating an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuthorParams {
    pub name: String,
    pub website: Option<String>,
    pub agent_id: i64,
}

/// Parameters for updating an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAuthorParams {
    pub id: i64,
    pub name: String,
    pub website: Option<String>,
    pub agent_id: i64,
}

/// Parameters for creating a book. Author links are passed separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookParams {
    pub title: String,
    pub description: String,
    pub cover: String,
}

/// Parameters for updating a book. Author links are passed separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookParams {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub cover: String,
}

/// Data-store operations consumed by the query layer and the relation
/// loaders.
///
/// The `*_by_*_ids` bulk reads are the contract the batching engine depends
/// on: each issues exactly one statement for the whole key list and returns
/// rows tagged with the key they were matched on. They must not depend on
/// any request-scoped state beyond their arguments.
#[async_trait]
pub trait Repository: Send + Sync {
    // agent queries
    async fn create_agent(&self, params: CreateAgentParams) -> StoreResult<Agent>;
    async fn update_agent(&self, params: UpdateAgentParams) -> StoreResult<Agent>;
    async fn delete_agent(&self, id: i64) -> StoreResult<Agent>;
    async fn get_agent(&self, id: i64) -> StoreResult<Agent>;
    async fn list_agents(&self) -> StoreResult<Vec<Agent>>;

    // author queries
    async fn create_author(&self, params: CreateAuthorParams) -> StoreResult<Author>;
    async fn update_author(&self, params: UpdateAuthorParams) -> StoreResult<Author>;
    async fn delete_author(&self, id: i64) -> StoreResult<Author>;
    async fn get_author(&self, id: i64) -> StoreResult<Author>;
    async fn list_authors(&self) -> StoreResult<Vec<Author>>;

    // book queries
    async fn create_book(&self, params: CreateBookParams, author_ids: &[i64]) -> StoreResult<Book>;
    async fn update_book(&self, params: UpdateBookParams, author_ids: &[i64]) -> StoreResult<Book>;
    async fn delete_book(&self, id: i64) -> StoreResult<Book>;
    async fn get_book(&self, id: i64) -> StoreResult<Book>;
    async fn list_books(&self) -> StoreResult<Vec<Book>>;

    // bulk reads backing the relation loaders
    async fn agents_by_author_ids(&self, author_ids: &[i64])
        -> StoreResult<Vec<AgentByAuthorRow>>;
    async fn authors_by_agent_ids(&self, agent_ids: &[i64]) -> StoreResult<Vec<Author>>;
    async fn books_by_author_ids(&self, author_ids: &[i64]) -> StoreResult<Vec<BookByAuthorRow>>;
    async fn authors_by_book_ids(&self, book_ids: &[i64]) -> StoreResult<Vec<AuthorByBookRow>>;
}
