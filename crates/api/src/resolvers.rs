//! Resolvers for the catalog graph.
//!
//! Field resolvers route every relation edge through the request's loaders,
//! taking the [`RequestScope`] as an explicit parameter. Top-level query and
//! mutation resolvers are pass-throughs to the repository.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use folio_pg::{
    Agent, Author, Book, CreateAgentParams, CreateAuthorParams, CreateBookParams, Repository,
    UpdateAgentParams, UpdateAuthorParams, UpdateBookParams,
};

use crate::error::ApiResult;
use crate::scope::RequestScope;

/// Input for creating or updating an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInput {
    pub name: String,
    pub email: String,
}

/// Input for creating or updating an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorInput {
    pub name: String,
    pub website: Option<String>,
    pub agent_id: i64,
}

/// Input for creating or updating a book, including its author links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub description: String,
    pub cover: String,
    pub author_ids: Vec<i64>,
}

/// Connects the resolver surface with the data layer.
///
/// One instance serves the whole process; per-request state lives in the
/// [`RequestScope`] the executor passes to the field resolvers.
pub struct Resolvers {
    repo: Arc<dyn Repository>,
}

impl Resolvers {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    // field resolvers, batched through the request scope

    /// The authors represented by an agent.
    pub async fn agent_authors(
        &self,
        scope: &RequestScope,
        agent: &Agent,
    ) -> ApiResult<Vec<Author>> {
        Ok(scope.loaders().authors_by_agent.load(agent.id).await?)
    }

    /// The agent representing an author.
    pub async fn author_agent(
        &self,
        scope: &RequestScope,
        author: &Author,
    ) -> ApiResult<Option<Agent>> {
        Ok(scope.loaders().agent_by_author.load(author.id).await?)
    }

    /// The books written by an author.
    pub async fn author_books(
        &self,
        scope: &RequestScope,
        author: &Author,
    ) -> ApiResult<Vec<Book>> {
        Ok(scope.loaders().books_by_author.load(author.id).await?)
    }

    /// The authors of a book.
    pub async fn book_authors(&self, scope: &RequestScope, book: &Book) -> ApiResult<Vec<Author>> {
        Ok(scope.loaders().authors_by_book.load(book.id).await?)
    }

    // query resolvers

    pub async fn agent(&self, id: i64) -> ApiResult<Agent> {
        Ok(self.repo.get_agent(id).await?)
    }

    pub async fn agents(&self) -> ApiResult<Vec<Agent>> {
        Ok(self.repo.list_agents().await?)
    }

    pub async fn author(&self, id: i64) -> ApiResult<Author> {
        Ok(self.repo.get_author(id).await?)
    }

    pub async fn authors(&self) -> ApiResult<Vec<Author>> {
        Ok(self.repo.list_authors().await?)
    }

    pub async fn book(&self, id: i64) -> ApiResult<Book> {
        Ok(self.repo.get_book(id).await?)
    }

    pub async fn books(&self) -> ApiResult<Vec<Book>> {
        Ok(self.repo.list_books().await?)
    }

    // mutation resolvers

    pub async fn create_agent(&self, input: AgentInput) -> ApiResult<Agent> {
        Ok(self
            .repo
            .create_agent(CreateAgentParams {
                name: input.name,
                email: input.email,
            })
            .await?)
    }

    pub async fn update_agent(&self, id: i64, input: AgentInput) -> ApiResult<Agent> {
        Ok(self
            .repo
            .update_agent(UpdateAgentParams {
                id,
                name: input.name,
                email: input.email,
            })
            .await?)
    }

    pub async fn delete_agent(&self, id: i64) -> ApiResult<Agent> {
        Ok(self.repo.delete_agent(id).await?)
    }

    pub async fn create_author(&self, input: AuthorInput) -> ApiResult<Author> {
        Ok(self
            .repo
            .create_author(CreateAuthorParams {
                name: input.name,
                website: input.website,
                agent_id: input.agent_id,
            })
            .await?)
    }

    pub async fn update_author(&self, id: i64, input: AuthorInput) -> ApiResult<Author> {
        Ok(self
            .repo
            .update_author(UpdateAuthorParams {
                id,
                name: input.name,
                website: input.website,
                agent_id: input.agent_id,
            })
            .await?)
    }

    pub async fn delete_author(&self, id: i64) -> ApiResult<Author> {
        Ok(self.repo.delete_author(id).await?)
    }

    pub async fn create_book(&self, input: BookInput) -> ApiResult<Book> {
        Ok(self
            .repo
            .create_book(
                CreateBookParams {
                    title: input.title,
                    description: input.description,
                    cover: input.cover,
                },
                &input.author_ids,
            )
            .await?)
    }

    pub async fn update_book(&self, id: i64, input: BookInput) -> ApiResult<Book> {
        Ok(self
            .repo
            .update_book(
                UpdateBookParams {
                    id,
                    title: input.title,
                    description: input.description,
                    cover: input.cover,
                },
                &input.author_ids,
            )
            .await?)
    }

    pub async fn delete_book(&self, id: i64) -> ApiResult<Book> {
        // Author links cascade with the book row.
        Ok(self.repo.delete_book(id).await?)
    }
}
