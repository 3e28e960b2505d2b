//! Postgres implementation of the repository.
//!
//! Bulk relation reads use `= ANY($1)` array binds so one dispatched batch
//! is always answered by exactly one statement. Multi-statement writes run
//! inside a transaction; a transaction dropped before commit rolls back.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::{Agent, AgentByAuthorRow, Author, AuthorByBookRow, Book, BookByAuthorRow};
use crate::repository::{
    CreateAgentParams, CreateAuthorParams, CreateBookParams, Repository, UpdateAgentParams,
    UpdateAuthorParams, UpdateBookParams,
};

/// Repository backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool for the given database URL.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;
        debug!("Connected to database");
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying pool, for callers that need to issue their own
    /// statements.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn set_book_authors(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        book_id: i64,
        author_ids: &[i64],
    ) -> StoreResult<()> {
        for author_id in author_ids {
            sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES ($1, $2)")
                .bind(book_id)
                .bind(author_id)
                .execute(&mut **tx)
                .await
                .map_err(StoreError::on_table("book_authors"))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_agent(&self, params: CreateAgentParams) -> StoreResult<Agent> {
        sqlx::query_as::<_, Agent>(
            "INSERT INTO agents (name, email) VALUES ($1, $2) RETURNING id, name, email",
        )
        .bind(&params.name)
        .bind(&params.email)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::on_table("agents"))
    }

    async fn update_agent(&self, params: UpdateAgentParams) -> StoreResult<Agent> {
        sqlx::query_as::<_, Agent>(
            "UPDATE agents SET name = $2, email = $3 WHERE id = $1 \
             RETURNING id, name, email",
        )
        .bind(params.id)
        .bind(&params.name)
        .bind(&params.email)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::on_table("agents"))
    }

    async fn delete_agent(&self, id: i64) -> StoreResult<Agent> {
        sqlx::query_as::<_, Agent>("DELETE FROM agents WHERE id = $1 RETURNING id, name, email")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::on_table("agents"))
    }

    async fn get_agent(&self, id: i64) -> StoreResult<Agent> {
        sqlx::query_as::<_, Agent>("SELECT id, name, email FROM agents WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::on_table("agents"))
    }

    async fn list_agents(&self) -> StoreResult<Vec<Agent>> {
        let agents = sqlx::query_as::<_, Agent>("SELECT id, name, email FROM agents ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(agents)
    }

    async fn create_author(&self, params: CreateAuthorParams) -> StoreResult<Author> {
        sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name, website, agent_id) VALUES ($1, $2, $3) \
             RETURNING id, name, website, agent_id",
        )
        .bind(&params.name)
        .bind(&params.website)
        .bind(params.agent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::on_table("authors"))
    }

    async fn update_author(&self, params: UpdateAuthorParams) -> StoreResult<Author> {
        sqlx::query_as::<_, Author>(
            "UPDATE authors SET name = $2, website = $3, agent_id = $4 WHERE id = $1 \
             RETURNING id, name, website, agent_id",
        )
        .bind(params.id)
        .bind(&params.name)
        .bind(&params.website)
        .bind(params.agent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::on_table("authors"))
    }

    async fn delete_author(&self, id: i64) -> StoreResult<Author> {
        sqlx::query_as::<_, Author>(
            "DELETE FROM authors WHERE id = $1 RETURNING id, name, website, agent_id",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::on_table("authors"))
    }

    async fn get_author(&self, id: i64) -> StoreResult<Author> {
        sqlx::query_as::<_, Author>(
            "SELECT id, name, website, agent_id FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::on_table("authors"))
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT id, name, website, agent_id FROM authors ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    async fn create_book(&self, params: CreateBookParams, author_ids: &[i64]) -> StoreResult<Book> {
        debug!(
            "Creating book '{}' with {} author links",
            params.title,
            author_ids.len()
        );
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(format!("Failed to begin: {e}")))?;

        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (title, description, cover) VALUES ($1, $2, $3) \
             RETURNING id, title, description, cover",
        )
        .bind(&params.title)
        .bind(&params.description)
        .bind(&params.cover)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::on_table("books"))?;

        Self::set_book_authors(&mut tx, book.id, author_ids).await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(format!("Failed to commit: {e}")))?;
        Ok(book)
    }

    async fn update_book(&self, params: UpdateBookParams, author_ids: &[i64]) -> StoreResult<Book> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(format!("Failed to begin: {e}")))?;

        let book = sqlx::query_as::<_, Book>(
            "UPDATE books SET title = $2, description = $3, cover = $4 WHERE id = $1 \
             RETURNING id, title, description, cover",
        )
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.description)
        .bind(&params.cover)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::on_table("books"))?;

        sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
            .bind(book.id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::on_table("book_authors"))?;

        Self::set_book_authors(&mut tx, book.id, author_ids).await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(format!("Failed to commit: {e}")))?;
        Ok(book)
    }

    async fn delete_book(&self, id: i64) -> StoreResult<Book> {
        // book_authors rows cascade.
        sqlx::query_as::<_, Book>(
            "DELETE FROM books WHERE id = $1 RETURNING id, title, description, cover",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::on_table("books"))
    }

    async fn get_book(&self, id: i64) -> StoreResult<Book> {
        sqlx::query_as::<_, Book>("SELECT id, title, description, cover FROM books WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::on_table("books"))
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        let books =
            sqlx::query_as::<_, Book>("SELECT id, title, description, cover FROM books ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(books)
    }

    async fn agents_by_author_ids(
        &self,
        author_ids: &[i64],
    ) -> StoreResult<Vec<AgentByAuthorRow>> {
        debug!("Bulk-fetching agents for {} authors", author_ids.len());
        let rows = sqlx::query_as::<_, AgentByAuthorRow>(
            "SELECT authors.id AS author_id, agents.id, agents.name, agents.email \
             FROM authors JOIN agents ON agents.id = authors.agent_id \
             WHERE authors.id = ANY($1)",
        )
        .bind(author_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn authors_by_agent_ids(&self, agent_ids: &[i64]) -> StoreResult<Vec<Author>> {
        debug!("Bulk-fetching authors for {} agents", agent_ids.len());
        let rows = sqlx::query_as::<_, Author>(
            "SELECT id, name, website, agent_id FROM authors \
             WHERE agent_id = ANY($1) ORDER BY agent_id, id",
        )
        .bind(agent_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn books_by_author_ids(&self, author_ids: &[i64]) -> StoreResult<Vec<BookByAuthorRow>> {
        debug!("Bulk-fetching books for {} authors", author_ids.len());
        let rows = sqlx::query_as::<_, BookByAuthorRow>(
            "SELECT ba.author_id, b.id, b.title, b.description, b.cover \
             FROM book_authors ba JOIN books b ON b.id = ba.book_id \
             WHERE ba.author_id = ANY($1) ORDER BY ba.author_id, b.id",
        )
        .bind(author_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn authors_by_book_ids(&self, book_ids: &[i64]) -> StoreResult<Vec<AuthorByBookRow>> {
        debug!("Bulk-fetching authors for {} books", book_ids.len());
        let rows = sqlx::query_as::<_, AuthorByBookRow>(
            "SELECT ba.book_id, a.id, a.name, a.website, a.agent_id \
             FROM book_authors ba JOIN authors a ON a.id = ba.author_id \
             WHERE ba.book_id = ANY($1) ORDER BY ba.book_id, a.id",
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
