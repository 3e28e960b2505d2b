//! One batch loader per relation edge, plus the fetch adapters that reshape
//! flat bulk-read rows into per-key results.
//!
//! The adapters are the only place the "rows → grouped, key-order-aligned
//! output" reshaping happens; the engine underneath works purely in terms of
//! opaque keys and values. Each adapter issues exactly one repository call
//! per dispatched batch, groups the returned rows by the foreign key the
//! batch was keyed on, and emits output position-aligned with the input key
//! list — an empty collection (or `None` for the singular relation) for keys
//! with no matching rows, never an omission.

use std::collections::HashMap;
use std::sync::Arc;

use folio_loader::{BatchConfig, BatchLoader};
use folio_pg::{Agent, Author, Book, Repository};

/// The relation loaders for one request.
///
/// The set of relations is fixed at construction; only each loader's
/// internal batch state mutates afterwards. Instances must never outlive or
/// be shared across requests — batched and memoized results would leak
/// between callers with different identities.
pub struct Loaders {
    /// The agent representing an author (many-to-one).
    pub agent_by_author: BatchLoader<i64, Option<Agent>>,
    /// The authors represented by an agent (one-to-many).
    pub authors_by_agent: BatchLoader<i64, Vec<Author>>,
    /// The books written by an author (many-to-many).
    pub books_by_author: BatchLoader<i64, Vec<Book>>,
    /// The authors of a book (many-to-many).
    pub authors_by_book: BatchLoader<i64, Vec<Author>>,
}

impl Loaders {
    /// Build every relation loader against the given repository.
    pub fn new(repo: Arc<dyn Repository>, config: BatchConfig) -> Self {
        Self {
            agent_by_author: agent_by_author(Arc::clone(&repo), config.clone()),
            authors_by_agent: authors_by_agent(Arc::clone(&repo), config.clone()),
            books_by_author: books_by_author(Arc::clone(&repo), config.clone()),
            authors_by_book: authors_by_book(repo, config),
        }
    }
}

fn agent_by_author(
    repo: Arc<dyn Repository>,
    config: BatchConfig,
) -> BatchLoader<i64, Option<Agent>> {
    BatchLoader::with_config(config, move |author_ids: Vec<i64>| {
        let repo = Arc::clone(&repo);
        async move {
            let rows = repo.agents_by_author_ids(&author_ids).await?;
            let mut by_author: HashMap<i64, Agent> = rows
                .into_iter()
                .map(|row| (row.author_id, row.agent))
                .collect();
            Ok(author_ids.iter().map(|id| by_author.remove(id)).collect())
        }
    })
}

fn authors_by_agent(
    repo: Arc<dyn Repository>,
    config: BatchConfig,
) -> BatchLoader<i64, Vec<Author>> {
    BatchLoader::with_config(config, move |agent_ids: Vec<i64>| {
        let repo = Arc::clone(&repo);
        async move {
            let authors = repo.authors_by_agent_ids(&agent_ids).await?;
            let mut grouped: HashMap<i64, Vec<Author>> = HashMap::new();
            for author in authors {
                grouped.entry(author.agent_id).or_default().push(author);
            }
            Ok(agent_ids
                .iter()
                .map(|id| grouped.remove(id).unwrap_or_default())
                .collect())
        }
    })
}

fn books_by_author(
    repo: Arc<dyn Repository>,
    config: BatchConfig,
) -> BatchLoader<i64, Vec<Book>> {
    BatchLoader::with_config(config, move |author_ids: Vec<i64>| {
        let repo = Arc::clone(&repo);
        async move {
            let rows = repo.books_by_author_ids(&author_ids).await?;
            let mut grouped: HashMap<i64, Vec<Book>> = HashMap::new();
            for row in rows {
                grouped.entry(row.author_id).or_default().push(row.book);
            }
            Ok(author_ids
                .iter()
                .map(|id| grouped.remove(id).unwrap_or_default())
                .collect())
        }
    })
}

fn authors_by_book(
    repo: Arc<dyn Repository>,
    config: BatchConfig,
) -> BatchLoader<i64, Vec<Author>> {
    BatchLoader::with_config(config, move |book_ids: Vec<i64>| {
        let repo = Arc::clone(&repo);
        async move {
            let rows = repo.authors_by_book_ids(&book_ids).await?;
            let mut grouped: HashMap<i64, Vec<Author>> = HashMap::new();
            for row in rows {
                grouped.entry(row.book_id).or_default().push(row.author);
            }
            Ok(book_ids
                .iter()
                .map(|id| grouped.remove(id).unwrap_or_default())
                .collect())
        }
    })
}
