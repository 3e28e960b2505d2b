use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use folio_loader::BatchConfig;
use folio_pg::{
    Agent, AgentByAuthorRow, Author, AuthorByBookRow, Book, BookByAuthorRow, CreateAgentParams,
    CreateAuthorParams, CreateBookParams, Repository, StoreError, StoreResult, UpdateAgentParams,
    UpdateAuthorParams, UpdateBookParams,
};

use crate::{AgentInput, Loaders, Resolvers, ScopeBinder};

/// In-memory repository double. Bulk reads are recorded so tests can assert
/// how many queries a traversal actually issued and with which key lists.
struct MockRepo {
    agents: Mutex<Vec<Agent>>,
    authors: Mutex<Vec<Author>>,
    books: Mutex<Vec<Book>>,
    links: Mutex<Vec<(i64, i64)>>,
    next_id: AtomicI64,
    bulk_calls: AtomicUsize,
    bulk_keys: Mutex<Vec<Vec<i64>>>,
}

impl MockRepo {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            agents: Mutex::new(Vec::new()),
            authors: Mutex::new(Vec::new()),
            books: Mutex::new(Vec::new()),
            links: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1000),
            bulk_calls: AtomicUsize::new(0),
            bulk_keys: Mutex::new(Vec::new()),
        })
    }

    fn add_agent(&self, id: i64, name: &str) -> Agent {
        let agent = Agent {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        };
        self.agents.lock().unwrap().push(agent.clone());
        agent
    }

    fn add_author(&self, id: i64, name: &str, agent_id: i64) -> Author {
        let author = Author {
            id,
            name: name.to_string(),
            website: None,
            agent_id,
        };
        self.authors.lock().unwrap().push(author.clone());
        author
    }

    fn add_book(&self, id: i64, title: &str) -> Book {
        let book = Book {
            id,
            title: title.to_string(),
            description: String::new(),
            cover: String::new(),
        };
        self.books.lock().unwrap().push(book.clone());
        book
    }

    fn link(&self, book_id: i64, author_id: i64) {
        self.links.lock().unwrap().push((book_id, author_id));
    }

    fn record_bulk(&self, keys: &[i64]) {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        self.bulk_keys.lock().unwrap().push(keys.to_vec());
    }

    fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    fn bulk_keys(&self, n: usize) -> Vec<i64> {
        self.bulk_keys.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn create_agent(&self, params: CreateAgentParams) -> StoreResult<Agent> {
        let agent = Agent {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: params.name,
            email: params.email,
        };
        self.agents.lock().unwrap().push(agent.clone());
        Ok(agent)
    }

    async fn update_agent(&self, params: UpdateAgentParams) -> StoreResult<Agent> {
        let mut agents = self.agents.lock().unwrap();
        let agent = agents
            .iter_mut()
            .find(|a| a.id == params.id)
            .ok_or(StoreError::NotFound { table: "agents" })?;
        agent.name = params.name;
        agent.email = params.email;
        Ok(agent.clone())
    }

    async fn delete_agent(&self, id: i64) -> StoreResult<Agent> {
        let mut agents = self.agents.lock().unwrap();
        let pos = agents
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::NotFound { table: "agents" })?;
        Ok(agents.remove(pos))
    }

    async fn get_agent(&self, id: i64) -> StoreResult<Agent> {
        self.agents
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { table: "agents" })
    }

    async fn list_agents(&self) -> StoreResult<Vec<Agent>> {
        Ok(self.agents.lock().unwrap().clone())
    }

    async fn create_author(&self, params: CreateAuthorParams) -> StoreResult<Author> {
        let author = Author {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: params.name,
            website: params.website,
            agent_id: params.agent_id,
        };
        self.authors.lock().unwrap().push(author.clone());
        Ok(author)
    }

    async fn update_author(&self, params: UpdateAuthorParams) -> StoreResult<Author> {
        let mut authors = self.authors.lock().unwrap();
        let author = authors
            .iter_mut()
            .find(|a| a.id == params.id)
            .ok_or(StoreError::NotFound { table: "authors" })?;
        author.name = params.name;
        author.website = params.website;
        author.agent_id = params.agent_id;
        Ok(author.clone())
    }

    async fn delete_author(&self, id: i64) -> StoreResult<Author> {
        let mut authors = self.authors.lock().unwrap();
        let pos = authors
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::NotFound { table: "authors" })?;
        Ok(authors.remove(pos))
    }

    async fn get_author(&self, id: i64) -> StoreResult<Author> {
        self.authors
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { table: "authors" })
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        Ok(self.authors.lock().unwrap().clone())
    }

    async fn create_book(&self, params: CreateBookParams, author_ids: &[i64]) -> StoreResult<Book> {
        let book = Book {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: params.title,
            description: params.description,
            cover: params.cover,
        };
        self.books.lock().unwrap().push(book.clone());
        let mut links = self.links.lock().unwrap();
        for author_id in author_ids {
            links.push((book.id, *author_id));
        }
        Ok(book)
    }

    async fn update_book(&self, params: UpdateBookParams, author_ids: &[i64]) -> StoreResult<Book> {
        let mut books = self.books.lock().unwrap();
        let book = books
            .iter_mut()
            .find(|b| b.id == params.id)
            .ok_or(StoreError::NotFound { table: "books" })?;
        book.title = params.title;
        book.description = params.description;
        book.cover = params.cover;
        let updated = book.clone();
        drop(books);

        let mut links = self.links.lock().unwrap();
        links.retain(|(book_id, _)| *book_id != updated.id);
        for author_id in author_ids {
            links.push((updated.id, *author_id));
        }
        Ok(updated)
    }

    async fn delete_book(&self, id: i64) -> StoreResult<Book> {
        let mut books = self.books.lock().unwrap();
        let pos = books
            .iter()
            .position(|b| b.id == id)
            .ok_or(StoreError::NotFound { table: "books" })?;
        let removed = books.remove(pos);
        self.links.lock().unwrap().retain(|(book_id, _)| *book_id != id);
        Ok(removed)
    }

    async fn get_book(&self, id: i64) -> StoreResult<Book> {
        self.books
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { table: "books" })
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        Ok(self.books.lock().unwrap().clone())
    }

    async fn agents_by_author_ids(
        &self,
        author_ids: &[i64],
    ) -> StoreResult<Vec<AgentByAuthorRow>> {
        self.record_bulk(author_ids);
        let authors = self.authors.lock().unwrap();
        let agents = self.agents.lock().unwrap();
        Ok(authors
            .iter()
            .filter(|author| author_ids.contains(&author.id))
            .filter_map(|author| {
                agents
                    .iter()
                    .find(|agent| agent.id == author.agent_id)
                    .map(|agent| AgentByAuthorRow {
                        author_id: author.id,
                        agent: agent.clone(),
                    })
            })
            .collect())
    }

    async fn authors_by_agent_ids(&self, agent_ids: &[i64]) -> StoreResult<Vec<Author>> {
        self.record_bulk(agent_ids);
        Ok(self
            .authors
            .lock()
            .unwrap()
            .iter()
            .filter(|author| agent_ids.contains(&author.agent_id))
            .cloned()
            .collect())
    }

    async fn books_by_author_ids(&self, author_ids: &[i64]) -> StoreResult<Vec<BookByAuthorRow>> {
        self.record_bulk(author_ids);
        let links = self.links.lock().unwrap();
        let books = self.books.lock().unwrap();
        Ok(links
            .iter()
            .filter(|(_, author_id)| author_ids.contains(author_id))
            .filter_map(|(book_id, author_id)| {
                books.iter().find(|b| b.id == *book_id).map(|book| {
                    BookByAuthorRow {
                        author_id: *author_id,
                        book: book.clone(),
                    }
                })
            })
            .collect())
    }

    async fn authors_by_book_ids(&self, book_ids: &[i64]) -> StoreResult<Vec<AuthorByBookRow>> {
        self.record_bulk(book_ids);
        let links = self.links.lock().unwrap();
        let authors = self.authors.lock().unwrap();
        Ok(links
            .iter()
            .filter(|(book_id, _)| book_ids.contains(book_id))
            .filter_map(|(book_id, author_id)| {
                authors.iter().find(|a| a.id == *author_id).map(|author| {
                    AuthorByBookRow {
                        book_id: *book_id,
                        author: author.clone(),
                    }
                })
            })
            .collect())
    }
}

#[tokio::test(start_paused = true)]
async fn test_collection_adapter_groups_and_aligns_with_keys() {
    let repo = MockRepo::new();
    repo.add_book(1, "A");
    repo.add_book(2, "B");
    repo.link(1, 1);
    repo.link(2, 1);

    let loaders = Loaders::new(repo.clone(), BatchConfig::default());
    let results = loaders.books_by_author.load_many(vec![1, 2, 3]).await;

    let titles: Vec<Vec<String>> = results
        .into_iter()
        .map(|r| r.unwrap().into_iter().map(|b| b.title).collect())
        .collect();
    assert_eq!(
        titles,
        vec![vec!["A".to_string(), "B".to_string()], vec![], vec![]]
    );
    assert_eq!(repo.bulk_calls(), 1);
    assert_eq!(repo.bulk_keys(0), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_singular_adapter_yields_none_for_unmatched_keys() {
    let repo = MockRepo::new();
    let agent = repo.add_agent(1, "Smith");
    repo.add_author(5, "Woolf", 1);

    let loaders = Loaders::new(repo.clone(), BatchConfig::default());
    let results = loaders.agent_by_author.load_many(vec![5, 7]).await;

    let agents: Vec<Option<Agent>> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(agents, vec![Some(agent), None]);
}

#[tokio::test(start_paused = true)]
async fn test_many_to_many_adapter_groups_by_book() {
    let repo = MockRepo::new();
    let woolf = repo.add_author(1, "Woolf", 1);
    let eliot = repo.add_author(2, "Eliot", 1);
    repo.add_book(10, "Collected Essays");
    repo.link(10, 1);
    repo.link(10, 2);

    let loaders = Loaders::new(repo.clone(), BatchConfig::default());
    let results = loaders.authors_by_book.load_many(vec![10, 11]).await;

    let authors: Vec<Vec<Author>> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(authors, vec![vec![woolf, eliot], vec![]]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_field_resolution_issues_one_query() {
    let repo = MockRepo::new();
    let agent = repo.add_agent(1, "Smith");
    let a1 = repo.add_author(1, "Woolf", 1);
    let a2 = repo.add_author(2, "Eliot", 1);
    let a3 = repo.add_author(3, "Joyce", 1);

    let resolvers = Resolvers::new(repo.clone());
    let binder = ScopeBinder::new(repo.clone());
    let scope = binder.bind();

    let (r1, r2, r3) = tokio::join!(
        resolvers.author_agent(&scope, &a1),
        resolvers.author_agent(&scope, &a2),
        resolvers.author_agent(&scope, &a3),
    );

    assert_eq!(r1.unwrap(), Some(agent.clone()));
    assert_eq!(r2.unwrap(), Some(agent.clone()));
    assert_eq!(r3.unwrap(), Some(agent));
    assert_eq!(repo.bulk_calls(), 1);
    assert_eq!(repo.bulk_keys(0), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_scopes_do_not_share_batched_results() {
    let repo = MockRepo::new();
    repo.add_agent(1, "Smith");
    let author = repo.add_author(1, "Woolf", 1);

    let resolvers = Resolvers::new(repo.clone());
    let binder = ScopeBinder::new(repo.clone());

    let scope_a = binder.bind();
    resolvers.author_agent(&scope_a, &author).await.unwrap();
    assert_eq!(repo.bulk_calls(), 1);

    // Same key again in the same scope: served from the scope's memo.
    resolvers.author_agent(&scope_a, &author).await.unwrap();
    assert_eq!(repo.bulk_calls(), 1);

    // A fresh scope starts cold.
    let scope_b = binder.bind();
    resolvers.author_agent(&scope_b, &author).await.unwrap();
    assert_eq!(repo.bulk_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_scoped_runs_request_against_fresh_scope() {
    let repo = MockRepo::new();
    repo.add_agent(1, "Smith");
    let author = repo.add_author(1, "Woolf", 1);

    let resolvers = Resolvers::new(repo.clone());
    let binder = ScopeBinder::new(repo.clone());

    let agent = binder
        .scoped(|scope| async move {
            resolvers.author_agent(&scope, &author).await.unwrap()
        })
        .await;

    assert_eq!(agent.map(|a| a.name), Some("Smith".to_string()));
    assert_eq!(repo.bulk_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_mutations_pass_through_to_repository() {
    let repo = MockRepo::new();
    let resolvers = Resolvers::new(repo.clone());

    let created = resolvers
        .create_agent(AgentInput {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
        })
        .await
        .unwrap();
    let fetched = resolvers.agent(created.id).await.unwrap();
    assert_eq!(created, fetched);

    let renamed = resolvers
        .update_agent(
            created.id,
            AgentInput {
                name: "Anne".to_string(),
                email: "ann@example.com".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Anne");

    resolvers.delete_agent(created.id).await.unwrap();
    assert!(resolvers.agent(created.id).await.is_err());
}
