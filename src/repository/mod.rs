//! Repository layer: one storage interface per entity

pub mod authors;
pub mod books;
pub mod genres;
pub mod instances;
pub mod memory;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use authors::AuthorsRepository;
pub use books::BooksRepository;
pub use genres::{GenresRepository, LanguagesRepository};
pub use instances::InstancesRepository;
pub use memory::MemoryRepository;
pub use users::UsersRepository;

/// Main repository struct holding one handle per entity store
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn AuthorsRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub instances: Arc<dyn InstancesRepository>,
    pub genres: Arc<dyn GenresRepository>,
    pub languages: Arc<dyn LanguagesRepository>,
    pub users: Arc<dyn UsersRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(authors::PgAuthorsRepository::new(pool.clone())),
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            instances: Arc::new(instances::PgInstancesRepository::new(pool.clone())),
            genres: Arc::new(genres::PgGenresRepository::new(pool.clone())),
            languages: Arc::new(genres::PgLanguagesRepository::new(pool.clone())),
            users: Arc::new(users::PgUsersRepository::new(pool)),
        }
    }

    /// Repository backed by a shared in-process store
    pub fn in_memory(store: MemoryRepository) -> Self {
        Self {
            authors: Arc::new(store.clone()),
            books: Arc::new(store.clone()),
            instances: Arc::new(store.clone()),
            genres: Arc::new(store.clone()),
            languages: Arc::new(store.clone()),
            users: Arc::new(store),
        }
    }
}
