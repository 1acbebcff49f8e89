//! In-process repository backend
//!
//! Implements every repository trait over shared maps, enforcing the same
//! constraints as the PostgreSQL schema: unique ISBN and username, RESTRICT on
//! book deletion, SET NULL on author deletion.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorForm},
        book::{Book, BookForm, BookListEntry},
        book_instance::{BookInstance, CreateBookInstance, LoanEntry, LoanStatus},
        genre::{Genre, Language},
        user::{NewUser, Permission, User, UserCredentials, UserRow},
    },
};

use super::{
    authors::AuthorsRepository,
    books::BooksRepository,
    genres::{GenresRepository, LanguagesRepository},
    instances::InstancesRepository,
    users::UsersRepository,
};

#[derive(Default)]
struct Sequences {
    authors: i32,
    books: i32,
    genres: i32,
    languages: i32,
    users: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

struct StoredUser {
    row: UserRow,
    password_hash: String,
    permissions: Vec<Permission>,
}

#[derive(Default)]
struct MemoryDb {
    seq: Sequences,
    authors: BTreeMap<i32, Author>,
    books: BTreeMap<i32, Book>,
    book_genres: BTreeMap<i32, Vec<i32>>,
    instances: HashMap<Uuid, BookInstance>,
    genres: BTreeMap<i32, Genre>,
    languages: BTreeMap<i32, Language>,
    users: BTreeMap<i32, StoredUser>,
}

impl MemoryDb {
    fn list_entry(&self, book: &Book) -> BookListEntry {
        BookListEntry {
            id: book.id,
            title: book.title.clone(),
            author_id: book.author_id,
            author_name: book
                .author_id
                .and_then(|id| self.authors.get(&id))
                .map(Author::full_name),
        }
    }

    fn sorted_books(&self) -> Vec<&Book> {
        let mut books: Vec<&Book> = self.books.values().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        books
    }

    fn check_book_form(&self, data: &BookForm, id: Option<i32>) -> AppResult<()> {
        if self
            .books
            .values()
            .any(|b| b.isbn == data.isbn && Some(b.id) != id)
        {
            return Err(AppError::Duplicate("Book with this ISBN already exists.".to_string()));
        }
        if let Some(author_id) = data.author_id {
            if !self.authors.contains_key(&author_id) {
                return Err(AppError::Conflict(format!("Author {} does not exist", author_id)));
            }
        }
        if let Some(language_id) = data.language_id {
            if !self.languages.contains_key(&language_id) {
                return Err(AppError::Conflict(format!("Language {} does not exist", language_id)));
            }
        }
        if let Some(genre_id) = data.genre_ids.iter().find(|g| !self.genres.contains_key(*g)) {
            return Err(AppError::Conflict(format!("Genre {} does not exist", genre_id)));
        }
        Ok(())
    }

    fn instance(&self, id: Uuid) -> AppResult<&BookInstance> {
        self.instances
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    fn instance_mut(&mut self, id: Uuid) -> AppResult<&mut BookInstance> {
        self.instances
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }
}

/// Ordering of loan lists: due date ascending, undated last
fn by_due_back(a: &Option<NaiveDate>, b: &Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Shared in-memory store; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryRepository {
    db: Arc<RwLock<MemoryDb>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorsRepository for MemoryRepository {
    async fn count(&self) -> AppResult<i64> {
        Ok(self.db.read().await.authors.len() as i64)
    }

    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<Author>> {
        let all = AuthorsRepository::list_all(self).await?;
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_all(&self) -> AppResult<Vec<Author>> {
        let db = self.db.read().await;
        let mut authors: Vec<Author> = db.authors.values().cloned().collect();
        authors.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
                .then(a.id.cmp(&b.id))
        });
        Ok(authors)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        self.db
            .read()
            .await
            .authors
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    async fn create(&self, data: &AuthorForm) -> AppResult<Author> {
        let mut db = self.db.write().await;
        let author = Author {
            id: next_id(&mut db.seq.authors),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            date_of_birth: data.date_of_birth,
            date_of_death: data.date_of_death,
        };
        db.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn update(&self, id: i32, data: &AuthorForm) -> AppResult<Author> {
        let mut db = self.db.write().await;
        let author = db
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))?;
        author.first_name = data.first_name.clone();
        author.last_name = data.last_name.clone();
        author.date_of_birth = data.date_of_birth;
        author.date_of_death = data.date_of_death;
        Ok(author.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut db = self.db.write().await;
        if db.authors.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        for book in db.books.values_mut() {
            if book.author_id == Some(id) {
                book.author_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BooksRepository for MemoryRepository {
    async fn count(&self) -> AppResult<i64> {
        Ok(self.db.read().await.books.len() as i64)
    }

    async fn count_title_contains(&self, fragment: &str) -> AppResult<i64> {
        let needle = fragment.to_lowercase();
        let db = self.db.read().await;
        Ok(db
            .books
            .values()
            .filter(|b| b.title.to_lowercase().contains(&needle))
            .count() as i64)
    }

    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<BookListEntry>> {
        let db = self.db.read().await;
        Ok(db
            .sorted_books()
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|b| db.list_entry(b))
            .collect())
    }

    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookListEntry>> {
        let db = self.db.read().await;
        Ok(db
            .sorted_books()
            .into_iter()
            .filter(|b| b.author_id == Some(author_id))
            .map(|b| db.list_entry(b))
            .collect())
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.db
            .read()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn genres_of(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let db = self.db.read().await;
        let mut genres: Vec<Genre> = db
            .book_genres
            .get(&book_id)
            .map(|ids| ids.iter().filter_map(|id| db.genres.get(id).cloned()).collect())
            .unwrap_or_default();
        genres.sort_by_key(|g| g.id);
        Ok(genres)
    }

    async fn create(&self, data: &BookForm) -> AppResult<Book> {
        let mut db = self.db.write().await;
        db.check_book_form(data, None)?;

        let book = Book {
            id: next_id(&mut db.seq.books),
            title: data.title.clone(),
            summary: data.summary.clone(),
            isbn: data.isbn.clone(),
            author_id: data.author_id,
            language_id: data.language_id,
        };
        db.books.insert(book.id, book.clone());
        db.book_genres.insert(book.id, data.genre_ids.clone());
        Ok(book)
    }

    async fn update(&self, id: i32, data: &BookForm) -> AppResult<Book> {
        let mut db = self.db.write().await;
        if !db.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        db.check_book_form(data, Some(id))?;

        let book = Book {
            id,
            title: data.title.clone(),
            summary: data.summary.clone(),
            isbn: data.isbn.clone(),
            author_id: data.author_id,
            language_id: data.language_id,
        };
        db.books.insert(id, book.clone());
        db.book_genres.insert(id, data.genre_ids.clone());
        Ok(book)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut db = self.db.write().await;
        if !db.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        if db.instances.values().any(|i| i.book_id == id) {
            return Err(AppError::Conflict(format!("Book with id {} still has copies", id)));
        }
        db.books.remove(&id);
        db.book_genres.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl InstancesRepository for MemoryRepository {
    async fn count(&self) -> AppResult<i64> {
        Ok(self.db.read().await.instances.len() as i64)
    }

    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let db = self.db.read().await;
        Ok(db.instances.values().filter(|i| i.status == status).count() as i64)
    }

    async fn count_for_book(&self, book_id: i32) -> AppResult<i64> {
        let db = self.db.read().await;
        Ok(db.instances.values().filter(|i| i.book_id == book_id).count() as i64)
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let db = self.db.read().await;
        let mut instances: Vec<BookInstance> = db
            .instances
            .values()
            .filter(|i| i.book_id == book_id)
            .cloned()
            .collect();
        instances.sort_by(|a, b| by_due_back(&a.due_back, &b.due_back).then(a.id.cmp(&b.id)));
        Ok(instances)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        self.db.read().await.instance(id).cloned()
    }

    async fn list_on_loan(&self, borrower_id: Option<i32>) -> AppResult<Vec<LoanEntry>> {
        let db = self.db.read().await;
        let mut entries: Vec<LoanEntry> = db
            .instances
            .values()
            .filter(|i| i.status == LoanStatus::OnLoan)
            .filter(|i| borrower_id.is_none() || i.borrower_id == borrower_id)
            .map(|i| LoanEntry {
                id: i.id,
                book_id: i.book_id,
                title: db
                    .books
                    .get(&i.book_id)
                    .map(|b| b.title.clone())
                    .unwrap_or_default(),
                imprint: i.imprint.clone(),
                due_back: i.due_back,
                status: i.status,
                borrower_id: i.borrower_id,
                borrower_username: i
                    .borrower_id
                    .and_then(|id| db.users.get(&id))
                    .map(|u| u.row.username.clone()),
                is_overdue: false,
            })
            .collect();
        entries.sort_by(|a, b| by_due_back(&a.due_back, &b.due_back).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    async fn create(&self, data: &CreateBookInstance) -> AppResult<BookInstance> {
        let mut db = self.db.write().await;
        if !db.books.contains_key(&data.book_id) {
            return Err(AppError::Conflict(format!("Book {} does not exist", data.book_id)));
        }
        if let Some(user_id) = data.borrower_id {
            if !db.users.contains_key(&user_id) {
                return Err(AppError::Conflict(format!("User {} does not exist", user_id)));
            }
        }

        let instance = BookInstance {
            id: Uuid::new_v4(),
            book_id: data.book_id,
            imprint: data.imprint.clone(),
            due_back: data.due_back,
            status: data.status,
            borrower_id: data.borrower_id,
        };
        db.instances.insert(instance.id, instance.clone());
        Ok(instance)
    }

    async fn update_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        let mut db = self.db.write().await;
        let instance = db.instance_mut(id)?;
        instance.due_back = Some(due_back);
        Ok(instance.clone())
    }

    async fn mark_returned(&self, id: Uuid) -> AppResult<BookInstance> {
        let mut db = self.db.write().await;
        let instance = db.instance_mut(id)?;
        instance.status = LoanStatus::Available;
        instance.due_back = None;
        instance.borrower_id = None;
        Ok(instance.clone())
    }
}

#[async_trait]
impl GenresRepository for MemoryRepository {
    async fn list_all(&self) -> AppResult<Vec<Genre>> {
        let db = self.db.read().await;
        let mut genres: Vec<Genre> = db.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let db = self.db.read().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !db.genres.contains_key(id))
            .collect())
    }

    async fn create(&self, name: &str) -> AppResult<Genre> {
        let mut db = self.db.write().await;
        let genre = Genre {
            id: next_id(&mut db.seq.genres),
            name: name.to_string(),
        };
        db.genres.insert(genre.id, genre.clone());
        Ok(genre)
    }
}

#[async_trait]
impl LanguagesRepository for MemoryRepository {
    async fn list_all(&self) -> AppResult<Vec<Language>> {
        let db = self.db.read().await;
        let mut languages: Vec<Language> = db.languages.values().cloned().collect();
        languages.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(languages)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Language> {
        self.db
            .read()
            .await
            .languages
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Language with id {} not found", id)))
    }

    async fn create(&self, name: &str) -> AppResult<Language> {
        let mut db = self.db.write().await;
        let language = Language {
            id: next_id(&mut db.seq.languages),
            name: name.to_string(),
        };
        db.languages.insert(language.id, language.clone());
        Ok(language)
    }
}

#[async_trait]
impl UsersRepository for MemoryRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        let db = self.db.read().await;
        let stored = db
            .users
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;
        Ok(User::from_row(stored.row.clone(), stored.permissions.clone()))
    }

    async fn get_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let db = self.db.read().await;
        Ok(db
            .users
            .values()
            .find(|u| u.row.username == username)
            .map(|u| UserCredentials {
                id: u.row.id,
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn create(&self, data: &NewUser) -> AppResult<User> {
        let mut db = self.db.write().await;
        if db.users.values().any(|u| u.row.username == data.username) {
            return Err(AppError::Duplicate(
                "A user with that username already exists.".to_string(),
            ));
        }

        let row = UserRow {
            id: next_id(&mut db.seq.users),
            username: data.username.clone(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            email: data.email.clone(),
        };
        db.users.insert(
            row.id,
            StoredUser {
                row: row.clone(),
                password_hash: data.password_hash.clone(),
                permissions: Vec::new(),
            },
        );
        Ok(User::from_row(row, Vec::new()))
    }

    async fn grant_permission(&self, user_id: i32, permission: Permission) -> AppResult<()> {
        let mut db = self.db.write().await;
        let stored = db
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::Conflict(format!("User {} does not exist", user_id)))?;
        if !stored.permissions.contains(&permission) {
            stored.permissions.push(permission);
        }
        Ok(())
    }
}
