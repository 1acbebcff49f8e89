//! Catalog browsing and management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult, FormErrors},
    models::{
        author::{Author, AuthorDetails, AuthorForm},
        book::{Book, BookDetails, BookForm, BookFormChoices, BookFormView, BookListEntry},
        book_instance::LoanStatus,
        pagination::{Page, PageQuery, PageRequest},
        stats::{CatalogStats, TITLE_FRAGMENT},
    },
    repository::Repository,
    rules,
};

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Home page counts; the visit count is filled in by the caller
    pub async fn stats(&self, num_visits: i64) -> AppResult<CatalogStats> {
        let repo = &self.repository;
        Ok(CatalogStats {
            num_books: repo.books.count().await?,
            num_instances: repo.instances.count().await?,
            num_instances_available: repo.instances.count_by_status(LoanStatus::Available).await?,
            num_authors: repo.authors.count().await?,
            num_books_title_contains: repo.books.count_title_contains(TITLE_FRAGMENT).await?,
            num_visits,
        })
    }

    /// Cheap storage round trip for readiness checks
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.count().await?;
        Ok(())
    }

    // Books

    pub async fn list_books(&self, query: PageQuery) -> AppResult<Page<BookListEntry>> {
        let total = self.repository.books.count().await?;
        let request = PageRequest::resolve(query, total)?;
        let items = self
            .repository
            .books
            .list(request.limit(), request.offset())
            .await?;
        Ok(Page::new(items, total, request))
    }

    /// Book with author, language, genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get_by_id(author_id).await?),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => Some(self.repository.languages.get_by_id(language_id).await?),
            None => None,
        };
        let genres = self.repository.books.genres_of(id).await?;
        let instances = self.repository.instances.list_for_book(id).await?;

        Ok(BookDetails {
            display_genre: rules::display_genres(&genres, rules::DISPLAY_GENRE_LIMIT),
            book,
            author,
            language,
            genres,
            instances,
        })
    }

    pub async fn book_form_choices(&self) -> AppResult<BookFormChoices> {
        Ok(BookFormChoices {
            authors: self.repository.authors.list_all().await?,
            genres: self.repository.genres.list_all().await?,
            languages: self.repository.languages.list_all().await?,
        })
    }

    /// Empty book form
    pub async fn new_book_form(&self) -> AppResult<BookFormView> {
        Ok(BookFormView {
            form: BookForm::default(),
            choices: self.book_form_choices().await?,
        })
    }

    /// Book form filled with the current values of book `id`
    pub async fn edit_book_form(&self, id: i32) -> AppResult<BookFormView> {
        let book = self.repository.books.get_by_id(id).await?;
        let genres = self.repository.books.genres_of(id).await?;
        Ok(BookFormView {
            form: BookForm::from_book(&book, &genres),
            choices: self.book_form_choices().await?,
        })
    }

    pub async fn create_book(&self, mut form: BookForm) -> AppResult<Book> {
        dedup_genres(&mut form);
        self.validate_book_form(&form).await?;
        let book = self.repository.books.create(&form).await?;
        tracing::info!("Created book id={} isbn={}", book.id, book.isbn);
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, mut form: BookForm) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await?;
        dedup_genres(&mut form);
        self.validate_book_form(&form).await?;
        self.repository.books.update(id, &form).await
    }

    /// Delete a book that has no copies left
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.get_by_id(id).await?;
        let copies = self.repository.instances.count_for_book(id).await?;
        if copies > 0 {
            return Err(AppError::Conflict(format!(
                "Book with id {} still has {} copies",
                id, copies
            )));
        }
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }

    /// Field rules first, then the selected author, language and genres must exist
    async fn validate_book_form(&self, form: &BookForm) -> AppResult<()> {
        let mut errors = match form.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };

        if let Some(author_id) = form.author_id {
            match self.repository.authors.get_by_id(author_id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => errors.add("author_id", INVALID_CHOICE),
                Err(e) => return Err(e),
            }
        }
        if let Some(language_id) = form.language_id {
            match self.repository.languages.get_by_id(language_id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => errors.add("language_id", INVALID_CHOICE),
                Err(e) => return Err(e),
            }
        }
        if !form.genre_ids.is_empty() {
            let missing = self.repository.genres.missing_ids(&form.genre_ids).await?;
            for id in missing {
                errors.add(
                    "genre_ids",
                    format!("Select a valid choice. {} is not one of the available choices.", id),
                );
            }
        }

        errors.into_result()
    }

    // Authors

    pub async fn list_authors(&self, query: PageQuery) -> AppResult<Page<Author>> {
        let total = self.repository.authors.count().await?;
        let request = PageRequest::resolve(query, total)?;
        let items = self
            .repository
            .authors
            .list(request.limit(), request.offset())
            .await?;
        Ok(Page::new(items, total, request))
    }

    /// Author with the books written by them
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetails {
            full_name: author.full_name(),
            author,
            books,
        })
    }

    pub async fn get_author_row(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn author_form(&self, id: i32) -> AppResult<AuthorForm> {
        let author = self.repository.authors.get_by_id(id).await?;
        Ok(AuthorForm::from(&author))
    }

    pub async fn create_author(&self, form: AuthorForm) -> AppResult<Author> {
        form.validate()?;
        let author = self.repository.authors.create(&form).await?;
        tracing::info!("Created author id={} ({})", author.id, author);
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, form: AuthorForm) -> AppResult<Author> {
        form.validate()?;
        self.repository.authors.update(id, &form).await
    }

    /// Delete an author; their books are kept without an author
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Deleted author id={}", id);
        Ok(())
    }
}

/// A genre picked twice is stored once
fn dedup_genres(form: &mut BookForm) {
    form.genre_ids.sort_unstable();
    form.genre_ids.dedup();
}
