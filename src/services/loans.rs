//! Loan views, renewal and returns

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, LoanEntry, LoanStatus, RenewForm, RenewFormView},
    repository::Repository,
    rules,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// On-loan copies borrowed by `user_id`, earliest due first
    pub async fn borrowed_by(&self, user_id: i32, today: NaiveDate) -> AppResult<Vec<LoanEntry>> {
        let entries = self.repository.instances.list_on_loan(Some(user_id)).await?;
        Ok(with_overdue(entries, today))
    }

    /// Every on-loan copy, earliest due first
    pub async fn all_on_loan(&self, today: NaiveDate) -> AppResult<Vec<LoanEntry>> {
        let entries = self.repository.instances.list_on_loan(None).await?;
        Ok(with_overdue(entries, today))
    }

    /// Renewal form proposing a due date three weeks from today
    pub async fn renewal_form(&self, instance_id: Uuid, today: NaiveDate) -> AppResult<RenewFormView> {
        let instance = self.repository.instances.get_by_id(instance_id).await?;
        let book = self.repository.books.get_by_id(instance.book_id).await?;
        Ok(RenewFormView {
            instance,
            title: book.title,
            due_back: rules::default_renewal_date(today),
        })
    }

    /// Move the due date of an on-loan copy
    pub async fn renew(
        &self,
        instance_id: Uuid,
        form: RenewForm,
        today: NaiveDate,
    ) -> AppResult<BookInstance> {
        // Unknown copies are reported before date errors
        let instance = self.repository.instances.get_by_id(instance_id).await?;
        if instance.status != LoanStatus::OnLoan {
            return Err(AppError::Conflict(format!(
                "Book instance {} is not on loan",
                instance_id
            )));
        }
        let due_back = rules::validate_renewal_date(form.due_back, today)?;

        let instance = self
            .repository
            .instances
            .update_due_back(instance_id, due_back)
            .await?;
        tracing::info!("Renewed book instance {} until {}", instance_id, due_back);
        Ok(instance)
    }

    pub async fn mark_returned(&self, instance_id: Uuid) -> AppResult<BookInstance> {
        let instance = self.repository.instances.mark_returned(instance_id).await?;
        tracing::info!("Book instance {} returned", instance_id);
        Ok(instance)
    }
}

fn with_overdue(mut entries: Vec<LoanEntry>, today: NaiveDate) -> Vec<LoanEntry> {
    for entry in entries.iter_mut() {
        entry.is_overdue = rules::is_overdue(entry.status, entry.due_back, today);
    }
    entries
}
