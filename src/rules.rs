//! Loan and display rules shared by services and views

use chrono::{Duration, Local, NaiveDate};
use thiserror::Error;

use crate::models::{book_instance::LoanStatus, genre::Genre};

/// A renewal may push the due date at most this far from today
pub const RENEWAL_WINDOW_WEEKS: i64 = 4;

/// Initial value proposed by the renewal form
pub const DEFAULT_RENEWAL_WEEKS: i64 = 3;

/// Number of genres shown in list displays
pub const DISPLAY_GENRE_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewalDateError {
    #[error("Invalid date - renewal date in the past")]
    PastDate,
    #[error("Invalid date - renewal date more than 4 weeks away.")]
    TooFarFuture,
}

/// Current local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accept `candidate` if it lies between `today` and four weeks later, both inclusive
pub fn validate_renewal_date(
    candidate: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalDateError> {
    if candidate < today {
        return Err(RenewalDateError::PastDate);
    }
    if candidate > today + Duration::weeks(RENEWAL_WINDOW_WEEKS) {
        return Err(RenewalDateError::TooFarFuture);
    }
    Ok(candidate)
}

pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(DEFAULT_RENEWAL_WEEKS)
}

/// A copy is overdue when it is on loan and its due date has passed
pub fn is_overdue(status: LoanStatus, due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    status == LoanStatus::OnLoan && due_back.is_some_and(|due| today > due)
}

/// Comma-separated names of the first `limit` genres
pub fn display_genres(genres: &[Genre], limit: usize) -> String {
    genres
        .iter()
        .take(limit)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
