//! Raw SQL, one module per table group. Every function takes `&mut DbConn`.

pub mod catalog;
pub mod orders;
pub mod payments;
pub mod sessions;

use crate::error::Error;

/// Maps a unique-constraint violation to `Error::Conflict`, anything else to `Error::Sqlx`.
pub(crate) fn conflict_or_sqlx(error: sqlx::Error, message: impl FnOnce() -> String) -> Error {
    let is_unique = error
        .as_database_error()
        .is_some_and(|db_error| db_error.is_unique_violation());
    if is_unique {
        Error::Conflict(message())
    } else {
        Error::Sqlx(error)
    }
}
