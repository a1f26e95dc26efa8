use sea_orm::{DbErr, RuntimeErr};
use sqlx::error::ErrorKind;

/// Storage-level constraint failures the services translate into client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    Unique,
    Check,
    ForeignKey,
}

/// Classifies a database error by the constraint it tripped, if any.
pub fn violation(err: &DbErr) -> Option<ConstraintViolation> {
    let runtime_err = match err {
        DbErr::Query(e) | DbErr::Exec(e) => e,
        _ => return None,
    };

    if let RuntimeErr::SqlxError(sqlx::Error::Database(database_error)) = runtime_err {
        return match database_error.kind() {
            ErrorKind::UniqueViolation => Some(ConstraintViolation::Unique),
            ErrorKind::CheckViolation => Some(ConstraintViolation::Check),
            ErrorKind::ForeignKeyViolation => Some(ConstraintViolation::ForeignKey),
            _ => None,
        };
    }
    None
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    violation(err) == Some(ConstraintViolation::Unique)
}
