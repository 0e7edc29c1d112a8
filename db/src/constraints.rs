use color_eyre::Report;
use sqlx::error::DatabaseError;

fn database_error(report: &Report) -> Option<&(dyn DatabaseError + 'static)> {
    report
        .downcast_ref::<sqlx::Error>()
        .and_then(sqlx::Error::as_database_error)
}

/// True when the report wraps a Postgres unique-constraint violation.
pub fn is_unique_violation(report: &Report) -> bool {
    database_error(report).is_some_and(|err| err.is_unique_violation())
}

/// True when the report wraps a Postgres foreign-key violation, which is what
/// deleting a row still referenced through `ON DELETE RESTRICT` produces.
pub fn is_foreign_key_violation(report: &Report) -> bool {
    database_error(report).is_some_and(|err| err.is_foreign_key_violation())
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::eyre;

    use super::*;

    #[test]
    fn plain_reports_are_not_constraint_violations() {
        let report = eyre!("something else went wrong");

        assert!(!is_unique_violation(&report));
        assert!(!is_foreign_key_violation(&report));
    }

    #[test]
    fn non_database_sqlx_errors_are_not_constraint_violations() {
        let report = Report::new(sqlx::Error::RowNotFound);

        assert!(!is_unique_violation(&report));
        assert!(!is_foreign_key_violation(&report));
    }
}
