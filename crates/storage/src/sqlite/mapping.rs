use lingo_core::model::{Level, Preferences, Subject};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn total_xp_from_i64(v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid total_xp: {v}")))
}

pub(crate) fn parse_subject(raw: Option<String>) -> Result<Option<Subject>, StorageError> {
    raw.map(|code| code.parse::<Subject>().map_err(ser)).transpose()
}

pub(crate) fn parse_level(raw: Option<String>) -> Result<Option<Level>, StorageError> {
    raw.map(|code| code.parse::<Level>().map_err(ser)).transpose()
}

pub(crate) fn map_preferences_row(row: &sqlx::sqlite::SqliteRow) -> Result<Preferences, StorageError> {
    let subject = parse_subject(row.try_get::<Option<String>, _>("subject").map_err(ser)?)?;
    let level = parse_level(row.try_get::<Option<String>, _>("level").map_err(ser)?)?;
    Ok(Preferences::new(subject, level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_are_serialization_errors() {
        assert!(matches!(
            parse_subject(Some("cobol".into())),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(parse_level(None).unwrap(), None);
        assert_eq!(
            parse_level(Some("advanced".into())).unwrap(),
            Some(Level::Advanced)
        );
    }

    #[test]
    fn negative_totals_are_rejected() {
        assert!(total_xp_from_i64(-1).is_err());
        assert_eq!(total_xp_from_i64(40).unwrap(), 40);
    }
}
