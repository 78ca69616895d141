use thiserror::Error;

use crate::catalog::{CatalogError, LookupError};
use crate::model::{LessonError, ParseCodeError};
use crate::session::SessionError;

/// Umbrella error for callers that do not care which domain rule failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Code(#[from] ParseCodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonId, Preferences, Subject};
    use crate::Catalog;

    fn lookup(catalog: &Catalog, id: &str) -> Result<String, Error> {
        let subject: Subject = "css".parse()?;
        let prefs = Preferences::default().with_subject(subject);
        Ok(catalog.find_lesson_for(&prefs, &LessonId::new(id))?.title().to_string())
    }

    #[test]
    fn domain_errors_convert_with_question_mark() {
        let catalog = Catalog::builtin().unwrap();
        assert!(matches!(
            lookup(&catalog, "css-beginner-1"),
            Err(Error::Lookup(LookupError::SetupIncomplete))
        ));
        assert!(matches!(
            Catalog::from_json("{"),
            Err(CatalogError::Malformed(_))
        ));
    }
}
