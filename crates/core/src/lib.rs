#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod model;
pub mod session;
pub mod time;
pub mod unlock;

pub use catalog::{Catalog, CatalogError, LookupError};
pub use error::Error;
pub use session::{LessonSession, OutcomePolicy, SessionError};
pub use time::Clock;
pub use unlock::{UNIT_COUNT, UnitStatus};
