pub mod link;
pub mod outcome;
pub mod subject;
pub mod summary;

pub use link::{Ancestor, LinkHandle, LinkId};
pub use outcome::ClassificationOutcome;
pub use subject::SubjectTitle;
pub use summary::SummaryRecord;
