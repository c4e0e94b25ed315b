pub mod event;
pub mod finding;

pub use event::{NormalizedEvent, RawRecord};
pub use finding::{Finding, Severity};
