mod filter;
mod page;
mod record;

pub use filter::{FilterIdentity, FilterSet, derive_identity, format_instant, parse_instant};
pub use page::{Page, PagedSequence};
pub use record::LogRecord;
