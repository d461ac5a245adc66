pub mod cli;
pub mod config;
pub mod fetch;
pub mod logs;
pub mod paging;
pub mod render;
pub mod run;
pub mod settings;
pub mod types;

pub use cli::CliOptions;
pub use config::Config;
pub use fetch::{HttpFetcher, PageFetcher};
pub use logs::{FilterSet, LogRecord};
pub use paging::{LoadOutcome, PaginationController, View};
