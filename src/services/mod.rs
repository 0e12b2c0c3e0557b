pub mod classifier;
pub mod preview_filter;
pub mod result_cache;
pub mod title_parser;

pub use classifier::Classifier;
pub use preview_filter::{PreviewFilter, PreviewMatcher};
pub use result_cache::ResultCache;
pub use title_parser::TitleParser;
