pub mod summary_client;

pub use summary_client::{SummaryFetcher, WikiSummaryClient};
