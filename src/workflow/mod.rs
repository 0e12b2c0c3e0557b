pub mod summary_flow;

pub use summary_flow::SummaryFlow;
