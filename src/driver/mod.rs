pub mod builder;
pub mod collector;
pub mod context;
pub mod core;
pub mod metrics;
pub mod plugin;
pub mod plugins;

pub use builder::QueryProcessorBuilder;
pub use collector::ResultsCollector;
pub use context::ProcessorContext;
pub use core::{OutcomeStream, QueryProcessor};
pub use metrics::ProcessorMetrics;
pub use plugin::ProcessorPlugin;
