mod engine;
mod unsave_log;

pub use engine::CollectError;
pub use engine::CollectionEngine;
pub use engine::RunOutcome;
pub use unsave_log::RestoreReport;
pub use unsave_log::UnsaveLog;
