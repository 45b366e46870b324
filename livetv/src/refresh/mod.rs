pub mod fast_path;
pub mod scheduler;

pub use fast_path::FastPathResolver;
pub use scheduler::{RefreshOutcome, RefreshReport, RefreshScheduler, RefreshState, RefreshTrigger};
