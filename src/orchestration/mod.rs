pub mod confirm;
pub mod republisher;
pub mod workspace;

pub use confirm::{confirm_or_skip, read_answer};
pub use republisher::{PublishOutcome, RepublishOptions, Republisher, RunSummary};
pub use workspace::RunWorkspace;
