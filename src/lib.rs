pub mod archive;
pub mod core;
pub mod manifest;
pub mod orchestration;
pub mod plugins;
pub mod security;
pub mod selection;

pub use core::*;
pub use orchestration::{PublishOutcome, RepublishOptions, Republisher, RunSummary};
pub use plugins::NpmPlugin;
pub use security::{CommandError, SafeCommandExecutor};
