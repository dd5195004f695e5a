pub mod command_executor;
pub mod network_classifier;

pub use command_executor::{display_command, CommandError, SafeCommandExecutor};
pub use network_classifier::NetworkClassifier;
