pub mod version_selector;

pub use version_selector::{parse_list, select, VersionFilter};
