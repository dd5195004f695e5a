pub mod extractor;

pub use extractor::{PackageExtractor, PACKAGE_ROOT};
