pub mod manifest_rewriter;

pub use manifest_rewriter::{rewrite, ManifestRewriter, RewriteReport, MANIFEST_FILE, UNSAFE_SCRIPTS};
