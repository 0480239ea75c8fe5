// Glisten opt -- the rewriter and the cross-shader renamer.

pub mod rename;
pub mod rewrite;

pub use rename::{NameGenerator, RenameSymbols};
pub use rewrite::{rewrite, RewriteOptions};
