pub mod checks;
pub mod config;
pub mod diagnostics;
pub mod fix;
pub mod lint;
pub mod matchers;
pub mod oracle;
pub mod state;
pub mod symbols;
pub mod text_patch;
pub mod tree;
pub mod types;
