pub mod cli;
pub mod commands;
pub mod config;
pub mod driver;
pub mod ident;
pub mod imports;
pub mod path;
pub mod rewrite;
pub mod rules;
pub mod scope;
pub mod syntax;

pub use driver::{run, RunOptions, RunSummary};
pub use path::PkgPath;
pub use rewrite::apply;
pub use rules::{RewriteRule, RewriteRules, RuleError};
pub use syntax::{parse_file, print_file, ParseError};
