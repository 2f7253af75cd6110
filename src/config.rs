//! Configuration file loading.
//!
//! The config is a JSON document with one recognized option: `packages`,
//! an array of `"<from>:<to>"` rule strings.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::rules::RewriteRules;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub packages: RewriteRules,
}

pub fn load(path: &Path) -> Result<Config> {
    let data = fs::read(path)
        .with_context(|| format!("could not read config file {}", path.display()))?;
    serde_json::from_slice(&data)
        .with_context(|| format!("unable to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PkgPath;

    #[test]
    fn parses_packages_option() {
        let cfg: Config = serde_json::from_str(
            r#"{"packages": ["first:other", "a/b:p/q"]}"#,
        )
        .unwrap();
        assert!(cfg.packages.exact_match(&PkgPath::new("first")).is_some());
        assert!(cfg.packages.exact_match(&PkgPath::new("a/b")).is_some());
    }

    #[test]
    fn rejects_malformed_rule_strings() {
        let result: std::result::Result<Config, _> =
            serde_json::from_str(r#"{"packages": ["nocolon"]}"#);
        assert!(result.is_err());
    }
}
