use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::path::PkgPath;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid rewrite rule `{0}`")]
    Malformed(String),
    #[error("`{from}` does not contain `{path}`")]
    NotApplicable { from: String, path: String },
}

/// A single relocation: every package under `from` moves under `to`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct RewriteRule {
    pub from: PkgPath,
    pub to: PkgPath,
}

impl RewriteRule {
    /// Parse a rule of the form `<from>:<to>`.
    pub fn parse(s: &str) -> Result<RewriteRule, RuleError> {
        let mut parts = s.split(':');
        let (from, to) = match (parts.next(), parts.next(), parts.next()) {
            (Some(from), Some(to), None) if !from.is_empty() && !to.is_empty() => (from, to),
            _ => return Err(RuleError::Malformed(s.to_string())),
        };
        Ok(RewriteRule {
            from: PkgPath::new(from),
            to: PkgPath::new(to),
        })
    }

    /// Map a path under `from` to its new location under `to`.
    pub fn rewrite(&self, path: &PkgPath) -> Result<PkgPath, RuleError> {
        if !self.from.contains(path) {
            return Err(RuleError::NotApplicable {
                from: self.from.to_string(),
                path: path.to_string(),
            });
        }
        Ok(self.to.append(&path.segments()[self.from.len()..]))
    }

    /// Left-extend both sides with a common root.
    pub fn apply_prefix(&self, prefix: &PkgPath) -> RewriteRule {
        RewriteRule {
            from: prefix.append(self.from.segments()),
            to: prefix.append(self.to.segments()),
        }
    }
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

impl TryFrom<String> for RewriteRule {
    type Error = RuleError;

    fn try_from(s: String) -> Result<RewriteRule, RuleError> {
        RewriteRule::parse(&s)
    }
}

/// An ordered rule set. Rules are kept sorted by `from` length, then by
/// display form, which makes `best_match` the last element of the filtered
/// list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct RewriteRules {
    rules: Vec<RewriteRule>,
}

impl RewriteRules {
    pub fn parse(specs: &[impl AsRef<str>]) -> Result<RewriteRules, RuleError> {
        let mut rules = Vec::with_capacity(specs.len());
        for spec in specs {
            rules.push(RewriteRule::parse(spec.as_ref())?);
        }
        Ok(RewriteRules::new(rules))
    }

    pub fn new(mut rules: Vec<RewriteRule>) -> RewriteRules {
        sort_rules(&mut rules);
        RewriteRules { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter()
    }

    /// The rule most specifically matching `path`: longest `from` prefix,
    /// ties broken by display form.
    pub fn best_match(&self, path: &PkgPath) -> Option<&RewriteRule> {
        let mut matches: Vec<&RewriteRule> = self
            .rules
            .iter()
            .filter(|rule| rule.from.contains(path))
            .collect();
        matches.sort_by(|a, b| {
            a.from
                .len()
                .cmp(&b.from.len())
                .then_with(|| a.to_string().cmp(&b.to_string()))
        });
        matches.last().copied()
    }

    /// The first rule whose `from` equals `path`.
    pub fn exact_match(&self, path: &PkgPath) -> Option<&RewriteRule> {
        self.rules.iter().find(|rule| &rule.from == path)
    }

    pub fn apply_prefix(&self, prefix: &PkgPath) -> RewriteRules {
        RewriteRules::new(
            self.rules
                .iter()
                .map(|rule| rule.apply_prefix(prefix))
                .collect(),
        )
    }
}

impl TryFrom<Vec<String>> for RewriteRules {
    type Error = RuleError;

    fn try_from(specs: Vec<String>) -> Result<RewriteRules, RuleError> {
        RewriteRules::parse(&specs)
    }
}

fn sort_rules(rules: &mut [RewriteRule]) {
    rules.sort_by(|a, b| {
        a.from
            .len()
            .cmp(&b.from.len())
            .then_with(|| a.to_string().cmp(&b.to_string()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_from_and_to() {
        let rule = RewriteRule::parse("a/b:x/y").unwrap();
        assert_eq!(rule.from, PkgPath::new("a/b"));
        assert_eq!(rule.to, PkgPath::new("x/y"));
    }

    #[test]
    fn rejects_malformed_rules() {
        assert!(matches!(
            RewriteRule::parse("a/b"),
            Err(RuleError::Malformed(_))
        ));
        assert!(matches!(
            RewriteRule::parse("a:b:c"),
            Err(RuleError::Malformed(_))
        ));
        assert!(matches!(
            RewriteRule::parse(":x/y"),
            Err(RuleError::Malformed(_))
        ));
        assert!(matches!(
            RewriteRule::parse("a/b:"),
            Err(RuleError::Malformed(_))
        ));
    }

    #[test]
    fn rewrite_substitutes_prefix() {
        let rule = RewriteRule::parse("a/b:x/y").unwrap();
        let out = rule.rewrite(&PkgPath::new("a/b/c/d")).unwrap();
        assert_eq!(out.to_string(), "x/y/c/d");
        let out = rule.rewrite(&PkgPath::new("a/b")).unwrap();
        assert_eq!(out.to_string(), "x/y");
    }

    #[test]
    fn rewrite_requires_containment() {
        let rule = RewriteRule::parse("a/b:x/y").unwrap();
        assert!(matches!(
            rule.rewrite(&PkgPath::new("a/z")),
            Err(RuleError::NotApplicable { .. })
        ));
    }

    #[test]
    fn best_match_prefers_longest_from() {
        let rules = RewriteRules::parse(&["a/b:x/y", "a/b/c:p/q"]).unwrap();
        let best = rules.best_match(&PkgPath::new("a/b/c/d")).unwrap();
        assert_eq!(best.from, PkgPath::new("a/b/c"));
        let best = rules.best_match(&PkgPath::new("a/b/e")).unwrap();
        assert_eq!(best.from, PkgPath::new("a/b"));
        assert!(rules.best_match(&PkgPath::new("z")).is_none());
    }

    #[test]
    fn best_match_breaks_ties_by_display_form() {
        let rules = RewriteRules::parse(&["a/b:z/z", "a/b:m/m"]).unwrap();
        let best = rules.best_match(&PkgPath::new("a/b")).unwrap();
        assert_eq!(best.to, PkgPath::new("z/z"));
    }

    #[test]
    fn exact_match_requires_equality() {
        let rules = RewriteRules::parse(&["a/b:x/y"]).unwrap();
        assert!(rules.exact_match(&PkgPath::new("a/b")).is_some());
        assert!(rules.exact_match(&PkgPath::new("a/b/c")).is_none());
    }

    #[test]
    fn apply_prefix_extends_both_sides() {
        let rules = RewriteRules::parse(&["first:other"]).unwrap();
        let prefixed = rules.apply_prefix(&PkgPath::new("github.com/acme"));
        let rule = prefixed.iter().next().unwrap();
        assert_eq!(rule.from.to_string(), "github.com/acme/first");
        assert_eq!(rule.to.to_string(), "github.com/acme/other");
    }

    #[test]
    fn deserializes_from_rule_strings() {
        let rules: RewriteRules =
            serde_json::from_str(r#"["a/b:x/y", "a/b/c:p/q"]"#).unwrap();
        assert_eq!(rules.iter().count(), 2);
        assert!(serde_json::from_str::<RewriteRules>(r#"["nocolon"]"#).is_err());
    }
}
