use std::fmt;

/// A slash-separated package path, held as its segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PkgPath {
    segments: Vec<String>,
}

impl PkgPath {
    pub fn new(s: &str) -> PkgPath {
        PkgPath {
            segments: s.split('/').map(String::from).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `self` is a prefix of `other`, equality included.
    pub fn contains(&self, other: &PkgPath) -> bool {
        if self.segments.len() > other.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&other.segments)
            .all(|(a, b)| a == b)
    }

    pub fn append(&self, other: &[String]) -> PkgPath {
        let mut segments = self.segments.clone();
        segments.extend(other.iter().cloned());
        PkgPath { segments }
    }

    /// The last segment.
    pub fn pkg_name(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// The next-to-last segment, when the path has at least two.
    pub fn parent_name(&self) -> Option<&str> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(&self.segments[self.segments.len() - 2])
    }
}

impl fmt::Display for PkgPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_prefix_inclusive() {
        let base = PkgPath::new("github.com/acme/first");
        assert!(base.contains(&PkgPath::new("github.com/acme/first")));
        assert!(base.contains(&PkgPath::new("github.com/acme/first/sub")));
        assert!(!base.contains(&PkgPath::new("github.com/acme")));
        assert!(!base.contains(&PkgPath::new("github.com/acme/other/sub")));
    }

    #[test]
    fn append_and_accessors() {
        let base = PkgPath::new("github.com/acme");
        let joined = base.append(&["first".to_string(), "sub".to_string()]);
        assert_eq!(joined.to_string(), "github.com/acme/first/sub");
        assert_eq!(joined.pkg_name(), "sub");
        assert_eq!(joined.parent_name(), Some("first"));
    }

    #[test]
    fn single_segment_has_no_parent() {
        assert_eq!(PkgPath::new("lone").parent_name(), None);
    }
}
