//! Source pattern matching over `host:port` strings.
//!
//! Compilation is total: any pattern yields a matcher, however malformed the
//! literals are. A bad literal simply never matches anything at runtime.

/// A compiled source pattern. All four cases are anchored full-string
/// matches; the non-wildcard remainder must be non-empty (so `*:443` does
/// not match `:443`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetMatcher {
    /// `*:*` - any non-empty target.
    Any,
    /// `*:{port}` - any host with this literal port. Holds `":{port}"`.
    PortSuffix(String),
    /// `{host}:*` - this literal host with any port. Holds `"{host}:"`.
    HostPrefix(String),
    /// `{host}:{port}` - exact target only.
    Exact(String),
}

impl TargetMatcher {
    /// Compile a source pattern of the form `{host|*}:{port|*}`.
    ///
    /// A pattern with no `:` compiles to an exact matcher for the literal,
    /// which can never match a real `host:port` target.
    pub fn compile(pattern: &str) -> Self {
        let (host, port) = pattern.split_once(':').unwrap_or((pattern, ""));
        match (host == "*", port == "*") {
            (true, true) => TargetMatcher::Any,
            (true, false) => TargetMatcher::PortSuffix(format!(":{port}")),
            (false, true) => TargetMatcher::HostPrefix(format!("{host}:")),
            (false, false) => TargetMatcher::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, target: &str) -> bool {
        match self {
            TargetMatcher::Any => !target.is_empty(),
            TargetMatcher::PortSuffix(suffix) => {
                target.len() > suffix.len() && target.ends_with(suffix)
            }
            TargetMatcher::HostPrefix(prefix) => {
                target.len() > prefix.len() && target.starts_with(prefix)
            }
            TargetMatcher::Exact(literal) => target == literal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_both_matches_anything() {
        let m = TargetMatcher::compile("*:*");
        assert_eq!(m, TargetMatcher::Any);
        assert!(m.matches("anything:1234"));
        assert!(m.matches("1.2.3.4:80"));
        assert!(!m.matches(""));
    }

    #[test]
    fn test_wildcard_host_literal_port() {
        let m = TargetMatcher::compile("*:443");
        assert!(m.matches("10.0.0.1:443"));
        assert!(m.matches("example.com:443"));
        assert!(!m.matches("10.0.0.1:8443"));
        assert!(!m.matches("10.0.0.1:443x"));
        // The host part must be non-empty, like the anchored `.+:443`.
        assert!(!m.matches(":443"));
    }

    #[test]
    fn test_literal_host_wildcard_port() {
        let m = TargetMatcher::compile("10.0.0.1:*");
        assert!(m.matches("10.0.0.1:1"));
        assert!(m.matches("10.0.0.1:65535"));
        assert!(!m.matches("10.0.0.2:1"));
        assert!(!m.matches("10.0.0.1:"));
        assert!(!m.matches("110.0.0.1:1"));
    }

    #[test]
    fn test_exact_match_only() {
        let m = TargetMatcher::compile("10.0.0.1:443");
        assert!(m.matches("10.0.0.1:443"));
        assert!(!m.matches("10.0.0.1:4433"));
        assert!(!m.matches("10.0.0.10:443"));
        assert!(!m.matches("x10.0.0.1:443"));
    }

    #[test]
    fn test_compile_is_total() {
        // Malformed patterns still compile; they just never match a target.
        let m = TargetMatcher::compile("no-colon-here");
        assert!(!m.matches("example.com:80"));
        let m = TargetMatcher::compile("");
        assert!(!m.matches("example.com:80"));
    }
}
