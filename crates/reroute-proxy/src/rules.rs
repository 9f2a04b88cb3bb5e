//! Settings file parsing.
//!
//! The settings file is plain text with one redirection route per line:
//!
//! ```text
//! {src-ip|*}:{src-port|*}   {dst-ip}:{dst-port}
//! ```
//!
//! Wildcards are only permitted on the source side. The whole file is parsed
//! up front; a single malformed line rejects the load so the proxy never runs
//! with a partial rule set.

use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Shape of a single route line: source pattern, whitespace, literal destination.
static LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9.*]+:[0-9*]+)[ \t]+([0-9.]+:[0-9]+)$").unwrap());

/// One redirection route as written in the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub source: String,
    pub destination: String,
}

/// An ordered set of routes keyed by source pattern.
///
/// Duplicate source patterns overwrite the earlier destination (last wins)
/// while keeping the first occurrence's position.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: String, destination: String) {
        match self.rules.iter_mut().find(|r| r.source == source) {
            Some(existing) => existing.destination = destination,
            None => self.rules.push(Rule {
                source,
                destination,
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Errors from loading the settings file. All of them are terminal for the
/// load; there is no skip-and-continue for bad lines.
#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("settings file {path:?} doesn't exist")]
    NotFound { path: PathBuf },

    #[error("failed to read settings file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bad settings format at line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },
}

/// Read and parse the settings file at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<RuleSet, RuleLoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuleLoadError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| RuleLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents)
}

/// Parse settings file content into a [`RuleSet`].
pub fn parse(contents: &str) -> Result<RuleSet, RuleLoadError> {
    let mut rules = RuleSet::new();
    for (idx, line) in split_lines(contents).enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let captures = LINE_RE
            .captures(line)
            .ok_or_else(|| RuleLoadError::MalformedLine {
                line: idx + 1,
                content: line.to_string(),
            })?;
        rules.insert(captures[1].to_string(), captures[2].to_string());
    }
    Ok(rules)
}

/// Split file content into lines with `\r\n` normalized to `\n`.
fn split_lines(contents: &str) -> impl Iterator<Item = &str> {
    contents.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_single_rule() {
        let rules = parse("1.2.3.4:443   5.6.7.8:8443").unwrap();
        assert_eq!(rules.len(), 1);
        let rule = rules.iter().next().unwrap();
        assert_eq!(rule.source, "1.2.3.4:443");
        assert_eq!(rule.destination, "5.6.7.8:8443");
    }

    #[test]
    fn test_parse_wildcard_sources() {
        let rules = parse("*:80 127.0.0.1:9000\n*:* 127.0.0.1:3128\n").unwrap();
        assert_eq!(rules.len(), 2);
        let sources: Vec<_> = rules.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["*:80", "*:*"]);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let rules = parse("\n1.2.3.4:443 5.6.7.8:8443\n\n   \n*:80 127.0.0.1:9000\n\n").unwrap();
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_parse_count_equals_non_blank_lines() {
        let rules = parse("1.1.1.1:1 2.2.2.2:2\n3.3.3.3:3 4.4.4.4:4\n5.5.5.5:5 6.6.6.6:6").unwrap();
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_parse_crlf_same_as_lf() {
        let lf = parse("*:80 127.0.0.1:9000\n1.2.3.4:443 5.6.7.8:8443\n").unwrap();
        let crlf = parse("*:80 127.0.0.1:9000\r\n1.2.3.4:443 5.6.7.8:8443\r\n").unwrap();
        assert_eq!(lf.len(), crlf.len());
        for (a, b) in lf.iter().zip(crlf.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_parse_tab_separator() {
        let rules = parse("1.2.3.4:443\t5.6.7.8:8443").unwrap();
        assert_eq!(rules.iter().next().unwrap().destination, "5.6.7.8:8443");
    }

    #[test]
    fn test_parse_duplicate_source_last_wins() {
        let rules = parse("*:80 127.0.0.1:9000\n*:80 127.0.0.1:9001\n").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.iter().next().unwrap().destination, "127.0.0.1:9001");
    }

    #[test]
    fn test_parse_malformed_line_rejects_whole_file() {
        let err = parse("*:80 127.0.0.1:9000\nnot-a-rule\n").unwrap_err();
        match err {
            RuleLoadError::MalformedLine { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "not-a-rule");
            }
            other => panic!("expected MalformedLine, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_wildcard_destination() {
        assert!(parse("1.2.3.4:443 *:8443").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_destination() {
        assert!(parse("1.2.3.4:443").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("/nonexistent/settings.txt").unwrap_err();
        assert!(matches!(err, RuleLoadError::NotFound { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "*:443 127.0.0.1:8443").unwrap();
        let rules = load(file.path()).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.iter().next().unwrap().source, "*:443");
    }
}
