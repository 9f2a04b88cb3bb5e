//! Redirect registration and the CONNECT interception seam.
//!
//! The proxy server consults a [`ConnectPolicy`] once per CONNECT request.
//! [`RedirectTable`] is the rule-driven implementation: routes are registered
//! in settings-file order and the first matching pattern wins.

use std::sync::Arc;

use crate::matcher::TargetMatcher;
use crate::rules::RuleSet;

/// What to do with a CONNECT request for a given target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectDecision {
    /// Tunnel to the target the client asked for.
    Passthrough,
    /// Tunnel to this `host:port` instead.
    Redirect(String),
}

/// Per-connection hook: given the requested `host:port`, decide where the
/// tunnel actually goes. Implementations must be stateless enough to be
/// shared across connection tasks.
pub trait ConnectPolicy: Send + Sync {
    fn decide(&self, target: &str) -> ConnectDecision;
}

struct RedirectEntry {
    matcher: TargetMatcher,
    destination: String,
}

/// An ordered table of compiled redirect rules.
#[derive(Default)]
pub struct RedirectTable {
    entries: Vec<RedirectEntry>,
}

impl RedirectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register one route, confirming the mapping on stdout.
    /// Registration cannot fail; pattern compilation is total.
    pub fn register(&mut self, source: &str, destination: &str) {
        self.entries.push(RedirectEntry {
            matcher: TargetMatcher::compile(source),
            destination: destination.to_string(),
        });
        println!("Redirecting {source} -> {destination}");
    }

    /// Register every route from a parsed rule set, in file order.
    pub fn from_rules(rules: &RuleSet) -> Self {
        let mut table = Self::new();
        for rule in rules.iter() {
            table.register(&rule.source, &rule.destination);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_shared(self) -> Arc<dyn ConnectPolicy> {
        Arc::new(self)
    }
}

impl ConnectPolicy for RedirectTable {
    fn decide(&self, target: &str) -> ConnectDecision {
        for entry in &self.entries {
            if entry.matcher.matches(target) {
                return ConnectDecision::Redirect(entry.destination.clone());
            }
        }
        ConnectDecision::Passthrough
    }
}
