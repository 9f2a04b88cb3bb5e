// Library exports for integration tests and external consumers.

pub mod matcher;
pub mod proxy;
pub mod redirect;
pub mod rules;

pub use proxy::ProxyServer;
pub use redirect::{ConnectDecision, ConnectPolicy, RedirectTable};
pub use rules::{RuleLoadError, RuleSet};
