//! Proxy server module.
//!
//! A thin HTTP/1.1 forward proxy. CONNECT requests are tunneled to whatever
//! target the configured [`ConnectPolicy`](crate::redirect::ConnectPolicy)
//! decides; everything else is forwarded unmodified.
//!
//! # Module Structure
//!
//! - `server` - ProxyServer struct and accept loop
//! - `handler` - splits CONNECT tunneling from plain forwarding
//! - `tunnel` - CONNECT upgrade and bidirectional byte copying
//! - `forwarding` - plain HTTP forwarding through the shared client
//! - `headers` - hop-by-hop header stripping

mod forwarding;
mod handler;
mod headers;
mod server;
mod tunnel;

pub use server::ProxyServer;
