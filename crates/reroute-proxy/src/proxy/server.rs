//! ProxyServer struct and main run loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use super::handler::handle_request;
use crate::redirect::ConnectPolicy;

/// Type alias for the shared upstream HTTP client. The proxy never
/// originates TLS itself, so a plain connector is enough.
pub(super) type HttpClient = Client<HttpConnector, BoxBody<Bytes, hyper::Error>>;

fn create_http_client() -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_keepalive(Some(Duration::from_secs(60)));
    connector.set_connect_timeout(Some(Duration::from_secs(10)));

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(90))
        .build(connector)
}

/// The forward proxy: one accept loop, one spawned task per connection.
pub struct ProxyServer {
    listener: TcpListener,
    policy: Arc<dyn ConnectPolicy>,
    http_client: HttpClient,
}

impl ProxyServer {
    /// Bind the listener. A bind failure (e.g. port already in use) is
    /// surfaced immediately so the caller can treat it as fatal.
    pub async fn bind(addr: SocketAddr, policy: Arc<dyn ConnectPolicy>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))?;
        Ok(Self {
            listener,
            policy,
            http_client: create_http_client(),
        })
    }

    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("failed to read listener address")
    }

    /// Accept connections until the process is interrupted.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.local_addr()?;
        info!("Listening on http://{}", addr);

        let policy = self.policy;
        let http_client = self.http_client;

        loop {
            let (stream, remote_addr) = self
                .listener
                .accept()
                .await
                .context("failed to accept connection")?;
            let policy = Arc::clone(&policy);
            let http_client = http_client.clone();

            tokio::spawn(async move {
                debug!("Accepted connection from {}", remote_addr);
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let policy = Arc::clone(&policy);
                    let http_client = http_client.clone();
                    async move { handle_request(&http_client, &policy, req).await }
                });

                // with_upgrades is required for CONNECT tunneling.
                if let Err(err) = http1::Builder::new()
                    .preserve_header_case(true)
                    .serve_connection(io, service)
                    .with_upgrades()
                    .await
                {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}
