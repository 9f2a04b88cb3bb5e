//! CONNECT tunneling.
//!
//! The redirect policy is consulted once per CONNECT request, before the
//! upstream connection is made. After the 200 response the tunnel is a plain
//! byte pipe; TLS (or anything else) inside it passes through untouched.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::{debug, error};

use super::forwarding::{empty_response, error_response};
use crate::redirect::{ConnectDecision, ConnectPolicy};

/// Handle a CONNECT request: decide the real upstream, connect, and spawn
/// the tunnel task.
pub async fn handle_connect(
    policy: &Arc<dyn ConnectPolicy>,
    req: Request<Incoming>,
) -> Response<BoxBody<Bytes, hyper::Error>> {
    let Some(authority) = req.uri().authority() else {
        return error_response(StatusCode::BAD_REQUEST, "CONNECT target missing");
    };

    // CONNECT targets normally carry an explicit port; default to 443 so
    // matching always sees a host:port pair.
    let target = if authority.port().is_some() {
        authority.to_string()
    } else {
        format!("{authority}:443")
    };

    let upstream = match policy.decide(&target) {
        ConnectDecision::Redirect(destination) => {
            debug!("CONNECT {} redirected to {}", target, destination);
            destination
        }
        ConnectDecision::Passthrough => {
            debug!("CONNECT {} passed through", target);
            target.clone()
        }
    };

    let mut upstream_stream = match TcpStream::connect(&upstream).await {
        Ok(stream) => {
            let _ = stream.set_nodelay(true);
            stream
        }
        Err(err) => {
            error!("Failed to connect to {}: {}", upstream, err);
            return error_response(StatusCode::BAD_GATEWAY, "upstream connect failed");
        }
    };

    // The upgrade completes after the 200 response has been written, so the
    // tunnel runs in its own task.
    tokio::spawn(async move {
        match hyper::upgrade::on(req).await {
            Ok(upgraded) => {
                let mut client_stream = TokioIo::new(upgraded);
                match tokio::io::copy_bidirectional(&mut client_stream, &mut upstream_stream).await
                {
                    Ok((sent, received)) => {
                        debug!(
                            "Tunnel to {} closed ({} bytes sent, {} received)",
                            upstream, sent, received
                        );
                    }
                    Err(err) => {
                        debug!("Tunnel to {} ended with error: {}", upstream, err);
                    }
                }
            }
            Err(err) => {
                error!("CONNECT upgrade failed: {}", err);
            }
        }
    });

    empty_response(StatusCode::OK)
}
