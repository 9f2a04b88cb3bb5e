//! Request handling entry point.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};

use super::forwarding::forward_request;
use super::server::HttpClient;
use super::tunnel::handle_connect;
use crate::redirect::ConnectPolicy;

/// Dispatch one request: CONNECT requests become tunnels, everything else is
/// forwarded. Failures are reported to the client as HTTP error responses,
/// never as service errors.
pub async fn handle_request(
    http_client: &HttpClient,
    policy: &Arc<dyn ConnectPolicy>,
    req: Request<Incoming>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Infallible> {
    if req.method() == Method::CONNECT {
        Ok(handle_connect(policy, req).await)
    } else {
        Ok(forward_request(http_client, req).await)
    }
}
