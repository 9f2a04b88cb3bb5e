//! Plain HTTP forwarding through the shared client.
//!
//! Non-CONNECT requests are forwarded to the URI the client asked for, with
//! streaming bodies and hop-by-hop headers stripped in both directions. No
//! redirection rules apply here; only CONNECT targets are rewritten.

use std::convert::Infallible;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use tracing::{debug, error};

use super::headers::strip_hop_by_hop_headers;
use super::server::HttpClient;

/// Build an error response with a small JSON body.
pub fn error_response(status: StatusCode, message: &str) -> Response<BoxBody<Bytes, hyper::Error>> {
    let body = format!(r#"{{"error": "{message}"}}"#);
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(BoxBody::new(
            Full::new(Bytes::from(body)).map_err(|never: Infallible| match never {}),
        ))
        .unwrap()
}

pub fn empty_response(status: StatusCode) -> Response<BoxBody<Bytes, hyper::Error>> {
    Response::builder()
        .status(status)
        .body(BoxBody::new(
            Full::new(Bytes::new()).map_err(|never: Infallible| match never {}),
        ))
        .unwrap()
}

/// Forward a plain HTTP request with a streaming body (no buffering).
pub async fn forward_request(
    http_client: &HttpClient,
    req: Request<Incoming>,
) -> Response<BoxBody<Bytes, hyper::Error>> {
    // Proxy clients send absolute-form URIs; anything else did not mean to
    // talk to a proxy.
    if req.uri().authority().is_none() {
        return error_response(StatusCode::BAD_REQUEST, "not a proxy request");
    }

    debug!("Forwarding {} {}", req.method(), req.uri());

    let (mut parts, body) = req.into_parts();
    strip_hop_by_hop_headers(&mut parts.headers);
    let upstream_req = Request::from_parts(parts, BoxBody::new(body));

    match http_client.request(upstream_req).await {
        Ok(upstream_response) => {
            let (mut parts, body) = upstream_response.into_parts();
            strip_hop_by_hop_headers(&mut parts.headers);
            Response::from_parts(parts, BoxBody::new(body))
        }
        Err(err) => {
            error!("Failed to forward request: {}", err);
            error_response(StatusCode::BAD_GATEWAY, "Bad Gateway")
        }
    }
}
