//! Hop-by-hop header handling.

use hyper::header::{HeaderMap, HeaderName};

// RFC 7230 connection-specific headers, plus the non-standard
// Proxy-Connection some clients still send.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers before a message crosses the proxy.
pub fn strip_hop_by_hop_headers(headers: &mut HeaderMap) {
    // Headers named by Connection are hop-by-hop too.
    let named: Vec<HeaderName> = headers
        .get_all("connection")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| name.trim().parse::<HeaderName>().ok())
        .collect();
    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_standard_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", "keep-alive".parse().unwrap());
        headers.insert("proxy-connection", "keep-alive".parse().unwrap());
        headers.insert("transfer-encoding", "chunked".parse().unwrap());
        headers.insert("accept", "*/*".parse().unwrap());

        strip_hop_by_hop_headers(&mut headers);

        assert!(headers.get("connection").is_none());
        assert!(headers.get("proxy-connection").is_none());
        assert!(headers.get("transfer-encoding").is_none());
        assert_eq!(headers.get("accept").unwrap(), "*/*");
    }

    #[test]
    fn test_strips_headers_named_by_connection() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", "x-custom-hop".parse().unwrap());
        headers.insert("x-custom-hop", "1".parse().unwrap());
        headers.insert("x-kept", "1".parse().unwrap());

        strip_hop_by_hop_headers(&mut headers);

        assert!(headers.get("x-custom-hop").is_none());
        assert_eq!(headers.get("x-kept").unwrap(), "1");
    }
}
