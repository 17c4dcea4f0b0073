//! Client address and user agent, as seen through the reverse proxy.

use std::convert::Infallible;
use std::net::IpAddr;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::USER_AGENT, request::Parts},
};

/// Where a request came from. Stored with refresh tokens, contact
/// messages and audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Read the client details from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: client_ip(headers),
            user_agent: header_str(headers, USER_AGENT.as_str()).map(str::to_string),
        }
    }

    #[must_use]
    pub fn ip(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// First `X-Forwarded-For` entry, then `X-Real-IP`, whichever parses as an
/// IP address. The result is in canonical form and fits `VARCHAR(45)`.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .and_then(parse_ip)
        .or_else(|| header_str(headers, "x-real-ip").and_then(parse_ip))
        .map(|ip| ip.to_string())
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_forwarded_for_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));

        let info = ClientInfo::from_headers(&headers);
        assert_eq!(info.ip(), Some("203.0.113.9"));
        assert_eq!(info.user_agent(), Some("Mozilla/5.0"));
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static(" 198.51.100.4 "));
        assert_eq!(client_ip(&headers).as_deref(), Some("198.51.100.4"));
    }

    #[test]
    fn test_junk_forwarded_for_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        let junk = "x".repeat(60);
        headers.insert("x-forwarded-for", HeaderValue::from_str(&junk).unwrap());
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&headers).as_deref(), Some("198.51.100.4"));
    }

    #[test]
    fn test_junk_headers_give_no_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_ip(&headers), None);
    }

    #[test]
    fn test_ipv6_is_canonical_and_fits_column() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("2001:0db8:0000:0000:0000:0000:0000:0001"),
        );
        let ip = client_ip(&headers).unwrap();
        assert_eq!(ip, "2001:db8::1");
        assert!(ip.len() <= 45);
    }

    #[test]
    fn test_no_headers() {
        assert_eq!(ClientInfo::from_headers(&HeaderMap::new()), ClientInfo::default());
    }
}
