//! Caller identity hints (IP address, user agent) for audit and rate limiting.

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, Extensions, HeaderMap};

use crate::state::AppState;

/// Best-effort client details. Never rejects.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: IpAddr,
    pub user_agent: Option<String>,
}

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientInfo::from_parts(
            &parts.headers,
            &parts.extensions,
            &state.config.trusted_proxies,
        ))
    }
}

impl ClientInfo {
    pub fn from_parts(headers: &HeaderMap, extensions: &Extensions, trusted: &[IpAddr]) -> Self {
        Self {
            ip: client_ip(headers, extensions, trusted),
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// Resolve the client IP from the socket peer.
///
/// `X-Forwarded-For` is only read when the peer is one of `trusted`. The
/// header is then walked right to left and the first hop that is not itself
/// a trusted proxy wins. Without a peer address the unspecified address is
/// returned.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions, trusted: &[IpAddr]) -> IpAddr {
    let Some(peer) = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    };

    if !trusted.contains(&peer) {
        return peer;
    }

    headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .find(|hop| !trusted.contains(hop))
        .unwrap_or(peer)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn peer(ip: [u8; 4]) -> Extensions {
        let mut ext = Extensions::new();
        ext.insert(ConnectInfo(SocketAddr::from((ip, 9000))));
        ext
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn untrusted_peer_ignores_forwarded_for() {
        let headers = forwarded("203.0.113.7");
        let ext = peer([198, 51, 100, 9]);

        assert_eq!(client_ip(&headers, &ext, &[]), IpAddr::from([198, 51, 100, 9]));
        // A proxy list that does not name this peer changes nothing.
        let other = [IpAddr::from([10, 0, 0, 1])];
        assert_eq!(client_ip(&headers, &ext, &other), IpAddr::from([198, 51, 100, 9]));
    }

    #[test]
    fn trusted_peer_uses_nearest_untrusted_hop() {
        let trusted = [IpAddr::from([10, 0, 0, 1]), IpAddr::from([10, 0, 0, 2])];
        // Leftmost entry is client-controlled and must not be taken.
        let headers = forwarded("1.2.3.4, 203.0.113.7, 10.0.0.2");
        let ext = peer([10, 0, 0, 1]);

        assert_eq!(client_ip(&headers, &ext, &trusted), IpAddr::from([203, 0, 113, 7]));
    }

    #[test]
    fn trusted_peer_without_header_is_the_client() {
        let trusted = [IpAddr::from([10, 0, 0, 1])];
        let ext = peer([10, 0, 0, 1]);

        assert_eq!(client_ip(&HeaderMap::new(), &ext, &trusted), IpAddr::from([10, 0, 0, 1]));
        let garbage = forwarded("not-an-ip");
        assert_eq!(client_ip(&garbage, &ext, &trusted), IpAddr::from([10, 0, 0, 1]));
    }

    #[test]
    fn missing_peer_is_unspecified_even_with_header() {
        let headers = forwarded("203.0.113.7");
        assert_eq!(
            client_ip(&headers, &Extensions::new(), &[]),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }
}
