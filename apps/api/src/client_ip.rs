use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use ipnet::IpNet;

/// Address the login guard and ban filter key requests by.
///
/// Always the canonical text form of an [`IpAddr`], with IPv4-mapped IPv6
/// addresses folded to IPv4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    fn from_addr(ip: IpAddr) -> Self {
        Self(ip.to_canonical().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Resolves the client address from the socket peer and, behind trusted
/// proxies, from `X-Forwarded-For`.
///
/// Proxies append to the right of the header and the client controls
/// everything to the left, so the header is walked right to left and the
/// first hop outside `trusted_proxies` wins.
#[derive(Debug, Clone, Default)]
pub struct ClientIpResolver {
    trusted_proxies: Vec<IpNet>,
}

impl ClientIpResolver {
    pub fn new(trusted_proxies: Vec<IpNet>) -> Self {
        Self { trusted_proxies }
    }

    pub fn resolve(&self, peer: SocketAddr, headers: &HeaderMap) -> ClientIp {
        let peer_ip = peer.ip().to_canonical();
        if !self.is_trusted(peer_ip) {
            return ClientIp::from_addr(peer_ip);
        }

        let hops = headers
            .get_all("x-forwarded-for")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|hop| !hop.is_empty())
            .collect::<Vec<_>>();

        for hop in hops.into_iter().rev() {
            // Anything left of an unparsable hop was not written by a proxy we trust.
            let Ok(hop_ip) = hop.parse::<IpAddr>() else {
                break;
            };
            let hop_ip = hop_ip.to_canonical();
            if !self.is_trusted(hop_ip) {
                return ClientIp::from_addr(hop_ip);
            }
        }

        ClientIp::from_addr(peer_ip)
    }

    fn is_trusted(&self, ip: IpAddr) -> bool {
        self.trusted_proxies
            .iter()
            .any(|network| network.contains(&ip))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::net::SocketAddr;
    use std::str::FromStr;

    use axum::http::{HeaderMap, HeaderValue};
    use ipnet::IpNet;

    use super::{ClientIp, ClientIpResolver};

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert("x-forwarded-for", value);
        }
        headers
    }

    fn peer(value: &str) -> SocketAddr {
        SocketAddr::from_str(value).unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)))
    }

    fn behind_private_proxies() -> ClientIpResolver {
        ClientIpResolver::new(IpNet::from_str("10.0.0.0/8").into_iter().collect())
    }

    #[test]
    fn untrusted_peer_cannot_spoof_forwarded_header() {
        let resolver = ClientIpResolver::default();
        let ip = resolver.resolve(peer("203.0.113.9:5000"), &forwarded("1.2.3.4"));
        assert_eq!(ip, ClientIp("203.0.113.9".to_owned()));
    }

    #[test]
    fn trusted_proxy_reports_hop_it_appended() {
        let resolver = behind_private_proxies();

        let ip = resolver.resolve(peer("10.1.2.3:443"), &forwarded(" 1.2.3.4 , 10.9.9.9"));
        assert_eq!(ip.as_str(), "1.2.3.4");

        let ip = resolver.resolve(peer("10.1.2.3:443"), &HeaderMap::new());
        assert_eq!(ip.as_str(), "10.1.2.3");
    }

    #[test]
    fn client_written_leftmost_hops_do_not_change_the_key() {
        let resolver = behind_private_proxies();

        let keys = (0..20)
            .map(|n| {
                let header = format!("6.6.6.{n}, 198.51.100.7");
                resolver
                    .resolve(peer("10.0.0.2:443"), &forwarded(&header))
                    .0
            })
            .collect::<HashSet<_>>();

        assert_eq!(keys.len(), 1);
        assert!(keys.contains("198.51.100.7"));
    }

    #[test]
    fn garbage_hop_stops_the_walk() {
        let resolver = behind_private_proxies();

        let ip = resolver.resolve(peer("10.0.0.2:443"), &forwarded("1.2.3.4, not-an-ip, 10.0.0.7"));
        assert_eq!(ip.as_str(), "10.0.0.2");

        let ip = resolver.resolve(peer("10.0.0.2:443"), &forwarded("10.0.0.5, 10.0.0.7"));
        assert_eq!(ip.as_str(), "10.0.0.2");
    }

    #[test]
    fn repeated_headers_are_read_in_order() {
        let resolver = behind_private_proxies();
        let mut headers = HeaderMap::new();
        headers.append("x-forwarded-for", HeaderValue::from_static("9.9.9.9"));
        headers.append("x-forwarded-for", HeaderValue::from_static("5.6.7.8, 10.0.0.3"));

        let ip = resolver.resolve(peer("10.0.0.2:443"), &headers);
        assert_eq!(ip.as_str(), "5.6.7.8");
    }

    #[test]
    fn addresses_are_keyed_canonically() {
        let resolver = behind_private_proxies();

        let ip = resolver.resolve(peer("10.0.0.2:443"), &forwarded("::FFFF:1.2.3.4"));
        assert_eq!(ip.as_str(), "1.2.3.4");

        let ip = resolver.resolve(peer("10.0.0.2:443"), &forwarded("2001:DB8:0:0::1"));
        assert_eq!(ip.as_str(), "2001:db8::1");

        let ip = ClientIpResolver::default().resolve(peer("[::ffff:5.6.7.8]:80"), &HeaderMap::new());
        assert_eq!(ip.as_str(), "5.6.7.8");
    }

    #[test]
    fn ipv6_peer_is_reported_without_port() {
        let resolver = ClientIpResolver::default();
        let ip = resolver.resolve(peer("[2001:db8::1]:8080"), &HeaderMap::new());
        assert_eq!(ip.as_str(), "2001:db8::1");
    }
}
