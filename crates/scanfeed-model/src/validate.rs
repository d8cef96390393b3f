//! Syntax checks for network-related field values.

use std::net::IpAddr;

use ipnetwork::IpNetwork;

/// Parses a single IP address.
///
/// A network holding exactly one address (`/32` or `/128`) is accepted and
/// reduced to that address.
pub fn parse_ip(value: &str) -> Option<IpAddr> {
    let trimmed = value.trim();
    if let Ok(addr) = trimmed.parse::<IpAddr>() {
        return Some(addr);
    }
    let network = parse_network(trimmed)?;
    is_single_host(&network).then(|| network.ip())
}

/// Parses a CIDR network (`addr/prefix`). Host bits must be zero.
///
/// A bare address is read as a single-host network. Shortened IPv4
/// addresses such as `10/8` are rejected.
pub fn parse_network(value: &str) -> Option<IpNetwork> {
    let trimmed = value.trim();
    let addr = trimmed.split_once('/').map_or(trimmed, |(addr, _)| addr);
    addr.parse::<IpAddr>().ok()?;
    let network = trimmed.parse::<IpNetwork>().ok()?;
    (network.ip() == network.network()).then_some(network)
}

fn is_single_host(network: &IpNetwork) -> bool {
    match network {
        IpNetwork::V4(net) => net.prefix() == 32,
        IpNetwork::V6(net) => net.prefix() == 128,
    }
}

/// Checks domain-name syntax.
///
/// IP addresses and URLs are not domain names. A single trailing dot is
/// tolerated and removed by [`sanitize_fqdn`].
pub fn is_valid_fqdn(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 || value.ends_with('.') {
        return false;
    }
    if value.parse::<IpAddr>().is_ok() || value.contains("://") || value.contains('/') {
        return false;
    }
    value.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

/// Trims whitespace and a trailing dot; returns `None` for invalid names.
pub fn sanitize_fqdn(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let stripped = trimmed.strip_suffix('.').unwrap_or(trimmed);
    is_valid_fqdn(stripped).then(|| stripped.to_string())
}

/// Normalizes a URL.
///
/// Defanged `hxxp://` schemes are restored. Values without a scheme are
/// retried with `http://` prepended. The result must carry a host.
pub fn sanitize_url(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let refanged = trimmed
        .replace("hxxp://", "http://")
        .replace("hxxps://", "https://");

    let candidates = [refanged.clone(), format!("http://{refanged}")];
    candidates.into_iter().find(|candidate| has_host(candidate))
}

fn has_host(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| !host.is_empty()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_host_networks_reduce_to_addresses() {
        assert_eq!(parse_ip("10.0.0.1/32"), "10.0.0.1".parse().ok());
        assert_eq!(parse_ip("10.0.0.0/24"), None);
        assert_eq!(parse_ip("::1"), "::1".parse().ok());
        assert_eq!(parse_ip("999.1.1.1"), None);
    }

    #[test]
    fn networks_reject_host_bits() {
        assert!(parse_network("198.123.245.0/24").is_some());
        assert!(parse_network("198.123.245.1/24").is_none());
        assert!(parse_network("2001:db8::/32").is_some());
        assert!(parse_network("10.0.0.0/33").is_none());
        assert!(parse_network("10.0.0.0/").is_none());
        assert!(parse_network("10.0.0.0/8x").is_none());
        assert!(parse_network("10/8").is_none());
        assert_eq!(parse_ip("10.1"), None);
        let network = parse_network(" 192.0.2.0/28 ").unwrap();
        assert_eq!(network.prefix(), 28);
        assert_eq!(parse_network("192.0.2.7").map(|net| net.prefix()), Some(32));
    }

    #[test]
    fn fqdn_rules() {
        assert!(is_valid_fqdn("host.local"));
        assert!(is_valid_fqdn("dhcp-128-171-32-12.bilger.hawaii.edu"));
        assert!(!is_valid_fqdn("127.0.0.1"));
        assert!(!is_valid_fqdn("http://example.com"));
        assert!(!is_valid_fqdn("bad..name"));
        assert!(!is_valid_fqdn("-leading.example"));
        assert_eq!(sanitize_fqdn("example.com."), Some("example.com".to_string()));
    }

    #[test]
    fn url_rules() {
        assert_eq!(
            sanitize_url("hxxp://evil.example/x"),
            Some("http://evil.example/x".to_string())
        );
        assert_eq!(
            sanitize_url("example.com/path"),
            Some("http://example.com/path".to_string())
        );
        assert_eq!(sanitize_url(""), None);
    }
}
