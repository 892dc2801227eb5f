use crate::SortError;
use std::net::{IpAddr, Ipv4Addr};

/// Resolves `hostname` to its first IPv4 address. IPv4 literals are returned as they are.
pub fn resolve_ipv4(hostname: &str) -> Result<Ipv4Addr, SortError> {
    if let Ok(ip) = hostname.parse::<Ipv4Addr>() {
        return Ok(ip);
    }
    let ips: Vec<IpAddr> = dns_lookup::lookup_host(hostname)?;
    let ip = ips
        .into_iter()
        .find_map(|ip| match ip {
            IpAddr::V4(ipv4) => Some(ipv4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| SortError::new(format!("could not resolve {hostname} to IPv4")))?;
    tracing::info!("Will send echo requests to {}", ip);
    Ok(ip)
}
