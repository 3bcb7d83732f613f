//! Expands free-text host input into a list of IPv4 addresses.
//!
//! Accepted tokens, separated by commas or whitespace:
//! `192.168.1.10`, `192.168.1.0/28`, `192.168.1.1-192.168.1.20`, `192.168.1.1-20`.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use crate::error::{MonitorError, Result};

/// Upper bound on addresses a single token may expand to.
pub const MAX_TOKEN_EXPANSION: u32 = 256;

pub fn expand_hosts(text: &str, max_hosts: usize) -> Result<Vec<Ipv4Addr>> {
    let mut seen = HashSet::new();
    let mut hosts = Vec::new();

    for token in text
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        for ip in expand_token(token)? {
            if seen.insert(ip) {
                hosts.push(ip);
            }
        }
        if hosts.len() > max_hosts {
            break;
        }
    }

    if hosts.is_empty() {
        return Err(MonitorError::invalid_input("no valid IP addresses found"));
    }
    if hosts.len() > max_hosts {
        return Err(MonitorError::invalid_input(format!(
            "at most {max_hosts} hosts can be monitored at once"
        )));
    }
    Ok(hosts)
}

fn expand_token(token: &str) -> Result<Vec<Ipv4Addr>> {
    if let Some((addr, prefix)) = token.split_once('/') {
        return expand_cidr(token, addr, prefix);
    }
    if let Some((start, end)) = token.split_once('-') {
        return expand_range(token, start.trim(), end.trim());
    }
    Ok(vec![parse_addr(token, token)?])
}

fn expand_cidr(token: &str, addr: &str, prefix: &str) -> Result<Vec<Ipv4Addr>> {
    let base = u32::from(parse_addr(token, addr)?);
    let prefix: u32 = prefix
        .trim()
        .parse()
        .ok()
        .filter(|p| *p <= 32)
        .ok_or_else(|| bad_token(token))?;

    let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
    let network = base & mask;
    let broadcast = network | !mask;

    // /31 and /32 have no network/broadcast address to skip.
    let (first, last) = if prefix >= 31 {
        (network, broadcast)
    } else {
        (network + 1, broadcast - 1)
    };
    Ok(bounded_span(first, last))
}

fn expand_range(token: &str, start: &str, end: &str) -> Result<Vec<Ipv4Addr>> {
    let start_ip = parse_addr(token, start)?;
    let end_ip = if end.contains('.') {
        parse_addr(token, end)?
    } else {
        let last: u8 = end.parse().map_err(|_| bad_token(token))?;
        let [a, b, c, _] = start_ip.octets();
        Ipv4Addr::new(a, b, c, last)
    };

    let (first, last) = (u32::from(start_ip), u32::from(end_ip));
    if last < first {
        return Err(MonitorError::invalid_input(format!(
            "range '{token}' ends before it starts"
        )));
    }
    Ok(bounded_span(first, last))
}

fn bounded_span(first: u32, last: u32) -> Vec<Ipv4Addr> {
    let count = (last - first).saturating_add(1).min(MAX_TOKEN_EXPANSION);
    (0..count).map(|i| Ipv4Addr::from(first + i)).collect()
}

fn parse_addr(token: &str, text: &str) -> Result<Ipv4Addr> {
    text.trim().parse().map_err(|_| bad_token(token))
}

fn bad_token(token: &str) -> MonitorError {
    MonitorError::invalid_input(format!("'{token}' is not an IPv4 address, CIDR block or range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ips(list: &[&str]) -> Vec<Ipv4Addr> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn single_and_comma_list() {
        let hosts = expand_hosts("8.8.8.8, 1.1.1.1 8.8.8.8\n9.9.9.9", 100).unwrap();
        assert_eq!(hosts, ips(&["8.8.8.8", "1.1.1.1", "9.9.9.9"]));
    }

    #[test]
    fn cidr_skips_network_and_broadcast() {
        let hosts = expand_hosts("192.168.1.0/30", 100).unwrap();
        assert_eq!(hosts, ips(&["192.168.1.1", "192.168.1.2"]));
    }

    #[test]
    fn cidr_32_is_the_address_itself() {
        assert_eq!(expand_hosts("10.1.2.3/32", 100).unwrap(), ips(&["10.1.2.3"]));
    }

    #[test]
    fn short_and_full_ranges() {
        assert_eq!(
            expand_hosts("10.0.0.1-3", 100).unwrap(),
            ips(&["10.0.0.1", "10.0.0.2", "10.0.0.3"])
        );
        assert_eq!(
            expand_hosts("10.0.0.255-10.0.1.0", 100).unwrap(),
            ips(&["10.0.0.255", "10.0.1.0"])
        );
    }

    #[test]
    fn large_cidr_is_capped_per_token() {
        let err = expand_hosts("10.0.0.0/16", 100).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidInput(_)));
        assert_eq!(expand_hosts("10.0.0.0/16", 1000).unwrap().len(), 256);
    }

    #[test]
    fn rejects_garbage_and_empty() {
        assert!(matches!(expand_hosts("", 100), Err(MonitorError::InvalidInput(_))));
        assert!(matches!(expand_hosts(" , ", 100), Err(MonitorError::InvalidInput(_))));
        assert!(matches!(expand_hosts("10.0.0.300", 100), Err(MonitorError::InvalidInput(_))));
        assert!(matches!(expand_hosts("10.0.0.0/33", 100), Err(MonitorError::InvalidInput(_))));
        assert!(matches!(expand_hosts("10.0.0.9-1", 100), Err(MonitorError::InvalidInput(_))));
    }

    #[test]
    fn host_limit_is_inclusive() {
        assert_eq!(expand_hosts("10.0.0.1-100", 100).unwrap().len(), 100);
        assert!(expand_hosts("10.0.0.1-101", 100).is_err());
    }
}
