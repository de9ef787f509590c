//! Target-range expansion.
//!
//! The scheduler queues one entry per sub-target so that each host is
//! scanned by its own invocation. This module turns a caller-supplied range
//! string into that list: whitespace- or comma-separated tokens, with
//! last-octet dash ranges (`192.168.1.1-5`) and CIDR blocks
//! (`192.168.1.0/24`) expanded one entry per host address.

use std::net::Ipv4Addr;

/// Expansion cap for a single CIDR or dash token. Blocks larger than this
/// are queued unexpanded as one entry; the engine handles ranges natively.
const MAX_EXPANSION: u32 = 1024;

/// Expands a target range string into one entry per sub-target.
///
/// Tokens that are neither a CIDR block nor a dash range (hostnames, single
/// addresses, IPv6 literals) pass through verbatim. An empty or
/// all-whitespace range yields an empty list.
pub fn expand_targets(range: &str) -> Vec<String> {
    range
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .flat_map(expand_token)
        .collect()
}

fn expand_token(token: &str) -> Vec<String> {
    if let Some(hosts) = expand_cidr(token) {
        return hosts;
    }
    if let Some(hosts) = expand_dash_range(token) {
        return hosts;
    }
    vec![token.to_string()]
}

/// Expands `a.b.c.d/prefix` into its usable host addresses.
///
/// /31 and /32 have no network/broadcast split and expand to the whole
/// block.
fn expand_cidr(token: &str) -> Option<Vec<String>> {
    let (ip_str, prefix_str) = token.split_once('/')?;
    let ip: Ipv4Addr = ip_str.parse().ok()?;
    let prefix: u8 = prefix_str.parse().ok()?;
    if prefix > 32 {
        return None;
    }

    let ip_u32 = u32::from(ip);
    let mask = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    };
    let network = ip_u32 & mask;
    let broadcast = network | !mask;

    let (start, end) = if prefix >= 31 {
        (network, broadcast)
    } else {
        (network + 1, broadcast - 1)
    };

    if end - start >= MAX_EXPANSION {
        return None;
    }

    Some(expand_u32_range(start, end))
}

/// Expands the nmap-style last-octet form `a.b.c.d-N`.
fn expand_dash_range(token: &str) -> Option<Vec<String>> {
    let (base, end_str) = token.rsplit_once('-')?;
    let start: Ipv4Addr = base.parse().ok()?;
    let end_octet: u8 = end_str.parse().ok()?;

    let start_octet = start.octets()[3];
    if end_octet < start_octet {
        return None;
    }

    let start_u32 = u32::from(start);
    let end_u32 = start_u32 + u32::from(end_octet - start_octet);
    if end_u32 - start_u32 >= MAX_EXPANSION {
        return None;
    }

    Some(expand_u32_range(start_u32, end_u32))
}

fn expand_u32_range(start: u32, end: u32) -> Vec<String> {
    (start..=end).map(|v| Ipv4Addr::from(v).to_string()).collect()
}
