//! Network location table and IP-to-subnet lookup.
//!
//! The table is a JSON object keyed by location name:
//!
//! ```json
//! { "HQ-Floor1": { "network_address": "10.36.50.0", "subnet_mask": "255.255.255.0", "gateway": "10.36.50.1" } }
//! ```
//!
//! Lookups scan entries in file order and return the first range that contains
//! the address. Overlapping ranges are not detected.

use anyhow::{Context, Result};
use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::models::*;
use crate::utils::parse_ipv4;

/// LocationTable holds the network table in file order
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    entries: Vec<LocationEntry>,
}

impl LocationTable {
    /// Read and parse the table from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read network table {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse network table {}", path.display()))
    }

    /// Parse a table from JSON text, keeping the key order of the document.
    /// Entries with missing or mistyped fields are logged and left out.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;

        let mut entries = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let fields: LocationFields = match serde_json::from_value(value) {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!("Skipping location {:?}: {}", name, e);
                    continue;
                }
            };
            entries.push(LocationEntry {
                name,
                network_address: fields.network_address,
                subnet_mask: fields.subnet_mask,
                gateway: fields.gateway,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[LocationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Network range of an entry. The mask may be dotted ("255.255.255.0") or a
/// prefix length ("24"); host bits in the network address are ignored.
pub fn entry_network(entry: &LocationEntry) -> Result<Ipv4Network> {
    let addr: Ipv4Addr = entry
        .network_address
        .trim()
        .parse()
        .with_context(|| format!("Invalid network address {:?}", entry.network_address))?;

    let mask = entry.subnet_mask.trim().trim_start_matches('/');
    let network = match mask.parse::<u8>() {
        Ok(prefix) => Ipv4Network::new(addr, prefix),
        Err(_) => {
            let netmask: Ipv4Addr = mask
                .parse()
                .with_context(|| format!("Invalid subnet mask {:?}", entry.subnet_mask))?;
            Ipv4Network::with_netmask(addr, netmask)
        }
    }
    .map_err(|e| anyhow::anyhow!("Invalid network {}/{}: {}", entry.network_address, entry.subnet_mask, e))?;

    Ok(network)
}

/// Find the first location whose range contains `ip`.
///
/// Returns `Ok(None)` on a miss. A malformed `ip` is an error for the caller to
/// report; a malformed table entry is logged and skipped.
pub fn find_location(ip: &str, table: &LocationTable) -> Result<Option<LocationMatch>> {
    let addr = parse_ipv4(ip)?;

    for entry in table.entries() {
        let network = match entry_network(entry) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Skipping location {}: {}", entry.name, e);
                continue;
            }
        };

        if network.contains(addr) {
            return Ok(Some(LocationMatch {
                name: entry.name.clone(),
                network_address: entry.network_address.clone(),
                subnet_mask: entry.subnet_mask.clone(),
                gateway: entry.gateway.clone(),
                cidr: format!("{}/{}", network.network(), network.prefix()),
            }));
        }
    }

    Ok(None)
}

/// Resolve several addresses independently; misses and bad input are reported per address
pub fn resolve_many(ips: &[String], table: &LocationTable) -> ResolveResponse {
    let mut response = ResolveResponse::default();

    for ip in ips {
        match find_location(ip, table) {
            Ok(Some(m)) => response.resolved.push(ResolvedAddress {
                ip_address: ip.clone(),
                location: m.name,
                subnet_mask: m.subnet_mask,
                gateway: m.gateway,
            }),
            Ok(None) => response.unresolved.push(UnresolvedAddress {
                ip_address: ip.clone(),
                reason: "no matching location".to_string(),
            }),
            Err(e) => response.unresolved.push(UnresolvedAddress {
                ip_address: ip.clone(),
                reason: e.to_string(),
            }),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "HQ-Floor1": { "network_address": "10.36.50.0", "subnet_mask": "255.255.255.0", "gateway": "10.36.50.1" },
        "HQ-Floor2": { "network_address": "10.36.51.0", "subnet_mask": "255.255.255.128", "gateway": "10.36.51.1" },
        "Branch-A":  { "network_address": "172.16.8.17", "subnet_mask": "21", "gateway": "172.16.8.1" },
        "Broken":    { "network_address": "10.99.0.0", "subnet_mask": "255.0.255.0", "gateway": "10.99.0.1" }
    }"#;

    fn table() -> LocationTable {
        LocationTable::from_json(TABLE).unwrap()
    }

    #[test]
    fn test_from_json_keeps_file_order() {
        let t = table();
        let names: Vec<&str> = t.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["HQ-Floor1", "HQ-Floor2", "Branch-A", "Broken"]);
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_from_json_skips_incomplete_entries() {
        let t = LocationTable::from_json(
            r#"{
                "HQ":   { "network_address": "10.36.50.0", "subnet_mask": "255.255.255.0", "gateway": "10.36.50.1" },
                "Lab":  { "network_address": "10.40.0.0", "subnet_mask": 16, "gateway": "10.40.0.1" },
                "Todo": { "network_address": "10.50.0.0", "subnet_mask": "255.255.0.0" },
                "Junk": "not an object"
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = t.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["HQ", "Lab"]);

        let m = find_location("10.36.50.60", &t).unwrap().unwrap();
        assert_eq!(m.name, "HQ");

        // Numeric mask reads as a prefix length
        let m = find_location("10.40.200.1", &t).unwrap().unwrap();
        assert_eq!(m.name, "Lab");
        assert_eq!(m.cidr, "10.40.0.0/16");

        assert!(find_location("10.50.0.9", &t).unwrap().is_none());
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(LocationTable::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_find_location_inside_single_range() {
        let m = find_location("10.36.50.60", &table()).unwrap().unwrap();
        assert_eq!(m.name, "HQ-Floor1");
        assert_eq!(m.gateway, "10.36.50.1");
        assert_eq!(m.subnet_mask, "255.255.255.0");
        assert_eq!(m.cidr, "10.36.50.0/24");
    }

    #[test]
    fn test_find_location_partial_mask() {
        let m = find_location("10.36.51.100", &table()).unwrap().unwrap();
        assert_eq!(m.name, "HQ-Floor2");
        // .128/25 is outside the lower half
        assert!(find_location("10.36.51.200", &table()).unwrap().is_none());
    }

    #[test]
    fn test_find_location_prefix_length_and_host_bits() {
        let m = find_location("172.16.15.254", &table()).unwrap().unwrap();
        assert_eq!(m.name, "Branch-A");
        assert_eq!(m.cidr, "172.16.8.0/21");
        assert!(find_location("172.16.16.1", &table()).unwrap().is_none());
    }

    #[test]
    fn test_find_location_no_match() {
        assert!(find_location("192.168.1.10", &table()).unwrap().is_none());
    }

    #[test]
    fn test_find_location_skips_broken_entry() {
        // The only entry covering 10.99.x.x has a non-contiguous mask
        assert!(find_location("10.99.0.5", &table()).unwrap().is_none());
    }

    #[test]
    fn test_find_location_malformed_ip() {
        assert!(find_location("10.36.50", &table()).is_err());
        assert!(find_location("not-an-ip", &table()).is_err());
    }

    #[test]
    fn test_find_location_first_match_wins() {
        let overlapping = LocationTable::from_json(
            r#"{
                "Wide":   { "network_address": "10.0.0.0", "subnet_mask": "255.0.0.0", "gateway": "10.0.0.1" },
                "Narrow": { "network_address": "10.1.0.0", "subnet_mask": "255.255.0.0", "gateway": "10.1.0.1" }
            }"#,
        )
        .unwrap();
        let m = find_location("10.1.2.3", &overlapping).unwrap().unwrap();
        assert_eq!(m.name, "Wide");
    }

    #[test]
    fn test_resolve_many() {
        let ips = vec![
            "10.36.50.9".to_string(),
            "192.168.0.1".to_string(),
            "bogus".to_string(),
        ];
        let r = resolve_many(&ips, &table());
        assert_eq!(r.resolved.len(), 1);
        assert_eq!(r.resolved[0].location, "HQ-Floor1");
        assert_eq!(r.unresolved.len(), 2);
        assert_eq!(r.unresolved[0].reason, "no matching location");
        assert!(r.unresolved[1].reason.contains("ip_address"));
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network_config.json");
        std::fs::write(&path, TABLE).unwrap();
        let t = LocationTable::load(&path).await.unwrap();
        assert_eq!(t.len(), 4);

        let missing = LocationTable::load(dir.path().join("nope.json")).await;
        assert!(missing.is_err());
    }
}
