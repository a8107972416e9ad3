//! Benchmark endpoints and their normalization

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

/// A remote host running the counterpart measurement server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// IP literal or hostname handed to the tool
    pub address: String,
    /// Label used in metric names; equals `address` when none was given
    pub name: String,
}

impl Endpoint {
    /// Create an endpoint, falling back to the address when `name` is blank
    pub fn new<A: Into<String>, N: Into<String>>(address: A, name: N) -> Self {
        let address = address.into().trim().to_string();
        let name = name.into().trim().to_string();
        let name = if name.is_empty() { address.clone() } else { name };
        Self { address, name }
    }

    /// Parse one `addr[:name]` override entry.
    ///
    /// A bracketed IPv6 literal (`[fe80::1]:lab`) keeps its colons; otherwise
    /// the entry is split at the first `:`.
    pub fn parse_pair(entry: &str) -> Self {
        let entry = entry.trim();

        if let Some(rest) = entry.strip_prefix('[') {
            if let Some((address, tail)) = rest.split_once(']') {
                let name = tail.strip_prefix(':').unwrap_or("");
                return Self::new(address, name);
            }
        }

        match entry.split_once(':') {
            Some((address, name)) => Self::new(address, name),
            None => Self::new(entry, ""),
        }
    }

    /// True when the address is an IP literal rather than a hostname
    pub fn is_ip_literal(&self) -> bool {
        self.address.parse::<IpAddr>().is_ok()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.name)
    }
}

/// Ordered collection of endpoints built from the config document and overrides
#[derive(Debug, Default, Clone)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
    rejected: Vec<String>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint; entries without an address are rejected
    pub fn push(&mut self, endpoint: Endpoint) -> bool {
        if endpoint.address.is_empty() {
            self.rejected.push(endpoint.name);
            return false;
        }
        self.endpoints.push(endpoint);
        true
    }

    /// Add `address = "name"` tables in document order
    pub fn extend_from_tables(&mut self, tables: &[BTreeMap<String, String>]) {
        for table in tables {
            for (address, name) in table {
                self.push(Endpoint::new(address.as_str(), name.as_str()));
            }
        }
    }

    /// Add a comma-separated `addr[:name]` list
    pub fn extend_from_list(&mut self, list: &str) {
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            self.push(Endpoint::parse_pair(entry));
        }
    }

    /// Entries dropped for lacking an address
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn into_endpoints(self) -> Vec<Endpoint> {
        self.endpoints
    }
}
