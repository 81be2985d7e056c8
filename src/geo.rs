//! Geolocation lookup used by the statistics report.
//!
//! Lookups never influence the aggregation. The bundled backend is a YAML
//! table of networks matched by longest prefix:
//!
//! ```yaml
//! - network: 10.0.0.0/8
//!   country: France
//!   continent: EU
//!   subdivisions: [Bretagne]
//! - network: 41.0.0.0/8
//!   continent: AF
//! ```

use anyhow::{Context, Result};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Location labels known for an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoRecord {
    pub country: Option<String>,
    pub continent: Option<String>,
    pub subdivisions: Vec<String>,
}

impl GeoRecord {
    /// Country name, or the continent code when the country is unknown.
    pub fn country_label(&self) -> Option<&str> {
        self.country.as_deref().or(self.continent.as_deref())
    }

    /// "country subdivision", only when both are known.
    pub fn subdivision_label(&self) -> Option<String> {
        match (&self.country, self.subdivisions.first()) {
            (Some(country), Some(subdivision)) => Some(format!("{} {}", country, subdivision)),
            _ => None,
        }
    }
}

/// Maps an address to its location labels.
#[cfg_attr(test, automock)]
pub trait GeoLookup {
    fn lookup(&self, addr: Ipv4Addr) -> Option<GeoRecord>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeoEntry {
    network: Ipv4Net,
    #[serde(flatten)]
    record: GeoRecord,
}

/// Geolocation table loaded from YAML.
#[derive(Debug, Clone, Default)]
pub struct GeoTable {
    // Most specific networks first
    entries: Vec<GeoEntry>,
}

impl GeoTable {
    /// Load a table from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read geolocation table: {:?}", path.as_ref()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse geolocation table: {:?}", path.as_ref()))
    }

    /// Parse a table from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut entries: Vec<GeoEntry> = serde_yaml::from_str(content)?;
        entries.sort_by(|a, b| b.network.prefix_len().cmp(&a.network.prefix_len()));
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GeoLookup for GeoTable {
    fn lookup(&self, addr: Ipv4Addr) -> Option<GeoRecord> {
        self.entries
            .iter()
            .find(|entry| entry.network.contains(&addr))
            .map(|entry| entry.record.clone())
    }
}
