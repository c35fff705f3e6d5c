//! Cache data exchanged with the host cache store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::cache::keys::Namespace;

/// Flat attribute map persisted opaquely by the store.
pub type Attributes = Map<String, Value>;

/// Namespace → keys to evict.
pub type Evictions = BTreeMap<String, Vec<String>>;

/// One cached record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheData {
    pub id: String,
    pub attributes: Attributes,
}

impl CacheData {
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }
}

/// Whether an agent owns a data type outright or merely contributes to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Authority {
    Authoritative,
    Informative,
}

/// A data type an agent declares it provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDataType {
    pub namespace: Namespace,
    pub authority: Authority,
}

impl AgentDataType {
    pub fn authoritative(namespace: Namespace) -> Self {
        Self {
            namespace,
            authority: Authority::Authoritative,
        }
    }
}

/// Output of one caching pass, handed to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheResult {
    /// Namespace → fresh records.
    pub cache_results: BTreeMap<String, Vec<CacheData>>,
    /// Namespace → keys no longer valid.
    pub evictions: Evictions,
}

impl CacheResult {
    pub fn records(&self, namespace: Namespace) -> &[CacheData] {
        self.cache_results
            .get(namespace.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn evicted(&self, namespace: Namespace) -> &[String] {
        self.evictions
            .get(namespace.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
