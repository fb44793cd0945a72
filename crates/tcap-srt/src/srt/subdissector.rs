//! Resolution of the application decoder that owns a dialogue's payload

use crate::types::Endpoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Name of the decoder registered by the host (e.g. `"gsm_map"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubdissectorRef(pub String);

impl SubdissectorRef {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubdissectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host-side lookup tables
pub trait SubdissectorResolver: Send + Sync {
    /// Decoder for an application context name
    fn by_application_context(&self, ac: &str) -> Option<SubdissectorRef>;

    /// Decoder bound to an endpoint (typically a subsystem)
    fn by_endpoint(&self, endpoint: &Endpoint) -> Option<SubdissectorRef>;
}

/// In-memory resolver
#[derive(Debug, Clone, Default)]
pub struct SubdissectorRegistry {
    by_context: HashMap<String, SubdissectorRef>,
    by_endpoint: HashMap<Endpoint, SubdissectorRef>,
}

impl SubdissectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_application_context(&mut self, ac: &str, subdissector: SubdissectorRef) {
        self.by_context.insert(ac.to_string(), subdissector);
    }

    pub fn register_endpoint(&mut self, endpoint: Endpoint, subdissector: SubdissectorRef) {
        self.by_endpoint.insert(endpoint, subdissector);
    }

    pub fn is_empty(&self) -> bool {
        self.by_context.is_empty() && self.by_endpoint.is_empty()
    }
}

impl SubdissectorResolver for SubdissectorRegistry {
    fn by_application_context(&self, ac: &str) -> Option<SubdissectorRef> {
        self.by_context.get(ac).cloned()
    }

    fn by_endpoint(&self, endpoint: &Endpoint) -> Option<SubdissectorRef> {
        self.by_endpoint.get(endpoint).cloned()
    }
}

/// Application context first, then the receiver, then the sender
pub(crate) fn resolve(
    resolver: &dyn SubdissectorResolver,
    ac: Option<&str>,
    receiver: &Endpoint,
    sender: &Endpoint,
) -> Option<SubdissectorRef> {
    ac.and_then(|ac| resolver.by_application_context(ac))
        .or_else(|| resolver.by_endpoint(receiver))
        .or_else(|| resolver.by_endpoint(sender))
}
