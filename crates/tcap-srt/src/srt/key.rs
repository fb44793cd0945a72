//! Index keys
//!
//! Endpoints are reduced to a 64-bit hash before they enter a key, so keys
//! are small `Copy` values. Continue and ANSI keys store their two sides in a
//! canonical order, which makes equality and hashing symmetric: a message is
//! matched whichever direction it travels.

use crate::types::{Endpoint, TransactionId};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash an endpoint identity
pub fn endpoint_hash(endpoint: &Endpoint) -> u64 {
    let mut hasher = DefaultHasher::new();
    endpoint.hash(&mut hasher);
    hasher.finish()
}

/// Begin index key: originator endpoint and its tid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeginKey {
    endpoint: u64,
    tid: TransactionId,
}

/// End index key: terminator's destination endpoint and tid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndKey {
    endpoint: u64,
    tid: TransactionId,
}

/// Continue index key over both sides of a dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContinueKey {
    low: (u64, TransactionId),
    high: (u64, TransactionId),
}

/// ANSI index key over both endpoints and the package tid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnsiKey {
    low: u64,
    high: u64,
    tid: TransactionId,
}

pub fn begin_key(endpoint: &Endpoint, tid: TransactionId) -> BeginKey {
    BeginKey {
        endpoint: endpoint_hash(endpoint),
        tid,
    }
}

pub fn end_key(endpoint: &Endpoint, tid: TransactionId) -> EndKey {
    EndKey {
        endpoint: endpoint_hash(endpoint),
        tid,
    }
}

pub fn continue_key(
    endpoint_a: &Endpoint,
    tid_a: TransactionId,
    endpoint_b: &Endpoint,
    tid_b: TransactionId,
) -> ContinueKey {
    let a = (endpoint_hash(endpoint_a), tid_a);
    let b = (endpoint_hash(endpoint_b), tid_b);
    if a <= b {
        ContinueKey { low: a, high: b }
    } else {
        ContinueKey { low: b, high: a }
    }
}

pub fn ansi_key(endpoint_a: &Endpoint, endpoint_b: &Endpoint, tid: TransactionId) -> AnsiKey {
    let a = endpoint_hash(endpoint_a);
    let b = endpoint_hash(endpoint_b);
    AnsiKey {
        low: a.min(b),
        high: a.max(b),
        tid,
    }
}

/// Stable numeric digest of a key, for diagnostics
pub trait KeyDigest: Hash {
    fn digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl KeyDigest for BeginKey {}
impl KeyDigest for EndKey {}
impl KeyDigest for ContinueKey {}
impl KeyDigest for AnsiKey {}

#[cfg(test)]
mod tests {
    use super::*;

    fn pc(v: u32) -> Endpoint {
        Endpoint::point_code(v)
    }

    #[test]
    fn test_continue_key_is_symmetric() {
        let forward = continue_key(&pc(1), TransactionId(5), &pc(2), TransactionId(7));
        let backward = continue_key(&pc(2), TransactionId(7), &pc(1), TransactionId(5));
        assert_eq!(forward, backward);
        assert_eq!(forward.digest(), backward.digest());
    }

    #[test]
    fn test_continue_key_keeps_tid_pairing() {
        // Swapping only the tids is a different dialogue
        let a = continue_key(&pc(1), TransactionId(5), &pc(2), TransactionId(7));
        let b = continue_key(&pc(1), TransactionId(7), &pc(2), TransactionId(5));
        assert_ne!(a, b);
    }

    #[test]
    fn test_ansi_key_commutes_over_endpoints_only() {
        let a = ansi_key(&pc(1), &pc(2), TransactionId(9));
        assert_eq!(a, ansi_key(&pc(2), &pc(1), TransactionId(9)));
        assert_ne!(a, ansi_key(&pc(1), &pc(2), TransactionId(10)));
    }

    #[test]
    fn test_begin_and_end_keys_depend_on_endpoint() {
        assert_eq!(begin_key(&pc(1), TransactionId(5)), begin_key(&pc(1), TransactionId(5)));
        assert_ne!(begin_key(&pc(1), TransactionId(5)), begin_key(&pc(2), TransactionId(5)));
        assert_ne!(end_key(&pc(1), TransactionId(5)), end_key(&pc(1), TransactionId(6)));
    }

    #[test]
    fn test_endpoint_kinds_hash_apart() {
        assert_ne!(
            endpoint_hash(&Endpoint::Opaque("1".into())),
            endpoint_hash(&Endpoint::GlobalTitle("1".into()))
        );
    }
}
