//! Common types used across the SRT engine

use crate::errors::SrtError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capture sequence number of a frame
pub type FrameNumber = u32;

/// Dialogue identifier handed out by an engine, starting at 1
pub type SessionId = u32;

/// MTP3 point code, raw 14-bit ITU or 24-bit ANSI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointCode(pub u32);

impl From<u32> for PointCode {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identity of a signalling endpoint as seen by the lower layers.
///
/// The engine never looks inside; it only hashes and compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// MTP3 / M3UA point code
    PointCode(PointCode),
    /// SCCP global title digits
    GlobalTitle(String),
    /// Anything else the host can name (IP:port, SCCP address dump, ...)
    Opaque(String),
}

impl Endpoint {
    pub fn point_code(pc: u32) -> Self {
        Self::PointCode(PointCode(pc))
    }

    pub fn global_title(digits: &str) -> Self {
        Self::GlobalTitle(digits.to_string())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointCode(pc) => write!(f, "pc:{}", pc.0),
            Self::GlobalTitle(digits) => write!(f, "gt:{}", digits),
            Self::Opaque(name) => f.write_str(name),
        }
    }
}

impl From<PointCode> for Endpoint {
    fn from(pc: PointCode) -> Self {
        Self::PointCode(pc)
    }
}

/// TCAP transaction identifier (1 to 4 octets on the wire, big-endian)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u32);

impl TransactionId {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for TransactionId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl TryFrom<&[u8]> for TransactionId {
    type Error = SrtError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.is_empty() || bytes.len() > 4 {
            return Err(SrtError::InvalidEvent(format!(
                "transaction id must be 1-4 octets, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tid_from_bytes() {
        let tid = TransactionId::try_from(&[0x01, 0x02][..]).unwrap();
        assert_eq!(tid.value(), 0x0102);

        let tid = TransactionId::try_from(&1u32.to_be_bytes()[..]).unwrap();
        assert_eq!(tid, TransactionId(1));

        assert!(TransactionId::try_from(&[][..]).is_err());
        assert!(TransactionId::try_from(&[0u8; 5][..]).is_err());
    }

    #[test]
    fn test_endpoint_json_shape() {
        let ep: Endpoint = serde_json::from_str(r#"{"point_code": 1001}"#).unwrap();
        assert_eq!(ep, Endpoint::point_code(1001));
        assert_eq!(ep.to_string(), "pc:1001");

        let ep: Endpoint = serde_json::from_str(r#"{"global_title": "2348012345678"}"#).unwrap();
        assert_eq!(ep, Endpoint::global_title("2348012345678"));
    }
}
