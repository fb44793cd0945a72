//! TCAP message events as handed over by the decoding layer, and the
//! correlation result handed back.

use crate::srt::SubdissectorRef;
use crate::types::{Endpoint, FrameNumber, SessionId, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Framing role of a TCAP message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Begin,
    Continue,
    End,
    Abort,
    /// Any ANSI package (query, response, conversation, abort)
    AnsiRequestOrResponse,
}

/// ITU message type tags
#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub enum TcapTag {
    Begin = 0x62,
    End = 0x64,
    Continue = 0x65,
    Abort = 0x67,
}

/// ANSI package type tags (0xE1..=0xE6 plus 0xF6 abort)
const ANSI_PACKAGE_TAGS: [u8; 7] = [0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xF6];

impl MessageKind {
    /// Map the outer message tag to a framing role
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            t if t == TcapTag::Begin as u8 => Some(Self::Begin),
            t if t == TcapTag::Continue as u8 => Some(Self::Continue),
            t if t == TcapTag::End as u8 => Some(Self::End),
            t if t == TcapTag::Abort as u8 => Some(Self::Abort),
            t if ANSI_PACKAGE_TAGS.contains(&t) => Some(Self::AnsiRequestOrResponse),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Continue => "continue",
            Self::End => "end",
            Self::Abort => "abort",
            Self::AnsiRequestOrResponse => "ansi",
        }
    }
}

/// One dissected TCAP message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcapEvent {
    pub message_kind: MessageKind,
    pub frame_number: FrameNumber,
    pub timestamp: DateTime<Utc>,
    /// Sender of this message
    pub local_endpoint: Endpoint,
    /// Receiver of this message
    pub peer_endpoint: Endpoint,
    #[serde(default)]
    pub source_tid: Option<TransactionId>,
    #[serde(default)]
    pub destination_tid: Option<TransactionId>,
    #[serde(default)]
    pub application_context_id: Option<String>,
}

impl TcapEvent {
    fn new(
        message_kind: MessageKind,
        frame_number: FrameNumber,
        timestamp: DateTime<Utc>,
        local_endpoint: Endpoint,
        peer_endpoint: Endpoint,
    ) -> Self {
        Self {
            message_kind,
            frame_number,
            timestamp,
            local_endpoint,
            peer_endpoint,
            source_tid: None,
            destination_tid: None,
            application_context_id: None,
        }
    }

    /// TC-BEGIN from `from` carrying its originating tid
    pub fn begin(frame: FrameNumber, at: DateTime<Utc>, from: Endpoint, to: Endpoint, otid: u32) -> Self {
        let mut event = Self::new(MessageKind::Begin, frame, at, from, to);
        event.source_tid = Some(TransactionId(otid));
        event
    }

    /// TC-CONTINUE from `from` (own tid `otid`) to `to` (its tid `dtid`)
    pub fn continue_(
        frame: FrameNumber,
        at: DateTime<Utc>,
        from: Endpoint,
        otid: u32,
        to: Endpoint,
        dtid: u32,
    ) -> Self {
        let mut event = Self::new(MessageKind::Continue, frame, at, from, to);
        event.source_tid = Some(TransactionId(otid));
        event.destination_tid = Some(TransactionId(dtid));
        event
    }

    /// TC-END addressed to the receiver's tid
    pub fn end(frame: FrameNumber, at: DateTime<Utc>, from: Endpoint, to: Endpoint, dtid: u32) -> Self {
        let mut event = Self::new(MessageKind::End, frame, at, from, to);
        event.destination_tid = Some(TransactionId(dtid));
        event
    }

    /// TC-U-ABORT / TC-P-ABORT addressed to the receiver's tid
    pub fn abort(frame: FrameNumber, at: DateTime<Utc>, from: Endpoint, to: Endpoint, dtid: u32) -> Self {
        let mut event = Self::new(MessageKind::Abort, frame, at, from, to);
        event.destination_tid = Some(TransactionId(dtid));
        event
    }

    /// ANSI package carrying a single transaction id
    pub fn ansi(frame: FrameNumber, at: DateTime<Utc>, from: Endpoint, to: Endpoint, tid: u32) -> Self {
        let mut event = Self::new(MessageKind::AnsiRequestOrResponse, frame, at, from, to);
        event.source_tid = Some(TransactionId(tid));
        event
    }

    pub fn with_application_context(mut self, ac: &str) -> Self {
        self.application_context_id = Some(ac.to_string());
        self
    }

    /// Originating tid, zero when absent
    pub fn otid(&self) -> TransactionId {
        self.source_tid.unwrap_or_default()
    }

    /// Destination tid, zero when absent
    pub fn dtid(&self) -> TransactionId {
        self.destination_tid.unwrap_or_default()
    }

    /// The single tid of an ANSI package
    pub fn ansi_tid(&self) -> TransactionId {
        self.source_tid.or(self.destination_tid).unwrap_or_default()
    }
}

/// Correlation result for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub session_id: SessionId,
    pub first_frame: FrameNumber,
    pub last_frame: Option<FrameNumber>,
    /// Service response time, set on the frame that closed the dialogue
    pub elapsed: Option<Duration>,
    pub is_duplicate: bool,
    pub application_context_id: Option<String>,
    pub subdissector: Option<SubdissectorRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_tag() {
        assert_eq!(MessageKind::from_tag(0x62), Some(MessageKind::Begin));
        assert_eq!(MessageKind::from_tag(0x65), Some(MessageKind::Continue));
        assert_eq!(MessageKind::from_tag(0x64), Some(MessageKind::End));
        assert_eq!(MessageKind::from_tag(0x67), Some(MessageKind::Abort));
        assert_eq!(MessageKind::from_tag(0xE2), Some(MessageKind::AnsiRequestOrResponse));
        assert_eq!(MessageKind::from_tag(0xF6), Some(MessageKind::AnsiRequestOrResponse));
        assert_eq!(MessageKind::from_tag(0x30), None);
    }

    #[test]
    fn test_event_from_json() {
        let line = r#"{
            "message_kind": "continue",
            "frame_number": 7,
            "timestamp": "2024-01-01T00:00:01Z",
            "local_endpoint": {"point_code": 2},
            "peer_endpoint": {"point_code": 1},
            "source_tid": 7,
            "destination_tid": 5
        }"#;
        let event: TcapEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.message_kind, MessageKind::Continue);
        assert_eq!(event.otid(), TransactionId(7));
        assert_eq!(event.dtid(), TransactionId(5));
        assert!(event.application_context_id.is_none());
    }

    #[test]
    fn test_absent_tids_read_as_zero() {
        let event = TcapEvent::end(
            1,
            Utc::now(),
            Endpoint::point_code(1),
            Endpoint::point_code(2),
            9,
        );
        assert_eq!(event.otid(), TransactionId(0));
        assert_eq!(event.ansi_tid(), TransactionId(9));
    }
}
