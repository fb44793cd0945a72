//! # TCAP SRT
//!
//! Transaction correlation and service response time measurement for
//! captured TCAP traffic:
//!
//! - **ITU** dialogues framed by Begin / Continue / End / Abort
//! - **ANSI** transactions paired as request / response
//!
//! The decoding layer turns every TCAP message into a [`TcapEvent`]; the
//! engine tells which dialogue it belongs to and, on the closing message,
//! how long the dialogue took.
//!
//! ## Example
//! ```rust,ignore
//! use tcap_srt::{CorrelationEngine, Endpoint, SrtConfig, TcapEvent};
//!
//! let mut engine = CorrelationEngine::new(SrtConfig::default());
//! let hlr = Endpoint::point_code(1001);
//! let msc = Endpoint::point_code(2002);
//!
//! engine.process(&TcapEvent::begin(1, t0, msc.clone(), hlr.clone(), 0x11));
//! let end = engine.process(&TcapEvent::end(2, t1, hlr, msc, 0x11)).unwrap();
//! println!("session {} answered in {:?}", end.session_id, end.elapsed);
//! ```

pub mod config;
pub mod errors;
pub mod srt;
pub mod tcap;
pub mod types;

// Re-exports
pub use config::SrtConfig;
pub use errors::{Result, SrtError};
pub use types::*;

pub use srt::{
    CaptureRegistry, CorrelationEngine, DialogueState, SrtSnapshot,
    SubdissectorRef, SubdissectorRegistry, SubdissectorResolver, TransactionContext,
};
pub use tcap::{Correlation, MessageKind, TcapEvent};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
