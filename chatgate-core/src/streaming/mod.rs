//! Stream reformatting
//!
//! Turns a primary backend's raw byte stream into the gateway's
//! newline-delimited JSON protocol:
//! - [`framing`] splits bytes into decode units
//! - [`reformat`] runs the pull loop as its own task, feeding a bounded channel

pub mod framing;
pub mod reformat;

pub use framing::FrameDecoder;
pub use reformat::{spawn_reformatter, ReformatSummary, StreamEnd};

use thiserror::Error;

/// Why a decode unit produced no record
///
/// Never escalated: a skipped unit is logged at debug level and the loop
/// moves on to the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeSkip {
    #[error("empty unit")]
    Empty,

    #[error("unit is not valid UTF-8")]
    NotUtf8,

    #[error("unit is not a JSON object: {0}")]
    InvalidJson(String),

    #[error("unit has no text fragment")]
    MissingText,
}

/// Pulls the text fragment out of one decode unit
pub type FragmentExtractor = fn(&str) -> Result<String, DecodeSkip>;
