//! Decode-unit framing for the primary byte stream

use super::DecodeSkip;
use crate::config::FramingMode;

/// Characters around a unit that belong to the JSON array wrapping the stream
fn is_array_framing(c: char) -> bool {
    c.is_whitespace() || c == '[' || c == ']' || c == ','
}

/// Splits raw bytes into decode units
#[derive(Debug)]
pub enum FrameDecoder {
    /// Every transport read is one unit; nothing is carried between reads
    Chunk,
    /// Server-sent events; bytes are buffered until a full line is available
    Sse { buffer: Vec<u8> },
}

impl FrameDecoder {
    /// Create a decoder for the given framing mode
    pub fn new(mode: FramingMode) -> Self {
        match mode {
            FramingMode::Chunk => FrameDecoder::Chunk,
            FramingMode::Sse => FrameDecoder::Sse { buffer: Vec::new() },
        }
    }

    /// Feed one transport read, returning the units it completes
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<String, DecodeSkip>> {
        match self {
            FrameDecoder::Chunk => vec![chunk_unit(bytes)],
            FrameDecoder::Sse { buffer } => {
                buffer.extend_from_slice(bytes);
                let mut units = Vec::new();
                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    if let Some(unit) = sse_unit(&line) {
                        units.push(unit);
                    }
                }
                units
            }
        }
    }

    /// Flush whatever is left once the source has ended
    pub fn finish(&mut self) -> Vec<Result<String, DecodeSkip>> {
        match self {
            FrameDecoder::Chunk => Vec::new(),
            FrameDecoder::Sse { buffer } => {
                let rest = std::mem::take(buffer);
                sse_unit(&rest).into_iter().collect()
            }
        }
    }
}

fn chunk_unit(bytes: &[u8]) -> Result<String, DecodeSkip> {
    let text = String::from_utf8_lossy(bytes);
    let unit = text.trim_matches(is_array_framing);
    if unit.is_empty() {
        Err(DecodeSkip::Empty)
    } else {
        Ok(unit.to_string())
    }
}

/// Decode one SSE line; `None` for lines that carry no payload
fn sse_unit(line: &[u8]) -> Option<Result<String, DecodeSkip>> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim_end_matches(['\r', '\n']),
        Err(_) => return Some(Err(DecodeSkip::NotUtf8)),
    };

    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload == "[DONE]" {
        return None;
    }
    if payload.trim().is_empty() {
        return Some(Err(DecodeSkip::Empty));
    }
    Some(Ok(payload.to_string()))
}
