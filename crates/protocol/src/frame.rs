//! Framed line encoding
//!
//! Each message is `<byte count><SP><payload>`: the ASCII decimal length of
//! the payload, one space, then the UTF-8 JSON serialization of the record.
//! The format carries no trailing delimiter of its own; callers append `\n`
//! between consecutive messages when coalescing a batch into one stream
//! write.
//!
//! This is the framing used by syslog-over-TCP drains (and HTTP drains that
//! accept the same body), so a receiver can read the count, then exactly
//! that many bytes, and recover the payload without scanning for
//! delimiters inside JSON.

use crate::error::ProtocolError;
use crate::record::EventRecord;

/// Encode a record as one framed message
pub fn encode_framed(record: &EventRecord) -> Result<Vec<u8>, ProtocolError> {
    let mut out = Vec::with_capacity(256);
    encode_framed_into(record, &mut out)?;
    Ok(out)
}

/// Encode a record as one framed message, appending to `buf`
///
/// Returns the number of bytes written. Lets batch writers reuse one body
/// buffer across records instead of allocating per message.
pub fn encode_framed_into(
    record: &EventRecord,
    buf: &mut Vec<u8>,
) -> Result<usize, ProtocolError> {
    let payload = serde_json::to_vec(record)?;

    let start = buf.len();
    buf.extend_from_slice(payload.len().to_string().as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(&payload);
    Ok(buf.len() - start)
}

/// Decode one framed message from the front of `input`
///
/// Returns the payload bytes and whatever follows the message, so stream
/// readers can iterate. Round-trips with [`encode_framed`]: the returned
/// payload is exactly the JSON serialization of the original record.
pub fn decode_framed(input: &[u8]) -> Result<(&[u8], &[u8]), ProtocolError> {
    let space = input
        .iter()
        .position(|&b| b == b' ')
        .ok_or(ProtocolError::MissingLengthPrefix)?;

    let prefix = &input[..space];
    let len: usize = std::str::from_utf8(prefix)
        .ok()
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ProtocolError::invalid_prefix(String::from_utf8_lossy(prefix)))?;

    let body = &input[space + 1..];
    if body.len() < len {
        return Err(ProtocolError::truncated(len, body.len()));
    }

    Ok((&body[..len], &body[len..]))
}
