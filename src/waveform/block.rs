//! Definite-length binary blocks: `#`, one digit N, N ASCII digits giving the payload
//! length L, then L raw bytes. Anything after the payload (usually a newline) is ignored.

use std::str;

use crate::error::{Error, Result};

pub const BLOCK_MARKER: u8 = b'#';

fn framing(msg: String) -> Error { Error::Framing(msg) }

/// Returns the payload of a binary block.
pub fn decode_block(raw: &[u8]) -> Result<&[u8]> {
	if raw.len() < 2 {
		return Err(framing(format!("block is only {} bytes long", raw.len())));
	}
	if raw[0] != BLOCK_MARKER {
		return Err(framing(format!("block starts with {:#04x} instead of '#'", raw[0])));
	}

	let digits = (raw[1] as char).to_digit(10)
		.ok_or_else(|| framing(format!("length-of-length {:?} is not a digit", raw[1] as char)))? as usize;

	let field = raw.get(2..2 + digits)
		.ok_or_else(|| framing(format!("block ends inside its {}-digit length field", digits)))?;
	let declared: usize = str::from_utf8(field).ok()
		.filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
		.and_then(|s| s.parse().ok())
		.ok_or_else(|| framing(format!("length field {:?} is not a decimal number", String::from_utf8_lossy(field))))?;

	let body = &raw[2 + digits..];
	if body.len() < declared {
		return Err(framing(format!("block declares {} bytes but only {} follow", declared, body.len())));
	}
	Ok(&body[..declared])
}

/// Like `decode_block`, but also requires the declared length to match an independently known
/// number of samples of `sample_width` bytes each.
pub fn decode_block_checked(raw: &[u8], expected_samples: usize, sample_width: usize) -> Result<&[u8]> {
	let payload = decode_block(raw)?;
	let expected = expected_samples * sample_width;
	if payload.len() != expected {
		return Err(Error::LengthMismatch{ declared: payload.len(), expected });
	}
	Ok(payload)
}

/// Frames `payload` as a binary block.
pub fn encode_block(payload: &[u8]) -> Vec<u8> {
	let len = payload.len().to_string();
	let mut ans = Vec::with_capacity(2 + len.len() + payload.len());
	ans.push(BLOCK_MARKER);
	ans.push(b'0' + len.len() as u8);
	ans.extend_from_slice(len.as_bytes());
	ans.extend_from_slice(payload);
	ans
}
