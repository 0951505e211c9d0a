//! Splits waveform payloads into per-channel byte sequences.

use crate::devices::Channel;
use crate::error::{Error, Result};

use super::block::{decode_block, decode_block_checked};
use super::{ChannelMap, Payload};

/// Byte-level demultiplexing of a raw waveform response.
///
/// `expected_points` is the per-channel sample count when the family validates blocks against
/// it; `sample_width` is the size of one sample in bytes.
pub fn demultiplex(channels: &[Channel], payload: &Payload, expected_points: Option<usize>, sample_width: usize) -> Result<ChannelMap<Vec<u8>>> {
	match payload {
		Payload::Fused(raw) => {
			if channels.is_empty() {
				return Ok(ChannelMap::new());
			}
			if raw.is_empty() {
				return match expected_points {
					Some(n) if n > 0 => Err(Error::LengthMismatch{ declared: 0, expected: n * channels.len() * sample_width }),
					_ => Ok(deinterleave(channels, &[], sample_width)),
				};
			}
			let data = match expected_points {
				Some(n) => decode_block_checked(raw, n * channels.len(), sample_width)?,
				None    => decode_block(raw)?,
			};
			Ok(deinterleave(channels, data, sample_width))
		},
		Payload::PerChannel(raws) => {
			if raws.len() != channels.len() {
				return Err(Error::ChannelCountMismatch{ channels: channels.len(), payloads: raws.len() });
			}
			let mut ans = ChannelMap::new();
			for (&channel, raw) in channels.iter().zip(raws) {
				// An empty response is a channel with no samples, never a missing channel
				let data: &[u8] = match (raw.is_empty(), expected_points) {
					(true, Some(n)) if n > 0 => return Err(Error::LengthMismatch{ declared: 0, expected: n * sample_width }),
					(true, _)       => &[],
					(false, Some(n)) => decode_block_checked(raw, n, sample_width)?,
					(false, None)    => decode_block(raw)?,
				};
				ans.insert(channel, data.to_vec());
			}
			Ok(ans)
		},
	}
}

/// Channel `i` of `N` takes every N-th sample starting at sample `i`. A trailing partial group is dropped.
pub fn deinterleave(channels: &[Channel], data: &[u8], sample_width: usize) -> ChannelMap<Vec<u8>> {
	let mut ans = ChannelMap::new();
	let n = channels.len();
	if n == 0 || sample_width == 0 {
		return ans;
	}
	let group = n * sample_width;
	let groups = data.len() / group;

	for (i, &channel) in channels.iter().enumerate() {
		let mut samples: Vec<u8> = Vec::with_capacity(groups * sample_width);
		for g in data[..groups * group].chunks_exact(group) {
			samples.extend_from_slice(&g[i * sample_width..(i + 1) * sample_width]);
		}
		ans.insert(channel, samples);
	}
	ans
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::waveform::block::encode_block;

	const CHS: [Channel; 3] = [Channel::Ch3, Channel::Ch1, Channel::Ch2];

	#[test]
	fn strided_split_keeps_request_order_and_floor_length() {
		for len in 0..20usize {
			for n in 1..=CHS.len() {
				let data: Vec<u8> = (0..len as u8).collect();
				let out = deinterleave(&CHS[..n], &data, 1);
				let per = len / n;
				let mut rebuilt = vec![0u8; per * n];
				for (i, ch) in CHS[..n].iter().enumerate() {
					let samples = &out[ch];
					assert_eq!(samples.len(), per);
					for (k, s) in samples.iter().enumerate() {
						rebuilt[k * n + i] = *s;
					}
				}
				assert_eq!(&rebuilt[..], &data[..per * n]);
			}
		}
	}

	#[test]
	fn fused_payload_is_decoded_then_split() {
		let raw = encode_block(&[10, 20, 11, 21, 12]);
		let out = demultiplex(&[Channel::Ch1, Channel::Ch2], &Payload::Fused(raw), None, 1).unwrap();
		assert_eq!(out[&Channel::Ch1], vec![10, 11]);
		assert_eq!(out[&Channel::Ch2], vec![20, 21]);
	}

	#[test]
	fn nothing_requested_is_empty() {
		assert!(demultiplex(&[], &Payload::Fused(encode_block(&[1, 2])), None, 1).unwrap().is_empty());
		let out = demultiplex(&[Channel::Ch1], &Payload::Fused(vec![]), None, 1).unwrap();
		assert_eq!(out[&Channel::Ch1], Vec::<u8>::new());
		assert!(demultiplex(&[], &Payload::PerChannel(vec![]), None, 1).unwrap().is_empty());
	}

	#[test]
	fn per_channel_payloads_are_assigned_in_order() {
		let payload = Payload::PerChannel(vec![encode_block(&[1, 2, 3]), encode_block(&[4, 5, 6])]);
		let out = demultiplex(&[Channel::Ch4, Channel::Ch2], &payload, Some(3), 1).unwrap();
		assert_eq!(out[&Channel::Ch4], vec![1, 2, 3]);
		assert_eq!(out[&Channel::Ch2], vec![4, 5, 6]);
	}

	#[test]
	fn empty_per_channel_block_is_never_dropped() {
		let payload = Payload::PerChannel(vec![vec![], encode_block(&[1, 2, 3, 4])]);
		match demultiplex(&[Channel::Ch1, Channel::Ch2], &payload, Some(4), 1) {
			Err(Error::LengthMismatch{ declared: 0, expected: 4 }) => {},
			other => panic!("unexpected {:?}", other),
		}

		let out = demultiplex(&[Channel::Ch1, Channel::Ch2], &payload, None, 1).unwrap();
		assert_eq!(out[&Channel::Ch1], Vec::<u8>::new());
		assert_eq!(out[&Channel::Ch2], vec![1, 2, 3, 4]);
	}

	#[test]
	fn empty_fused_payload_fails_when_points_are_expected() {
		assert!(matches!(
			demultiplex(&[Channel::Ch1, Channel::Ch2], &Payload::Fused(vec![]), Some(3), 1),
			Err(Error::LengthMismatch{ declared: 0, expected: 6 })
		));
		let out = demultiplex(&[Channel::Ch1, Channel::Ch2], &Payload::Fused(vec![]), None, 1).unwrap();
		assert_eq!(out.len(), 2);
		assert!(out.values().all(|w| w.is_empty()));
	}

	#[test]
	fn per_channel_count_must_match() {
		let payload = Payload::PerChannel(vec![encode_block(&[1])]);
		match demultiplex(&[Channel::Ch1, Channel::Ch2], &payload, None, 1) {
			Err(Error::ChannelCountMismatch{ channels: 2, payloads: 1 }) => {},
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn per_channel_point_count_is_checked() {
		let payload = Payload::PerChannel(vec![encode_block(&[1, 2])]);
		assert!(matches!(
			demultiplex(&[Channel::Ch1], &payload, Some(3), 1),
			Err(Error::LengthMismatch{ declared: 2, expected: 3 })
		));
	}
}
