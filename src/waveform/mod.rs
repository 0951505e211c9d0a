use std::collections::BTreeMap;

use crate::devices::Channel;

pub mod block;
pub mod convert;
pub mod demux;

pub use block::{decode_block, decode_block_checked, encode_block};
pub use convert::{to_physical, Calibration, RawWaveform, Sample, SampleFormat};
pub use demux::demultiplex;

/// Per-channel results of one acquisition.
pub type ChannelMap<T> = BTreeMap<Channel, T>;

/// Undecoded response(s) to a waveform request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	/// One block carrying every requested channel, interleaved.
	Fused(Vec<u8>),
	/// One block per requested channel, in request order.
	PerChannel(Vec<Vec<u8>>),
}

/// What the scope returned for a waveform request, plus what it takes to decode it later.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAcquisition {
	pub payload: Payload,
	pub sample_format: SampleFormat,
	/// Per-channel record length when the family validates against it.
	pub expected_points: Option<usize>,
}

impl RawAcquisition {
	pub fn demultiplex(&self, channels: &[Channel]) -> crate::Result<ChannelMap<RawWaveform>> {
		let bytes = demultiplex(channels, &self.payload, self.expected_points, self.sample_format.width())?;
		Ok(bytes.into_iter().map(|(ch, b)| (ch, self.sample_format.decode(&b))).collect())
	}
}
