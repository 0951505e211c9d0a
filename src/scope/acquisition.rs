use std::time::{Instant, SystemTime};

use crate::devices::{Channel, Channels, Layout};
use crate::error::{Error, Result};
use crate::transport::Opener;
use crate::waveform::{Calibration, ChannelMap, Payload, RawAcquisition, RawWaveform};

use super::sync::{self, BusyWait, Settled, StatusSource};
use super::{parse_i64, ScopeConnection};

/// Busy-wait status source backed by the connection. Each poll takes the link on its own, so
/// other threads can talk to the scope between polls.
struct EventStatus<'a, O: Opener>(&'a ScopeConnection<O>);

impl<'a, O: Opener> StatusSource for EventStatus<'a, O> {
	fn request_completion(&mut self) -> Result<()> {
		self.0.write(sync::OPERATION_COMPLETE)
	}

	fn is_complete(&mut self) -> Result<bool> {
		let esr = parse_i64(&self.0.ask(sync::EVENT_STATUS_QUERY)?)?;
		Ok(sync::operation_complete(esr))
	}
}

impl<O: Opener> ScopeConnection<O> {

	/// Reads the waveform response(s) for `channels` without decoding them.
	pub fn get_waveform_payload<C: Into<Channels>>(&self, channels: C) -> Result<RawAcquisition> {
		let channels: Channels = channels.into();
		let profile = self.profile;

		let expected_points = if profile.validates_point_count && !channels.is_empty() {
			Some(self.get_record_length()? as usize)
		} else {
			None
		};

		let payload = match profile.layout {
			Layout::Fused => match channels.first() {
				Some(first) => Payload::Fused(self.ask_raw((profile.waveform_query)(first.index()))?),
				None        => Payload::Fused(vec![]),
			},
			Layout::PerChannel => {
				let mut blocks: Vec<Vec<u8>> = Vec::with_capacity(channels.len());
				for ch in channels.iter() {
					blocks.push(self.ask_raw((profile.waveform_query)(ch.index()))?);
				}
				Payload::PerChannel(blocks)
			},
		};

		Ok(RawAcquisition{ payload, sample_format: profile.sample_format, expected_points })
	}

	/// Raw samples per channel.
	pub fn get_waveform_data<C: Into<Channels>>(&self, channels: C) -> Result<ChannelMap<RawWaveform>> {
		let channels: Channels = channels.into();
		let raw = self.get_waveform_payload(&channels)?;
		raw.demultiplex(&channels)
	}

	/// Samples per channel in divisions, or in volts when `scales` (and optionally `positions`) are given.
	pub fn get_waveforms<C: Into<Channels>>(&self, channels: C, scales: Option<&ChannelMap<f64>>, positions: Option<&ChannelMap<f64>>) -> Result<ChannelMap<Vec<f64>>> {
		let data = self.get_waveform_data(channels)?;
		convert_waveforms(&data, scales, positions)
	}

	/// Timestamp and undecoded waveforms. Families that acquire on stamp run a single acquisition
	/// and wait for it first.
	pub fn stamp_acquisition<C: Into<Channels>>(&self, channels: C, busy: bool) -> Result<(SystemTime, RawAcquisition)> {
		let channels: Channels = channels.into();
		if !channels.is_empty() && self.profile.acquires_on_stamp {
			if busy {
				self.write(sync::SINGLE_RUN)?;
			}
			self.wait(busy)?;
		}
		let stamp = SystemTime::now();
		Ok((stamp, self.get_waveform_payload(&channels)?))
	}

	/// Blocks until pending operations complete.
	///
	/// `busy == false` starts a single acquisition and blocks on `*OPC?`, bounded only by the
	/// transport timeout. `busy == true` polls `*ESR?` until the instrument timeout.
	pub fn wait(&self, busy: bool) -> Result<Settled> {
		if !busy {
			let start = Instant::now();
			self.ask(sync::HARDWARE_WAIT)?;
			return Ok(Settled{ polls: 0, elapsed: start.elapsed() });
		}

		let mut wait = BusyWait::new(self.config.instrument_timeout(), self.config.poll_interval());
		wait.run(&mut EventStatus(self))
	}

}

/// Converts raw samples to divisions, or to volts given per-channel scales and optional positions.
pub fn convert_waveforms(data: &ChannelMap<RawWaveform>, scales: Option<&ChannelMap<f64>>, positions: Option<&ChannelMap<f64>>) -> Result<ChannelMap<Vec<f64>>> {
	let mut ans = ChannelMap::new();
	for (&channel, raw) in data {
		let calibration = calibration_for(channel, scales, positions)?;
		ans.insert(channel, raw.to_physical(calibration));
	}
	Ok(ans)
}

fn calibration_for(channel: Channel, scales: Option<&ChannelMap<f64>>, positions: Option<&ChannelMap<f64>>) -> Result<Option<Calibration>> {
	let scales = match (scales, positions) {
		(None, None)    => return Ok(None),
		(None, Some(_)) => return Err(Error::Calibration("positions given without scales".to_owned())),
		(Some(s), _)    => s,
	};
	let scale = *scales.get(&channel)
		.ok_or_else(|| Error::Calibration(format!("no scale for {}", channel)))?;
	let position = match positions {
		Some(p) => *p.get(&channel).ok_or_else(|| Error::Calibration(format!("no position for {}", channel)))?,
		None    => 0.0,
	};
	Ok(Some(Calibration{ scale, position }))
}
