// Instrument settings and one-shot commands. None of these are cached; every getter queries the scope.

use serde::{Deserialize, Serialize};

use crate::devices::{rtm, rto, Channel, Coupling, Family, TriggerCoupling, TriggerSlope};
use crate::error::{Error, Result};
use crate::transport::Opener;

use super::{on_off, parse_f64, parse_i64, ScopeConnection};

/// Snapshot of one channel's vertical settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
	pub offset: f64,
	pub position: f64,
	pub range: f64,
	pub scale: f64,
	pub coupling: Coupling,
	pub enabled: bool,
}

pub const WRITE_OK: &str = "Write command OK.";

// Vertical settings only exist for the four analog inputs
fn analog_index(channel: Channel) -> Result<usize> {
	if Channel::ANALOG.contains(&channel) {
		Ok(channel.index())
	} else {
		Err(Error::InvalidChannel(channel))
	}
}

fn source_index(channel: Channel) -> Result<usize> {
	match channel {
		Channel::None => Err(Error::InvalidChannel(channel)),
		ch            => Ok(ch.index()),
	}
}

impl<O: Opener> ScopeConnection<O> {

	// Commands

	pub fn issue_reset(&self)   -> Result<()> { self.write("*RST") }
	pub fn issue_autoset(&self) -> Result<()> { self.write("AUT")  }
	pub fn issue_run(&self)     -> Result<()> { self.write("RUN")  }
	pub fn issue_stop(&self)    -> Result<()> { self.write("STOP") }
	pub fn clear_buffer(&self)  -> Result<()> { self.write(super::CLEAR_STATUS) }

	/// Queries if the command ends with `?`, otherwise writes it.
	pub fn issue_command(&self, command: &str) -> Result<String> {
		let command = command.trim();
		if command.ends_with('?') {
			self.ask(command)
		} else {
			self.write(command)?;
			Ok(WRITE_OK.to_owned())
		}
	}

	/// Number of acquisitions averaged by a single run.
	pub fn set_acquisition_count(&self, count: u32) -> Result<()> {
		self.write(format!("ACQ:NSIN:COUNT {}", count))
	}

	// General accessors

	pub fn get_identifier(&self) -> Result<String> { self.ask("*IDN?") }

	pub fn get_waveform_mode(&self, channel: Channel) -> Result<String> {
		self.ask(format!("CHAN{}:TYPE?", analog_index(channel)?))
	}

	pub fn get_acquire_mode(&self) -> Result<String> { self.ask("ACQUIRE:MODE?") }

	/// Whether the scope is acquiring.
	pub fn get_state(&self) -> Result<bool> {
		match self.profile.family {
			Family::Rtm => Ok(parse_i64(&self.ask(rtm::STATE_QUERY)?)? <= 1),
			Family::Rto => Err(self.unsupported("acquisition state")),
		}
	}

	pub fn get_status(&self) -> Result<String> {
		let code = parse_i64(&self.ask("STATus:OPER:COND?")?)?;
		Ok(self.profile.status_message(code.rem_euclid(self.profile.status_modulus as i64) as u32))
	}

	// Time base

	/// Seconds per division.
	pub fn get_time_scale(&self) -> Result<f64> { parse_f64(&self.ask("TIMebase:SCALe?")?) }

	pub fn set_time_scale(&self, scale: f64) -> Result<()> {
		self.write(format!("TIMebase:SCALe {}", scale))
	}

	/// Seconds across all ten divisions.
	pub fn get_time_range(&self) -> Result<f64> { parse_f64(&self.ask("TIMebase:RANGe?")?) }

	pub fn set_time_range(&self, range: f64) -> Result<()> {
		self.write(format!("TIMebase:RANGe {}", range))
	}

	/// Seconds, relative to the screen center.
	pub fn get_time_position(&self) -> Result<f64> {
		match self.profile.family {
			Family::Rtm => parse_f64(&self.ask("TIMebase:POSition?")?),
			Family::Rto => {
				let position = parse_f64(&self.ask("TIMebase:HORizontal:POSition?")?)?;
				let reference = parse_f64(&self.ask("TIMebase:REFerence?")?)?;
				if reference == 50.0 {
					return Ok(position);
				}
				let range = self.get_time_range()?;
				Ok(rto::centered_time_position(position, reference, range))
			},
		}
	}

	pub fn set_time_position(&self, position: f64) -> Result<()> {
		match self.profile.family {
			Family::Rtm => self.write(format!("TIMebase:POSition {}", position)),
			Family::Rto => {
				self.write("TIMebase:REFerence 50")?;
				self.write(format!("TIMebase:HORizontal:POSition {}", position))
			},
		}
	}

	/// Points per channel in one record.
	pub fn get_record_length(&self) -> Result<u64> {
		let points = parse_i64(&self.ask("ACQuire:POINts?")?)?;
		if points < 0 {
			return Err(Error::response("record length", &points.to_string()));
		}
		Ok(points as u64)
	}

	pub fn set_record_length(&self, length: u64) -> Result<()> {
		match self.profile.family {
			Family::Rtm => Err(self.unsupported("record length control")),
			Family::Rto => {
				self.write(rto::RECORD_LENGTH_AUTO)?;
				self.write(format!("ACQuire:POINts {}", length))
			},
		}
	}

	// Channel settings

	/// Volts.
	pub fn get_channel_offset(&self, channel: Channel) -> Result<f64> {
		parse_f64(&self.ask(format!("CHAN{}:OFFSet?", analog_index(channel)?))?)
	}

	pub fn set_channel_offset(&self, channel: Channel, offset: f64) -> Result<()> {
		self.write(format!("CHAN{}:OFFSet {}", analog_index(channel)?, offset))
	}

	/// Divisions.
	pub fn get_channel_position(&self, channel: Channel) -> Result<f64> {
		parse_f64(&self.ask(format!("CHAN{}:POSition?", analog_index(channel)?))?)
	}

	pub fn set_channel_position(&self, channel: Channel, position: f64) -> Result<()> {
		self.write(format!("CHAN{}:POSition {}", analog_index(channel)?, position))
	}

	/// Volts across the full vertical scale.
	pub fn get_channel_range(&self, channel: Channel) -> Result<f64> {
		parse_f64(&self.ask(format!("CHAN{}:RANGe?", analog_index(channel)?))?)
	}

	pub fn set_channel_range(&self, channel: Channel, range: f64) -> Result<()> {
		self.write(format!("CHAN{}:RANGe {}", analog_index(channel)?, range))
	}

	/// Volts per division.
	pub fn get_channel_scale(&self, channel: Channel) -> Result<f64> {
		parse_f64(&self.ask(format!("CHAN{}:SCALe?", analog_index(channel)?))?)
	}

	pub fn set_channel_scale(&self, channel: Channel, scale: f64) -> Result<()> {
		self.write(format!("CHAN{}:SCALe {}", analog_index(channel)?, scale))
	}

	/// On the RTO the channel's export state is updated to match, so fused reads include exactly
	/// the enabled channels.
	pub fn get_channel_enabled(&self, channel: Channel) -> Result<bool> {
		let enabled = parse_i64(&self.ask(format!("CHAN{}:STATe?", analog_index(channel)?))?)? != 0;
		if self.profile.fast_export {
			self.set_channel_export(channel, enabled)?;
		}
		Ok(enabled)
	}

	pub fn set_channel_enabled(&self, channel: Channel, enabled: bool) -> Result<()> {
		self.write(format!("CHAN{}:STATe {}", analog_index(channel)?, on_off(enabled)))
	}

	pub fn get_channel_coupling(&self, channel: Channel) -> Result<Coupling> {
		let res = self.ask(format!("CHAN{}:COUPLing?", analog_index(channel)?))?;
		Coupling::from_token(&res).ok_or_else(|| Error::response("channel coupling", &res))
	}

	pub fn set_channel_coupling(&self, channel: Channel, coupling: Coupling) -> Result<()> {
		self.write(format!("CHAN{}:COUPLing {}", analog_index(channel)?, coupling.token()))
	}

	pub fn get_channel_settings(&self, channel: Channel) -> Result<ChannelSettings> {
		Ok(ChannelSettings {
			offset:   self.get_channel_offset(channel)?,
			position: self.get_channel_position(channel)?,
			range:    self.get_channel_range(channel)?,
			scale:    self.get_channel_scale(channel)?,
			coupling: self.get_channel_coupling(channel)?,
			enabled:  self.get_channel_enabled(channel)?,
		})
	}

	// Fast export (RTO)

	pub fn set_channel_export(&self, channel: Channel, export: bool) -> Result<()> {
		if !self.profile.fast_export {
			return Err(self.unsupported("channel export"));
		}
		self.write(format!("CHANnel{}:EXPortstate {}", analog_index(channel)?, on_off(export)))
	}

	pub fn set_fast_readout(&self, enabled: bool) -> Result<()> {
		if !self.profile.fast_export {
			return Err(self.unsupported("fast readout"));
		}
		self.write(format!("EXP:WAV:FAST {}", on_off(enabled)))
	}

	/// Whether the display keeps updating during export.
	pub fn set_display(&self, enabled: bool) -> Result<()> {
		if !self.profile.fast_export {
			return Err(self.unsupported("export display control"));
		}
		self.write(format!("EXP:WAV:DISP {}", !enabled as u8))
	}

	// Trigger

	pub fn get_trigger_source(&self) -> Result<Channel> {
		let res = self.ask(format!("{}:SOUR?", self.profile.trigger_prefix))?;
		self.profile.channel_from_name(&res).ok_or_else(|| Error::response("trigger source", &res))
	}

	pub fn set_trigger_source(&self, channel: Channel) -> Result<()> {
		let name = self.profile.channel_name(channel).ok_or(Error::InvalidChannel(channel))?;
		self.write(format!("{}:SOUR {}", self.profile.trigger_prefix, name))
	}

	/// Volts.
	pub fn get_trigger_level(&self, channel: Channel) -> Result<f64> {
		parse_f64(&self.ask(format!("{}:LEV{}?", self.profile.trigger_prefix, source_index(channel)?))?)
	}

	pub fn set_trigger_level(&self, channel: Channel, level: f64) -> Result<()> {
		self.write(format!("{}:LEV{} {}", self.profile.trigger_prefix, source_index(channel)?, level))
	}

	pub fn get_trigger_slope(&self) -> Result<TriggerSlope> {
		let res = self.ask(format!("{}:EDGE:SLOPE?", self.profile.trigger_prefix))?;
		TriggerSlope::from_token(&res).ok_or_else(|| Error::response("trigger slope", &res))
	}

	pub fn set_trigger_slope(&self, slope: TriggerSlope) -> Result<()> {
		self.write(format!("{}:EDGE:SLOPE {}", self.profile.trigger_prefix, slope.token()))
	}

	pub fn get_trigger_coupling(&self) -> Result<TriggerCoupling> {
		let res = self.ask(format!("{}{}?", self.profile.trigger_prefix, self.profile.trigger_coupling_path))?;
		TriggerCoupling::from_token(&res)
			.filter(|c| self.profile.supports_trigger_coupling(*c))
			.ok_or_else(|| Error::response("trigger coupling", &res))
	}

	pub fn set_trigger_coupling(&self, coupling: TriggerCoupling) -> Result<()> {
		if !self.profile.supports_trigger_coupling(coupling) {
			return Err(self.unsupported("this trigger coupling"));
		}
		self.write(format!("{}{} {}", self.profile.trigger_prefix, self.profile.trigger_coupling_path, coupling.token()))
	}

}
