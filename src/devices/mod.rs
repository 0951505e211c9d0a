// Both supported families are Rohde & Schwarz scopes. Everything that differs between them and
// can be expressed as data lives in a DeviceProfile; the few behavioral differences are matched on Family.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::iter::FromIterator;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::waveform::SampleFormat;

pub mod rtm;
pub mod rto;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
	/// Mid-range RTM series, one waveform query per channel.
	Rtm,
	/// High-end RTO series with multichannel fast export.
	Rto,
}

impl Family {
	pub fn profile(self) -> &'static DeviceProfile {
		match self {
			Family::Rtm => &rtm::PROFILE,
			Family::Rto => &rto::PROFILE,
		}
	}
}

impl fmt::Display for Family {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Family::Rtm => write!(f, "RTM"),
			Family::Rto => write!(f, "RTO"),
		}
	}
}

/// Channel identity. The discriminant is the number used in `CHAN<n>` commands and the
/// index into a profile's name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
	None = 0,
	Ch1 = 1,
	Ch2 = 2,
	Ch3 = 3,
	Ch4 = 4,
	External = 5,
}

pub const CHANNEL_COUNT: usize = 6;

impl Channel {
	pub const ANALOG: [Channel; 4] = [Channel::Ch1, Channel::Ch2, Channel::Ch3, Channel::Ch4];

	pub fn index(self) -> usize { self as usize }

	pub fn from_index(index: usize) -> Option<Channel> {
		match index {
			0 => Some(Channel::None),
			1 => Some(Channel::Ch1),
			2 => Some(Channel::Ch2),
			3 => Some(Channel::Ch3),
			4 => Some(Channel::Ch4),
			5 => Some(Channel::External),
			_ => None,
		}
	}
}

impl fmt::Display for Channel {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Channel::None     => write!(f, "no channel"),
			Channel::External => write!(f, "external"),
			ch                => write!(f, "channel {}", ch.index()),
		}
	}
}

/// Ordered, duplicate-free channel request. Order is the interleaving order of a fused payload.
///
/// Built from a list (first occurrence wins) or from a `Channel -> enabled` map (enabled
/// channels, sorted). `Channel::None` is never part of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channels(Vec<Channel>);

impl Channels {
	pub fn as_slice(&self) -> &[Channel] { &self.0 }
}

impl Deref for Channels {
	type Target = [Channel];
	fn deref(&self) -> &[Channel] { &self.0 }
}

impl FromIterator<Channel> for Channels {
	fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
		let mut ans: Vec<Channel> = vec![];
		for ch in iter {
			if ch != Channel::None && !ans.contains(&ch) {
				ans.push(ch);
			}
		}
		Channels(ans)
	}
}

impl From<Channel> for Channels {
	fn from(ch: Channel) -> Self { Some(ch).into_iter().collect() }
}

impl From<&[Channel]> for Channels {
	fn from(chs: &[Channel]) -> Self { chs.iter().copied().collect() }
}

impl<const N: usize> From<[Channel; N]> for Channels {
	fn from(chs: [Channel; N]) -> Self { chs.iter().copied().collect() }
}

impl<const N: usize> From<&[Channel; N]> for Channels {
	fn from(chs: &[Channel; N]) -> Self { chs.iter().copied().collect() }
}

impl From<Vec<Channel>> for Channels {
	fn from(chs: Vec<Channel>) -> Self { chs.into_iter().collect() }
}

impl From<&Vec<Channel>> for Channels {
	fn from(chs: &Vec<Channel>) -> Self { chs.iter().copied().collect() }
}

impl From<&Channels> for Channels {
	fn from(chs: &Channels) -> Self { chs.clone() }
}

impl From<&BTreeMap<Channel, bool>> for Channels {
	fn from(map: &BTreeMap<Channel, bool>) -> Self {
		map.iter().filter(|(_, on)| **on).map(|(&ch, _)| ch).collect()
	}
}

impl From<BTreeMap<Channel, bool>> for Channels {
	fn from(map: BTreeMap<Channel, bool>) -> Self { Channels::from(&map) }
}

impl From<&HashMap<Channel, bool>> for Channels {
	fn from(map: &HashMap<Channel, bool>) -> Self {
		let mut enabled: Vec<Channel> = map.iter().filter(|(_, on)| **on).map(|(&ch, _)| ch).collect();
		enabled.sort();
		enabled.into_iter().collect()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coupling { Dc, Ac, DcLimit, AcLimit }

impl Coupling {
	const TOKENS: [(Coupling, &'static str); 4] = [
		(Coupling::Dc, "DC"), (Coupling::Ac, "AC"), (Coupling::DcLimit, "DCL"), (Coupling::AcLimit, "ACL"),
	];

	pub fn token(self) -> &'static str { lookup_token(&Self::TOKENS, self) }
	pub fn from_token(s: &str) -> Option<Self> { lookup_value(&Self::TOKENS, s) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerSlope { Negative, Positive, Either }

impl TriggerSlope {
	const TOKENS: [(TriggerSlope, &'static str); 3] = [
		(TriggerSlope::Negative, "NEG"), (TriggerSlope::Positive, "POS"), (TriggerSlope::Either, "EITH"),
	];

	pub fn token(self) -> &'static str { lookup_token(&Self::TOKENS, self) }
	pub fn from_token(s: &str) -> Option<Self> { lookup_value(&Self::TOKENS, s) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerCoupling { Dc, Ac, Hf, DcLimit, AcLimit }

impl TriggerCoupling {
	const TOKENS: [(TriggerCoupling, &'static str); 5] = [
		(TriggerCoupling::Dc, "DC"), (TriggerCoupling::Ac, "AC"), (TriggerCoupling::Hf, "HF"),
		(TriggerCoupling::DcLimit, "DCL"), (TriggerCoupling::AcLimit, "ACL"),
	];

	pub fn token(self) -> &'static str { lookup_token(&Self::TOKENS, self) }
	pub fn from_token(s: &str) -> Option<Self> { lookup_value(&Self::TOKENS, s) }
}

fn lookup_token<T: PartialEq + Copy>(table: &[(T, &'static str)], value: T) -> &'static str {
	table.iter().find(|(v, _)| *v == value).map(|(_, tok)| *tok).unwrap_or("")
}

fn lookup_value<T: Copy>(table: &[(T, &'static str)], token: &str) -> Option<T> {
	let token = token.trim();
	table.iter().find(|(_, tok)| tok.eq_ignore_ascii_case(token)).map(|(v, _)| *v)
}

/// How a multi-channel waveform request comes back from the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
	/// One block, samples interleaved round-robin in request order.
	Fused,
	/// One block per channel, one query each.
	PerChannel,
}

#[derive(Debug)]
pub struct DeviceProfile {
	pub family: Family,
	/// Indexed by `Channel::index()`; slot 0 is the unset sentinel.
	pub channel_names: [Option<&'static str>; CHANNEL_COUNT],
	pub trigger_prefix: &'static str,
	/// Argument to `FORMAT:DATA`, sent once after connecting.
	pub data_format: &'static str,
	pub sample_format: SampleFormat,
	pub status_modulus: u32,
	pub status_table: &'static [(u32, &'static str)],
	pub layout: Layout,
	/// Waveform query for a channel number (the first requested channel for a fused read).
	pub waveform_query: fn(usize) -> String,
	/// Extra setup written after `*CLS` and before the data format on a fresh connection.
	pub post_connect: &'static [&'static str],
	pub trigger_coupling_path: &'static str,
	pub trigger_couplings: &'static [TriggerCoupling],
	/// Whether a stamped acquisition starts a single run first.
	pub acquires_on_stamp: bool,
	/// Whether blocks are checked against `ACQuire:POINts?`. The check assumes the per-channel
	/// readout (`CHAN<n>:DATA:POINts`) is left at the full record; a reduced readout fails with
	/// `LengthMismatch` rather than passing unnoticed.
	pub validates_point_count: bool,
	pub fast_export: bool,
}

impl DeviceProfile {
	pub fn channel_name(&self, ch: Channel) -> Option<&'static str> {
		self.channel_names[ch.index()]
	}

	pub fn channel_from_name(&self, name: &str) -> Option<Channel> {
		let name = name.trim();
		self.channel_names.iter()
			.position(|n| n.map_or(false, |n| n.eq_ignore_ascii_case(name)))
			.and_then(Channel::from_index)
	}

	pub fn status_message(&self, code: u32) -> String {
		let code = code % self.status_modulus;
		self.status_table.iter()
			.find(|(c, _)| *c == code)
			.map(|(_, msg)| (*msg).to_owned())
			.unwrap_or_else(|| format!("Unknown code: {}", code))
	}

	pub fn data_format_command(&self) -> String { format!("FORMAT:DATA {}", self.data_format) }

	pub fn supports_trigger_coupling(&self, coupling: TriggerCoupling) -> bool {
		self.trigger_couplings.contains(&coupling)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn map_selection_is_sorted_and_enabled_only() {
		let mut map = HashMap::new();
		map.insert(Channel::Ch3, true);
		map.insert(Channel::Ch1, true);
		map.insert(Channel::Ch2, false);
		assert_eq!(Channels::from(&map).as_slice(), &[Channel::Ch1, Channel::Ch3]);
	}

	#[test]
	fn list_selection_keeps_order_and_drops_duplicates() {
		let chs = Channels::from([Channel::Ch2, Channel::None, Channel::Ch1, Channel::Ch2]);
		assert_eq!(chs.as_slice(), &[Channel::Ch2, Channel::Ch1]);
	}

	#[test]
	fn name_tokens_are_index_aligned() {
		for family in [Family::Rtm, Family::Rto].iter() {
			let profile = family.profile();
			assert_eq!(profile.channel_name(Channel::None), None);
			for ch in Channel::ANALOG.iter().chain(Some(&Channel::External)) {
				let name = profile.channel_name(*ch).unwrap();
				assert_eq!(profile.channel_from_name(name), Some(*ch));
			}
		}
		assert_eq!(Family::Rtm.profile().channel_from_name("CH2\n"), Some(Channel::Ch2));
		assert_eq!(Family::Rto.profile().channel_from_name("CH2"), None);
	}

	#[test]
	fn status_codes_use_the_family_modulus() {
		let rtm = Family::Rtm.profile();
		assert_eq!(rtm.status_message(8), "Waiting for trigger.");
		assert_eq!(rtm.status_message(16 + 8), "Waiting for trigger.");
		assert_eq!(rtm.status_message(0), "Status OK.");
		assert_eq!(rtm.status_message(3), "Unknown code: 3");

		let rto = Family::Rto.profile();
		assert_eq!(rto.status_message(24), "Waiting for trigger.");
		assert_eq!(rto.status_message(16), "Measuring.");
		assert_eq!(rto.status_message(32 + 1), "Calibrating.");
	}

	#[test]
	fn tokens_parse_case_insensitively() {
		assert_eq!(Coupling::from_token("dcl\n"), Some(Coupling::DcLimit));
		assert_eq!(TriggerSlope::from_token("EITH"), Some(TriggerSlope::Either));
		assert_eq!(TriggerCoupling::Hf.token(), "HF");
		assert_eq!(Coupling::from_token("GND"), None);
	}
}
