// RTO series (high-end). Multichannel fast export returns every export-enabled channel
// interleaved in one signed-byte block, requested through the first channel.

use super::{DeviceProfile, Family, Layout, TriggerCoupling};
use crate::waveform::SampleFormat;

pub static STATUS_TABLE: [(u32, &str); 7] = [
	(1 << 4, "Measuring."),
	(1 << 3, "Waiting for trigger."),
	(24,     "Waiting for trigger."),
	(1 << 2, "Autosetting."),
	(1 << 1, "Calibrating."),
	(1 << 0, "Calibrating."),
	(0,      "Status OK."),
];

pub static PROFILE: DeviceProfile = DeviceProfile {
	family: Family::Rto,
	channel_names: [None, Some("CHAN1"), Some("CHAN2"), Some("CHAN3"), Some("CHAN4"), Some("EXT")],
	trigger_prefix: "TRIG",
	data_format: "INT,8",
	sample_format: SampleFormat::Signed8,
	status_modulus: 1 << 5,
	status_table: &STATUS_TABLE,
	layout: Layout::Fused,
	waveform_query,
	post_connect: &[
		// Samples only, no time column
		"EXPort:WAVeform:INCXvalues OFF",
		"EXPort:WAVeform:MULTichannel ON",
		"EXP:WAV:FAST ON",
	],
	trigger_coupling_path: ":ANEDge:COUPLing",
	trigger_couplings: &[TriggerCoupling::Dc, TriggerCoupling::Ac, TriggerCoupling::DcLimit, TriggerCoupling::AcLimit],
	acquires_on_stamp: true,
	validates_point_count: false,
	fast_export: true,
};

pub fn waveform_query(first_channel_number: usize) -> String { format!("CHAN{}:WAV1:DATA:VAL?", first_channel_number) }

pub const RECORD_LENGTH_AUTO: &str = "ACQuire:POINts:AUTO RECL";

/// Horizontal position relative to the screen center, given the raw position, the reference
/// point in percent of the screen and the time range.
pub fn centered_time_position(position: f64, reference_percent: f64, range: f64) -> f64 {
	let shift = 0.5 - reference_percent / 100.0;
	position + shift * range
}
