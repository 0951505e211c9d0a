// RTM series (mid-range). Waveforms are read one channel at a time with CHAN<n>:DATA? as unsigned bytes.

use super::{DeviceProfile, Family, Layout, TriggerCoupling};
use crate::waveform::SampleFormat;

pub static STATUS_TABLE: [(u32, &str); 5] = [
	(1 << 3, "Waiting for trigger."),
	(1 << 2, "Autosetting."),
	(1 << 1, "Self-testing."),
	(1 << 0, "Aligning."),
	(0,      "Status OK."),
];

pub static PROFILE: DeviceProfile = DeviceProfile {
	family: Family::Rtm,
	channel_names: [None, Some("CH1"), Some("CH2"), Some("CH3"), Some("CH4"), Some("EXT")],
	trigger_prefix: "TRIG:A",
	data_format: "UINT,8",
	sample_format: SampleFormat::Unsigned8,
	status_modulus: 1 << 4,
	status_table: &STATUS_TABLE,
	layout: Layout::PerChannel,
	waveform_query,
	post_connect: &[],
	trigger_coupling_path: ":EDGE:COUPLing",
	trigger_couplings: &[TriggerCoupling::Dc, TriggerCoupling::Ac, TriggerCoupling::Hf],
	acquires_on_stamp: false,
	validates_point_count: true,
	fast_export: false,
};

pub fn waveform_query(channel_number: usize) -> String { format!("CHAN{}:DATA?", channel_number) }

// The history counter sits at 0 or 1 while the scope is acquiring; not fully reliable
pub const STATE_QUERY: &str = "CHAN:HIST:CURR?";
