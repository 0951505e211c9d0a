mod common;

use std::sync::Arc;
use std::thread;

use rohdescope::{Channel, Error, Family, FirmwareVersion};

use common::{connected, scope, text, Event};

#[test]
fn connect_is_idempotent() {
	let (scope, instrument) = scope(Family::Rtm, |_, _| None);
	assert!(!scope.is_connected());

	scope.connect().unwrap();
	scope.connect().unwrap();

	assert!(scope.is_connected());
	assert_eq!(scope.firmware_version(), Some(FirmwareVersion(vec![5, 502])));
	let events = instrument.events();
	assert_eq!(events.iter().filter(|e| **e == Event::Open).count(), 1);
	assert_eq!(instrument.count("*IDN?"), 1);
	assert_eq!(instrument.count("*CLS"), 1);
}

#[test]
fn fresh_rtm_connection_is_configured() {
	let (scope, instrument) = scope(Family::Rtm, |_, _| None);
	scope.connect().unwrap();
	assert_eq!(instrument.writes(), vec!["*IDN?", "*CLS", "FORMAT:DATA UINT,8"]);
}

#[test]
fn fresh_rto_connection_enables_fast_export() {
	let (scope, instrument) = scope(Family::Rto, |_, _| None);
	scope.connect().unwrap();
	assert_eq!(instrument.writes(), vec![
		"*IDN?",
		"*CLS",
		"EXPort:WAVeform:INCXvalues OFF",
		"EXPort:WAVeform:MULTichannel ON",
		"EXP:WAV:FAST ON",
		"FORMAT:DATA INT,8",
	]);
}

#[test]
fn exchanges_need_a_connection() {
	let (scope, instrument) = scope(Family::Rto, |_, _| text("1"));
	assert!(matches!(scope.ask("*ESR?"), Err(Error::NotConnected)));
	assert!(matches!(scope.write("RUN"), Err(Error::NotConnected)));
	assert!(instrument.events().is_empty());
}

#[test]
fn disconnect_clears_state_and_is_repeatable() {
	let (scope, instrument) = connected(Family::Rtm, |_, _| None);
	scope.disconnect().unwrap();
	scope.disconnect().unwrap();

	assert!(!scope.is_connected());
	assert_eq!(scope.firmware_version(), None);
	assert_eq!(instrument.events(), vec![Event::Close]);
	assert!(matches!(scope.get_identifier(), Err(Error::NotConnected)));

	// Reconnecting is a fresh connection again
	scope.connect().unwrap();
	assert_eq!(instrument.count("*IDN?"), 1);
	assert_eq!(instrument.count("*CLS"), 1);
}

#[test]
fn compound_commands_are_joined() {
	let (scope, instrument) = connected(Family::Rto, |_, _| text("1"));
	assert_eq!(scope.ask(["RUNS", "*OPC?"]).unwrap(), "1");
	scope.write(vec!["STOP", "*CLS"]).unwrap();
	assert_eq!(instrument.writes(), vec!["RUNS;*OPC?", "STOP;*CLS"]);
}

#[test]
fn concurrent_queries_never_interleave() {
	let (scope, instrument) = connected(Family::Rtm, |cmd, _| {
		if cmd.starts_with("CHAN") { text("0.5") } else { None }
	});
	let scope = Arc::new(scope);

	let handles: Vec<_> = Channel::ANALOG.iter().map(|&ch| {
		let scope = scope.clone();
		thread::spawn(move || {
			for _ in 0..25 {
				assert_eq!(scope.get_channel_scale(ch).unwrap(), 0.5);
				scope.set_channel_scale(ch, 0.5).unwrap();
			}
		})
	}).collect();
	for h in handles {
		h.join().unwrap();
	}

	let events = instrument.events();
	assert_eq!(events.len(), 4 * 25 * 3);
	for (i, event) in events.iter().enumerate() {
		if let Event::Write(cmd) = event {
			if cmd.ends_with('?') {
				assert_eq!(events.get(i + 1), Some(&Event::Read(cmd.clone())), "at {}", i);
			}
		}
	}
}

#[test]
fn racing_connects_configure_before_any_other_traffic() {
	let (scope, instrument) = scope(Family::Rtm, |cmd, _| match cmd {
		"ACQUIRE:MODE?" => text("SAMP"),
		_ => None,
	});
	let scope = Arc::new(scope);

	let handles: Vec<_> = (0..4).map(|_| {
		let scope = scope.clone();
		thread::spawn(move || {
			scope.connect().unwrap();
			assert_eq!(scope.get_acquire_mode().unwrap(), "SAMP");
		})
	}).collect();
	for h in handles {
		h.join().unwrap();
	}

	let writes = instrument.writes();
	assert_eq!(&writes[..3], &["*IDN?", "*CLS", "FORMAT:DATA UINT,8"]);
	assert_eq!(&writes[3..], &["ACQUIRE:MODE?"; 4]);
	assert_eq!(instrument.events().iter().filter(|e| **e == Event::Open).count(), 1);
}

#[test]
fn transport_errors_leave_the_link_usable() {
	let (scope, _) = connected(Family::Rto, |cmd, _| match cmd {
		"ACQUIRE:MODE?" => text("RTIM"),
		_ => None,
	});
	assert!(matches!(scope.get_time_scale(), Err(Error::Transport(_))));
	assert_eq!(scope.get_acquire_mode().unwrap(), "RTIM");
}
