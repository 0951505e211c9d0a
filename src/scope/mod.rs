//! Connection to one scope.
//!
//! Every exchange with the instrument runs while holding the link mutex, so a write and its
//! read are never split by another thread's traffic. Decoding and conversion happen after the
//! lock is released.

use std::fmt;
use std::str;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::LinkConfig;
use crate::devices::{DeviceProfile, Family};
use crate::error::{Error, Result};
use crate::transport::{Opener, Transport, Vxi11Opener};

pub mod acquisition;
pub mod settings;
pub mod sync;

pub use settings::ChannelSettings;

lazy_static! {
	static ref IDN_RE: Regex = Regex::new("^([^,]+),([^,]+),([^,]+),([^,\\s]+)").unwrap();
	static ref FW_RE: Regex  = Regex::new("^\\d+(\\.\\d+)*$").unwrap();
}

pub const COMMAND_SEPARATOR: &str = ";";
pub const CLEAR_STATUS: &str = "*CLS";

/// One command, or several to be sent as a single `;`-joined compound command.
pub trait IntoCommand {
	fn into_command(self) -> String;
}

impl IntoCommand for &str {
	fn into_command(self) -> String { self.to_owned() }
}

impl IntoCommand for String {
	fn into_command(self) -> String { self }
}

impl IntoCommand for &String {
	fn into_command(self) -> String { self.clone() }
}

impl<S: AsRef<str>> IntoCommand for &[S] {
	fn into_command(self) -> String {
		self.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join(COMMAND_SEPARATOR)
	}
}

impl<S: AsRef<str>> IntoCommand for Vec<S> {
	fn into_command(self) -> String { self.as_slice().into_command() }
}

impl<S: AsRef<str>, const N: usize> IntoCommand for [S; N] {
	fn into_command(self) -> String { (&self[..]).into_command() }
}

/// Firmware version from the identification string, e.g. `05.502` -> `[5, 502]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FirmwareVersion(pub Vec<u32>);

impl FirmwareVersion {
	/// Parses the fourth field of a `*IDN?` response.
	pub fn from_idn(idn: &str) -> Result<Self> {
		let caps = IDN_RE.captures(idn.trim()).ok_or_else(|| Error::response("identification", idn))?;
		let fw = caps.get(4).map(|m| m.as_str()).unwrap_or("");
		if !FW_RE.is_match(fw) {
			return Err(Error::response("firmware version", fw));
		}
		fw.split('.')
			.map(|part| part.parse::<u32>().map_err(|_| Error::response("firmware version", fw)))
			.collect::<Result<Vec<u32>>>()
			.map(FirmwareVersion)
	}
}

impl fmt::Display for FirmwareVersion {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
		write!(f, "{}", parts.join("."))
	}
}

struct Link<T> {
	transport: Option<T>,
	firmware: Option<FirmwareVersion>,
}

impl<T> Link<T> {
	fn is_connected(&self) -> bool { self.transport.is_some() && self.firmware.is_some() }
}

pub struct ScopeConnection<O: Opener = Vxi11Opener> {
	host: String,
	config: LinkConfig,
	profile: &'static DeviceProfile,
	opener: O,
	link: Mutex<Link<O::Transport>>,
}

impl ScopeConnection<Vxi11Opener> {

	/// A VXI-11 connection. Nothing is opened until `connect`.
	pub fn new(host: &str, family: Family, config: LinkConfig) -> Self {
		Self::with_opener(host, family, config, Vxi11Opener)
	}

}

impl<O: Opener> ScopeConnection<O> {

	pub fn with_opener(host: &str, family: Family, config: LinkConfig, opener: O) -> Self {
		Self {
			host: host.to_owned(),
			config,
			profile: family.profile(),
			opener,
			link: Mutex::new(Link{ transport: None, firmware: None }),
		}
	}

	pub fn host(&self) -> &str { &self.host }
	pub fn family(&self) -> Family { self.profile.family }
	pub fn profile(&self) -> &'static DeviceProfile { self.profile }
	pub fn config(&self) -> &LinkConfig { &self.config }

	// A panic in another thread mid-exchange leaves nothing half-updated in the link state
	fn lock(&self) -> MutexGuard<'_, Link<O::Transport>> {
		self.link.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Opens the transport and performs the identification handshake, reusing whatever
	/// already exists. Only a fresh connection is configured, and the link stays held until
	/// it is, so no other caller sees a connected but unconfigured scope.
	pub fn connect(&self) -> Result<()> {
		let mut guard = self.lock();
		let link = &mut *guard;

		if link.transport.is_none() {
			log::debug!("{}: opening link", self.host);
			link.transport = Some(self.opener.open(&self.host, &self.config)?);
		}

		if link.firmware.is_none() {
			let transport = link.transport.as_mut().ok_or(Error::NotConnected)?;
			let idn = decode_text(transport.ask(b"*IDN?")?)?;
			let firmware = FirmwareVersion::from_idn(&idn)?;
			log::debug!("{}: {} (firmware {})", self.host, idn, firmware);
			self.configure(transport)?;
			link.firmware = Some(firmware);
		}
		Ok(())
	}

	/// Closes the transport if there is one. Safe to call when already disconnected.
	pub fn disconnect(&self) -> Result<()> {
		let mut link = self.lock();
		let closed = match link.transport.take() {
			Some(mut transport) => {
				log::debug!("{}: closing link", self.host);
				transport.close()
			},
			None => Ok(()),
		};
		link.firmware = None;
		Ok(closed?)
	}

	pub fn is_connected(&self) -> bool { self.lock().is_connected() }

	pub fn firmware_version(&self) -> Option<FirmwareVersion> { self.lock().firmware.clone() }

	/// Runs one exchange on the transport with the link held.
	fn exchange<R, F>(&self, f: F) -> Result<R>
		where F: FnOnce(&mut O::Transport) -> std::io::Result<R>
	{
		let mut guard = self.lock();
		let link = &mut *guard;
		if !link.is_connected() {
			return Err(Error::NotConnected);
		}
		let transport = link.transport.as_mut().ok_or(Error::NotConnected)?;
		Ok(f(transport)?)
	}

	/// Sends a query and returns the raw response bytes.
	pub fn ask_raw<C: IntoCommand>(&self, commands: C) -> Result<Vec<u8>> {
		let command = commands.into_command();
		log::trace!("{} <- {}", self.host, command);
		self.exchange(|t| t.ask(command.as_bytes()))
	}

	/// Sends a query and returns the response as text without its line terminator.
	pub fn ask<C: IntoCommand>(&self, commands: C) -> Result<String> {
		decode_text(self.ask_raw(commands)?)
	}

	pub fn write<C: IntoCommand>(&self, commands: C) -> Result<()> {
		let command = commands.into_command();
		log::trace!("{} <- {}", self.host, command);
		self.exchange(|t| t.write(command.as_bytes()))
	}

	// Runs on the transport directly since the caller already holds the link
	fn configure(&self, transport: &mut O::Transport) -> Result<()> {
		log::debug!("{}: configuring {} scope", self.host, self.profile.family);
		let commands = Some(CLEAR_STATUS.to_owned()).into_iter()
			.chain(self.profile.post_connect.iter().map(|c| (*c).to_owned()))
			.chain(Some(self.profile.data_format_command()));
		for command in commands {
			log::trace!("{} <- {}", self.host, command);
			transport.write(command.as_bytes())?;
		}
		Ok(())
	}

	/// Selects the family's binary sample format for waveform queries.
	pub fn set_binary_readout(&self) -> Result<()> {
		self.write(self.profile.data_format_command())
	}

	pub(crate) fn unsupported(&self, operation: &'static str) -> Error {
		Error::Unsupported{ operation, family: self.profile.family }
	}

}

fn decode_text(raw: Vec<u8>) -> Result<String> {
	let text = String::from_utf8(raw).map_err(|e| Error::Response(format!("response is not UTF-8: {}", e)))?;
	Ok(text.trim_end_matches(|c: char| c == '\n' || c == '\r').to_owned())
}

pub(crate) fn parse_f64(raw: &str) -> Result<f64> {
	raw.trim().parse::<f64>().map_err(|_| Error::response("number", raw))
}

pub(crate) fn parse_i64(raw: &str) -> Result<i64> {
	let raw_trimmed = raw.trim();
	raw_trimmed.strip_prefix('+').unwrap_or(raw_trimmed)
		.parse::<i64>()
		.map_err(|_| Error::response("integer", raw))
}

pub(crate) fn on_off(enabled: bool) -> &'static str { if enabled { "ON" } else { "OFF" } }
