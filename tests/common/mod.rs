// Scripted in-memory instrument shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use rohdescope::{Family, LinkConfig, Opener, ScopeConnection, Transport};

pub const RTM_IDN: &str = "Rohde&Schwarz,RTM2054,1317.6002k54/102345,05.502\n";
pub const RTO_IDN: &str = "Rohde&Schwarz,RTO,1316.1000k14/200153,4.70.1.0\n";

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	Open,
	Write(String),
	Read(String),
	Close,
}

/// Answers a query given the command and how many times it was answered before.
pub type Responder = Box<dyn Fn(&str, usize) -> Option<Vec<u8>> + Send + Sync>;

pub struct Instrument {
	idn: &'static str,
	responder: Responder,
	events: Mutex<Vec<Event>>,
	answered: Mutex<HashMap<String, usize>>,
}

impl Instrument {
	pub fn events(&self) -> Vec<Event> { self.events.lock().unwrap().clone() }

	pub fn writes(&self) -> Vec<String> {
		self.events().into_iter().filter_map(|e| match e {
			Event::Write(cmd) => Some(cmd),
			_ => None,
		}).collect()
	}

	pub fn count(&self, wanted: &str) -> usize {
		self.writes().iter().filter(|cmd| cmd.as_str() == wanted).count()
	}

	pub fn clear(&self) { self.events.lock().unwrap().clear() }

	fn record(&self, event: Event) { self.events.lock().unwrap().push(event) }

	fn answer(&self, command: &str) -> io::Result<Vec<u8>> {
		let n = {
			let mut answered = self.answered.lock().unwrap();
			let n = answered.entry(command.to_owned()).or_insert(0);
			*n += 1;
			*n - 1
		};
		if command == "*IDN?" {
			return Ok(self.idn.as_bytes().to_vec());
		}
		(self.responder)(command, n)
			.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("no scripted answer for {}", command)))
	}
}

pub struct MockTransport {
	instrument: Arc<Instrument>,
	last_write: Option<String>,
}

impl Transport for MockTransport {
	fn write(&mut self, data: &[u8]) -> io::Result<()> {
		let command = String::from_utf8(data.to_vec()).unwrap();
		self.instrument.record(Event::Write(command.clone()));
		self.last_write = Some(command);
		Ok(())
	}

	fn read(&mut self) -> io::Result<Vec<u8>> {
		let command = self.last_write.take()
			.ok_or_else(|| io::Error::new(io::ErrorKind::Other, "read without a query"))?;
		self.instrument.record(Event::Read(command.clone()));
		self.instrument.answer(&command)
	}

	fn close(&mut self) -> io::Result<()> {
		self.instrument.record(Event::Close);
		Ok(())
	}
}

pub struct MockOpener(pub Arc<Instrument>);

impl Opener for MockOpener {
	type Transport = MockTransport;

	fn open(&self, _host: &str, _config: &LinkConfig) -> io::Result<MockTransport> {
		self.0.record(Event::Open);
		Ok(MockTransport{ instrument: self.0.clone(), last_write: None })
	}
}

pub fn init_logging() {
	let _ = env_logger::builder().is_test(true).try_init();
}

pub fn scope_with<F>(family: Family, config: LinkConfig, responder: F) -> (ScopeConnection<MockOpener>, Arc<Instrument>)
	where F: Fn(&str, usize) -> Option<Vec<u8>> + Send + Sync + 'static
{
	init_logging();
	let idn = match family {
		Family::Rtm => RTM_IDN,
		Family::Rto => RTO_IDN,
	};
	let instrument = Arc::new(Instrument{
		idn,
		responder: Box::new(responder),
		events: Mutex::new(vec![]),
		answered: Mutex::new(HashMap::new()),
	});
	let scope = ScopeConnection::with_opener("scope.test", family, config, MockOpener(instrument.clone()));
	(scope, instrument)
}

pub fn scope<F>(family: Family, responder: F) -> (ScopeConnection<MockOpener>, Arc<Instrument>)
	where F: Fn(&str, usize) -> Option<Vec<u8>> + Send + Sync + 'static
{
	scope_with(family, LinkConfig::default().with_poll_interval_ms(1), responder)
}

/// Connects, then forgets the handshake traffic.
pub fn connected<F>(family: Family, responder: F) -> (ScopeConnection<MockOpener>, Arc<Instrument>)
	where F: Fn(&str, usize) -> Option<Vec<u8>> + Send + Sync + 'static
{
	let (scope, instrument) = scope(family, responder);
	scope.connect().unwrap();
	instrument.clear();
	(scope, instrument)
}

pub fn text(s: &str) -> Option<Vec<u8>> { Some(format!("{}\n", s).into_bytes()) }
