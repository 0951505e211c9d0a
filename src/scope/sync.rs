//! Waiting for an acquisition to finish.
//!
//! Hardware wait sends `RUNS;*OPC?` and lets the blocking query be the completion signal.
//! Busy wait sends `*OPC` and polls the event status register until its operation complete
//! bit is set or the instrument timeout runs out.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

pub const HARDWARE_WAIT: [&str; 2] = ["RUNS", "*OPC?"];
pub const SINGLE_RUN: &str = "RUNS";
pub const OPERATION_COMPLETE: &str = "*OPC";
pub const EVENT_STATUS_QUERY: &str = "*ESR?";

/// Operation complete is bit 0 of the event status register.
pub fn operation_complete(esr: i64) -> bool { esr % 2 != 0 }

/// Where the busy wait gets its completion signal from.
pub trait StatusSource {
	/// Asks the instrument to flag completion of everything pending.
	fn request_completion(&mut self) -> Result<()>;

	fn is_complete(&mut self) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitState {
	Idle,
	Triggered,
	Settled,
	TimedOut { elapsed: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settled {
	/// Status polls it took; zero for a hardware wait.
	pub polls: u32,
	pub elapsed: Duration,
}

pub struct BusyWait {
	timeout: Duration,
	poll_interval: Duration,
	state: WaitState,
}

impl BusyWait {

	pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
		Self{ timeout, poll_interval, state: WaitState::Idle }
	}

	pub fn state(&self) -> WaitState { self.state }

	pub fn run<S: StatusSource>(&mut self, source: &mut S) -> Result<Settled> {
		let start = Instant::now();
		let deadline = start + self.timeout;

		source.request_completion()?;
		self.state = WaitState::Triggered;

		let mut polls: u32 = 0;
		loop {
			polls += 1;
			if source.is_complete()? {
				self.state = WaitState::Settled;
				return Ok(Settled{ polls, elapsed: start.elapsed() });
			}

			let now = Instant::now();
			if now >= deadline {
				let elapsed = now - start;
				log::warn!("acquisition still running after {:?} ({} polls)", elapsed, polls);
				self.state = WaitState::TimedOut{ elapsed };
				return Err(Error::AcquisitionTimeout{ elapsed });
			}
			thread::sleep(self.poll_interval.min(deadline - now));
		}
	}

}

#[cfg(test)]
mod tests {
	use super::*;

	struct Countdown {
		requested: bool,
		polls: u32,
		pending: Option<u32>,
	}

	impl StatusSource for Countdown {
		fn request_completion(&mut self) -> Result<()> {
			self.requested = true;
			Ok(())
		}

		fn is_complete(&mut self) -> Result<bool> {
			assert!(self.requested, "polled before *OPC");
			self.polls += 1;
			Ok(match self.pending {
				Some(n) => self.polls > n,
				None    => false,
			})
		}
	}

	#[test]
	fn settles_after_pending_polls() {
		let mut src = Countdown{ requested: false, polls: 0, pending: Some(3) };
		let mut wait = BusyWait::new(Duration::from_secs(5), Duration::from_millis(1));
		let settled = wait.run(&mut src).unwrap();
		assert!(settled.polls >= 3);
		assert_eq!(src.polls, 4);
		assert_eq!(wait.state(), WaitState::Settled);
	}

	#[test]
	fn times_out_close_to_the_deadline() {
		let mut src = Countdown{ requested: false, polls: 0, pending: None };
		let mut wait = BusyWait::new(Duration::from_millis(50), Duration::from_millis(5));
		let started = Instant::now();
		match wait.run(&mut src) {
			Err(Error::AcquisitionTimeout{ elapsed }) => {
				assert!(elapsed >= Duration::from_millis(50));
				assert!(started.elapsed() <= Duration::from_millis(200), "{:?}", started.elapsed());
				assert_eq!(wait.state(), WaitState::TimedOut{ elapsed });
			},
			other => panic!("unexpected {:?}", other),
		}
		assert!(src.polls > 1);
	}

	#[test]
	fn esr_parity() {
		assert!(operation_complete(1));
		assert!(operation_complete(33));
		assert!(!operation_complete(32));
		assert!(!operation_complete(0));
	}
}
