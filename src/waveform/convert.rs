//! Raw sample to division/volt conversion.
//!
//! The full raw range of the sample type spans ten vertical divisions, centered on the median
//! of that range. With a calibration the result is in volts:
//! `(raw - median) * 10 / (max - min) * scale - position * scale`.

use std::io::{self, Cursor};

use byteorder::ReadBytesExt;
use serde::{Deserialize, Serialize};

pub const FULL_SCALE_DIVISIONS: f64 = 10.0;

/// A raw sample type as it appears in a binary block.
pub trait Sample: Copy + Into<f64> {
	const MIN: Self;
	const MAX: Self;
	const WIDTH: usize;

	fn read(rdr: &mut Cursor<&[u8]>) -> io::Result<Self>;

	fn range() -> (f64, f64) { (Self::MIN.into(), Self::MAX.into()) }
}

impl Sample for u8 {
	const MIN: u8 = u8::MIN;
	const MAX: u8 = u8::MAX;
	const WIDTH: usize = 1;
	fn read(rdr: &mut Cursor<&[u8]>) -> io::Result<u8> { rdr.read_u8() }
}

impl Sample for i8 {
	const MIN: i8 = i8::MIN;
	const MAX: i8 = i8::MAX;
	const WIDTH: usize = 1;
	fn read(rdr: &mut Cursor<&[u8]>) -> io::Result<i8> { rdr.read_i8() }
}

/// Reads as many whole samples as `bytes` holds.
pub fn read_samples<S: Sample>(bytes: &[u8]) -> Vec<S> {
	let count = bytes.len() / S::WIDTH;
	let mut rdr = Cursor::new(bytes);
	let mut ans: Vec<S> = Vec::with_capacity(count);
	while let Ok(s) = S::read(&mut rdr) {
		ans.push(s);
	}
	ans
}

/// Sample type named by a family's `FORMAT:DATA` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
	Unsigned8,
	Signed8,
}

impl SampleFormat {
	pub fn width(self) -> usize {
		match self {
			SampleFormat::Unsigned8 => <u8 as Sample>::WIDTH,
			SampleFormat::Signed8   => <i8 as Sample>::WIDTH,
		}
	}

	pub fn range(self) -> (f64, f64) {
		match self {
			SampleFormat::Unsigned8 => <u8 as Sample>::range(),
			SampleFormat::Signed8   => <i8 as Sample>::range(),
		}
	}

	pub fn decode(self, bytes: &[u8]) -> RawWaveform {
		match self {
			SampleFormat::Unsigned8 => RawWaveform::Unsigned8(read_samples(bytes)),
			SampleFormat::Signed8   => RawWaveform::Signed8(read_samples(bytes)),
		}
	}
}

/// One channel's samples, still in the scope's integer domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawWaveform {
	Unsigned8(Vec<u8>),
	Signed8(Vec<i8>),
}

impl RawWaveform {
	pub fn len(&self) -> usize {
		match self {
			RawWaveform::Unsigned8(v) => v.len(),
			RawWaveform::Signed8(v)   => v.len(),
		}
	}

	pub fn is_empty(&self) -> bool { self.len() == 0 }

	pub fn format(&self) -> SampleFormat {
		match self {
			RawWaveform::Unsigned8(_) => SampleFormat::Unsigned8,
			RawWaveform::Signed8(_)   => SampleFormat::Signed8,
		}
	}

	pub fn to_physical(&self, calibration: Option<Calibration>) -> Vec<f64> {
		match self {
			RawWaveform::Unsigned8(v) => to_physical(v, calibration),
			RawWaveform::Signed8(v)   => to_physical(v, calibration),
		}
	}
}

/// Vertical settings of a channel at acquisition time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
	/// Volts per division.
	pub scale: f64,
	/// Divisions.
	pub position: f64,
}

/// Divisions without a calibration, volts with one.
pub fn to_physical<S: Sample>(raw: &[S], calibration: Option<Calibration>) -> Vec<f64> {
	convert(raw.iter().map(|&s| s.into()), S::range(), calibration)
}

pub fn convert<I: IntoIterator<Item = f64>>(raw: I, (min, max): (f64, f64), calibration: Option<Calibration>) -> Vec<f64> {
	let median = (min + max) * 0.5;
	let mut factor = FULL_SCALE_DIVISIONS / (max - min);
	let mut offset = 0.0;
	if let Some(cal) = calibration {
		factor *= cal.scale;
		offset = cal.position * cal.scale;
	}
	raw.into_iter().map(|r| (r - median) * factor - offset).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-12 }

	#[test]
	fn full_range_spans_ten_divisions() {
		let u = to_physical(&[u8::MIN, u8::MAX], None);
		assert!(close(u[0], -5.0) && close(u[1], 5.0), "{:?}", u);

		let s = to_physical(&[i8::MIN, i8::MAX], None);
		assert!(close(s[0], -5.0) && close(s[1], 5.0), "{:?}", s);
	}

	#[test]
	fn volts_use_scale_around_the_median() {
		let cal = Some(Calibration{ scale: 2.0, position: 0.0 });
		let (min, max) = <u8 as Sample>::range();
		let v = convert(vec![(min + max) / 2.0, max], (min, max), cal);
		assert_eq!(v[0], 0.0);
		assert!(close(v[1], 10.0), "{:?}", v);
	}

	#[test]
	fn position_is_subtracted_after_scaling() {
		let cal = Some(Calibration{ scale: 0.5, position: 2.0 });
		let v = to_physical(&[0i8], cal);
		// (0 - -0.5) * 10/255 * 0.5 - 2.0 * 0.5
		assert!(close(v[0], 0.5 * 10.0 / 255.0 * 0.5 - 1.0), "{:?}", v);
	}

	#[test]
	fn divisions_ignore_nothing_but_the_domain() {
		let raw = RawWaveform::Signed8(vec![-128, 0, 127]);
		assert_eq!(raw.to_physical(None), to_physical(&[-128i8, 0, 127], None));
		assert_eq!(raw.format(), SampleFormat::Signed8);
	}

	#[test]
	fn decode_respects_signedness() {
		assert_eq!(SampleFormat::Signed8.decode(&[0xff, 0x01]), RawWaveform::Signed8(vec![-1, 1]));
		assert_eq!(SampleFormat::Unsigned8.decode(&[0xff, 0x01]), RawWaveform::Unsigned8(vec![255, 1]));
	}
}
