
use std::io::{self, Read, Write, Error, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use byteorder::{BigEndian, WriteBytesExt, ReadBytesExt};

use crate::xdr;
use super::{xdr_pack, xdr_unpack};

const LAST_FRAGMENT:u32 = 0x8000_0000;

/// ONC-RPC client over a TCP stream using record marking. Arguments are packed into `packer`
/// between `start_call` and `do_call`; results are read back from `unpacker`.
pub struct TcpClient {
	stream: TcpStream,
	pub prog: u32,
	pub vers: u32,
	pub lastxid: u32,
	pub packer: xdr::Packer,
	pub unpacker: xdr::Unpacker,
}

impl TcpClient {

	pub fn connect<A: ToSocketAddrs>(addr: A, prog: u32, vers: u32, timeout: Option<Duration>) -> io::Result<Self> {
		let stream = TcpStream::connect(addr)?;
		stream.set_read_timeout(timeout)?;
		stream.set_write_timeout(timeout)?;
		stream.set_nodelay(true)?;
		Ok(Self{ stream, prog, vers, lastxid: 0, packer: xdr::Packer::new(), unpacker: xdr::Unpacker::new() })
	}

	pub fn start_call(&mut self, prc:u32) -> io::Result<()> {
		self.lastxid = self.lastxid.wrapping_add(1);
		self.packer.reset();
		xdr_pack::pack_callheader_no_auth(&mut self.packer, self.lastxid, self.prog, self.vers, prc)
	}

	pub fn do_call(&mut self) -> io::Result<()> {
		let call:&[u8] = self.packer.as_bytes();
		let mut send_bytes:Vec<u8> = Vec::with_capacity(call.len() + 4);
		send_bytes.write_u32::<BigEndian>(call.len() as u32 | LAST_FRAGMENT)?;
		send_bytes.extend_from_slice(call);
		self.stream.write_all(&send_bytes)?;

		loop {
			let reply = read_record(&mut self.stream)?;
			self.unpacker.reset(reply);

			let xid = xdr_unpack::unpack_replyheader(&mut self.unpacker)?;
			if xid == self.lastxid {
				return Ok(());
			} else if xid < self.lastxid {
				// Stale reply to an earlier call that timed out on our side
				log::debug!("discarding stale RPC reply xid={} (expecting {})", xid, self.lastxid);
				continue;
			} else {
				return Err(Error::new(ErrorKind::InvalidData, "Somehow got a packet from the future"));
			}
		}
	}

}

/// Reassembles one record-marked message from its fragments.
pub fn read_record<R: Read>(rdr:&mut R) -> io::Result<Vec<u8>> {
	let mut reply:Vec<u8> = vec![];
	loop {
		let header:u32 = rdr.read_u32::<BigEndian>()?;
		let n = (header & !LAST_FRAGMENT) as u64;

		// The buffer grows with the bytes that actually arrive, not with what the header claims
		let start = reply.len();
		(&mut *rdr).take(n).read_to_end(&mut reply)?;
		if ((reply.len() - start) as u64) < n {
			return Err(Error::new(ErrorKind::UnexpectedEof, format!("RPC fragment ended after {} of {} bytes", reply.len() - start, n)));
		}

		if header & LAST_FRAGMENT != 0 {
			return Ok(reply);
		}
	}
}
