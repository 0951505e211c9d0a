// Device core
pub const DEVICE_CORE_PROG:u32  = 0x0607af;
pub const DEVICE_CORE_VERS:u32  = 1;
pub const CREATE_LINK:u32       = 10;
pub const DEVICE_WRITE:u32      = 11;
pub const DEVICE_READ:u32       = 12;
pub const DESTROY_LINK:u32      = 23;

pub const CLIENT_ID:i32 = 3333;

pub const OPERATION_FLAGS_NONE:i32     = 0;
pub const OPERATION_FLAGS_END_ONLY:i32 = 8;

// Reason bits in a device_read reply
pub const REASON_REQCNT:i32 = 1;
pub const REASON_CHR:i32    = 2;
pub const REASON_END:i32    = 4;

// Extra time the socket waits on top of the instrument timeout, so the instrument reports its own timeout first
pub const SOCKET_TIMEOUT_MARGIN_MS:u64 = 2000;

use std::io::{self, Error, ErrorKind};
use std::time::Duration;

use crate::config::LinkConfig;
use crate::rpc::IPPROTO_TCP;
use crate::rpc::port_mapping::{TcpPortMapperClient, Mapping};
use crate::rpc::tcp_clients::TcpClient;
use crate::transport::Transport;

pub mod xdr_pack;

fn err(msg:&str) -> io::Error { Error::new(ErrorKind::Other, msg) }

/// Maps a VXI-11 device_error code to an io::Error.
pub fn device_error(code:i32) -> io::Result<()> {
	match code {
		0  => Ok(()),
		1  => Err(err("Syntax error")),
		3  => Err(err("Device not accessible")),
		4  => Err(err("Invalid link identifier")),
		5  => Err(err("Parameter error")),
		6  => Err(err("Channel not established")),
		8  => Err(err("Operation not supported")),
		9  => Err(err("Out of resources")),
		11 => Err(err("Device locked by another link")),
		12 => Err(err("No lock held by this link")),
		15 => Err(Error::new(ErrorKind::TimedOut, "I/O timeout")),
		17 => Err(err("I/O error")),
		21 => Err(err("Invalid address")),
		23 => Err(err("Abort")),
		29 => Err(err("Channel already established")),
		x  => Err(Error::new(ErrorKind::Other, format!("Unknown VXI-11 error code {}", x))),
	}
}

pub struct Link {
	pub link_id: i32,
	pub max_recv_size: u32,
}

pub struct CoreClient {
	client: TcpClient,
	opt_link: Option<Link>,
	io_timeout: u32,
	lock_timeout: u32,
}

impl CoreClient {

	fn get_link(&self) -> io::Result<&Link> {
		self.opt_link.as_ref().ok_or_else(|| Error::new(ErrorKind::NotConnected, "No link"))
	}

	pub fn new(host:&str, config:&LinkConfig) -> io::Result<Self> {
		let socket_timeout = Duration::from_millis(config.instrument_timeout_ms as u64 + SOCKET_TIMEOUT_MARGIN_MS);

		// Find the port to use for the core program
		let mut pmap_client = TcpPortMapperClient::new(host, Some(socket_timeout))?;

		let mapping = Mapping {
			program: DEVICE_CORE_PROG,
			version: DEVICE_CORE_VERS,
			protocol: IPPROTO_TCP,
			port: 0,
		};

		let port = pmap_client.get_port(&mapping)?;
		log::debug!("{}: DEVICE_CORE on port {}", host, port);

		let client = TcpClient::connect((host, port as u16), DEVICE_CORE_PROG, DEVICE_CORE_VERS, Some(socket_timeout))?;

		Ok(CoreClient{ client, opt_link: None, io_timeout: config.instrument_timeout_ms, lock_timeout: config.lock_timeout_ms })
	}

	pub fn create_link(&mut self, device:&str) -> io::Result<()> {
		if self.opt_link.is_some() {
			return Err(err("Already connected to a link"));
		}

		self.client.start_call(CREATE_LINK)?;
		xdr_pack::pack_create_link_parms(&mut self.client.packer, CLIENT_ID, false, self.lock_timeout, device)?;
		self.client.do_call()?;

		let error:i32         = self.client.unpacker.unpack_i32()?;
		let link_id:i32       = self.client.unpacker.unpack_i32()?;
		let _abort_port:u32   = self.client.unpacker.unpack_u32()?;
		let max_recv_size:u32 = self.client.unpacker.unpack_u32()?;
		device_error(error)?;

		log::debug!("created link {} to {} (max_recv_size={})", link_id, device, max_recv_size);
		self.opt_link = Some(Link{ link_id, max_recv_size });
		Ok(())
	}

	fn write_chunk(&mut self, link_id:i32, flags:i32, chunk:&[u8]) -> io::Result<()> {
		self.client.start_call(DEVICE_WRITE)?;
		xdr_pack::pack_device_write_parms(&mut self.client.packer, link_id, self.io_timeout, self.lock_timeout, flags, chunk)?;
		self.client.do_call()?;

		let error:i32 = self.client.unpacker.unpack_i32()?;
		let size:u32  = self.client.unpacker.unpack_u32()?;
		device_error(error)?;

		if size as usize != chunk.len() {
			return Err(err("Number of bytes in confirmation doesn't match number of bytes sent"));
		}
		Ok(())
	}

	fn read_once(&mut self, link_id:i32) -> io::Result<(i32, Vec<u8>)> {
		self.client.start_call(DEVICE_READ)?;
		xdr_pack::pack_device_read_parms(&mut self.client.packer, link_id, u32::MAX, self.io_timeout, self.lock_timeout, OPERATION_FLAGS_NONE, 0)?;
		self.client.do_call()?;

		let error:i32    = self.client.unpacker.unpack_i32()?;
		let reason:i32   = self.client.unpacker.unpack_i32()?;
		let data:Vec<u8> = self.client.unpacker.unpack_variable_len_opaque()?;
		device_error(error)?;
		Ok((reason, data))
	}

	pub fn destroy_link(&mut self) -> io::Result<()> {
		let link_id = match self.opt_link.take() {
			Some(link) => link.link_id,
			None       => return Err(err("No link to destroy")),
		};

		self.client.start_call(DESTROY_LINK)?;
		xdr_pack::pack_device_link(&mut self.client.packer, link_id)?;
		self.client.do_call()?;

		device_error(self.client.unpacker.unpack_i32()?)
	}

}

impl Transport for CoreClient {

	// Messages longer than the link accepts are split; only the last piece carries END
	fn write(&mut self, data:&[u8]) -> io::Result<()> {
		let (link_id, max) = {
			let link = self.get_link()?;
			(link.link_id, link.max_recv_size.max(1) as usize)
		};

		let mut chunks = data.chunks(max).peekable();
		if chunks.peek().is_none() {
			return self.write_chunk(link_id, OPERATION_FLAGS_END_ONLY, &[]);
		}
		while let Some(chunk) = chunks.next() {
			let flags = if chunks.peek().is_none() { OPERATION_FLAGS_END_ONLY } else { OPERATION_FLAGS_NONE };
			self.write_chunk(link_id, flags, chunk)?;
		}
		Ok(())
	}

	// A response may arrive in several device_read replies; keep reading until the END bit
	fn read(&mut self) -> io::Result<Vec<u8>> {
		let link_id = self.get_link()?.link_id;

		let mut ans:Vec<u8> = vec![];
		loop {
			let (reason, mut data) = self.read_once(link_id)?;
			ans.append(&mut data);

			if reason & REASON_END != 0 {
				return Ok(ans);
			}
			if reason & (REASON_REQCNT | REASON_CHR) == 0 {
				return Err(err("Expected one of three reason bits to be set"));
			}
		}
	}

	fn close(&mut self) -> io::Result<()> {
		if self.opt_link.is_none() { return Ok(()); }
		self.destroy_link()
	}

}

impl Drop for CoreClient {

	fn drop(&mut self) {
		if self.opt_link.is_some() {
			if let Err(e) = self.destroy_link() {
				log::warn!("unable to destroy VXI-11 link: {}", e);
			}
		}
	}

}
