pub const PMAP_PROG:u32 = 100000;
pub const PMAP_VERS:u32 = 2;
pub const PMAP_PORT:u16 = 111;

pub const PMAPPROC_GETPORT:u32 = 3;     // (mapping) -> unsigned int

use std::io::{self, Error, ErrorKind};
use std::time::Duration;

use super::xdr_pack;
use super::tcp_clients::TcpClient;

#[derive(Debug)]
pub struct Mapping {
	pub program: u32,
	pub version: u32,
	/// `IPPROTO_TCP`; only TCP mappings are looked up.
	pub protocol: u32,
	pub port: u32,
}

pub struct TcpPortMapperClient {
	client: TcpClient,
}

impl TcpPortMapperClient {

	pub fn new(host:&str, timeout:Option<Duration>) -> io::Result<Self> {
		let client = TcpClient::connect((host, PMAP_PORT), PMAP_PROG, PMAP_VERS, timeout)?;
		Ok(Self{ client })
	}

	/// Looks up the port a program is registered on, failing with `NotFound` if it is not registered.
	pub fn get_port(&mut self, m:&Mapping) -> io::Result<u32> {
		self.client.start_call(PMAPPROC_GETPORT)?;
		xdr_pack::pack_mapping(&mut self.client.packer, m.program, m.version, m.protocol, m.port)?;
		self.client.do_call()?;

		let ans:u32 = self.client.unpacker.unpack_u32()?;

		if !self.client.unpacker.all_data_consumed() {
			return Err(Error::new(ErrorKind::InvalidData, "Data unexpectedly left over in unpacker after unpacking port"));
		}
		if ans == 0 || ans > u16::MAX as u32 {
			return Err(Error::new(ErrorKind::NotFound, format!("Program {:#x} v{} is not registered with the port mapper", m.program, m.version)));
		}
		Ok(ans)
	}

}
