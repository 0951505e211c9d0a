
use std::io::{self, Error, ErrorKind};

use crate::xdr::Unpacker;
use crate::rpc::{REPLY, MSG_DENIED, RPC_MISMATCH, AUTH_ERROR, MSG_ACCEPTED, PROG_UNAVAIL, PROG_MISMATCH, PROC_UNAVAIL, GARBAGE_ARGS, SUCCESS};

fn err(msg:String) -> io::Error { Error::new(ErrorKind::Other, msg) }

pub struct Auth {
	pub flavor: i32,
	pub body: Vec<u8>,
}

pub fn unpack_auth(unpacker:&mut Unpacker) -> io::Result<Auth> {
	let flavor:i32  = unpacker.unpack_enum()?;
	let body:Vec<u8> = unpacker.unpack_variable_len_opaque()?;
	Ok(Auth{ flavor, body })
}

/// Consumes an accepted, successful reply header and returns its xid. Anything else is an error,
/// leaving the procedure's results as the next item in the unpacker on success.
pub fn unpack_replyheader(unpacker:&mut Unpacker) -> io::Result<u32> {
	let xid:u32 = unpacker.unpack_u32()?;

	let mtype:i32 = unpacker.unpack_enum()?;
	if mtype != REPLY { return Err(err(format!("Expected REPLY message type but got {}", mtype))); }

	match unpacker.unpack_enum()? {
		MSG_DENIED => {
			return match unpacker.unpack_enum()? {
				RPC_MISMATCH => {
					let low  = unpacker.unpack_u32()?;
					let high = unpacker.unpack_u32()?;
					Err(err(format!("RPC call denied, server supports RPC versions {} to {}", low, high)))
				},
				AUTH_ERROR => {
					let stat = unpacker.unpack_u32()?;
					Err(err(format!("RPC call denied, authentication error {}", stat)))
				},
				x => Err(err(format!("RPC call denied for an unknown reason ({})", x))),
			}
		},
		MSG_ACCEPTED => { },
		x => return Err(err(format!("Neither MSG_DENIED nor MSG_ACCEPTED in reply header ({})", x))),
	}

	let _verf = unpack_auth(unpacker)?;

	match unpacker.unpack_enum()? {
		SUCCESS       => Ok(xid),
		PROG_UNAVAIL  => Err(err("RPC program unavailable".to_owned())),
		PROG_MISMATCH => {
			let low  = unpacker.unpack_u32()?;
			let high = unpacker.unpack_u32()?;
			Err(err(format!("RPC program mismatch, server supports versions {} to {}", low, high)))
		},
		PROC_UNAVAIL  => Err(err("RPC procedure unavailable".to_owned())),
		GARBAGE_ARGS  => Err(err("RPC server could not decode the arguments".to_owned())),
		x             => Err(err(format!("RPC call failed with accept status {}", x))),
	}
}
