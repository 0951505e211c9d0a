use std::io;

use crate::config::LinkConfig;
use crate::vxi11::CoreClient;

/// A half-duplex request/response channel to one instrument.
///
/// Implementations carry no locking of their own; `ScopeConnection` serializes
/// every call. A query is always a `write` followed by exactly one `read`.
pub trait Transport: Send {
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    fn read(&mut self) -> io::Result<Vec<u8>>;

    fn ask(&mut self, data: &[u8]) -> io::Result<Vec<u8>> {
        self.write(data)?;
        self.read()
    }

    fn close(&mut self) -> io::Result<()>;
}

/// Opens transports for a host.
pub trait Opener: Send + Sync {
    type Transport: Transport;

    fn open(&self, host: &str, config: &LinkConfig) -> io::Result<Self::Transport>;
}

/// Opens a VXI-11 core link on the configured logical device.
#[derive(Debug, Default, Clone, Copy)]
pub struct Vxi11Opener;

impl Opener for Vxi11Opener {
    type Transport = CoreClient;

    fn open(&self, host: &str, config: &LinkConfig) -> io::Result<CoreClient> {
        let mut core = CoreClient::new(host, config)?;
        core.create_link(&config.device_name)?;
        Ok(core)
    }
}
