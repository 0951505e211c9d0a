
// External data representation, a protocol for serializing data to be sent over the network
pub mod xdr;

// Remote procedure call, a protocol build on top of XDR to provide something like C-style function calls over the network
pub mod rpc;

// A protocol using RPC that's meant to communicate with instruments like oscilloscopes, power supplies, waveform generators, etc
pub mod vxi11;

// The seam between the scope logic and whatever carries the bytes (VXI-11 in production, mocks in tests)
pub mod transport;

// Link timeouts and polling settings
pub mod config;

// Crate-wide error type
pub mod error;

// Per-family tables for the R&S RTM (mid-range) and RTO (high-end) scopes
pub mod devices;

// Binary block codec, demultiplexer and unit conversion for waveform payloads
pub mod waveform;

// Connection to a scope: link guard, acquisition, completion and settings
pub mod scope;

pub use config::LinkConfig;
pub use devices::{Channel, Channels, Coupling, DeviceProfile, Family, TriggerCoupling, TriggerSlope};
pub use error::{Error, Result};
pub use scope::{ChannelSettings, FirmwareVersion, ScopeConnection};
pub use scope::sync::Settled;
pub use transport::{Opener, Transport, Vxi11Opener};
pub use waveform::{ChannelMap, Payload, RawAcquisition, RawWaveform};
