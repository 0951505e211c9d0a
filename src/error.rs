use std::io;
use std::time::Duration;

use crate::devices::{Channel, Family};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The transport failed. Never retried here.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("not connected to the scope")]
    NotConnected,

    #[error("malformed binary block: {0}")]
    Framing(String),

    #[error("binary block declares {declared} bytes but {expected} were expected")]
    LengthMismatch { declared: usize, expected: usize },

    #[error("{channels} channels requested but {payloads} payloads received")]
    ChannelCountMismatch { channels: usize, payloads: usize },

    #[error("acquisition did not complete after {elapsed:?}")]
    AcquisitionTimeout { elapsed: Duration },

    #[error("{operation} is not supported by the {family} family")]
    Unsupported { operation: &'static str, family: Family },

    #[error("{0} cannot be used with this command")]
    InvalidChannel(Channel),

    #[error("unexpected response: {0}")]
    Response(String),

    #[error("incomplete calibration: {0}")]
    Calibration(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn response(what: &str, raw: &str) -> Self {
        Error::Response(format!("{} from {:?}", what, raw))
    }
}
