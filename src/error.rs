use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::frequency::Frequency;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("socket dropped the connection")]
    SocketDropped,

    #[error("no data received within the timeout duration ({} ms)", .0.as_millis())]
    SocketTimeout(Duration),

    #[error("a short write was retried {0} times and still did not complete")]
    SendFailed(u32),

    #[error("query sent but no response arrived")]
    QueryNoResponse,
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("could not parse device response: {0:?}")]
    RespUnknown(String),

    #[error("failed to send command {0:?}")]
    CmdSendFailed(String),

    #[error("device rejected command {command:?}: {code} {message}")]
    SetFailed {
        command: String,
        code: i32,
        message: String,
    },

    #[error("first stream-id word did not match a known VRT packet class: {0:#010x}")]
    NotIQFrame(u32),

    #[error("VRT packet declared an invalid or non-UTC timestamp integer type")]
    InvTimestamp,

    #[error(transparent)]
    Nom(#[from] NomError),
}

/// Adapter so `nom`'s borrowed error type doesn't have to be threaded
/// through as a lifetime parameter on [`ProtocolError`].
#[derive(Error, Debug)]
#[error("malformed wire data: {0}")]
pub struct NomError(pub String);

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("frequency {0} is outside the device's tunable range")]
    FreqOutOfBound(Frequency),

    #[error("requested stop frequency {stop} is not above start frequency {start} by at least one rbw")]
    BadFreqRange { start: Frequency, stop: Frequency },

    #[error("samples-per-packet {0} is out of the device's supported range")]
    InvSampleSize(u32),

    #[error("IF gain {0} dB is out of range")]
    InvIfGain(i32),

    #[error("RF gain {0:?} is not a supported setting")]
    InvRfGain(String),

    #[error("attenuation {0} is out of range")]
    InvAttenuation(u32),

    #[error("decimation rate {0} is not supported")]
    InvDecimationRate(u32),

    #[error("antenna port {0} does not exist on this device")]
    InvAntennaPort(u32),

    #[error("PLL reference source {0:?} is not recognized")]
    InvPllRefSource(String),

    #[error("RFE input mode {0:?} is not recognized")]
    InvRfeInputMode(String),

    #[error("trigger mode {0:?} is not recognized")]
    InvTriggerMode(String),

    #[error("trigger sync delay {0} ns is not a multiple of 8 ns")]
    InvTriggerDelay(u32),

    #[error("trigger sync role {0:?} is not recognized")]
    InvTriggerSync(String),

    #[error("device mode {0:?} has no registered tuning properties")]
    UnsupportedMode(String),

    #[error("start frequency {0} is below the device's minimum")]
    StartOob(Frequency),

    #[error("stop frequency {0} is above the device's maximum")]
    StopOob(Frequency),

    #[error("channel power range [{0}, {1}) is out of bounds for a spectrum of length {2}")]
    InvChPowerRange(usize, usize, usize),

    #[error("sweep entry id {0} is out of bounds")]
    InvSweepStartId(u32),
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("a sweep is already running")]
    SweepAlreadyRunning,

    #[error("no sweep is currently running")]
    SweepNotRunning,

    #[error("cannot configure a sweep while the device is streaming raw IQ")]
    SweepWhileStreaming,

    #[error("IQ streaming is already running")]
    StreamAlreadyRunning,

    #[error("IQ streaming is not running")]
    StreamNotRunning,

    #[error("the sweep list is empty")]
    SweepListEmpty,

    #[error("sweep entry id {0} does not exist in the list")]
    SweepIdOob(u32),

    #[error("another host holds the data-access lock")]
    DataAccessDenied,

    #[error("sweep mode has not been set on this entry template")]
    SweepModeUndef,
}

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("failed to allocate the output spectrum buffer")]
    MallocFailed,

    #[error("failed to initialize the device descriptor")]
    InitFailed,

    #[error("failed to open a connection to the device")]
    OpenFailed,
}

/// Non-fatal condition: reported back to the caller but does not abort the
/// operation that raised it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    #[error("device reported a trigger conflict (SYST:ERR? code -221)")]
    TriggerConflict,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

pub type Result<T> = std::result::Result<T, Error>;
