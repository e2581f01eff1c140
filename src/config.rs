//! Tunables that the original C driver scattered across `#define`s, gathered
//! here so they have one documented home.

/// Default control-socket port (SCPI).
pub const CONTROL_PORT: u16 = 37001;
/// Default data-socket port (VRT stream).
pub const DATA_PORT: u16 = 37000;

/// One-shot recv timeout for the control socket.
pub const DEFAULT_CONTROL_TIMEOUT_MS: u64 = 1_000;
/// Loop-until-N recv timeout for the data socket.
pub const DEFAULT_DATA_TIMEOUT_MS: u64 = 5_000;

/// Short writes are retried this many times before giving up.
pub const MAX_SEND_RETRIES: u32 = 3;

/// Smallest samples-per-packet the device will accept.
pub const MIN_SPP: u32 = 256;
/// Largest samples-per-packet the device will accept.
pub const MAX_SPP: u32 = 64_000;
/// spp must be a multiple of this.
pub const SPP_MULTIPLE: u32 = 16;

/// Calibration constant folded into every bin's dBm conversion. Matches the
/// reference firmware's fixed FFT scaling offset.
pub const KISS_FFT_OFFSET: f32 = 86.0;

/// Written into every output bin before capture; used afterward to detect
/// bins that never got filled.
pub const POISON_SENTINEL: f32 = -1000.0;

bitflags::bitflags! {
    /// Mirrors the original driver's global stderr debug mask. Nothing in
    /// this crate reads these bits to decide whether to log -- all logging
    /// goes through `tracing`, which has its own level/target filtering.
    /// Kept only so callers porting scripts that poke the old mask have
    /// somewhere to put the value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DebugMask: u32 {
        const ERROR       = 0b0000_0000_001;
        const WARNING     = 0b0000_0000_010;
        const INFO        = 0b0000_0000_100;
        const CONFIG      = 0b0000_0001_000;
        const SWEEP_PLAN  = 0b0000_0010_000;
        const COLLECT     = 0b0000_0100_000;
        const SPEED       = 0b0000_1000_000;
        const PEAKS       = 0b0001_0000_000;
        const FILE_OUT    = 0b0010_0000_000;
        const SWEEP_CFG   = 0b0100_0000_000;
    }
}
