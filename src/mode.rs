//! Receiver front-end modes and their tuning properties.

use std::fmt;
use std::str::FromStr;

use crate::frequency::Frequency;

/// Whether a mode's captured samples are a complex IQ pair or real-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    Iq,
    RealOnly,
}

/// Receiver front-end mode. Only [`DeviceMode::Sh`], [`DeviceMode::Shn`] and
/// [`DeviceMode::Dd`] have registered tuning properties (see
/// [`ModeProperties::for_mode`]) -- the others are valid wire values the
/// device accepts elsewhere, but the sweep planner and capture loop only
/// support real-sampled, non-decimated front ends for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    Zif,
    Hdr,
    Sh,
    Shn,
    DecSh,
    DecShn,
    IqIn,
    Dd,
    Auto,
}

impl DeviceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceMode::Zif => "ZIF",
            DeviceMode::Hdr => "HDR",
            DeviceMode::Sh => "SH",
            DeviceMode::Shn => "SHN",
            DeviceMode::DecSh => "DECSH",
            DeviceMode::DecShn => "DECSHN",
            DeviceMode::IqIn => "IQIN",
            DeviceMode::Dd => "DD",
            DeviceMode::Auto => "AUTO",
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseModeError(pub String);

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} is not a recognized device mode", self.0)
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for DeviceMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ZIF" => Ok(DeviceMode::Zif),
            "HDR" => Ok(DeviceMode::Hdr),
            "SH" => Ok(DeviceMode::Sh),
            "SHN" => Ok(DeviceMode::Shn),
            "DECSH" => Ok(DeviceMode::DecSh),
            "DECSHN" => Ok(DeviceMode::DecShn),
            "IQIN" => Ok(DeviceMode::IqIn),
            "DD" => Ok(DeviceMode::Dd),
            "AUTO" => Ok(DeviceMode::Auto),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Tuning properties for a capture-capable mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProperties {
    pub mode: DeviceMode,
    pub sample_type: SampleType,
    pub freq_shift_available: bool,
    pub min_tunable: Frequency,
    pub max_tunable: Frequency,
    pub tuning_resolution: Frequency,
    pub full_bw: Frequency,
    pub usable_bw: Frequency,
    pub passband_center: Frequency,
    pub usable_left: Frequency,
    pub usable_right: Frequency,
    pub min_decimation: u32,
    pub max_decimation: u32,
}

fn hz(v: u64) -> Frequency {
    Frequency::from_hz(v)
}

impl ModeProperties {
    /// Looks up the registered tuning table for `mode`. Returns `None` for
    /// modes the capture path does not implement (ZIF, HDR, the decimated
    /// SH/SHN variants, IQIN, AUTO).
    pub fn for_mode(mode: DeviceMode) -> Option<ModeProperties> {
        const MHZ: u64 = 1_000_000;
        const GHZ: u64 = 1_000_000_000;
        const KHZ: u64 = 1_000;

        match mode {
            DeviceMode::Shn => Some(ModeProperties {
                mode,
                sample_type: SampleType::RealOnly,
                freq_shift_available: true,
                min_tunable: hz(50 * MHZ),
                max_tunable: hz(27 * GHZ),
                tuning_resolution: hz(10),
                full_bw: hz(62_500 * KHZ),
                usable_bw: hz(10 * MHZ),
                passband_center: hz(35 * MHZ),
                usable_left: hz(30 * MHZ),
                usable_right: hz(40 * MHZ),
                min_decimation: 4,
                max_decimation: 512,
            }),
            DeviceMode::Sh => Some(ModeProperties {
                mode,
                sample_type: SampleType::RealOnly,
                freq_shift_available: true,
                min_tunable: hz(50 * MHZ),
                max_tunable: hz(27 * GHZ),
                tuning_resolution: hz(10),
                full_bw: hz(62_500 * KHZ),
                usable_bw: hz(40 * MHZ),
                passband_center: hz(35 * MHZ),
                usable_left: hz(15 * MHZ),
                usable_right: hz(55 * MHZ),
                min_decimation: 4,
                max_decimation: 512,
            }),
            DeviceMode::Dd => Some(ModeProperties {
                mode,
                sample_type: SampleType::RealOnly,
                freq_shift_available: true,
                min_tunable: hz(50 * MHZ),
                max_tunable: hz(27 * GHZ),
                tuning_resolution: hz(10),
                full_bw: hz(62_500 * KHZ),
                usable_bw: hz(50 * MHZ),
                passband_center: hz(31_250 * KHZ),
                usable_left: hz(0),
                usable_right: hz(50 * MHZ),
                min_decimation: 1,
                max_decimation: 1,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_string_round_trips() {
        for mode in [
            DeviceMode::Zif,
            DeviceMode::Hdr,
            DeviceMode::Sh,
            DeviceMode::Shn,
            DeviceMode::DecSh,
            DeviceMode::DecShn,
            DeviceMode::IqIn,
            DeviceMode::Dd,
            DeviceMode::Auto,
        ] {
            let parsed: DeviceMode = mode.as_str().parse().unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn unknown_mode_string_is_an_error() {
        assert!("BOGUS".parse::<DeviceMode>().is_err());
    }

    #[test]
    fn only_sh_shn_dd_have_properties() {
        assert!(ModeProperties::for_mode(DeviceMode::Sh).is_some());
        assert!(ModeProperties::for_mode(DeviceMode::Shn).is_some());
        assert!(ModeProperties::for_mode(DeviceMode::Dd).is_some());
        assert!(ModeProperties::for_mode(DeviceMode::Zif).is_none());
        assert!(ModeProperties::for_mode(DeviceMode::Auto).is_none());
    }

    #[test]
    fn usable_band_nested_in_full_bw() {
        let sh = ModeProperties::for_mode(DeviceMode::Sh).unwrap();
        assert!(sh.usable_left < sh.passband_center);
        assert!(sh.passband_center < sh.usable_right);
        assert_eq!(
            (sh.usable_right.as_hz() - sh.usable_left.as_hz()),
            sh.usable_bw.as_hz()
        );
    }
}
