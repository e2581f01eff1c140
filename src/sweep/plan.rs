//! Turns a `(mode, fstart, fstop, rbw)` request into the list of tuned
//! segments the sweep loader pushes to the device, grounded on
//! `wsa_plan_sweep` in the reference driver.

use crate::config::{MAX_SPP, MIN_SPP, SPP_MULTIPLE};
use crate::device::DeviceDescriptor;
use crate::error::ValidationError;
use crate::frequency::Frequency;
use crate::mode::{DeviceMode, ModeProperties, SampleType};

/// One tuned segment of a sweep: the device is stepped from `fcstart` to
/// `fcstop` in increments of `fstep`, spp samples per packet, ppb packets
/// per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPlanEntry {
    pub is_dd: bool,
    pub fcstart: Frequency,
    pub fcstop: Frequency,
    pub fstep: Frequency,
    pub spp: u32,
    pub ppb: u32,
}

/// The full plan for one sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPlan {
    pub mode: DeviceMode,
    pub fstart_actual: Frequency,
    pub fstop_actual: Frequency,
    pub entries: Vec<SweepPlanEntry>,
    pub spp: u32,
    pub ppb: u32,
    pub packet_total: u32,
    pub only_dd: bool,
}

fn div_ceil_u64(n: u64, d: u64) -> u64 {
    (n + d - 1) / d
}

fn round_up_to_multiple(n: u64, multiple: u64) -> u64 {
    div_ceil_u64(n, multiple) * multiple
}

pub fn plan_sweep(
    mode: DeviceMode,
    fstart: Frequency,
    fstop: Frequency,
    rbw: Frequency,
    descriptor: &DeviceDescriptor,
) -> Result<SweepPlan, ValidationError> {
    if fstop < fstart + rbw {
        return Err(ValidationError::BadFreqRange {
            start: fstart,
            stop: fstop,
        });
    }
    if fstart < descriptor.min_tune_freq {
        return Err(ValidationError::StartOob(fstart));
    }
    if fstop > descriptor.max_tune_freq {
        return Err(ValidationError::StopOob(fstop));
    }
    let props =
        ModeProperties::for_mode(mode).ok_or_else(|| ValidationError::UnsupportedMode(mode.to_string()))?;

    let required_points_raw = div_ceil_u64(props.full_bw.as_hz(), rbw.as_hz());
    let mut required_points = round_up_to_multiple(required_points_raw, SPP_MULTIPLE as u64);
    if props.sample_type == SampleType::RealOnly {
        required_points *= 2;
    }

    let (spp, ppb): (u32, u32) = if required_points > MAX_SPP as u64 {
        (MAX_SPP, div_ceil_u64(required_points, MAX_SPP as u64) as u32)
    } else if required_points < MIN_SPP as u64 {
        (MIN_SPP, 1)
    } else {
        (required_points as u32, 1)
    };

    let needs_dd = fstart < props.min_tunable;
    let dd_entry = if needs_dd {
        let dd_stop = if fstop < props.min_tunable { fstop } else { props.min_tunable };
        Some(SweepPlanEntry {
            is_dd: true,
            fcstart: fstart,
            fcstop: dd_stop,
            fstep: Frequency::zero(),
            spp,
            ppb,
        })
    } else {
        None
    };

    let half_bw = props.usable_bw / 2;
    let raw_fcstart = if needs_dd {
        props.min_tunable + half_bw
    } else {
        fstart + half_bw
    };
    let fcstart = raw_fcstart.quantize_down(props.tuning_resolution);
    let fstart_actual = fcstart.checked_sub(half_bw).unwrap_or(Frequency::zero());

    let fstep = props
        .usable_bw
        .checked_sub(rbw)
        .unwrap_or(Frequency::zero())
        .quantize_down(props.tuning_resolution);
    let fstep = if fstep.as_hz() == 0 {
        props.tuning_resolution
    } else {
        fstep
    };

    let last_step_limit = descriptor.max_tune_freq.checked_sub(fstep).unwrap_or(fcstart);

    let mut fcstop = fcstart;
    while fcstop < fstop {
        fcstop = fcstop + fstep;
    }
    if fcstop < fcstart {
        fcstop = fcstart;
    }
    if fcstop > last_step_limit {
        fcstop = last_step_limit;
    }
    let fstop_actual = fcstop + half_bw;

    let main_entry = SweepPlanEntry {
        is_dd: false,
        fcstart,
        fcstop,
        fstep,
        spp,
        ppb,
    };

    let mut entries = Vec::new();
    if let Some(dd) = dd_entry {
        entries.push(dd);
    }

    let only_dd = needs_dd && fstop < props.min_tunable;
    if !only_dd {
        entries.push(main_entry);
    }

    let main_block_count = if fcstop > fcstart {
        1 + (fcstop.as_hz() - fcstart.as_hz()) / fstep.as_hz()
    } else {
        1
    };
    let block_count = main_block_count + if needs_dd { 1 } else { 0 };
    let packet_total = (block_count as u32) * ppb;

    Ok(SweepPlan {
        mode,
        fstart_actual: if needs_dd {
            fstart.quantize_down(props.tuning_resolution)
        } else {
            fstart_actual
        },
        fstop_actual,
        entries,
        spp,
        ppb,
        packet_total,
        only_dd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor {
            product_model: "WSA5000-408".to_string(),
            product_serial: "0001".to_string(),
            rfe_model: "RFE".to_string(),
            firmware_version: "1.0".to_string(),
            instantaneous_bw: Frequency::from_hz(62_500_000),
            max_sample_size: 64_000,
            min_tune_freq: Frequency::from_hz(50_000_000),
            max_tune_freq: Frequency::from_hz(27_000_000_000),
            freq_resolution: Frequency::from_hz(10),
            min_if_gain: -10.0,
            max_if_gain: 34.0,
            abs_max_amp: vec![0.0],
        }
    }

    #[test]
    fn rejects_stop_not_above_start_by_rbw() {
        let d = descriptor();
        let err = plan_sweep(
            DeviceMode::Sh,
            Frequency::from_hz(1_000_000_000),
            Frequency::from_hz(1_000_000_000),
            Frequency::from_hz(100_000),
            &d,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::BadFreqRange { .. }));
    }

    #[test]
    fn rejects_unsupported_mode() {
        let d = descriptor();
        let err = plan_sweep(
            DeviceMode::Zif,
            Frequency::from_hz(1_000_000_000),
            Frequency::from_hz(2_000_000_000),
            Frequency::from_hz(100_000),
            &d,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedMode(_)));
    }

    #[test]
    fn spp_is_multiple_of_16_and_bounded() {
        let d = descriptor();
        let plan = plan_sweep(
            DeviceMode::Sh,
            Frequency::from_hz(1_000_000_000),
            Frequency::from_hz(2_000_000_000),
            Frequency::from_hz(100_000),
            &d,
        )
        .unwrap();
        assert!(plan.spp >= MIN_SPP);
        assert!(plan.spp <= MAX_SPP);
        assert_eq!(plan.spp % SPP_MULTIPLE, 0);
    }

    #[test]
    fn plans_a_dd_segment_below_min_tunable() {
        let d = descriptor();
        let plan = plan_sweep(
            DeviceMode::Dd,
            Frequency::from_hz(1_000_000),
            Frequency::from_hz(100_000_000),
            Frequency::from_hz(100_000),
            &d,
        )
        .unwrap();
        assert!(plan.entries.iter().any(|e| e.is_dd));
        assert!(!plan.only_dd);
    }

    #[test]
    fn only_dd_when_entire_range_below_min_tunable() {
        let d = descriptor();
        let plan = plan_sweep(
            DeviceMode::Dd,
            Frequency::from_hz(1_000_000),
            Frequency::from_hz(20_000_000),
            Frequency::from_hz(100_000),
            &d,
        )
        .unwrap();
        assert!(plan.only_dd);
        assert_eq!(plan.entries.len(), 1);
        assert!(plan.entries[0].is_dd);
    }

    #[test]
    fn packet_total_matches_block_count_times_ppb() {
        let d = descriptor();
        let plan = plan_sweep(
            DeviceMode::Sh,
            Frequency::from_hz(1_000_000_000),
            Frequency::from_hz(1_200_000_000),
            Frequency::from_hz(1_000_000),
            &d,
        )
        .unwrap();
        let main = plan.entries.iter().find(|e| !e.is_dd).unwrap();
        let block_count = 1 + (main.fcstop.as_hz() - main.fcstart.as_hz()) / main.fstep.as_hz();
        assert_eq!(plan.packet_total, block_count as u32 * plan.ppb);
    }

    /// Two planning runs over identical inputs must produce identical
    /// output — the planner holds no hidden state between calls.
    #[test]
    fn planning_the_same_request_twice_is_idempotent() {
        let d = descriptor();
        let first = plan_sweep(
            DeviceMode::Shn,
            Frequency::from_hz(2_400_000_000),
            Frequency::from_hz(2_500_000_000),
            Frequency::from_hz(50_000),
            &d,
        )
        .unwrap();
        let second = plan_sweep(
            DeviceMode::Shn,
            Frequency::from_hz(2_400_000_000),
            Frequency::from_hz(2_500_000_000),
            Frequency::from_hz(50_000),
            &d,
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn shn_sweep_edges_are_covered_not_cropped() {
        let d = descriptor();
        let fstart = Frequency::from_hz(2_400_000_000);
        let fstop = Frequency::from_hz(2_500_000_000);
        let plan = plan_sweep(DeviceMode::Shn, fstart, fstop, Frequency::from_hz(50_000), &d).unwrap();
        assert!(plan.fstart_actual <= fstart);
        assert!(plan.fstop_actual >= fstop);
    }

    #[test]
    fn sub_min_tunable_start_forces_a_dd_entry_plus_tuned_range() {
        let d = descriptor();
        let plan = plan_sweep(
            DeviceMode::Sh,
            Frequency::from_hz(9_000),
            Frequency::from_hz(8_000_000_000),
            Frequency::from_hz(20_000),
            &d,
        )
        .unwrap();
        assert!(!plan.only_dd);
        assert!(plan.entries.iter().any(|e| e.is_dd));
        let tuned = plan.entries.iter().find(|e| !e.is_dd).unwrap();
        assert!(tuned.fcstart >= d.min_tune_freq);
        assert!(plan.fstop_actual >= Frequency::from_hz(8_000_000_000));
    }
}
