//! Drives one already-loaded sweep plan to completion, filling the capture's
//! own power-spectrum buffer. Grounded on the main acquisition loop in
//! `wsa_capture_power_spectrum`.

use tracing::{instrument, warn};

use crate::config::POISON_SENTINEL;
use crate::device::DeviceHandle;
use crate::dsp::{self, RealFft};
use crate::error::{Error, ValidationError};
use crate::frequency::Frequency;
use crate::mode::ModeProperties;
use crate::vrt::{self, PacketCounter, StreamId, VrtPacket};

use super::config::PowerSpectrumConfig;
use super::plan::SweepPlan;

/// Diagnostic summary returned alongside a filled buffer: how many bins a
/// caller actually wrote versus how many are still carrying the poison
/// sentinel (a sign of dropped packets or a planning gap).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureReport {
    pub bins_written: usize,
    pub bins_poisoned: usize,
}

/// One block of decoded samples and the context that covered it.
struct BlockAccumulator {
    idata: Vec<f32>,
    filled: usize,
    fcenter: Frequency,
    reference_level: f32,
}

impl BlockAccumulator {
    fn new(block_len: usize) -> BlockAccumulator {
        BlockAccumulator {
            idata: vec![0.0; block_len],
            filled: 0,
            fcenter: Frequency::zero(),
            reference_level: 0.0,
        }
    }

    fn reset(&mut self) {
        self.idata.iter_mut().for_each(|v| *v = 0.0);
        self.filled = 0;
    }
}

/// Expands a plan's entries into one `is_dd` flag per block, in acquisition
/// order, so the capture loop knows which istart/istop formula applies
/// without tracking entry boundaries itself.
fn expand_block_flags(plan: &SweepPlan) -> Vec<bool> {
    let mut flags = Vec::new();
    for entry in &plan.entries {
        if entry.is_dd {
            flags.push(true);
            continue;
        }
        let span = entry.fcstop.as_hz().saturating_sub(entry.fcstart.as_hz());
        let step = entry.fstep.as_hz().max(1);
        let block_count = 1 + span / step;
        for _ in 0..block_count {
            flags.push(false);
        }
    }
    flags
}

fn compute_istart_istop(
    is_dd: bool,
    inverted: bool,
    fftlen: usize,
    props: &ModeProperties,
    config_fstart: Frequency,
    config_fstop: Frequency,
) -> (usize, usize) {
    let fftlen_f = fftlen as f64 + 0.5;
    let full_bw = props.full_bw.as_hz() as f64;

    if is_dd {
        let istart = (fftlen_f * config_fstart.as_hz() as f64 / full_bw).round() as usize;
        let istop = if config_fstop > props.min_tunable {
            (0.8 * fftlen_f).round() as usize
        } else {
            (fftlen_f * config_fstop.as_hz() as f64 / full_bw).round() as usize
        };
        return (istart.min(fftlen), istop.min(fftlen));
    }

    if inverted {
        let istart =
            (fftlen_f * (full_bw - props.usable_right.as_hz() as f64) / full_bw).round() as usize;
        let istop =
            (fftlen_f * (full_bw - props.usable_left.as_hz() as f64) / full_bw).round() as usize;
        (istart.min(fftlen), istop.min(fftlen))
    } else {
        let istart = (fftlen_f * props.usable_left.as_hz() as f64 / full_bw).round() as usize;
        let istop = (fftlen_f * props.usable_right.as_hz() as f64 / full_bw).round() as usize;
        (istart.min(fftlen), istop.min(fftlen))
    }
}

fn compute_buf_offset(
    is_dd: bool,
    fcenter: Frequency,
    fstart_actual: Frequency,
    fstop_actual: Frequency,
    buflen: usize,
    istart: usize,
    istop: usize,
) -> usize {
    if is_dd {
        return 0;
    }
    let span = fstop_actual.checked_sub(fstart_actual).map(|f| f.as_hz()).unwrap_or(1).max(1);
    let offset_hz = fcenter.checked_sub(fstart_actual).map(|f| f.as_hz()).unwrap_or(0);
    let frac = offset_hz as f64 / span as f64;
    let centre_offset = (frac * buflen as f64).round() as i64;
    let half_width = ((istop.saturating_sub(istart)) / 2) as i64;
    (centre_offset - half_width).max(0) as usize
}

/// Runs `config`'s plan to completion and fills its buffer, returning a
/// borrowed view of the result. Triggers the sweep itself (`SWEEP:LIST:START`)
/// every call, so a caller is free to reuse one configured plan across many
/// captures.
#[instrument(skip(device, config))]
pub fn capture_power_spectrum<'cfg>(
    device: &mut DeviceHandle,
    config: &'cfg mut PowerSpectrumConfig,
) -> Result<(&'cfg [f32], CaptureReport), Error> {
    let props = ModeProperties::for_mode(config.mode)
        .ok_or_else(|| ValidationError::UnsupportedMode(config.mode.to_string()))?;

    let plan = config.plan.clone();
    let config_fstart = config.fstart;
    let config_fstop = config.fstop;

    let spp = plan.spp as usize;
    let ppb = plan.ppb as usize;
    let block_len = spp * ppb;

    let output = config.buffer_mut();
    output.fill(POISON_SENTINEL);
    let buflen = output.len();

    device.scpi().send("SWEEP:LIST:START")?;

    let fft = RealFft::new(block_len);
    let block_flags = expand_block_flags(&plan);
    let mut block_idx = 0usize;

    let mut acc = BlockAccumulator::new(block_len);
    let mut packet_counter = PacketCounter::default();
    let mut total_packet_count = 0u32;
    let mut last_trailer_inverted = false;

    while total_packet_count < plan.packet_total {
        let packet = vrt::read_packet(&mut device.transport_mut().data)?;

        match packet {
            VrtPacket::Receiver(ctx) => {
                if let Some(freq) = ctx.frequency {
                    acc.fcenter = freq;
                }
            }
            VrtPacket::Digitizer(ctx) => {
                if let Some(level) = ctx.reference_level_dbm() {
                    acc.reference_level = level;
                }
            }
            VrtPacket::Extension(_) => {}
            VrtPacket::IfData {
                header,
                trailer,
                samples,
            } => {
                packet_counter.observe(header.packet_count);

                let full_scale = match header.stream_id {
                    StreamId::I32Data => dsp::NORM_FACTOR_32BIT,
                    StreamId::I16Data | StreamId::I16Q16Data => dsp::NORM_FACTOR_16BIT,
                };

                let offset = acc.filled * spp;
                let take = samples.i.len().min(spp);
                if offset + take <= acc.idata.len() {
                    dsp::normalize(&samples.i[..take], full_scale, &mut acc.idata[offset..offset + take]);
                }
                acc.filled += 1;
                last_trailer_inverted = trailer.spectral_inversion;

                total_packet_count += 1;

                if acc.filled == ppb {
                    let is_dd = block_flags.get(block_idx).copied().unwrap_or(false);
                    block_idx += 1;

                    let mut spectrum = acc.idata.clone();
                    dsp::window_hanning(&mut spectrum);
                    let mut fftout = fft.process(&spectrum);
                    let fftlen = fftout.len();

                    if last_trailer_inverted {
                        dsp::reverse_spectrum(&mut fftout);
                    }

                    let (istart, istop) = compute_istart_istop(
                        is_dd,
                        last_trailer_inverted,
                        fftlen,
                        &props,
                        config_fstart,
                        config_fstop,
                    );

                    let buf_offset = compute_buf_offset(
                        is_dd,
                        acc.fcenter,
                        plan.fstart_actual,
                        plan.fstop_actual,
                        buflen,
                        istart,
                        istop,
                    );

                    for i in 0..istop.saturating_sub(istart) {
                        if buf_offset + i >= buflen {
                            break;
                        }
                        let bin = fftout[istart + i];
                        output[buf_offset + i] = dsp::bin_to_dbm(bin, block_len, acc.reference_level);
                    }

                    acc.reset();
                }
            }
        }
    }

    let bins_poisoned = output.iter().filter(|&&v| v == POISON_SENTINEL).count();
    if bins_poisoned > 0 {
        warn!(bins_poisoned, "capture finished with unfilled bins");
    }

    let report = CaptureReport {
        bins_written: buflen - bins_poisoned,
        bins_poisoned,
    };

    Ok((&*output, report))
}
