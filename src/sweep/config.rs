use crate::config::POISON_SENTINEL;
use crate::frequency::Frequency;
use crate::mode::DeviceMode;

use super::plan::SweepPlan;

/// A requested power-spectrum sweep: the raw request, the plan computed for
/// it, and the output buffer the capture loop fills. Owned by the caller
/// between `power_spectrum_alloc` and `power_spectrum_free`; a freshly
/// allocated buffer reads as all [`POISON_SENTINEL`] until a capture fills
/// it.
#[derive(Debug, Clone)]
pub struct PowerSpectrumConfig {
    pub mode: DeviceMode,
    pub fstart: Frequency,
    pub fstop: Frequency,
    pub rbw: Frequency,
    pub plan: SweepPlan,
    buffer: Vec<f32>,
}

impl PowerSpectrumConfig {
    pub fn new(
        mode: DeviceMode,
        fstart: Frequency,
        fstop: Frequency,
        rbw: Frequency,
        plan: SweepPlan,
    ) -> PowerSpectrumConfig {
        let buffer_len = Self::compute_buffer_len(&plan, rbw);
        PowerSpectrumConfig {
            mode,
            fstart,
            fstop,
            rbw,
            plan,
            buffer: vec![POISON_SENTINEL; buffer_len],
        }
    }

    fn compute_buffer_len(plan: &SweepPlan, rbw: Frequency) -> usize {
        let span = plan
            .fstop_actual
            .checked_sub(plan.fstart_actual)
            .map(|f| f.as_hz())
            .unwrap_or(0);
        let rbw = rbw.as_hz().max(1);
        ((span / rbw) as usize).max(1)
    }

    /// Number of output bins the configured sweep will fill.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [f32] {
        &mut self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::plan::SweepPlanEntry;

    #[test]
    fn buffer_is_poisoned_on_alloc() {
        let plan = SweepPlan {
            mode: DeviceMode::Sh,
            fstart_actual: Frequency::from_hz(1_000_000_000),
            fstop_actual: Frequency::from_hz(1_010_000_000),
            entries: vec![SweepPlanEntry {
                is_dd: false,
                fcstart: Frequency::from_hz(1_000_000_000),
                fcstop: Frequency::from_hz(1_010_000_000),
                fstep: Frequency::from_hz(1_000_000),
                spp: 1024,
                ppb: 1,
            }],
            spp: 1024,
            ppb: 1,
            packet_total: 1,
            only_dd: false,
        };
        let config = PowerSpectrumConfig::new(
            DeviceMode::Sh,
            Frequency::from_hz(1_000_000_000),
            Frequency::from_hz(1_010_000_000),
            Frequency::from_hz(1_000_000),
            plan,
        );
        assert_eq!(config.buffer_len(), 10);
        assert!(config.buffer().iter().all(|&v| v == POISON_SENTINEL));
    }
}
