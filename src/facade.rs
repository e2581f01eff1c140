//! Public entry point: a `SweepDevice` wraps an open [`DeviceHandle`] and
//! drives the plan → load → capture pipeline the lower-level modules
//! implement.

use tracing::instrument;

use crate::device::DeviceHandle;
use crate::dsp;
use crate::error::{Error, ValidationError};
use crate::frequency::Frequency;
use crate::mode::DeviceMode;
use crate::sweep::{self, CaptureReport, PowerSpectrumConfig};

pub struct SweepDevice {
    device: DeviceHandle,
    attenuator_db: u32,
}

impl SweepDevice {
    pub fn new(device: DeviceHandle) -> SweepDevice {
        SweepDevice {
            device,
            attenuator_db: 0,
        }
    }

    pub fn set_attenuator(&mut self, atten_db: u32) -> Result<(), Error> {
        self.device.set_attenuation(atten_db)?;
        self.attenuator_db = atten_db;
        Ok(())
    }

    pub fn get_attenuator(&self) -> u32 {
        self.attenuator_db
    }

    /// Plans a sweep and allocates its output buffer; does not touch the
    /// wire.
    #[instrument(skip(self))]
    pub fn power_spectrum_alloc(
        &self,
        mode: DeviceMode,
        fstart: Frequency,
        fstop: Frequency,
        rbw: Frequency,
    ) -> Result<PowerSpectrumConfig, Error> {
        let plan = sweep::plan_sweep(mode, fstart, fstop, rbw, self.device.descriptor())?;
        Ok(PowerSpectrumConfig::new(mode, fstart, fstop, rbw, plan))
    }

    /// Pushes `config`'s plan onto the instrument as a sweep list.
    #[instrument(skip(self, config))]
    pub fn configure_sweep(&mut self, config: &PowerSpectrumConfig) -> Result<(), Error> {
        sweep::load_sweep_plan(&mut self.device, &config.plan, self.attenuator_db)
    }

    /// Captures one full sweep, filling `config`'s own output buffer and
    /// returning a borrowed view of it. Safe to call repeatedly against the
    /// same `config` — each call retriggers the sweep and refills the buffer
    /// from scratch.
    #[instrument(skip(self, config))]
    pub fn capture_power_spectrum<'cfg>(
        &mut self,
        config: &'cfg mut PowerSpectrumConfig,
    ) -> Result<(&'cfg [f32], CaptureReport), Error> {
        sweep::capture_power_spectrum(&mut self.device, config)
    }

    /// Provided for API parity with the entry-point contract; `config` is
    /// simply dropped, which releases its plan and any buffers it owns.
    pub fn power_spectrum_free(&self, config: PowerSpectrumConfig) {
        drop(config);
    }

    pub fn peak_find(&self, spectrum: &[f32], fstart: Frequency, fstop: Frequency) -> Option<(u64, f32)> {
        dsp::peak_find(spectrum, fstart.as_hz(), fstop.as_hz())
    }

    pub fn channel_power(
        &self,
        spectrum: &[f32],
        start_bin: usize,
        stop_bin: usize,
    ) -> Result<f32, ValidationError> {
        dsp::channel_power(spectrum, start_bin, stop_bin)
    }

    pub fn absolute_power(
        &self,
        spectrum: &[f32],
        start_bin: usize,
        stop_bin: usize,
    ) -> Result<f32, ValidationError> {
        dsp::absolute_power(spectrum, start_bin, stop_bin)
    }

    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut DeviceHandle {
        &mut self.device
    }
}
