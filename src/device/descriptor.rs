use crate::frequency::Frequency;

/// Static capabilities of a connected device, populated once at open time
/// and never mutated afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub product_model: String,
    pub product_serial: String,
    pub rfe_model: String,
    pub firmware_version: String,
    pub instantaneous_bw: Frequency,
    pub max_sample_size: u32,
    pub min_tune_freq: Frequency,
    pub max_tune_freq: Frequency,
    pub freq_resolution: Frequency,
    pub min_if_gain: f32,
    pub max_if_gain: f32,
    /// Per-RF-gain-setting maximum safe input amplitude, dBm.
    pub abs_max_amp: Vec<f32>,
}

impl DeviceDescriptor {
    pub fn contains(&self, freq: Frequency) -> bool {
        self.min_tune_freq <= freq && freq <= self.max_tune_freq
    }

    /// Builds a descriptor for `product_model` from the static per-RFE-tag
    /// table, the way `_wsa_dev_init` branches on `rfe_name`. Returns `None`
    /// for a product tag this driver has no table entry for.
    pub fn for_product(product_model: &str, product_serial: &str, firmware_version: &str) -> Option<DeviceDescriptor> {
        let template = RFE_TABLE
            .iter()
            .find(|entry| product_model.contains(entry.product_tag))?;

        Some(DeviceDescriptor {
            product_model: product_model.to_string(),
            product_serial: product_serial.to_string(),
            rfe_model: template.rfe_model.to_string(),
            firmware_version: firmware_version.to_string(),
            instantaneous_bw: Frequency::from_hz(template.instantaneous_bw_hz),
            max_sample_size: template.max_sample_size,
            min_tune_freq: Frequency::from_hz(template.min_tune_freq_hz),
            max_tune_freq: Frequency::from_hz(template.max_tune_freq_hz),
            freq_resolution: Frequency::from_hz(template.freq_resolution_hz),
            min_if_gain: template.min_if_gain,
            max_if_gain: template.max_if_gain,
            abs_max_amp: template.abs_max_amp.to_vec(),
        })
    }
}

/// One row of the static RFE-model capability table. Field names and the
/// RFE0440/RFE0560 split follow `_wsa_dev_init`'s two branches; the numeric
/// ranges themselves are this driver's own (the original's `#define`s for
/// them live in a header outside the retained source tree).
struct RfeTableEntry {
    product_tag: &'static str,
    rfe_model: &'static str,
    instantaneous_bw_hz: u64,
    max_sample_size: u32,
    min_tune_freq_hz: u64,
    max_tune_freq_hz: u64,
    freq_resolution_hz: u64,
    min_if_gain: f32,
    max_if_gain: f32,
    abs_max_amp: &'static [f32],
}

/// WSA5000/R5500-408 wideband front end (RFE0560) vs. the narrower-band
/// legacy front end (RFE0440). Matched by substring against the `*IDN?`
/// product-model field, the same matching style `device::model` uses for
/// the attenuator-command split.
const RFE_TABLE: &[RfeTableEntry] = &[
    RfeTableEntry {
        product_tag: "WSA5000",
        rfe_model: "RFE0560",
        instantaneous_bw_hz: 62_500_000,
        max_sample_size: 64_000,
        min_tune_freq_hz: 50_000_000,
        max_tune_freq_hz: 27_000_000_000,
        freq_resolution_hz: 10,
        min_if_gain: -10.0,
        max_if_gain: 34.0,
        abs_max_amp: &[0.0, -10.0, -20.0, -30.0],
    },
    RfeTableEntry {
        product_tag: "R5500",
        rfe_model: "RFE0560",
        instantaneous_bw_hz: 62_500_000,
        max_sample_size: 64_000,
        min_tune_freq_hz: 50_000_000,
        max_tune_freq_hz: 18_000_000_000,
        freq_resolution_hz: 10,
        min_if_gain: -10.0,
        max_if_gain: 34.0,
        abs_max_amp: &[0.0, -10.0, -20.0, -30.0],
    },
    RfeTableEntry {
        product_tag: "WSA4000",
        rfe_model: "RFE0440",
        instantaneous_bw_hz: 62_500_000,
        max_sample_size: 32_000,
        min_tune_freq_hz: 100_000_000,
        max_tune_freq_hz: 8_000_000_000,
        freq_resolution_hz: 100_000,
        min_if_gain: -10.0,
        max_if_gain: 34.0,
        abs_max_amp: &[0.0, -10.0, -20.0, -30.0],
    },
];
