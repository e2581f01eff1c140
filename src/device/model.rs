//! Product-model tags that change which SCPI command a setting goes out on.

/// Models that take attenuation through the dedicated
/// `SWEEP:ENTRY:ATT` command rather than the generic
/// `SWEEP:ENTRY:ATT:VAR` fallback.
const DEDICATED_ATTENUATOR_MODELS: &[&str] = &["WSA5000-408", "R5500-408"];

pub fn uses_dedicated_attenuator_command(product_model: &str) -> bool {
    DEDICATED_ATTENUATOR_MODELS
        .iter()
        .any(|tag| product_model.contains(tag))
}
