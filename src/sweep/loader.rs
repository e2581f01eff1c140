//! Pushes a computed [`SweepPlan`](super::plan::SweepPlan) onto the
//! instrument as a list of sweep entries, grounded on
//! `wsa_sweep_plan_load` in the reference driver.

use tracing::instrument;

use crate::device::{model, DeviceHandle};
use crate::error::Error;

use super::plan::SweepPlan;

#[instrument(skip(device, plan))]
pub fn load_sweep_plan(
    device: &mut DeviceHandle,
    plan: &SweepPlan,
    attenuation_db: u32,
) -> Result<(), Error> {
    device.reset_for_sweep()?;
    device.acquire_lock()?;

    device.scpi().send("SWEEP:ENTRY:DEL:ALL")?;
    device.scpi().send("SWEEP:ENTRY:NEW")?;
    device.scpi().send("SWEEP:ITERATION 1")?;

    let dedicated = model::uses_dedicated_attenuator_command(&device.descriptor().product_model);
    if dedicated {
        device.scpi().send(&format!("SWEEP:ENTRY:ATT {attenuation_db}"))?;
    } else {
        device
            .scpi()
            .send(&format!("SWEEP:ENTRY:ATT:VAR {attenuation_db}"))?;
    }

    for entry in &plan.entries {
        if entry.is_dd {
            device.scpi().send("SWEEP:ENTRY:RFE:MODE DD")?;
            device.scpi().send(&format!("SWEEP:ENTRY:SPP {}", entry.spp))?;
            device.scpi().send(&format!("SWEEP:ENTRY:PPB {}", entry.ppb))?;
            device.scpi().send("SWEEP:ENTRY:SAVE 0")?;
            continue;
        }

        device
            .scpi()
            .send(&format!("SWEEP:ENTRY:RFE:MODE {}", plan.mode))?;
        device
            .scpi()
            .send(&format!("SWEEP:ENTRY:FREQ:CENT:START {}", entry.fcstart.as_hz()))?;
        device
            .scpi()
            .send(&format!("SWEEP:ENTRY:FREQ:CENT:STOP {}", entry.fcstop.as_hz()))?;
        device
            .scpi()
            .send(&format!("SWEEP:ENTRY:FREQ:CENT:STEP {}", entry.fstep.as_hz()))?;
        device.scpi().send(&format!("SWEEP:ENTRY:SPP {}", entry.spp))?;
        device.scpi().send(&format!("SWEEP:ENTRY:PPB {}", entry.ppb))?;
        device.scpi().send("SWEEP:ENTRY:SAVE END")?;
    }

    Ok(())
}
