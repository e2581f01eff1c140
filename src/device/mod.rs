pub mod descriptor;
pub mod model;
pub mod trigger;

use tracing::{instrument, warn};

use crate::config::{CONTROL_PORT, DATA_PORT};
use crate::error::{Error, ResourceError, StateError, ValidationError};
use crate::frequency::Frequency;
use crate::scpi::ScpiChannel;
use crate::transport::Transport;

pub use descriptor::DeviceDescriptor;
pub use trigger::{SyncRole, TriggerSettings, TriggerType};

/// An open connection to a device: the transport, its negotiated
/// descriptor, and the current (non-sweep) front-end configuration that the
/// getters below reflect.
pub struct DeviceHandle {
    transport: Transport,
    descriptor: DeviceDescriptor,
}

impl DeviceHandle {
    #[instrument(skip_all, fields(host))]
    pub fn connect(host: &str) -> Result<DeviceHandle, Error> {
        Self::connect_with_ports(host, CONTROL_PORT, DATA_PORT)
    }

    pub fn connect_with_ports(
        host: &str,
        control_port: u16,
        data_port: u16,
    ) -> Result<DeviceHandle, Error> {
        let mut transport = Transport::connect(host, control_port, data_port)
            .map_err(|_| ResourceError::OpenFailed)?;

        let descriptor = Self::query_descriptor(&mut transport)?;

        Ok(DeviceHandle {
            transport,
            descriptor,
        })
    }

    fn query_descriptor(transport: &mut Transport) -> Result<DeviceDescriptor, Error> {
        let mut scpi = ScpiChannel::new(&mut transport.control);

        let idn = scpi
            .query("*IDN?")
            .map_err(|_| ResourceError::InitFailed)?
            .text;
        let mut fields = idn.split(',').map(str::trim);
        let product_model = fields.next().unwrap_or("unknown").to_string();
        let product_serial = fields.next().unwrap_or("unknown").to_string();
        let firmware_version = fields.next().unwrap_or("unknown").to_string();

        DeviceDescriptor::for_product(&product_model, &product_serial, &firmware_version)
            .ok_or(ResourceError::InitFailed)
            .map_err(Into::into)
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn scpi(&mut self) -> ScpiChannel<'_> {
        ScpiChannel::new(&mut self.transport.control)
    }

    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    /// Requests the server-side acquisition lock required before any
    /// data-returning command will succeed.
    #[instrument(skip(self))]
    pub fn acquire_lock(&mut self) -> Result<(), Error> {
        let granted = self.scpi().query_i64("SYST:LOCK:REQ? ACQ")?;
        if granted == 0 {
            return Err(StateError::DataAccessDenied.into());
        }
        Ok(())
    }

    fn validate_freq(&self, freq: Frequency) -> Result<(), ValidationError> {
        if !self.descriptor.contains(freq) {
            return Err(ValidationError::FreqOutOfBound(freq));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn set_center_freq(&mut self, freq: Frequency) -> Result<(), Error> {
        self.validate_freq(freq)?;
        self.scpi()
            .send(&format!("FREQ:CENT {}", freq.as_hz()))?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn set_if_gain(&mut self, gain_db: i32) -> Result<(), Error> {
        if (gain_db as f32) < self.descriptor.min_if_gain
            || (gain_db as f32) > self.descriptor.max_if_gain
        {
            return Err(ValidationError::InvIfGain(gain_db).into());
        }
        self.scpi().send(&format!("INPUT:GAIN:IF {gain_db}"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn set_attenuation(&mut self, atten_db: u32) -> Result<(), Error> {
        if atten_db > 30 {
            return Err(ValidationError::InvAttenuation(atten_db).into());
        }
        if model::uses_dedicated_attenuator_command(&self.descriptor.product_model) {
            self.scpi()
                .send(&format!("SWEEP:ENTRY:ATT {atten_db}"))?;
        } else {
            self.scpi()
                .send(&format!("SWEEP:ENTRY:ATT:VAR {atten_db}"))?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn set_decimation(&mut self, rate: u32, min: u32, max: u32) -> Result<(), Error> {
        if rate != 1 && (rate < min || rate > max) {
            return Err(ValidationError::InvDecimationRate(rate).into());
        }
        self.scpi().send(&format!("SENSE:DEC {rate}"))?;
        Ok(())
    }

    /// Resets the device, aborts any capture, and flushes/cleans the data
    /// socket, matching the sequence a fresh sweep load always performs
    /// first.
    #[instrument(skip(self))]
    pub fn reset_for_sweep(&mut self) -> Result<(), Error> {
        self.scpi().send("*RST")?;
        self.scpi().send("SYST:ABORT")?;
        if let Err(e) = self.transport.data.flush() {
            warn!(?e, "data socket flush reported an error, continuing");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use super::*;

    fn read_line(stream: &mut TcpStream, pending: &mut String) -> String {
        let mut buf = [0u8; 256];
        loop {
            if let Some(pos) = pending.find('\n') {
                let line = pending[..pos].to_string();
                pending.drain(..=pos);
                return line;
            }
            let n = stream.read(&mut buf).unwrap();
            pending.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
    }

    #[test]
    fn connect_resolves_descriptor_from_idn_reply() {
        let control_listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let control_addr = control_listener.local_addr().unwrap();
        let data_listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let data_addr = data_listener.local_addr().unwrap();

        let control_thread = thread::spawn(move || {
            let (mut stream, _) = control_listener.accept().unwrap();
            let mut pending = String::new();
            let idn = read_line(&mut stream, &mut pending);
            assert!(idn.contains("*IDN?"));
            stream.write_all(b"WSA4000-108,0007,2.1.0\n").unwrap();
        });
        let data_thread = thread::spawn(move || {
            let _ = data_listener.accept().unwrap();
        });

        let device = DeviceHandle::connect_with_ports(
            &control_addr.ip().to_string(),
            control_addr.port(),
            data_addr.port(),
        )
        .unwrap();

        assert_eq!(device.descriptor().rfe_model, "RFE0440");
        assert_eq!(device.descriptor().product_serial, "0007");

        control_thread.join().unwrap();
        data_thread.join().unwrap();
    }

    #[test]
    fn connect_fails_for_unrecognized_product_tag() {
        let control_listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let control_addr = control_listener.local_addr().unwrap();
        let data_listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let data_addr = data_listener.local_addr().unwrap();

        let control_thread = thread::spawn(move || {
            let (mut stream, _) = control_listener.accept().unwrap();
            let mut pending = String::new();
            let idn = read_line(&mut stream, &mut pending);
            assert!(idn.contains("*IDN?"));
            stream.write_all(b"UNKNOWN-999,0001,1.0.0\n").unwrap();
        });
        let data_thread = thread::spawn(move || {
            let _ = data_listener.accept().unwrap();
        });

        let result = DeviceHandle::connect_with_ports(
            &control_addr.ip().to_string(),
            control_addr.port(),
            data_addr.port(),
        );
        assert!(result.is_err());

        control_thread.join().unwrap();
        data_thread.join().unwrap();
    }
}
